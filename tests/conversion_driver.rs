mod util;

use mesh_interchange::prelude::*;
use std::fs;
use tempfile::tempdir;
use util::{TET_HEX_MSH, init_logger, write_fixture};

fn converter() -> Converter {
    Converter::new(ConversionConfig::default().with_tool_version("test"))
}

fn assert_ok(job: &ConversionJob) {
    assert!(job.is_ok(), "{}: {:?}", job.input().display(), job.status());
}

#[test]
fn gmsh_to_every_format() {
    init_logger();
    let dir = tempdir().unwrap();
    let input = write_fixture(dir.path(), "in.msh", TET_HEX_MSH);
    let conv = converter();

    for (output, tag) in [
        ("out.vtk", "vtk"),
        ("out.msh", "msh"),
        ("out.oasis", "oasis"),
        ("out_csv", "csv"),
    ] {
        let job = ConversionJob::from_tags(&input, "gmsh", dir.path().join(output), tag);
        let job = conv.convert(job);
        assert_ok(&job);
    }
    assert!(dir.path().join("out.cells").is_file());
    assert!(dir.path().join("out_csv").join("cells.csv").is_file());
    let vtk = fs::read_to_string(dir.path().join("out.vtk")).unwrap();
    assert_eq!(vtk.lines().nth(1), Some("mesh-interchange test"));
}

#[test]
fn reconverting_output_is_idempotent() {
    let dir = tempdir().unwrap();
    let d = dir.path();
    write_fixture(d, "a.msh", TET_HEX_MSH);
    let conv = converter();
    let jobs = [
        ("a.msh", "b.vtk"),
        ("b.vtk", "c.msh"),
        ("c.msh", "d.vtk"),
        ("d.vtk", "e.oasis"),
        ("e.oasis", "f.msh"),
    ];
    for (from, to) in jobs {
        assert_ok(&conv.convert(ConversionJob::from_paths(d.join(from), d.join(to))));
    }
    let read = |p: &str| fs::read_to_string(d.join(p)).unwrap();
    assert_eq!(read("b.vtk"), read("d.vtk"));
    assert_eq!(read("c.msh"), read("f.msh"));
}

#[test]
fn validation_failure_stops_before_writing() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path(), "bad.nodes", "0 0 0\n1 0 0\n0 1 0\n0 0 1\n");
    write_fixture(dir.path(), "bad.cells", "0 1 2 9\n");
    let output = write_fixture(dir.path(), "out.vtk", "previous\n");

    let job = converter().convert(ConversionJob::from_paths(dir.path().join("bad.oasis"), &output));
    assert_eq!(job.failed_stage(), Some(Stage::Validate));
    let Some(MeshError::ValidationFailed { report }) = job.error() else {
        panic!("unexpected status {:?}", job.status());
    };
    assert!(matches!(
        report.findings(),
        [Finding::DanglingReference { missing, .. }] if missing == &vec![9]
    ));
    assert!(job.report().unwrap().has_fatal());
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous\n");
}

#[test]
fn coincident_nodes_only_warn() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path(), "dup.nodes", "0 0 0\n1 0 0\n0 1 0\n1 0 0\n");
    write_fixture(dir.path(), "dup.cells", "0 1 2\n0 3 2\n");

    let job = converter().convert(ConversionJob::from_paths(
        dir.path().join("dup.nodes"),
        dir.path().join("dup.vtk"),
    ));
    assert_ok(&job);
    assert_eq!(job.mesh().unwrap().sanity().coincident_node_pairs, 1);
    assert_eq!(job.report().unwrap().warnings().count(), 1);
}

#[test]
fn unwritable_output_fails_at_write_and_leaves_nothing() {
    let dir = tempdir().unwrap();
    let input = write_fixture(dir.path(), "in.msh", TET_HEX_MSH);
    let output = dir.path().join("missing_dir").join("out.vtk");

    let job = converter().convert(ConversionJob::from_paths(&input, &output));
    assert_eq!(job.failed_stage(), Some(Stage::Write));
    assert!(matches!(job.error(), Some(MeshError::Io(_))));
    assert!(!output.exists());
}

#[test]
fn unsupported_output_feature_fails_at_write() {
    let dir = tempdir().unwrap();
    let input = write_fixture(dir.path(), "in.msh", TET_HEX_MSH);
    let conv = Converter::new(ConversionConfig::default().with_oasis(OasisOptions {
        arity: ArityLayout::Fixed,
    }));

    let job = conv.convert(ConversionJob::from_paths(&input, dir.path().join("out.oasis")));
    assert_eq!(job.failed_stage(), Some(Stage::Write));
    assert!(matches!(
        job.error(),
        Some(MeshError::UnsupportedFeature {
            format: MeshFormat::Oasis,
            ..
        })
    ));
    assert!(!dir.path().join("out.nodes").exists());
}

#[test]
fn convert_all_keeps_job_order() {
    let dir = tempdir().unwrap();
    let input = write_fixture(dir.path(), "in.msh", TET_HEX_MSH);
    let jobs = vec![
        ConversionJob::from_paths(&input, dir.path().join("a.vtk")),
        ConversionJob::from_paths(dir.path().join("absent.msh"), dir.path().join("b.vtk")),
        ConversionJob::from_paths(&input, dir.path().join("c.unknown")),
        ConversionJob::from_paths(&input, dir.path().join("d.oasis")),
    ];

    let done = converter().convert_all(jobs);
    let stages: Vec<Option<Stage>> = done.iter().map(ConversionJob::failed_stage).collect();
    assert_eq!(stages, [None, Some(Stage::Read), Some(Stage::SelectOutput), None]);
    assert!(done.iter().all(ConversionJob::is_terminal));
}

#[test]
fn cancellation_fails_every_pending_job() {
    let dir = tempdir().unwrap();
    let input = write_fixture(dir.path(), "in.msh", TET_HEX_MSH);
    let token = CancellationToken::new();
    let conv = converter().with_cancellation(token.clone());
    token.cancel();

    let outputs = ["a.vtk", "b.msh"].map(|name| dir.path().join(name));
    let jobs = outputs
        .iter()
        .map(|out| ConversionJob::from_paths(&input, out))
        .collect();
    for job in conv.convert_all(jobs) {
        assert!(matches!(
            job.error(),
            Some(MeshError::Cancelled(Stage::SelectInput))
        ));
    }
    assert!(outputs.iter().all(|out| !out.exists()));
}

#[test]
fn config_loads_from_json() {
    let config: ConversionConfig = serde_json::from_str(
        r#"{
            "validation": { "check_coincident_nodes": false },
            "oasis": { "arity": "count-prefixed" },
            "tool_version": "2.5"
        }"#,
    )
    .unwrap();
    assert_eq!(config.tool_version(), "2.5");
    assert_eq!(config.oasis.arity, ArityLayout::CountPrefixed);
    assert!(!config.validation.check_coincident_nodes);
    assert!(config.validation.check_closed_shells);

    let dir = tempdir().unwrap();
    let input = write_fixture(dir.path(), "in.msh", TET_HEX_MSH);
    let job = ConversionJob::from_paths(&input, dir.path().join("o.oasis"));
    let job = Converter::new(config).convert(job);
    assert_ok(&job);
    assert_eq!(
        fs::read_to_string(dir.path().join("o.cells")).unwrap(),
        "8 0 1 2 3 4 5 6 7\n4 8 9 10 11\n"
    );
}
