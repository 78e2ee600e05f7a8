mod util;

use mesh_interchange::geometry::{cell_centroid, cell_centroids};
use mesh_interchange::convert::{ConversionJob, Converter};
use mesh_interchange::io::{FormatAdapter, OasisCsvAdapter};
use mesh_interchange::mesh_error::MeshError;
use mesh_interchange::topology::cell_type::CellType;
use mesh_interchange::topology::ids::{CellId, EntityKind};
use mesh_interchange::topology::validation::{ValidationOptions, validate_mesh};
use std::fs;
use tempfile::tempdir;
use util::{GROUPED_TET_MSH, hex_grid, tet_and_hex, write_fixture};

#[test]
fn node_based_cells_are_written_as_shared_faces() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("grid");
    let mesh = hex_grid(2, 1, 1);
    OasisCsvAdapter.write(&mesh, &out).unwrap();

    let faces = fs::read_to_string(out.join("faces.csv")).unwrap();
    // Eleven faces for two hexahedra sharing one, plus the header.
    assert_eq!(faces.lines().count(), 12);
    let cells = fs::read_to_string(out.join("cells.csv")).unwrap();
    assert_eq!(cells.lines().next(), Some("cId,fIds"));
    assert_eq!(cells.lines().count(), 3);

    let back = OasisCsvAdapter.read(&out).unwrap();
    assert_eq!(back.face_count(), 11);
    assert!(back.cells().iter().all(|c| c.cell_type == CellType::Polyhedron));
    assert!(validate_mesh(&back, &ValidationOptions::all()).is_clean());
}

#[test]
fn centroids_survive_face_derivation() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("mixed");
    let mesh = tet_and_hex();
    OasisCsvAdapter.write(&mesh, &out).unwrap();
    let back = OasisCsvAdapter.read(&out).unwrap();

    for (before, after) in cell_centroids(&mesh).into_iter().zip(cell_centroids(&back)) {
        let (before, after) = (before.unwrap(), after.unwrap());
        for k in 0..3 {
            assert!((before[k] - after[k]).abs() < 1e-12, "{before:?} vs {after:?}");
        }
    }
    assert_eq!(cell_centroid(&back, CellId::new(0)), Some([0.5, 0.5, 0.5]));
}

#[test]
fn rewriting_a_read_directory_is_stable() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    OasisCsvAdapter.write(&tet_and_hex(), &first).unwrap();
    let mesh = OasisCsvAdapter.read(&first).unwrap();
    OasisCsvAdapter.write(&mesh, &second).unwrap();

    for file in ["nodes.csv", "faces.csv", "cells.csv"] {
        assert_eq!(
            fs::read_to_string(first.join(file)).unwrap(),
            fs::read_to_string(second.join(file)).unwrap(),
            "{file}"
        );
    }
}

#[test]
fn missing_cell_table_is_an_io_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("nodes.csv"), "nId,x,y,z\n0,0,0,0\n").unwrap();
    let err = OasisCsvAdapter.read(dir.path()).unwrap_err();
    assert!(matches!(err, MeshError::Io(_)), "{err}");
}

#[test]
fn gmsh_physical_groups_become_patches_and_zones() {
    let dir = tempdir().unwrap();
    let input = write_fixture(dir.path(), "grouped.msh", GROUPED_TET_MSH);
    let out = dir.path().join("grouped");
    let job = Converter::default().convert(ConversionJob::from_tags(&input, "msh", &out, "csv"));
    assert!(job.is_ok(), "{:?}", job.status());

    assert_eq!(fs::read_to_string(out.join("patches.csv")).unwrap(), "inlet,0\n");
    assert_eq!(fs::read_to_string(out.join("zones.csv")).unwrap(), "fluid,0\n");

    let back = OasisCsvAdapter.read(&out).unwrap();
    let inlet = back.group(EntityKind::Face, "inlet").unwrap();
    assert_eq!(inlet.members.len(), 1);
    assert!(back.group(EntityKind::Cell, "fluid").is_some());
    assert!(validate_mesh(&back, &ValidationOptions::all()).is_clean());
}

#[test]
fn dangling_patch_members_fail_validation() {
    let dir = tempdir().unwrap();
    OasisCsvAdapter.write(&tet_and_hex(), dir.path()).unwrap();
    fs::write(dir.path().join("patches.csv"), "outlet,0,99\n").unwrap();

    let mesh = OasisCsvAdapter.read(dir.path()).unwrap();
    let report = validate_mesh(&mesh, &ValidationOptions::all());
    assert!(report.has_fatal());
    assert!(report.to_string().contains("outlet"), "{report}");
}
