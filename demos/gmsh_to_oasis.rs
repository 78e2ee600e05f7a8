//! Converts a Gmsh file to an Oasis triple and prints what was written.
//!
//! ```text
//! cargo run --example gmsh_to_oasis -- [input.msh] [output-base]
//! ```
//!
//! Without arguments a two-element mesh is converted inside a temporary
//! directory. Set `RUST_LOG=debug` to see the adapters' log output.

use mesh_interchange::prelude::*;
use std::fs;
use std::path::PathBuf;

const MSH: &str = r#"$MeshFormat
2.2 0 8
$EndMeshFormat
$Nodes
9
1 0 0 0
2 1 0 0
3 1 1 0
4 0 1 0
5 0 0 1
6 1 0 1
7 1 1 1
8 0 1 1
9 0 0 2
$EndNodes
$Elements
2
1 5 2 0 1 1 2 3 4 5 6 7 8
2 4 2 0 1 5 6 8 9
$EndElements
"#;

fn main() -> Result<(), MeshError> {
    env_logger::init();

    let scratch = tempfile::tempdir()?;
    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let input = match args.next() {
        Some(path) => path,
        None => {
            let path = scratch.path().join("demo.msh");
            fs::write(&path, MSH)?;
            path
        }
    };
    let output = args
        .next()
        .unwrap_or_else(|| scratch.path().join("demo.oasis"));

    let config = ConversionConfig::default().with_oasis(OasisOptions {
        arity: ArityLayout::Auto,
    });
    let job = Converter::new(config).convert(ConversionJob::new(
        &input,
        MeshFormat::Gmsh,
        &output,
        MeshFormat::Oasis,
    ));
    if let JobStatus::Failed { stage, error } = job.status() {
        eprintln!("failed at {stage}: {error}");
        return Ok(());
    }

    let Some(mesh) = job.mesh() else {
        return Ok(());
    };
    println!(
        "{} -> {}: {} nodes, {} cells",
        input.display(),
        output.display(),
        mesh.node_count(),
        mesh.cell_count()
    );
    for centroid in mesh_interchange::geometry::cell_centroids(mesh).into_iter().flatten() {
        println!("cell centroid {centroid:?}");
    }
    for ext in ["nodes", "faces", "cells"] {
        let path = output.with_extension(ext);
        println!("--- {}\n{}", path.display(), fs::read_to_string(&path)?);
    }
    Ok(())
}
