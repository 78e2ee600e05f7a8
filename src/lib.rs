#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-interchange
//!
//! mesh-interchange reads and writes unstructured meshes in several file
//! formats through one in-memory representation, the [`CanonicalMesh`]
//! (nodes, faces and cells with typed index references).
//!
//! ## Features
//! - Gmsh `.msh` (ASCII 2.2 and 4.1 read, 2.2 write)
//! - Legacy VTK `.vtk` unstructured grids, including polyhedra
//! - Oasis `.nodes` / `.faces` / `.cells` text triples, with count-prefixed
//!   records for mixed element arity
//! - OpenOasis CSV directories (`nodes.csv`, `faces.csv`, `cells.csv`,
//!   optional `patches.csv` / `zones.csv`)
//! - Named face and cell groups, carried by Gmsh physical groups and
//!   OpenOasis patches and zones
//! - A topology validator reporting dangling references, malformed elements
//!   and coincident nodes
//! - A conversion driver with cancellation and all-or-nothing writes
//! - Face derivation and centroids for node-based volume meshes
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! mesh-interchange = "0.1"
//! # features = ["rayon"]   # parallel `Converter::convert_all`
//! ```
//!
//! ```no_run
//! use mesh_interchange::prelude::*;
//!
//! let converter = Converter::new(ConversionConfig::default());
//! let job = converter.convert(ConversionJob::from_paths("in.msh", "out.oasis"));
//! if let Some(err) = job.error() {
//!     eprintln!("conversion failed: {err}");
//! }
//! ```
//!
//! ## Logging
//! The crate logs through the [`log`] facade and never installs a logger.

pub mod config;
pub mod convert;
pub mod geometry;
pub mod io;
pub mod mesh;
pub mod mesh_error;
pub mod topology;

pub use mesh::CanonicalMesh;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::config::ConversionConfig;
    pub use crate::convert::{
        CancellationToken, ConversionJob, Converter, FormatSelector, JobStatus, Stage,
    };
    pub use crate::io::{
        ArityLayout, FormatAdapter, GmshAdapter, MeshFormat, OasisAdapter, OasisCsvAdapter,
        OasisOptions, VtkAdapter, adapter_for,
    };
    pub use crate::mesh::{
        CanonicalMesh, Cell, CellTopology, Face, FaceCapability, GroupMembers, MeshBuilder,
        MeshGroup, Node, ReferenceCheck,
    };
    pub use crate::mesh_error::MeshError;
    pub use crate::topology::cell_type::CellType;
    pub use crate::topology::faces::derive_face_topology;
    pub use crate::topology::ids::{CellId, EntityKind, FaceId, NodeId};
    pub use crate::topology::validation::{
        Finding, ValidationOptions, ValidationReport, validate_mesh,
    };
}
