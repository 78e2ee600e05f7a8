//! Format adapters between files and [`CanonicalMesh`].
//!
//! Every supported format implements [`FormatAdapter`], an object-safe trait
//! the conversion driver selects by [`MeshFormat`]. Single-file formats also
//! expose stream-level `read_from` / `write_to` helpers for in-memory use.
//!
//! All writers go through [`atomic`]: a target path is either left untouched
//! or replaced by a completely written file.

pub mod atomic;
pub mod gmsh;
pub mod oasis;
pub mod oasis_csv;
pub mod vtk;

use crate::config::ConversionConfig;
use crate::mesh::{CanonicalMesh, FaceCapability, MeshBuilder, ReferenceCheck};
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;
use crate::topology::ids::{FaceId, NodeId};
use hashbrown::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use gmsh::GmshAdapter;
pub use oasis::{ArityLayout, OasisAdapter, OasisOptions};
pub use oasis_csv::OasisCsvAdapter;
pub use vtk::VtkAdapter;

/// Mesh formats known to the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeshFormat {
    /// Gmsh `.msh`.
    Gmsh,
    /// Legacy VTK `.vtk` unstructured grid.
    Vtk,
    /// `.nodes` / `.faces` / `.cells` text triple.
    Oasis,
    /// OpenOasis directory of `nodes.csv` / `faces.csv` / `cells.csv`.
    OasisCsv,
}

impl MeshFormat {
    pub const ALL: [MeshFormat; 4] = [
        MeshFormat::Gmsh,
        MeshFormat::Vtk,
        MeshFormat::Oasis,
        MeshFormat::OasisCsv,
    ];

    /// Canonical tag, as accepted by [`MeshFormat::from_tag`].
    pub fn tag(self) -> &'static str {
        match self {
            MeshFormat::Gmsh => "gmsh",
            MeshFormat::Vtk => "vtk",
            MeshFormat::Oasis => "oasis",
            MeshFormat::OasisCsv => "oasis-csv",
        }
    }

    /// Parses a format tag, case-insensitively.
    ///
    /// Accepted: `gmsh`/`msh`, `vtk`, `oasis`, `oasis-csv`/`csv`.
    pub fn from_tag(tag: &str) -> Result<Self, MeshError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "gmsh" | "msh" => Ok(MeshFormat::Gmsh),
            "vtk" => Ok(MeshFormat::Vtk),
            "oasis" => Ok(MeshFormat::Oasis),
            "oasis-csv" | "oasis_csv" | "csv" => Ok(MeshFormat::OasisCsv),
            _ => Err(MeshError::UnknownFormat(tag.to_string())),
        }
    }

    /// Infers the format from a path's extension.
    ///
    /// `.msh` is Gmsh, `.vtk` is VTK, `.nodes`/`.faces`/`.cells`/`.oasis`
    /// name an Oasis triple. A path without an extension names an OpenOasis
    /// CSV directory.
    pub fn from_path(path: &Path) -> Result<Self, MeshError> {
        let Some(ext) = path.extension() else {
            return Ok(MeshFormat::OasisCsv);
        };
        match ext.to_string_lossy().to_ascii_lowercase().as_str() {
            "msh" => Ok(MeshFormat::Gmsh),
            "vtk" => Ok(MeshFormat::Vtk),
            "nodes" | "faces" | "cells" | "oasis" => Ok(MeshFormat::Oasis),
            _ => Err(MeshError::UnknownFormat(path.display().to_string())),
        }
    }
}

impl fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for MeshFormat {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s)
    }
}

/// Which side of an adapter an unsupported feature was hit on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Read => "read",
            Direction::Write => "write",
        })
    }
}

/// Reads and writes one mesh format.
///
/// Implementations are stateless apart from their options and may be shared
/// between threads.
pub trait FormatAdapter: fmt::Debug + Send + Sync {
    /// Format handled by this adapter.
    fn format(&self) -> MeshFormat;

    /// Loads a mesh from `path`.
    fn read(&self, path: &Path) -> Result<CanonicalMesh, MeshError>;

    /// Writes `mesh` to `path`, all or nothing.
    fn write(&self, mesh: &CanonicalMesh, path: &Path) -> Result<(), MeshError>;
}

/// Returns the adapter for `format`, configured from `config`.
pub fn adapter_for(format: MeshFormat, config: &ConversionConfig) -> Box<dyn FormatAdapter> {
    match format {
        MeshFormat::Gmsh => Box::new(GmshAdapter),
        MeshFormat::Vtk => Box::new(VtkAdapter::new(config.tool_version())),
        MeshFormat::Oasis => Box::new(OasisAdapter::new(config.oasis)),
        MeshFormat::OasisCsv => Box::new(OasisCsvAdapter),
    }
}

/// Connectivity of one 2D/3D element from an element-list format.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ElementShape {
    Nodes(Vec<NodeId>),
    /// Polyhedron given as a list of oriented node loops.
    FaceStream(Vec<Vec<NodeId>>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawElement {
    pub(crate) cell_type: CellType,
    pub(crate) shape: ElementShape,
}

impl RawElement {
    pub(crate) fn nodes(cell_type: CellType, nodes: Vec<NodeId>) -> Self {
        Self {
            cell_type,
            shape: ElementShape::Nodes(nodes),
        }
    }

    pub(crate) fn dimension(&self) -> u8 {
        match self.shape {
            ElementShape::FaceStream(_) => 3,
            ElementShape::Nodes(_) => self.cell_type.dimension(),
        }
    }
}

/// Highest element dimension present, 0 when there are no elements.
pub(crate) fn top_dimension(elements: &[RawElement]) -> u8 {
    elements.iter().map(RawElement::dimension).max().unwrap_or(0)
}

/// Builds a mesh from an element list using the dimension rule: elements of
/// the highest dimension become cells, and when that dimension is 3 the 2D
/// elements become the face table.
///
/// Face streams are resolved against the face table by exact node sequence;
/// unknown loops are appended. References are stored as given.
/// `planar_capability` is the face capability of a mesh without volume
/// cells.
pub(crate) fn assemble_by_dimension(
    nodes: Vec<[f64; 3]>,
    elements: Vec<RawElement>,
    planar_capability: FaceCapability,
) -> Result<CanonicalMesh, MeshError> {
    let top = top_dimension(&elements);
    let mut builder = MeshBuilder::new().with_reference_check(ReferenceCheck::Deferred);
    builder.reserve(nodes.len(), 0, elements.len());
    for coords in nodes {
        builder.add_node(coords);
    }

    if top < 3 {
        builder.set_face_capability(planar_capability);
        // Face streams are 3D, so only node lists remain here.
        for element in elements {
            if let ElementShape::Nodes(nodes) = element.shape {
                builder.add_cell(element.cell_type, nodes)?;
            }
        }
        return Ok(builder.build());
    }

    builder.set_face_capability(FaceCapability::Present);
    let mut by_sequence: HashMap<Vec<NodeId>, FaceId> = HashMap::new();
    let (faces, cells): (Vec<_>, Vec<_>) = elements.into_iter().partition(|e| e.dimension() < 3);
    for element in faces {
        if let ElementShape::Nodes(nodes) = element.shape {
            let id = builder.add_face(nodes.clone())?;
            by_sequence.entry(nodes).or_insert(id);
        }
    }
    for element in cells {
        match element.shape {
            ElementShape::Nodes(nodes) => {
                builder.add_cell(element.cell_type, nodes)?;
            }
            ElementShape::FaceStream(loops) => {
                let mut face_ids = Vec::with_capacity(loops.len());
                for nodes in loops {
                    let id = match by_sequence.get(&nodes) {
                        Some(&id) => id,
                        None => {
                            let id = builder.add_face(nodes.clone())?;
                            by_sequence.insert(nodes, id);
                            id
                        }
                    };
                    face_ids.push(id);
                }
                builder.add_polyhedron(face_ids)?;
            }
        }
    }
    Ok(builder.build())
}
