//! Canonical in-memory mesh shared by every format adapter.
//!
//! A [`CanonicalMesh`] owns three tables: node coordinates, polygonal faces
//! and cells. Faces and cells refer to other entities by index only; they
//! never own them. Named [`MeshGroup`]s (boundary patches, cell zones) list
//! faces or cells the same way. Meshes are assembled through a
//! [`MeshBuilder`] and are immutable afterwards, except for the
//! [`SanityFlags`] a validation report may record.

pub mod builder;
pub mod compare;

pub use builder::{MeshBuilder, ReferenceCheck};
pub use compare::{MeshMismatch, compare_meshes};

use crate::topology::cell_type::CellType;
use crate::topology::ids::{CellId, EntityKind, FaceId, NodeId};

/// A mesh vertex with 3D coordinates.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub coords: [f64; 3],
}

/// A polygonal face: an ordered node loop plus an orientation flag.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Face {
    nodes: Vec<NodeId>,
    reversed: bool,
}

impl Face {
    pub fn new(nodes: Vec<NodeId>, reversed: bool) -> Self {
        Self { nodes, reversed }
    }

    /// Nodes in stored order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn arity(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes in the order the orientation flag implies.
    pub fn oriented_nodes(&self) -> Vec<NodeId> {
        if self.reversed {
            self.nodes.iter().rev().copied().collect()
        } else {
            self.nodes.clone()
        }
    }
}

/// How a cell describes its boundary.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CellTopology {
    /// Ordered node list (simple element types).
    Nodes(Vec<NodeId>),
    /// Ordered face list (general polyhedra).
    Faces(Vec<FaceId>),
}

/// A mesh element.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    pub topology: CellTopology,
}

impl Cell {
    pub fn from_nodes(cell_type: CellType, nodes: Vec<NodeId>) -> Self {
        Self {
            cell_type,
            topology: CellTopology::Nodes(nodes),
        }
    }

    pub fn from_faces(cell_type: CellType, faces: Vec<FaceId>) -> Self {
        Self {
            cell_type,
            topology: CellTopology::Faces(faces),
        }
    }

    /// Node list of a node-based cell.
    pub fn nodes(&self) -> Option<&[NodeId]> {
        match &self.topology {
            CellTopology::Nodes(nodes) => Some(nodes),
            CellTopology::Faces(_) => None,
        }
    }

    /// Face list of a face-based cell.
    pub fn faces(&self) -> Option<&[FaceId]> {
        match &self.topology {
            CellTopology::Faces(faces) => Some(faces),
            CellTopology::Nodes(_) => None,
        }
    }

    /// Number of node or face references, whichever the topology holds.
    pub fn arity(&self) -> usize {
        match &self.topology {
            CellTopology::Nodes(nodes) => nodes.len(),
            CellTopology::Faces(faces) => faces.len(),
        }
    }
}

/// Entities collected by a [`MeshGroup`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GroupMembers {
    Faces(Vec<FaceId>),
    Cells(Vec<CellId>),
}

impl GroupMembers {
    pub fn kind(&self) -> EntityKind {
        match self {
            GroupMembers::Faces(_) => EntityKind::Face,
            GroupMembers::Cells(_) => EntityKind::Cell,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            GroupMembers::Faces(faces) => faces.len(),
            GroupMembers::Cells(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw member indices in stored order.
    pub fn indices(&self) -> Vec<usize> {
        match self {
            GroupMembers::Faces(faces) => faces.iter().map(|f| f.index()).collect(),
            GroupMembers::Cells(cells) => cells.iter().map(|c| c.index()).collect(),
        }
    }
}

/// A named set of faces (a boundary patch) or cells (a zone).
///
/// Names are unique per member kind; a face group and a cell group may share
/// one.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MeshGroup {
    pub name: String,
    pub members: GroupMembers,
}

impl MeshGroup {
    pub fn faces(name: impl Into<String>, faces: Vec<FaceId>) -> Self {
        Self {
            name: name.into(),
            members: GroupMembers::Faces(faces),
        }
    }

    pub fn cells(name: impl Into<String>, cells: Vec<CellId>) -> Self {
        Self {
            name: name.into(),
            members: GroupMembers::Cells(cells),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.members.kind()
    }
}

/// Whether the source carried a face table at all.
///
/// `Present` with zero faces means "this mesh has no faces"; `Absent` means
/// "the source format cannot tell".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FaceCapability {
    #[default]
    Present,
    Absent,
}

/// Flags recorded by
/// [`ValidationReport::apply_to`](crate::topology::validation::ValidationReport::apply_to).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SanityFlags {
    pub validated: bool,
    pub coincident_node_pairs: usize,
}

/// Node, face and cell tables of one mesh.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CanonicalMesh {
    pub(crate) nodes: Vec<Node>,
    pub(crate) faces: Vec<Face>,
    pub(crate) cells: Vec<Cell>,
    #[serde(default)]
    pub(crate) groups: Vec<MeshGroup>,
    pub(crate) face_capability: FaceCapability,
    pub(crate) sanity: SanityFlags,
}

impl CanonicalMesh {
    pub fn builder() -> MeshBuilder {
        MeshBuilder::new()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id.index())
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.index())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The face table; empty when the source had none
    /// (see [`face_capability`](Self::face_capability)).
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Named groups in insertion order.
    pub fn groups(&self) -> &[MeshGroup] {
        &self.groups
    }

    /// Group of the given kind called `name`.
    pub fn group(&self, kind: EntityKind, name: &str) -> Option<&MeshGroup> {
        self.groups
            .iter()
            .find(|g| g.kind() == kind && g.name == name)
    }

    pub fn face_groups(&self) -> impl Iterator<Item = &MeshGroup> {
        self.groups.iter().filter(|g| g.kind() == EntityKind::Face)
    }

    pub fn cell_groups(&self) -> impl Iterator<Item = &MeshGroup> {
        self.groups.iter().filter(|g| g.kind() == EntityKind::Cell)
    }

    pub fn face_capability(&self) -> FaceCapability {
        self.face_capability
    }

    pub fn sanity(&self) -> SanityFlags {
        self.sanity
    }

    /// Highest dimension among the cells, if any.
    pub fn cell_dimension(&self) -> Option<u8> {
        self.cells.iter().map(|c| c.cell_type.dimension()).max()
    }

    /// Returns `true` when the cells do not all share one arity.
    pub fn has_mixed_cell_arity(&self) -> bool {
        let mut arities = self.cells.iter().map(Cell::arity);
        match arities.next() {
            Some(first) => arities.any(|a| a != first),
            None => false,
        }
    }

    pub(crate) fn node_coords(&self, id: NodeId) -> Option<[f64; 3]> {
        self.node(id).map(|n| n.coords)
    }
}
