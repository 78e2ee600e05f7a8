//! Incremental construction of a [`CanonicalMesh`].
//!
//! Readers of index-based formats build with [`ReferenceCheck::Deferred`] so
//! that the topology validator can report every dangling index in one pass;
//! programmatic callers get eager rejection by default. Group names are
//! checked for duplicates in both modes.

use super::{CanonicalMesh, Cell, Face, FaceCapability, GroupMembers, MeshGroup, Node};
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;
use crate::topology::ids::{CellId, Entity, EntityKind, FaceId, NodeId};

/// When out-of-range references are detected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReferenceCheck {
    /// Reject on append with [`MeshError::Reference`].
    #[default]
    Eager,
    /// Store as given; left to the validator.
    Deferred,
}

/// Appends nodes, faces and cells and hands out their ids.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    mesh: CanonicalMesh,
    check: ReferenceCheck,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_check(mut self, check: ReferenceCheck) -> Self {
        self.check = check;
        self
    }

    /// Marks the mesh as coming from a source without a face table.
    pub fn without_face_table(mut self) -> Self {
        self.mesh.face_capability = FaceCapability::Absent;
        self
    }

    pub fn set_face_capability(&mut self, capability: FaceCapability) {
        self.mesh.face_capability = capability;
    }

    pub fn reserve(&mut self, nodes: usize, faces: usize, cells: usize) {
        self.mesh.nodes.reserve(nodes);
        self.mesh.faces.reserve(faces);
        self.mesh.cells.reserve(cells);
    }

    pub fn node_count(&self) -> usize {
        self.mesh.nodes.len()
    }

    pub fn face_count(&self) -> usize {
        self.mesh.faces.len()
    }

    pub fn cell_count(&self) -> usize {
        self.mesh.cells.len()
    }

    pub fn add_node(&mut self, coords: [f64; 3]) -> NodeId {
        let id = NodeId::new(self.mesh.nodes.len());
        self.mesh.nodes.push(Node { coords });
        id
    }

    pub fn add_face(&mut self, nodes: Vec<NodeId>) -> Result<FaceId, MeshError> {
        self.add_oriented_face(nodes, false)
    }

    pub fn add_oriented_face(
        &mut self,
        nodes: Vec<NodeId>,
        reversed: bool,
    ) -> Result<FaceId, MeshError> {
        let id = FaceId::new(self.mesh.faces.len());
        self.check_nodes(Entity::Face(id), &nodes)?;
        self.mesh.faces.push(Face::new(nodes, reversed));
        Ok(id)
    }

    /// Appends a node-based cell.
    pub fn add_cell(
        &mut self,
        cell_type: CellType,
        nodes: Vec<NodeId>,
    ) -> Result<CellId, MeshError> {
        self.push_cell(Cell::from_nodes(cell_type, nodes))
    }

    /// Appends a face-based polyhedron.
    pub fn add_polyhedron(&mut self, faces: Vec<FaceId>) -> Result<CellId, MeshError> {
        self.push_cell(Cell::from_faces(CellType::Polyhedron, faces))
    }

    pub fn push_cell(&mut self, cell: Cell) -> Result<CellId, MeshError> {
        let id = CellId::new(self.mesh.cells.len());
        let owner = Entity::Cell(id);
        match &cell.topology {
            super::CellTopology::Nodes(nodes) => self.check_nodes(owner, nodes)?,
            super::CellTopology::Faces(faces) => self.check_faces(owner, faces)?,
        }
        self.mesh.cells.push(cell);
        Ok(id)
    }

    /// Names a set of faces, e.g. a boundary patch.
    pub fn add_face_group(
        &mut self,
        name: impl Into<String>,
        faces: Vec<FaceId>,
    ) -> Result<(), MeshError> {
        self.add_group(MeshGroup::faces(name, faces))
    }

    /// Names a set of cells, e.g. a material zone.
    pub fn add_cell_group(
        &mut self,
        name: impl Into<String>,
        cells: Vec<CellId>,
    ) -> Result<(), MeshError> {
        self.add_group(MeshGroup::cells(name, cells))
    }

    pub fn add_group(&mut self, group: MeshGroup) -> Result<(), MeshError> {
        let kind = group.kind();
        if self.mesh.group(kind, &group.name).is_some() {
            return Err(MeshError::DuplicateGroup {
                name: group.name,
                kind,
            });
        }
        if self.check == ReferenceCheck::Eager {
            let len = match group.members {
                GroupMembers::Faces(_) => self.mesh.faces.len(),
                GroupMembers::Cells(_) => self.mesh.cells.len(),
            };
            if let Some(missing) = group.members.indices().into_iter().find(|&i| i >= len) {
                return Err(MeshError::GroupReference {
                    group: group.name,
                    target: kind,
                    id: missing as u64,
                });
            }
        }
        self.mesh.groups.push(group);
        Ok(())
    }

    pub fn build(self) -> CanonicalMesh {
        self.mesh
    }

    fn check_nodes(&self, owner: Entity, nodes: &[NodeId]) -> Result<(), MeshError> {
        if self.check == ReferenceCheck::Deferred {
            return Ok(());
        }
        let len = self.mesh.nodes.len();
        match nodes.iter().find(|n| n.index() >= len) {
            Some(missing) => Err(MeshError::Reference {
                owner,
                target: EntityKind::Node,
                id: missing.index() as u64,
            }),
            None => Ok(()),
        }
    }

    fn check_faces(&self, owner: Entity, faces: &[FaceId]) -> Result<(), MeshError> {
        if self.check == ReferenceCheck::Deferred {
            return Ok(());
        }
        let len = self.mesh.faces.len();
        match faces.iter().find(|f| f.index() >= len) {
            Some(missing) => Err(MeshError::Reference {
                owner,
                target: EntityKind::Face,
                id: missing.index() as u64,
            }),
            None => Ok(()),
        }
    }
}
