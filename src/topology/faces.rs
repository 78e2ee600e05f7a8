//! Face derivation for node-based volume cells.
//!
//! Formats whose cells are lists of faces (the OpenOasis CSV layout, for
//! one) need every cell expressed against a face table. This module expands
//! tetrahedra, hexahedra, prisms and pyramids through their local face
//! tables and shares faces between neighbouring cells by node set.
//!
//! A shared face keeps the orientation of the first cell that introduced
//! it, so it points outward for that cell and inward for its neighbour.

use crate::mesh::{CanonicalMesh, Cell, CellTopology, Face, FaceCapability};
use crate::topology::cell_type::CellType;
use crate::topology::ids::{CellId, FaceId, NodeId};
use hashbrown::HashMap;
use thiserror::Error;

/// Why a mesh cannot be expressed with face-based cells.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FaceDerivationError {
    /// 2D cells would need edge faces, which the face table cannot hold.
    #[error("cell {cell} is a planar {cell_type:?}")]
    PlanarCell { cell: CellId, cell_type: CellType },
    /// The node list does not match the type's arity.
    #[error("cell {cell} has {found} nodes, {cell_type:?} needs {expected:?}")]
    Arity {
        cell: CellId,
        cell_type: CellType,
        expected: Option<usize>,
        found: usize,
    },
}

fn face_key(nodes: &[NodeId]) -> Vec<NodeId> {
    let mut key = nodes.to_vec();
    key.sort_unstable();
    key
}

/// Returns a copy of `mesh` where every node-based volume cell has been
/// replaced by a face-based cell of the same type.
///
/// Existing face-table entries are reused when a derived face has the same
/// node set; face-based cells pass through unchanged. Face and cell ids of
/// the input stay valid, so named groups carry over as they are.
pub fn derive_face_topology(mesh: &CanonicalMesh) -> Result<CanonicalMesh, FaceDerivationError> {
    let mut faces: Vec<Face> = mesh.faces().to_vec();
    let mut by_nodes: HashMap<Vec<NodeId>, FaceId> = HashMap::with_capacity(faces.len());
    for (idx, face) in faces.iter().enumerate() {
        by_nodes
            .entry(face_key(face.nodes()))
            .or_insert(FaceId::new(idx));
    }

    let mut cells = Vec::with_capacity(mesh.cell_count());
    for (idx, cell) in mesh.cells().iter().enumerate() {
        let nodes = match &cell.topology {
            CellTopology::Faces(_) => {
                cells.push(cell.clone());
                continue;
            }
            CellTopology::Nodes(nodes) => nodes,
        };
        let cell_id = CellId::new(idx);
        if cell.cell_type.dimension() < 3 {
            return Err(FaceDerivationError::PlanarCell {
                cell: cell_id,
                cell_type: cell.cell_type,
            });
        }
        let expected = cell.cell_type.node_count();
        if expected != Some(nodes.len()) {
            return Err(FaceDerivationError::Arity {
                cell: cell_id,
                cell_type: cell.cell_type,
                expected,
                found: nodes.len(),
            });
        }

        let mut cell_faces = Vec::with_capacity(cell.cell_type.local_faces().len());
        for local in cell.cell_type.local_faces() {
            let face_nodes: Vec<NodeId> = local.iter().map(|&l| nodes[l]).collect();
            let id = *by_nodes.entry(face_key(&face_nodes)).or_insert_with(|| {
                faces.push(Face::new(face_nodes, false));
                FaceId::new(faces.len() - 1)
            });
            cell_faces.push(id);
        }
        cells.push(Cell::from_faces(cell.cell_type, cell_faces));
    }

    log::debug!(
        "derived face topology: {} faces ({} pre-existing) for {} cells",
        faces.len(),
        mesh.face_count(),
        cells.len()
    );

    Ok(CanonicalMesh {
        nodes: mesh.nodes().to_vec(),
        faces,
        cells,
        groups: mesh.groups().to_vec(),
        face_capability: FaceCapability::Present,
        sanity: Default::default(),
    })
}
