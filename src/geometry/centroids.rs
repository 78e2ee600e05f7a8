//! Face and cell centroids.
//!
//! A face centroid is the mean of its nodes. A cell given by nodes uses the
//! mean of its nodes; a cell given by faces uses the mean of its face
//! centroids. Any dangling reference yields `None`.

use super::mean;
use crate::mesh::{CanonicalMesh, CellTopology};
use crate::topology::ids::{CellId, FaceId};

pub fn face_centroid(mesh: &CanonicalMesh, id: FaceId) -> Option<[f64; 3]> {
    let face = mesh.face(id)?;
    let points = face
        .nodes()
        .iter()
        .map(|&n| mesh.node_coords(n))
        .collect::<Option<Vec<_>>>()?;
    mean(points)
}

pub fn cell_centroid(mesh: &CanonicalMesh, id: CellId) -> Option<[f64; 3]> {
    let cell = mesh.cell(id)?;
    let points = match &cell.topology {
        CellTopology::Nodes(nodes) => nodes
            .iter()
            .map(|&n| mesh.node_coords(n))
            .collect::<Option<Vec<_>>>()?,
        CellTopology::Faces(faces) => faces
            .iter()
            .map(|&f| face_centroid(mesh, f))
            .collect::<Option<Vec<_>>>()?,
    };
    mean(points)
}

/// Centroid of every face, in table order.
pub fn face_centroids(mesh: &CanonicalMesh) -> Vec<Option<[f64; 3]>> {
    (0..mesh.face_count())
        .map(|idx| face_centroid(mesh, FaceId::new(idx)))
        .collect()
}

/// Centroid of every cell, in table order.
pub fn cell_centroids(mesh: &CanonicalMesh) -> Vec<Option<[f64; 3]>> {
    (0..mesh.cell_count())
        .map(|idx| cell_centroid(mesh, CellId::new(idx)))
        .collect()
}
