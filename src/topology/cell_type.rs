//! Cell type metadata: element arity and local face tables.
//!
//! Node orderings follow the VTK/Gmsh convention for linear elements:
//!
//! - **Tetrahedron**: `[v0, v1, v2, v3]`.
//! - **Hexahedron**: bottom face `[0, 1, 2, 3]`, top face `[4, 5, 6, 7]`.
//! - **Prism**: bottom triangle `[0, 1, 2]`, top triangle `[3, 4, 5]`.
//! - **Pyramid**: base quad `[0, 1, 2, 3]` and apex `4`.

/// Cell types representable by the canonical mesh.
#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, serde::Serialize, serde::Deserialize,
)]
pub enum CellType {
    /// 2D simplex (triangle).
    Triangle,
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 2D polygon with a variable number of vertices.
    Polygon,
    /// 3D simplex (tet).
    Tetrahedron,
    /// 3D tensor-product cell (hex).
    Hexahedron,
    /// 3D wedge/prism.
    Prism,
    /// 3D pyramid.
    Pyramid,
    /// General polyhedron described by its faces.
    Polyhedron,
}

const TET_FACES: &[&[usize]] = &[&[0, 1, 3], &[1, 2, 3], &[2, 0, 3], &[0, 2, 1]];
const HEX_FACES: &[&[usize]] = &[
    &[0, 4, 7, 3],
    &[1, 2, 6, 5],
    &[0, 1, 5, 4],
    &[3, 7, 6, 2],
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
];
const PRISM_FACES: &[&[usize]] = &[
    &[0, 1, 2],
    &[3, 5, 4],
    &[0, 3, 4, 1],
    &[1, 4, 5, 2],
    &[2, 5, 3, 0],
];
const PYRAMID_FACES: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[0, 1, 4],
    &[1, 2, 4],
    &[2, 3, 4],
    &[3, 0, 4],
];

impl CellType {
    /// Returns the topological dimension of the cell.
    pub fn dimension(self) -> u8 {
        match self {
            CellType::Triangle | CellType::Quadrilateral | CellType::Polygon => 2,
            CellType::Tetrahedron
            | CellType::Hexahedron
            | CellType::Prism
            | CellType::Pyramid
            | CellType::Polyhedron => 3,
        }
    }

    /// Number of nodes for fixed-arity types; `None` for polygons and polyhedra.
    pub fn node_count(self) -> Option<usize> {
        match self {
            CellType::Triangle => Some(3),
            CellType::Quadrilateral => Some(4),
            CellType::Tetrahedron => Some(4),
            CellType::Pyramid => Some(5),
            CellType::Prism => Some(6),
            CellType::Hexahedron => Some(8),
            CellType::Polygon | CellType::Polyhedron => None,
        }
    }

    /// Local face connectivity of a fixed-arity volume type, as indices into
    /// the cell's node list. Empty for 2D types and general polyhedra.
    pub fn local_faces(self) -> &'static [&'static [usize]] {
        match self {
            CellType::Tetrahedron => TET_FACES,
            CellType::Hexahedron => HEX_FACES,
            CellType::Prism => PRISM_FACES,
            CellType::Pyramid => PYRAMID_FACES,
            _ => &[],
        }
    }

    /// Number of faces bounding a fixed-arity volume type.
    pub fn face_count(self) -> Option<usize> {
        match self.local_faces().len() {
            0 => None,
            n => Some(n),
        }
    }

    /// Volume type with the given node count.
    pub fn from_volume_arity(nodes: usize) -> Option<Self> {
        match nodes {
            4 => Some(CellType::Tetrahedron),
            5 => Some(CellType::Pyramid),
            6 => Some(CellType::Prism),
            8 => Some(CellType::Hexahedron),
            _ => None,
        }
    }

    /// Planar type with the given node count.
    pub fn from_planar_arity(nodes: usize) -> Option<Self> {
        match nodes {
            0..=2 => None,
            3 => Some(CellType::Triangle),
            4 => Some(CellType::Quadrilateral),
            _ => Some(CellType::Polygon),
        }
    }
}
