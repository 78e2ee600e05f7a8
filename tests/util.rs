#![allow(dead_code)]
use mesh_interchange::mesh::{CanonicalMesh, MeshBuilder, ReferenceCheck};
use mesh_interchange::topology::cell_type::CellType;
use mesh_interchange::topology::ids::{CellId, NodeId};
use std::fs;
use std::path::{Path, PathBuf};

pub fn nids(ids: &[usize]) -> Vec<NodeId> {
    ids.iter().map(|&i| NodeId::new(i)).collect()
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const UNIT_TET: [[f64; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

pub fn unit_tet() -> CanonicalMesh {
    let mut b = MeshBuilder::new();
    for c in UNIT_TET {
        b.add_node(c);
    }
    b.add_cell(CellType::Tetrahedron, nids(&[0, 1, 2, 3])).unwrap();
    b.build()
}

/// Unit tetrahedron with its four boundary faces in named groups: `base`
/// (the z = 0 face), `walls` (the other three) and `boundary` (all four),
/// plus a `solid` cell group.
pub fn grouped_tet() -> CanonicalMesh {
    let mut b = MeshBuilder::new();
    for c in UNIT_TET {
        b.add_node(c);
    }
    let walls = [[0, 1, 3], [1, 2, 3], [2, 0, 3]]
        .iter()
        .map(|face| b.add_face(nids(face)).unwrap())
        .collect::<Vec<_>>();
    let base = b.add_face(nids(&[0, 2, 1])).unwrap();
    b.add_cell(CellType::Tetrahedron, nids(&[0, 1, 2, 3])).unwrap();
    b.add_face_group("base", vec![base]).unwrap();
    b.add_face_group("walls", walls.clone()).unwrap();
    let mut boundary = walls;
    boundary.push(base);
    b.add_face_group("boundary", boundary).unwrap();
    b.add_cell_group("solid", vec![CellId::new(0)]).unwrap();
    b.build()
}

/// Unit cube hexahedron (nodes 0..8) plus a tetrahedron on its top face
/// reaching up to node 8.
pub fn tet_and_hex() -> CanonicalMesh {
    let mut b = MeshBuilder::new();
    for z in [0.0, 1.0] {
        b.add_node([0.0, 0.0, z]);
        b.add_node([1.0, 0.0, z]);
        b.add_node([1.0, 1.0, z]);
        b.add_node([0.0, 1.0, z]);
    }
    b.add_node([0.0, 0.0, 2.0]);
    b.add_cell(CellType::Hexahedron, nids(&[0, 1, 2, 3, 4, 5, 6, 7]))
        .unwrap();
    b.add_cell(CellType::Tetrahedron, nids(&[4, 5, 7, 8])).unwrap();
    b.build()
}

/// `nx * ny * nz` node-based hexahedra on a unit-spaced lattice.
pub fn hex_grid(nx: usize, ny: usize, nz: usize) -> CanonicalMesh {
    let mut b = MeshBuilder::new().with_reference_check(ReferenceCheck::Deferred);
    let node = |i: usize, j: usize, k: usize| NodeId::new(i + (nx + 1) * (j + (ny + 1) * k));
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                b.add_node([i as f64, j as f64, k as f64]);
            }
        }
    }
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let nodes = vec![
                    node(i, j, k),
                    node(i + 1, j, k),
                    node(i + 1, j + 1, k),
                    node(i, j + 1, k),
                    node(i, j, k + 1),
                    node(i + 1, j, k + 1),
                    node(i + 1, j + 1, k + 1),
                    node(i, j + 1, k + 1),
                ];
                b.add_cell(CellType::Hexahedron, nodes).unwrap();
            }
        }
    }
    b.build()
}

pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Gmsh 2.2 file with one tetrahedron and one hexahedron sharing nothing.
pub const TET_HEX_MSH: &str = "$MeshFormat
2.2 0 8
$EndMeshFormat
$Nodes
12
1 0 0 0
2 1 0 0
3 1 1 0
4 0 1 0
5 0 0 1
6 1 0 1
7 1 1 1
8 0 1 1
9 3 0 0
10 4 0 0
11 3 1 0
12 3 0 1
$EndNodes
$Elements
2
1 5 2 0 1 1 2 3 4 5 6 7 8
2 4 2 0 1 9 10 11 12
$EndElements
";

/// Gmsh 2.2 tetrahedron whose base triangle is the `inlet` physical group
/// and whose volume is `fluid`.
pub const GROUPED_TET_MSH: &str = "$MeshFormat
2.2 0 8
$EndMeshFormat
$PhysicalNames
2
2 1 \"inlet\"
3 2 \"fluid\"
$EndPhysicalNames
$Nodes
4
1 0 0 0
2 1 0 0
3 0 1 0
4 0 0 1
$EndNodes
$Elements
2
1 2 2 1 1 1 3 2
2 4 2 2 1 1 2 3 4
$EndElements
";
