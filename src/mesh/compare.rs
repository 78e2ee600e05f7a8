//! Reordering-invariant comparison of two meshes.
//!
//! Nodes are paired one-to-one with a partner no further than the tolerance
//! on every axis; faces, cells and named groups are then compared as
//! multisets after every reference has been rewritten in terms of that
//! pairing. Face orientation is taken into account, table order is not.

use super::{CanonicalMesh, CellTopology, GroupMembers};
use crate::topology::cell_type::CellType;
use crate::topology::ids::{EntityKind, NodeId};
use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use std::collections::VecDeque;
use thiserror::Error;

/// First difference found between two meshes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshMismatch {
    #[error("{kind} count differs: {left} vs {right}")]
    Count {
        kind: EntityKind,
        left: usize,
        right: usize,
    },
    #[error("node {left} at {left_coords:?} does not match {right_coords:?}")]
    Node {
        left: NodeId,
        left_coords: [f64; 3],
        right_coords: [f64; 3],
    },
    #[error("face tables differ: {left:?} vs {right:?}")]
    Faces { left: Vec<usize>, right: Vec<usize> },
    #[error("cell tables differ at {cell_type:?}")]
    Cells { cell_type: CellType },
    #[error("{kind} group `{name}` differs")]
    Group { kind: EntityKind, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum CellKey {
    Nodes(CellType, Vec<usize>),
    Faces(CellType, Vec<Vec<usize>>),
}

impl CellKey {
    fn cell_type(&self) -> CellType {
        match self {
            CellKey::Nodes(ty, _) | CellKey::Faces(ty, _) => *ty,
        }
    }
}

/// Compares two meshes up to `tolerance` on coordinates and up to
/// reordering of every table.
pub fn compare_meshes(
    left: &CanonicalMesh,
    right: &CanonicalMesh,
    tolerance: f64,
) -> Result<(), MeshMismatch> {
    for (kind, l, r) in [
        (EntityKind::Node, left.node_count(), right.node_count()),
        (EntityKind::Face, left.face_count(), right.face_count()),
        (EntityKind::Cell, left.cell_count(), right.cell_count()),
    ] {
        if l != r {
            return Err(MeshMismatch::Count {
                kind,
                left: l,
                right: r,
            });
        }
    }

    let tolerance = tolerance.max(f64::EPSILON);
    // Left nodes keep their own index as rank; right nodes take their partner's.
    let left_rank: Vec<usize> = (0..left.node_count()).collect();
    let right_rank = match_nodes(left, right, tolerance)?;

    let left_faces = face_keys(left, &left_rank);
    let right_faces = face_keys(right, &right_rank);
    let mut lf = left_faces.clone();
    let mut rf = right_faces.clone();
    lf.sort_unstable();
    rf.sort_unstable();
    if let Some((l, r)) = lf.into_iter().zip(rf).find(|(l, r)| l != r) {
        return Err(MeshMismatch::Faces { left: l, right: r });
    }

    let left_cells = cell_keys(left, &left_rank, &left_faces);
    let right_cells = cell_keys(right, &right_rank, &right_faces);
    let mut lc = left_cells.clone();
    let mut rc = right_cells.clone();
    lc.sort_unstable();
    rc.sort_unstable();
    if let Some((l, _)) = lc.into_iter().zip(rc).find(|(l, r)| l != r) {
        return Err(MeshMismatch::Cells {
            cell_type: l.cell_type(),
        });
    }

    let left_groups = group_keys(left, &left_faces, &left_cells);
    let right_groups = group_keys(right, &right_faces, &right_cells);
    let differing = left_groups
        .iter()
        .zip_longest(&right_groups)
        .find(|pair| !pair.clone().both().is_some_and(|(l, r)| l == r));
    if let Some(pair) = differing {
        let (kind, name, _) = pair.reduce(|l, r| l.min(r));
        return Err(MeshMismatch::Group {
            kind: *kind,
            name: name.clone(),
        });
    }
    Ok(())
}

fn chebyshev(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter()
        .zip(&b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Pairs every right node with a distinct left node within `tolerance`.
///
/// Candidates come from a spatial hash with buckets of edge `tolerance`.
/// Each left node first takes its nearest free candidate; nodes left over
/// are placed along augmenting paths, so a pairing is found whenever one
/// exists. Returns the partner's index for every right node.
fn match_nodes(
    left: &CanonicalMesh,
    right: &CanonicalMesh,
    tolerance: f64,
) -> Result<Vec<usize>, MeshMismatch> {
    let bucket_of = |c: [f64; 3]| c.map(|v| (v / tolerance).floor() as i64);
    let mut buckets: HashMap<[i64; 3], Vec<usize>> = HashMap::new();
    for (idx, node) in right.nodes.iter().enumerate() {
        buckets.entry(bucket_of(node.coords)).or_default().push(idx);
    }

    let candidates: Vec<Vec<usize>> = left
        .nodes
        .iter()
        .map(|node| {
            let key = bucket_of(node.coords);
            let mut near: Vec<(f64, usize)> = Vec::new();
            for offset in itertools::iproduct!(-1i64..=1, -1i64..=1, -1i64..=1) {
                let [Some(x), Some(y), Some(z)] = [
                    key[0].checked_add(offset.0),
                    key[1].checked_add(offset.1),
                    key[2].checked_add(offset.2),
                ] else {
                    continue;
                };
                for &other in buckets.get(&[x, y, z]).into_iter().flatten() {
                    let d = chebyshev(node.coords, right.nodes[other].coords);
                    if d <= tolerance {
                        near.push((d, other));
                    }
                }
            }
            near.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            near.into_iter().map(|(_, other)| other).collect()
        })
        .collect();

    let mut partner_of_left: Vec<Option<usize>> = vec![None; left.nodes.len()];
    let mut partner_of_right: Vec<Option<usize>> = vec![None; right.nodes.len()];
    for (l, near) in candidates.iter().enumerate() {
        if let Some(&r) = near.iter().find(|&&r| partner_of_right[r].is_none()) {
            partner_of_left[l] = Some(r);
            partner_of_right[r] = Some(l);
        }
    }
    for l in 0..left.nodes.len() {
        if partner_of_left[l].is_none()
            && !augment(l, &candidates, &mut partner_of_left, &mut partner_of_right)
        {
            let left_coords = left.nodes[l].coords;
            let right_coords = partner_of_right
                .iter()
                .positions(Option::is_none)
                .map(|r| right.nodes[r].coords)
                .min_by(|a, b| {
                    chebyshev(left_coords, *a).total_cmp(&chebyshev(left_coords, *b))
                })
                .unwrap_or(left_coords);
            return Err(MeshMismatch::Node {
                left: NodeId::new(l),
                left_coords,
                right_coords,
            });
        }
    }
    Ok(partner_of_right
        .into_iter()
        .map(|l| l.unwrap_or_default())
        .collect())
}

/// Breadth-first search for an alternating path from the unpaired `start`
/// to a free right node; flips the path when one is found.
fn augment(
    start: usize,
    candidates: &[Vec<usize>],
    partner_of_left: &mut [Option<usize>],
    partner_of_right: &mut [Option<usize>],
) -> bool {
    let mut reached_from: HashMap<usize, usize> = HashMap::new();
    let mut seen: HashSet<usize> = HashSet::new();
    let mut queue = VecDeque::from([start]);
    while let Some(l) = queue.pop_front() {
        for &r in &candidates[l] {
            if !seen.insert(r) {
                continue;
            }
            reached_from.insert(r, l);
            let Some(owner) = partner_of_right[r] else {
                let mut r = r;
                loop {
                    let l = reached_from[&r];
                    let previous = partner_of_left[l].replace(r);
                    partner_of_right[r] = Some(l);
                    match previous {
                        Some(p) => r = p,
                        None => return true,
                    }
                }
            };
            queue.push_back(owner);
        }
    }
    false
}

// Dangling references map past the end so they only ever match each other.
fn node_rank(rank: &[usize], id: NodeId) -> usize {
    rank.get(id.index())
        .copied()
        .unwrap_or(rank.len() + id.index())
}

fn face_keys(mesh: &CanonicalMesh, rank: &[usize]) -> Vec<Vec<usize>> {
    mesh.faces
        .iter()
        .map(|f| {
            f.oriented_nodes()
                .into_iter()
                .map(|n| node_rank(rank, n))
                .collect()
        })
        .collect()
}

fn cell_keys(mesh: &CanonicalMesh, rank: &[usize], faces: &[Vec<usize>]) -> Vec<CellKey> {
    mesh.cells
        .iter()
        .map(|c| match &c.topology {
            CellTopology::Nodes(nodes) => CellKey::Nodes(
                c.cell_type,
                nodes.iter().map(|&n| node_rank(rank, n)).collect(),
            ),
            CellTopology::Faces(ids) => CellKey::Faces(
                c.cell_type,
                ids.iter()
                    .map(|f| faces.get(f.index()).cloned().unwrap_or_default())
                    .collect(),
            ),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum MemberKey {
    Face(Option<Vec<usize>>),
    Cell(Option<CellKey>),
}

/// Groups sorted by kind and name, each with its members as sorted keys.
fn group_keys(
    mesh: &CanonicalMesh,
    faces: &[Vec<usize>],
    cells: &[CellKey],
) -> Vec<(EntityKind, String, Vec<MemberKey>)> {
    mesh.groups
        .iter()
        .map(|group| {
            let members = match &group.members {
                GroupMembers::Faces(ids) => ids
                    .iter()
                    .map(|f| MemberKey::Face(faces.get(f.index()).cloned()))
                    .sorted()
                    .collect(),
                GroupMembers::Cells(ids) => ids
                    .iter()
                    .map(|c| MemberKey::Cell(cells.get(c.index()).cloned()))
                    .sorted()
                    .collect(),
            };
            (group.kind(), group.name.clone(), members)
        })
        .sorted()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshBuilder;

    fn two_triangles(swap: bool, shift: f64) -> CanonicalMesh {
        let mut b = MeshBuilder::new();
        let coords = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let ids: Vec<NodeId> = if swap {
            coords
                .iter()
                .rev()
                .map(|c| b.add_node(c.map(|v| v + shift)))
                .collect()
        } else {
            coords.iter().map(|c| b.add_node(c.map(|v| v + shift))).collect()
        };
        // ids[k] always addresses coords[k] or its mirror; map back by coordinate.
        let at = |k: usize| if swap { ids[3 - k] } else { ids[k] };
        let tris = [[0, 1, 2], [0, 2, 3]];
        let order: Vec<_> = if swap {
            tris.iter().rev().collect()
        } else {
            tris.iter().collect()
        };
        for t in order {
            b.add_cell(CellType::Triangle, t.iter().map(|&k| at(k)).collect())
                .unwrap();
        }
        b.build()
    }

    fn points(coords: &[[f64; 3]]) -> CanonicalMesh {
        let mut b = MeshBuilder::new();
        for &c in coords {
            b.add_node(c);
        }
        b.build()
    }

    #[test]
    fn reordered_tables_compare_equal() {
        let a = two_triangles(false, 0.0);
        let b = two_triangles(true, 4e-7);
        assert_eq!(compare_meshes(&a, &b, 1e-6), Ok(()));
    }

    #[test]
    fn count_mismatch_is_reported() {
        let a = two_triangles(false, 0.0);
        let b = MeshBuilder::new().build();
        assert!(matches!(
            compare_meshes(&a, &b, 1e-6),
            Err(MeshMismatch::Count {
                kind: EntityKind::Node,
                ..
            })
        ));
    }

    #[test]
    fn moved_node_is_reported() {
        let a = two_triangles(false, 0.0);
        let b = two_triangles(false, 1e-3);
        assert!(matches!(
            compare_meshes(&a, &b, 1e-6),
            Err(MeshMismatch::Node { .. })
        ));
    }

    #[test]
    fn nodes_straddling_a_grid_line_still_match() {
        let left = points(&[[2e-7, 1.0, 0.0], [4.9e-7, 5.0, 0.0], [1e-6, 0.0, 0.0]]);
        let right = points(&[[2e-7, 1.0, 0.0], [5.1e-7, 5.0, 0.0], [1e-6, 0.0, 0.0]]);
        assert_eq!(compare_meshes(&left, &right, 1e-6), Ok(()));
        assert_eq!(compare_meshes(&right, &left, 1e-6), Ok(()));
    }

    #[test]
    fn crowded_nodes_are_reassigned() {
        // Node 0 is nearest to 0.9 but only 1.8 can use it.
        let left = points(&[[0.0, 0.0, 0.0], [1.8, 0.0, 0.0]]);
        let right = points(&[[0.9, 0.0, 0.0], [-0.95, 0.0, 0.0]]);
        assert_eq!(compare_meshes(&left, &right, 1.0), Ok(()));

        let far = points(&[[0.9, 0.0, 0.0], [-1.5, 0.0, 0.0]]);
        assert_eq!(
            compare_meshes(&left, &far, 1.0),
            Err(MeshMismatch::Node {
                left: NodeId::new(1),
                left_coords: [1.8, 0.0, 0.0],
                right_coords: [-1.5, 0.0, 0.0],
            })
        );
    }

    #[test]
    fn changed_connectivity_is_reported() {
        let a = two_triangles(false, 0.0);
        let mut b = MeshBuilder::new();
        for n in a.nodes() {
            b.add_node(n.coords);
        }
        let id = NodeId::new;
        b.add_cell(CellType::Triangle, vec![id(0), id(1), id(2)])
            .unwrap();
        b.add_cell(CellType::Triangle, vec![id(0), id(3), id(2)])
            .unwrap();
        assert!(matches!(
            compare_meshes(&a, &b.build(), 1e-6),
            Err(MeshMismatch::Cells { .. })
        ));
    }

    #[test]
    fn groups_compare_by_members_not_ids() {
        use crate::topology::ids::CellId;

        let grouped = |swap: bool, name: &str| {
            let mesh = two_triangles(swap, 0.0);
            let mut b = MeshBuilder::new();
            for n in mesh.nodes() {
                b.add_node(n.coords);
            }
            for c in mesh.cells() {
                b.push_cell(c.clone()).unwrap();
            }
            // Cell 0 of the unswapped mesh is cell 1 of the swapped one.
            let first = CellId::new(usize::from(swap));
            b.add_cell_group(name, vec![first]).unwrap();
            b.build()
        };
        assert_eq!(
            compare_meshes(&grouped(false, "left"), &grouped(true, "left"), 1e-6),
            Ok(())
        );
        assert_eq!(
            compare_meshes(&grouped(false, "left"), &grouped(true, "right"), 1e-6),
            Err(MeshMismatch::Group {
                kind: EntityKind::Cell,
                name: "left".into(),
            })
        );
        assert_eq!(
            compare_meshes(&grouped(false, "left"), &two_triangles(false, 0.0), 1e-6),
            Err(MeshMismatch::Group {
                kind: EntityKind::Cell,
                name: "left".into(),
            })
        );
    }
}
