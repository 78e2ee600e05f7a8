//! Topology validation for canonical meshes.
//!
//! [`validate_mesh`] runs three passes in a fixed order and collects every
//! finding instead of stopping at the first one:
//!
//! 1. **References**: each face/cell node reference, each cell face
//!    reference and each named group member must resolve.
//! 2. **Element shape**: node counts must match the arity table of
//!    [`CellType`], face-based cells must be closed shells built from valid
//!    faces, nothing may repeat a node or face.
//! 3. **Coincident nodes**: nodes closer than the configured epsilon are
//!    reported as warnings; they are legal but usually unintended.
//!
//! The validator never mutates the mesh. Use [`ValidationReport::apply_to`]
//! to record the outcome as sanity flags.

use crate::mesh::{CanonicalMesh, CellTopology, Face};
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;
use crate::topology::ids::{CellId, Entity, EntityKind, FaceId, NodeId};
use hashbrown::HashMap;
use itertools::Itertools;
use std::fmt;
use thiserror::Error;

/// Validation toggles and tolerances.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Report node pairs closer than `coincident_epsilon`.
    pub check_coincident_nodes: bool,
    /// Distance under which two nodes count as coincident.
    pub coincident_epsilon: f64,
    /// Require every face-based cell to be a closed shell.
    pub check_closed_shells: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self::all()
    }
}

impl ValidationOptions {
    /// Enable all checks with a `1e-9` coincidence epsilon.
    pub fn all() -> Self {
        Self {
            check_coincident_nodes: true,
            coincident_epsilon: 1e-9,
            check_closed_shells: true,
        }
    }

    /// Only the fatal reference and shape checks.
    pub fn structural() -> Self {
        Self {
            check_coincident_nodes: false,
            ..Self::all()
        }
    }
}

/// Why an element is malformed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MalformedReason {
    #[error("non-finite coordinate {coords:?}")]
    NonFiniteCoordinate { coords: [f64; 3] },
    #[error("polygon has {found} nodes, at least 3 required")]
    TooFewNodes { found: usize },
    #[error("{cell_type:?} expects {expected} nodes, found {found}")]
    ArityMismatch {
        cell_type: CellType,
        expected: usize,
        found: usize,
    },
    #[error("node {node} appears more than once")]
    RepeatedNode { node: NodeId },
    #[error("{cell_type:?} cannot be described by a node list")]
    RequiresFaces { cell_type: CellType },
    #[error("{cell_type:?} cannot be described by a face list")]
    RequiresNodes { cell_type: CellType },
    #[error("polyhedron has {found} faces, at least 4 required")]
    TooFewFaces { found: usize },
    #[error("{cell_type:?} expects {expected} faces, found {found}")]
    FaceCountMismatch {
        cell_type: CellType,
        expected: usize,
        found: usize,
    },
    #[error("face {face} appears more than once")]
    RepeatedFace { face: FaceId },
    #[error("bounding face {face} is itself malformed")]
    InvalidFace { face: FaceId },
    #[error("edge ({a}, {b}) is used by {uses} faces, expected 2")]
    OpenShell { a: NodeId, b: NodeId, uses: usize },
}

/// Whether a finding stops a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Fatal,
}

/// One validator observation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Finding {
    /// An entity points at ids missing from the target table.
    #[error("{entity} references missing {target} ids [{}]", .missing.iter().join(", "))]
    DanglingReference {
        entity: Entity,
        target: EntityKind,
        missing: Vec<usize>,
    },
    /// A named group lists faces or cells missing from the mesh.
    #[error("group `{group}` references missing {target} ids [{}]", .missing.iter().join(", "))]
    DanglingGroupMember {
        group: String,
        target: EntityKind,
        missing: Vec<usize>,
    },
    /// An entity violates the arity or well-formedness rules.
    #[error("{entity} is malformed: {reason}")]
    MalformedElement {
        entity: Entity,
        reason: MalformedReason,
    },
    /// Two nodes lie within the coincidence epsilon.
    #[error("nodes {first} and {second} are coincident (distance {distance:e})")]
    CoincidentNodes {
        first: NodeId,
        second: NodeId,
        distance: f64,
    },
}

impl Finding {
    pub fn severity(&self) -> Severity {
        match self {
            Finding::CoincidentNodes { .. } => Severity::Warning,
            _ => Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Ordered list of findings for one mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn has_fatal(&self) -> bool {
        self.findings.iter().any(Finding::is_fatal)
    }

    pub fn fatal(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_fatal())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.is_fatal())
    }

    /// Records the outcome on the mesh.
    pub fn apply_to(&self, mesh: &mut CanonicalMesh) {
        mesh.sanity.validated = true;
        mesh.sanity.coincident_node_pairs = self
            .findings
            .iter()
            .filter(|f| matches!(f, Finding::CoincidentNodes { .. }))
            .count();
    }

    /// `Err(ValidationFailed)` when any finding is fatal.
    pub fn into_result(self) -> Result<Self, MeshError> {
        if self.has_fatal() {
            Err(MeshError::ValidationFailed { report: self })
        } else {
            Ok(self)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return f.write_str("no findings");
        }
        write!(f, "{}", self.findings.iter().join("; "))
    }
}

/// Validate mesh topology and geometry sanity.
pub fn validate_mesh(mesh: &CanonicalMesh, options: &ValidationOptions) -> ValidationReport {
    let mut findings = Vec::new();

    check_references(mesh, &mut findings);
    check_elements(mesh, options, &mut findings);
    if options.check_coincident_nodes {
        check_coincident_nodes(mesh, options.coincident_epsilon, &mut findings);
    }

    ValidationReport { findings }
}

fn missing_nodes(mesh: &CanonicalMesh, nodes: &[NodeId]) -> Vec<usize> {
    nodes
        .iter()
        .map(|n| n.index())
        .filter(|&i| i >= mesh.node_count())
        .unique()
        .collect()
}

fn check_references(mesh: &CanonicalMesh, findings: &mut Vec<Finding>) {
    for (idx, face) in mesh.faces().iter().enumerate() {
        let missing = missing_nodes(mesh, face.nodes());
        if !missing.is_empty() {
            findings.push(Finding::DanglingReference {
                entity: Entity::Face(FaceId::new(idx)),
                target: EntityKind::Node,
                missing,
            });
        }
    }

    for (idx, cell) in mesh.cells().iter().enumerate() {
        let (target, missing) = match &cell.topology {
            CellTopology::Nodes(nodes) => (EntityKind::Node, missing_nodes(mesh, nodes)),
            CellTopology::Faces(faces) => (
                EntityKind::Face,
                faces
                    .iter()
                    .map(|f| f.index())
                    .filter(|&i| i >= mesh.face_count())
                    .unique()
                    .collect(),
            ),
        };
        if !missing.is_empty() {
            findings.push(Finding::DanglingReference {
                entity: Entity::Cell(CellId::new(idx)),
                target,
                missing,
            });
        }
    }

    for group in mesh.groups() {
        let target = group.kind();
        let len = match target {
            EntityKind::Face => mesh.face_count(),
            _ => mesh.cell_count(),
        };
        let missing: Vec<usize> = group
            .members
            .indices()
            .into_iter()
            .filter(|&i| i >= len)
            .unique()
            .collect();
        if !missing.is_empty() {
            findings.push(Finding::DanglingGroupMember {
                group: group.name.clone(),
                target,
                missing,
            });
        }
    }
}

fn first_repeated<T: Copy + Eq + std::hash::Hash>(items: &[T]) -> Option<T> {
    let mut seen = hashbrown::HashSet::with_capacity(items.len());
    items.iter().copied().find(|item| !seen.insert(*item))
}

/// Shape problem of a face on its own, ignoring dangling references.
fn face_defect(face: &Face) -> Option<MalformedReason> {
    if face.arity() < 3 {
        return Some(MalformedReason::TooFewNodes { found: face.arity() });
    }
    first_repeated(face.nodes()).map(|node| MalformedReason::RepeatedNode { node })
}

fn check_elements(mesh: &CanonicalMesh, options: &ValidationOptions, findings: &mut Vec<Finding>) {
    for (idx, node) in mesh.nodes().iter().enumerate() {
        if node.coords.iter().any(|v| !v.is_finite()) {
            findings.push(Finding::MalformedElement {
                entity: Entity::Node(NodeId::new(idx)),
                reason: MalformedReason::NonFiniteCoordinate {
                    coords: node.coords,
                },
            });
        }
    }

    let mut bad_faces = vec![false; mesh.face_count()];
    for (idx, face) in mesh.faces().iter().enumerate() {
        if let Some(reason) = face_defect(face) {
            bad_faces[idx] = true;
            findings.push(Finding::MalformedElement {
                entity: Entity::Face(FaceId::new(idx)),
                reason,
            });
        }
    }

    for (idx, cell) in mesh.cells().iter().enumerate() {
        let reason = match &cell.topology {
            CellTopology::Nodes(nodes) => node_cell_defect(cell.cell_type, nodes),
            CellTopology::Faces(faces) => {
                face_cell_defect(mesh, cell.cell_type, faces, &bad_faces, options)
            }
        };
        if let Some(reason) = reason {
            findings.push(Finding::MalformedElement {
                entity: Entity::Cell(CellId::new(idx)),
                reason,
            });
        }
    }
}

fn node_cell_defect(cell_type: CellType, nodes: &[NodeId]) -> Option<MalformedReason> {
    match cell_type {
        CellType::Polyhedron => return Some(MalformedReason::RequiresFaces { cell_type }),
        CellType::Polygon if nodes.len() < 3 => {
            return Some(MalformedReason::TooFewNodes { found: nodes.len() });
        }
        _ => {}
    }
    if let Some(expected) = cell_type.node_count() {
        if nodes.len() != expected {
            return Some(MalformedReason::ArityMismatch {
                cell_type,
                expected,
                found: nodes.len(),
            });
        }
    }
    first_repeated(nodes).map(|node| MalformedReason::RepeatedNode { node })
}

fn face_cell_defect(
    mesh: &CanonicalMesh,
    cell_type: CellType,
    faces: &[FaceId],
    bad_faces: &[bool],
    options: &ValidationOptions,
) -> Option<MalformedReason> {
    if cell_type.dimension() < 3 {
        return Some(MalformedReason::RequiresNodes { cell_type });
    }
    match cell_type.face_count() {
        Some(expected) if faces.len() != expected => {
            return Some(MalformedReason::FaceCountMismatch {
                cell_type,
                expected,
                found: faces.len(),
            });
        }
        None if faces.len() < 4 => {
            return Some(MalformedReason::TooFewFaces { found: faces.len() });
        }
        _ => {}
    }
    if let Some(face) = first_repeated(faces) {
        return Some(MalformedReason::RepeatedFace { face });
    }
    // Dangling face ids were already reported by the reference pass.
    if faces.iter().any(|f| f.index() >= mesh.face_count()) {
        return None;
    }
    if let Some(&face) = faces.iter().find(|f| bad_faces[f.index()]) {
        return Some(MalformedReason::InvalidFace { face });
    }
    if options.check_closed_shells {
        return open_edge(mesh, faces);
    }
    None
}

/// In a closed shell every undirected edge borders exactly two faces.
fn open_edge(mesh: &CanonicalMesh, faces: &[FaceId]) -> Option<MalformedReason> {
    let mut uses: HashMap<(NodeId, NodeId), usize> = HashMap::new();
    let mut order = Vec::new();
    for face in faces.iter().filter_map(|&f| mesh.face(f)) {
        let nodes = face.nodes();
        for (i, &a) in nodes.iter().enumerate() {
            let b = nodes[(i + 1) % nodes.len()];
            let key = (a.min(b), a.max(b));
            let count = uses.entry(key).or_insert(0);
            if *count == 0 {
                order.push(key);
            }
            *count += 1;
        }
    }
    order.into_iter().find_map(|key| {
        let count = uses[&key];
        (count != 2).then_some(MalformedReason::OpenShell {
            a: key.0,
            b: key.1,
            uses: count,
        })
    })
}

const NEIGHBOUR_OFFSETS: [i64; 3] = [-1, 0, 1];

/// Spatial hashing with buckets of edge `epsilon`; candidate pairs only need
/// the 27 surrounding buckets. The float-to-int cast saturates, which keeps
/// nodes within `epsilon` of each other at most one bucket apart.
fn check_coincident_nodes(mesh: &CanonicalMesh, epsilon: f64, findings: &mut Vec<Finding>) {
    if epsilon <= 0.0 || !epsilon.is_finite() {
        return;
    }
    let bucket_of = |c: [f64; 3]| c.map(|v| (v / epsilon).floor() as i64);
    let mut buckets: HashMap<[i64; 3], Vec<usize>> = HashMap::new();

    for (idx, node) in mesh.nodes().iter().enumerate() {
        if node.coords.iter().any(|v| !v.is_finite()) {
            continue;
        }
        let key = bucket_of(node.coords);
        let mut hits = Vec::new();
        for dx in NEIGHBOUR_OFFSETS {
            for dy in NEIGHBOUR_OFFSETS {
                for dz in NEIGHBOUR_OFFSETS {
                    // Keys saturate for huge coordinates; past the edge there is no bucket.
                    let [Some(x), Some(y), Some(z)] = [
                        key[0].checked_add(dx),
                        key[1].checked_add(dy),
                        key[2].checked_add(dz),
                    ] else {
                        continue;
                    };
                    let Some(bucket) = buckets.get(&[x, y, z]) else {
                        continue;
                    };
                    for &other in bucket {
                        let distance = distance(mesh.nodes()[other].coords, node.coords);
                        if distance <= epsilon {
                            hits.push((other, distance));
                        }
                    }
                }
            }
        }
        hits.sort_by_key(|&(other, _)| other);
        findings.extend(hits.into_iter().map(|(other, distance)| {
            Finding::CoincidentNodes {
                first: NodeId::new(other),
                second: NodeId::new(idx),
                distance,
            }
        }));
        buckets.entry(key).or_default().push(idx);
    }
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter()
        .zip(&b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
