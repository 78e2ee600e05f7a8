use crate::mesh::{CanonicalMesh, MeshBuilder, ReferenceCheck};
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;
use crate::topology::ids::{CellId, Entity, EntityKind, FaceId, NodeId};
use crate::topology::validation::{
    Finding, MalformedReason, Severity, ValidationOptions, validate_mesh,
};

fn nid(i: usize) -> NodeId {
    NodeId::new(i)
}

const CUBE: [[f64; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0],
];

fn builder_with_cube_nodes(check: ReferenceCheck) -> MeshBuilder {
    let mut b = MeshBuilder::new().with_reference_check(check);
    for c in CUBE {
        b.add_node(c);
    }
    b
}

/// Unit cube as a face-based polyhedron; `skip` drops one bounding face.
fn polyhedral_cube(skip: Option<usize>) -> CanonicalMesh {
    let mut b = builder_with_cube_nodes(ReferenceCheck::Eager);
    let mut faces = Vec::new();
    for (k, local) in CellType::Hexahedron.local_faces().iter().enumerate() {
        if Some(k) == skip {
            continue;
        }
        let nodes = local.iter().map(|&l| nid(l)).collect();
        faces.push(b.add_face(nodes).unwrap());
    }
    b.add_polyhedron(faces).unwrap();
    b.build()
}

fn unit_tet() -> CanonicalMesh {
    let mut b = builder_with_cube_nodes(ReferenceCheck::Eager);
    b.add_cell(CellType::Tetrahedron, vec![nid(0), nid(1), nid(3), nid(4)])
        .unwrap();
    b.build()
}

#[test]
fn clean_meshes_produce_empty_reports() {
    let options = ValidationOptions::all();
    assert!(validate_mesh(&unit_tet(), &options).is_clean());
    assert!(validate_mesh(&polyhedral_cube(None), &options).is_clean());
}

#[test]
fn dangling_references_list_every_missing_index() {
    let mut b = builder_with_cube_nodes(ReferenceCheck::Deferred);
    b.add_face(vec![nid(0), nid(9), nid(12), nid(9)]).unwrap();
    b.add_cell(CellType::Tetrahedron, vec![nid(0), nid(1), nid(2), nid(20)])
        .unwrap();
    b.add_polyhedron(vec![FaceId::new(0), FaceId::new(3)]).unwrap();
    let report = validate_mesh(&b.build(), &ValidationOptions::structural());

    let dangling: Vec<_> = report
        .findings()
        .iter()
        .filter(|f| matches!(f, Finding::DanglingReference { .. }))
        .cloned()
        .collect();
    assert_eq!(
        dangling,
        vec![
            Finding::DanglingReference {
                entity: Entity::Face(FaceId::new(0)),
                target: EntityKind::Node,
                missing: vec![9, 12],
            },
            Finding::DanglingReference {
                entity: Entity::Cell(CellId::new(0)),
                target: EntityKind::Node,
                missing: vec![20],
            },
            Finding::DanglingReference {
                entity: Entity::Cell(CellId::new(1)),
                target: EntityKind::Face,
                missing: vec![3],
            },
        ]
    );
    // Reference findings come before shape findings.
    assert!(matches!(
        report.findings()[0],
        Finding::DanglingReference { .. }
    ));
    assert!(report.has_fatal());
}

#[test]
fn dangling_group_members_are_fatal() {
    let mut b = MeshBuilder::new().with_reference_check(ReferenceCheck::Deferred);
    b.add_node([0.0, 0.0, 0.0]);
    b.add_face_group("outlet", vec![FaceId::new(3), FaceId::new(3)])
        .unwrap();
    b.add_cell_group("fluid", vec![CellId::new(0), CellId::new(1)])
        .unwrap();
    let report = validate_mesh(&b.build(), &ValidationOptions::all());
    assert_eq!(
        report.findings(),
        &[
            Finding::DanglingGroupMember {
                group: "outlet".into(),
                target: EntityKind::Face,
                missing: vec![3],
            },
            Finding::DanglingGroupMember {
                group: "fluid".into(),
                target: EntityKind::Cell,
                missing: vec![0, 1],
            },
        ]
    );
    assert!(report.has_fatal());
    assert!(
        report
            .to_string()
            .starts_with("group `outlet` references missing face ids [3]")
    );
}

#[test]
fn arity_table_is_enforced() {
    let mut b = builder_with_cube_nodes(ReferenceCheck::Eager);
    b.add_cell(
        CellType::Tetrahedron,
        vec![nid(0), nid(1), nid(2), nid(3), nid(4)],
    )
    .unwrap();
    b.add_cell(CellType::Hexahedron, vec![nid(0), nid(1), nid(2), nid(3)])
        .unwrap();
    b.add_cell(CellType::Polygon, vec![nid(0), nid(1)]).unwrap();
    let report = validate_mesh(&b.build(), &ValidationOptions::structural());

    let reasons: Vec<_> = report
        .findings()
        .iter()
        .map(|f| match f {
            Finding::MalformedElement { reason, .. } => reason.clone(),
            other => panic!("unexpected finding {other:?}"),
        })
        .collect();
    assert_eq!(
        reasons,
        vec![
            MalformedReason::ArityMismatch {
                cell_type: CellType::Tetrahedron,
                expected: 4,
                found: 5,
            },
            MalformedReason::ArityMismatch {
                cell_type: CellType::Hexahedron,
                expected: 8,
                found: 4,
            },
            MalformedReason::TooFewNodes { found: 2 },
        ]
    );
}

#[test]
fn degenerate_elements_are_rejected() {
    let mut b = builder_with_cube_nodes(ReferenceCheck::Eager);
    b.add_cell(CellType::Tetrahedron, vec![nid(0), nid(1), nid(1), nid(4)])
        .unwrap();
    b.add_cell(CellType::Polyhedron, vec![nid(0), nid(1), nid(2), nid(4)])
        .unwrap();
    let report = validate_mesh(&b.build(), &ValidationOptions::structural());
    assert_eq!(
        report.findings(),
        &[
            Finding::MalformedElement {
                entity: Entity::Cell(CellId::new(0)),
                reason: MalformedReason::RepeatedNode { node: nid(1) },
            },
            Finding::MalformedElement {
                entity: Entity::Cell(CellId::new(1)),
                reason: MalformedReason::RequiresFaces {
                    cell_type: CellType::Polyhedron,
                },
            },
        ]
    );
}

#[test]
fn open_polyhedron_is_malformed() {
    let mesh = polyhedral_cube(Some(5));
    let report = validate_mesh(&mesh, &ValidationOptions::all());
    assert_eq!(report.findings().len(), 1);
    assert!(matches!(
        report.findings()[0],
        Finding::MalformedElement {
            reason: MalformedReason::OpenShell { uses: 1, .. },
            ..
        }
    ));

    let relaxed = ValidationOptions {
        check_closed_shells: false,
        ..ValidationOptions::all()
    };
    assert!(validate_mesh(&mesh, &relaxed).is_clean());
}

#[test]
fn polyhedron_with_bad_face_reports_face_and_cell() {
    let mut b = builder_with_cube_nodes(ReferenceCheck::Eager);
    let f0 = b.add_face(vec![nid(0), nid(1)]).unwrap();
    let mut faces = vec![f0];
    for local in &CellType::Hexahedron.local_faces()[1..] {
        faces.push(b.add_face(local.iter().map(|&l| nid(l)).collect()).unwrap());
    }
    b.add_polyhedron(faces).unwrap();
    let report = validate_mesh(&b.build(), &ValidationOptions::structural());
    assert_eq!(
        report.findings(),
        &[
            Finding::MalformedElement {
                entity: Entity::Face(f0),
                reason: MalformedReason::TooFewNodes { found: 2 },
            },
            Finding::MalformedElement {
                entity: Entity::Cell(CellId::new(0)),
                reason: MalformedReason::InvalidFace { face: f0 },
            },
        ]
    );
}

#[test]
fn face_based_standard_types_check_face_count() {
    let mut b = builder_with_cube_nodes(ReferenceCheck::Eager);
    let f = b.add_face(vec![nid(0), nid(1), nid(2)]).unwrap();
    b.push_cell(crate::mesh::Cell::from_faces(CellType::Tetrahedron, vec![f]))
        .unwrap();
    b.push_cell(crate::mesh::Cell::from_faces(CellType::Triangle, vec![f]))
        .unwrap();
    b.add_polyhedron(vec![f, f, f, f]).unwrap();
    let report = validate_mesh(&b.build(), &ValidationOptions::structural());
    let reasons: Vec<_> = report
        .findings()
        .iter()
        .filter_map(|f| match f {
            Finding::MalformedElement { reason, .. } => Some(reason.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        reasons,
        vec![
            MalformedReason::FaceCountMismatch {
                cell_type: CellType::Tetrahedron,
                expected: 4,
                found: 1,
            },
            MalformedReason::RequiresNodes {
                cell_type: CellType::Triangle,
            },
            MalformedReason::RepeatedFace { face: f },
        ]
    );
}

#[test]
fn coincident_nodes_are_warnings_only() {
    let mut b = builder_with_cube_nodes(ReferenceCheck::Eager);
    let dup = b.add_node([1.0, 0.0, 1e-12]);
    b.add_cell(CellType::Tetrahedron, vec![nid(0), nid(1), nid(3), nid(4)])
        .unwrap();
    let mut mesh = b.build();

    let report = validate_mesh(&mesh, &ValidationOptions::all());
    assert!(!report.has_fatal());
    let warnings: Vec<_> = report.warnings().collect();
    assert_eq!(warnings.len(), 1);
    match warnings[0] {
        Finding::CoincidentNodes { first, second, .. } => {
            assert_eq!(*first, nid(1));
            assert_eq!(*second, dup);
        }
        other => panic!("unexpected finding {other:?}"),
    }
    assert_eq!(warnings[0].severity(), Severity::Warning);

    report.apply_to(&mut mesh);
    assert!(mesh.sanity().validated);
    assert_eq!(mesh.sanity().coincident_node_pairs, 1);

    assert!(report.into_result().is_ok());
    assert!(validate_mesh(&mesh, &ValidationOptions::structural()).is_clean());
}

#[test]
fn coincidence_respects_epsilon() {
    let mut b = MeshBuilder::new();
    b.add_node([0.0, 0.0, 0.0]);
    b.add_node([0.0, 0.0, 0.5]);
    let mesh = b.build();
    let tight = ValidationOptions::all();
    assert!(validate_mesh(&mesh, &tight).is_clean());
    let loose = ValidationOptions {
        coincident_epsilon: 0.6,
        ..ValidationOptions::all()
    };
    assert_eq!(validate_mesh(&mesh, &loose).warnings().count(), 1);
}

#[test]
fn coincidence_handles_coordinates_beyond_bucket_range() {
    let mut b = MeshBuilder::new();
    b.add_node([1e10, 0.0, 0.0]);
    b.add_node([0.0, 0.0, 0.0]);
    b.add_node([-1e10, -1e10, 1e10]);
    let mesh = b.build();
    assert!(validate_mesh(&mesh, &ValidationOptions::all()).is_clean());

    let mut b = MeshBuilder::new();
    b.add_node([1e10, 0.0, 0.0]);
    b.add_node([-1e10, -1e10, 1e10]);
    let twin = b.add_node([1e10, 0.0, 0.0]);
    let mirror = b.add_node([-1e10, -1e10, 1e10]);
    let report = validate_mesh(&b.build(), &ValidationOptions::all());
    let pairs: Vec<_> = report
        .warnings()
        .map(|f| match f {
            Finding::CoincidentNodes { first, second, .. } => (*first, *second),
            other => panic!("unexpected finding {other:?}"),
        })
        .collect();
    assert_eq!(pairs, vec![(nid(0), twin), (nid(1), mirror)]);
}

#[test]
fn non_finite_coordinates_are_fatal() {
    let mut b = MeshBuilder::new();
    b.add_node([0.0, f64::NAN, 0.0]);
    let report = validate_mesh(&b.build(), &ValidationOptions::all());
    assert!(report.has_fatal());
    assert!(matches!(
        report.findings()[0],
        Finding::MalformedElement {
            entity: Entity::Node(_),
            reason: MalformedReason::NonFiniteCoordinate { .. },
        }
    ));
}

#[test]
fn fatal_report_converts_to_validation_failed() {
    let mut b = MeshBuilder::new().with_reference_check(ReferenceCheck::Deferred);
    b.add_cell(CellType::Triangle, vec![nid(0), nid(1), nid(2)])
        .unwrap();
    let report = validate_mesh(&b.build(), &ValidationOptions::all());
    let err = report.clone().into_result().unwrap_err();
    match err {
        MeshError::ValidationFailed { report: carried } => assert_eq!(carried, report),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(report.to_string().contains("cell 0 references missing node ids [0, 1, 2]"));
}

#[test]
fn validation_is_deterministic() {
    let mut b = builder_with_cube_nodes(ReferenceCheck::Deferred);
    b.add_node([0.0, 0.0, 0.0]);
    b.add_node([1.0, 1.0, 1.0]);
    b.add_face(vec![nid(0), nid(40)]).unwrap();
    b.add_cell(CellType::Pyramid, vec![nid(0), nid(1), nid(2)])
        .unwrap();
    let mesh = b.build();
    let options = ValidationOptions::all();
    assert_eq!(validate_mesh(&mesh, &options), validate_mesh(&mesh, &options));
}
