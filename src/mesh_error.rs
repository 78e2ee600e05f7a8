//! MeshError: unified error type for mesh-interchange public APIs.
//!
//! Every fallible operation in the crate returns `Result<_, MeshError>`.
//! Validator findings are carried inside [`MeshError::ValidationFailed`]
//! with their full report so callers can inspect offending indices.

use crate::convert::Stage;
use crate::io::{Direction, MeshFormat};
use crate::topology::ids::{Entity, EntityKind};
use crate::topology::validation::ValidationReport;
use thiserror::Error;

/// Unified error type for mesh-interchange operations.
#[derive(Debug, Error)]
pub enum MeshError {
    /// An entity references an id that does not exist at build time.
    #[error("reference error: {owner} references missing {target} {id}")]
    Reference {
        owner: Entity,
        target: EntityKind,
        id: u64,
    },
    /// A named group lists a face or cell that does not exist at build time.
    #[error("reference error: group `{group}` references missing {target} {id}")]
    GroupReference {
        group: String,
        target: EntityKind,
        id: u64,
    },
    /// Two groups of the same kind share a name.
    #[error("duplicate {kind} group `{name}`")]
    DuplicateGroup { name: String, kind: EntityKind },
    /// A format cannot represent a feature of the source or the mesh.
    #[error("unsupported feature for {format} {direction}: {feature}")]
    UnsupportedFeature {
        format: MeshFormat,
        direction: Direction,
        feature: String,
    },
    /// The mesh carried fatal validation findings.
    #[error("validation failed: {report}")]
    ValidationFailed { report: ValidationReport },
    /// Malformed input text.
    #[error("mesh I/O parse error: {0}")]
    MeshIoParse(String),
    /// A format tag that no adapter answers to.
    #[error("unknown mesh format `{0}`")]
    UnknownFormat(String),
    /// The job was cancelled at a stage boundary.
    #[error("conversion cancelled before stage `{0}`")]
    Cancelled(Stage),
    /// Filesystem-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeshError {
    pub(crate) fn unsupported_read(format: MeshFormat, feature: impl Into<String>) -> Self {
        MeshError::UnsupportedFeature {
            format,
            direction: Direction::Read,
            feature: feature.into(),
        }
    }

    pub(crate) fn unsupported_write(format: MeshFormat, feature: impl Into<String>) -> Self {
        MeshError::UnsupportedFeature {
            format,
            direction: Direction::Write,
            feature: feature.into(),
        }
    }
}
