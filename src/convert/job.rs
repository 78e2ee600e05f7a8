//! Conversion jobs and their lifecycle.

use super::Stage;
use crate::io::MeshFormat;
use crate::mesh::CanonicalMesh;
use crate::mesh_error::MeshError;
use crate::topology::validation::ValidationReport;
use std::path::{Path, PathBuf};

/// How a job picks the format for one of its paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatSelector {
    Explicit(MeshFormat),
    /// A user-supplied tag, parsed when the job runs.
    Tag(String),
    /// Inferred from the path extension when the job runs.
    FromExtension,
}

impl FormatSelector {
    pub fn resolve(&self, path: &Path) -> Result<MeshFormat, MeshError> {
        match self {
            FormatSelector::Explicit(format) => Ok(*format),
            FormatSelector::Tag(tag) => MeshFormat::from_tag(tag),
            FormatSelector::FromExtension => MeshFormat::from_path(path),
        }
    }
}

impl From<MeshFormat> for FormatSelector {
    fn from(format: MeshFormat) -> Self {
        FormatSelector::Explicit(format)
    }
}

/// Where a job stands. `Ok` and `Failed` are terminal.
#[derive(Debug)]
pub enum JobStatus {
    Pending,
    Ok,
    Failed { stage: Stage, error: MeshError },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// One input-to-output conversion request.
///
/// A job is created `Pending` and moved to a terminal status by
/// [`Converter::convert`](super::Converter::convert); it then also carries
/// the mesh that was read and the validation report, when those stages ran.
#[derive(Debug)]
pub struct ConversionJob {
    pub(crate) input: PathBuf,
    pub(crate) input_format: FormatSelector,
    pub(crate) output: PathBuf,
    pub(crate) output_format: FormatSelector,
    pub(crate) status: JobStatus,
    pub(crate) mesh: Option<CanonicalMesh>,
    pub(crate) report: Option<ValidationReport>,
}

impl ConversionJob {
    pub fn new(
        input: impl Into<PathBuf>,
        input_format: impl Into<FormatSelector>,
        output: impl Into<PathBuf>,
        output_format: impl Into<FormatSelector>,
    ) -> Self {
        Self {
            input: input.into(),
            input_format: input_format.into(),
            output: output.into(),
            output_format: output_format.into(),
            status: JobStatus::Pending,
            mesh: None,
            report: None,
        }
    }

    /// Job with formats given as tags such as `"msh"` or `"oasis-csv"`.
    ///
    /// Unknown tags fail the job at the matching selection stage.
    pub fn from_tags(
        input: impl Into<PathBuf>,
        input_tag: &str,
        output: impl Into<PathBuf>,
        output_tag: &str,
    ) -> Self {
        Self::new(
            input,
            FormatSelector::Tag(input_tag.to_string()),
            output,
            FormatSelector::Tag(output_tag.to_string()),
        )
    }

    /// Job with both formats inferred from path extensions.
    pub fn from_paths(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self::new(
            input,
            FormatSelector::FromExtension,
            output,
            FormatSelector::FromExtension,
        )
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, JobStatus::Ok)
    }

    pub fn error(&self) -> Option<&MeshError> {
        match &self.status {
            JobStatus::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn failed_stage(&self) -> Option<Stage> {
        match &self.status {
            JobStatus::Failed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Mesh as read (with sanity flags set once validated).
    pub fn mesh(&self) -> Option<&CanonicalMesh> {
        self.mesh.as_ref()
    }

    pub fn into_mesh(self) -> Option<CanonicalMesh> {
        self.mesh
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        self.report.as_ref()
    }
}
