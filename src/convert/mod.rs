//! Conversion driver.
//!
//! [`Converter::convert`] runs one [`ConversionJob`] through a fixed
//! pipeline:
//!
//! 1. select the input adapter,
//! 2. read into a [`CanonicalMesh`](crate::mesh::CanonicalMesh),
//! 3. validate, stopping on fatal findings,
//! 4. select the output adapter,
//! 5. write atomically.
//!
//! Nothing is retried. The cancellation token is polled before each stage,
//! never inside one, so a cancelled job leaves the output untouched.

pub mod job;

pub use job::{ConversionJob, FormatSelector, JobStatus};

use crate::config::ConversionConfig;
use crate::io::adapter_for;
use crate::mesh_error::MeshError;
use crate::topology::validation::validate_mesh;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Pipeline stage a job is entering or failed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    SelectInput,
    Read,
    Validate,
    SelectOutput,
    Write,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::SelectInput,
        Stage::Read,
        Stage::Validate,
        Stage::SelectOutput,
        Stage::Write,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::SelectInput => "select-input",
            Stage::Read => "read",
            Stage::Validate => "validate",
            Stage::SelectOutput => "select-output",
            Stage::Write => "write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared cancellation flag; clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

type StageError = (Stage, MeshError);

fn at(stage: Stage) -> impl FnOnce(MeshError) -> StageError {
    move |err| (stage, err)
}

/// Runs conversion jobs under one configuration.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConversionConfig,
    cancel: CancellationToken,
}

impl Converter {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Token observed by this converter.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drives `job` to a terminal status. Terminal jobs are returned as-is.
    pub fn convert(&self, mut job: ConversionJob) -> ConversionJob {
        if job.is_terminal() {
            return job;
        }
        job.status = match self.run(&mut job) {
            Ok(()) => {
                log::info!(
                    "converted {} -> {}",
                    job.input.display(),
                    job.output.display()
                );
                JobStatus::Ok
            }
            Err((stage, error)) => {
                log::warn!(
                    "conversion {} -> {} failed at {stage}: {error}",
                    job.input.display(),
                    job.output.display()
                );
                JobStatus::Failed { stage, error }
            }
        };
        job
    }

    /// Converts independent jobs, in parallel with the `rayon` feature.
    /// Results keep the input order.
    pub fn convert_all(&self, jobs: Vec<ConversionJob>) -> Vec<ConversionJob> {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            jobs.into_par_iter().map(|job| self.convert(job)).collect()
        }
        #[cfg(not(feature = "rayon"))]
        {
            jobs.into_iter().map(|job| self.convert(job)).collect()
        }
    }

    fn checkpoint(&self, stage: Stage) -> Result<(), StageError> {
        if self.cancel.is_cancelled() {
            return Err((stage, MeshError::Cancelled(stage)));
        }
        Ok(())
    }

    fn run(&self, job: &mut ConversionJob) -> Result<(), StageError> {
        self.checkpoint(Stage::SelectInput)?;
        let input_format = job
            .input_format
            .resolve(&job.input)
            .map_err(at(Stage::SelectInput))?;
        let reader = adapter_for(input_format, &self.config);

        self.checkpoint(Stage::Read)?;
        let mesh = reader.read(&job.input).map_err(at(Stage::Read))?;
        log::debug!(
            "read {} as {input_format}: {} nodes, {} faces, {} cells",
            job.input.display(),
            mesh.node_count(),
            mesh.face_count(),
            mesh.cell_count()
        );
        let mesh = job.mesh.insert(mesh);

        self.checkpoint(Stage::Validate)?;
        let report = validate_mesh(mesh, &self.config.validation);
        for warning in report.warnings() {
            log::warn!("{}: {warning}", job.input.display());
        }
        report.apply_to(mesh);
        job.report = Some(report.clone());
        report.into_result().map_err(at(Stage::Validate))?;

        self.checkpoint(Stage::SelectOutput)?;
        let output_format = job
            .output_format
            .resolve(&job.output)
            .map_err(at(Stage::SelectOutput))?;
        let writer = adapter_for(output_format, &self.config);

        self.checkpoint(Stage::Write)?;
        writer.write(mesh, &job.output).map_err(at(Stage::Write))
    }
}
