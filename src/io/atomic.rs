//! All-or-nothing file output.
//!
//! Each output file is encoded into a temporary file in the target's own
//! directory and renamed into place only after every file of the set has
//! been written and flushed. If encoding fails the temporaries are dropped,
//! which deletes them, and no target is touched.
//!
//! Optional files a format leaves out can be marked with
//! [`StagedOutput::discard`]; a stale copy from an earlier write is removed
//! once the new files are in place.

use crate::mesh_error::MeshError;
use itertools::Itertools;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn staging_dir(target: &Path) -> &Path {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// A set of output files committed together.
#[derive(Debug, Default)]
pub struct StagedOutput {
    staged: Vec<(NamedTempFile, PathBuf)>,
    discarded: Vec<PathBuf>,
}

impl StagedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of staged files.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Encodes one file with `write` into a temporary next to `target`.
    ///
    /// Nothing is visible at `target` until [`StagedOutput::commit`].
    pub fn stage<F>(&mut self, target: impl Into<PathBuf>, write: F) -> Result<(), MeshError>
    where
        F: FnOnce(&mut dyn Write) -> Result<(), MeshError>,
    {
        let target = target.into();
        let tmp = NamedTempFile::new_in(staging_dir(&target))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            write(&mut writer)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        log::trace!("staged {} at {}", target.display(), tmp.path().display());
        self.staged.push((tmp, target));
        Ok(())
    }

    /// Marks `target` as absent from this output set.
    ///
    /// An existing file at `target` is removed after every staged file has
    /// been renamed into place.
    pub fn discard(&mut self, target: impl Into<PathBuf>) {
        self.discarded.push(target.into());
    }

    /// Renames every staged file onto its target, then removes the
    /// discarded paths.
    ///
    /// A failed rename removes the targets already committed in this call
    /// and drops the remaining temporaries; discarded files are left alone.
    pub fn commit(self) -> Result<(), MeshError> {
        let mut committed: Vec<PathBuf> = Vec::with_capacity(self.staged.len());
        for (tmp, target) in self.staged {
            if let Err(err) = tmp.persist(&target) {
                for path in &committed {
                    if let Err(cleanup) = fs::remove_file(path) {
                        log::warn!("could not remove {}: {cleanup}", path.display());
                    }
                }
                return Err(MeshError::Io(err.error));
            }
            committed.push(target);
        }
        for path in &self.discarded {
            match fs::remove_file(path) {
                Ok(()) => log::debug!("removed stale {}", path.display()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(MeshError::Io(err)),
            }
        }
        log::debug!(
            "committed {} file(s): {}",
            committed.len(),
            committed.iter().map(|p| p.display()).join(", ")
        );
        Ok(())
    }
}

/// Writes a single file through a [`StagedOutput`].
pub fn write_atomically<F>(target: &Path, write: F) -> Result<(), MeshError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), MeshError>,
{
    let mut staged = StagedOutput::new();
    staged.stage(target, write)?;
    staged.commit()
}
