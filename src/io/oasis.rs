//! Oasis text triple: `<name>.nodes`, `<name>.faces`, `<name>.cells`.
//!
//! - `.nodes` holds one `x y z` line per node, six decimals.
//! - `.faces` and `.cells` hold one record per line of 0-based node ids.
//!
//! Records of differing arity are written count-prefixed (`n id ... id`)
//! or rejected, depending on [`ArityLayout`]; a record is never truncated
//! or padded to fit a fixed field count.
//!
//! `.faces` is optional. A mesh without a face table writes none, and
//! writing over an earlier triple removes its stale `.faces`; reading a
//! triple without one gives [`FaceCapability::Absent`].
//!
//! Named groups have no place in the triple and are dropped on write.
//!
//! The format carries no cell types. On read, a mesh is volumetric when any
//! cell with at least four resolvable nodes is not coplanar; node counts
//! then map to volume types, otherwise to planar types.

use crate::geometry::is_coplanar;
use crate::io::atomic::StagedOutput;
use crate::io::{FormatAdapter, MeshFormat};
use crate::mesh::{CanonicalMesh, CellTopology, FaceCapability, MeshBuilder, ReferenceCheck};
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;
use crate::topology::ids::NodeId;
use itertools::Itertools;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// Deviation from a plane, relative to the cell's extent, still counted as
/// coplanar. Covers the six-decimal rounding of `.nodes`.
const PLANAR_TOLERANCE: f64 = 1e-6;

/// How variable-arity records are laid out in `.faces` / `.cells`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArityLayout {
    /// Fixed fields when every record of a file shares one arity,
    /// count-prefixed otherwise.
    #[default]
    Auto,
    /// Every record is `n id ... id`.
    CountPrefixed,
    /// Bare ids; mixed arity is rejected on write.
    Fixed,
}

/// Oasis adapter settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OasisOptions {
    pub arity: ArityLayout,
}

/// The three files that make up one Oasis mesh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OasisPaths {
    pub nodes: PathBuf,
    pub faces: PathBuf,
    pub cells: PathBuf,
}

impl OasisPaths {
    /// Replaces the extension of `base` (if any) with each part's.
    pub fn new(base: &Path) -> Self {
        Self {
            nodes: base.with_extension("nodes"),
            faces: base.with_extension("faces"),
            cells: base.with_extension("cells"),
        }
    }
}

/// Oasis text triple adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct OasisAdapter {
    options: OasisOptions,
}

impl OasisAdapter {
    pub fn new(options: OasisOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> OasisOptions {
        self.options
    }

    /// Writes the three parts to separate writers.
    ///
    /// Face-based cells cannot be expressed and fail before anything is
    /// written. Nothing goes to `faces` when the mesh has no face table.
    pub fn write_parts<N, F, C>(
        &self,
        mesh: &CanonicalMesh,
        nodes: N,
        faces: F,
        cells: C,
    ) -> Result<(), MeshError>
    where
        N: Write,
        F: Write,
        C: Write,
    {
        let cell_nodes = cell_node_lists(mesh)?;
        write_nodes(mesh, nodes)?;
        if let Some(face_nodes) = face_node_lists(mesh) {
            write_records(&face_nodes, self.options.arity, "face", faces)?;
        }
        write_records(&cell_nodes, self.options.arity, "cell", cells)
    }

    /// Parses the three parts; `faces` is `None` when the mesh has no face
    /// file.
    pub fn read_parts<N, F, C>(
        &self,
        nodes: N,
        faces: Option<F>,
        cells: C,
    ) -> Result<CanonicalMesh, MeshError>
    where
        N: Read,
        F: Read,
        C: Read,
    {
        let coords = read_nodes(nodes)?;
        let face_rows = faces
            .map(|f| read_records(f, self.options.arity, "faces"))
            .transpose()?;
        let cell_rows = read_records(cells, self.options.arity, "cells")?;

        let volumetric = cell_rows
            .iter()
            .any(|row| !is_coplanar(&resolve(&coords, row), PLANAR_TOLERANCE));
        let mut builder = MeshBuilder::new().with_reference_check(ReferenceCheck::Deferred);
        builder.reserve(
            coords.len(),
            face_rows.as_ref().map_or(0, Vec::len),
            cell_rows.len(),
        );
        for xyz in &coords {
            builder.add_node(*xyz);
        }
        match face_rows {
            Some(rows) => {
                for row in rows {
                    builder.add_face(to_ids(&row))?;
                }
            }
            None => builder.set_face_capability(FaceCapability::Absent),
        }
        for (idx, row) in cell_rows.iter().enumerate() {
            let cell_type = infer_cell_type(row.len(), volumetric).ok_or_else(|| {
                MeshError::unsupported_read(
                    MeshFormat::Oasis,
                    format!("cell {idx}: {}-node volume cell", row.len()),
                )
            })?;
            builder.add_cell(cell_type, to_ids(row))?;
        }
        let mesh = builder.build();
        log::debug!(
            "oasis: read {} nodes, {} faces, {} cells ({})",
            mesh.node_count(),
            mesh.face_count(),
            mesh.cell_count(),
            if volumetric { "volumetric" } else { "planar" }
        );
        Ok(mesh)
    }
}

impl FormatAdapter for OasisAdapter {
    fn format(&self) -> MeshFormat {
        MeshFormat::Oasis
    }

    fn read(&self, path: &Path) -> Result<CanonicalMesh, MeshError> {
        let paths = OasisPaths::new(path);
        let nodes = BufReader::new(File::open(&paths.nodes)?);
        let faces = if paths.faces.exists() {
            Some(BufReader::new(File::open(&paths.faces)?))
        } else {
            log::debug!("oasis: no face file at {}", paths.faces.display());
            None
        };
        let cells = BufReader::new(File::open(&paths.cells)?);
        self.read_parts(nodes, faces, cells)
    }

    fn write(&self, mesh: &CanonicalMesh, path: &Path) -> Result<(), MeshError> {
        let paths = OasisPaths::new(path);
        let cell_nodes = cell_node_lists(mesh)?;
        let layout = self.options.arity;
        if !mesh.groups().is_empty() {
            log::debug!("oasis: dropping {} named groups", mesh.groups().len());
        }

        let mut staged = StagedOutput::new();
        staged.stage(&paths.nodes, |w| write_nodes(mesh, w))?;
        match face_node_lists(mesh) {
            Some(face_nodes) => {
                staged.stage(&paths.faces, |w| write_records(&face_nodes, layout, "face", w))?
            }
            None => staged.discard(&paths.faces),
        }
        staged.stage(&paths.cells, |w| write_records(&cell_nodes, layout, "cell", w))?;
        staged.commit()
    }
}

/// Oriented face records, or `None` for a mesh without a face table.
fn face_node_lists(mesh: &CanonicalMesh) -> Option<Vec<Vec<NodeId>>> {
    match mesh.face_capability() {
        FaceCapability::Absent => None,
        FaceCapability::Present => Some(mesh.faces().iter().map(|f| f.oriented_nodes()).collect()),
    }
}

fn cell_node_lists(mesh: &CanonicalMesh) -> Result<Vec<Vec<NodeId>>, MeshError> {
    mesh.cells()
        .iter()
        .enumerate()
        .map(|(idx, cell)| match &cell.topology {
            CellTopology::Nodes(nodes) => Ok(nodes.clone()),
            CellTopology::Faces(_) => Err(MeshError::unsupported_write(
                MeshFormat::Oasis,
                format!("face-based cell {idx}"),
            )),
        })
        .collect()
}

fn write_nodes<W: Write>(mesh: &CanonicalMesh, mut writer: W) -> Result<(), MeshError> {
    for node in mesh.nodes() {
        let [x, y, z] = node.coords;
        writeln!(writer, "{x:.6} {y:.6} {z:.6}")?;
    }
    Ok(())
}

/// Decides whether a table is written count-prefixed.
fn count_prefixed(
    records: &[Vec<NodeId>],
    layout: ArityLayout,
    kind: &str,
) -> Result<bool, MeshError> {
    let uniform = records.iter().map(Vec::len).all_equal();
    // An empty fixed record would be an empty line, which reads as nothing.
    let has_empty = records.iter().any(Vec::is_empty);
    match layout {
        ArityLayout::CountPrefixed => Ok(true),
        ArityLayout::Auto => Ok(!uniform || has_empty),
        ArityLayout::Fixed if uniform && !has_empty => Ok(false),
        ArityLayout::Fixed => Err(MeshError::unsupported_write(
            MeshFormat::Oasis,
            format!("{kind} records of differing or zero arity with fixed fields"),
        )),
    }
}

fn write_records<W: Write>(
    records: &[Vec<NodeId>],
    layout: ArityLayout,
    kind: &str,
    mut writer: W,
) -> Result<(), MeshError> {
    let prefixed = count_prefixed(records, layout, kind)?;
    for record in records {
        let ids = record.iter().join(" ");
        if !prefixed {
            writeln!(writer, "{ids}")?;
        } else if record.is_empty() {
            writeln!(writer, "0")?;
        } else {
            writeln!(writer, "{} {ids}", record.len())?;
        }
    }
    Ok(())
}

fn read_nodes<R: Read>(reader: R) -> Result<Vec<[f64; 3]>, MeshError> {
    let mut coords = Vec::new();
    for (line_no, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let values = line
            .split_whitespace()
            .map(|raw| {
                raw.parse::<f64>().map_err(|_| {
                    MeshError::MeshIoParse(format!(
                        "nodes line {}: invalid coordinate `{raw}`",
                        line_no + 1
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let xyz: [f64; 3] = values.try_into().map_err(|v: Vec<f64>| {
            MeshError::MeshIoParse(format!(
                "nodes line {}: expected 3 coordinates, found {}",
                line_no + 1,
                v.len()
            ))
        })?;
        coords.push(xyz);
    }
    Ok(coords)
}

fn read_records<R: Read>(
    reader: R,
    layout: ArityLayout,
    file: &str,
) -> Result<Vec<Vec<usize>>, MeshError> {
    let mut rows: Vec<(usize, Vec<usize>)> = Vec::new();
    for (line_no, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|raw| {
                raw.parse::<usize>().map_err(|_| {
                    MeshError::MeshIoParse(format!(
                        "{file} line {}: invalid id `{raw}`",
                        line_no + 1
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push((line_no + 1, row));
    }

    let prefixed = match layout {
        ArityLayout::Fixed => false,
        ArityLayout::CountPrefixed => true,
        ArityLayout::Auto => !rows.iter().map(|(_, row)| row.len()).all_equal(),
    };
    if !prefixed {
        return Ok(rows.into_iter().map(|(_, row)| row).collect());
    }
    rows.into_iter()
        .map(|(line_no, mut row)| {
            let count = row.first().copied().unwrap_or_default();
            if row.len() != count + 1 {
                return Err(MeshError::MeshIoParse(format!(
                    "{file} line {line_no}: count {count} but {} ids",
                    row.len().saturating_sub(1)
                )));
            }
            row.remove(0);
            Ok(row)
        })
        .collect()
}

fn to_ids(row: &[usize]) -> Vec<NodeId> {
    row.iter().copied().map(NodeId::new).collect()
}

/// Coordinates of the ids in `row` that exist.
fn resolve(coords: &[[f64; 3]], row: &[usize]) -> Vec<[f64; 3]> {
    row.iter().filter_map(|&id| coords.get(id).copied()).collect()
}

fn infer_cell_type(arity: usize, volumetric: bool) -> Option<CellType> {
    if !volumetric {
        // Fewer than three nodes stays a polygon for the validator to reject.
        return Some(CellType::from_planar_arity(arity).unwrap_or(CellType::Polygon));
    }
    match arity {
        3 => Some(CellType::Triangle),
        n => CellType::from_volume_arity(n),
    }
}
