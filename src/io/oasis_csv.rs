//! OpenOasis mesh directory: `nodes.csv`, `faces.csv`, `cells.csv`, plus
//! the optional `patches.csv` and `zones.csv`.
//!
//! The entity tables have one header row and one row per entity whose first
//! column is the entity id. Ids must start at 0 and increase by one.
//!
//! | file          | header      | row                |
//! |---------------|-------------|--------------------|
//! | `nodes.csv`   | `nId,x,y,z` | `id,x,y,z`         |
//! | `faces.csv`   | `fId,nIds`  | `id,node,node,...` |
//! | `cells.csv`   | `cId,fIds`  | `id,face,face,...` |
//! | `patches.csv` | none        | `name,face,...`    |
//! | `zones.csv`   | none        | `name,cell,...`    |
//!
//! Patches are named face groups (boundary conditions), zones are named cell
//! groups. Either file is written only when the mesh has groups of that
//! kind; writing into a directory removes a stale copy otherwise.
//!
//! Every field must be present: an empty field, including one left by a
//! trailing comma, is a parse error. Fields are trimmed.
//!
//! Cells always reference faces, so they are read as polyhedra and volume
//! cells given by nodes are expanded through
//! [`derive_face_topology`](crate::topology::faces::derive_face_topology)
//! before writing.

use crate::io::atomic::StagedOutput;
use crate::io::{FormatAdapter, MeshFormat};
use crate::mesh::{
    CanonicalMesh, CellTopology, FaceCapability, MeshBuilder, MeshGroup, ReferenceCheck,
};
use crate::mesh_error::MeshError;
use crate::topology::faces::derive_face_topology;
use crate::topology::ids::{CellId, FaceId, NodeId};
use itertools::Itertools;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

pub const NODES_FILE: &str = "nodes.csv";
pub const FACES_FILE: &str = "faces.csv";
pub const CELLS_FILE: &str = "cells.csv";
pub const PATCHES_FILE: &str = "patches.csv";
pub const ZONES_FILE: &str = "zones.csv";

/// OpenOasis CSV directory adapter.
#[derive(Debug, Default, Clone, Copy)]
pub struct OasisCsvAdapter;

/// Splits one record into trimmed fields, rejecting empty ones.
fn split_fields<'a>(line: &'a str, file: &str, line_no: usize) -> Result<Vec<&'a str>, MeshError> {
    line.split(',')
        .map(str::trim)
        .enumerate()
        .map(|(column, field)| {
            if field.is_empty() {
                Err(MeshError::MeshIoParse(format!(
                    "{file} line {line_no}: empty field in column {}",
                    column + 1
                )))
            } else {
                Ok(field)
            }
        })
        .collect()
}

/// Non-blank records as (1-based line number, fields).
fn records<R: Read>(
    reader: R,
    file: &str,
    skip_header: bool,
) -> Result<Vec<(usize, Vec<String>)>, MeshError> {
    let mut out = Vec::new();
    let mut lines = BufReader::new(reader).lines().enumerate();
    if skip_header {
        if let Some((_, header)) = lines.next() {
            header?;
        }
    }
    for (index, line) in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_fields(&line, file, index + 1)?;
        out.push((index + 1, fields.into_iter().map(str::to_string).collect()));
    }
    Ok(out)
}

/// Reads `id,v,v,...` rows after the header, checking the id sequence.
fn read_rows<R: Read>(reader: R, file: &str) -> Result<Vec<Vec<String>>, MeshError> {
    let mut rows = Vec::new();
    for (line_no, mut fields) in records(reader, file, true)? {
        // `split_fields` yields at least one field for any line.
        let raw_id = fields.remove(0);
        let id = raw_id.parse::<usize>().map_err(|_| {
            MeshError::MeshIoParse(format!("{file} line {line_no}: invalid id `{raw_id}`"))
        })?;
        if id != rows.len() {
            return Err(MeshError::MeshIoParse(format!(
                "{file} line {line_no}: expected id {}, found {id}",
                rows.len()
            )));
        }
        rows.push(fields);
    }
    Ok(rows)
}

/// Reads headerless `name,id,id,...` rows.
fn read_named_rows<R: Read>(reader: R, file: &str) -> Result<Vec<(String, Vec<usize>)>, MeshError> {
    records(reader, file, false)?
        .into_iter()
        .map(|(line_no, mut fields)| {
            let name = fields.remove(0);
            let ids = fields
                .iter()
                .map(|raw| {
                    raw.parse::<usize>().map_err(|_| {
                        MeshError::MeshIoParse(format!(
                            "{file} line {line_no}: invalid index `{raw}` in `{name}`"
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((name, ids))
        })
        .collect()
}

fn parse_ids(row: &[String], file: &str, id: usize) -> Result<Vec<usize>, MeshError> {
    row.iter()
        .map(|raw| {
            raw.parse::<usize>().map_err(|_| {
                MeshError::MeshIoParse(format!("{file} row {id}: invalid index `{raw}`"))
            })
        })
        .collect()
}

/// Optional patch (face group) and zone (cell group) tables.
#[derive(Debug)]
pub struct GroupTables<P, Z> {
    pub patches: Option<P>,
    pub zones: Option<Z>,
}

impl GroupTables<&'static [u8], &'static [u8]> {
    pub fn none() -> Self {
        GroupTables {
            patches: None,
            zones: None,
        }
    }
}

impl OasisCsvAdapter {
    /// Parses the three entity tables; `faces` is `None` when the directory
    /// has no face table.
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
        self.read_grouped_parts(nodes, faces, cells, GroupTables::none())
    }

    /// Like [`OasisCsvAdapter::read_parts`], also reading patches and zones.
    ///
    /// Group members are range-checked by the validator, like every other
    /// reference read from disk.
    pub fn read_grouped_parts<N, F, C, P, Z>(
        &self,
        nodes: N,
        faces: Option<F>,
        cells: C,
        groups: GroupTables<P, Z>,
    ) -> Result<CanonicalMesh, MeshError>
    where
        N: Read,
        F: Read,
        C: Read,
        P: Read,
        Z: Read,
    {
        let mut builder = MeshBuilder::new().with_reference_check(ReferenceCheck::Deferred);

        for (id, row) in read_rows(nodes, NODES_FILE)?.iter().enumerate() {
            let coords = row
                .iter()
                .map(|raw| {
                    raw.parse::<f64>().map_err(|_| {
                        MeshError::MeshIoParse(format!(
                            "{NODES_FILE} row {id}: invalid coordinate `{raw}`"
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let xyz: [f64; 3] = coords.try_into().map_err(|v: Vec<f64>| {
                MeshError::MeshIoParse(format!(
                    "{NODES_FILE} row {id}: expected 3 coordinates, found {}",
                    v.len()
                ))
            })?;
            builder.add_node(xyz);
        }

        match faces {
            Some(faces) => {
                for (id, row) in read_rows(faces, FACES_FILE)?.iter().enumerate() {
                    let ids = parse_ids(row, FACES_FILE, id)?;
                    builder.add_face(ids.into_iter().map(NodeId::new).collect())?;
                }
            }
            None => builder.set_face_capability(FaceCapability::Absent),
        }

        for (id, row) in read_rows(cells, CELLS_FILE)?.iter().enumerate() {
            let ids = parse_ids(row, CELLS_FILE, id)?;
            builder.add_polyhedron(ids.into_iter().map(FaceId::new).collect())?;
        }

        if let Some(patches) = groups.patches {
            for (name, ids) in read_named_rows(patches, PATCHES_FILE)? {
                builder.add_face_group(name, ids.into_iter().map(FaceId::new).collect())?;
            }
        }
        if let Some(zones) = groups.zones {
            for (name, ids) in read_named_rows(zones, ZONES_FILE)? {
                builder.add_cell_group(name, ids.into_iter().map(CellId::new).collect())?;
            }
        }

        let mesh = builder.build();
        log::debug!(
            "oasis-csv: read {} nodes, {} faces, {} cells, {} groups",
            mesh.node_count(),
            mesh.face_count(),
            mesh.cell_count(),
            mesh.groups().len()
        );
        Ok(mesh)
    }

    /// Writes the three tables, deriving faces for node-based volume cells.
    ///
    /// Groups are not written; see [`OasisCsvAdapter::write_groups`].
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
        let mesh = Self::face_based(mesh)?;
        write_nodes(&mesh, nodes)?;
        write_faces(&mesh, faces)?;
        write_cells(&mesh, cells)
    }

    /// Writes the patch and zone tables. Face ids refer to the face table
    /// [`OasisCsvAdapter::write_parts`] writes for the same mesh.
    pub fn write_groups<P, Z>(
        &self,
        mesh: &CanonicalMesh,
        patches: P,
        zones: Z,
    ) -> Result<(), MeshError>
    where
        P: Write,
        Z: Write,
    {
        write_named_rows(mesh.face_groups(), PATCHES_FILE, patches)?;
        write_named_rows(mesh.cell_groups(), ZONES_FILE, zones)
    }

    fn face_based(mesh: &CanonicalMesh) -> Result<CanonicalMesh, MeshError> {
        let all_face_based = mesh
            .cells()
            .iter()
            .all(|c| matches!(c.topology, CellTopology::Faces(_)));
        if all_face_based {
            return Ok(mesh.clone());
        }
        derive_face_topology(mesh)
            .map_err(|err| MeshError::unsupported_write(MeshFormat::OasisCsv, err.to_string()))
    }
}

fn write_nodes<W: Write>(mesh: &CanonicalMesh, mut writer: W) -> Result<(), MeshError> {
    writeln!(writer, "nId,x,y,z")?;
    for (id, node) in mesh.nodes().iter().enumerate() {
        let [x, y, z] = node.coords;
        writeln!(writer, "{id},{x},{y},{z}")?;
    }
    Ok(())
}

fn write_faces<W: Write>(mesh: &CanonicalMesh, mut writer: W) -> Result<(), MeshError> {
    writeln!(writer, "fId,nIds")?;
    for (id, face) in mesh.faces().iter().enumerate() {
        writeln!(writer, "{id},{}", face.oriented_nodes().iter().join(","))?;
    }
    Ok(())
}

fn write_cells<W: Write>(mesh: &CanonicalMesh, mut writer: W) -> Result<(), MeshError> {
    writeln!(writer, "cId,fIds")?;
    for (id, cell) in mesh.cells().iter().enumerate() {
        let faces = cell.faces().unwrap_or_default();
        writeln!(writer, "{id},{}", faces.iter().join(","))?;
    }
    Ok(())
}

/// A name survives a `name,...` row only if reading it back yields it again.
fn storable_name(name: &str) -> bool {
    !name.is_empty() && name.trim() == name && !name.contains([',', '\n', '\r'])
}

fn write_named_rows<'a, W: Write>(
    groups: impl Iterator<Item = &'a MeshGroup>,
    file: &str,
    mut writer: W,
) -> Result<(), MeshError> {
    for group in groups {
        if !storable_name(&group.name) {
            return Err(MeshError::unsupported_write(
                MeshFormat::OasisCsv,
                format!("group name `{}` in {file}", group.name.escape_debug()),
            ));
        }
        let ids = group.members.indices();
        if ids.is_empty() {
            writeln!(writer, "{}", group.name)?;
        } else {
            writeln!(writer, "{},{}", group.name, ids.iter().join(","))?;
        }
    }
    Ok(())
}

fn write_tables(mesh: &CanonicalMesh, dir: &Path) -> Result<(), MeshError> {
    let mut staged = StagedOutput::new();
    staged.stage(dir.join(NODES_FILE), |w| write_nodes(mesh, w))?;
    staged.stage(dir.join(FACES_FILE), |w| write_faces(mesh, w))?;
    staged.stage(dir.join(CELLS_FILE), |w| write_cells(mesh, w))?;
    if mesh.face_groups().next().is_some() {
        staged.stage(dir.join(PATCHES_FILE), |w| {
            write_named_rows(mesh.face_groups(), PATCHES_FILE, w)
        })?;
    } else {
        staged.discard(dir.join(PATCHES_FILE));
    }
    if mesh.cell_groups().next().is_some() {
        staged.stage(dir.join(ZONES_FILE), |w| {
            write_named_rows(mesh.cell_groups(), ZONES_FILE, w)
        })?;
    } else {
        staged.discard(dir.join(ZONES_FILE));
    }
    staged.commit()
}

fn open_optional(path: &Path) -> Result<Option<BufReader<File>>, MeshError> {
    if path.exists() {
        Ok(Some(BufReader::new(File::open(path)?)))
    } else {
        Ok(None)
    }
}

impl FormatAdapter for OasisCsvAdapter {
    fn format(&self) -> MeshFormat {
        MeshFormat::OasisCsv
    }

    fn read(&self, path: &Path) -> Result<CanonicalMesh, MeshError> {
        let nodes = BufReader::new(File::open(path.join(NODES_FILE))?);
        let faces = open_optional(&path.join(FACES_FILE))?;
        if faces.is_none() {
            log::debug!("oasis-csv: no face table in {}", path.display());
        }
        let cells = BufReader::new(File::open(path.join(CELLS_FILE))?);
        let groups = GroupTables {
            patches: open_optional(&path.join(PATCHES_FILE))?,
            zones: open_optional(&path.join(ZONES_FILE))?,
        };
        self.read_grouped_parts(nodes, faces, cells, groups)
    }

    fn write(&self, mesh: &CanonicalMesh, path: &Path) -> Result<(), MeshError> {
        let mesh = Self::face_based(mesh)?;
        let created = !path.exists();
        if created {
            fs::create_dir_all(path)?;
        }
        let result = write_tables(&mesh, path);
        if result.is_err() && created {
            // Only succeeds if the directory is still empty.
            let _ = fs::remove_dir(path);
        }
        result
    }
}
