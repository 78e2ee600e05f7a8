//! Legacy VTK (`.vtk`) reader/writer for unstructured grids.
//!
//! This implementation targets ASCII legacy VTK files with an
//! `UNSTRUCTURED_GRID` dataset. Supported cell codes are 5 (triangle),
//! 7 (polygon), 9 (quad), 10 (tet), 12 (hex), 13 (wedge), 14 (pyramid) and
//! 42 (polyhedron face stream). Vertices and lines (1, 3, 4) are skipped on
//! read; attribute data after `CELL_TYPES` is ignored.
//!
//! Legacy VTK has no separate face table. In volume meshes the writer emits
//! the face table as polygon cells ahead of the volume cells, and the reader
//! turns those 2D cells back into faces. Polyhedron face loops are matched
//! against the face table by node sequence.

use crate::io::atomic::write_atomically;
use crate::io::{ElementShape, FormatAdapter, MeshFormat, RawElement, assemble_by_dimension};
use crate::mesh::{CanonicalMesh, CellTopology, FaceCapability};
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;
use crate::topology::ids::{CellId, Entity, EntityKind, NodeId};
use itertools::Itertools;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

const CODE_POLYHEDRON: u32 = 42;

/// Legacy VTK adapter.
#[derive(Debug, Clone)]
pub struct VtkAdapter {
    tool_version: String,
}

impl Default for VtkAdapter {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}

impl VtkAdapter {
    /// `tool_version` goes into the title line of written files.
    pub fn new(tool_version: impl Into<String>) -> Self {
        Self {
            tool_version: tool_version.into(),
        }
    }

    pub fn tool_version(&self) -> &str {
        &self.tool_version
    }

    fn vtk_cell_code(cell_type: CellType) -> u32 {
        match cell_type {
            CellType::Triangle => 5,
            CellType::Polygon => 7,
            CellType::Quadrilateral => 9,
            CellType::Tetrahedron => 10,
            CellType::Hexahedron => 12,
            CellType::Prism => 13,
            CellType::Pyramid => 14,
            CellType::Polyhedron => CODE_POLYHEDRON,
        }
    }

    fn polygon_code(arity: usize) -> u32 {
        match arity {
            3 => 5,
            4 => 9,
            _ => 7,
        }
    }

    /// `None` for codes that are skipped on read.
    fn cell_type_for_code(code: u32) -> Result<Option<CellType>, MeshError> {
        match code {
            1 | 3 | 4 => Ok(None),
            5 => Ok(Some(CellType::Triangle)),
            7 => Ok(Some(CellType::Polygon)),
            9 => Ok(Some(CellType::Quadrilateral)),
            10 => Ok(Some(CellType::Tetrahedron)),
            12 => Ok(Some(CellType::Hexahedron)),
            13 => Ok(Some(CellType::Prism)),
            14 => Ok(Some(CellType::Pyramid)),
            CODE_POLYHEDRON => Ok(Some(CellType::Polyhedron)),
            _ => Err(MeshError::unsupported_read(
                MeshFormat::Vtk,
                format!("cell type {code}"),
            )),
        }
    }

    /// Builds the `CELLS` records (without the leading count) and codes.
    fn cell_records(mesh: &CanonicalMesh) -> Result<Vec<(u32, Vec<usize>)>, MeshError> {
        let volumetric = mesh.cell_dimension() == Some(3);
        if !volumetric && mesh.face_count() > 0 {
            return Err(MeshError::unsupported_write(
                MeshFormat::Vtk,
                "face table without volume cells",
            ));
        }

        let mut records = Vec::with_capacity(mesh.face_count() + mesh.cell_count());
        for face in mesh.faces() {
            let ids = face.oriented_nodes().iter().map(|n| n.index()).collect();
            records.push((Self::polygon_code(face.arity()), ids));
        }
        for (idx, cell) in mesh.cells().iter().enumerate() {
            match &cell.topology {
                CellTopology::Nodes(nodes) => {
                    let ids = nodes.iter().map(|n| n.index()).collect();
                    records.push((Self::vtk_cell_code(cell.cell_type), ids));
                }
                CellTopology::Faces(faces) => {
                    let mut stream = vec![faces.len()];
                    for &face_id in faces {
                        let face = mesh.face(face_id).ok_or_else(|| MeshError::Reference {
                            owner: Entity::Cell(CellId::new(idx)),
                            target: EntityKind::Face,
                            id: face_id.index() as u64,
                        })?;
                        stream.push(face.arity());
                        stream.extend(face.oriented_nodes().iter().map(|n| n.index()));
                    }
                    records.push((CODE_POLYHEDRON, stream));
                }
            }
        }
        Ok(records)
    }

    /// Encodes `mesh` as a legacy ASCII unstructured grid.
    pub fn write_to<W: Write>(&self, mesh: &CanonicalMesh, mut writer: W) -> Result<(), MeshError> {
        let records = Self::cell_records(mesh)?;
        if !mesh.groups().is_empty() {
            log::debug!("vtk: dropping {} named groups", mesh.groups().len());
        }
        let total_size: usize = records.iter().map(|(_, r)| r.len() + 1).sum();

        writeln!(writer, "# vtk DataFile Version 3.0")?;
        writeln!(writer, "mesh-interchange {}", self.tool_version)?;
        writeln!(writer, "ASCII")?;
        writeln!(writer, "DATASET UNSTRUCTURED_GRID")?;
        writeln!(writer, "POINTS {} double", mesh.node_count())?;
        for node in mesh.nodes() {
            let [x, y, z] = node.coords;
            writeln!(writer, "{x} {y} {z}")?;
        }

        writeln!(writer, "CELLS {} {}", records.len(), total_size)?;
        for (_, record) in &records {
            writeln!(writer, "{} {}", record.len(), record.iter().join(" "))?;
        }

        writeln!(writer, "CELL_TYPES {}", records.len())?;
        for (code, _) in &records {
            writeln!(writer, "{code}")?;
        }
        Ok(())
    }

    /// Parses a legacy ASCII unstructured grid from any reader.
    pub fn read_from<R: Read>(&self, mut reader: R) -> Result<CanonicalMesh, MeshError> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;
        let mut lines = input.lines();
        let version = lines
            .next()
            .ok_or_else(|| MeshError::MeshIoParse("missing VTK version line".into()))?;
        if !version.trim_start().starts_with("# vtk") {
            return Err(MeshError::MeshIoParse(format!(
                "not a legacy VTK file: `{}`",
                version.trim()
            )));
        }
        let _title = lines.next();
        let format = lines
            .next()
            .ok_or_else(|| MeshError::MeshIoParse("missing ASCII line".into()))?;
        match format.trim() {
            "ASCII" => {}
            "BINARY" => {
                return Err(MeshError::unsupported_read(
                    MeshFormat::Vtk,
                    "binary legacy files",
                ));
            }
            other => {
                return Err(MeshError::MeshIoParse(format!("unknown data format `{other}`")));
            }
        }
        let dataset = lines
            .next()
            .ok_or_else(|| MeshError::MeshIoParse("missing DATASET line".into()))?;
        if !dataset.trim().ends_with("UNSTRUCTURED_GRID") {
            return Err(MeshError::unsupported_read(
                MeshFormat::Vtk,
                format!("`{}`", dataset.trim()),
            ));
        }

        let mut tokens = lines.flat_map(str::split_whitespace);
        let mut next_token = |what: &str| {
            tokens
                .next()
                .ok_or_else(|| MeshError::MeshIoParse(format!("missing {what}")))
        };

        if next_token("POINTS")? != "POINTS" {
            return Err(MeshError::MeshIoParse("expected POINTS section".into()));
        }
        let num_points = parse_count(next_token("point count")?, "point count")?;
        let _point_type = next_token("point type")?;
        // Counts come from the file; vectors grow only as tokens are consumed.
        let mut points = Vec::new();
        for _ in 0..num_points {
            let mut xyz = [0.0f64; 3];
            for value in &mut xyz {
                let raw = next_token("point value")?;
                *value = raw
                    .parse::<f64>()
                    .map_err(|_| MeshError::MeshIoParse(format!("invalid point value {raw}")))?;
            }
            points.push(xyz);
        }

        if next_token("CELLS")? != "CELLS" {
            return Err(MeshError::MeshIoParse("expected CELLS section".into()));
        }
        let num_cells = parse_count(next_token("cell count")?, "cell count")?;
        let _total_size = next_token("cell list size")?;
        let mut connectivity = Vec::new();
        for _ in 0..num_cells {
            let raw = next_token("cell size")?;
            if raw == "OFFSETS" {
                return Err(MeshError::unsupported_read(
                    MeshFormat::Vtk,
                    "OFFSETS/CONNECTIVITY cell arrays",
                ));
            }
            let count = parse_count(raw, "cell size")?;
            let mut cell = Vec::new();
            for _ in 0..count {
                cell.push(parse_count(next_token("cell index")?, "cell index")?);
            }
            connectivity.push(cell);
        }

        if next_token("CELL_TYPES")? != "CELL_TYPES" {
            return Err(MeshError::MeshIoParse("expected CELL_TYPES section".into()));
        }
        let type_count = parse_count(next_token("cell types count")?, "cell types count")?;
        if type_count != num_cells {
            return Err(MeshError::MeshIoParse(format!(
                "{type_count} cell types for {num_cells} cells"
            )));
        }
        let mut codes = Vec::with_capacity(type_count);
        for _ in 0..type_count {
            let raw = next_token("cell type")?;
            codes.push(
                raw.parse::<u32>()
                    .map_err(|_| MeshError::MeshIoParse(format!("invalid cell type {raw}")))?,
            );
        }
        if tokens.next().is_some() {
            log::debug!("vtk: ignoring attribute data after CELL_TYPES");
        }

        let mut skipped = 0usize;
        let mut elements = Vec::with_capacity(num_cells);
        for (idx, (code, raw)) in codes.into_iter().zip(connectivity).enumerate() {
            let Some(cell_type) = Self::cell_type_for_code(code)? else {
                skipped += 1;
                continue;
            };
            if code == CODE_POLYHEDRON {
                let loops = parse_face_stream(&raw).ok_or_else(|| {
                    MeshError::MeshIoParse(format!(
                        "malformed polyhedron face stream in cell {idx}"
                    ))
                })?;
                elements.push(RawElement {
                    cell_type,
                    shape: ElementShape::FaceStream(loops),
                });
            } else {
                let nodes = raw.into_iter().map(NodeId::new).collect();
                elements.push(RawElement::nodes(cell_type, nodes));
            }
        }
        if skipped > 0 {
            log::debug!("vtk: skipped {skipped} vertex/line cells");
        }

        let mesh = assemble_by_dimension(points, elements, FaceCapability::Absent)?;
        log::debug!(
            "vtk: read {} nodes, {} faces, {} cells",
            mesh.node_count(),
            mesh.face_count(),
            mesh.cell_count()
        );
        Ok(mesh)
    }
}

fn parse_count(raw: &str, what: &str) -> Result<usize, MeshError> {
    raw.parse::<usize>()
        .map_err(|_| MeshError::MeshIoParse(format!("invalid {what}: {raw}")))
}

/// Splits `nFaces (k id...)...` into node loops; `None` if lengths disagree.
fn parse_face_stream(raw: &[usize]) -> Option<Vec<Vec<NodeId>>> {
    let (&num_faces, mut rest) = raw.split_first()?;
    let mut loops = Vec::with_capacity(num_faces.min(rest.len()));
    for _ in 0..num_faces {
        let (&k, tail) = rest.split_first()?;
        if tail.len() < k {
            return None;
        }
        loops.push(tail[..k].iter().copied().map(NodeId::new).collect());
        rest = &tail[k..];
    }
    rest.is_empty().then_some(loops)
}

impl FormatAdapter for VtkAdapter {
    fn format(&self) -> MeshFormat {
        MeshFormat::Vtk
    }

    fn read(&self, path: &Path) -> Result<CanonicalMesh, MeshError> {
        self.read_from(BufReader::new(File::open(path)?))
    }

    fn write(&self, mesh: &CanonicalMesh, path: &Path) -> Result<(), MeshError> {
        write_atomically(path, |w| self.write_to(mesh, w))
    }
}
