//! Gmsh `.msh` reader and writer.
//!
//! # Supported format
//! - Reading: ASCII `.msh` versions **2.2** and **4.1**.
//! - Writing: ASCII `.msh` version **2.2**.
//! - Element types: 1 (line), 2 (triangle), 3 (quad), 4 (tet), 5 (hex),
//!   6 (prism), 7 (pyramid), 15 (point).
//!
//! # Limitations
//! - Binary files are not supported.
//! - Higher-order elements are not supported.
//! - Polygons and face-based cells cannot be written.
//!
//! Node tags are mapped to contiguous node ids in file order. Elements of
//! the highest dimension become cells; in volume meshes 2D elements become
//! the face table. Points and lines are skipped.
//!
//! # Physical groups
//! Physical groups of faces and cells become named [`MeshGroup`]s, named
//! from `$PhysicalNames` or, failing that, after the physical tag. Version
//! 2.2 carries the physical tag on each element; version 4.1 attaches it
//! to the geometric entities of `$Entities`. An element listed once per
//! group under the same element tag joins every group. The writer emits
//! elements that way, with group `i` as physical tag `i + 1`.

use crate::io::atomic::write_atomically;
use crate::io::{FormatAdapter, MeshFormat, RawElement, assemble_by_dimension};
use crate::mesh::{CanonicalMesh, CellTopology, FaceCapability, GroupMembers, MeshGroup};
use crate::mesh_error::MeshError;
use crate::topology::cell_type::CellType;
use crate::topology::ids::{CellId, Entity, EntityKind, FaceId, NodeId};
use hashbrown::HashMap;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::str::{FromStr, Lines};

/// Gmsh `.msh` adapter.
#[derive(Debug, Default, Clone, Copy)]
pub struct GmshAdapter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Version {
    V2,
    V4,
}

/// A parsed element before node tags are resolved.
struct TaggedElement {
    elem_tag: u64,
    elem_type: u32,
    node_tags: Vec<u64>,
    /// Physical group tags; tag 0 ("no group") is never stored.
    physical: Vec<u64>,
}

/// Physical tags of each `(dimension, entity tag)` from `$Entities`.
type EntityPhysicals = HashMap<(u8, u64), Vec<u64>>;

/// `(dimension, physical tag)` to name, from `$PhysicalNames`.
type PhysicalNames = HashMap<(u8, u64), String>;

fn next_line<'a>(lines: &mut Lines<'a>, what: &str) -> Result<&'a str, MeshError> {
    lines
        .next()
        .ok_or_else(|| MeshError::MeshIoParse(format!("unexpected end of file: missing {what}")))
}

fn expect_end(lines: &mut Lines<'_>, marker: &str) -> Result<(), MeshError> {
    let end = next_line(lines, marker)?;
    if end.trim() != marker {
        return Err(MeshError::MeshIoParse(format!(
            "expected {marker}, found `{}`",
            end.trim()
        )));
    }
    Ok(())
}

fn parse_field<T: FromStr>(raw: Option<&str>, what: &str) -> Result<T, MeshError> {
    let raw = raw.ok_or_else(|| MeshError::MeshIoParse(format!("missing {what}")))?;
    raw.parse::<T>()
        .map_err(|_| MeshError::MeshIoParse(format!("invalid {what}: {raw}")))
}

fn parse_usize(raw: Option<&str>, what: &str) -> Result<usize, MeshError> {
    parse_field(raw, what)
}

fn parse_tag(raw: Option<&str>, what: &str) -> Result<u64, MeshError> {
    parse_field(raw, what)
}

fn parse_coord(raw: Option<&str>, axis: char) -> Result<f64, MeshError> {
    let raw = raw.ok_or_else(|| MeshError::MeshIoParse(format!("missing {axis} coordinate")))?;
    raw.parse::<f64>()
        .map_err(|_| MeshError::MeshIoParse(format!("invalid coordinate: {raw}")))
}

fn parse_xyz<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<[f64; 3], MeshError> {
    Ok([
        parse_coord(parts.next(), 'x')?,
        parse_coord(parts.next(), 'y')?,
        parse_coord(parts.next(), 'z')?,
    ])
}

/// Reads a `count` followed by that many tags.
fn parse_tag_list<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    what: &str,
) -> Result<Vec<u64>, MeshError> {
    let count = parse_usize(parts.next(), what)?;
    // The count is untrusted; the list only grows as tags are parsed.
    (0..count).map(|_| parse_tag(parts.next(), what)).collect()
}

impl GmshAdapter {
    fn parse_version(line: &str) -> Result<Version, MeshError> {
        let mut parts = line.split_whitespace();
        let version = parts
            .next()
            .ok_or_else(|| MeshError::MeshIoParse("missing mesh format version".into()))?;
        let file_type = parts
            .next()
            .ok_or_else(|| MeshError::MeshIoParse("missing mesh format type".into()))?;
        if file_type != "0" {
            return Err(MeshError::unsupported_read(
                MeshFormat::Gmsh,
                "binary .msh files",
            ));
        }
        match version {
            "2" | "2.0" | "2.1" | "2.2" => Ok(Version::V2),
            "4.1" => Ok(Version::V4),
            other => Err(MeshError::unsupported_read(
                MeshFormat::Gmsh,
                format!(".msh version {other}"),
            )),
        }
    }

    /// Dimension, cell type and node count of a Gmsh element type.
    fn element_kind(elem_type: u32) -> Option<(u8, Option<CellType>, usize)> {
        match elem_type {
            1 => Some((1, None, 2)),
            2 => Some((2, Some(CellType::Triangle), 3)),
            3 => Some((2, Some(CellType::Quadrilateral), 4)),
            4 => Some((3, Some(CellType::Tetrahedron), 4)),
            5 => Some((3, Some(CellType::Hexahedron), 8)),
            6 => Some((3, Some(CellType::Prism), 6)),
            7 => Some((3, Some(CellType::Pyramid), 5)),
            15 => Some((0, None, 1)),
            _ => None,
        }
    }

    fn element_type_code(cell_type: CellType) -> Option<u32> {
        match cell_type {
            CellType::Triangle => Some(2),
            CellType::Quadrilateral => Some(3),
            CellType::Tetrahedron => Some(4),
            CellType::Hexahedron => Some(5),
            CellType::Prism => Some(6),
            CellType::Pyramid => Some(7),
            CellType::Polygon | CellType::Polyhedron => None,
        }
    }

    fn element_node_count(elem_type: u32) -> Result<usize, MeshError> {
        Self::element_kind(elem_type)
            .map(|(_, _, n)| n)
            .ok_or_else(|| {
                MeshError::unsupported_read(MeshFormat::Gmsh, format!("element type {elem_type}"))
            })
    }

    fn read_physical_names(lines: &mut Lines<'_>) -> Result<PhysicalNames, MeshError> {
        let count_line = next_line(lines, "physical name count")?;
        let count = parse_usize(Some(count_line.trim()), "physical name count")?;
        let mut names = PhysicalNames::new();
        for _ in 0..count {
            let line = next_line(lines, "physical name")?;
            let mut parts = line.split_whitespace();
            let dim = parse_field::<u8>(parts.next(), "physical dimension")?;
            let tag = parse_tag(parts.next(), "physical tag")?;
            // Quoted names may contain blanks.
            let name = match (line.find('"'), line.rfind('"')) {
                (Some(open), Some(close)) if close > open => line[open + 1..close].to_string(),
                _ => parts.join(" "),
            };
            if name.is_empty() {
                return Err(MeshError::MeshIoParse(format!(
                    "missing name of physical group {tag}"
                )));
            }
            names.insert((dim, tag), name);
        }
        Ok(names)
    }

    fn read_entities_v4(lines: &mut Lines<'_>) -> Result<EntityPhysicals, MeshError> {
        let header = next_line(lines, "entity counts")?;
        let mut parts = header.split_whitespace();
        let counts: Vec<usize> = (0..4)
            .map(|_| parse_usize(parts.next(), "entity count"))
            .collect::<Result<_, _>>()?;
        let mut physicals = EntityPhysicals::new();
        for (dim, &count) in (0u8..).zip(&counts) {
            for _ in 0..count {
                let line = next_line(lines, "entity")?;
                let mut parts = line.split_whitespace();
                let tag = parse_tag(parts.next(), "entity tag")?;
                // Points carry x y z, higher entities a bounding box.
                let extent = if dim == 0 { 3 } else { 6 };
                for _ in 0..extent {
                    parse_field::<f64>(parts.next(), "entity extent")?;
                }
                let tags = parse_tag_list(&mut parts, "entity physical tag")?;
                if !tags.is_empty() {
                    physicals.insert((dim, tag), tags);
                }
            }
        }
        Ok(physicals)
    }

    fn read_nodes_v2(
        lines: &mut Lines<'_>,
        nodes: &mut Vec<(u64, [f64; 3])>,
    ) -> Result<(), MeshError> {
        let node_count = parse_usize(Some(next_line(lines, "node count")?.trim()), "node count")?;
        for _ in 0..node_count {
            let node_line = next_line(lines, "node")?;
            let mut parts = node_line.split_whitespace();
            let tag = parse_tag(parts.next(), "node tag")?;
            nodes.push((tag, parse_xyz(&mut parts)?));
        }
        Ok(())
    }

    fn read_nodes_v4(
        lines: &mut Lines<'_>,
        nodes: &mut Vec<(u64, [f64; 3])>,
    ) -> Result<(), MeshError> {
        let header = next_line(lines, "node block header")?;
        let mut parts = header.split_whitespace();
        let num_blocks = parse_usize(parts.next(), "node block count")?;
        let num_nodes = parse_usize(parts.next(), "node count")?;
        for _ in 0..num_blocks {
            let block = next_line(lines, "node block")?;
            let mut parts = block.split_whitespace();
            let _entity_dim = parse_usize(parts.next(), "entity dimension")?;
            let _entity_tag = parse_tag(parts.next(), "entity tag")?;
            // Parametric coordinates trail x y z and are ignored.
            let _parametric = parse_usize(parts.next(), "parametric flag")?;
            let in_block = parse_usize(parts.next(), "nodes in block")?;
            let mut tags = Vec::new();
            for _ in 0..in_block {
                tags.push(parse_tag(Some(next_line(lines, "node tag")?.trim()), "node tag")?);
            }
            for tag in tags {
                let coords_line = next_line(lines, "node coordinates")?;
                let mut parts = coords_line.split_whitespace();
                nodes.push((tag, parse_xyz(&mut parts)?));
            }
        }
        if nodes.len() < num_nodes {
            return Err(MeshError::MeshIoParse(format!(
                "expected {num_nodes} nodes, found {}",
                nodes.len()
            )));
        }
        Ok(())
    }

    fn read_elements_v2(
        lines: &mut Lines<'_>,
        elements: &mut Vec<TaggedElement>,
    ) -> Result<(), MeshError> {
        let count_line = next_line(lines, "element count")?;
        let elem_count = parse_usize(Some(count_line.trim()), "element count")?;
        for _ in 0..elem_count {
            let elem_line = next_line(lines, "element")?;
            let mut parts = elem_line.split_whitespace();
            let elem_tag = parse_tag(parts.next(), "element tag")?;
            let elem_type = parse_field::<u32>(parts.next(), "element type")?;
            let node_count = Self::element_node_count(elem_type)?;
            let num_tags = parse_usize(parts.next(), "element tag count")?;
            let tags: Vec<&str> = parts.by_ref().take(num_tags).collect();
            if tags.len() < num_tags {
                return Err(MeshError::MeshIoParse(format!(
                    "element {elem_tag}: expected {num_tags} tags, found {}",
                    tags.len()
                )));
            }
            // Physical group first, elementary entity second; 0 means none.
            let physical = match tags.first() {
                Some(&raw) => parse_tag(Some(raw), "physical tag")?,
                None => 0,
            };
            let mut node_tags = Vec::with_capacity(node_count);
            for _ in 0..node_count {
                node_tags.push(parse_tag(parts.next(), "element node tag")?);
            }
            elements.push(TaggedElement {
                elem_tag,
                elem_type,
                node_tags,
                physical: (physical != 0).then_some(physical).into_iter().collect(),
            });
        }
        Ok(())
    }

    fn read_elements_v4(
        lines: &mut Lines<'_>,
        entities: &EntityPhysicals,
        elements: &mut Vec<TaggedElement>,
    ) -> Result<(), MeshError> {
        let header = next_line(lines, "element block header")?;
        let mut parts = header.split_whitespace();
        let num_blocks = parse_usize(parts.next(), "element block count")?;
        let _num_elements = parse_usize(parts.next(), "element count")?;
        for _ in 0..num_blocks {
            let block = next_line(lines, "element block")?;
            let mut parts = block.split_whitespace();
            let entity_dim = parse_field::<u8>(parts.next(), "entity dimension")?;
            let entity_tag = parse_tag(parts.next(), "entity tag")?;
            let elem_type = parse_field::<u32>(parts.next(), "element type")?;
            let in_block = parse_usize(parts.next(), "elements in block")?;
            let node_count = Self::element_node_count(elem_type)?;
            let physical = entities
                .get(&(entity_dim, entity_tag))
                .cloned()
                .unwrap_or_default();
            for _ in 0..in_block {
                let elem_line = next_line(lines, "element")?;
                let mut parts = elem_line.split_whitespace();
                let elem_tag = parse_tag(parts.next(), "element tag")?;
                let mut node_tags = Vec::with_capacity(node_count);
                for _ in 0..node_count {
                    node_tags.push(parse_tag(parts.next(), "element node tag")?);
                }
                elements.push(TaggedElement {
                    elem_tag,
                    elem_type,
                    node_tags,
                    physical: physical.clone(),
                });
            }
        }
        Ok(())
    }

    /// Folds repeated element lines (one per physical group) into one
    /// element carrying every physical tag.
    fn merge_repeated(elements: Vec<TaggedElement>) -> Result<Vec<TaggedElement>, MeshError> {
        let mut merged: Vec<TaggedElement> = Vec::with_capacity(elements.len());
        let mut by_tag: HashMap<u64, usize> = HashMap::with_capacity(elements.len());
        for element in elements {
            match by_tag.get(&element.elem_tag) {
                Some(&idx) => {
                    let first = &mut merged[idx];
                    if first.elem_type != element.elem_type || first.node_tags != element.node_tags
                    {
                        return Err(MeshError::MeshIoParse(format!(
                            "element tag {} is used by two different elements",
                            element.elem_tag
                        )));
                    }
                    for tag in element.physical {
                        if !first.physical.contains(&tag) {
                            first.physical.push(tag);
                        }
                    }
                }
                None => {
                    by_tag.insert(element.elem_tag, merged.len());
                    merged.push(element);
                }
            }
        }
        Ok(merged)
    }

    /// Parses a mesh from any reader.
    pub fn read_from<R: Read>(&self, mut reader: R) -> Result<CanonicalMesh, MeshError> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        let mut lines = contents.lines();

        let mut version = Version::V2;
        let mut nodes: Vec<(u64, [f64; 3])> = Vec::new();
        let mut elements: Vec<TaggedElement> = Vec::new();
        let mut names = PhysicalNames::new();
        let mut entities = EntityPhysicals::new();

        while let Some(line) = lines.next() {
            match line.trim() {
                "$MeshFormat" => {
                    version = Self::parse_version(next_line(&mut lines, "MeshFormat")?)?;
                    expect_end(&mut lines, "$EndMeshFormat")?;
                }
                "$PhysicalNames" => {
                    names = Self::read_physical_names(&mut lines)?;
                    expect_end(&mut lines, "$EndPhysicalNames")?;
                }
                "$Entities" if version == Version::V4 => {
                    entities = Self::read_entities_v4(&mut lines)?;
                    expect_end(&mut lines, "$EndEntities")?;
                }
                "$Nodes" => {
                    match version {
                        Version::V2 => Self::read_nodes_v2(&mut lines, &mut nodes)?,
                        Version::V4 => Self::read_nodes_v4(&mut lines, &mut nodes)?,
                    }
                    expect_end(&mut lines, "$EndNodes")?;
                }
                "$Elements" => {
                    match version {
                        Version::V2 => Self::read_elements_v2(&mut lines, &mut elements)?,
                        Version::V4 => {
                            Self::read_elements_v4(&mut lines, &entities, &mut elements)?
                        }
                    }
                    expect_end(&mut lines, "$EndElements")?;
                }
                _ => {
                    // ignore other sections
                }
            }
        }

        let mut tag_to_id: HashMap<u64, NodeId> = HashMap::with_capacity(nodes.len());
        for (idx, (tag, _)) in nodes.iter().enumerate() {
            if tag_to_id.insert(*tag, NodeId::new(idx)).is_some() {
                return Err(MeshError::MeshIoParse(format!("duplicate node tag {tag}")));
            }
        }

        let mut skipped = 0usize;
        let mut kept: Vec<(CellType, TaggedElement)> = Vec::with_capacity(elements.len());
        for element in Self::merge_repeated(elements)? {
            match Self::element_kind(element.elem_type) {
                Some((_, Some(cell_type), _)) => kept.push((cell_type, element)),
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            log::debug!("gmsh: skipped {skipped} point/line elements");
        }

        let top = kept
            .iter()
            .map(|(cell_type, _)| cell_type.dimension())
            .max()
            .unwrap_or(0);
        let (mut next_face, mut next_cell) = (0usize, 0usize);
        let mut raw = Vec::with_capacity(kept.len());
        // Keyed by physical tag first so groups come out in tag order.
        let mut groups: BTreeMap<(u64, u8), Vec<Entity>> = BTreeMap::new();
        for (cell_type, element) in kept {
            let owner = if top == 3 && cell_type.dimension() < 3 {
                next_face += 1;
                Entity::Face(FaceId::new(next_face - 1))
            } else {
                next_cell += 1;
                Entity::Cell(CellId::new(next_cell - 1))
            };
            for &physical in &element.physical {
                groups
                    .entry((physical, cell_type.dimension()))
                    .or_default()
                    .push(owner);
            }
            let ids = element
                .node_tags
                .iter()
                .map(|tag| {
                    tag_to_id.get(tag).copied().ok_or_else(|| MeshError::Reference {
                        owner,
                        target: EntityKind::Node,
                        id: *tag,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            raw.push(RawElement::nodes(cell_type, ids));
        }

        let coords = nodes.into_iter().map(|(_, xyz)| xyz).collect();
        let mut mesh = assemble_by_dimension(coords, raw, FaceCapability::Present)?;
        mesh.groups = Self::named_groups(groups, &names);
        log::debug!(
            "gmsh: read {} nodes, {} faces, {} cells, {} groups",
            mesh.node_count(),
            mesh.face_count(),
            mesh.cell_count(),
            mesh.groups().len()
        );
        Ok(mesh)
    }

    /// Turns physical groups into named mesh groups, merging groups that end
    /// up with the same kind and name.
    fn named_groups(
        groups: BTreeMap<(u64, u8), Vec<Entity>>,
        names: &PhysicalNames,
    ) -> Vec<MeshGroup> {
        let mut named: Vec<MeshGroup> = Vec::with_capacity(groups.len());
        for ((physical, dim), members) in groups {
            let name = names
                .get(&(dim, physical))
                .cloned()
                .unwrap_or_else(|| physical.to_string());
            let faces = members.iter().filter_map(|m| match m {
                Entity::Face(id) => Some(*id),
                _ => None,
            });
            let cells = members.iter().filter_map(|m| match m {
                Entity::Cell(id) => Some(*id),
                _ => None,
            });
            // Every element of one dimension lands in the same table.
            let group = match members.first() {
                Some(Entity::Face(_)) => MeshGroup::faces(name, faces.collect()),
                _ => MeshGroup::cells(name, cells.collect()),
            };
            match named
                .iter_mut()
                .find(|g| g.kind() == group.kind() && g.name == group.name)
            {
                Some(existing) => match (&mut existing.members, group.members) {
                    (GroupMembers::Faces(a), GroupMembers::Faces(b)) => a.extend(b),
                    (GroupMembers::Cells(a), GroupMembers::Cells(b)) => a.extend(b),
                    _ => {}
                },
                None => named.push(group),
            }
        }
        named
    }

    /// Physical tags of every face and cell, from the group list.
    fn element_physicals(mesh: &CanonicalMesh) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
        let mut faces = vec![Vec::new(); mesh.face_count()];
        let mut cells = vec![Vec::new(); mesh.cell_count()];
        for (idx, group) in mesh.groups().iter().enumerate() {
            let (table, members) = match &group.members {
                GroupMembers::Faces(_) => (&mut faces, group.members.indices()),
                GroupMembers::Cells(_) => (&mut cells, group.members.indices()),
            };
            for member in members {
                if let Some(tags) = table.get_mut(member) {
                    tags.push(idx + 1);
                }
            }
        }
        (faces, cells)
    }

    /// Encodes `mesh` as ASCII `.msh` 2.2.
    ///
    /// Records stream out in table order; an unsupported element aborts the
    /// write part way, so callers writing to disk go through
    /// [`FormatAdapter::write`].
    pub fn write_to<W: Write>(&self, mesh: &CanonicalMesh, mut writer: W) -> Result<(), MeshError> {
        let volumetric = mesh.cell_dimension() == Some(3);
        if !volumetric && mesh.face_count() > 0 {
            return Err(MeshError::unsupported_write(
                MeshFormat::Gmsh,
                "face table without volume cells",
            ));
        }

        writeln!(writer, "$MeshFormat")?;
        writeln!(writer, "2.2 0 8")?;
        writeln!(writer, "$EndMeshFormat")?;

        if !mesh.groups().is_empty() {
            let cell_dim = mesh.cell_dimension().unwrap_or(3);
            writeln!(writer, "$PhysicalNames")?;
            writeln!(writer, "{}", mesh.groups().len())?;
            for (idx, group) in mesh.groups().iter().enumerate() {
                let dim = match group.kind() {
                    EntityKind::Face => 2,
                    _ => cell_dim,
                };
                writeln!(writer, "{dim} {} \"{}\"", idx + 1, group.name)?;
            }
            writeln!(writer, "$EndPhysicalNames")?;
        }

        writeln!(writer, "$Nodes")?;
        writeln!(writer, "{}", mesh.node_count())?;
        for (idx, node) in mesh.nodes().iter().enumerate() {
            let [x, y, z] = node.coords;
            writeln!(writer, "{} {x} {y} {z}", idx + 1)?;
        }
        writeln!(writer, "$EndNodes")?;

        let (face_physicals, cell_physicals) = Self::element_physicals(mesh);
        let lines: usize = face_physicals
            .iter()
            .chain(&cell_physicals)
            .map(|tags| tags.len().max(1))
            .sum();
        writeln!(writer, "$Elements")?;
        writeln!(writer, "{lines}")?;
        let mut elem_tag = 0usize;
        for ((idx, face), physicals) in mesh.faces().iter().enumerate().zip(&face_physicals) {
            let elem_type = match face.arity() {
                3 => 2,
                4 => 3,
                n => {
                    return Err(MeshError::unsupported_write(
                        MeshFormat::Gmsh,
                        format!("face {idx} with {n} nodes"),
                    ));
                }
            };
            elem_tag += 1;
            let nodes = face.oriented_nodes();
            Self::write_element(&mut writer, elem_tag, elem_type, physicals, &nodes)?;
        }
        for ((idx, cell), physicals) in mesh.cells().iter().enumerate().zip(&cell_physicals) {
            let CellTopology::Nodes(nodes) = &cell.topology else {
                return Err(MeshError::unsupported_write(
                    MeshFormat::Gmsh,
                    format!("face-based cell {idx}"),
                ));
            };
            let elem_type = Self::element_type_code(cell.cell_type).ok_or_else(|| {
                MeshError::unsupported_write(
                    MeshFormat::Gmsh,
                    format!("{:?} cell {idx}", cell.cell_type),
                )
            })?;
            elem_tag += 1;
            Self::write_element(&mut writer, elem_tag, elem_type, physicals, nodes)?;
        }
        writeln!(writer, "$EndElements")?;
        Ok(())
    }

    /// One line per physical group (or one with group 0), all under the same
    /// element tag; the elementary entity is always 1.
    fn write_element<W: Write>(
        writer: &mut W,
        elem_tag: usize,
        elem_type: u32,
        physicals: &[usize],
        nodes: &[NodeId],
    ) -> Result<(), MeshError> {
        let nodes = nodes.iter().map(|n| n.index() + 1).join(" ");
        let none = [0];
        let physicals = if physicals.is_empty() { &none[..] } else { physicals };
        for physical in physicals {
            writeln!(writer, "{elem_tag} {elem_type} 2 {physical} 1 {nodes}")?;
        }
        Ok(())
    }
}

impl FormatAdapter for GmshAdapter {
    fn format(&self) -> MeshFormat {
        MeshFormat::Gmsh
    }

    fn read(&self, path: &Path) -> Result<CanonicalMesh, MeshError> {
        self.read_from(BufReader::new(File::open(path)?))
    }

    fn write(&self, mesh: &CanonicalMesh, path: &Path) -> Result<(), MeshError> {
        write_atomically(path, |w| self.write_to(mesh, w))
    }
}
