// crates/kryon-core/src/decoder.rs
//! The binary decoder (spec §4.1). Operates in a fixed section order driven
//! by the header's offset fields, never by sequential file position:
//! strings (eager), elements, styles, component definitions, animations
//! (opaque), resources.

use crate::{
    decode_property_value, AnimationRef, ComponentDefinition, Document, ElementKind,
    ElementRecord, EventType, KRBHeader, KryonError, Property, PropertyDefinition, PropertyId,
    RawEvent, ResourceFormat, ResourceKind, ResourceRecord, Result, Style,
};
use std::path::Path;

const ELEMENT_HEADER_SIZE: usize = 17;

/// A bounds-checked cursor over the whole file buffer. Every read advances
/// `position`; callers `seek` to jump to a section's absolute offset, per
/// the offset-driven (not sequential) section order.
struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    fn seek(&mut self, offset: usize) {
        self.position = offset;
    }

    fn require(&self, len: usize) -> Result<()> {
        if self.position + len > self.data.len() {
            return Err(KryonError::Truncated {
                expected: self.position + len,
                found: self.data.len(),
            });
        }
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.require(1)?;
        let v = self.data[self.position];
        self.position += 1;
        Ok(v)
    }

    fn read_u16(&mut self) -> Result<u16> {
        self.require(2)?;
        let v = u16::from_le_bytes([self.data[self.position], self.data[self.position + 1]]);
        self.position += 2;
        Ok(v)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.require(len)?;
        let v = self.data[self.position..self.position + len].to_vec();
        self.position += len;
        Ok(v)
    }
}

/// Decodes a complete KRB buffer into a [`Document`]. Fatal per §7: bad
/// magic, truncated reads, unknown resource format, `COMPRESSED` flag set.
pub fn decode(data: &[u8]) -> Result<Document> {
    let header = crate::header::parse_header(data)?;

    if header.version.minor > 4 {
        tracing::warn!(
            major = header.version.major,
            minor = header.version.minor,
            "KRB version newer than this decoder knows about, continuing"
        );
    }

    if header.compressed() {
        return Err(KryonError::CompressedUnsupported);
    }

    validate_section_offset(&header, "element", header.offsets.element_offset, header.element_count)?;
    validate_section_offset(&header, "style", header.offsets.style_offset, header.style_count)?;
    validate_section_offset(&header, "string", header.offsets.string_offset, header.string_count)?;
    validate_section_offset(&header, "resource", header.offsets.resource_offset, header.resource_count)?;
    if header.has_component_defs() {
        validate_section_offset(
            &header,
            "component_def",
            header.offsets.component_def_offset,
            header.component_def_count,
        )?;
    }

    // 1. Strings, eagerly, even though they appear later in the file.
    let strings = parse_strings(data, &header)?;

    // 2. Elements.
    let mut cursor = Cursor::new(data);
    cursor.seek(header.offsets.element_offset as usize);
    let mut elements = Vec::with_capacity(header.element_count as usize);
    for _ in 0..header.element_count {
        let offset = cursor.position as u32;
        let element = parse_element_record(&mut cursor, offset, header.extended_color())?;
        elements.push(element);
    }

    if header.has_app() && !elements.is_empty() && elements[0].kind != ElementKind::App {
        tracing::warn!("HAS_APP set but element 0 is not an App element");
    }

    // 3. Styles.
    let mut styles = Vec::new();
    if header.has_styles() {
        cursor.seek(header.offsets.style_offset as usize);
        let mut seen_ids = std::collections::HashSet::new();
        for _ in 0..header.style_count {
            let id = cursor.read_u8()?;
            let name_string_index = cursor.read_u8()?;
            let prop_count = cursor.read_u8()?;
            let mut properties = Vec::with_capacity(prop_count as usize);
            for _ in 0..prop_count {
                properties.push(parse_property(&mut cursor, header.extended_color())?);
            }
            if !seen_ids.insert(id) {
                tracing::warn!(style_id = id, "duplicate style id, keeping first occurrence");
                continue;
            }
            styles.push(Style {
                id,
                name_string_index,
                properties,
            });
        }
    }

    // 4. Component definitions (v0.4+).
    let mut component_defs = Vec::new();
    if header.has_component_defs() {
        cursor.seek(header.offsets.component_def_offset as usize);
        for _ in 0..header.component_def_count {
            let name_string_index = cursor.read_u8()?;
            let prop_def_count = cursor.read_u8()?;
            let mut property_defs = Vec::with_capacity(prop_def_count as usize);
            for _ in 0..prop_def_count {
                let def_name_index = cursor.read_u8()?;
                let value_type_hint = cursor.read_u8()?;
                let default_size = cursor.read_u8()? as usize;
                let default_bytes = cursor.read_bytes(default_size)?;
                property_defs.push(PropertyDefinition {
                    name_string_index: def_name_index,
                    value_type_hint,
                    default_bytes,
                });
            }

            let template_root = cursor.position;
            let template_size = measure_template_subtree(data, template_root)?;
            let template_bytes = data[template_root..template_root + template_size].to_vec();
            cursor.seek(template_root + template_size);

            component_defs.push(ComponentDefinition {
                name_string_index,
                property_defs,
                template_bytes,
            });
        }
    }

    // 5. Animations: opaque bytes, parsing deferred.
    let animation_bytes = if header.has_animations() && header.animation_count > 0 {
        capture_animation_span(data, &header)
    } else {
        Vec::new()
    };

    // 6. Resources.
    let resources = if header.has_resources() {
        parse_resources(data, &header)?
    } else {
        Vec::new()
    };

    Ok(Document {
        header,
        strings,
        styles,
        elements,
        resources,
        component_defs,
        animation_bytes,
    })
}

/// Reads a KRB file from disk and decodes it. Unreadable files are a
/// user-visible failure (§7: process exits non-zero with a single-line
/// error); callers surface the `std::io::Error` via `KryonError::Io`.
pub fn load_krb_file(path: impl AsRef<Path>) -> Result<Document> {
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

fn validate_section_offset(header: &KRBHeader, name: &str, offset: u32, count: u16) -> Result<()> {
    if count > 0 && (offset as usize) < header.header_size {
        return Err(KryonError::OffsetOutOfRange {
            section: name.to_string(),
            offset,
        });
    }
    Ok(())
}

fn parse_strings(data: &[u8], header: &KRBHeader) -> Result<Vec<String>> {
    let mut cursor = Cursor::new(data);
    cursor.seek(header.offsets.string_offset as usize);

    let table_count = cursor.read_u16()?;
    if table_count != header.string_count {
        tracing::warn!(
            header_count = header.string_count,
            table_count,
            "string table count disagrees with header, using header count"
        );
    }

    let mut strings = Vec::with_capacity(header.string_count as usize);
    for _ in 0..header.string_count {
        let len = cursor.read_u8()? as usize;
        let bytes = cursor.read_bytes(len)?;
        strings.push(String::from_utf8_lossy(&bytes).into_owned());
    }
    Ok(strings)
}

fn parse_property(cursor: &mut Cursor, extended_color: bool) -> Result<Property> {
    let raw_id = cursor.read_u8()?;
    let value_type = cursor.read_u8()?;
    let size = cursor.read_u8()? as usize;
    let raw_bytes = cursor.read_bytes(size)?;
    let id = PropertyId::from(raw_id);
    let value = decode_property_value(id, &raw_bytes, extended_color);
    Ok(Property {
        id,
        value_type,
        raw_bytes,
        value,
    })
}

fn parse_element_record(cursor: &mut Cursor, file_offset: u32, extended_color: bool) -> Result<ElementRecord> {
    let kind = ElementKind::from(cursor.read_u8()?);
    let id_string_index = cursor.read_u8()?;
    let pos_x = cursor.read_u16()?;
    let pos_y = cursor.read_u16()?;
    let width = cursor.read_u16()?;
    let height = cursor.read_u16()?;
    let layout_byte = cursor.read_u8()?;
    let style_id = cursor.read_u8()?;
    let property_count = cursor.read_u8()?;
    let child_count = cursor.read_u8()?;
    let event_count = cursor.read_u8()?;
    let animation_count = cursor.read_u8()?;
    let custom_prop_count = cursor.read_u8()?;

    let mut properties = Vec::with_capacity(property_count as usize);
    for _ in 0..property_count {
        properties.push(parse_property(cursor, extended_color)?);
    }

    let mut custom_properties = Vec::with_capacity(custom_prop_count as usize);
    for _ in 0..custom_prop_count {
        let key_index = cursor.read_u8()?;
        let prop = parse_property(cursor, extended_color)?;
        custom_properties.push((key_index, prop));
    }

    let mut events = Vec::with_capacity(event_count as usize);
    for _ in 0..event_count {
        let event_type = EventType::from(cursor.read_u8()?);
        let callback_string_index = cursor.read_u8()?;
        events.push(RawEvent {
            event_type,
            callback_string_index,
        });
    }

    let mut animation_refs = Vec::with_capacity(animation_count as usize);
    for _ in 0..animation_count {
        let anim_index = cursor.read_u8()?;
        let trigger = cursor.read_u8()?;
        animation_refs.push(AnimationRef { anim_index, trigger });
    }

    let mut child_offsets = Vec::with_capacity(child_count as usize);
    for _ in 0..child_count {
        child_offsets.push(cursor.read_u16()?);
    }

    Ok(ElementRecord {
        file_offset,
        kind,
        id_string_index,
        pos_x,
        pos_y,
        width,
        height,
        layout_byte,
        style_id,
        properties,
        custom_properties,
        events,
        animation_refs,
        child_offsets,
        children: Vec::new(),
        parent: None,
    })
}

/// Measures a component template subtree structurally (§4.1 item 4): no
/// stored length exists, so we walk the same element-block shape the real
/// parser knows, summing sizes instead of materializing values, following
/// child offsets (which inside a template are relative to the template
/// root, not to each element's own parent, per spec §3 Invariants) until
/// the work queue is empty.
pub fn measure_template_subtree(data: &[u8], root_offset: usize) -> Result<usize> {
    let mut max_reached = 0usize;
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(0usize); // relative offset of the template root

    let mut visited = std::collections::HashSet::new();

    while let Some(rel_offset) = queue.pop_front() {
        if !visited.insert(rel_offset) {
            continue;
        }
        let abs = root_offset + rel_offset;
        let (block_size, child_offsets) = measure_element_block(data, abs)?;
        max_reached = max_reached.max(rel_offset + block_size);
        for child_rel in child_offsets {
            queue.push_back(child_rel as usize);
        }
    }

    Ok(max_reached)
}

/// Reads just enough of one element block at `abs` to learn its byte size
/// and child offsets, without decoding property values or touching the
/// string table.
fn measure_element_block(data: &[u8], abs: usize) -> Result<(usize, Vec<u16>)> {
    if abs + ELEMENT_HEADER_SIZE > data.len() {
        return Err(KryonError::Truncated {
            expected: abs + ELEMENT_HEADER_SIZE,
            found: data.len(),
        });
    }
    let property_count = data[abs + 12];
    let child_count = data[abs + 13];
    let event_count = data[abs + 14];
    let animation_count = data[abs + 15];
    let custom_prop_count = data[abs + 16];

    let mut pos = abs + ELEMENT_HEADER_SIZE;

    let mut skip_property = |pos: &mut usize| -> Result<()> {
        if *pos + 3 > data.len() {
            return Err(KryonError::Truncated {
                expected: *pos + 3,
                found: data.len(),
            });
        }
        let size = data[*pos + 2] as usize;
        *pos += 3 + size;
        Ok(())
    };

    for _ in 0..property_count {
        skip_property(&mut pos)?;
    }
    for _ in 0..custom_prop_count {
        // custom property entry: key_index (1) + (id,value_type,size,bytes)
        pos += 1;
        skip_property(&mut pos)?;
    }
    pos += event_count as usize * 2;
    pos += animation_count as usize * 2;

    let mut child_offsets = Vec::with_capacity(child_count as usize);
    for _ in 0..child_count {
        if pos + 2 > data.len() {
            return Err(KryonError::Truncated {
                expected: pos + 2,
                found: data.len(),
            });
        }
        child_offsets.push(u16::from_le_bytes([data[pos], data[pos + 1]]));
        pos += 2;
    }

    Ok((pos - abs, child_offsets))
}

/// Parses a component template's bytes into a standalone element table,
/// using the same element-block parser as the main document, but treating
/// child offsets as template-root-relative (spec §3 Invariants).
pub fn parse_template_elements(template_bytes: &[u8], extended_color: bool) -> Result<Vec<ElementRecord>> {
    let mut elements = Vec::new();
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(0u32);
    let mut seen = std::collections::HashSet::new();

    while let Some(offset) = queue.pop_front() {
        if !seen.insert(offset) {
            continue;
        }
        let mut cursor = Cursor::new(template_bytes);
        cursor.seek(offset as usize);
        let element = parse_element_record(&mut cursor, offset, extended_color)?;
        for &child_offset in &element.child_offsets {
            queue.push_back(child_offset as u32);
        }
        elements.push(element);
    }

    elements.sort_by_key(|e| e.file_offset);
    Ok(elements)
}

/// The animation section has no stored length either; it runs up to the
/// start of whichever known section (strings, resources, component defs)
/// has the lowest offset greater than the animation offset, or to
/// `total_size` if none follows (spec §4.1 item 5).
fn capture_animation_span(data: &[u8], header: &KRBHeader) -> Vec<u8> {
    let start = header.offsets.animation_offset as usize;
    let mut candidates = vec![header.total_size as usize];
    if header.string_count > 0 {
        candidates.push(header.offsets.string_offset as usize);
    }
    if header.resource_count > 0 {
        candidates.push(header.offsets.resource_offset as usize);
    }
    if header.has_component_defs() && header.component_def_count > 0 {
        candidates.push(header.offsets.component_def_offset as usize);
    }
    let end = candidates
        .into_iter()
        .filter(|&c| c > start)
        .min()
        .unwrap_or(data.len())
        .min(data.len());

    if start >= end {
        return Vec::new();
    }
    data[start..end].to_vec()
}

fn parse_resources(data: &[u8], header: &KRBHeader) -> Result<Vec<ResourceRecord>> {
    let mut cursor = Cursor::new(data);
    cursor.seek(header.offsets.resource_offset as usize);

    let table_count = cursor.read_u16()?;
    if table_count != header.resource_count {
        tracing::warn!(
            header_count = header.resource_count,
            table_count,
            "resource table count disagrees with header, using header count"
        );
    }

    let mut resources = Vec::with_capacity(header.resource_count as usize);
    for _ in 0..header.resource_count {
        let kind = ResourceKind::from(cursor.read_u8()?);
        let name_string_index = cursor.read_u8()?;
        let format_tag = cursor.read_u8()?;
        let format = match format_tag {
            0 => ResourceFormat::External {
                data_string_index: cursor.read_u8()?,
            },
            1 => {
                let size = cursor.read_u16()? as usize;
                let data = cursor.read_bytes(size)?;
                ResourceFormat::Inline { data }
            }
            other => return Err(KryonError::UnknownResourceFormat(other)),
        };
        resources.push(ResourceRecord {
            kind,
            name_string_index,
            format,
        });
    }
    Ok(resources)
}
