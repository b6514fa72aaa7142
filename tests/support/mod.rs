// tests/support/mod.rs
//! Hand-rolled KRB byte-buffer builder shared by the end-to-end tests.
//! Mirrors the shape of `kryon_core::decoder`'s own unit-test helper
//! (`minimal_app_file`) but generalized to multiple elements, styles and
//! resources so each integration test can describe a scenario declaratively
//! instead of hand-computing offsets.

pub const HEADER_SIZE_V3: usize = 42;

#[derive(Clone)]
pub struct ElementSpec {
    pub kind: u8,
    pub id_string_index: u8,
    pub pos_x: u16,
    pub pos_y: u16,
    pub width: u16,
    pub height: u16,
    pub layout_byte: u8,
    pub style_id: u8,
    pub properties: Vec<(u8, Vec<u8>)>,
    pub children: Vec<usize>,
}

impl ElementSpec {
    pub fn new(kind: u8) -> Self {
        Self {
            kind,
            id_string_index: 0,
            pos_x: 0,
            pos_y: 0,
            width: 0,
            height: 0,
            layout_byte: 0,
            style_id: 0,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn size(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn pos(mut self, x: u16, y: u16) -> Self {
        self.pos_x = x;
        self.pos_y = y;
        self
    }

    pub fn layout(mut self, byte: u8) -> Self {
        self.layout_byte = byte;
        self
    }

    pub fn style(mut self, id: u8) -> Self {
        self.style_id = id;
        self
    }

    pub fn prop(mut self, id: u8, bytes: Vec<u8>) -> Self {
        self.properties.push((id, bytes));
        self
    }

    pub fn children(mut self, children: Vec<usize>) -> Self {
        self.children = children;
        self
    }

    fn encoded_len(&self) -> usize {
        17 + self.properties.iter().map(|(_, b)| 3 + b.len()).sum::<usize>() + self.children.len() * 2
    }
}

pub struct StyleSpec {
    pub id: u8,
    pub properties: Vec<(u8, Vec<u8>)>,
}

impl StyleSpec {
    pub fn new(id: u8) -> Self {
        Self { id, properties: Vec::new() }
    }

    pub fn prop(mut self, id: u8, bytes: Vec<u8>) -> Self {
        self.properties.push((id, bytes));
        self
    }
}

/// Builds a v0.3 (42-byte header) KRB buffer out of declared elements,
/// styles and strings. Resources are appended separately via
/// `KrbBuilder::build_with_resources` when a test needs them.
#[derive(Default)]
pub struct KrbBuilder {
    pub has_app: bool,
    pub extended_color: bool,
    pub elements: Vec<ElementSpec>,
    pub styles: Vec<StyleSpec>,
    pub strings: Vec<String>,
}

impl KrbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_app(mut self, value: bool) -> Self {
        self.has_app = value;
        self
    }

    pub fn extended_color(mut self, value: bool) -> Self {
        self.extended_color = value;
        self
    }

    pub fn element(mut self, spec: ElementSpec) -> Self {
        self.elements.push(spec);
        self
    }

    pub fn style(mut self, spec: StyleSpec) -> Self {
        self.styles.push(spec);
        self
    }

    pub fn string(mut self, s: impl Into<String>) -> Self {
        self.strings.push(s.into());
        self
    }

    fn encode_property(id: u8, bytes: &[u8], out: &mut Vec<u8>) {
        out.push(id);
        out.push(0); // value_type: unused by the decoder's dispatch
        out.push(bytes.len() as u8);
        out.extend_from_slice(bytes);
    }

    pub fn build(self) -> Vec<u8> {
        let element_offset = HEADER_SIZE_V3 as u32;

        let mut file_offsets = Vec::with_capacity(self.elements.len());
        let mut cursor = element_offset;
        for spec in &self.elements {
            file_offsets.push(cursor);
            cursor += spec.encoded_len() as u32;
        }

        let mut element_bytes = Vec::new();
        for (i, spec) in self.elements.iter().enumerate() {
            element_bytes.push(spec.kind);
            element_bytes.push(spec.id_string_index);
            element_bytes.extend_from_slice(&spec.pos_x.to_le_bytes());
            element_bytes.extend_from_slice(&spec.pos_y.to_le_bytes());
            element_bytes.extend_from_slice(&spec.width.to_le_bytes());
            element_bytes.extend_from_slice(&spec.height.to_le_bytes());
            element_bytes.push(spec.layout_byte);
            element_bytes.push(spec.style_id);
            element_bytes.push(spec.properties.len() as u8);
            element_bytes.push(spec.children.len() as u8);
            element_bytes.push(0); // event_count
            element_bytes.push(0); // animation_count
            element_bytes.push(0); // custom_prop_count
            for (id, bytes) in &spec.properties {
                Self::encode_property(*id, bytes, &mut element_bytes);
            }
            for &child in &spec.children {
                let rel = file_offsets[child] - file_offsets[i];
                element_bytes.extend_from_slice(&(rel as u16).to_le_bytes());
            }
        }

        let style_offset = element_offset + element_bytes.len() as u32;
        let mut style_bytes = Vec::new();
        for spec in &self.styles {
            style_bytes.push(spec.id);
            style_bytes.push(0); // name_string_index
            style_bytes.push(spec.properties.len() as u8);
            for (id, bytes) in &spec.properties {
                Self::encode_property(*id, bytes, &mut style_bytes);
            }
        }

        let string_offset = style_offset + style_bytes.len() as u32;
        let mut string_bytes = (self.strings.len() as u16).to_le_bytes().to_vec();
        for s in &self.strings {
            string_bytes.push(s.len() as u8);
            string_bytes.extend_from_slice(s.as_bytes());
        }

        let total_size = string_offset + string_bytes.len() as u32;

        let mut flags: u16 = 0;
        if self.has_app {
            flags |= 0x40; // HAS_APP, v0.3 bit6
        }
        if !self.styles.is_empty() {
            flags |= 0x01; // HAS_STYLES bit0
        }
        if self.extended_color {
            flags |= 0x20; // EXTENDED_COLOR, v0.3 bit5
        }

        let mut header = vec![0u8; HEADER_SIZE_V3];
        header[0..4].copy_from_slice(b"KRB1");
        header[4..6].copy_from_slice(&0x0003u16.to_le_bytes()); // major=3, minor=0
        header[6..8].copy_from_slice(&flags.to_le_bytes());
        header[8..10].copy_from_slice(&(self.elements.len() as u16).to_le_bytes());
        header[10..12].copy_from_slice(&(self.styles.len() as u16).to_le_bytes());
        header[12..14].copy_from_slice(&0u16.to_le_bytes()); // animation_count
        header[14..16].copy_from_slice(&(self.strings.len() as u16).to_le_bytes());
        header[16..18].copy_from_slice(&0u16.to_le_bytes()); // resource_count
        header[18..22].copy_from_slice(&element_offset.to_le_bytes());
        header[22..26].copy_from_slice(&style_offset.to_le_bytes());
        header[26..30].copy_from_slice(&0u32.to_le_bytes()); // animation_offset
        header[30..34].copy_from_slice(&string_offset.to_le_bytes());
        header[34..38].copy_from_slice(&0u32.to_le_bytes()); // resource_offset
        header[38..42].copy_from_slice(&total_size.to_le_bytes());

        let mut out = header;
        out.extend_from_slice(&element_bytes);
        out.extend_from_slice(&style_bytes);
        out.extend_from_slice(&string_bytes);
        out
    }
}

pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Vec<u8> {
    vec![r, g, b, a]
}
