// crates/kryon-core/src/resources.rs

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Image,
    Font,
    Audio,
    Video,
    Other(u8),
}

impl From<u8> for ResourceKind {
    fn from(value: u8) -> Self {
        match value {
            0x00 => ResourceKind::Image,
            0x01 => ResourceKind::Font,
            0x02 => ResourceKind::Audio,
            0x03 => ResourceKind::Video,
            other => ResourceKind::Other(other),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ResourceFormat {
    /// `data_string_index` indexes into the string table for an external
    /// path, resolved against the KRB file's directory at load time.
    External { data_string_index: u8 },
    /// Bytes captured verbatim at decode time.
    Inline { data: Vec<u8> },
}

#[derive(Debug, Clone)]
pub struct ResourceRecord {
    pub kind: ResourceKind,
    pub name_string_index: u8,
    pub format: ResourceFormat,
}
