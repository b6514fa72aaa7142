// crates/kryon-core/src/properties.rs
//! Property entries as defined on the wire (§6.1): `id, value_type, size,
//! bytes[size]`. The raw bytes are kept verbatim alongside an eagerly
//! decoded [`PropertyValue`] so that re-emission (spec §8 invariant 1) only
//! needs to walk the table back out, and so the resolver can fall back to
//! the raw bytes for a property whose size doesn't match its declared type
//! (spec §7: size mismatches are never rejected at decode time).

use glam::Vec4;

/// Well-known property ids. Anything else decodes as a raw, opaque
/// property and is preserved on the element/style but otherwise ignored by
/// the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PropertyId {
    BackgroundColor = 0x01,
    ForegroundColor = 0x02,
    BorderColor = 0x03,
    BorderWidth = 0x04,
    TextContent = 0x08,
    TextAlignment = 0x0B,
    ImageSource = 0x0D,
    Visibility = 0x10,
    WindowWidth = 0x20,
    WindowHeight = 0x21,
    WindowTitle = 0x22,
    Resizable = 0x23,
    ScaleFactor = 0x25,
    Icon = 0x26,
    /// Shorthand: one byte expands to all four edges, a 4-byte value fills
    /// per edge — same encoding as `BorderWidth` (§6.1's box-model family,
    /// ids 0x70-0x74).
    Padding = 0x70,
    PaddingTop = 0x71,
    PaddingRight = 0x72,
    PaddingBottom = 0x73,
    PaddingLeft = 0x74,
    Other(u8),
}

impl From<u8> for PropertyId {
    fn from(value: u8) -> Self {
        match value {
            0x01 => PropertyId::BackgroundColor,
            0x02 => PropertyId::ForegroundColor,
            0x03 => PropertyId::BorderColor,
            0x04 => PropertyId::BorderWidth,
            0x08 => PropertyId::TextContent,
            0x0B => PropertyId::TextAlignment,
            0x0D => PropertyId::ImageSource,
            0x10 => PropertyId::Visibility,
            0x20 => PropertyId::WindowWidth,
            0x21 => PropertyId::WindowHeight,
            0x22 => PropertyId::WindowTitle,
            0x23 => PropertyId::Resizable,
            0x25 => PropertyId::ScaleFactor,
            0x26 => PropertyId::Icon,
            0x70 => PropertyId::Padding,
            0x71 => PropertyId::PaddingTop,
            0x72 => PropertyId::PaddingRight,
            0x73 => PropertyId::PaddingBottom,
            0x74 => PropertyId::PaddingLeft,
            other => PropertyId::Other(other),
        }
    }
}

impl PropertyId {
    pub fn raw(&self) -> u8 {
        match *self {
            PropertyId::BackgroundColor => 0x01,
            PropertyId::ForegroundColor => 0x02,
            PropertyId::BorderColor => 0x03,
            PropertyId::BorderWidth => 0x04,
            PropertyId::TextContent => 0x08,
            PropertyId::TextAlignment => 0x0B,
            PropertyId::ImageSource => 0x0D,
            PropertyId::Visibility => 0x10,
            PropertyId::WindowWidth => 0x20,
            PropertyId::WindowHeight => 0x21,
            PropertyId::WindowTitle => 0x22,
            PropertyId::Resizable => 0x23,
            PropertyId::ScaleFactor => 0x25,
            PropertyId::Icon => 0x26,
            PropertyId::Padding => 0x70,
            PropertyId::PaddingTop => 0x71,
            PropertyId::PaddingRight => 0x72,
            PropertyId::PaddingBottom => 0x73,
            PropertyId::PaddingLeft => 0x74,
            PropertyId::Other(b) => b,
        }
    }
}

/// Decoded interpretation of a property's raw bytes, per §6.1's
/// "Property-value encodings" table.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Byte(u8),
    Short(u16),
    Color(Vec4),
    StringRef(u8),
    ResourceRef(u8),
    Percentage(f32),
    Rect([u16; 4]),
    EdgeInsets([u8; 4]),
    Enum(u8),
    Vector(u16, u16),
    /// Raw fallback for unrecognized ids or size-mismatched values (§7).
    Raw(Vec<u8>),
}

impl PropertyValue {
    pub fn as_color(&self) -> Option<Vec4> {
        match self {
            PropertyValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self {
            PropertyValue::Byte(b) => Some(*b),
            PropertyValue::Enum(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self {
            PropertyValue::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string_index(&self) -> Option<u8> {
        match self {
            PropertyValue::StringRef(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_resource_index(&self) -> Option<u8> {
        match self {
            PropertyValue::ResourceRef(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_edge_insets(&self) -> Option<[u8; 4]> {
        match self {
            PropertyValue::EdgeInsets(e) => Some(*e),
            PropertyValue::Byte(b) => Some([*b, *b, *b, *b]),
            _ => None,
        }
    }

    /// 8.8 fixed-point percentage, as a plain float (e.g. 1.0 == 100%).
    pub fn as_percentage(&self) -> Option<f32> {
        match self {
            PropertyValue::Percentage(p) => Some(*p),
            _ => None,
        }
    }
}

/// A single decoded property entry, keeping the raw bytes alongside the
/// typed interpretation.
#[derive(Debug, Clone)]
pub struct Property {
    pub id: PropertyId,
    pub value_type: u8,
    pub raw_bytes: Vec<u8>,
    pub value: PropertyValue,
}

/// Reads RGBA from 4 bytes, or (when `extended` is false) falls back to a
/// deterministic gray ramp over a single palette-index byte (§3 Invariants:
/// "implementations fall back to a deterministic gray ramp and log a
/// warning").
pub fn decode_color(bytes: &[u8], extended: bool) -> Vec4 {
    if extended && bytes.len() == 4 {
        Vec4::new(
            bytes[0] as f32 / 255.0,
            bytes[1] as f32 / 255.0,
            bytes[2] as f32 / 255.0,
            bytes[3] as f32 / 255.0,
        )
    } else if let Some(&index) = bytes.first() {
        let gray = index as f32 / 255.0;
        Vec4::new(gray, gray, gray, 1.0)
    } else {
        Vec4::new(0.0, 0.0, 0.0, 1.0)
    }
}

/// Decodes a property's raw bytes into a [`PropertyValue`] using `id` and
/// `size` to pick the interpretation, exactly as the decoder dispatches on
/// `(property_id, size)` rather than trusting `value_type` blindly (spec
/// §7: size mismatches are resolved, not rejected).
pub fn decode_property_value(
    id: PropertyId,
    raw: &[u8],
    extended_color: bool,
) -> PropertyValue {
    match id {
        PropertyId::BackgroundColor | PropertyId::ForegroundColor | PropertyId::BorderColor => {
            if raw.len() == 4 || raw.len() == 1 {
                PropertyValue::Color(decode_color(raw, extended_color && raw.len() == 4))
            } else {
                PropertyValue::Raw(raw.to_vec())
            }
        }
        PropertyId::BorderWidth | PropertyId::Padding => match raw.len() {
            1 => PropertyValue::Byte(raw[0]),
            4 => PropertyValue::EdgeInsets([raw[0], raw[1], raw[2], raw[3]]),
            _ => PropertyValue::Raw(raw.to_vec()),
        },
        PropertyId::PaddingTop
        | PropertyId::PaddingRight
        | PropertyId::PaddingBottom
        | PropertyId::PaddingLeft => {
            if raw.len() == 1 {
                PropertyValue::Byte(raw[0])
            } else {
                PropertyValue::Raw(raw.to_vec())
            }
        }
        PropertyId::TextContent | PropertyId::ImageSource | PropertyId::WindowTitle | PropertyId::Icon => {
            if raw.len() == 1 {
                PropertyValue::StringRef(raw[0])
            } else {
                PropertyValue::Raw(raw.to_vec())
            }
        }
        PropertyId::TextAlignment => {
            if raw.len() == 1 {
                PropertyValue::Enum(raw[0])
            } else {
                PropertyValue::Raw(raw.to_vec())
            }
        }
        PropertyId::Visibility | PropertyId::Resizable => {
            if raw.len() == 1 {
                PropertyValue::Byte(raw[0])
            } else {
                PropertyValue::Raw(raw.to_vec())
            }
        }
        PropertyId::WindowWidth | PropertyId::WindowHeight => {
            if raw.len() == 2 {
                PropertyValue::Short(u16::from_le_bytes([raw[0], raw[1]]))
            } else {
                PropertyValue::Raw(raw.to_vec())
            }
        }
        PropertyId::ScaleFactor => {
            if raw.len() == 2 {
                let fixed = u16::from_le_bytes([raw[0], raw[1]]);
                PropertyValue::Percentage(fixed as f32 / 256.0)
            } else {
                PropertyValue::Raw(raw.to_vec())
            }
        }
        PropertyId::Other(_) => PropertyValue::Raw(raw.to_vec()),
    }
}
