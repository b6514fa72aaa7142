// crates/kryon-core/src/elements.rs
use crate::Property;

pub type ElementIndex = u32;

/// The closed set of element types, modeled as tagged variants per spec
/// DESIGN NOTES ("Polymorphism over element types"). `Custom` carries the
/// raw type tag for component-instance dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    App,
    Container,
    Text,
    Image,
    Button,
    Input,
    List,
    Grid,
    Scrollable,
    Video,
    Custom(u8),
}

impl From<u8> for ElementKind {
    fn from(value: u8) -> Self {
        match value {
            0x00 => ElementKind::App,
            0x01 => ElementKind::Container,
            0x02 => ElementKind::Text,
            0x03 => ElementKind::Image,
            0x10 => ElementKind::Button,
            0x11 => ElementKind::Input,
            0x20 => ElementKind::List,
            0x21 => ElementKind::Grid,
            0x22 => ElementKind::Scrollable,
            0x30 => ElementKind::Video,
            other => ElementKind::Custom(other),
        }
    }
}

impl ElementKind {
    /// Whether this type is interactive by default (spec §4.2: "true for
    /// Button and Input types or whenever events are attached").
    pub fn interactive_by_default(&self) -> bool {
        matches!(self, ElementKind::Button | ElementKind::Input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Click,
    Hover,
    Focus,
    Blur,
    Change,
    Submit,
    Other(u8),
}

impl From<u8> for EventType {
    fn from(value: u8) -> Self {
        match value {
            0x00 => EventType::Click,
            0x01 => EventType::Hover,
            0x02 => EventType::Focus,
            0x03 => EventType::Blur,
            0x04 => EventType::Change,
            0x05 => EventType::Submit,
            other => EventType::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlignment {
    Start,
    Center,
    End,
    Justify,
}

impl From<u8> for TextAlignment {
    fn from(value: u8) -> Self {
        match value {
            0 => TextAlignment::Start,
            1 => TextAlignment::Center,
            2 => TextAlignment::End,
            3 => TextAlignment::Justify,
            // "treated as Start if unimplemented" (spec §4.2)
            _ => TextAlignment::Start,
        }
    }
}

/// Raw, undecoded event entry: `(type, callback_string_index)`.
#[derive(Debug, Clone, Copy)]
pub struct RawEvent {
    pub event_type: EventType,
    pub callback_string_index: u8,
}

/// Raw animation reference entry: `(anim_index, trigger)`. Parsed but
/// never interpreted (animation playback is a Non-goal, spec §1).
#[derive(Debug, Clone, Copy)]
pub struct AnimationRef {
    pub anim_index: u8,
    pub trigger: u8,
}

/// A single element record as decoded from the file, indexed by its
/// position in decode order (`ElementIndex`). Children are stored both as
/// raw file-relative offsets (for the authoritative tree-construction
/// strategy, spec §4.2) and, once resolved, as indices into the document's
/// element table.
#[derive(Debug, Clone)]
pub struct ElementRecord {
    /// Absolute byte offset of this element's header in the file (or,
    /// within a component template, relative to the template root).
    pub file_offset: u32,
    pub kind: ElementKind,
    pub id_string_index: u8,
    pub pos_x: u16,
    pub pos_y: u16,
    pub width: u16,
    pub height: u16,
    pub layout_byte: u8,
    pub style_id: u8,
    pub properties: Vec<Property>,
    pub custom_properties: Vec<(u8, Property)>,
    pub events: Vec<RawEvent>,
    pub animation_refs: Vec<AnimationRef>,
    /// Raw child offsets, relative to `file_offset`, in declaration order.
    pub child_offsets: Vec<u16>,
    /// Resolved during tree construction: indices of this element's
    /// children in the document's element table, in draw/layout order.
    pub children: Vec<ElementIndex>,
    pub parent: Option<ElementIndex>,
}

impl ElementRecord {
    pub fn is_absolute_by_layout_bit(&self) -> bool {
        self.layout_byte & 0b0100_0000 != 0
    }

    pub fn has_nonzero_position(&self) -> bool {
        self.pos_x != 0 || self.pos_y != 0
    }
}
