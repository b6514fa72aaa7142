// crates/kryon-render/src/render_element.rs
//! The resolver's output types: a flattened, index-addressed forest of
//! [`RenderElement`]s (one per decoded element, cascade already applied)
//! plus the [`WindowConfig`] pulled off the App element.

use glam::Vec4;
use kryon_core::{ElementIndex, ElementKind, EventType, PropertyValue, TextAlignment};
use std::collections::HashMap;

/// Custom-property key naming the component whose registered
/// [`crate::Backend`]-independent layout adjuster, if any, runs against this
/// element after Pass 2 (spec §4.3, "the only extensibility point in
/// layout").
pub const COMPONENT_NAME_KEY: &str = "_componentName";

pub type RenderIndex = u32;

#[derive(Debug, Clone)]
pub struct EventBinding {
    pub event_type: EventType,
    pub handler_name: String,
}

/// A single element after the three-stage cascade (defaults -> style ->
/// direct properties) has been applied, still carrying its flow-layout
/// inputs (border widths, explicit size, raw position) but none of the
/// computed placement, which [`kryon_layout::FlowLayoutEngine`] fills in
/// separately.
#[derive(Debug, Clone)]
pub struct RenderElement {
    pub source_index: ElementIndex,
    pub kind: ElementKind,
    pub id: Option<String>,
    pub parent: Option<RenderIndex>,
    pub children: Vec<RenderIndex>,

    pub layout_byte: u8,
    pub pos_x: f32,
    pub pos_y: f32,
    pub explicit_width: Option<f32>,
    pub explicit_height: Option<f32>,

    /// `None` means "unset by this element, its style, or the App
    /// defaults" — distinct from a color explicitly set to transparent
    /// (spec §9 Design Note). Resolved against the ancestor chain and
    /// finally the window default after the per-element cascade pass; see
    /// `resolve::resolve_inherited_colors`.
    pub background_color: Option<Vec4>,
    pub foreground_color: Option<Vec4>,
    pub border_color: Option<Vec4>,
    pub border_widths: [f32; 4],
    pub padding: [f32; 4],

    pub text: Option<String>,
    pub text_alignment: TextAlignment,

    pub image_source: Option<ResourceRef>,

    pub visible: bool,
    pub interactive: bool,

    pub events: Vec<EventBinding>,

    /// Custom properties carried verbatim from the decoded element record
    /// (spec §4.1's `custom_properties`), keyed by their resolved string
    /// name. Layout's only consumer is `_componentName`; anything else
    /// passes through unused but preserved for a backend/adjuster that
    /// wants it.
    pub custom_properties: Vec<(String, PropertyValue)>,
}

impl RenderElement {
    /// The `_componentName` custom property, resolved to a string if
    /// present. `StringRef`s resolve through the owning document's string
    /// table; anything else that still carries readable bytes (`Raw`)
    /// is decoded as lossy UTF-8 rather than discarded.
    pub fn component_name(&self, doc: &kryon_core::Document) -> Option<String> {
        self.custom_properties.iter().find_map(|(key, value)| {
            if key != COMPONENT_NAME_KEY {
                return None;
            }
            match value {
                PropertyValue::StringRef(idx) => Some(doc.string(*idx).to_string()),
                PropertyValue::Raw(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            }
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceRef {
    pub resource_index: u8,
}

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub width: u16,
    pub height: u16,
    pub title: String,
    pub resizable: bool,
    pub scale_factor: f32,
    pub clear_color: Vec4,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Kryon Application".to_string(),
            resizable: false,
            scale_factor: 1.0,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}

/// The resolver's complete output: every element, indexed by its position
/// in this vector (not necessarily the decoder's `ElementIndex`), plus the
/// roots (normally a single root, the App element) and the window config.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTree {
    pub elements: Vec<RenderElement>,
    pub roots: Vec<RenderIndex>,
    pub window: WindowConfig,
    /// Maps a decoded element's declared string id (if any) back to its
    /// position in `elements`, for event-handler and custom-component
    /// lookups that reference elements by name.
    pub by_id: HashMap<String, RenderIndex>,
}

impl ResolvedTree {
    pub fn get(&self, index: RenderIndex) -> Option<&RenderElement> {
        self.elements.get(index as usize)
    }
}
