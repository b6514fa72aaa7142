// crates/kryon-render/src/resolve.rs
//! Tree & Style Resolver (spec §4.2): turns a decoded [`Document`] into a
//! [`ResolvedTree`] of [`RenderElement`]s plus a [`WindowConfig`], applying
//! the three-stage property cascade (App defaults -> style -> direct
//! element properties, later stages overriding earlier ones).

use crate::render_element::{EventBinding, RenderElement, ResolvedTree, ResourceRef, WindowConfig};
use glam::Vec4;
use kryon_core::{Document, ElementIndex, ElementKind, ElementRecord, PropertyId, PropertyValue, TextAlignment};
use std::collections::HashMap;

/// Window-default fallback for a foreground/border color that no element in
/// the ancestor chain ever set (spec §9 Design Note: resolve unset colors
/// "to window defaults only at draw time"). `WindowConfig` itself only
/// models a background (`clear_color`); these are the equivalent constants
/// for the other two color channels.
const DEFAULT_FOREGROUND: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);
const DEFAULT_BORDER: Vec4 = Vec4::ZERO;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("document has no elements")]
    EmptyDocument,
}

pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Mutable accumulator for the cascade; mirrors the teacher's
/// `ComputedStyle`, widened with the layout-relevant fields the cascade
/// also resolves (explicit size, text, visibility, interactivity).
#[derive(Debug, Clone)]
struct Cascade {
    /// `None` means this stage never set the color; stage 1 (App defaults),
    /// stage 2 (style) and stage 3 (direct properties) each only overwrite
    /// it when they actually carry the property, so "unset" survives the
    /// whole cascade distinguishably from "set to transparent" (spec §9
    /// Design Note).
    background_color: Option<Vec4>,
    foreground_color: Option<Vec4>,
    border_color: Option<Vec4>,
    border_widths: [f32; 4],
    padding: [f32; 4],
    text: Option<String>,
    text_alignment: TextAlignment,
    image_source: Option<ResourceRef>,
    visible: bool,
    explicit_width: Option<f32>,
    explicit_height: Option<f32>,
}

impl Default for Cascade {
    fn default() -> Self {
        Self {
            background_color: None,
            foreground_color: None,
            border_color: None,
            border_widths: [0.0; 4],
            padding: [0.0; 4],
            text: None,
            text_alignment: TextAlignment::Start,
            image_source: None,
            visible: true,
            explicit_width: None,
            explicit_height: None,
        }
    }
}

impl Cascade {
    /// Seeds stage 1 (spec §4.2: "Defaults from the enclosing App
    /// element") from the App element's own resolved colors, before style
    /// and direct properties are layered on. Non-color properties (size,
    /// text, etc.) have no App-level default and are left at `Cascade`'s
    /// own defaults.
    fn seed_from_app(app_colors: &AppColors) -> Self {
        Self {
            background_color: app_colors.background,
            foreground_color: app_colors.foreground,
            border_color: app_colors.border,
            ..Self::default()
        }
    }

    fn apply(&mut self, id: PropertyId, value: &PropertyValue, doc: &Document) {
        match id {
            PropertyId::BackgroundColor => {
                if let Some(c) = value.as_color() {
                    self.background_color = Some(c);
                }
            }
            PropertyId::ForegroundColor => {
                if let Some(c) = value.as_color() {
                    self.foreground_color = Some(c);
                }
            }
            PropertyId::BorderColor => {
                if let Some(c) = value.as_color() {
                    self.border_color = Some(c);
                }
            }
            PropertyId::BorderWidth => {
                if let Some(edges) = value.as_edge_insets() {
                    self.border_widths = [
                        edges[0] as f32,
                        edges[1] as f32,
                        edges[2] as f32,
                        edges[3] as f32,
                    ];
                }
            }
            PropertyId::Padding => {
                if let Some(edges) = value.as_edge_insets() {
                    self.padding = [
                        edges[0] as f32,
                        edges[1] as f32,
                        edges[2] as f32,
                        edges[3] as f32,
                    ];
                }
            }
            PropertyId::PaddingTop => {
                if let Some(b) = value.as_u8() {
                    self.padding[0] = b as f32;
                }
            }
            PropertyId::PaddingRight => {
                if let Some(b) = value.as_u8() {
                    self.padding[1] = b as f32;
                }
            }
            PropertyId::PaddingBottom => {
                if let Some(b) = value.as_u8() {
                    self.padding[2] = b as f32;
                }
            }
            PropertyId::PaddingLeft => {
                if let Some(b) = value.as_u8() {
                    self.padding[3] = b as f32;
                }
            }
            PropertyId::TextContent => {
                if let Some(idx) = value.as_string_index() {
                    self.text = Some(doc.string(idx).to_string());
                }
            }
            PropertyId::TextAlignment => {
                if let Some(b) = value.as_u8() {
                    self.text_alignment = TextAlignment::from(b);
                }
            }
            PropertyId::ImageSource => {
                if let Some(idx) = value.as_resource_index().or_else(|| value.as_string_index()) {
                    self.image_source = Some(ResourceRef { resource_index: idx });
                }
            }
            PropertyId::Visibility => {
                if let Some(b) = value.as_u8() {
                    self.visible = b != 0;
                }
            }
            // Window-only properties (WindowWidth/Height/Title/Resizable/
            // ScaleFactor/Icon) are consumed separately, from the App
            // element, by `resolve_window`; they never participate in the
            // per-element visual cascade.
            _ => {}
        }
    }
}

/// The App element's own resolved colors, used to seed cascade stage 1 for
/// every element in the document (spec §4.2).
#[derive(Debug, Clone, Copy, Default)]
struct AppColors {
    background: Option<Vec4>,
    foreground: Option<Vec4>,
    border: Option<Vec4>,
}

fn resolve_app_colors(doc: &Document) -> AppColors {
    let Some(app) = doc.elements.first().filter(|e| e.kind == ElementKind::App) else {
        return AppColors::default();
    };
    let mut colors = AppColors::default();
    for prop in &app.properties {
        match prop.id {
            PropertyId::BackgroundColor => colors.background = prop.value.as_color(),
            PropertyId::ForegroundColor => colors.foreground = prop.value.as_color(),
            PropertyId::BorderColor => colors.border = prop.value.as_color(),
            _ => {}
        }
    }
    colors
}

/// Resolves a decoded document into a render-ready tree. Fails only if the
/// document has no elements at all; anything else (bad style ids, missing
/// strings, out-of-range resource indices) is a resolve-warn handled
/// upstream by `Document`'s own lookups.
pub fn resolve(doc: &Document) -> ResolveResult<ResolvedTree> {
    if doc.elements.is_empty() {
        return Err(ResolveError::EmptyDocument);
    }

    let hierarchy = build_hierarchy(&doc.elements);
    let app_colors = resolve_app_colors(doc);

    let mut elements = Vec::with_capacity(doc.elements.len());
    let mut by_id = HashMap::new();

    for (index, record) in doc.elements.iter().enumerate() {
        let mut cascade = Cascade::seed_from_app(&app_colors);

        if let Some(style) = doc.style(record.style_id) {
            for prop in &style.properties {
                cascade.apply(prop.id, &prop.value, doc);
            }
        }
        for prop in &record.properties {
            cascade.apply(prop.id, &prop.value, doc);
        }

        if record.width > 0 {
            cascade.explicit_width = Some(record.width as f32);
        }
        if record.height > 0 {
            cascade.explicit_height = Some(record.height as f32);
        }

        let id = doc.string_opt(record.id_string_index).map(str::to_string);
        let events = record
            .events
            .iter()
            .map(|e| EventBinding {
                event_type: e.event_type,
                handler_name: doc.string(e.callback_string_index).to_string(),
            })
            .collect::<Vec<_>>();

        let interactive = record.kind.interactive_by_default() || !events.is_empty();

        if let Some(id) = &id {
            by_id.insert(id.clone(), index as u32);
        }

        let custom_properties = record
            .custom_properties
            .iter()
            .map(|(key_index, prop)| (doc.string(*key_index).to_string(), prop.value.clone()))
            .collect::<Vec<_>>();

        elements.push(RenderElement {
            source_index: index as ElementIndex,
            kind: record.kind,
            id,
            parent: hierarchy.parents[index].map(|p| p as u32),
            children: hierarchy.children[index].iter().map(|&c| c as u32).collect(),
            layout_byte: record.layout_byte,
            pos_x: record.pos_x as f32,
            pos_y: record.pos_y as f32,
            explicit_width: cascade.explicit_width,
            explicit_height: cascade.explicit_height,
            background_color: cascade.background_color,
            foreground_color: cascade.foreground_color,
            border_color: cascade.border_color,
            border_widths: cascade.border_widths,
            padding: cascade.padding,
            text: cascade.text,
            text_alignment: cascade.text_alignment,
            image_source: cascade.image_source,
            visible: cascade.visible,
            interactive,
            events,
            custom_properties,
        });
    }

    let roots = hierarchy
        .parents
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_none())
        .map(|(i, _)| i as u32)
        .collect();

    let window = resolve_window(doc);
    resolve_inherited_colors(&mut elements, &hierarchy, &window);

    Ok(ResolvedTree {
        elements,
        roots,
        window,
        by_id,
    })
}

/// Spec §4.2: "if unset, inherit from the nearest ancestor that set them;
/// root fallback is window default." Runs once the whole tree (and
/// `WindowConfig`) is built so each element's ancestor chain is available
/// regardless of declaration order. Each of the three color channels is
/// walked independently since one element may set, say, a border color
/// while leaving background unset.
fn resolve_inherited_colors(elements: &mut [RenderElement], hierarchy: &Hierarchy, window: &WindowConfig) {
    fn inherited(elements: &[RenderElement], hierarchy: &Hierarchy, index: usize, pick: impl Fn(&RenderElement) -> Option<Vec4>) -> Option<Vec4> {
        let mut current = index;
        loop {
            if let Some(c) = pick(&elements[current]) {
                return Some(c);
            }
            match hierarchy.parents[current] {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    for index in 0..elements.len() {
        let background = inherited(elements, hierarchy, index, |e| e.background_color)
            .unwrap_or(window.clear_color);
        let foreground = inherited(elements, hierarchy, index, |e| e.foreground_color)
            .unwrap_or(DEFAULT_FOREGROUND);
        let border = inherited(elements, hierarchy, index, |e| e.border_color)
            .unwrap_or(DEFAULT_BORDER);

        elements[index].background_color = Some(background);
        elements[index].foreground_color = Some(foreground);
        elements[index].border_color = Some(border);
    }
}

fn resolve_window(doc: &Document) -> WindowConfig {
    let mut config = WindowConfig::default();
    let Some(app) = doc.elements.first().filter(|e| e.kind == ElementKind::App) else {
        return config;
    };

    for prop in &app.properties {
        match prop.id {
            PropertyId::WindowWidth => {
                if let Some(v) = prop.value.as_u16() {
                    config.width = v;
                }
            }
            PropertyId::WindowHeight => {
                if let Some(v) = prop.value.as_u16() {
                    config.height = v;
                }
            }
            PropertyId::WindowTitle => {
                if let Some(idx) = prop.value.as_string_index() {
                    config.title = doc.string(idx).to_string();
                }
            }
            PropertyId::Resizable => {
                if let Some(b) = prop.value.as_u8() {
                    config.resizable = b != 0;
                }
            }
            PropertyId::ScaleFactor => {
                if let Some(p) = prop.value.as_percentage() {
                    config.scale_factor = p;
                }
            }
            PropertyId::BackgroundColor => {
                if let Some(c) = prop.value.as_color() {
                    config.clear_color = c;
                }
            }
            _ => {}
        }
    }
    config
}

struct Hierarchy {
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

/// Builds the element tree two ways and picks the authoritative one: first
/// by resolving each element's child offsets against an offset -> index
/// map (spec §4.2, "the only correct method"); if any child offset fails
/// to resolve anywhere in the document, that strategy is abandoned for the
/// whole tree and a linear-stack fallback (declaration order implies a
/// preorder walk, each element's own child count says how many of the
/// following records are its children) is used instead, with a warning.
fn build_hierarchy(elements: &[ElementRecord]) -> Hierarchy {
    if let Some(h) = build_hierarchy_by_offset(elements) {
        return h;
    }
    tracing::warn!("child offsets did not resolve against any element, falling back to declaration-order hierarchy");
    build_hierarchy_linear_stack(elements)
}

fn build_hierarchy_by_offset(elements: &[ElementRecord]) -> Option<Hierarchy> {
    let offset_index: HashMap<u32, usize> = elements
        .iter()
        .enumerate()
        .map(|(i, e)| (e.file_offset, i))
        .collect();

    let mut parents = vec![None; elements.len()];
    let mut children = vec![Vec::new(); elements.len()];

    for (i, element) in elements.iter().enumerate() {
        for &child_offset in &element.child_offsets {
            let absolute = element.file_offset + child_offset as u32;
            let &child_index = offset_index.get(&absolute)?;
            parents[child_index] = Some(i);
            children[i].push(child_index);
        }
    }

    Some(Hierarchy { parents, children })
}

fn build_hierarchy_linear_stack(elements: &[ElementRecord]) -> Hierarchy {
    let mut parents = vec![None; elements.len()];
    let mut children = vec![Vec::new(); elements.len()];
    // (index, remaining children expected)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for (i, element) in elements.iter().enumerate() {
        if let Some((parent_idx, remaining)) = stack.last_mut() {
            parents[i] = Some(*parent_idx);
            children[*parent_idx].push(i);
            *remaining -= 1;
            while let Some(&(_, 0)) = stack.last() {
                stack.pop();
            }
        }
        let expected_children = element.child_offsets.len();
        if expected_children > 0 {
            stack.push((i, expected_children));
        }
    }

    Hierarchy { parents, children }
}
