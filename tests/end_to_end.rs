// tests/end_to_end.rs
//! Integration tests spanning decode -> resolve -> layout (and, for the
//! resource-loading test, the runtime's lazy loader), exercising the pinned
//! scenarios end to end rather than unit-by-unit.

mod support;

use glam::Vec2;
use kryon_core::decoder::decode;
use kryon_layout::{FlowLayoutEngine, LayoutFlags, LayoutNode, LayoutTree};
use kryon_render::{Backend, BackendResult, InputEvent, TextureHandle, WindowConfig};
use support::{rgba, ElementSpec, KrbBuilder, StyleSpec};

/// Builds a `LayoutTree` straight from a resolved tree, the same way
/// `kryon_runtime::app::KryonApp::build_layout_tree` does, but inline here
/// so these tests don't have to carry a terminal-backed runtime dependency.
fn layout_tree_from(tree: &kryon_render::ResolvedTree) -> LayoutTree {
    let mut layout_tree = LayoutTree::new();
    for (index, element) in tree.elements.iter().enumerate() {
        layout_tree.insert(
            index as u32,
            LayoutNode {
                flags: LayoutFlags::from_bits(element.layout_byte),
                explicit_width: element.explicit_width,
                explicit_height: element.explicit_height,
                intrinsic_size: Vec2::ZERO,
                border: element.border_widths,
                padding: element.padding,
                pos_x: element.pos_x,
                pos_y: element.pos_y,
                children: element.children.clone(),
            },
        );
    }
    layout_tree
}

#[test]
fn centered_button_end_to_end() {
    let bytes = KrbBuilder::new()
        .has_app(true)
        .element(
            ElementSpec::new(0x00) // App
                .size(400, 300)
                .layout(0b0000_0100) // Row, Center
                .children(vec![1]),
        )
        .element(ElementSpec::new(0x10).size(150, 50)) // Button
        .build();

    let doc = decode(&bytes).unwrap();
    let tree = kryon_render::resolve(&doc).unwrap();
    assert_eq!(tree.roots, vec![0]);

    let layout_tree = layout_tree_from(&tree);
    let result = FlowLayoutEngine::new().compute(&layout_tree, 0, Vec2::new(400.0, 300.0), 1.0);

    let button = result.rects[&1];
    assert_eq!(button.x, 125.0);
    assert_eq!(button.y, 125.0);
    assert_eq!(button.width, 150.0);
    assert_eq!(button.height, 50.0);
}

#[test]
fn row_space_between_end_to_end() {
    let bytes = KrbBuilder::new()
        .has_app(true)
        .element(
            ElementSpec::new(0x00)
                .size(280, 40)
                .layout(0b0000_1100) // Row, SpaceBetween
                .children(vec![1, 2, 3]),
        )
        .element(ElementSpec::new(0x01).size(40, 40))
        .element(ElementSpec::new(0x01).size(40, 40))
        .element(ElementSpec::new(0x01).size(40, 40))
        .build();

    let doc = decode(&bytes).unwrap();
    let tree = kryon_render::resolve(&doc).unwrap();
    let layout_tree = layout_tree_from(&tree);
    let result = FlowLayoutEngine::new().compute(&layout_tree, 0, Vec2::new(280.0, 40.0), 1.0);

    assert_eq!(result.rects[&1].x, 0.0);
    assert_eq!(result.rects[&2].x, 120.0);
    assert_eq!(result.rects[&3].x, 240.0);
}

#[test]
fn absolute_position_dual_trigger_end_to_end() {
    // Layout byte has no absolute bit set; the child is still pulled out of
    // flow purely because pos_x/pos_y are nonzero (spec's dual trigger).
    let bytes = KrbBuilder::new()
        .has_app(true)
        .element(
            ElementSpec::new(0x00)
                .size(200, 200)
                .children(vec![1]),
        )
        .element(ElementSpec::new(0x01).pos(10, 20).size(30, 30))
        .build();

    let doc = decode(&bytes).unwrap();
    let tree = kryon_render::resolve(&doc).unwrap();
    let layout_tree = layout_tree_from(&tree);
    let result = FlowLayoutEngine::new().compute(&layout_tree, 0, Vec2::new(200.0, 200.0), 1.0);

    let child = result.rects[&1];
    assert_eq!(child.x, 10.0);
    assert_eq!(child.y, 20.0);
}

#[test]
fn direct_property_overrides_style_in_cascade() {
    let bytes = KrbBuilder::new()
        .has_app(true)
        .extended_color(true)
        .style(StyleSpec::new(1).prop(0x01, rgba(0, 0, 255, 255))) // style: blue background
        .element(
            ElementSpec::new(0x00)
                .size(100, 100)
                .style(1)
                .prop(0x01, rgba(255, 0, 0, 255)), // direct: red background
        )
        .build();

    let doc = decode(&bytes).unwrap();
    let tree = kryon_render::resolve(&doc).unwrap();

    let root = &tree.elements[0];
    assert_eq!(root.background_color, Some(glam::Vec4::new(1.0, 0.0, 0.0, 1.0)));
}

#[test]
fn style_alone_applies_when_no_direct_override() {
    let bytes = KrbBuilder::new()
        .has_app(true)
        .extended_color(true)
        .style(StyleSpec::new(1).prop(0x01, rgba(0, 0, 255, 255)))
        .element(ElementSpec::new(0x00).size(100, 100).style(1))
        .build();

    let doc = decode(&bytes).unwrap();
    let tree = kryon_render::resolve(&doc).unwrap();
    let root = &tree.elements[0];
    assert_eq!(root.background_color, Some(glam::Vec4::new(0.0, 0.0, 1.0, 1.0)));
}

#[test]
fn unknown_style_id_resolve_warns_and_falls_back_to_defaults() {
    let bytes = KrbBuilder::new()
        .has_app(true)
        .element(ElementSpec::new(0x00).size(100, 100).style(9)) // no style with id 9
        .build();

    let doc = decode(&bytes).unwrap();
    let tree = kryon_render::resolve(&doc).unwrap();
    // This element is the root with no style, no direct color and no
    // ancestor to inherit from, so it falls back to the window default
    // (opaque black), not to transparent (spec §4.2/§9).
    assert_eq!(tree.elements[0].background_color, Some(glam::Vec4::new(0.0, 0.0, 0.0, 1.0)));
}

struct FakeBackend {
    next_texture_id: u64,
    fail_loads: bool,
}

impl FakeBackend {
    fn new(fail_loads: bool) -> Self {
        Self { next_texture_id: 0, fail_loads }
    }
}

impl Backend for FakeBackend {
    fn init(&mut self, _window: &WindowConfig) -> BackendResult<()> {
        Ok(())
    }

    fn should_close(&self) -> bool {
        false
    }

    fn poll_events(&mut self) -> Vec<InputEvent> {
        Vec::new()
    }

    fn begin_frame(&mut self, _clear_color: glam::Vec4) -> BackendResult<()> {
        Ok(())
    }

    fn draw(&mut self, _command: &kryon_render::DrawCommand) -> BackendResult<()> {
        Ok(())
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        Ok(())
    }

    fn measure_text(&self, _text: &str, _font_size: f32) -> Vec2 {
        Vec2::ZERO
    }

    fn load_texture(&mut self, _bytes: &[u8]) -> BackendResult<TextureHandle> {
        if self.fail_loads {
            return Err(kryon_render::BackendError::ResourceLoadFailed("fake failure".into()));
        }
        let id = self.next_texture_id;
        self.next_texture_id += 1;
        Ok(TextureHandle(id))
    }

    fn cleanup(&mut self) {}
}

#[test]
fn inline_resource_loads_through_backend() {
    // A document with one inline image resource, loaded via
    // kryon_runtime::ResourceLoader the same way KryonApp does at render time.
    use kryon_core::{Document, KRBHeader, RawFlags, ResourceFormat, ResourceKind, ResourceRecord, SectionOffsets, Version};

    let header = KRBHeader {
        version: Version { major: 3, minor: 0 },
        raw_flags: RawFlags::empty(),
        element_count: 0,
        style_count: 0,
        component_def_count: 0,
        animation_count: 0,
        string_count: 0,
        resource_count: 1,
        offsets: SectionOffsets {
            element_offset: 0,
            style_offset: 0,
            component_def_offset: 0,
            animation_offset: 0,
            string_offset: 0,
            resource_offset: 0,
        },
        total_size: 0,
        header_size: 42,
    };
    let doc = Document {
        header,
        strings: Vec::new(),
        styles: Vec::new(),
        elements: Vec::new(),
        resources: vec![ResourceRecord {
            kind: ResourceKind::Image,
            name_string_index: 0,
            format: ResourceFormat::Inline { data: vec![1, 2, 3, 4] },
        }],
        component_defs: Vec::new(),
        animation_bytes: Vec::new(),
    };

    let mut loader = kryon_runtime::ResourceLoader::new("/tmp/does-not-matter.krb");
    let mut backend = FakeBackend::new(false);
    let handle = loader.load(&doc, 0, &mut backend);
    assert_eq!(handle, Some(TextureHandle(0)));

    // Cached: a second call returns the same handle without touching the
    // backend's counter again.
    let handle_again = loader.load(&doc, 0, &mut backend);
    assert_eq!(handle_again, Some(TextureHandle(0)));
}

#[test]
fn missing_external_resource_fails_softly() {
    use kryon_core::{Document, KRBHeader, RawFlags, ResourceFormat, ResourceKind, ResourceRecord, SectionOffsets, Version};

    let header = KRBHeader {
        version: Version { major: 3, minor: 0 },
        raw_flags: RawFlags::empty(),
        element_count: 0,
        style_count: 0,
        component_def_count: 0,
        animation_count: 0,
        string_count: 1,
        resource_count: 1,
        offsets: SectionOffsets {
            element_offset: 0,
            style_offset: 0,
            component_def_offset: 0,
            animation_offset: 0,
            string_offset: 0,
            resource_offset: 0,
        },
        total_size: 0,
        header_size: 42,
    };
    let doc = Document {
        header,
        strings: vec!["does-not-exist.png".to_string()],
        styles: Vec::new(),
        elements: Vec::new(),
        resources: vec![ResourceRecord {
            kind: ResourceKind::Image,
            name_string_index: 0,
            format: ResourceFormat::External { data_string_index: 0 },
        }],
        component_defs: Vec::new(),
        animation_bytes: Vec::new(),
    };

    let mut loader = kryon_runtime::ResourceLoader::new("/tmp/project/app.krb");
    let mut backend = FakeBackend::new(false);
    assert_eq!(loader.load(&doc, 0, &mut backend), None);
    // Still non-fatal and cached on the second attempt.
    assert_eq!(loader.load(&doc, 0, &mut backend), None);
}

#[test]
fn backend_texture_load_failure_is_cached_as_a_placeholder() {
    use kryon_core::{Document, KRBHeader, RawFlags, ResourceFormat, ResourceKind, ResourceRecord, SectionOffsets, Version};

    let header = KRBHeader {
        version: Version { major: 3, minor: 0 },
        raw_flags: RawFlags::empty(),
        element_count: 0,
        style_count: 0,
        component_def_count: 0,
        animation_count: 0,
        string_count: 0,
        resource_count: 1,
        offsets: SectionOffsets {
            element_offset: 0,
            style_offset: 0,
            component_def_offset: 0,
            animation_offset: 0,
            string_offset: 0,
            resource_offset: 0,
        },
        total_size: 0,
        header_size: 42,
    };
    let doc = Document {
        header,
        strings: Vec::new(),
        styles: Vec::new(),
        elements: Vec::new(),
        resources: vec![ResourceRecord {
            kind: ResourceKind::Image,
            name_string_index: 0,
            format: ResourceFormat::Inline { data: vec![9, 9] },
        }],
        component_defs: Vec::new(),
        animation_bytes: Vec::new(),
    };

    let mut loader = kryon_runtime::ResourceLoader::new("/tmp/does-not-matter.krb");
    let mut backend = FakeBackend::new(true);
    assert_eq!(loader.load(&doc, 0, &mut backend), None);
    assert_eq!(loader.load(&doc, 0, &mut backend), None);
}

#[test]
fn out_of_range_resource_index_warns_and_returns_none() {
    // An Image element referencing resource_index=3 when the resource table
    // only has 2 entries: a resolve-warn, not a decode/panic. The element
    // itself still lays out at its declared size with no texture drawn.
    use kryon_core::{Document, KRBHeader, RawFlags, ResourceFormat, ResourceKind, ResourceRecord, SectionOffsets, Version};

    let header = KRBHeader {
        version: Version { major: 3, minor: 0 },
        raw_flags: RawFlags::empty(),
        element_count: 0,
        style_count: 0,
        component_def_count: 0,
        animation_count: 0,
        string_count: 0,
        resource_count: 2,
        offsets: SectionOffsets {
            element_offset: 0,
            style_offset: 0,
            component_def_offset: 0,
            animation_offset: 0,
            string_offset: 0,
            resource_offset: 0,
        },
        total_size: 0,
        header_size: 42,
    };
    let doc = Document {
        header,
        strings: Vec::new(),
        styles: Vec::new(),
        elements: Vec::new(),
        resources: vec![
            ResourceRecord {
                kind: ResourceKind::Image,
                name_string_index: 0,
                format: ResourceFormat::Inline { data: vec![1] },
            },
            ResourceRecord {
                kind: ResourceKind::Image,
                name_string_index: 0,
                format: ResourceFormat::Inline { data: vec![2] },
            },
        ],
        component_defs: Vec::new(),
        animation_bytes: Vec::new(),
    };

    assert!(doc.resource(3).is_none());

    let mut loader = kryon_runtime::ResourceLoader::new("/tmp/does-not-matter.krb");
    let mut backend = FakeBackend::new(false);
    assert_eq!(loader.load(&doc, 3, &mut backend), None);
}

#[test]
fn component_definition_template_measures_and_parses() {
    // Hand-built v0.4 header (48 bytes) with one component definition: one
    // property def, and a two-element template (root Container with one
    // Text child), verifying the structural measurement in
    // `measure_template_subtree` and the template parse in
    // `parse_template_elements` agree on the same bytes the main decoder
    // captured.
    use kryon_core::decoder::{decode, parse_template_elements};

    const HEADER_SIZE_V4: usize = 48;
    let element_offset = HEADER_SIZE_V4 as u32;

    // One App element with no children (component defs live in their own
    // section, independent of the main element tree).
    let app_bytes: Vec<u8> = {
        let mut e = vec![0x00, 0, 0, 0, 0, 0, 100, 0, 100, 0, 0, 0, 0, 0, 0, 0, 0];
        e.truncate(17);
        e
    };

    let component_def_offset = element_offset + app_bytes.len() as u32;

    // Template root: Container (kind 0x01) with one child at template-root-
    // relative offset 17 (immediately following).
    let template_root: Vec<u8> = {
        let mut e = Vec::new();
        e.push(0x01); // Container
        e.push(0); // id_string_index
        e.extend_from_slice(&0u16.to_le_bytes());
        e.extend_from_slice(&0u16.to_le_bytes());
        e.extend_from_slice(&0u16.to_le_bytes());
        e.extend_from_slice(&0u16.to_le_bytes());
        e.push(0); // layout
        e.push(0); // style_id
        e.push(0); // property_count
        e.push(1); // child_count
        e.push(0); // event_count
        e.push(0); // animation_count
        e.push(0); // custom_prop_count
        // Child offset, relative to the template root: 19 bytes ahead (this
        // element's own 17-byte header plus its 2-byte child-offset table).
        e.extend_from_slice(&19u16.to_le_bytes());
        e
    };
    let template_child: Vec<u8> = {
        let mut e = Vec::new();
        e.push(0x02); // Text
        e.push(0);
        e.extend_from_slice(&0u16.to_le_bytes());
        e.extend_from_slice(&0u16.to_le_bytes());
        e.extend_from_slice(&0u16.to_le_bytes());
        e.extend_from_slice(&0u16.to_le_bytes());
        e.push(0);
        e.push(0);
        e.push(0); // property_count
        e.push(0); // child_count
        e.push(0);
        e.push(0);
        e.push(0);
        e
    };

    let component_def_bytes: Vec<u8> = {
        let mut d = Vec::new();
        d.push(0); // name_string_index
        d.push(1); // prop_def_count
        d.push(0); // property def: name_string_index
        d.push(0); // value_type_hint
        d.push(0); // default_size
        d.extend_from_slice(&template_root);
        d.extend_from_slice(&template_child);
        d
    };

    let string_offset = component_def_offset + component_def_bytes.len() as u32;
    let string_bytes = 0u16.to_le_bytes().to_vec();
    let total_size = string_offset + string_bytes.len() as u32;

    let mut header = vec![0u8; HEADER_SIZE_V4];
    header[0..4].copy_from_slice(b"KRB1");
    header[4..6].copy_from_slice(&0x0403u16.to_le_bytes()); // minor=4
    header[6..8].copy_from_slice(&0x02u16.to_le_bytes()); // bit1: HAS_COMPONENT_DEFS
    header[8..10].copy_from_slice(&1u16.to_le_bytes()); // element_count
    header[10..12].copy_from_slice(&0u16.to_le_bytes()); // style_count
    header[12..14].copy_from_slice(&1u16.to_le_bytes()); // component_def_count
    header[14..16].copy_from_slice(&0u16.to_le_bytes()); // animation_count
    header[16..18].copy_from_slice(&0u16.to_le_bytes()); // string_count
    header[18..20].copy_from_slice(&0u16.to_le_bytes()); // resource_count
    header[20..24].copy_from_slice(&element_offset.to_le_bytes());
    header[24..28].copy_from_slice(&0u32.to_le_bytes()); // style_offset (unused, no styles)
    header[28..32].copy_from_slice(&component_def_offset.to_le_bytes());
    header[32..36].copy_from_slice(&0u32.to_le_bytes()); // animation_offset
    header[36..40].copy_from_slice(&string_offset.to_le_bytes());
    header[40..44].copy_from_slice(&0u32.to_le_bytes()); // resource_offset
    header[44..48].copy_from_slice(&total_size.to_le_bytes());

    let mut bytes = header;
    bytes.extend_from_slice(&app_bytes);
    bytes.extend_from_slice(&component_def_bytes);
    bytes.extend_from_slice(&string_bytes);

    let doc = decode(&bytes).unwrap();
    assert_eq!(doc.component_defs.len(), 1);
    let def = &doc.component_defs[0];
    assert_eq!(def.property_defs.len(), 1);
    assert_eq!(def.template_bytes.len(), template_root.len() + template_child.len());

    let template_elements = parse_template_elements(&def.template_bytes, false).unwrap();
    assert_eq!(template_elements.len(), 2);
    assert_eq!(template_elements[0].kind, kryon_core::ElementKind::Container);
    assert_eq!(template_elements[1].kind, kryon_core::ElementKind::Text);
}
