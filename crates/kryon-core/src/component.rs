// crates/kryon-core/src/component.rs
//! Component definitions (v0.4+). A definition names a set of property
//! declarations plus an embedded element-template subtree. The compiler
//! never records the subtree's total byte length, so the decoder measures
//! it structurally (see [`crate::decoder::measure_template_subtree`]) and
//! captures the bytes verbatim here; the subtree is parsed into an element
//! forest lazily, on instantiation, per spec §4.1 item 4 and DESIGN NOTES.

#[derive(Debug, Clone)]
pub struct PropertyDefinition {
    pub name_string_index: u8,
    pub value_type_hint: u8,
    pub default_bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ComponentDefinition {
    pub name_string_index: u8,
    pub property_defs: Vec<PropertyDefinition>,
    /// The self-contained element subtree, captured verbatim, relative to
    /// its own (template-local) root offset of 0.
    pub template_bytes: Vec<u8>,
}
