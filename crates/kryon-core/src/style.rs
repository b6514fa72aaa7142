// crates/kryon-core/src/style.rs
use crate::Property;

/// A named bundle of properties, referenced by 1-based id from element
/// headers. Id `0` means "no style" and is never stored here.
#[derive(Debug, Clone)]
pub struct Style {
    pub id: u8,
    pub name_string_index: u8,
    pub properties: Vec<Property>,
}
