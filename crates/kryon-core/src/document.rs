// crates/kryon-core/src/document.rs
use crate::{ComponentDefinition, ElementIndex, ElementRecord, KRBHeader, ResourceRecord, Style};

/// The fully decoded, immutable artifact produced by the decoder (§3). Owns
/// every byte that was pulled out of the file: string bytes, property value
/// buffers, inline resource blobs and component-definition template bytes.
/// Everything else (the `Resolver`'s `RenderElement` tree) only ever borrows
/// from this or copies small scalars out of it.
#[derive(Debug)]
pub struct Document {
    pub header: KRBHeader,
    pub strings: Vec<String>,
    pub styles: Vec<Style>,
    pub elements: Vec<ElementRecord>,
    pub resources: Vec<ResourceRecord>,
    pub component_defs: Vec<ComponentDefinition>,
    /// Opaque animation bytes; parsing is explicitly deferred (spec §1
    /// Non-goals, §4.1 item 5).
    pub animation_bytes: Vec<u8>,
}

impl Document {
    /// Looks up a string by its 0-based index. Out-of-range is a
    /// resolve-warn: logs and falls back to an empty string rather than
    /// aborting (spec §3 Invariants, §7 Resolve-warn).
    pub fn string(&self, index: u8) -> &str {
        match self.strings.get(index as usize) {
            Some(s) => s.as_str(),
            None => {
                tracing::warn!(index, total = self.strings.len(), "string index out of range");
                ""
            }
        }
    }

    pub fn string_opt(&self, index: u8) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }

    /// 1-based style lookup; id 0 means "no style" and always returns
    /// `None`. An out-of-range id warns and resolves to "no style" too.
    pub fn style(&self, style_id: u8) -> Option<&Style> {
        if style_id == 0 {
            return None;
        }
        match self.styles.iter().find(|s| s.id == style_id) {
            found @ Some(_) => found,
            None => {
                tracing::warn!(style_id, "style id out of range, ignoring");
                None
            }
        }
    }

    pub fn element(&self, index: ElementIndex) -> Option<&ElementRecord> {
        self.elements.get(index as usize)
    }

    /// Element 0 is the conventional root when `HAS_APP` is set (spec §3
    /// Invariants).
    pub fn root_index(&self) -> Option<ElementIndex> {
        if self.elements.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn resource(&self, index: u8) -> Option<&ResourceRecord> {
        match self.resources.get(index as usize) {
            found @ Some(_) => found,
            None => {
                tracing::warn!(resource_index = index, "resource index out of range, ignoring");
                None
            }
        }
    }
}
