// crates/kryon-runtime/src/resource_loader.rs
//! Lazy resource loading (spec §4.3, §5): a resource is only handed to the
//! backend the first time something actually references it. External
//! resources resolve their string-table path against the `.krb` file's own
//! directory; inline resources are passed through verbatim. A failed load
//! never aborts the frame: it logs and caches a placeholder so repeated
//! references don't retry the failing load every frame.

use kryon_core::{Document, ResourceFormat};
use kryon_render::{Backend, TextureHandle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
enum CachedTexture {
    Loaded(TextureHandle),
    Failed,
}

pub struct ResourceLoader {
    base_dir: PathBuf,
    cache: HashMap<u8, CachedTexture>,
}

impl ResourceLoader {
    /// `krb_path` is the file that was decoded; external resource paths
    /// resolve relative to its parent directory.
    pub fn new(krb_path: impl AsRef<Path>) -> Self {
        let base_dir = krb_path
            .as_ref()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            base_dir,
            cache: HashMap::new(),
        }
    }

    /// Returns a texture handle for `resource_index`, loading it through
    /// `backend` on first use. Returns `None` only when the index itself
    /// is out of range (already warned by `Document::resource`); a load
    /// failure still returns a cached placeholder handle so callers don't
    /// need to special-case it.
    pub fn load(
        &mut self,
        doc: &Document,
        resource_index: u8,
        backend: &mut dyn Backend,
    ) -> Option<TextureHandle> {
        if let Some(cached) = self.cache.get(&resource_index) {
            return match cached {
                CachedTexture::Loaded(handle) => Some(*handle),
                CachedTexture::Failed => None,
            };
        }

        let record = doc.resource(resource_index)?;
        let bytes = match &record.format {
            ResourceFormat::Inline { data } => Some(data.clone()),
            ResourceFormat::External { data_string_index } => {
                let relative = doc.string(*data_string_index);
                let path = self.base_dir.join(relative);
                match std::fs::read(&path) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "failed to load external resource");
                        None
                    }
                }
            }
        };

        let Some(bytes) = bytes else {
            self.cache.insert(resource_index, CachedTexture::Failed);
            return None;
        };

        match backend.load_texture(&bytes) {
            Ok(handle) => {
                self.cache.insert(resource_index, CachedTexture::Loaded(handle));
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(resource_index, error = %e, "backend failed to load texture");
                self.cache.insert(resource_index, CachedTexture::Failed);
                None
            }
        }
    }
}
