// crates/kryon-core/src/lib.rs
pub mod header;
pub mod properties;
pub mod elements;
pub mod style;
pub mod resources;
pub mod component;
pub mod document;
pub mod decoder;

pub use header::*;
pub use properties::*;
pub use elements::*;
pub use style::*;
pub use resources::*;
pub use component::*;
pub use document::*;
pub use decoder::*;

#[derive(Debug, thiserror::Error)]
pub enum KryonError {
    #[error("invalid KRB file: {0}")]
    InvalidKrb(String),

    #[error("unsupported version: major={0} minor={1}")]
    UnsupportedVersion(u8, u8),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing section: {0}")]
    MissingSection(String),

    #[error("truncated file: expected at least {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("section offset out of range: {section} at 0x{offset:X}")]
    OffsetOutOfRange { section: String, offset: u32 },

    #[error("unknown resource format: {0:#X}")]
    UnknownResourceFormat(u8),

    #[error("compressed KRB files are not supported")]
    CompressedUnsupported,
}

pub type Result<T> = std::result::Result<T, KryonError>;
