// crates/kryon-layout/src/lib.rs

pub mod engine;
pub mod flow;

pub use engine::{EdgeWidths, FlowLayoutEngine, LayoutNode, LayoutResult, LayoutTree, NodeId, Rect};
pub use flow::{LayoutAlignment, LayoutDirection, LayoutFlags};
