// crates/kryon-render/src/backend.rs
//! The narrow contract a concrete backend must satisfy. Grounded on the
//! teacher's `Renderer`/`CommandRenderer` split, collapsed into a single
//! trait since the spec pins one fixed command set rather than letting
//! backends batch arbitrary `RenderCommand`s.

use crate::render_element::{RenderElement, WindowConfig};
use glam::{Vec2, Vec4};
use kryon_core::TextAlignment;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend initialization failed: {0}")]
    InitFailed(String),
    #[error("backend draw failed: {0}")]
    DrawFailed(String),
    #[error("resource load failed: {0}")]
    ResourceLoadFailed(String),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// An opaque handle a backend hands back for a loaded texture; consumers
/// never inspect its internals, only pass it back into `draw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

#[derive(Debug, Clone, Copy)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One element's fully resolved paint instruction, handed to the backend
/// for a single draw call.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Rect {
        rect: Rect,
        background: Vec4,
        border_color: Vec4,
        border_widths: [f32; 4],
    },
    Text {
        rect: Rect,
        text: String,
        color: Vec4,
        alignment: TextAlignment,
    },
    Image {
        rect: Rect,
        texture: TextureHandle,
    },
}

/// The full backend contract (spec §4.4): a concrete backend owns the
/// output surface (a window, a terminal grid) and nothing else about the
/// runtime's decode/resolve/layout pipeline.
pub trait Backend {
    fn init(&mut self, window: &WindowConfig) -> BackendResult<()>;
    fn should_close(&self) -> bool;
    fn poll_events(&mut self) -> Vec<crate::events::InputEvent>;
    fn begin_frame(&mut self, clear_color: Vec4) -> BackendResult<()>;
    fn draw(&mut self, command: &DrawCommand) -> BackendResult<()>;
    fn end_frame(&mut self) -> BackendResult<()>;
    /// Measures a single line of text; used by the resolver/runtime to
    /// size `Text` elements that have no explicit width/height (spec §1
    /// Non-goals: text shaping beyond single-line measurement).
    fn measure_text(&self, text: &str, font_size: f32) -> Vec2;
    fn load_texture(&mut self, bytes: &[u8]) -> BackendResult<TextureHandle>;
    fn cleanup(&mut self);
}

/// Convenience used by the runtime to turn a resolved element plus its
/// computed layout rect into a concrete draw command.
pub fn command_for_element(element: &RenderElement, rect: Rect) -> Option<DrawCommand> {
    if !element.visible {
        return None;
    }
    // Every color is `Some` by the time an element leaves `resolve()` (§9
    // Design Note's ancestor/window-default fallback already ran); the
    // `unwrap_or` here only guards a `RenderElement` built by hand, e.g. in
    // a test.
    let background = element.background_color.unwrap_or(Vec4::ZERO);
    let foreground = element.foreground_color.unwrap_or(Vec4::new(0.0, 0.0, 0.0, 1.0));
    let border_color = element.border_color.unwrap_or(Vec4::ZERO);

    if let Some(text) = &element.text {
        return Some(DrawCommand::Text {
            rect,
            text: text.clone(),
            color: foreground,
            alignment: element.text_alignment,
        });
    }
    if background.w > 0.0 || border_color.w > 0.0 {
        return Some(DrawCommand::Rect {
            rect,
            background,
            border_color,
            border_widths: element.border_widths,
        });
    }
    None
}
