// crates/kryon-render/src/lib.rs

pub mod backend;
pub mod events;
pub mod render_element;
pub mod resolve;

pub use backend::{command_for_element, Backend, BackendError, BackendResult, DrawCommand, Rect, TextureHandle};
pub use events::{InputEvent, InteractionState, InteractionTransition, KeyCode, KeyModifiers, MouseButton};
pub use render_element::{EventBinding, RenderElement, RenderIndex, ResolvedTree, ResourceRef, WindowConfig};
pub use resolve::{resolve, ResolveError, ResolveResult};
