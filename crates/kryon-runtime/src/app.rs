// crates/kryon-runtime/src/app.rs
//! Host API: wires decode -> resolve -> layout -> render into a single
//! app object, and runs the interaction state machine between frames.
//! Grounded on the teacher's `KryonApp` orchestration (load, update,
//! render, handle_input, find_element_at_position), generalized from its
//! single `FlexboxLayoutEngine`/`ElementRenderer` pair onto this crate's
//! `FlowLayoutEngine` and `Backend` trait.

use crate::handlers::{CustomComponentRegistry, EventHandlerFn, HandlerRegistry, LayoutAdjuster};
use crate::resource_loader::ResourceLoader;
use glam::Vec2;
use kryon_core::{decoder, Document, EventType};
use kryon_layout::{FlowLayoutEngine, LayoutNode, LayoutResult, LayoutTree};
use kryon_render::{
    command_for_element, Backend, DrawCommand, InputEvent, InteractionState, InteractionTransition,
    MouseButton, Rect, RenderIndex, ResolveError, ResolvedTree,
};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Decode(#[from] kryon_core::KryonError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("backend error: {0}")]
    Backend(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

const DEFAULT_FONT_SIZE: f32 = 14.0;

pub struct KryonApp<B: Backend> {
    document: Document,
    tree: ResolvedTree,
    backend: B,
    handlers: HandlerRegistry,
    custom_components: CustomComponentRegistry,
    resource_loader: ResourceLoader,
    layout_result: LayoutResult,
    interaction_states: HashMap<RenderIndex, InteractionState>,
    viewport_size: Vec2,
    needs_layout: bool,
    needs_render: bool,
}

impl<B: Backend> KryonApp<B> {
    pub fn new(krb_path: impl AsRef<Path>, mut backend: B) -> AppResult<Self> {
        let document = decoder::load_krb_file(krb_path.as_ref())?;
        let tree = kryon_render::resolve(&document)?;

        backend
            .init(&tree.window)
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let viewport_size = Vec2::new(tree.window.width as f32, tree.window.height as f32);
        let resource_loader = ResourceLoader::new(krb_path.as_ref());

        let mut app = Self {
            document,
            tree,
            backend,
            handlers: HandlerRegistry::new(),
            custom_components: CustomComponentRegistry::new(),
            resource_loader,
            layout_result: LayoutResult::default(),
            interaction_states: HashMap::new(),
            viewport_size,
            needs_layout: true,
            needs_render: true,
        };
        app.update_layout();
        Ok(app)
    }

    pub fn register_event_handler(&mut self, name: impl Into<String>, handler: EventHandlerFn) {
        self.handlers.register(name, handler);
    }

    pub fn register_custom_component(
        &mut self,
        name: impl Into<String>,
        adjuster: LayoutAdjuster,
    ) -> Result<(), crate::handlers::RegistryError> {
        self.custom_components.register(name, adjuster)
    }

    pub fn should_close(&self) -> bool {
        self.backend.should_close()
    }

    fn build_layout_tree(&self) -> LayoutTree {
        let scale = self.tree.window.scale_factor;
        let mut layout_tree = LayoutTree::new();
        for (index, element) in self.tree.elements.iter().enumerate() {
            // Image intrinsic sizing has no natural-size query in this
            // backend contract (`Backend::load_texture` returns only an
            // opaque handle) — Image elements are laid out at their
            // explicit size only, so scale never applies to them here.
            let intrinsic_size = if let Some(text) = &element.text {
                scale_intrinsic_size(self.backend.measure_text(text, DEFAULT_FONT_SIZE), scale)
            } else {
                Vec2::ZERO
            };
            let flags = kryon_layout::LayoutFlags::from_bits(element.layout_byte);
            layout_tree.insert(
                index as u32,
                LayoutNode {
                    flags,
                    explicit_width: element.explicit_width,
                    explicit_height: element.explicit_height,
                    intrinsic_size,
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

    pub fn update_layout(&mut self) {
        let layout_tree = self.build_layout_tree();
        let Some(&root) = self.tree.roots.first() else {
            self.layout_result = LayoutResult::default();
            return;
        };
        let scale = self.tree.window.scale_factor;
        self.layout_result = FlowLayoutEngine::new().compute(&layout_tree, root, self.viewport_size, scale);
        self.run_custom_component_adjustments();
        self.needs_layout = false;
        self.needs_render = true;
    }

    /// Spec §4.3's "only extensibility point in layout": after Pass 2, any
    /// element whose `_componentName` custom property names a registered
    /// component gets its adjuster run against the resolved tree and the
    /// layout just computed.
    fn run_custom_component_adjustments(&mut self) {
        for index in 0..self.tree.elements.len() as u32 {
            let Some(name) = self.tree.elements[index as usize].component_name(&self.document) else {
                continue;
            };
            if let Some(adjuster) = self.custom_components.get(&name) {
                adjuster(index, &mut self.tree, &mut self.layout_result);
            } else {
                tracing::warn!(component = %name, "no custom component registered for this name");
            }
        }
    }

    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        self.backend.poll_events()
    }

    pub fn handle_input(&mut self, event: InputEvent) -> AppResult<()> {
        match event {
            InputEvent::Resize { size } => {
                self.viewport_size = size;
                self.needs_layout = true;
            }
            InputEvent::MouseMove { position } => {
                self.handle_pointer(position, false);
            }
            InputEvent::MousePress { position, button } if button == MouseButton::Left => {
                self.handle_pointer(position, true);
            }
            InputEvent::MouseRelease { position, button } if button == MouseButton::Left => {
                self.handle_pointer(position, false);
            }
            _ => {}
        }
        if self.needs_layout {
            self.update_layout();
        }
        Ok(())
    }

    fn handle_pointer(&mut self, position: Vec2, button_down: bool) {
        let hovered = self.find_element_at_position(position);
        let indices: Vec<RenderIndex> = (0..self.tree.elements.len() as u32).collect();
        for index in indices {
            if !self.tree.elements[index as usize].interactive {
                continue;
            }
            let hovering = hovered == Some(index);
            let state = self.interaction_states.entry(index).or_default();
            let transition = state.advance(hovering, button_down);
            if transition == InteractionTransition::Click {
                if let Some(handler_name) = self.click_handler_name(index) {
                    self.handlers.invoke(&handler_name);
                }
                self.needs_render = true;
            }
            if transition != InteractionTransition::None {
                self.needs_render = true;
            }
        }
    }

    fn click_handler_name(&self, index: RenderIndex) -> Option<String> {
        self.tree
            .elements
            .get(index as usize)?
            .events
            .iter()
            .find(|e| e.event_type == EventType::Click)
            .map(|e| e.handler_name.clone())
    }

    /// Finds the topmost (last-drawn) element under `position`, scanning
    /// in reverse draw order so later siblings (drawn on top) win.
    fn find_element_at_position(&self, position: Vec2) -> Option<RenderIndex> {
        self.tree
            .elements
            .iter()
            .enumerate()
            .rev()
            .find(|(index, element)| {
                element.visible
                    && self
                        .layout_result
                        .rects
                        .get(&(*index as u32))
                        .map(|rect| rect_contains(*rect, position))
                        .unwrap_or(false)
            })
            .map(|(index, _)| index as u32)
    }

    pub fn render_frame(&mut self) -> AppResult<()> {
        if !self.needs_render {
            return Ok(());
        }
        self.backend
            .begin_frame(self.tree.window.clear_color)
            .map_err(|e| AppError::Backend(e.to_string()))?;

        for index in 0..self.tree.elements.len() as u32 {
            let element = &self.tree.elements[index as usize];
            let Some(&rect) = self.layout_result.rects.get(&index) else {
                continue;
            };
            let rect = Rect {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
            };
            if let Some(command) = command_for_element(element, rect) {
                self.backend
                    .draw(&command)
                    .map_err(|e| AppError::Backend(e.to_string()))?;
            }
            if let Some(image) = &element.image_source {
                if let Some(texture) =
                    self.resource_loader
                        .load(&self.document, image.resource_index, &mut self.backend)
                {
                    self.backend
                        .draw(&DrawCommand::Image { rect, texture })
                        .map_err(|e| AppError::Backend(e.to_string()))?;
                }
            }
        }

        self.backend.end_frame().map_err(|e| AppError::Backend(e.to_string()))?;
        self.needs_render = false;
        Ok(())
    }

    pub fn cleanup(&mut self) {
        self.backend.cleanup();
    }
}

/// Multiplies a measured intrinsic size by the window's scale factor,
/// pinning each axis to a 1px floor when a nonzero measured size would
/// otherwise round to zero (spec §4.3: "Minimum size: never below (1,1)
/// when a non-zero size was specified but scaling rounded to zero").
fn scale_intrinsic_size(size: Vec2, scale: f32) -> Vec2 {
    let scaled = size * scale;
    Vec2::new(
        if size.x > 0.0 && scaled.x < 1.0 { 1.0 } else { scaled.x },
        if size.y > 0.0 && scaled.y < 1.0 { 1.0 } else { scaled.y },
    )
}

fn rect_contains(rect: kryon_layout::Rect, point: Vec2) -> bool {
    point.x >= rect.x
        && point.x <= rect.x + rect.width
        && point.y >= rect.y
        && point.y <= rect.y + rect.height
}
