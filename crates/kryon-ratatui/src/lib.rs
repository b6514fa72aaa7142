// crates/kryon-ratatui/src/lib.rs
//! A terminal-grid [`Backend`] implementation on top of ratatui/crossterm.
//! The runtime's draw commands live in an app-defined pixel canvas (the
//! `WindowConfig` width/height); every rect gets translated into terminal
//! cell coordinates before it's drawn.

use glam::{Vec2, Vec4};
use kryon_core::TextAlignment;
use kryon_render::{
    Backend, BackendError, BackendResult, DrawCommand, InputEvent, KeyCode, KeyModifiers,
    MouseButton, Rect as KryonRect, TextureHandle, WindowConfig,
};
use ratatui::{
    backend::{Backend as RatatuiBackendTrait, CrosstermBackend},
    layout::{Alignment, Rect as RatatuiRect},
    style::{Color, Style},
    widgets::{Block, Clear, Paragraph},
    Terminal,
};
use std::io::Stdout;
use std::time::Duration;

/// Converts an app-canvas rect into terminal-cell coordinates, preserving
/// relative position/size and clamping to the terminal's bounds.
fn translate_rect(rect: KryonRect, canvas_size: Vec2, terminal_area: RatatuiRect) -> Option<RatatuiRect> {
    if canvas_size.x <= 0.0 || canvas_size.y <= 0.0 {
        return None;
    }

    let rel_x = rect.x / canvas_size.x;
    let rel_y = rect.y / canvas_size.y;
    let rel_w = rect.width / canvas_size.x;
    let rel_h = rect.height / canvas_size.y;

    let target_w = terminal_area.width as f32;
    let target_h = terminal_area.height as f32;

    let term_x = (rel_x * target_w).floor() as u16;
    let term_y = (rel_y * target_h).floor() as u16;
    let term_w = (rel_w * target_w).ceil() as u16;
    let term_h = (rel_h * target_h).ceil() as u16;

    let final_x = term_x.min(terminal_area.right());
    let final_y = term_y.min(terminal_area.bottom());
    let final_w = term_w.min(terminal_area.width.saturating_sub(final_x));
    let final_h = term_h.min(terminal_area.height.saturating_sub(final_y));

    let final_rect = RatatuiRect::new(final_x, final_y, final_w, final_h);
    if final_rect.width > 0 && final_rect.height > 0 {
        Some(final_rect)
    } else {
        None
    }
}

fn vec4_to_ratatui_color(color: Vec4) -> Color {
    if color.w < 0.1 {
        return Color::Reset;
    }
    Color::Rgb((color.x * 255.0) as u8, (color.y * 255.0) as u8, (color.z * 255.0) as u8)
}

fn ratatui_alignment(alignment: TextAlignment) -> Alignment {
    match alignment {
        TextAlignment::Start => Alignment::Left,
        TextAlignment::Center => Alignment::Center,
        TextAlignment::End => Alignment::Right,
        TextAlignment::Justify => Alignment::Left,
    }
}

/// Generic over the ratatui backend so tests can drive a [`ratatui::backend::TestBackend`]
/// instead of a real terminal; production code only ever sees the
/// [`CrosstermBackend`]-specialized constructor below.
pub struct RatatuiBackend<B: RatatuiBackendTrait = CrosstermBackend<Stdout>> {
    terminal: Terminal<B>,
    canvas_size: Vec2,
    clear_color: Vec4,
    pending: Vec<DrawCommand>,
    should_close: bool,
    next_texture_id: u64,
}

impl RatatuiBackend<CrosstermBackend<Stdout>> {
    pub fn new() -> anyhow::Result<Self> {
        let backend = CrosstermBackend::new(std::io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal,
            canvas_size: Vec2::new(800.0, 600.0),
            clear_color: Vec4::ZERO,
            pending: Vec::new(),
            should_close: false,
            next_texture_id: 0,
        })
    }
}

#[cfg(test)]
impl RatatuiBackend<ratatui::backend::TestBackend> {
    fn for_test(width: u16, height: u16) -> Self {
        let terminal = Terminal::new(ratatui::backend::TestBackend::new(width, height)).unwrap();
        Self {
            terminal,
            canvas_size: Vec2::new(800.0, 600.0),
            clear_color: Vec4::ZERO,
            pending: Vec::new(),
            should_close: false,
            next_texture_id: 0,
        }
    }
}

impl<B: RatatuiBackendTrait> RatatuiBackend<B> {
    fn translate_input_event(event: crossterm::event::Event) -> Option<InputEvent> {
        use crossterm::event::{Event, KeyCode as CKeyCode, MouseEventKind};

        match event {
            Event::Key(key) => {
                let modifiers = KeyModifiers {
                    ctrl: key.modifiers.contains(crossterm::event::KeyModifiers::CONTROL),
                    shift: key.modifiers.contains(crossterm::event::KeyModifiers::SHIFT),
                    alt: key.modifiers.contains(crossterm::event::KeyModifiers::ALT),
                    meta: key.modifiers.contains(crossterm::event::KeyModifiers::META),
                };
                let code = match key.code {
                    CKeyCode::Enter => KeyCode::Enter,
                    CKeyCode::Esc => KeyCode::Escape,
                    CKeyCode::Char(' ') => KeyCode::Space,
                    CKeyCode::Backspace => KeyCode::Backspace,
                    CKeyCode::Delete => KeyCode::Delete,
                    CKeyCode::Tab => KeyCode::Tab,
                    CKeyCode::Char(c) => KeyCode::Character(c),
                    _ => return None,
                };
                Some(InputEvent::KeyPress { key: code, modifiers })
            }
            Event::Mouse(mouse) => {
                let position = Vec2::new(mouse.column as f32, mouse.row as f32);
                match mouse.kind {
                    MouseEventKind::Down(button) => Some(InputEvent::MousePress {
                        position,
                        button: translate_mouse_button(button),
                    }),
                    MouseEventKind::Up(button) => Some(InputEvent::MouseRelease {
                        position,
                        button: translate_mouse_button(button),
                    }),
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                        Some(InputEvent::MouseMove { position })
                    }
                    MouseEventKind::ScrollDown => Some(InputEvent::Scroll {
                        delta: Vec2::new(0.0, 1.0),
                    }),
                    MouseEventKind::ScrollUp => Some(InputEvent::Scroll {
                        delta: Vec2::new(0.0, -1.0),
                    }),
                    _ => None,
                }
            }
            Event::Resize(w, h) => Some(InputEvent::Resize {
                size: Vec2::new(w as f32, h as f32),
            }),
            _ => None,
        }
    }
}

fn translate_mouse_button(button: crossterm::event::MouseButton) -> MouseButton {
    match button {
        crossterm::event::MouseButton::Left => MouseButton::Left,
        crossterm::event::MouseButton::Right => MouseButton::Right,
        crossterm::event::MouseButton::Middle => MouseButton::Middle,
    }
}

impl<B: RatatuiBackendTrait> Backend for RatatuiBackend<B> {
    fn init(&mut self, window: &WindowConfig) -> BackendResult<()> {
        crossterm::terminal::enable_raw_mode()
            .map_err(|e| BackendError::InitFailed(e.to_string()))?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::event::EnableMouseCapture
        )
        .map_err(|e| BackendError::InitFailed(e.to_string()))?;
        self.terminal
            .clear()
            .map_err(|e| BackendError::InitFailed(e.to_string()))?;
        self.canvas_size = Vec2::new(window.width as f32, window.height as f32);
        Ok(())
    }

    fn should_close(&self) -> bool {
        self.should_close
    }

    fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        while crossterm::event::poll(Duration::from_millis(0)).unwrap_or(false) {
            match crossterm::event::read() {
                Ok(event) => {
                    if let crossterm::event::Event::Key(key) = &event {
                        if key.code == crossterm::event::KeyCode::Esc {
                            self.should_close = true;
                        }
                    }
                    if let Some(translated) = Self::translate_input_event(event) {
                        events.push(translated);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed reading terminal event");
                    break;
                }
            }
        }
        events
    }

    fn begin_frame(&mut self, clear_color: Vec4) -> BackendResult<()> {
        self.clear_color = clear_color;
        self.pending.clear();
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand) -> BackendResult<()> {
        self.pending.push(command.clone());
        Ok(())
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        let canvas_size = self.canvas_size;
        let pending = std::mem::take(&mut self.pending);
        self.terminal
            .draw(|frame| {
                let terminal_area = frame.size();
                for command in &pending {
                    match command {
                        DrawCommand::Rect {
                            rect, background, ..
                        } => {
                            if let Some(area) = translate_rect(*rect, canvas_size, terminal_area) {
                                let block = Block::default().style(Style::default().bg(vec4_to_ratatui_color(*background)));
                                frame.render_widget(Clear, area);
                                frame.render_widget(block, area);
                            }
                        }
                        DrawCommand::Text {
                            rect,
                            text,
                            color,
                            alignment,
                        } => {
                            if let Some(area) = translate_rect(*rect, canvas_size, terminal_area) {
                                let paragraph = Paragraph::new(text.as_str())
                                    .style(Style::default().fg(vec4_to_ratatui_color(*color)))
                                    .alignment(ratatui_alignment(*alignment));
                                frame.render_widget(paragraph, area);
                            }
                        }
                        DrawCommand::Image { rect, .. } => {
                            // No image rendering in a terminal grid; draw a
                            // placeholder block so layout is still visible.
                            if let Some(area) = translate_rect(*rect, canvas_size, terminal_area) {
                                let block = Block::default().style(Style::default().bg(Color::DarkGray));
                                frame.render_widget(block, area);
                            }
                        }
                    }
                }
            })
            .map_err(|e| BackendError::DrawFailed(e.to_string()))?;
        Ok(())
    }

    fn measure_text(&self, text: &str, font_size: f32) -> Vec2 {
        // Rough monospace estimate in app-canvas pixel units; the terminal
        // itself only ever needs the cell-grid translation in `end_frame`.
        Vec2::new(text.chars().count() as f32 * font_size * 0.6, font_size)
    }

    fn load_texture(&mut self, _bytes: &[u8]) -> BackendResult<TextureHandle> {
        tracing::warn!("terminal backend cannot display images, returning a placeholder handle");
        let id = self.next_texture_id;
        self.next_texture_id += 1;
        Ok(TextureHandle(id))
    }

    fn cleanup(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::DisableMouseCapture,
            crossterm::terminal::LeaveAlternateScreen
        );
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kryon_render::Rect as KryonRect;
    use ratatui::layout::Rect as RRect;

    /// Same scenario as the teacher's `scaled_rendering_works` test (a right-half
    /// blue rect over an 800x600 canvas on an 80x24 terminal) but asserted by
    /// inspecting the rendered cells directly rather than via an insta snapshot,
    /// since no accepted baseline can be recorded without running `cargo insta
    /// review`.
    #[test]
    fn scaled_rect_fills_expected_terminal_cells() {
        let mut backend = RatatuiBackend::for_test(80, 24);
        backend.canvas_size = Vec2::new(800.0, 600.0);

        backend.begin_frame(Vec4::ZERO).unwrap();
        backend
            .draw(&DrawCommand::Rect {
                rect: KryonRect {
                    x: 400.0,
                    y: 0.0,
                    width: 400.0,
                    height: 600.0,
                },
                background: Vec4::new(0.0, 0.0, 1.0, 1.0),
                border_color: Vec4::ZERO,
                border_widths: [0.0; 4],
            })
            .unwrap();
        backend.end_frame().unwrap();

        let buffer = backend.terminal.backend().buffer();
        let blue = Color::Rgb(0, 0, 255);
        assert_eq!(buffer.get(40, 0).bg, blue);
        assert_eq!(buffer.get(79, 23).bg, blue);
        assert_eq!(buffer.get(0, 0).bg, Color::Reset);
        assert_eq!(buffer.get(39, 12).bg, Color::Reset);
    }

    #[test]
    fn translate_rect_scales_into_terminal_grid() {
        let canvas = Vec2::new(800.0, 600.0);
        let terminal_area = RRect::new(0, 0, 80, 24);
        let rect = KryonRect {
            x: 400.0,
            y: 0.0,
            width: 400.0,
            height: 600.0,
        };
        let area = translate_rect(rect, canvas, terminal_area).unwrap();
        assert_eq!(area.x, 40);
        assert_eq!(area.width, 40);
        assert_eq!(area.height, 24);
    }

    #[test]
    fn translate_rect_rejects_degenerate_canvas() {
        let terminal_area = RRect::new(0, 0, 80, 24);
        let rect = KryonRect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        assert!(translate_rect(rect, Vec2::ZERO, terminal_area).is_none());
    }
}
