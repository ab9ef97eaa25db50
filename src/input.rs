//! Input: key bindings and the mouse-backed pointer source.

use crate::board::Point;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// One normalized pointer reading in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub position: Point,
    pub phase: PointerPhase,
}

/// Source of at most one pointer sample per tick.
pub trait PointerSource {
    fn poll_pointer(&mut self) -> Option<PointerSample>;
}

/// Maps terminal cells to world points. World origin is the board's top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Camera {
    pub origin_x: u16,
    pub origin_y: u16,
}

impl Camera {
    /// World point at the centre of the given terminal cell.
    pub fn screen_to_world(&self, column: u16, row: u16) -> Point {
        Point::new(
            f32::from(column) - f32::from(self.origin_x) + 0.5,
            f32::from(row) - f32::from(self.origin_y) + 0.5,
        )
    }
}

/// Left-button mouse as a pointer. Queues transitions so a fast click still yields
/// Down then Up on separate ticks, and repeats Move every tick while held.
#[derive(Debug, Default)]
pub struct MousePointer {
    pending: VecDeque<PointerSample>,
    held: bool,
    last: Option<Point>,
    hover: Option<Point>,
}

impl MousePointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known pointer position, held or not. Used for hover highlight.
    pub fn hover(&self) -> Option<Point> {
        self.hover
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Drop queued samples and forget the held button (level change, screen change).
    pub fn reset(&mut self) {
        self.pending.clear();
        self.held = false;
    }

    pub fn feed(&mut self, event: MouseEvent, camera: Camera) {
        let position = camera.screen_to_world(event.column, event.row);
        self.hover = Some(position);
        let phase = match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.held = true;
                PointerPhase::Down
            }
            MouseEventKind::Drag(MouseButton::Left) if self.held => PointerPhase::Move,
            MouseEventKind::Up(MouseButton::Left) if self.held => {
                self.held = false;
                PointerPhase::Up
            }
            _ => return,
        };
        self.last = Some(position);
        // Coalesce consecutive moves; only the latest position matters.
        if phase == PointerPhase::Move {
            if let Some(back) = self.pending.back_mut() {
                if back.phase == PointerPhase::Move {
                    back.position = position;
                    return;
                }
            }
        }
        self.pending.push_back(PointerSample { position, phase });
    }
}

impl PointerSource for MousePointer {
    fn poll_pointer(&mut self) -> Option<PointerSample> {
        if let Some(sample) = self.pending.pop_front() {
            return Some(sample);
        }
        if self.held {
            return self.last.map(|position| PointerSample {
                position,
                phase: PointerPhase::Move,
            });
        }
        None
    }
}

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Confirm,
    CheckWin,
    NextLevel,
    Restart,
    Quit,
    None,
}

/// Map key event to action. Arrows and vim keys both navigate menus.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
            return Action::Quit;
        }
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Confirm,
        KeyCode::Char('c' | 'C') => Action::CheckWin,
        KeyCode::Char('n' | 'N') => Action::NextLevel,
        KeyCode::Char('r' | 'R') => Action::Restart,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    const CAMERA: Camera = Camera {
        origin_x: 10,
        origin_y: 5,
    };

    #[test]
    fn test_screen_to_world() {
        assert_eq!(CAMERA.screen_to_world(10, 5), Point::new(0.5, 0.5));
        assert_eq!(CAMERA.screen_to_world(4, 5), Point::new(-5.5, 0.5));
    }

    #[test]
    fn test_fast_click_yields_down_then_up() {
        let mut p = MousePointer::new();
        p.feed(mouse(MouseEventKind::Down(MouseButton::Left), 12, 6), CAMERA);
        p.feed(mouse(MouseEventKind::Up(MouseButton::Left), 12, 6), CAMERA);
        assert_eq!(p.poll_pointer().map(|s| s.phase), Some(PointerPhase::Down));
        assert_eq!(p.poll_pointer().map(|s| s.phase), Some(PointerPhase::Up));
        assert_eq!(p.poll_pointer(), None);
    }

    #[test]
    fn test_held_button_repeats_move() {
        let mut p = MousePointer::new();
        p.feed(mouse(MouseEventKind::Down(MouseButton::Left), 10, 5), CAMERA);
        p.feed(mouse(MouseEventKind::Drag(MouseButton::Left), 11, 5), CAMERA);
        p.feed(mouse(MouseEventKind::Drag(MouseButton::Left), 13, 6), CAMERA);
        assert_eq!(p.poll_pointer().map(|s| s.phase), Some(PointerPhase::Down));
        let moved = p.poll_pointer().unwrap();
        assert_eq!(moved.phase, PointerPhase::Move);
        assert_eq!(moved.position, Point::new(3.5, 1.5));
        // No new events, button still held.
        assert_eq!(p.poll_pointer(), Some(moved));
    }

    #[test]
    fn test_other_buttons_and_motion_only_hover() {
        let mut p = MousePointer::new();
        p.feed(mouse(MouseEventKind::Down(MouseButton::Right), 10, 5), CAMERA);
        p.feed(mouse(MouseEventKind::Moved, 12, 7), CAMERA);
        p.feed(mouse(MouseEventKind::Up(MouseButton::Left), 12, 7), CAMERA);
        assert_eq!(p.poll_pointer(), None);
        assert_eq!(p.hover(), Some(Point::new(2.5, 2.5)));
    }

    #[test]
    fn test_reset_forgets_hold() {
        let mut p = MousePointer::new();
        p.feed(mouse(MouseEventKind::Down(MouseButton::Left), 10, 5), CAMERA);
        p.reset();
        assert!(!p.is_held());
        assert_eq!(p.poll_pointer(), None);
    }

    #[test]
    fn test_key_to_action() {
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(key_to_action(key(KeyCode::Char('c'))), Action::CheckWin);
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Char('l'))), Action::Right);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::ALT)),
            Action::None
        );
    }
}
