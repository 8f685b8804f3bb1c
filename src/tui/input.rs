use crate::domain::gesture::{Point, PointerEvent, PointerId};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use std::time::Duration;

/// Pointer units per terminal column
pub const UNITS_PER_COLUMN: f32 = 8.0;
/// Pointer units per terminal row
pub const UNITS_PER_ROW: f32 = 16.0;

/// The mouse is the only pointer a terminal has
pub const MOUSE_POINTER: PointerId = PointerId(0);

/// Represents the result of handling a key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Quit the application
    Quit,
    /// Keep the front card
    Keep,
    /// Queue the front card for deletion
    Delete,
    /// Delete everything in the queue
    Confirm,
    /// Restore the most recently queued card
    Undo,
    /// Cycle sort order
    Sort,
    /// Cycle folder
    Folder,
    /// Open the front card with the system viewer
    Open,
    /// Toggle help overlay
    Help,
    /// Answer yes to a prompt
    Accept,
    /// Answer no to a prompt
    Decline,
    /// No action
    None,
}

/// Maps keyboard events to actions
pub fn handle_key_event(key: KeyEvent) -> KeyAction {
    match (key.code, key.modifiers) {
        // Quit: q or Ctrl+C
        (KeyCode::Char('q'), KeyModifiers::NONE) => KeyAction::Quit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => KeyAction::Quit,
        (KeyCode::Esc, KeyModifiers::NONE) => KeyAction::Quit,

        // Keep: Right arrow or k
        (KeyCode::Right, KeyModifiers::NONE) => KeyAction::Keep,
        (KeyCode::Char('k'), KeyModifiers::NONE) => KeyAction::Keep,

        // Delete: Left arrow or t
        (KeyCode::Left, KeyModifiers::NONE) => KeyAction::Delete,
        (KeyCode::Char('t'), KeyModifiers::NONE) => KeyAction::Delete,

        (KeyCode::Char('c'), KeyModifiers::NONE) => KeyAction::Confirm,

        // Undo: u or Ctrl+Z
        (KeyCode::Char('u'), KeyModifiers::NONE) => KeyAction::Undo,
        (KeyCode::Char('z'), KeyModifiers::CONTROL) => KeyAction::Undo,

        (KeyCode::Char('s'), KeyModifiers::NONE) => KeyAction::Sort,
        (KeyCode::Char('f'), KeyModifiers::NONE) => KeyAction::Folder,
        (KeyCode::Char('o'), KeyModifiers::NONE) => KeyAction::Open,
        (KeyCode::Enter, KeyModifiers::NONE) => KeyAction::Open,

        // Help: ?
        (KeyCode::Char('?'), KeyModifiers::NONE) => KeyAction::Help,
        (KeyCode::Char('?'), KeyModifiers::SHIFT) => KeyAction::Help,

        _ => KeyAction::None,
    }
}

/// Maps keyboard events to prompt answers (consent dialog)
pub fn handle_confirm_input(key: KeyEvent) -> KeyAction {
    match (key.code, key.modifiers) {
        // Accept: y or Enter
        (KeyCode::Char('y'), KeyModifiers::NONE) => KeyAction::Accept,
        (KeyCode::Char('Y'), _) => KeyAction::Accept,
        (KeyCode::Enter, KeyModifiers::NONE) => KeyAction::Accept,

        // Decline: n or Esc
        (KeyCode::Char('n'), KeyModifiers::NONE) => KeyAction::Decline,
        (KeyCode::Char('N'), _) => KeyAction::Decline,
        (KeyCode::Esc, KeyModifiers::NONE) => KeyAction::Decline,

        _ => KeyAction::None,
    }
}

/// Translates a left-button mouse event into a pointer sample.
///
/// Presses only start a gesture inside `card`; moves and releases are passed
/// through wherever they happen so a drag can leave the card.
pub fn pointer_from_mouse(mouse: MouseEvent, card: Rect, now: Duration) -> Option<PointerEvent> {
    let position = Point::new(
        mouse.column as f32 * UNITS_PER_COLUMN,
        mouse.row as f32 * UNITS_PER_ROW,
    );

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let inside = mouse.column >= card.x
                && mouse.column < card.x + card.width
                && mouse.row >= card.y
                && mouse.row < card.y + card.height;
            inside.then(|| PointerEvent::down(MOUSE_POINTER, position, now))
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            Some(PointerEvent::moved(MOUSE_POINTER, position, now))
        }
        MouseEventKind::Up(MouseButton::Left) => {
            Some(PointerEvent::up(MOUSE_POINTER, position, now))
        }
        _ => None,
    }
}

/// Card width in pointer units
pub fn card_width_units(card: Rect) -> f32 {
    card.width as f32 * UNITS_PER_COLUMN
}
