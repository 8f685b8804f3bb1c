// Color palette shared by every view
use ratatui::style::Color;

/// Delete side
pub const ACCENT_PRIMARY: Color = Color::Rgb(235, 87, 87);
/// Keep side
pub const ACCENT_SECONDARY: Color = Color::Rgb(111, 207, 151);
pub const ACCENT_HIGHLIGHT: Color = Color::Rgb(242, 201, 76);

pub const TEXT_PRIMARY: Color = Color::Rgb(230, 230, 230);
pub const TEXT_SECONDARY: Color = Color::Rgb(140, 140, 150);

pub const BG_DARK: Color = Color::Rgb(24, 24, 32);
pub const BORDER_COLOR: Color = Color::Rgb(80, 80, 100);
/// Card peeking out from under the front card
pub const STACK_BORDER: Color = Color::Rgb(55, 55, 70);
