// Layout and text helpers for the card views

use super::input::UNITS_PER_COLUMN;
use crate::domain::gesture::Vector;
use crate::domain::{format_duration, format_size_short, MediaItem};
use ratatui::layout::Rect;

/// Fraction of the session's items already decided, for the header gauge
pub fn calculate_progress(decided: usize, remaining: usize) -> f64 {
    let total = decided + remaining;
    if total == 0 {
        0.0
    } else {
        decided as f64 / total as f64
    }
}

/// Horizontal shift in whole columns for a card offset
pub fn offset_columns(offset: Vector) -> i32 {
    (offset.x / UNITS_PER_COLUMN).round() as i32
}

/// `card` moved `dx` columns and clipped to `bounds`; `None` once it is
/// entirely off-screen
pub fn shifted_rect(card: Rect, bounds: Rect, dx: i32) -> Option<Rect> {
    let left = card.x as i32 + dx;
    let right = left + card.width as i32;
    let clip_left = left.max(bounds.x as i32);
    let clip_right = right.min((bounds.x + bounds.width) as i32);
    if clip_right <= clip_left {
        return None;
    }
    Some(Rect {
        x: clip_left as u16,
        y: card.y,
        width: (clip_right - clip_left) as u16,
        height: card.height,
    })
}

/// Metadata line drawn at the bottom of a card: date, size and, for
/// videos, duration
pub fn card_caption(item: &MediaItem) -> String {
    let mut caption = format!(
        "{} • {}",
        item.added_at.format("%b %-d, %Y"),
        format_size_short(item.size_bytes)
    );
    if item.is_video {
        caption.push_str(" • ");
        caption.push_str(&format_duration(item.duration_ms));
    }
    caption
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::item;

    #[test]
    fn test_calculate_progress() {
        assert_eq!(calculate_progress(0, 0), 0.0);
        assert_eq!(calculate_progress(1, 3), 0.25);
        assert_eq!(calculate_progress(4, 0), 1.0);
    }

    #[test]
    fn test_offset_columns() {
        assert_eq!(offset_columns(Vector::new(16.0, 40.0)), 2);
        assert_eq!(offset_columns(Vector::new(-20.0, 0.0)), -3);
        assert_eq!(offset_columns(Vector::ZERO), 0);
    }

    #[test]
    fn test_shifted_rect_clips_to_bounds() {
        let bounds = Rect::new(0, 0, 80, 20);
        let card = Rect::new(20, 2, 40, 10);

        assert_eq!(shifted_rect(card, bounds, 0), Some(card));
        assert_eq!(shifted_rect(card, bounds, 30), Some(Rect::new(50, 2, 30, 10)));
        assert_eq!(shifted_rect(card, bounds, -30), Some(Rect::new(0, 2, 30, 10)));
        assert_eq!(shifted_rect(card, bounds, -60), None);
    }

    #[test]
    fn test_card_caption() {
        let mut photo = item(1, 2_516_582);
        assert!(card_caption(&photo).ends_with("2.4 MB"));

        photo.is_video = true;
        photo.duration_ms = 83_000;
        assert!(card_caption(&photo).ends_with("2.4 MB • 1:23"));
    }
}
