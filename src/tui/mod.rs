// TUI module for rendering the terminal interface
pub mod colors;
pub mod helpers;
pub mod input;

// Re-exports
pub use colors::*;
pub use helpers::{calculate_progress, card_caption, offset_columns, shifted_rect};
pub use input::{
    card_width_units, handle_confirm_input, handle_key_event, pointer_from_mouse, KeyAction,
};

use crate::app::CardView;
use crate::domain::swipe::Direction as SwipeDirection;
use crate::domain::triage::{ConfirmPhase, TriageSnapshot, TriageStatistics};
use crate::domain::{format_duration, format_megabytes, format_size_short, MediaItem};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

/// UI view state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// Main card view
    Browsing,
    /// Help overlay visible
    Help,
    /// Welcome screen shown on first launch
    Welcome,
}

/// Everything the main view draws from
#[derive(Debug, Clone)]
pub struct Screen<'a> {
    pub snapshot: &'a TriageSnapshot,
    pub card: CardView,
    pub statistics: TriageStatistics,
    /// Label of the selected folder
    pub folder_label: &'a str,
    pub dry_run: bool,
}

/// Splits the terminal into header, content and footer
pub fn main_layout(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header with progress
            Constraint::Min(0),    // Cards
            Constraint::Length(3), // Footer
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Resting position of the front card inside the content area
pub fn card_area(content: Rect) -> Rect {
    let width = (content.width * 3 / 5).max(20).min(content.width);
    let height = content.height.saturating_sub(2).max(1);
    Rect {
        x: content.x + (content.width - width) / 2,
        y: content.y,
        width,
        height,
    }
}

/// Renders the header, card stack and footer
pub fn render(frame: &mut Frame, screen: &Screen) {
    let [header, content, footer] = main_layout(frame.area());

    render_header(frame, header, screen);
    render_cards(frame, content, screen);
    render_footer(frame, footer);
}

fn render_header(frame: &mut Frame, area: Rect, screen: &Screen) {
    let snapshot = screen.snapshot;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(2)])
        .split(area);

    let mut title = vec![
        Span::styled(
            format!(" {} ", screen.folder_label),
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("• {} ", snapshot.sort_key.label()),
            Style::default().fg(TEXT_SECONDARY),
        ),
    ];
    if screen.dry_run {
        title.push(Span::styled(
            "[DRY RUN] ",
            Style::default().fg(ACCENT_HIGHLIGHT),
        ));
    }

    let mut info = vec![
        Span::styled(
            format!(" {} left", snapshot.active_len),
            Style::default().fg(TEXT_PRIMARY),
        ),
        Span::raw("  "),
        Span::styled(
            format!(
                "{} queued ({})",
                snapshot.pending_len,
                format_megabytes(snapshot.pending_bytes)
            ),
            Style::default().fg(if snapshot.pending_len > 0 {
                ACCENT_PRIMARY
            } else {
                TEXT_SECONDARY
            }),
        ),
    ];
    if snapshot.phase == ConfirmPhase::Confirming {
        info.push(Span::styled(
            "  Deleting…",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::ITALIC),
        ));
    }

    let header = Paragraph::new(vec![Line::from(title), Line::from(info)])
        .block(
            Block::default()
                .borders(Borders::TOP | Borders::LEFT | Borders::RIGHT)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .alignment(Alignment::Left);
    frame.render_widget(header, chunks[0]);

    let decided = screen.statistics.kept + snapshot.pending_len + screen.statistics.deleted;
    let progress = calculate_progress(decided, snapshot.active_len);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::BOTTOM | Borders::LEFT | Borders::RIGHT)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .gauge_style(Style::default().fg(ACCENT_SECONDARY).bg(BG_DARK))
        .ratio(progress)
        .label(format!(
            "{}% ({}/{})",
            (progress * 100.0) as u16,
            decided,
            decided + snapshot.active_len
        ));
    frame.render_widget(gauge, chunks[1]);
}

fn render_cards(frame: &mut Frame, area: Rect, screen: &Screen) {
    let snapshot = screen.snapshot;
    let Some(front) = snapshot.front.as_ref() else {
        frame.render_widget(render_empty_state_widget(snapshot), area);
        return;
    };

    let card = card_area(area);

    // Stack preview peeks out below the front card
    if let Some(next) = snapshot.next.as_ref() {
        let under = Rect {
            x: card.x + 2,
            y: card.y + 2,
            width: card.width.saturating_sub(4),
            height: card.height,
        }
        .intersection(area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(STACK_BORDER))
            .title_bottom(Span::styled(
                format!(" {} ", next.display_name),
                Style::default().fg(TEXT_SECONDARY),
            ));
        frame.render_widget(block, under);
    }

    let dx = offset_columns(screen.card.offset);
    if let Some(shifted) = shifted_rect(card, area, dx) {
        frame.render_widget(Clear, shifted);
        frame.render_widget(card_widget(front, &screen.card), shifted);
    }
}

fn card_widget<'a>(item: &'a MediaItem, view: &CardView) -> Paragraph<'a> {
    let (stamp, stamp_color) = match view.leaning {
        Some(SwipeDirection::Left) => ("DELETE", ACCENT_PRIMARY),
        Some(SwipeDirection::Right) => ("KEEP", ACCENT_SECONDARY),
        None => ("", TEXT_SECONDARY),
    };
    let stamp_style = if view.progress >= 1.0 {
        Style::default()
            .fg(stamp_color)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        Style::default().fg(stamp_color)
    };
    let border_color = if view.progress >= 1.0 {
        stamp_color
    } else {
        BORDER_COLOR
    };

    let kind = if item.is_video { "▶ VIDEO" } else { "◼ PHOTO" };
    let lines = vec![
        Line::from(Span::styled(stamp, stamp_style)),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            kind,
            Style::default()
                .fg(TEXT_SECONDARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            item.display_name.as_str(),
            Style::default()
                .fg(TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            card_caption(item),
            Style::default().fg(TEXT_SECONDARY),
        )),
    ];

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border_color))
                .style(Style::default().bg(BG_DARK)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}

/// Shown once the active list is empty
fn render_empty_state_widget(snapshot: &TriageSnapshot) -> Paragraph<'static> {
    let hint = if snapshot.pending_len > 0 {
        format!(
            "Press c to delete {} queued item(s), or u to bring the last one back.",
            snapshot.pending_len
        )
    } else {
        "Nothing left to review in this folder. Press f for another.".to_string()
    };

    let lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "All Caught Up",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(hint, Style::default().fg(TEXT_SECONDARY))),
    ];

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let separator = || Span::raw("  │  ");
    let controls = Line::from(vec![
        Span::styled(
            " ← ",
            Style::default()
                .fg(ACCENT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("Delete", Style::default().fg(TEXT_SECONDARY)),
        separator(),
        Span::styled(
            "→ ",
            Style::default()
                .fg(ACCENT_SECONDARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("Keep", Style::default().fg(TEXT_SECONDARY)),
        separator(),
        Span::styled("u ", Style::default().fg(ACCENT_HIGHLIGHT)),
        Span::styled("Undo", Style::default().fg(TEXT_SECONDARY)),
        separator(),
        Span::styled("c ", Style::default().fg(ACCENT_PRIMARY)),
        Span::styled("Confirm", Style::default().fg(TEXT_SECONDARY)),
        separator(),
        Span::styled("? ", Style::default().fg(TEXT_SECONDARY)),
        Span::styled("Help", Style::default().fg(TEXT_SECONDARY)),
        separator(),
        Span::styled("q ", Style::default().fg(TEXT_SECONDARY)),
        Span::styled("Quit", Style::default().fg(TEXT_SECONDARY)),
    ]);

    let footer = Paragraph::new(controls)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(footer, area);
}

fn overlay_block(title: &str, color: ratatui::style::Color) -> Block<'_> {
    Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .style(Style::default().bg(BG_DARK))
}

fn render_overlay(
    frame: &mut Frame,
    area: Rect,
    block: Block,
    lines: Vec<Line>,
    alignment: Alignment,
) {
    frame.render_widget(Clear, area);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let paragraph = Paragraph::new(lines)
        .alignment(alignment)
        .style(Style::default().fg(TEXT_PRIMARY))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
}

/// Asks whether the queued items may be deleted
pub fn render_consent_overlay(frame: &mut Frame, count: usize, bytes: u64) {
    let area = centered_rect(50, 50, frame.area());
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Allow deleting {} item(s)?", count),
            Style::default()
                .fg(TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{} will be moved to the trash.", format_megabytes(bytes)),
            Style::default().fg(TEXT_SECONDARY),
        )),
        Line::from(Span::styled(
            "Some of these files need your permission.",
            Style::default().fg(TEXT_SECONDARY),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[Y]", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("es  "),
            Span::styled("[Enter]", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("     "),
            Span::styled("[N]", Style::default().fg(ACCENT_PRIMARY)),
            Span::raw("o  "),
            Span::styled("[Esc]", Style::default().fg(ACCENT_PRIMARY)),
        ]),
    ];
    render_overlay(
        frame,
        area,
        overlay_block(" ⚠ Confirm Deletion ", ACCENT_PRIMARY),
        lines,
        Alignment::Center,
    );
}

/// Freed-space summary after a completed deletion
pub fn render_summary_overlay(frame: &mut Frame, summary: &str, stats: &TriageStatistics) {
    let area = centered_rect(50, 45, frame.area());
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            summary.to_string(),
            Style::default()
                .fg(ACCENT_SECONDARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("✓ ", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw(format!("Kept this session: {}", stats.kept)),
        ]),
        Line::from(vec![
            Span::styled("✗ ", Style::default().fg(ACCENT_PRIMARY)),
            Span::raw(format!(
                "Deleted this session: {} ({})",
                stats.deleted,
                format_megabytes(stats.bytes_freed)
            )),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to continue",
            Style::default().fg(TEXT_SECONDARY),
        )),
    ];
    render_overlay(
        frame,
        area,
        overlay_block(" Done ", ACCENT_SECONDARY),
        lines,
        Alignment::Center,
    );
}

/// Deletion failed; the queue is still there for a retry
pub fn render_failure_overlay(frame: &mut Frame, message: &str) {
    let area = centered_rect(60, 40, frame.area());
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default()
                .fg(ACCENT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Your queue is unchanged. Press c to try again.",
            Style::default().fg(TEXT_SECONDARY),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to continue",
            Style::default().fg(TEXT_SECONDARY),
        )),
    ];
    render_overlay(
        frame,
        area,
        overlay_block(" [!] Deletion Failed ", ACCENT_PRIMARY),
        lines,
        Alignment::Center,
    );
}

/// Video details shown while a long press is held
pub fn render_details_overlay(frame: &mut Frame, item: &MediaItem) {
    let area = centered_rect(60, 40, frame.area());
    let label = |text: &'static str| Span::styled(text, Style::default().fg(TEXT_SECONDARY));
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            label("  Name:     "),
            Span::raw(item.display_name.clone()),
        ]),
        Line::from(vec![
            label("  Added:    "),
            Span::raw(item.added_at.format("%Y-%m-%d %H:%M").to_string()),
        ]),
        Line::from(vec![
            label("  Size:     "),
            Span::raw(format_size_short(item.size_bytes)),
        ]),
        Line::from(vec![
            label("  Duration: "),
            Span::raw(format_duration(item.duration_ms)),
        ]),
        Line::from(vec![
            label("  Path:     "),
            Span::raw(item.locator.to_string()),
        ]),
    ];
    render_overlay(
        frame,
        area,
        overlay_block(" ▶ Video ", ACCENT_HIGHLIGHT),
        lines,
        Alignment::Left,
    );
}

/// Renders the help overlay
pub fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(50, 80, frame.area());
    let key = |text: &'static str, color| Span::styled(text, Style::default().fg(color));
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Keyboard",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            key("  ← / t   ", ACCENT_PRIMARY),
            Span::raw("Queue for deletion"),
        ]),
        Line::from(vec![key("  → / k   ", ACCENT_SECONDARY), Span::raw("Keep")]),
        Line::from(vec![
            key("  u       ", ACCENT_HIGHLIGHT),
            Span::raw("Undo last deletion swipe"),
        ]),
        Line::from(vec![
            key("  c       ", ACCENT_PRIMARY),
            Span::raw("Delete queued items"),
        ]),
        Line::from(vec![key("  s       ", TEXT_SECONDARY), Span::raw("Change sort order")]),
        Line::from(vec![key("  f       ", TEXT_SECONDARY), Span::raw("Next folder")]),
        Line::from(vec![key("  o       ", TEXT_SECONDARY), Span::raw("Open in viewer")]),
        Line::from(vec![key("  q       ", TEXT_SECONDARY), Span::raw("Quit")]),
        Line::from(""),
        Line::from(Span::styled(
            "Mouse",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from("  Drag the card left or right to swipe"),
        Line::from("  Double-click to open, hold on a video for details"),
        Line::from(""),
        Line::from(Span::styled(
            "Press ? or Esc to close",
            Style::default().fg(TEXT_SECONDARY),
        )),
    ];
    render_overlay(
        frame,
        area,
        overlay_block(" Help ", ACCENT_HIGHLIGHT),
        lines,
        Alignment::Left,
    );
}

/// Renders the welcome dialog overlay
pub fn render_welcome_overlay(frame: &mut Frame) {
    let area = centered_rect(70, 60, frame.area());
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Welcome to mswp!",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Swipe left to queue a photo or video for deletion, right to keep it."),
        Line::from("Nothing is deleted until you press c and confirm the queue."),
        Line::from(""),
        Line::from(vec![
            Span::styled("  •  ", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("Deleted files go to your system "),
            Span::styled("trash", Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("  •  ", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("Use "),
            Span::styled("'u'", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" to bring back the last queued item"),
        ]),
        Line::from(vec![
            Span::styled("  •  ", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("Run with "),
            Span::styled("--dry-run", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" to try it without deleting anything"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to start...",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    render_overlay(
        frame,
        area,
        overlay_block(" Welcome ", ACCENT_HIGHLIGHT),
        lines,
        Alignment::Left,
    );
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
