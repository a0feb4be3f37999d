mod detail;
mod genres;
mod help;
mod list;
mod search;
mod search_bar;

use crate::app::{App, InputMode, View};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Top-level render dispatch.
pub fn render(app: &App, frame: &mut Frame) {
    // Layout: tabs(3) + search bar(3) + body(min) + status(1)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_tabs(app, frame, chunks[0]);
    search_bar::render(app, frame, chunks[1]);

    match app.view {
        View::Catalog | View::TopRated | View::Genre => list::render(app, frame, chunks[2]),
        View::Search => search::render(app, frame, chunks[2]),
        View::Genres => genres::render(app, frame, chunks[2]),
        View::Detail => detail::render(app, frame, chunks[2]),
    }

    render_status(app, frame, chunks[3]);

    // Suggestions drop down over the body
    if app.input_mode == InputMode::SearchBar {
        search_bar::render_suggestions(app, frame, chunks[1], chunks[2]);
    }

    // Render help overlay on top if active
    if app.show_help {
        help::render(frame);
    }
}

fn render_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let current = match app.view {
        View::Genre => View::Genres,
        View::Detail => app.previous_view,
        other => other,
    };
    let titles: Vec<Line> = View::TABS
        .iter()
        .enumerate()
        .map(|(i, v)| Line::from(format!("{} {}", i + 1, v.label())))
        .collect();
    let selected = View::TABS.iter().position(|v| *v == current).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(Span::styled(
                    " Film Explorer ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );
    frame.render_widget(tabs, area);
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let hints: &[(&str, &str)] = match (app.input_mode, app.view) {
        (InputMode::SearchBar, _) => &[("↑↓", "Pick"), ("Enter", "Open"), ("Esc", "Close")],
        (InputMode::Form, _) => &[("Tab", "Next field"), ("Enter", "Search"), ("Esc", "Results")],
        (_, View::Detail) => &[("↑↓/PgUp/PgDn", "Scroll"), ("r", "Reload"), ("Esc", "Back")],
        (_, View::Genres) => &[("↑↓", "Navigate"), ("Enter", "Open genre"), ("r", "Reload")],
        (_, View::Search) => &[("↑↓", "Navigate"), ("e", "Edit"), ("Enter", "Detail")],
        _ => &[("↑↓", "Navigate"), ("m", "More"), ("Enter", "Detail"), ("/", "Search")],
    };

    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut spans = vec![Span::raw(" ")];
    for (key, label) in hints.iter().chain(&[("?", "Help"), ("q", "Quit")]) {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::raw(format!(" {}  ", label)));
    }
    spans.push(Span::styled(
        &app.status_msg,
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Truncate a string to `max_width` terminal columns, adding "…" if truncated.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        result.push(c);
        used += w;
    }
    result.push('…');
    result
}

/// Create a centered rectangle using percentage of parent area.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string_untouched() {
        assert_eq!(truncate_str("Alien", 10), "Alien");
        assert_eq!(truncate_str("Alien", 5), "Alien");
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        assert_eq!(truncate_str("The Lord of the Rings", 8), "The Lor…");
        assert_eq!(truncate_str("abc", 0), "…");
    }

    #[test]
    fn test_truncate_counts_wide_chars() {
        // Each CJK character takes two columns
        assert_eq!(truncate_str("千と千尋の神隠し", 7), "千と千…");
    }
}
