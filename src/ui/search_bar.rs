use crate::app::{App, InputMode};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

const PROMPT: &str = " 🔍 ";

pub fn render(app: &App, frame: &mut Frame, area: Rect) {
    let active = app.input_mode == InputMode::SearchBar;
    let style = if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let text = if active || !app.search.text().is_empty() {
        format!("{}{}", PROMPT, app.search.text())
    } else {
        format!("{}Search titles (/)", PROMPT)
    };
    let title = if active && app.search.is_loading() {
        " Search · searching... "
    } else {
        " Search "
    };
    let bar = Paragraph::new(text).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(title),
    );
    frame.render_widget(bar, area);

    // Set cursor position when editing
    if active {
        let cursor_x = area.x
            + 1
            + unicode_width::UnicodeWidthStr::width(PROMPT) as u16
            + unicode_width::UnicodeWidthStr::width(app.search.text()) as u16;
        frame.set_cursor_position((cursor_x, area.y + 1));
    }
}

/// Suggestion drop-down just below the search bar.
pub fn render_suggestions(app: &App, frame: &mut Frame, bar: Rect, body: Rect) {
    if !app.search.is_visible() {
        return;
    }
    let results = app.search.results();
    let height = (results.len() as u16 + 2).min(body.height);
    let area = Rect {
        x: bar.x + 2,
        y: body.y,
        width: bar.width.saturating_sub(4).min(70),
        height,
    };
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner_width = area.width.saturating_sub(14) as usize;
    let items: Vec<ListItem> = results
        .iter()
        .map(|film| {
            let year = film
                .release_year()
                .map(|y| format!(" ({})", y))
                .unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::raw(super::truncate_str(&film.title, inner_width)),
                Span::styled(year, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );
    let mut state = ListState::default();
    state.select(Some(app.suggestion_selected));
    frame.render_stateful_widget(list, area, &mut state);
}
