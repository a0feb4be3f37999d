use crate::app::App;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

/// Genre index with film counts, largest first as the server sends them.
pub fn render(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Genres ")
        .title_bottom(
            Line::from(format!(" {} genres ", app.genres.len())).alignment(Alignment::Right),
        );

    if app.genres.is_empty() {
        let (text, color) = if app.genres_loading {
            ("Loading...".to_string(), Color::Yellow)
        } else if let Some(error) = &app.genres_error {
            (format!("⚠ {}  (r to retry)", error), Color::Red)
        } else {
            ("No genres".to_string(), Color::DarkGray)
        };
        let message = Paragraph::new(text)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(message, area);
        return;
    }

    let max = app.genres.iter().map(|g| g.count).max().unwrap_or(1).max(1);
    let bar_width = (area.width as usize).saturating_sub(40).min(40);
    let items: Vec<ListItem> = app
        .genres
        .iter()
        .map(|genre| {
            let bar = "█".repeat((genre.count as usize * bar_width) / max as usize);
            ListItem::new(Line::from(vec![
                Span::raw(format!("{:<20}", genre.name)),
                Span::styled(format!("{:>6}  ", genre.count), Style::default().fg(Color::Yellow)),
                Span::styled(bar, Style::default().fg(Color::Cyan)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    let mut state = ListState::default();
    state.select(Some(app.genre_selected));
    frame.render_stateful_widget(list, area, &mut state);
}
