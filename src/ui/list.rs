use super::truncate_str;
use crate::app::{App, FilmList, ListKind, overview_line};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

pub fn render(app: &App, frame: &mut Frame, area: Rect) {
    let Some(kind) = app.active_list() else {
        return;
    };
    let title = match kind {
        ListKind::Genre => {
            let name = app
                .genre_id
                .and_then(|id| app.genre_name(id))
                .unwrap_or("Genre");
            format!(" {} ", name)
        }
        ListKind::TopRated => " Top rated ".to_string(),
        ListKind::Search => " Results ".to_string(),
        ListKind::Catalog => " Catalog ".to_string(),
    };
    render_films(app.film_list(kind), &title, frame, area);
}

/// Shared by every view that shows a paged film list.
pub fn render_films(films: &FilmList, title: &str, frame: &mut Frame, area: Rect) {
    let list = &films.list;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title.to_string())
        .title_bottom(Line::from(page_info(films)).alignment(Alignment::Right));

    // Nothing to show yet: a loading, error or empty message instead of rows
    if list.is_empty() {
        let (text, color) = if list.is_loading() {
            ("Loading...".to_string(), Color::Yellow)
        } else if let Some(error) = list.error() {
            (format!("⚠ {}  (r to retry)", error), Color::Red)
        } else if list.is_empty_result() {
            ("No films found".to_string(), Color::DarkGray)
        } else {
            (String::new(), Color::DarkGray)
        };
        let message = Paragraph::new(text)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(message, area);
        return;
    }

    let width = area.width as usize;
    let mut items: Vec<ListItem> = list
        .items()
        .iter()
        .map(|film| {
            let year = film
                .release_year()
                .map(|y| y.to_string())
                .unwrap_or_else(|| "    ".to_string());
            let title_width = 40.min(width.saturating_sub(24));
            let title = truncate_str(&film.title, title_width);
            let pad = title_width.saturating_sub(unicode_width::UnicodeWidthStr::width(
                title.as_str(),
            ));
            let overview_width = width.saturating_sub(title_width + 24);
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>4.1} ", film.vote_average),
                    Style::default().fg(rating_color(film.vote_average)),
                ),
                Span::styled(format!("{} ", year), Style::default().fg(Color::DarkGray)),
                Span::raw(format!("{}{}", title, " ".repeat(pad))),
                Span::styled(
                    format!("  {}", truncate_str(overview_line(&film.overview), overview_width)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    // Trailing row for the next page
    if list.is_loading() {
        items.push(ListItem::new(Span::styled(
            "  Loading more films...",
            Style::default().fg(Color::Yellow),
        )));
    } else if let Some(error) = list.error() {
        items.push(ListItem::new(Span::styled(
            format!("  ⚠ {}  (m to retry)", error),
            Style::default().fg(Color::Red),
        )));
    } else if list.has_more() && !list.is_filtered() {
        items.push(ListItem::new(Span::styled(
            "  ── m: load more ──",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let list_widget = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    let mut state = ListState::default();
    state.select(Some(films.selected));
    frame.render_stateful_widget(list_widget, area, &mut state);
}

/// Cursor position, loaded count and catalog total for the bottom border.
fn page_info(films: &FilmList) -> String {
    let list = &films.list;
    let shown = list.len();
    let position = if shown == 0 { 0 } else { films.selected + 1 };
    match list.total_count() {
        Some(total) if !list.is_filtered() => {
            format!(" {}/{} of {} films ", position, shown, total)
        }
        _ => format!(" {}/{} ", position, shown),
    }
}

fn rating_color(rating: f64) -> Color {
    if rating >= 7.5 {
        Color::Green
    } else if rating >= 5.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_color_bands() {
        assert_eq!(rating_color(8.7), Color::Green);
        assert_eq!(rating_color(7.5), Color::Green);
        assert_eq!(rating_color(6.1), Color::Yellow);
        assert_eq!(rating_color(2.0), Color::Red);
    }

    #[test]
    fn test_page_info_empty() {
        let films = FilmList::new(20);
        assert_eq!(page_info(&films), " 0/0 ");
    }
}
