use crate::app::App;
use crate::api::Film;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub fn render(app: &App, frame: &mut Frame, area: Rect) {
    let detail = &app.detail;
    let Some(film) = &detail.film else {
        let (text, color) = match (&detail.error, detail.loading) {
            (Some(error), _) => (format!("⚠ {}  (r to retry, Esc to go back)", error), Color::Red),
            (None, true) => ("Loading...".to_string(), Color::Yellow),
            (None, false) => (String::new(), Color::DarkGray),
        };
        let message = Paragraph::new(text)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(" Film "),
            );
        frame.render_widget(message, area);
        return;
    };

    // Layout: metadata(6) + overview(min)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(3)])
        .split(area);

    let meta = Paragraph::new(meta_lines(app, film)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                format!(" {} ", film.title),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
    );
    frame.render_widget(meta, chunks[0]);

    let overview = if film.overview.trim().is_empty() {
        "No overview available."
    } else {
        film.overview.as_str()
    };
    let body = Paragraph::new(overview)
        .wrap(Wrap { trim: false })
        .scroll((detail.scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Overview "),
        );
    frame.render_widget(body, chunks[1]);
}

fn meta_lines<'a>(app: &'a App, film: &'a Film) -> Vec<Line<'a>> {
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::White);

    let genres: Vec<String> = film
        .genre_ids
        .iter()
        .map(|id| {
            app.genre_name(*id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{id}"))
        })
        .collect();

    vec![
        Line::from(vec![
            Span::styled(" ID: ", label),
            Span::styled(film.id.to_string(), value.add_modifier(Modifier::BOLD)),
            Span::raw("   "),
            Span::styled("Released: ", label),
            Span::styled(
                film.release_date.clone().unwrap_or_else(|| "unknown".to_string()),
                value,
            ),
            Span::raw("   "),
            Span::styled("Runtime: ", label),
            Span::styled(
                film.runtime
                    .map(|m| format!("{} min", m))
                    .unwrap_or_else(|| "-".to_string()),
                value,
            ),
        ]),
        Line::from(vec![
            Span::styled(" Rating: ", label),
            Span::styled(
                format!("{:.1}/10", film.vote_average),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  ({} votes)", film.vote_count), label),
        ]),
        Line::from(vec![
            Span::styled(" Genres: ", label),
            Span::styled(
                if genres.is_empty() {
                    "-".to_string()
                } else {
                    genres.join(", ")
                },
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::from(vec![
            Span::styled(" Poster: ", label),
            Span::styled(
                film.poster_path.as_deref().unwrap_or("-"),
                Style::default().fg(Color::Blue),
            ),
        ]),
    ]
}
