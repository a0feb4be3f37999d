use super::list::render_films;
use crate::app::{App, FORM_FIELDS, InputMode};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

const LABEL_WIDTH: usize = 13;

/// Advanced search: the criteria form above its results.
pub fn render(app: &App, frame: &mut Frame, area: Rect) {
    let form_height = FORM_FIELDS.len() as u16 + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(form_height), Constraint::Min(3)])
        .split(area);

    render_form(app, frame, chunks[0]);

    let title = match &app.last_filter {
        Some(filter) => format!(" Results: {} ", filter.describe()),
        None => " Results ".to_string(),
    };
    render_films(&app.results, &title, frame, chunks[1]);
}

fn render_form(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Form;
    let border = if editing { Color::Yellow } else { Color::DarkGray };

    let lines: Vec<Line> = FORM_FIELDS
        .iter()
        .zip(&app.form.values)
        .enumerate()
        .map(|(i, (label, value))| {
            let focused = editing && i == app.form.focused;
            let label_style = if focused {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Line::from(vec![
                Span::styled(format!(" {:<width$}", label, width = LABEL_WIDTH), label_style),
                Span::styled(value.as_str(), Style::default().fg(Color::White)),
            ])
        })
        .collect();

    let hint = if editing {
        " Tab next · Enter search · Esc done "
    } else {
        " e to edit "
    };
    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Advanced search ")
            .title_bottom(Line::from(hint).style(Style::default().fg(Color::DarkGray))),
    );
    frame.render_widget(form, area);

    if editing {
        let value = &app.form.values[app.form.focused];
        let cursor_x = area.x
            + 2
            + LABEL_WIDTH as u16
            + unicode_width::UnicodeWidthStr::width(value.as_str()) as u16;
        let cursor_y = area.y + 1 + app.form.focused as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}
