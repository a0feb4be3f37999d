use super::centered_rect;
use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Global",
        &[
            ("?", "Toggle this help"),
            ("q / Ctrl+C", "Quit application"),
            ("1-4", "Catalog / Top rated / Genres / Advanced search"),
            ("/", "Search titles (suggestions as you type)"),
        ],
    ),
    (
        "Film lists",
        &[
            ("↑/k ↓/j", "Navigate up/down (loads the next page at the end)"),
            ("PgUp/PgDn", "Move a screen up/down"),
            ("g/G", "Jump to first/last loaded film"),
            ("m", "Load more films"),
            ("r", "Reload from the first page"),
            ("Enter", "Open film detail"),
        ],
    ),
    (
        "Genres",
        &[
            ("Enter", "Show films of the selected genre"),
            ("Esc", "Back to the genre index"),
        ],
    ),
    (
        "Advanced search",
        &[
            ("e", "Edit the search form"),
            ("Tab/Shift+Tab", "Next/previous field"),
            ("Enter", "Run the search"),
            ("Esc", "Leave the form"),
        ],
    ),
    (
        "Detail",
        &[
            ("↑/↓ PgUp/PgDn", "Scroll overview"),
            ("Esc", "Back to the list"),
        ],
    ),
];

pub fn render(frame: &mut Frame) {
    let area = centered_rect(70, 80, frame.area());

    // Clear the area behind the popup
    frame.render_widget(Clear, area);

    let mut help_text = vec![Line::from("")];
    for (title, keys) in SECTIONS {
        help_text.push(Line::from(Span::styled(
            format!("  {}", title),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )));
        for (key, action) in *keys {
            help_text.push(Line::from(vec![
                Span::styled(format!("    {:<16}", key), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ]));
        }
        help_text.push(Line::from(""));
    }

    let help = Paragraph::new(help_text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help: Keybindings ")
                .title_bottom(
                    Line::from(" Press ? or Esc to close ")
                        .style(Style::default().fg(Color::DarkGray)),
                ),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(help, area);
}
