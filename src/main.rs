mod api;
mod app;
mod commands;
mod config;
mod debounce;
mod error;
mod logging;
mod paging;
mod sources;
mod ui;

use api::FilmApi;
use app::{App, AppEvent, InputMode, View};
use clap::{Parser, Subcommand};
use config::{Config, Overrides};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use sources::FilmFilter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

/// Terminal browser for a movie catalog REST service
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Base URL of the catalog service
    #[arg(long, global = true, env = "FILM_API_URL")]
    api_url: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Films per page
    #[arg(long, global = true)]
    page_size: Option<usize>,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the TUI explorer (default)
    Run,
    /// List films from the catalog
    List {
        /// Films to skip
        #[arg(long, default_value_t = 0)]
        skip: usize,
        /// Films per request (defaults to the page size)
        #[arg(long)]
        limit: Option<usize>,
        /// Keep loading pages until the catalog is exhausted
        #[arg(long)]
        all: bool,
    },
    /// Search by title, rating and release year
    Search {
        #[arg(short, long)]
        title: Option<String>,
        /// Genre id
        #[arg(short, long)]
        genre: Option<i64>,
        #[arg(long)]
        min_rating: Option<f64>,
        #[arg(long)]
        max_rating: Option<f64>,
        #[arg(long)]
        min_year: Option<i32>,
        #[arg(long)]
        max_year: Option<i32>,
    },
    /// Show one film
    Show { id: i64 },
    /// Top-rated films
    Top,
    /// Genres with film counts
    Genres {
        /// List the genre collection instead of counts
        #[arg(long)]
        all: bool,
    },
    /// One genre and its top-rated films
    Genre { id: i64 },
    /// Catalog statistics
    Stats,
    /// Add a film from a JSON file
    Add {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Replace a film with the contents of a JSON file
    Update {
        id: i64,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Delete a film
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let _log_guard = match logging::init() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        }
    };

    let overrides = Overrides {
        api_url: cli.api_url.clone(),
        page_size: cli.page_size,
    };
    let config = match Config::load(cli.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration rejected");
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    let api = Arc::new(FilmApi::new(&config)?);
    let json = cli.json;

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_tui(api, config).await,
        Commands::List { skip, limit, all } => {
            let limit = limit.unwrap_or(config.page_size);
            commands::list(api, skip, limit, all, json).await
        }
        Commands::Search {
            title,
            genre,
            min_rating,
            max_rating,
            min_year,
            max_year,
        } => {
            let filter = FilmFilter {
                title,
                genre_id: genre,
                min_rating,
                max_rating,
                min_year,
                max_year,
            };
            commands::search(api, filter, json).await
        }
        Commands::Show { id } => commands::show(&api, id, json).await,
        Commands::Top => commands::top(&api, json).await,
        Commands::Genres { all } => commands::genres(&api, all, json).await,
        Commands::Genre { id } => commands::genre(&api, id, json).await,
        Commands::Stats => commands::stats(&api).await,
        Commands::Add { file } => commands::add(&api, &file).await,
        Commands::Update { id, file } => commands::update(&api, id, &file).await,
        Commands::Delete { id } => commands::delete(&api, id).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run_tui(api: Arc<FilmApi>, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut app = App::new(api, config, tx);
    app.init();

    // Init terminal
    let mut terminal = ratatui::init();

    // Initial row count setup
    let size = terminal.size()?;
    app.update_rows(size.height);

    // Main loop
    let result = run_app(&mut terminal, &mut app, &mut rx).await;

    // Restore terminal
    ratatui::restore();
    result
}

async fn run_app(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App,
    rx: &mut UnboundedReceiver<AppEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // Apply everything the background fetches delivered since the last frame
        while let Ok(event) = rx.try_recv() {
            app.handle_event(event);
        }
        app.tick(Instant::now());

        terminal.draw(|frame| ui::render(app, frame))?;

        if app.should_quit {
            return Ok(());
        }

        // Wake up in time for a pending debounce deadline
        let mut timeout = Duration::from_millis(250);
        if let Some(deadline) = app.search.deadline() {
            timeout = timeout.min(deadline.saturating_duration_since(Instant::now()));
        }

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    handle_key(app, key);
                }
                Event::Resize(_, height) => {
                    app.update_rows(height);
                }
                _ => {}
            }
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::SearchBar => return handle_search_bar_key(app, key),
        InputMode::Form => return handle_form_key(app, key),
        InputMode::Normal => {}
    }

    // Help toggle (global)
    if key.code == KeyCode::Char('?') {
        app.show_help = !app.show_help;
        return;
    }

    // If help is showing, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('/') => {
            app.start_search_bar();
            return;
        }
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            app.switch_view(View::TABS[index]);
            return;
        }
        KeyCode::Char('r') => {
            app.reload();
            return;
        }
        _ => {}
    }

    match app.view {
        View::Catalog | View::TopRated | View::Genre | View::Search => handle_list_key(app, key),
        View::Genres => handle_genres_key(app, key),
        View::Detail => handle_detail_key(app, key),
    }
}

fn handle_list_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => app.list_next(),
        KeyCode::Up | KeyCode::Char('k') => app.list_prev(),
        KeyCode::PageDown => app.list_page_down(),
        KeyCode::PageUp => app.list_page_up(),
        KeyCode::Char('g') => app.list_first(),
        KeyCode::Char('G') => app.list_last(),
        KeyCode::Char('m') => app.load_more(),
        KeyCode::Enter => app.open_selected(),
        KeyCode::Char('e') if app.view == View::Search => {
            app.input_mode = InputMode::Form;
        }
        KeyCode::Esc if app.view == View::Genre => app.close_genre(),
        _ => {}
    }
}

fn handle_genres_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => app.genres_next(),
        KeyCode::Up | KeyCode::Char('k') => app.genres_prev(),
        KeyCode::Enter => app.open_selected_genre(),
        _ => {}
    }
}

fn handle_detail_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace => app.close_detail(),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
        KeyCode::PageDown => app.scroll_page_down(),
        KeyCode::PageUp => app.scroll_page_up(),
        _ => {}
    }
}

fn handle_search_bar_key(app: &mut App, key: KeyEvent) {
    let now = Instant::now();
    match key.code {
        // First Esc folds the suggestions away, the second leaves the bar
        KeyCode::Esc if app.search.is_visible() => app.search.hide(),
        KeyCode::Esc => app.close_search_bar(),
        KeyCode::Enter => app.confirm_search_bar(),
        KeyCode::Down => app.suggestion_next(),
        KeyCode::Up => app.suggestion_prev(),
        KeyCode::Backspace => app.search.pop(now),
        KeyCode::Char(c) => app.search.push(c, now),
        _ => {}
    }
}

fn handle_form_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.submit_search(),
        KeyCode::Tab | KeyCode::Down => app.form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => app.form.focus_prev(),
        KeyCode::Backspace => app.form.pop(),
        KeyCode::Char(c) => app.form.push(c),
        _ => {}
    }
}
