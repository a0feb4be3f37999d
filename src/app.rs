use crate::api::{Film, FilmApi, GenreStat};
use crate::config::Config;
use crate::debounce::DebouncedQuery;
use crate::error::ApiError;
use crate::paging::{Applied, ListQuery, LoadOutcome, LoadTicket, PagedList};
use crate::sources::{CatalogSource, FilmFilter, GenreSource, TopRatedSource};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

/// Which view is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Catalog,
    TopRated,
    Genres,
    Genre,
    Search,
    Detail,
}

impl View {
    pub fn label(self) -> &'static str {
        match self {
            Self::Catalog => "Catalog",
            Self::TopRated => "Top rated",
            Self::Genres => "Genres",
            Self::Genre => "Genre",
            Self::Search => "Advanced search",
            Self::Detail => "Detail",
        }
    }

    /// Views reachable from the tab strip.
    pub const TABS: [View; 4] = [Self::Catalog, Self::TopRated, Self::Genres, Self::Search];
}

/// Where key presses go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing in the title search bar.
    SearchBar,
    /// Typing in the advanced search form.
    Form,
}

/// The paged lists owned by the views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Catalog,
    TopRated,
    Genre,
    Search,
}

/// Results delivered from spawned fetches back to the event loop.
pub enum AppEvent {
    Page {
        list: ListKind,
        outcome: LoadOutcome<Film>,
    },
    Suggestions {
        token: u64,
        result: Result<Vec<Film>, ApiError>,
    },
    Detail {
        token: u64,
        result: Result<Option<Film>, ApiError>,
    },
    Genres(Result<Vec<GenreStat>, ApiError>),
}

/// A paged list plus the cursor into it.
pub struct FilmList {
    pub list: PagedList<Film>,
    pub selected: usize,
}

impl FilmList {
    pub fn new(page_size: usize) -> Self {
        Self {
            list: PagedList::new(page_size),
            selected: 0,
        }
    }

    pub fn selected_film(&self) -> Option<&Film> {
        self.list.get(self.selected)
    }

    /// Move down; true when the cursor sits on the last item and more pages
    /// exist.
    pub fn next(&mut self) -> bool {
        if self.selected + 1 < self.list.len() {
            self.selected += 1;
            false
        } else {
            self.list.has_more()
        }
    }

    pub fn prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn page_down(&mut self, rows: usize) {
        if !self.list.is_empty() {
            self.selected = (self.selected + rows.max(1)).min(self.list.len() - 1);
        }
    }

    pub fn page_up(&mut self, rows: usize) {
        self.selected = self.selected.saturating_sub(rows.max(1));
    }

    pub fn first(&mut self) {
        self.selected = 0;
    }

    pub fn last(&mut self) {
        self.selected = self.list.len().saturating_sub(1);
    }

    fn clamp(&mut self) {
        self.selected = self.selected.min(self.list.len().saturating_sub(1));
    }
}

/// Detail view state. Only the response for the latest request is kept.
#[derive(Debug, Default)]
pub struct DetailState {
    token: u64,
    pub film_id: Option<i64>,
    pub film: Option<Film>,
    pub loading: bool,
    pub error: Option<String>,
    pub scroll: u16,
}

impl DetailState {
    pub fn begin(&mut self, id: i64) -> u64 {
        self.token += 1;
        self.film_id = Some(id);
        self.film = None;
        self.loading = true;
        self.error = None;
        self.scroll = 0;
        self.token
    }

    /// Forget the current request, e.g. when leaving the view.
    pub fn discard(&mut self) {
        self.token += 1;
        self.loading = false;
    }

    pub fn accept(&mut self, token: u64, result: Result<Option<Film>, ApiError>) -> bool {
        if token != self.token {
            return false;
        }
        self.loading = false;
        match result {
            Ok(Some(film)) => self.film = Some(film),
            Ok(None) => self.error = Some("Film not found".to_string()),
            Err(e) => {
                tracing::warn!(film = ?self.film_id, error = %e, "detail load failed");
                self.error = Some(e.user_message());
            }
        }
        true
    }
}

/// Advanced search form fields, in focus order.
pub const FORM_FIELDS: [&str; 5] = ["Title", "Min rating", "Max rating", "Min year", "Max year"];

#[derive(Debug, Default, Clone)]
pub struct SearchForm {
    pub values: [String; 5],
    pub focused: usize,
}

impl SearchForm {
    pub fn focus_next(&mut self) {
        self.focused = (self.focused + 1) % FORM_FIELDS.len();
    }

    pub fn focus_prev(&mut self) {
        self.focused = (self.focused + FORM_FIELDS.len() - 1) % FORM_FIELDS.len();
    }

    pub fn push(&mut self, c: char) {
        // Numeric fields only take what a number can contain
        if self.focused == 0 || c.is_ascii_digit() || c == '.' {
            self.values[self.focused].push(c);
        }
    }

    pub fn pop(&mut self) {
        self.values[self.focused].pop();
    }

    pub fn clear(&mut self) {
        self.values = Default::default();
        self.focused = 0;
    }

    pub fn filter(&self) -> Result<FilmFilter, ApiError> {
        let [title, min_rating, max_rating, min_year, max_year] = &self.values;
        FilmFilter::parse(title, min_rating, max_rating, min_year, max_year)
    }
}

pub const LIST_OVERHEAD: u16 = 9;

/// Main application state.
pub struct App {
    api: Arc<FilmApi>,
    events: UnboundedSender<AppEvent>,
    pub config: Config,
    pub should_quit: bool,
    pub view: View,
    pub previous_view: View,
    pub show_help: bool,
    pub input_mode: InputMode,
    pub rows: usize,

    pub catalog: FilmList,
    pub top: FilmList,
    pub genre: FilmList,
    pub results: FilmList,

    pub genre_id: Option<i64>,
    pub genres: Vec<GenreStat>,
    pub genres_loading: bool,
    pub genres_error: Option<String>,
    pub genre_selected: usize,

    pub form: SearchForm,
    pub last_filter: Option<FilmFilter>,

    pub search: DebouncedQuery<Film>,
    pub suggestion_selected: usize,

    pub detail: DetailState,

    pub status_msg: String,
}

impl App {
    pub fn new(api: Arc<FilmApi>, config: Config, events: UnboundedSender<AppEvent>) -> Self {
        let page_size = config.page_size;
        Self {
            search: DebouncedQuery::new(config.debounce(), config.suggestion_limit),
            api,
            events,
            config,
            should_quit: false,
            view: View::Catalog,
            previous_view: View::Catalog,
            show_help: false,
            input_mode: InputMode::Normal,
            rows: 20,

            catalog: FilmList::new(page_size),
            top: FilmList::new(page_size),
            genre: FilmList::new(page_size),
            results: FilmList::new(page_size),

            genre_id: None,
            genres: Vec::new(),
            genres_loading: false,
            genres_error: None,
            genre_selected: 0,

            form: SearchForm::default(),
            last_filter: None,

            suggestion_selected: 0,
            detail: DetailState::default(),

            status_msg: "Loading films...".to_string(),
        }
    }

    /// Initial fan-out: first catalog page with the total, and genre names.
    pub fn init(&mut self) {
        tracing::info!(api = %self.api.base_url(), "starting");
        let query = ListQuery::new(Arc::new(CatalogSource::new(Arc::clone(&self.api))));
        let ticket = self.catalog.list.reset(query);
        self.spawn_page(ListKind::Catalog, ticket);
        self.load_genres();
    }

    pub fn film_list(&self, kind: ListKind) -> &FilmList {
        match kind {
            ListKind::Catalog => &self.catalog,
            ListKind::TopRated => &self.top,
            ListKind::Genre => &self.genre,
            ListKind::Search => &self.results,
        }
    }

    pub fn film_list_mut(&mut self, kind: ListKind) -> &mut FilmList {
        match kind {
            ListKind::Catalog => &mut self.catalog,
            ListKind::TopRated => &mut self.top,
            ListKind::Genre => &mut self.genre,
            ListKind::Search => &mut self.results,
        }
    }

    /// The list shown by the current view, if it shows one.
    pub fn active_list(&self) -> Option<ListKind> {
        match self.view {
            View::Catalog => Some(ListKind::Catalog),
            View::TopRated => Some(ListKind::TopRated),
            View::Genre => Some(ListKind::Genre),
            View::Search => Some(ListKind::Search),
            View::Genres | View::Detail => None,
        }
    }

    /// Update visible row count based on terminal height.
    pub fn update_rows(&mut self, terminal_height: u16) {
        self.rows = (terminal_height.saturating_sub(LIST_OVERHEAD) as usize).max(1);
    }

    pub fn genre_name(&self, id: i64) -> Option<&str> {
        self.genres
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.name.as_str())
    }

    // ── Spawning ──

    fn spawn_page(&self, list: ListKind, ticket: LoadTicket<Film>) {
        let window = ticket.window();
        tracing::debug!(
            ?list,
            generation = ticket.generation(),
            offset = window.offset,
            limit = window.limit,
            "loading page"
        );
        let tx = self.events.clone();
        tokio::spawn(async move {
            let outcome = ticket.run().await;
            if outcome.is_cancelled() {
                return;
            }
            let _ = tx.send(AppEvent::Page { list, outcome });
        });
    }

    fn load_genres(&mut self) {
        if self.genres_loading {
            return;
        }
        self.genres_loading = true;
        let api = Arc::clone(&self.api);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let _ = tx.send(AppEvent::Genres(api.genre_stats().await));
        });
    }

    // ── Events ──

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Page { list, outcome } => {
                let applied = self.film_list_mut(list).list.apply(outcome);
                self.film_list_mut(list).clamp();
                if applied != Applied::Stale && self.active_list() == Some(list) {
                    self.status_msg = self.list_status(list);
                }
            }
            AppEvent::Suggestions { token, result } => {
                if self.search.accept(token, result) {
                    self.suggestion_selected = 0;
                }
            }
            AppEvent::Detail { token, result } => {
                if self.detail.accept(token, result) {
                    if let Some(error) = &self.detail.error {
                        self.status_msg = error.clone();
                    } else if let Some(film) = &self.detail.film {
                        self.status_msg = film.title.clone();
                    }
                }
            }
            AppEvent::Genres(result) => {
                self.genres_loading = false;
                match result {
                    Ok(genres) => {
                        self.genres = genres;
                        self.genres_error = None;
                        self.genre_selected = self.genre_selected.min(self.genres.len().saturating_sub(1));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "genre stats failed");
                        self.genres_error = Some(e.user_message());
                    }
                }
            }
        }
    }

    /// Status line for a list after a load settles.
    pub fn list_status(&self, kind: ListKind) -> String {
        let list = &self.film_list(kind).list;
        if let Some(error) = list.error() {
            return error.to_string();
        }
        if list.is_empty_result() {
            return "No films found".to_string();
        }
        match (kind, list.total_count()) {
            (ListKind::Catalog, Some(total)) => format!("{} of {} films", list.len(), total),
            (ListKind::Search, _) => format!(
                "{} films for {}",
                list.len(),
                self.last_filter
                    .as_ref()
                    .map(FilmFilter::describe)
                    .unwrap_or_default()
            ),
            _ => format!("{} films", list.len()),
        }
    }

    /// Fire the debounced suggestion query when it is due.
    pub fn tick(&mut self, now: Instant) {
        if let Some(ticket) = self.search.poll(now) {
            let api = Arc::clone(&self.api);
            let tx = self.events.clone();
            tokio::spawn(async move {
                let params = crate::api::SearchParams::title(ticket.query);
                let result = api.search_films(&params).await;
                let _ = tx.send(AppEvent::Suggestions {
                    token: ticket.token,
                    result,
                });
            });
        }
    }

    // ── Navigation ──

    /// Switch to a top-level view, closing the genre view if it was open.
    pub fn switch_view(&mut self, view: View) {
        let genre_open = self.view == View::Genre
            || (self.view == View::Detail && self.previous_view == View::Genre);
        if genre_open && view != View::Genre {
            self.genre.list.detach();
        }
        if self.view == View::Detail {
            self.detail.discard();
        }
        self.view = view;
        match view {
            View::TopRated => {
                if self.top.list.generation() == 0 {
                    let query =
                        ListQuery::new(Arc::new(TopRatedSource::new(Arc::clone(&self.api))));
                    let ticket = self.top.list.reset(query);
                    self.spawn_page(ListKind::TopRated, ticket);
                }
                if self.genres.is_empty() {
                    self.load_genres();
                }
            }
            View::Genres => {
                if self.genres.is_empty() {
                    self.load_genres();
                }
            }
            View::Search => {
                if self.results.list.generation() == 0 {
                    self.input_mode = InputMode::Form;
                }
            }
            _ => {}
        }
        self.status_msg = match self.active_list() {
            Some(kind) => {
                let list = &self.film_list(kind).list;
                if list.generation() > 0 && !list.is_loading() {
                    self.list_status(kind)
                } else {
                    view.label().to_string()
                }
            }
            _ => view.label().to_string(),
        };
    }

    pub fn list_next(&mut self) {
        let Some(kind) = self.active_list() else {
            return;
        };
        if self.film_list_mut(kind).next() {
            self.load_more();
        }
    }

    pub fn list_prev(&mut self) {
        if let Some(kind) = self.active_list() {
            self.film_list_mut(kind).prev();
        }
    }

    pub fn list_page_down(&mut self) {
        let rows = self.rows;
        if let Some(kind) = self.active_list() {
            self.film_list_mut(kind).page_down(rows);
        }
    }

    pub fn list_page_up(&mut self) {
        let rows = self.rows;
        if let Some(kind) = self.active_list() {
            self.film_list_mut(kind).page_up(rows);
        }
    }

    pub fn list_first(&mut self) {
        if let Some(kind) = self.active_list() {
            self.film_list_mut(kind).first();
        }
    }

    pub fn list_last(&mut self) {
        if let Some(kind) = self.active_list() {
            self.film_list_mut(kind).last();
        }
    }

    /// Request the next page of the active list.
    pub fn load_more(&mut self) {
        let Some(kind) = self.active_list() else {
            return;
        };
        if let Some(ticket) = self.film_list_mut(kind).list.load_next() {
            self.status_msg = "Loading more films...".to_string();
            self.spawn_page(kind, ticket);
        }
    }

    /// Start the active list over from the first page.
    pub fn reload(&mut self) {
        match self.view {
            View::Catalog => {
                let query = ListQuery::new(Arc::new(CatalogSource::new(Arc::clone(&self.api))));
                self.restart(ListKind::Catalog, query);
            }
            View::TopRated => {
                let query = ListQuery::new(Arc::new(TopRatedSource::new(Arc::clone(&self.api))));
                self.restart(ListKind::TopRated, query);
            }
            View::Genre => {
                if let Some(id) = self.genre_id {
                    self.open_genre(id);
                }
            }
            View::Search => self.submit_search(),
            View::Genres => {
                self.genres_error = None;
                self.load_genres();
            }
            View::Detail => {
                if let Some(id) = self.detail.film_id {
                    self.open_detail(id);
                }
            }
        }
    }

    fn restart(&mut self, kind: ListKind, query: ListQuery<Film>) {
        let list = self.film_list_mut(kind);
        list.selected = 0;
        let ticket = list.list.reset(query);
        self.status_msg = "Loading films...".to_string();
        self.spawn_page(kind, ticket);
    }

    pub fn genres_next(&mut self) {
        if self.genre_selected + 1 < self.genres.len() {
            self.genre_selected += 1;
        }
    }

    pub fn genres_prev(&mut self) {
        self.genre_selected = self.genre_selected.saturating_sub(1);
    }

    /// Open the genre view for `genre_id`, fetching its films afresh.
    pub fn open_genre(&mut self, genre_id: i64) {
        self.genre_id = Some(genre_id);
        let source = GenreSource::new(Arc::clone(&self.api), genre_id);
        self.restart(ListKind::Genre, ListQuery::new(Arc::new(source)));
        self.view = View::Genre;
    }

    pub fn open_selected_genre(&mut self) {
        if let Some(id) = self.genres.get(self.genre_selected).map(|g| g.id) {
            self.open_genre(id);
        }
    }

    /// Leave the genre view for the genre index.
    pub fn close_genre(&mut self) {
        self.switch_view(View::Genres);
    }

    pub fn submit_search(&mut self) {
        match self.form.filter() {
            Ok(filter) => {
                tracing::info!(filter = %filter.describe(), "advanced search");
                self.last_filter = Some(filter.clone());
                let query = filter.into_query(Arc::clone(&self.api));
                self.restart(ListKind::Search, query);
                self.input_mode = InputMode::Normal;
            }
            Err(e) => self.status_msg = e.user_message(),
        }
    }

    // ── Detail ──

    pub fn open_detail(&mut self, id: i64) {
        if self.view != View::Detail {
            self.previous_view = self.view;
        }
        let token = self.detail.begin(id);
        self.view = View::Detail;
        self.status_msg = format!("Loading film {}...", id);

        let api = Arc::clone(&self.api);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = api.get_film(id).await;
            let _ = tx.send(AppEvent::Detail { token, result });
        });
    }

    pub fn open_selected(&mut self) {
        let id = self
            .active_list()
            .and_then(|kind| self.film_list(kind).selected_film())
            .map(|film| film.id);
        if let Some(id) = id {
            self.open_detail(id);
        }
    }

    pub fn close_detail(&mut self) {
        self.detail.discard();
        let back = self.previous_view;
        self.view = back;
        self.status_msg = match self.active_list() {
            Some(kind) => self.list_status(kind),
            None => back.label().to_string(),
        };
    }

    pub fn scroll_down(&mut self) {
        self.detail.scroll = self.detail.scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.detail.scroll = self.detail.scroll.saturating_sub(1);
    }

    pub fn scroll_page_down(&mut self) {
        self.detail.scroll = self.detail.scroll.saturating_add(20);
    }

    pub fn scroll_page_up(&mut self) {
        self.detail.scroll = self.detail.scroll.saturating_sub(20);
    }

    // ── Search bar ──

    pub fn start_search_bar(&mut self) {
        self.input_mode = InputMode::SearchBar;
        self.suggestion_selected = 0;
    }

    pub fn close_search_bar(&mut self) {
        self.input_mode = InputMode::Normal;
        self.search.clear();
    }

    pub fn suggestion_next(&mut self) {
        if self.suggestion_selected + 1 < self.search.results().len() {
            self.suggestion_selected += 1;
        }
    }

    pub fn suggestion_prev(&mut self) {
        self.suggestion_selected = self.suggestion_selected.saturating_sub(1);
    }

    /// Enter in the search bar: open the highlighted suggestion, or run a full
    /// title search when there is none.
    pub fn confirm_search_bar(&mut self) {
        let picked = if self.search.is_visible() {
            self.search
                .results()
                .get(self.suggestion_selected)
                .map(|film| film.id)
        } else {
            None
        };
        let text = self.search.text().trim().to_string();
        self.close_search_bar();

        if let Some(id) = picked {
            self.open_detail(id);
        } else if !text.is_empty() {
            self.form.clear();
            self.form.values[0] = text;
            self.switch_view(View::Search);
            self.submit_search();
        }
    }
}

/// First line of an overview, for list rows.
pub fn overview_line(overview: &str) -> &str {
    overview
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paging::{Delivery, PageSource, PageWindow};
    use futures_util::future::BoxFuture;

    fn film(id: i64) -> Film {
        Film {
            id,
            tmdb_id: None,
            title: format!("Film {id}"),
            overview: String::new(),
            poster_path: None,
            vote_average: 7.0,
            vote_count: 10,
            release_date: None,
            genre_ids: vec![],
            runtime: None,
        }
    }

    /// Search backend answering every query with the same films.
    struct CannedSearch(Vec<Film>);

    impl PageSource<Film> for CannedSearch {
        fn delivery(&self) -> Delivery {
            Delivery::Whole
        }

        fn fetch(&self, _window: PageWindow) -> BoxFuture<'_, Result<Vec<Film>, ApiError>> {
            Box::pin(async move { Ok(self.0.clone()) })
        }
    }

    fn canned_query(films: Vec<Film>, filter: FilmFilter) -> ListQuery<Film> {
        ListQuery::filtered(Arc::new(CannedSearch(films)), move |film| filter.matches(film))
    }

    fn test_app() -> (App, tokio::sync::mpsc::UnboundedReceiver<AppEvent>) {
        let config = Config {
            api_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        let api = Arc::new(FilmApi::new(&config).unwrap());
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (App::new(api, config, tx), rx)
    }

    #[test]
    fn test_detail_ignores_superseded_response() {
        let mut detail = DetailState::default();
        let first = detail.begin(1);
        let second = detail.begin(2);

        assert!(!detail.accept(first, Ok(Some(film(1)))));
        assert!(detail.loading);
        assert!(detail.accept(second, Ok(Some(film(2)))));
        assert_eq!(detail.film.as_ref().map(|f| f.id), Some(2));
        assert!(!detail.loading);
    }

    #[test]
    fn test_detail_not_found_and_discard() {
        let mut detail = DetailState::default();
        let token = detail.begin(99);
        assert!(detail.accept(token, Ok(None)));
        assert_eq!(detail.error.as_deref(), Some("Film not found"));

        let token = detail.begin(5);
        detail.discard();
        assert!(!detail.accept(token, Ok(Some(film(5)))));
        assert!(detail.film.is_none());
    }

    #[test]
    fn test_search_form_editing() {
        let mut form = SearchForm::default();
        for c in "Alien".chars() {
            form.push(c);
        }
        form.focus_next();
        for c in "7.a5".chars() {
            form.push(c);
        }
        assert_eq!(form.values[0], "Alien");
        assert_eq!(form.values[1], "7.5");

        form.focus_prev();
        form.focus_prev();
        assert_eq!(form.focused, FORM_FIELDS.len() - 1);
        form.push('1');
        form.pop();
        assert!(form.values[4].is_empty());

        let filter = form.filter().unwrap();
        assert_eq!(filter.title.as_deref(), Some("Alien"));
        assert_eq!(filter.min_rating, Some(7.5));
    }

    #[test]
    fn test_film_list_cursor_empty() {
        let mut list = FilmList::new(20);
        assert!(!list.next());
        list.page_down(10);
        list.last();
        assert_eq!(list.selected, 0);
        assert!(list.selected_film().is_none());
    }

    #[tokio::test]
    async fn test_genre_view_closes_and_detaches() {
        let (mut app, _rx) = test_app();
        app.open_genre(18);
        assert_eq!(app.view, View::Genre);
        assert!(app.genre.list.is_loading());
        let generation = app.genre.list.generation();

        app.close_genre();
        assert_eq!(app.view, View::Genres);
        assert!(!app.genre.list.is_loading());
        assert!(app.genre.list.generation() > generation);
    }

    #[tokio::test]
    async fn test_invalid_form_reports_without_loading() {
        let (mut app, _rx) = test_app();
        app.switch_view(View::Search);
        assert_eq!(app.input_mode, InputMode::Form);
        app.form.values[1] = "9".to_string();
        app.form.values[2] = "3".to_string();
        app.submit_search();
        assert_eq!(app.status_msg, "Min rating is above max rating");
        assert_eq!(app.results.list.generation(), 0);
        assert_eq!(app.input_mode, InputMode::Form);
    }

    #[tokio::test]
    async fn test_detail_round_trip_restores_view() {
        let (mut app, _rx) = test_app();
        app.switch_view(View::TopRated);
        app.open_detail(603);
        assert_eq!(app.view, View::Detail);
        assert_eq!(app.previous_view, View::TopRated);
        app.close_detail();
        assert_eq!(app.view, View::TopRated);
    }

    #[tokio::test]
    async fn test_search_without_matches_shows_empty_state() {
        let (mut app, _rx) = test_app();
        app.switch_view(View::Search);
        app.form.values[0] = "Matrix".to_string();
        app.submit_search();
        assert_eq!(app.status_msg, "Loading films...");

        // Answer the search in place of the network
        let filter = app.last_filter.clone().unwrap();
        let ticket = app.results.list.reset(canned_query(vec![], filter));
        let outcome = ticket.run().await;
        app.handle_event(AppEvent::Page {
            list: ListKind::Search,
            outcome,
        });

        assert_eq!(app.status_msg, "No films found");
        assert!(app.results.list.error().is_none());
        assert!(app.results.list.is_empty_result());
        assert_eq!(app.list_status(ListKind::Search), "No films found");
    }

    #[tokio::test]
    async fn test_superseded_page_leaves_list_alone() {
        let (mut app, _rx) = test_app();
        app.switch_view(View::Search);
        let filter = FilmFilter::parse("Matrix", "", "", "", "").unwrap();
        app.last_filter = Some(filter.clone());

        let old = app
            .results
            .list
            .reset(canned_query(vec![film(1), film(2)], filter.clone()));
        let fresh = app.results.list.reset(canned_query(vec![film(3)], filter));

        let outcome = fresh.run().await;
        app.handle_event(AppEvent::Page {
            list: ListKind::Search,
            outcome,
        });
        let status = app.status_msg.clone();
        assert_eq!(app.results.list.len(), 1);

        let outcome = old.run().await;
        app.handle_event(AppEvent::Page {
            list: ListKind::Search,
            outcome,
        });
        assert_eq!(app.status_msg, status);
        assert_eq!(app.results.list.len(), 1);
        assert_eq!(app.results.list.get(0).map(|f| f.id), Some(3));
    }

    #[tokio::test]
    async fn test_top_rated_starts_films_and_genre_names_together() {
        let (mut app, _rx) = test_app();
        app.switch_view(View::TopRated);
        assert!(app.top.list.is_loading());
        assert!(app.genres_loading);

        // A failed genre load is retried on the next visit
        app.handle_event(AppEvent::Genres(Err(ApiError::Status {
            status: 500,
            message: String::new(),
        })));
        assert!(!app.genres_loading);
        app.switch_view(View::Catalog);
        app.switch_view(View::TopRated);
        assert!(app.genres_loading);
    }

    #[test]
    fn test_overview_line() {
        assert_eq!(overview_line("\n  First line.\nSecond"), "First line.");
        assert_eq!(overview_line(""), "");
    }
}
