use crate::error::ApiError;
use std::time::{Duration, Instant};

/// A query that is ready to be sent. Hand the token back with the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    pub token: u64,
    pub query: String,
}

/// Search box state: waits for typing to pause, then asks for one fetch.
///
/// Only the response to the most recently issued ticket is accepted.
pub struct DebouncedQuery<T> {
    quiet: Duration,
    limit: usize,
    text: String,
    edited_at: Option<Instant>,
    latest: u64,
    loading: bool,
    results: Vec<T>,
    visible: bool,
}

impl<T> DebouncedQuery<T> {
    pub fn new(quiet: Duration, limit: usize) -> Self {
        Self {
            quiet,
            limit: limit.max(1),
            text: String::new(),
            edited_at: None,
            latest: 0,
            loading: false,
            results: Vec::new(),
            visible: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn results(&self) -> &[T] {
        &self.results
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn push(&mut self, c: char, now: Instant) {
        self.text.push(c);
        self.edited_at = Some(now);
    }

    pub fn pop(&mut self, now: Instant) {
        if self.text.pop().is_some() {
            self.edited_at = Some(now);
        }
    }

    /// Drop the text and anything in flight.
    pub fn clear(&mut self) {
        self.text.clear();
        self.edited_at = None;
        self.invalidate();
    }

    /// When the pending edit becomes due, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.edited_at.map(|at| at + self.quiet)
    }

    /// Issue a ticket once the quiet period since the last edit has passed.
    ///
    /// A blank query clears the suggestions instead of fetching.
    pub fn poll(&mut self, now: Instant) -> Option<QueryTicket> {
        let due = self.deadline()?;
        if now < due {
            return None;
        }
        self.edited_at = None;

        let query = self.text.trim();
        if query.is_empty() {
            self.invalidate();
            return None;
        }

        self.latest += 1;
        self.loading = true;
        Some(QueryTicket {
            token: self.latest,
            query: query.to_string(),
        })
    }

    /// Take a response. Returns false if it belongs to a superseded ticket.
    pub fn accept(&mut self, token: u64, result: Result<Vec<T>, ApiError>) -> bool {
        if token != self.latest {
            tracing::debug!(token, latest = self.latest, "dropping stale suggestions");
            return false;
        }
        self.loading = false;
        match result {
            Ok(mut found) => {
                found.truncate(self.limit);
                self.visible = !found.is_empty();
                self.results = found;
            }
            Err(e) => {
                tracing::warn!(error = %e, query = %self.text, "suggestion search failed");
                self.results.clear();
                self.visible = false;
            }
        }
        true
    }

    fn invalidate(&mut self) {
        self.latest += 1;
        self.loading = false;
        self.results.clear();
        self.visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(300);

    fn typed(text: &str, at: Instant) -> DebouncedQuery<&'static str> {
        let mut q = DebouncedQuery::new(QUIET, 5);
        for c in text.chars() {
            q.push(c, at);
        }
        q
    }

    #[test]
    fn test_waits_for_quiet_period() {
        let t0 = Instant::now();
        let mut q = typed("mat", t0);

        assert_eq!(q.poll(t0 + Duration::from_millis(100)), None);
        q.push('r', t0 + Duration::from_millis(200));
        // Timer restarted by the last keystroke
        assert_eq!(q.poll(t0 + Duration::from_millis(400)), None);

        let ticket = q.poll(t0 + Duration::from_millis(500)).unwrap();
        assert_eq!(ticket.query, "matr");
        assert!(q.is_loading());
        // Fires once per pause
        assert_eq!(q.poll(t0 + Duration::from_millis(900)), None);
    }

    #[test]
    fn test_last_request_wins() {
        let t0 = Instant::now();
        let mut q = typed("mat", t0);
        let first = q.poll(t0 + QUIET).unwrap();

        q.push('r', t0 + QUIET);
        let second = q.poll(t0 + QUIET * 2).unwrap();
        assert!(second.token > first.token);

        assert!(q.accept(second.token, Ok(vec!["The Matrix"])));
        assert!(!q.accept(first.token, Ok(vec!["Matilda"])));
        assert_eq!(q.results(), &["The Matrix"]);
        assert!(!q.is_loading());
    }

    #[test]
    fn test_blank_query_clears_without_ticket() {
        let t0 = Instant::now();
        let mut q = typed("ab", t0);
        let ticket = q.poll(t0 + QUIET).unwrap();
        assert!(q.accept(ticket.token, Ok(vec!["Abyss"])));
        assert!(q.is_visible());

        q.pop(t0 + QUIET);
        q.pop(t0 + QUIET);
        q.push(' ', t0 + QUIET);
        assert_eq!(q.poll(t0 + QUIET * 2), None);
        assert!(q.results().is_empty());
        assert!(!q.is_visible());
    }

    #[test]
    fn test_clear_invalidates_in_flight() {
        let t0 = Instant::now();
        let mut q = typed("alien", t0);
        let ticket = q.poll(t0 + QUIET).unwrap();
        q.clear();
        assert!(!q.accept(ticket.token, Ok(vec!["Alien"])));
        assert!(q.results().is_empty());
        assert_eq!(q.deadline(), None);
    }

    #[test]
    fn test_results_are_capped() {
        let t0 = Instant::now();
        let mut q = typed("the", t0);
        let ticket = q.poll(t0 + QUIET).unwrap();
        q.accept(ticket.token, Ok(vec!["a", "b", "c", "d", "e", "f", "g"]));
        assert_eq!(q.results().len(), 5);
    }

    #[test]
    fn test_failure_hides_suggestions() {
        let t0 = Instant::now();
        let mut q = typed("dune", t0);
        let ticket = q.poll(t0 + QUIET).unwrap();
        assert!(q.accept(ticket.token, Err(ApiError::Decode("x".to_string()))));
        assert!(!q.is_visible());
        assert!(!q.is_loading());
    }

    #[test]
    fn test_empty_response_hides_list() {
        let t0 = Instant::now();
        let mut q = typed("zzzz", t0);
        let ticket = q.poll(t0 + QUIET).unwrap();
        assert!(q.accept(ticket.token, Ok(Vec::new())));
        assert!(!q.is_visible());
    }
}
