use crate::error::ApiError;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The `(offset, limit)` slice requested from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: usize,
    pub limit: usize,
}

/// How a source hands out its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// One window at a time.
    Paged,
    /// Everything in one response; the window is ignored.
    Whole,
}

/// Fetch strategy plugged into a [`PagedList`].
pub trait PageSource<T>: Send + Sync {
    fn delivery(&self) -> Delivery {
        Delivery::Paged
    }

    fn fetch(&self, window: PageWindow) -> BoxFuture<'_, Result<Vec<T>, ApiError>>;

    /// Size of the unfiltered collection, when the source can tell.
    fn total(&self) -> BoxFuture<'_, Result<Option<u64>, ApiError>> {
        Box::pin(async { Ok(None) })
    }
}

pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A source plus an optional local filter.
pub struct ListQuery<T> {
    source: Arc<dyn PageSource<T>>,
    predicate: Option<Predicate<T>>,
}

impl<T> Clone for ListQuery<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            predicate: self.predicate.clone(),
        }
    }
}

impl<T> ListQuery<T> {
    pub fn new(source: Arc<dyn PageSource<T>>) -> Self {
        Self {
            source,
            predicate: None,
        }
    }

    /// Filtered queries fetch the whole collection once and keep the matches.
    pub fn filtered(
        source: Arc<dyn PageSource<T>>,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            source,
            predicate: Some(Arc::new(predicate)),
        }
    }

    pub fn is_filtered(&self) -> bool {
        self.predicate.is_some()
    }

    fn is_whole(&self) -> bool {
        self.is_filtered() || self.source.delivery() == Delivery::Whole
    }
}

/// Shared flag telling in-flight work that nobody is waiting for it any more.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A load issued by [`PagedList`]. Run it anywhere, then hand the outcome back
/// to [`PagedList::apply`].
pub struct LoadTicket<T> {
    generation: u64,
    window: PageWindow,
    want_total: bool,
    source: Arc<dyn PageSource<T>>,
    cancel: CancelSignal,
}

impl<T> LoadTicket<T> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn window(&self) -> PageWindow {
        self.window
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn run(self) -> LoadOutcome<T> {
        let LoadTicket {
            generation,
            window,
            want_total,
            source,
            cancel,
        } = self;

        if cancel.is_cancelled() {
            return LoadOutcome {
                generation,
                result: Err(ApiError::Cancelled),
                total: None,
                cancel,
            };
        }

        let (result, total) = if want_total {
            let (page, total) = futures_util::join!(source.fetch(window), source.total());
            let total = match total {
                Ok(total) => total,
                Err(e) => {
                    tracing::warn!(error = %e, "total count unavailable");
                    None
                }
            };
            (page, total)
        } else {
            (source.fetch(window).await, None)
        };

        LoadOutcome {
            generation,
            result,
            total,
            cancel,
        }
    }
}

/// Result of running a [`LoadTicket`].
pub struct LoadOutcome<T> {
    generation: u64,
    result: Result<Vec<T>, ApiError>,
    total: Option<u64>,
    cancel: CancelSignal,
}

impl<T> LoadOutcome<T> {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// What [`PagedList::apply`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Appended(usize),
    Replaced(usize),
    Failed,
    /// Superseded by a reset or the list was detached; nothing changed.
    Stale,
}

/// Accumulating list fed page by page from a [`PageSource`].
pub struct PagedList<T> {
    items: Vec<T>,
    page_size: usize,
    offset: usize,
    has_more: bool,
    total_count: Option<u64>,
    loading: bool,
    error: Option<String>,
    generation: u64,
    query: Option<ListQuery<T>>,
    cancel: CancelSignal,
}

impl<T> PagedList<T> {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            page_size: page_size.max(1),
            offset: 0,
            has_more: false,
            total_count: None,
            loading: false,
            error: None,
            generation: 0,
            query: None,
            cancel: CancelSignal::new(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_filtered(&self) -> bool {
        self.query.as_ref().is_some_and(ListQuery::is_filtered)
    }

    /// Loaded, no failure, and nothing to show.
    pub fn is_empty_result(&self) -> bool {
        self.generation > 0 && !self.loading && self.error.is_none() && self.items.is_empty()
    }

    /// Clear everything and issue the first load under `query`.
    ///
    /// Outcomes of earlier tickets are ignored from here on.
    pub fn reset(&mut self, query: ListQuery<T>) -> LoadTicket<T> {
        self.cancel.cancel();
        self.cancel = CancelSignal::new();
        self.generation += 1;

        self.items.clear();
        self.offset = 0;
        self.has_more = true;
        self.total_count = None;
        self.error = None;

        self.loading = true;
        let ticket = self.ticket(&query);
        self.query = Some(query);
        ticket
    }

    /// Ticket for the page at the current offset, or `None` while a load is
    /// in flight or when the list is exhausted.
    pub fn load_next(&mut self) -> Option<LoadTicket<T>> {
        if self.loading || !self.has_more {
            return None;
        }
        let ticket = self.ticket(self.query.as_ref()?);
        self.loading = true;
        Some(ticket)
    }

    fn ticket(&self, query: &ListQuery<T>) -> LoadTicket<T> {
        LoadTicket {
            generation: self.generation,
            window: PageWindow {
                offset: self.offset,
                limit: self.page_size,
            },
            want_total: self.offset == 0 && !query.is_filtered() && self.total_count.is_none(),
            source: Arc::clone(&query.source),
            cancel: self.cancel.clone(),
        }
    }

    /// Fold a finished load back into the list.
    pub fn apply(&mut self, outcome: LoadOutcome<T>) -> Applied {
        if outcome.generation != self.generation || outcome.is_cancelled() {
            tracing::debug!(
                outcome = outcome.generation,
                current = self.generation,
                "dropping stale page"
            );
            return Applied::Stale;
        }
        self.loading = false;

        let page = match outcome.result {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(offset = self.offset, error = %e, "page load failed");
                self.error = Some(e.user_message());
                return Applied::Failed;
            }
        };
        self.error = None;

        let Some(query) = self.query.as_ref() else {
            return Applied::Stale;
        };

        if query.is_whole() {
            self.items = match &query.predicate {
                Some(keep) => page.into_iter().filter(|item| keep(item)).collect(),
                None => page,
            };
            self.offset = self.items.len();
            self.has_more = false;
            self.total_count = if query.is_filtered() {
                Some(self.items.len() as u64)
            } else {
                outcome.total.or(Some(self.items.len() as u64))
            };
            return Applied::Replaced(self.items.len());
        }

        let received = page.len();
        self.items.extend(page);
        self.offset += self.page_size;
        self.has_more = received == self.page_size;
        if self.total_count.is_none() {
            self.total_count = outcome.total;
        }
        Applied::Appended(received)
    }

    /// Stop listening for in-flight loads, e.g. when the owning view closes.
    pub fn detach(&mut self) {
        self.cancel.cancel();
        self.cancel = CancelSignal::new();
        self.generation += 1;
        self.loading = false;
    }
}

impl<T: Send + 'static> PagedList<T> {
    /// Reset and run the first load inline.
    pub async fn reset_now(&mut self, query: ListQuery<T>) -> Applied {
        let outcome = self.reset(query).run().await;
        self.apply(outcome)
    }

    /// Run the next load inline; `None` when `load_next` would be a no-op.
    pub async fn load_next_now(&mut self) -> Option<Applied> {
        let ticket = self.load_next()?;
        let outcome = ticket.run().await;
        Some(self.apply(outcome))
    }
}

impl<T> Drop for PagedList<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::AtomicUsize;

    /// In-memory source over `0..total`.
    struct RangeSource {
        total: usize,
        delivery: Delivery,
        fail_next: AtomicBool,
        fail_total: bool,
        fetches: AtomicUsize,
        total_calls: AtomicUsize,
    }

    impl RangeSource {
        fn new(total: usize) -> Self {
            Self {
                total,
                delivery: Delivery::Paged,
                fail_next: AtomicBool::new(false),
                fail_total: false,
                fetches: AtomicUsize::new(0),
                total_calls: AtomicUsize::new(0),
            }
        }
    }

    impl PageSource<usize> for RangeSource {
        fn delivery(&self) -> Delivery {
            self.delivery
        }

        fn fetch(&self, window: PageWindow) -> BoxFuture<'_, Result<Vec<usize>, ApiError>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail_next.swap(false, Ordering::SeqCst);
            Box::pin(async move {
                if fail {
                    return Err(ApiError::Status {
                        status: 503,
                        message: "unavailable".to_string(),
                    });
                }
                Ok(match self.delivery {
                    Delivery::Whole => (0..self.total).collect(),
                    Delivery::Paged => {
                        let end = (window.offset + window.limit).min(self.total);
                        (window.offset.min(end)..end).collect()
                    }
                })
            })
        }

        fn total(&self) -> BoxFuture<'_, Result<Option<u64>, ApiError>> {
            self.total_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if self.fail_total {
                    Err(ApiError::Decode("bad count".to_string()))
                } else {
                    Ok(Some(self.total as u64))
                }
            })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Rated {
        id: usize,
        rating: f64,
    }

    struct RatedSource(Vec<Rated>);

    impl PageSource<Rated> for RatedSource {
        fn delivery(&self) -> Delivery {
            Delivery::Whole
        }

        fn fetch(&self, _window: PageWindow) -> BoxFuture<'_, Result<Vec<Rated>, ApiError>> {
            Box::pin(async move { Ok(self.0.clone()) })
        }
    }

    fn query(source: &Arc<RangeSource>) -> ListQuery<usize> {
        ListQuery::new(source.clone() as Arc<dyn PageSource<usize>>)
    }

    #[tokio::test]
    async fn test_three_pages_of_forty_five() {
        let source = Arc::new(RangeSource::new(45));
        let mut list = PagedList::new(20);

        assert_eq!(list.reset_now(query(&source)).await, Applied::Appended(20));
        assert!(list.has_more());
        assert_eq!(list.load_next_now().await, Some(Applied::Appended(20)));
        assert!(list.has_more());
        assert_eq!(list.load_next_now().await, Some(Applied::Appended(5)));
        assert!(!list.has_more());

        assert_eq!(list.len(), 45);
        assert_eq!(list.items(), (0..45).collect::<Vec<_>>().as_slice());
        assert_eq!(list.load_next_now().await, None);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_total_fetched_once_on_first_page() {
        let source = Arc::new(RangeSource::new(45));
        let mut list = PagedList::new(20);

        list.reset_now(query(&source)).await;
        assert_eq!(list.total_count(), Some(45));
        list.load_next_now().await;
        list.load_next_now().await;
        assert_eq!(source.total_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_total_failure_does_not_fail_page() {
        let mut source = RangeSource::new(30);
        source.fail_total = true;
        let source = Arc::new(source);
        let mut list = PagedList::new(20);

        assert_eq!(list.reset_now(query(&source)).await, Applied::Appended(20));
        assert_eq!(list.total_count(), None);
        assert!(list.error().is_none());
    }

    #[tokio::test]
    async fn test_reset_clears_immediately() {
        let source = Arc::new(RangeSource::new(100));
        let mut list = PagedList::new(10);
        list.reset_now(query(&source)).await;
        list.load_next_now().await;
        assert_eq!(list.len(), 20);

        let _ticket = list.reset(query(&source));
        assert!(list.is_empty());
        assert_eq!(list.offset(), 0);
        assert!(list.has_more());
        assert!(list.is_loading());
        assert_eq!(list.total_count(), None);
    }

    #[tokio::test]
    async fn test_load_next_is_noop_while_loading() {
        let source = Arc::new(RangeSource::new(100));
        let mut list = PagedList::new(10);
        let ticket = list.reset(query(&source));

        assert!(list.load_next().is_none());

        let outcome = ticket.run().await;
        list.apply(outcome);
        assert!(list.load_next().is_some());
        assert!(list.load_next().is_none());
    }

    #[tokio::test]
    async fn test_stale_outcome_after_reset_is_dropped() {
        let source = Arc::new(RangeSource::new(100));
        let other = Arc::new(RangeSource::new(3));
        let mut list = PagedList::new(10);

        let old = list.reset(query(&source));
        let fresh = list.reset(query(&other));
        assert!(old.is_cancelled());

        // Fresh response lands first, then the old one
        let fresh_outcome = fresh.run().await;
        assert_eq!(list.apply(fresh_outcome), Applied::Appended(3));
        let old_outcome = old.run().await;
        assert_eq!(list.apply(old_outcome), Applied::Stale);

        assert_eq!(list.items(), &[0, 1, 2]);
        assert!(!list.has_more());
    }

    #[tokio::test]
    async fn test_failure_keeps_items_and_offset() {
        let source = Arc::new(RangeSource::new(45));
        let mut list = PagedList::new(20);
        list.reset_now(query(&source)).await;
        let offset = list.offset();

        source.fail_next.store(true, Ordering::SeqCst);
        assert_eq!(list.load_next_now().await, Some(Applied::Failed));
        assert_eq!(list.len(), 20);
        assert_eq!(list.offset(), offset);
        assert!(list.has_more());
        assert!(!list.is_loading());
        assert!(list.error().unwrap().contains("HTTP 503"));

        // Retry picks up where it left off and clears the error
        assert_eq!(list.load_next_now().await, Some(Applied::Appended(20)));
        assert_eq!(list.items()[20], 20);
        assert!(list.error().is_none());
    }

    #[tokio::test]
    async fn test_failed_first_page_can_be_retried() {
        let source = Arc::new(RangeSource::new(5));
        source.fail_next.store(true, Ordering::SeqCst);
        let mut list = PagedList::new(20);

        assert_eq!(list.reset_now(query(&source)).await, Applied::Failed);
        assert!(list.is_empty());
        assert!(!list.is_empty_result());
        assert_eq!(list.load_next_now().await, Some(Applied::Appended(5)));
        assert_eq!(list.len(), 5);
    }

    #[tokio::test]
    async fn test_whole_delivery_replaces() {
        let mut source = RangeSource::new(10);
        source.delivery = Delivery::Whole;
        let source = Arc::new(source);
        let mut list = PagedList::new(4);

        assert_eq!(list.reset_now(query(&source)).await, Applied::Replaced(10));
        assert!(!list.has_more());
        assert_eq!(list.total_count(), Some(10));
        assert_eq!(list.load_next_now().await, None);
    }

    #[tokio::test]
    async fn test_filtered_rating_range() {
        let films = vec![
            Rated { id: 1, rating: 4.9 },
            Rated { id: 2, rating: 5.0 },
            Rated { id: 3, rating: 7.5 },
            Rated { id: 4, rating: 8.0 },
            Rated { id: 5, rating: 8.1 },
        ];
        let source: Arc<dyn PageSource<Rated>> = Arc::new(RatedSource(films));
        let mut list = PagedList::new(2);

        let (a, b) = (5.0, 8.0);
        let applied = list
            .reset_now(ListQuery::filtered(source, move |f: &Rated| {
                f.rating >= a && f.rating <= b
            }))
            .await;

        assert_eq!(applied, Applied::Replaced(3));
        assert!(list.is_filtered());
        assert!(!list.has_more());
        assert_eq!(list.total_count(), Some(3));
        assert!(list.items().iter().all(|f| f.rating >= a && f.rating <= b));
        assert_eq!(
            list.items().iter().map(|f| f.id).collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let source = Arc::new(RangeSource::new(0));
        let mut list = PagedList::new(20);
        list.reset_now(query(&source)).await;
        assert!(list.is_empty_result());
        assert!(list.error().is_none());
        assert!(!list.has_more());
    }

    #[tokio::test]
    async fn test_detach_drops_in_flight() {
        let source = Arc::new(RangeSource::new(50));
        let mut list = PagedList::new(10);
        let ticket = list.reset(query(&source));
        list.detach();

        assert!(ticket.is_cancelled());
        let outcome = ticket.run().await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(list.apply(outcome), Applied::Stale);
        assert!(list.is_empty());
        assert!(!list.is_loading());
    }

    #[tokio::test]
    async fn test_drop_cancels_outstanding_ticket() {
        let source = Arc::new(RangeSource::new(50));
        let ticket = {
            let mut list = PagedList::new(10);
            list.reset(query(&source))
        };
        assert!(ticket.is_cancelled());
    }

    #[test]
    fn test_new_list_has_nothing_to_load() {
        let mut list: PagedList<usize> = PagedList::new(0);
        assert_eq!(list.page_size(), 1);
        assert!(list.load_next().is_none());
        assert!(!list.is_empty_result());
    }

    proptest! {
        #[test]
        fn prop_load_next_terminates(page in 1usize..40, total in 0usize..300) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (list, loads) = rt.block_on(async {
                let source = Arc::new(RangeSource::new(total));
                let mut list = PagedList::new(page);
                list.reset_now(query(&source)).await;
                let mut loads = 1;
                while list.load_next_now().await.is_some() {
                    loads += 1;
                }
                (list, loads)
            });

            prop_assert!(!list.has_more());
            prop_assert_eq!(list.len(), total);
            // Short page ends it; an exact multiple needs one empty page
            prop_assert_eq!(loads, total / page + 1);
        }
    }
}
