//! Paged list controller
//!
//! Owns the query, pagination and ordering of one remote list and turns user
//! interactions (search, page, sort, filters, refresh) into backend fetches.
//!
//! Fetches may overlap when the user types or clicks quickly. Each one is
//! tagged with a monotonically increasing token when issued; on arrival a
//! response is applied only if its token is still the latest, otherwise it is
//! dropped without touching `data`, `pagination`, `error` or `loading`.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use smartsales_core::types::{
    validate_filter_key, ListQuery, OrderingState, Page, PaginationState,
};
use smartsales_core::utils::page_from_link;
use smartsales_core::{Error, Result};

use crate::transport::ListTransport;

/// Render-friendly snapshot of a list
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    pub data: Vec<T>,
    pub loading: bool,
    pub error: Option<Error>,
    pub pagination: PaginationState,
    pub ordering: OrderingState,
}

/// What happened to the fetch an operation triggered
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Response applied to the state
    Loaded,
    /// Request failed; the error is now in the state
    Failed(Error),
    /// A newer request superseded this one; its response was dropped
    Stale,
    /// The controller was closed before the response arrived
    Closed,
}

impl FetchOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, FetchOutcome::Loaded)
    }
}

struct Inner<T> {
    query: ListQuery,
    data: Vec<T>,
    loading: bool,
    error: Option<Error>,
    pagination: PaginationState,
    latest_token: u64,
    closed: bool,
}

/// Controller for one server-side paginated list
///
/// Cheap to clone; clones share the same state, which lets a caller issue
/// overlapping operations from several tasks.
pub struct PagedListController<R: ListTransport, T = Value> {
    transport: Arc<R>,
    inner: Arc<Mutex<Inner<T>>>,
    _rows: PhantomData<fn() -> T>,
}

impl<R: ListTransport, T> Clone for PagedListController<R, T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            inner: Arc::clone(&self.inner),
            _rows: PhantomData,
        }
    }
}

impl<R, T> PagedListController<R, T>
where
    R: ListTransport,
    T: DeserializeOwned + Clone + Send + 'static,
{
    /// Create a controller for `query`; nothing is fetched until the first
    /// operation (usually [`refresh`](Self::refresh))
    pub fn new(transport: Arc<R>, query: ListQuery) -> Self {
        Self {
            transport,
            inner: Arc::new(Mutex::new(Inner {
                query,
                data: Vec::new(),
                loading: false,
                error: None,
                pagination: PaginationState::default(),
                latest_token: 0,
                closed: false,
            })),
            _rows: PhantomData,
        }
    }

    /// Convenience constructor from an endpoint and fixed filters
    pub fn for_endpoint<K, V, I>(
        transport: Arc<R>,
        endpoint: &str,
        fixed_filters: I,
        page_size: u32,
    ) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let query = ListQuery::new(endpoint, page_size)?.with_fixed_filters(fixed_filters)?;
        Ok(Self::new(transport, query))
    }

    /// Current snapshot
    pub fn state(&self) -> ListState<T> {
        let inner = self.inner.lock();
        ListState {
            data: inner.data.clone(),
            loading: inner.loading,
            error: inner.error.clone(),
            pagination: inner.pagination.clone(),
            ordering: inner.query.ordering.clone(),
        }
    }

    /// Copy of the query as it will be sent next
    pub fn query(&self) -> ListQuery {
        self.inner.lock().query.clone()
    }

    /// Query for an export of up to `cap` rows with the current filters
    ///
    /// Reading it never mutates the on-screen list.
    pub fn export_query(&self, cap: u32) -> ListQuery {
        self.inner.lock().query.for_export(cap)
    }

    /// Clear the error banner without refetching
    pub fn dismiss_error(&self) {
        self.inner.lock().error = None;
    }

    /// Stop applying responses; used when the owning view goes away
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.loading = false;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Update the search term and go back to the first page
    pub async fn set_search(&self, term: &str) -> FetchOutcome {
        let term = term.to_string();
        self.fetch_with(move |query| {
            query.search = term;
            query.page = 1;
        })
        .await
    }

    /// Jump to page `n`, clamped to `[1, total_pages]`
    pub async fn set_page(&self, page: u32) -> FetchOutcome {
        let total_pages = self.inner.lock().pagination.total_pages.max(1);
        self.fetch_with(move |query| {
            query.page = page.clamp(1, total_pages);
        })
        .await
    }

    /// Sort by `field`; the same field again flips the direction
    pub async fn set_ordering(&self, field: &str) -> FetchOutcome {
        let field = field.to_string();
        self.fetch_with(move |query| {
            query.ordering = query.ordering.toggled(&field);
            query.page = 1;
        })
        .await
    }

    /// Set (or with an empty value, remove) a user filter
    ///
    /// Keys owned by the controller or fixed by the hosting screen are
    /// rejected.
    pub async fn set_filter(&self, key: &str, value: &str) -> Result<FetchOutcome> {
        validate_filter_key(key)?;
        if self.inner.lock().query.is_fixed(key) {
            return Err(Error::InvalidArgument(format!(
                "'{}' is a fixed filter of this list",
                key
            )));
        }

        let key = key.to_string();
        let value = value.trim().to_string();
        Ok(self
            .fetch_with(move |query| {
                if value.is_empty() {
                    query.filters.remove(&key);
                } else {
                    query.filters.insert(key, value);
                }
                query.page = 1;
            })
            .await)
    }

    /// Replace every user filter at once
    pub async fn set_filters(&self, filters: BTreeMap<String, String>) -> Result<FetchOutcome> {
        {
            let inner = self.inner.lock();
            for key in filters.keys() {
                validate_filter_key(key)?;
                if inner.query.is_fixed(key) {
                    return Err(Error::InvalidArgument(format!(
                        "'{}' is a fixed filter of this list",
                        key
                    )));
                }
            }
        }

        Ok(self
            .fetch_with(move |query| {
                query.filters = filters
                    .into_iter()
                    .filter(|(_, value)| !value.trim().is_empty())
                    .collect();
                query.page = 1;
            })
            .await)
    }

    /// Remove all user filters, keeping search and ordering
    pub async fn clear_filters(&self) -> FetchOutcome {
        self.fetch_with(|query| {
            query.filters.clear();
            query.page = 1;
        })
        .await
    }

    /// Re-issue the current query unchanged
    pub async fn refresh(&self) -> FetchOutcome {
        self.fetch_with(|_| {}).await
    }

    /// Follow the backend's `next` link, if any
    ///
    /// The link's page is used as-is: the backend may serve fewer rows per
    /// page than requested, so its pages can outnumber `total_pages`.
    pub async fn next_page(&self) -> Option<FetchOutcome> {
        let target = self.link_target(|p| p.next.as_deref())?;
        Some(self.follow_link(target).await)
    }

    /// Follow the backend's `previous` link, if any
    pub async fn previous_page(&self) -> Option<FetchOutcome> {
        let target = self.link_target(|p| p.previous.as_deref())?;
        Some(self.follow_link(target).await)
    }

    async fn follow_link(&self, page: u32) -> FetchOutcome {
        self.fetch_with(move |query| query.page = page).await
    }

    fn link_target(&self, pick: impl Fn(&PaginationState) -> Option<&str>) -> Option<u32> {
        let inner = self.inner.lock();
        pick(&inner.pagination).and_then(page_from_link)
    }

    async fn fetch_with(&self, mutate: impl FnOnce(&mut ListQuery)) -> FetchOutcome {
        let (token, query) = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return FetchOutcome::Closed;
            }

            mutate(&mut inner.query);
            inner.query.page = inner.query.page.max(1);

            inner.latest_token += 1;
            inner.loading = true;
            (inner.latest_token, inner.query.clone())
        };

        debug!(
            "Fetching {} (token {}): {}",
            query.endpoint,
            token,
            query.query_string()
        );
        let result = self
            .transport
            .fetch_page(&query)
            .await
            .and_then(decode_rows::<T>);

        let mut inner = self.inner.lock();
        if inner.closed {
            debug!("Dropping response for {}: controller closed", query.endpoint);
            return FetchOutcome::Closed;
        }
        if token != inner.latest_token {
            debug!(
                "Discarding stale response for {} (token {}, latest {})",
                query.endpoint, token, inner.latest_token
            );
            return FetchOutcome::Stale;
        }

        inner.loading = false;
        match result {
            Ok(page) => {
                inner.pagination = PaginationState::from_page(&page, query.page, query.page_size);
                inner.data = page.results;
                inner.error = None;
                info!(
                    "Loaded {} rows from {} (page {}/{}, {} total)",
                    inner.data.len(),
                    query.endpoint,
                    inner.pagination.page,
                    inner.pagination.total_pages,
                    inner.pagination.count
                );
                FetchOutcome::Loaded
            }
            Err(err) => {
                warn!("Failed to load {}: {}", query.endpoint, err);
                inner.query.page = inner.pagination.page;
                inner.error = Some(err.clone());
                FetchOutcome::Failed(err)
            }
        }
    }
}

fn decode_rows<T: DeserializeOwned>(page: Page<Value>) -> Result<Page<T>> {
    let results = page
        .results
        .into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| Error::Decode(e.to_string()))?;

    Ok(Page {
        count: page.count,
        next: page.next,
        previous: page.previous,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;
    use smartsales_core::types::OrderDirection;
    use smartsales_core::ErrorKind;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Serves `total` numbered rows; per-page delays and failures are scripted
    struct FakeTransport {
        total: u64,
        /// Server-side cap on rows per page, like a backend `max_page_size`
        max_page_size: Option<u32>,
        delays: HashMap<u32, Duration>,
        fail_pages: Mutex<Vec<u32>>,
        requests: Mutex<Vec<ListQuery>>,
    }

    impl FakeTransport {
        fn new(total: u64) -> Self {
            Self {
                total,
                max_page_size: None,
                delays: HashMap::new(),
                fail_pages: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn with_max_page_size(mut self, max: u32) -> Self {
            self.max_page_size = Some(max);
            self
        }

        fn with_delay(mut self, page: u32, millis: u64) -> Self {
            self.delays.insert(page, Duration::from_millis(millis));
            self
        }

        fn fail_page(&self, page: u32) {
            self.fail_pages.lock().push(page);
        }

        fn requests(&self) -> Vec<ListQuery> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl ListTransport for FakeTransport {
        async fn fetch_page(&self, query: &ListQuery) -> Result<Page<Value>> {
            self.requests.lock().push(query.clone());
            if let Some(delay) = self.delays.get(&query.page) {
                tokio::time::sleep(*delay).await;
            }
            if self.fail_pages.lock().contains(&query.page) {
                return Err(Error::Network("connection reset".to_string()));
            }

            let served = self
                .max_page_size
                .map_or(query.page_size, |max| query.page_size.min(max));
            let size = u64::from(served);
            let start = u64::from(query.page - 1) * size;
            let end = (start + size).min(self.total);
            let results = (start..end)
                .map(|i| json!({"id": i + 1, "page": query.page}))
                .collect();
            let next = (end < self.total)
                .then(|| format!("http://backend/api/ventas/?page={}", query.page + 1));
            let previous = (query.page > 1).then(|| match query.page {
                2 => "http://backend/api/ventas/".to_string(),
                p => format!("http://backend/api/ventas/?page={}", p - 1),
            });

            Ok(Page {
                count: self.total,
                next,
                previous,
                results,
            })
        }
    }

    fn controller(transport: FakeTransport) -> (PagedListController<FakeTransport>, Arc<FakeTransport>) {
        let transport = Arc::new(transport);
        let controller = PagedListController::for_endpoint(
            Arc::clone(&transport),
            "/ventas/",
            [("estado", "pagada")],
            10,
        )
        .unwrap();
        (controller, transport)
    }

    fn pages_of(state: &ListState<Value>) -> Vec<u64> {
        state.data.iter().map(|row| row["page"].as_u64().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_first_load_populates_pagination() {
        let (controller, _) = controller(FakeTransport::new(23));

        assert_eq!(controller.refresh().await, FetchOutcome::Loaded);
        let state = controller.state();

        assert_eq!(state.data.len(), 10);
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(
            state.pagination,
            PaginationState {
                count: 23,
                next: Some("http://backend/api/ventas/?page=2".to_string()),
                previous: None,
                page: 1,
                total_pages: 3,
            }
        );
    }

    #[tokio::test]
    async fn test_set_page_within_range() {
        let (controller, _) = controller(FakeTransport::new(23));
        controller.refresh().await;

        for page in 1..=3 {
            assert!(controller.set_page(page).await.is_loaded());
            let state = controller.state();
            assert_eq!(state.pagination.page, page);
            assert!(state.data.len() <= 10);
        }
        assert_eq!(controller.state().data.len(), 3);
    }

    #[tokio::test]
    async fn test_set_page_is_clamped() {
        let (controller, transport) = controller(FakeTransport::new(23));
        controller.refresh().await;

        controller.set_page(99).await;
        assert_eq!(controller.state().pagination.page, 3);

        controller.set_page(0).await;
        assert_eq!(controller.state().pagination.page, 1);

        let pages: Vec<u32> = transport.requests().iter().map(|q| q.page).collect();
        assert_eq!(pages, vec![1, 3, 1]);
    }

    #[tokio::test]
    async fn test_ordering_toggles_and_resets_page() {
        let (controller, transport) = controller(FakeTransport::new(23));
        controller.refresh().await;
        controller.set_page(2).await;

        controller.set_ordering("fecha_venta").await;
        let state = controller.state();
        assert_eq!(state.ordering, OrderingState::asc("fecha_venta"));
        assert_eq!(state.pagination.page, 1);

        controller.set_ordering("fecha_venta").await;
        assert_eq!(controller.state().ordering.direction, OrderDirection::Desc);

        controller.set_ordering("fecha_venta").await;
        assert_eq!(controller.state().ordering.direction, OrderDirection::Asc);

        controller.set_ordering("total").await;
        assert_eq!(controller.state().ordering, OrderingState::asc("total"));

        let tokens: Vec<Option<String>> = transport
            .requests()
            .iter()
            .map(|q| q.ordering.to_token())
            .collect();
        assert_eq!(
            tokens,
            vec![
                None,
                None,
                Some("fecha_venta".to_string()),
                Some("-fecha_venta".to_string()),
                Some("fecha_venta".to_string()),
                Some("total".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_clearing_search_omits_parameter() {
        let (controller, transport) = controller(FakeTransport::new(23));
        controller.refresh().await;
        controller.set_page(3).await;

        controller.set_search("x").await;
        assert_eq!(controller.state().pagination.page, 1);

        controller.set_page(2).await;
        controller.set_search("").await;
        assert_eq!(controller.state().pagination.page, 1);

        let requests = transport.requests();
        let with_search = requests[requests.len() - 3].query_string();
        assert!(with_search.contains("search=x"));

        let cleared = requests.last().unwrap().query_string();
        assert!(!cleared.contains("search"));
        assert!(!cleared.contains("page="));
        assert!(cleared.contains("estado=pagada"));
    }

    #[tokio::test]
    async fn test_refresh_keeps_page() {
        let (controller, transport) = controller(FakeTransport::new(23));
        controller.refresh().await;
        controller.set_page(2).await;
        controller.refresh().await;

        assert_eq!(controller.state().pagination.page, 2);
        assert_eq!(transport.requests().last().unwrap().page, 2);
    }

    #[tokio::test]
    async fn test_restored_query_loads_its_page() {
        let transport = Arc::new(FakeTransport::new(23));
        let mut query = ListQuery::new("/ventas/", 10).unwrap();
        query.apply_query_string("page=2&ordering=-total");

        let controller: PagedListController<FakeTransport> =
            PagedListController::new(Arc::clone(&transport), query);
        controller.refresh().await;

        let state = controller.state();
        assert_eq!(state.pagination.page, 2);
        assert_eq!(state.ordering, OrderingState::desc("total"));
        assert_eq!(transport.requests()[0].page, 2);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        // Page 2 is slow, page 3 is fast: the page 2 response arrives last
        let (controller, _) = controller(FakeTransport::new(30).with_delay(2, 80).with_delay(3, 5));
        controller.refresh().await;

        let (first, second) = tokio::join!(controller.set_page(2), controller.set_page(3));

        assert_eq!(first, FetchOutcome::Stale);
        assert_eq!(second, FetchOutcome::Loaded);

        let state = controller.state();
        assert_eq!(state.pagination.page, 3);
        assert!(pages_of(&state).iter().all(|p| *p == 3));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_latest_response_wins_when_it_arrives_last() {
        let (controller, _) = controller(FakeTransport::new(30).with_delay(2, 5).with_delay(3, 60));
        controller.refresh().await;

        let (first, second) = tokio::join!(controller.set_page(2), controller.set_page(3));

        assert_eq!(first, FetchOutcome::Stale);
        assert_eq!(second, FetchOutcome::Loaded);
        assert!(pages_of(&controller.state()).iter().all(|p| *p == 3));
    }

    #[tokio::test]
    async fn test_loading_stays_on_until_latest_completes() {
        let (controller, _) = controller(FakeTransport::new(30).with_delay(2, 5).with_delay(3, 60));
        controller.refresh().await;

        let observer = controller.clone();
        let (_, _, loading_midway) = tokio::join!(
            controller.set_page(2),
            controller.set_page(3),
            async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                observer.state().loading
            }
        );

        assert!(loading_midway);
        assert!(!controller.state().loading);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_data() {
        let (controller, transport) = controller(FakeTransport::new(23));
        controller.refresh().await;
        let before = controller.state();

        transport.fail_page(2);
        let outcome = controller.set_page(2).await;
        assert!(matches!(outcome, FetchOutcome::Failed(_)));

        let state = controller.state();
        assert_eq!(state.error.as_ref().map(Error::kind), Some(ErrorKind::Network));
        assert_eq!(state.data, before.data);
        assert_eq!(state.pagination, before.pagination);
        assert!(!state.loading);
        assert_eq!(controller.query().page, 1);

        controller.dismiss_error();
        assert!(controller.state().error.is_none());
    }

    #[tokio::test]
    async fn test_failure_on_first_fetch_leaves_data_empty() {
        let (controller, transport) = controller(FakeTransport::new(23));
        transport.fail_page(1);

        controller.refresh().await;
        let state = controller.state();
        assert!(state.data.is_empty());
        assert!(state.error.is_some());
        assert_eq!(state.pagination, PaginationState::default());
    }

    #[tokio::test]
    async fn test_closed_controller_ignores_responses() {
        let (controller, _) = controller(FakeTransport::new(30).with_delay(2, 40));
        controller.refresh().await;

        let closer = controller.clone();
        let (outcome, _) = tokio::join!(controller.set_page(2), async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            closer.close();
        });

        assert_eq!(outcome, FetchOutcome::Closed);
        assert_eq!(controller.state().pagination.page, 1);
        assert_eq!(controller.refresh().await, FetchOutcome::Closed);
    }

    #[tokio::test]
    async fn test_filters() {
        let (controller, transport) = controller(FakeTransport::new(23));
        controller.refresh().await;
        controller.set_page(2).await;

        controller.set_filter("precio__gte", "100").await.unwrap();
        assert_eq!(controller.state().pagination.page, 1);
        assert!(transport
            .requests()
            .last()
            .unwrap()
            .query_string()
            .contains("precio__gte=100"));

        assert!(controller.set_filter("estado", "anulada").await.is_err());
        assert!(controller.set_filter("page", "2").await.is_err());

        controller.set_filter("precio__gte", "").await.unwrap();
        assert!(controller.query().filters.is_empty());

        let mut filters = BTreeMap::new();
        filters.insert("marca".to_string(), "3".to_string());
        filters.insert("categorias".to_string(), " ".to_string());
        controller.set_filters(filters).await.unwrap();
        assert_eq!(controller.query().filters.len(), 1);

        controller.clear_filters().await;
        assert!(controller.query().filters.is_empty());
    }

    #[tokio::test]
    async fn test_link_navigation() {
        let (controller, _) = controller(FakeTransport::new(23));
        assert!(controller.previous_page().await.is_none());

        controller.refresh().await;
        assert!(controller.next_page().await.unwrap().is_loaded());
        assert_eq!(controller.state().pagination.page, 2);

        controller.next_page().await;
        assert_eq!(controller.state().pagination.page, 3);
        assert!(controller.next_page().await.is_none());

        controller.previous_page().await;
        controller.previous_page().await;
        assert_eq!(controller.state().pagination.page, 1);
    }

    #[tokio::test]
    async fn test_links_beyond_computed_total_pages_are_followed() {
        // 30 rows served 5 at a time although 10 were requested
        let (controller, transport) = controller(FakeTransport::new(30).with_max_page_size(5));
        controller.refresh().await;
        assert_eq!(controller.state().pagination.total_pages, 3);

        controller.set_page(3).await;
        let state = controller.state();
        assert_eq!(state.pagination.page, 3);
        assert!(state.pagination.has_next());

        assert!(controller.next_page().await.unwrap().is_loaded());
        let state = controller.state();
        assert_eq!(state.pagination.page, 4);
        assert_eq!(state.data[0]["id"], 16);
        assert_eq!(transport.requests().last().unwrap().page, 4);

        let mut pages = 1;
        while controller.next_page().await.is_some() {
            pages += 1;
            assert!(pages < 10, "next links never ran out");
        }
        assert_eq!(controller.state().pagination.page, 6);
        assert!(!controller.state().pagination.has_next());

        controller.previous_page().await;
        assert_eq!(controller.state().pagination.page, 5);

        // Direct page jumps stay clamped
        controller.set_page(9).await;
        assert_eq!(controller.state().pagination.page, 3);
    }

    #[tokio::test]
    async fn test_export_query_does_not_touch_state() {
        let (controller, _) = controller(FakeTransport::new(23));
        controller.refresh().await;
        controller.set_search("mesa").await;
        let before = controller.state();

        let export = controller.export_query(500);
        assert_eq!(export.page_size, 500);
        assert_eq!(export.page, 1);
        assert_eq!(export.search, "mesa");
        assert_eq!(controller.state(), before);
        assert_eq!(controller.query().page_size, 10);
    }

    #[derive(Debug, Clone, Deserialize)]
    struct Venta {
        id: u64,
    }

    #[tokio::test]
    async fn test_typed_rows() {
        let transport = Arc::new(FakeTransport::new(3));
        let controller: PagedListController<FakeTransport, Venta> =
            PagedListController::new(transport, ListQuery::new("/ventas/", 10).unwrap());

        controller.refresh().await;
        let ids: Vec<u64> = controller.state().data.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
