//! Catalog browsing state machine.
//!
//! Every mutation that needs the network returns a [`FetchTicket`]; the caller
//! performs the request however it likes and hands the result back through
//! [`QueryState::complete`]. Tickets are stamped with the epoch they were
//! issued in, and a response whose epoch is no longer current is dropped.

use std::collections::HashSet;

use super::highlight::{self, Segment};
use super::ranking;
use super::request::{CatalogRequest, FilteredQuery, TextQuery};
use crate::domain::models::{Book, BookId, BookPage, FilterKey, QueryFilters};
use crate::error::CatalogError;

/// Fixed per screen instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// `None` for global search.
    pub category_id: Option<i64>,
    pub page_size: u32,
    pub local_ranking: bool,
}

impl EngineConfig {
    pub fn new(category_id: Option<i64>, page_size: u32) -> Self {
        EngineConfig {
            category_id,
            page_size: page_size.max(1),
            local_ranking: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First load on mount.
    Initial,
    /// Filter or sort change.
    Reset,
    Refresh,
    /// Submitted text search.
    Search,
    NextPage,
}

impl FetchKind {
    fn appends(self) -> bool {
        self == FetchKind::NextPage
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub epoch: u64,
    pub seq: u64,
    pub kind: FetchKind,
    pub request: CatalogRequest,
}

#[derive(Debug)]
pub enum FetchOutcome {
    /// Response merged into the results; `added` counts books that were new.
    Applied { added: usize },
    /// The state moved on while the request was out; the response was dropped.
    Stale,
    /// Nothing was requested (gated, or a precondition did not hold).
    Skipped,
    Failed(CatalogError),
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    seq: u64,
    kind: FetchKind,
}

#[derive(Debug)]
pub struct QueryState {
    config: EngineConfig,
    search_query: String,
    filters: QueryFilters,
    /// Page-1 form of the request the current epoch pages through.
    template: Option<CatalogRequest>,
    page: u32,
    total_pages: u32,
    total_count: u64,
    results: Vec<Book>,
    seen: HashSet<BookId>,
    wishlist: HashSet<BookId>,
    epoch: u64,
    next_seq: u64,
    in_flight: Option<InFlight>,
    error: Option<String>,
}

impl QueryState {
    pub fn new(config: EngineConfig) -> Self {
        QueryState {
            config,
            search_query: String::new(),
            filters: QueryFilters::default(),
            template: None,
            page: 1,
            total_pages: 1,
            total_count: 0,
            results: Vec::new(),
            seen: HashSet::new(),
            wishlist: HashSet::new(),
            epoch: 0,
            next_seq: 0,
            in_flight: None,
            error: None,
        }
    }

    /// Starts from preset filters instead of the defaults.
    pub fn with_filters(mut self, filters: QueryFilters) -> Self {
        self.filters = filters;
        self
    }

    // ---- accessors for the presenter ----

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn filters(&self) -> &QueryFilters {
        &self.filters
    }

    pub fn current_page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Accumulated results in server order.
    pub fn results(&self) -> &[Book] {
        &self.results
    }

    pub fn wishlist(&self) -> &HashSet<BookId> {
        &self.wishlist
    }

    pub fn is_wishlisted(&self, id: &BookId) -> bool {
        self.wishlist.contains(id)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.in_flight,
            Some(InFlight {
                kind: FetchKind::Initial | FetchKind::Reset | FetchKind::Search,
                ..
            })
        )
    }

    pub fn is_loading_more(&self) -> bool {
        matches!(self.in_flight, Some(InFlight { kind: FetchKind::NextPage, .. }))
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(self.in_flight, Some(InFlight { kind: FetchKind::Refresh, .. }))
    }

    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }

    /// The list to render: locally ranked when a search query is typed, otherwise
    /// the server order untouched.
    pub fn displayed(&self) -> Vec<&Book> {
        if self.config.local_ranking {
            ranking::rank(&self.results, &self.search_query)
        } else {
            self.results.iter().collect()
        }
    }

    /// Highlight segments of `text` for the current query.
    pub fn highlight<'a>(&self, text: &'a str) -> Vec<Segment<'a>> {
        highlight::segments(text, self.search_query.trim())
    }

    // ---- mutations ----

    /// Stores the text as typed. No request is issued; the text is picked up by
    /// the next submitted search or epoch-starting fetch, while [`Self::displayed`]
    /// re-ranks the current results right away.
    ///
    /// A change to the trimmed text ends the current epoch: the page counter goes
    /// back to 1, responses still in flight are dropped as stale, and
    /// [`Self::load_next_page`] does nothing until the next epoch-starting fetch.
    pub fn set_search_query(&mut self, text: impl Into<String>) {
        let text = text.into();
        let changed = text.trim() != self.search_query.trim();
        self.search_query = text;
        if changed {
            self.epoch += 1;
            self.page = 1;
            self.template = None;
            tracing::debug!(epoch = self.epoch, "search text changed, paging reset");
        }
    }

    pub fn toggle_wishlist(&mut self, id: &BookId) -> bool {
        if self.wishlist.remove(id) {
            false
        } else {
            self.wishlist.insert(id.clone());
            true
        }
    }

    /// Page 1 of the filtered listing, used on mount.
    pub fn initial_load(&mut self) -> FetchTicket {
        let request = self.filtered_request();
        self.start_epoch(FetchKind::Initial, request)
    }

    /// Submits the typed text as a server search. `None` when the query is blank.
    pub fn execute_search(&mut self) -> Option<FetchTicket> {
        let text = self.search_query.trim();
        if text.is_empty() {
            return None;
        }
        let request = CatalogRequest::Text(TextQuery {
            category_id: self.config.category_id,
            text: text.to_string(),
            page: 1,
            page_size: self.config.page_size,
        });
        Some(self.start_epoch(FetchKind::Search, request))
    }

    pub fn toggle_filter(&mut self, key: FilterKey) -> FetchTicket {
        self.filters.toggle(key);
        let request = self.filtered_request();
        self.start_epoch(FetchKind::Reset, request)
    }

    pub fn toggle_sort(&mut self) -> FetchTicket {
        self.filters.sort_order = self.filters.sort_order.flipped();
        let request = self.filtered_request();
        self.start_epoch(FetchKind::Reset, request)
    }

    /// Forces page 1 with the current filters, sort and text. Dropped while a
    /// refresh is already running.
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        if self.is_refreshing() {
            return None;
        }
        let request = self.filtered_request();
        Some(self.start_epoch(FetchKind::Refresh, request))
    }

    /// Next page of the current epoch. Dropped while anything is in flight, when
    /// the last page has been reached, or before the first load.
    pub fn load_next_page(&mut self) -> Option<FetchTicket> {
        if self.in_flight.is_some() || self.page >= self.total_pages {
            return None;
        }
        let request = self.template.as_ref()?.with_page(self.page + 1);
        Some(self.issue(FetchKind::NextPage, request))
    }

    /// Applies (or drops) the result of a ticket's request.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<BookPage, CatalogError>,
    ) -> FetchOutcome {
        if self.in_flight.is_some_and(|f| f.seq == ticket.seq) {
            self.in_flight = None;
        }
        if ticket.epoch != self.epoch {
            tracing::warn!(
                ticket_epoch = ticket.epoch,
                current_epoch = self.epoch,
                kind = ?ticket.kind,
                "dropping stale catalog response"
            );
            return FetchOutcome::Stale;
        }

        match result {
            Ok(page) => {
                let added = self.merge(ticket, page);
                self.error = None;
                FetchOutcome::Applied { added }
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = ?ticket.kind, page = ticket.request.page(), "catalog fetch failed");
                self.error = Some(e.user_message());
                match ticket.kind {
                    // Accumulated results and the page counter stay as they were,
                    // so the same page is requested again on retry.
                    FetchKind::NextPage | FetchKind::Refresh => {}
                    FetchKind::Initial | FetchKind::Reset | FetchKind::Search => {
                        self.clear_results();
                    }
                }
                FetchOutcome::Failed(e)
            }
        }
    }

    // ---- internals ----

    fn filtered_request(&self) -> CatalogRequest {
        CatalogRequest::Filtered(FilteredQuery {
            category_id: self.config.category_id,
            title: self.search_query.trim().to_string(),
            filters: self.filters,
            page: 1,
            page_size: self.config.page_size,
        })
    }

    fn start_epoch(&mut self, kind: FetchKind, request: CatalogRequest) -> FetchTicket {
        self.epoch += 1;
        self.page = 1;
        self.template = Some(request.clone());
        self.issue(kind, request)
    }

    fn issue(&mut self, kind: FetchKind, request: CatalogRequest) -> FetchTicket {
        self.next_seq += 1;
        let ticket = FetchTicket {
            epoch: self.epoch,
            seq: self.next_seq,
            kind,
            request,
        };
        self.in_flight = Some(InFlight {
            seq: ticket.seq,
            kind,
        });
        tracing::debug!(epoch = ticket.epoch, seq = ticket.seq, ?kind, page = ticket.request.page(), "issuing catalog fetch");
        ticket
    }

    fn clear_results(&mut self) {
        self.results.clear();
        self.seen.clear();
        self.page = 1;
        self.total_pages = 1;
        self.total_count = 0;
    }

    fn merge(&mut self, ticket: &FetchTicket, page: BookPage) -> usize {
        if !ticket.kind.appends() {
            self.results.clear();
            self.seen.clear();
        }
        let before = self.results.len();
        for book in page.books {
            if self.seen.insert(book.id.clone()) {
                self.results.push(book);
            }
        }
        self.page = ticket.request.page();
        self.total_pages = page.total_pages.max(1);
        self.total_count = page.total_count;
        self.results.len() - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Author, SortOrder};

    fn book(id: i64, title: &str, author: &str) -> Book {
        Book {
            id: BookId::from(id),
            title: title.into(),
            authors: vec![Author { name: author.into() }],
            isbn: None,
            category: None,
            publisher: None,
            binding: None,
            description: None,
            average_rating: 0.0,
            review_count: 0,
            available_copies: 1,
            total_copies: 1,
            is_available: true,
            image_url: String::new(),
        }
    }

    fn page(ids: &[i64], total_pages: u32) -> BookPage {
        BookPage {
            books: ids.iter().map(|i| book(*i, &format!("Book {i}"), "Anon")).collect(),
            total_pages,
            total_count: 100,
        }
    }

    fn result_ids(s: &QueryState) -> Vec<i64> {
        s.results().iter().map(|b| b.id.0.parse().unwrap()).collect()
    }

    fn loaded(ids: &[i64], total_pages: u32) -> QueryState {
        let mut s = QueryState::new(EngineConfig::new(Some(4), 3));
        let t = s.initial_load();
        s.complete(&t, Ok(page(ids, total_pages)));
        s
    }

    #[test]
    fn overlapping_pages_are_deduplicated_in_first_seen_order() {
        let mut s = loaded(&[1, 2, 3], 3);
        let t = s.load_next_page().unwrap();
        assert_eq!(t.request.page(), 2);
        s.complete(&t, Ok(page(&[3, 4, 5], 3)));
        let t = s.load_next_page().unwrap();
        s.complete(&t, Ok(page(&[5, 1, 6], 3)));
        assert_eq!(result_ids(&s), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(s.current_page(), 3);
    }

    #[test]
    fn duplicate_ids_inside_one_page_collapse() {
        let s = loaded(&[1, 1, 2], 1);
        assert_eq!(result_ids(&s), vec![1, 2]);
    }

    #[test]
    fn filter_toggle_resets_page_and_replaces_results() {
        let mut s = loaded(&[1, 2, 3], 3);
        let t = s.load_next_page().unwrap();
        s.complete(&t, Ok(page(&[4, 5, 6], 3)));
        assert_eq!(s.current_page(), 2);

        let t = s.toggle_filter(FilterKey::BestSellers);
        assert_eq!(s.current_page(), 1);
        assert_eq!(t.request.page(), 1);
        assert_eq!(t.kind, FetchKind::Reset);
        assert!(s.filters().best_sellers);
        s.complete(&t, Ok(page(&[9], 1)));
        assert_eq!(result_ids(&s), vec![9]);
    }

    #[test]
    fn sort_toggle_flips_order_and_resets() {
        let mut s = loaded(&[1, 2, 3], 2);
        let t = s.toggle_sort();
        assert_eq!(s.filters().sort_order, SortOrder::Desc);
        match &t.request {
            CatalogRequest::Filtered(q) => assert_eq!(q.filters.sort_order, SortOrder::Desc),
            other => panic!("unexpected request {other:?}"),
        }
        s.complete(&t, Ok(page(&[3, 2, 1], 2)));
        assert_eq!(result_ids(&s), vec![3, 2, 1]);
        assert_eq!(s.current_page(), 1);
    }

    #[test]
    fn next_page_is_noop_at_last_page() {
        let mut s = loaded(&[1, 2, 3], 1);
        assert!(s.load_next_page().is_none());
        assert!(!s.is_loading_more());
    }

    #[test]
    fn next_page_requires_a_first_load() {
        let mut s = QueryState::new(EngineConfig::new(None, 3));
        assert!(s.load_next_page().is_none());
    }

    #[test]
    fn next_page_dropped_while_in_flight() {
        let mut s = loaded(&[1, 2, 3], 5);
        let t = s.load_next_page().unwrap();
        assert!(s.is_loading_more());
        assert!(s.load_next_page().is_none());
        s.complete(&t, Ok(page(&[4], 5)));
        assert!(!s.is_loading_more());
        assert!(s.load_next_page().is_some());
    }

    #[test]
    fn failed_next_page_keeps_page_and_results() {
        let mut s = loaded(&[1, 2, 3], 4);
        let t = s.load_next_page().unwrap();
        s.complete(&t, Ok(page(&[4, 5, 6], 4)));
        assert_eq!(s.current_page(), 2);

        let t = s.load_next_page().unwrap();
        assert_eq!(t.request.page(), 3);
        let out = s.complete(&t, Err(CatalogError::Network("connection reset".into())));
        assert!(matches!(out, FetchOutcome::Failed(CatalogError::Network(_))));
        assert_eq!(s.current_page(), 2);
        assert_eq!(result_ids(&s), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(s.error(), Some("Network error. Please check your connection."));

        let retry = s.load_next_page().unwrap();
        assert_eq!(retry.request.page(), 3);
    }

    #[test]
    fn stale_page_response_is_dropped_after_filter_change() {
        let mut s = loaded(&[1, 2, 3], 3);
        let next = s.load_next_page().unwrap();
        let reset = s.toggle_filter(FilterKey::AvailableOnly);

        // Old page arrives after the filter change.
        let out = s.complete(&next, Ok(page(&[4, 5, 6], 3)));
        assert!(matches!(out, FetchOutcome::Stale));
        assert!(s.is_loading(), "reset fetch still outstanding");

        s.complete(&reset, Ok(page(&[7], 1)));
        assert_eq!(result_ids(&s), vec![7]);
        assert!(!s.is_loading());
    }

    #[test]
    fn stale_failure_does_not_touch_state() {
        let mut s = loaded(&[1, 2], 3);
        let next = s.load_next_page().unwrap();
        let reset = s.toggle_sort();
        s.complete(&reset, Ok(page(&[8, 9], 3)));
        let out = s.complete(&next, Err(CatalogError::Timeout));
        assert!(matches!(out, FetchOutcome::Stale));
        assert_eq!(s.error(), None);
        assert_eq!(result_ids(&s), vec![8, 9]);
    }

    #[test]
    fn blank_search_is_noop() {
        let mut s = loaded(&[1], 1);
        let epoch = s.epoch();
        s.set_search_query("   ");
        assert!(s.execute_search().is_none());
        assert_eq!(s.epoch(), epoch);
    }

    #[test]
    fn search_replaces_results_and_pages_with_text_request() {
        let mut s = loaded(&[1, 2, 3], 3);
        s.set_search_query(" dune ");
        let t = s.execute_search().unwrap();
        match &t.request {
            CatalogRequest::Text(q) => {
                assert_eq!(q.text, "dune");
                assert_eq!(q.category_id, Some(4));
            }
            other => panic!("unexpected request {other:?}"),
        }
        s.complete(&t, Ok(page(&[10, 11, 12], 2)));
        assert_eq!(result_ids(&s), vec![10, 11, 12]);

        let next = s.load_next_page().unwrap();
        assert!(matches!(next.request, CatalogRequest::Text(TextQuery { page: 2, .. })));
    }

    #[test]
    fn failed_search_clears_results() {
        let mut s = loaded(&[1, 2, 3], 3);
        s.set_search_query("x");
        let t = s.execute_search().unwrap();
        s.complete(&t, Err(CatalogError::Server { status: 500, message: None }));
        assert!(s.results().is_empty());
        assert_eq!(s.total_count(), 0);
        assert_eq!(s.total_pages(), 1);
        assert_eq!(s.error(), Some("Server error: 500"));
    }

    #[test]
    fn failed_refresh_keeps_results() {
        let mut s = loaded(&[1, 2], 2);
        let t = s.refresh().unwrap();
        assert!(s.is_refreshing());
        assert!(s.refresh().is_none(), "second refresh is dropped");
        s.complete(&t, Err(CatalogError::Forbidden));
        assert_eq!(result_ids(&s), vec![1, 2]);
        assert!(!s.is_refreshing());
        assert_eq!(
            s.error(),
            Some("You do not have permission to access this resource.")
        );
    }

    #[test]
    fn refresh_uses_current_query_and_filters() {
        let mut s = loaded(&[1, 2], 2);
        s.set_search_query("rust");
        let t = s.refresh().unwrap();
        match &t.request {
            CatalogRequest::Filtered(q) => {
                assert_eq!(q.title, "rust");
                assert_eq!(q.page, 1);
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn typing_does_not_issue_requests_but_reranks() {
        let mut s = QueryState::new(EngineConfig::new(None, 10));
        let t = s.initial_load();
        s.complete(
            &t,
            Ok(BookPage {
                books: vec![
                    book(1, "Intro", "Rustacean Jane"),
                    book(2, "Other", "Nobody"),
                    book(3, "Rust for Rustaceans", "Jon"),
                ],
                total_pages: 1,
                total_count: 3,
            }),
        );
        s.set_search_query("rust");
        assert!(!s.is_loading());
        let shown: Vec<&str> = s.displayed().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(shown, vec!["3", "1"]);
    }

    #[test]
    fn empty_query_displays_server_order() {
        let s = loaded(&[3, 1, 2], 1);
        let shown: Vec<&str> = s.displayed().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(shown, vec!["3", "1", "2"]);
    }

    #[test]
    fn ranking_can_be_disabled() {
        let mut cfg = EngineConfig::new(None, 10);
        cfg.local_ranking = false;
        let mut s = QueryState::new(cfg);
        let t = s.initial_load();
        s.complete(&t, Ok(page(&[1, 2], 1)));
        s.set_search_query("zzz");
        assert_eq!(s.displayed().len(), 2);
    }

    #[test]
    fn wishlist_is_local() {
        let mut s = loaded(&[1, 2], 2);
        let id = BookId::from(2);
        assert!(s.toggle_wishlist(&id));
        assert!(s.is_wishlisted(&id));
        assert!(!s.toggle_wishlist(&id));
        assert!(s.wishlist().is_empty());
        assert_eq!(result_ids(&s), vec![1, 2]);
        assert_eq!(s.current_page(), 1);
        assert!(!s.is_loading());
    }

    #[test]
    fn highlight_uses_trimmed_query() {
        let mut s = QueryState::new(EngineConfig::new(None, 10));
        s.set_search_query(" c++ ");
        let segs = s.highlight("Effective C++");
        assert_eq!(segs.len(), 2);
        assert!(segs[1].highlighted);
        assert_eq!(segs[1].text, "C++");
    }

    #[test]
    fn preset_filters_go_into_first_request() {
        let filters = QueryFilters {
            available_only: true,
            new_releases: true,
            ..Default::default()
        };
        let mut s = QueryState::new(EngineConfig::new(None, 10)).with_filters(filters);
        let t = s.initial_load();
        let pairs = t.request.query_pairs();
        assert!(pairs.contains(&("availableOnly", "true".to_string())));
        assert!(pairs.contains(&("newReleases", "true".to_string())));
    }

    #[test]
    fn changing_search_text_resets_paging() {
        let mut s = loaded(&[1, 2, 3], 3);
        let t = s.load_next_page().unwrap();
        s.complete(&t, Ok(page(&[4, 5, 6], 3)));
        assert_eq!(s.current_page(), 2);
        let epoch = s.epoch();

        s.set_search_query("dune");
        assert_eq!(s.current_page(), 1);
        assert!(s.epoch() > epoch);
        assert!(s.load_next_page().is_none(), "old epoch must not keep paging");
        assert!(!s.is_loading());

        let t = s.refresh().unwrap();
        match &t.request {
            CatalogRequest::Filtered(q) => {
                assert_eq!(q.title, "dune");
                assert_eq!(q.page, 1);
            }
            other => panic!("unexpected request {other:?}"),
        }
        s.complete(&t, Ok(page(&[7], 2)));
        assert_eq!(result_ids(&s), vec![7]);
        assert_eq!(s.load_next_page().unwrap().request.page(), 2);
    }

    #[test]
    fn whitespace_only_edits_keep_the_epoch() {
        let mut s = loaded(&[1, 2, 3], 3);
        s.set_search_query("dune");
        let epoch = s.epoch();
        s.set_search_query(" dune  ");
        assert_eq!(s.epoch(), epoch);
        assert_eq!(s.search_query(), " dune  ");
    }

    #[test]
    fn in_flight_fetch_with_old_text_is_dropped_after_typing() {
        let mut s = loaded(&[1, 2], 2);
        s.set_search_query("old");
        let reset = s.toggle_filter(FilterKey::BestSellers);
        s.set_search_query("new");

        let out = s.complete(&reset, Ok(page(&[9], 1)));
        assert!(matches!(out, FetchOutcome::Stale));
        assert!(!s.is_loading());
        assert_eq!(result_ids(&s), vec![1, 2]);

        let next = s.load_next_page();
        assert!(next.is_none());
    }

    #[test]
    fn in_flight_next_page_is_dropped_after_typing() {
        let mut s = loaded(&[1, 2], 3);
        let next = s.load_next_page().unwrap();
        s.set_search_query("rust");
        let out = s.complete(&next, Ok(page(&[3, 4], 3)));
        assert!(matches!(out, FetchOutcome::Stale));
        assert_eq!(s.current_page(), 1);
        assert_eq!(result_ids(&s), vec![1, 2]);
    }

    #[test]
    fn total_pages_comes_from_server() {
        let s = loaded(&[1], 7);
        assert_eq!(s.total_pages(), 7);
        assert_eq!(s.total_count(), 100);
        assert!(s.has_more());
    }
}
