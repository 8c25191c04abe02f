pub mod highlight;
pub mod ranking;
pub mod request;
pub mod state;

use std::ops::Deref;
use std::sync::Arc;

use crate::catalog_client::BookCatalogService;
use crate::domain::models::{BookId, FilterKey, QueryFilters};
pub use state::{EngineConfig, FetchKind, FetchOutcome, FetchTicket, QueryState};

/// Drives a [`QueryState`] against a [`BookCatalogService`], one request at a time.
///
/// Each screen owns its own engine. Callers that need to keep the UI responsive
/// while a request is out can drive the [`QueryState`] directly with tickets.
pub struct CatalogQueryEngine<S: ?Sized> {
    service: Arc<S>,
    state: QueryState,
}

impl<S> CatalogQueryEngine<S>
where
    S: BookCatalogService + ?Sized,
{
    pub fn new(service: Arc<S>, config: EngineConfig) -> Self {
        CatalogQueryEngine {
            service,
            state: QueryState::new(config),
        }
    }

    pub fn with_filters(mut self, filters: QueryFilters) -> Self {
        self.state = self.state.with_filters(filters);
        self
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    async fn run(&mut self, ticket: Option<FetchTicket>) -> FetchOutcome {
        let Some(ticket) = ticket else {
            return FetchOutcome::Skipped;
        };
        let result = self.service.fetch_page(&ticket.request).await;
        let outcome = self.state.complete(&ticket, result);
        if let FetchOutcome::Applied { added } = &outcome {
            tracing::debug!(
                kind = ?ticket.kind,
                page = self.state.current_page(),
                total_pages = self.state.total_pages(),
                added,
                "catalog page applied"
            );
        }
        outcome
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn load(&mut self) -> FetchOutcome {
        let ticket = self.state.initial_load();
        self.run(Some(ticket)).await
    }

    pub fn set_search_query(&mut self, text: impl Into<String>) {
        self.state.set_search_query(text);
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn execute_search(&mut self) -> FetchOutcome {
        let ticket = self.state.execute_search();
        self.run(ticket).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn toggle_filter(&mut self, key: FilterKey) -> FetchOutcome {
        let ticket = self.state.toggle_filter(key);
        self.run(Some(ticket)).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn toggle_sort(&mut self) -> FetchOutcome {
        let ticket = self.state.toggle_sort();
        self.run(Some(ticket)).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn refresh(&mut self) -> FetchOutcome {
        let ticket = self.state.refresh();
        self.run(ticket).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn load_next_page(&mut self) -> FetchOutcome {
        let ticket = self.state.load_next_page();
        self.run(ticket).await
    }

    pub fn toggle_wishlist(&mut self, id: &BookId) -> bool {
        self.state.toggle_wishlist(id)
    }
}

impl<S: ?Sized> Deref for CatalogQueryEngine<S> {
    type Target = QueryState;

    fn deref(&self) -> &QueryState {
        &self.state
    }
}
