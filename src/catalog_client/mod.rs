pub mod models;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::domain::mapping::{map_category, map_order, map_page, parse_expiry};
use crate::domain::models::{Book, BookId, BookPage, Category, Order};
use crate::engine::request::{BookListQuery, CatalogRequest};
use crate::error::{CatalogError, CatalogResult};
use crate::registration::RegistrationRequest;
use crate::session::{Credential, SessionStore};
use models::{
    BookDto, BookPageDto, CategoryDto, CheckoutRequest, ErrorBody, LoginRequest, LoginResponse,
    OrdersResponse,
};

/// Supplies raw pages of books to the query engine.
#[async_trait]
pub trait BookCatalogService: Send + Sync {
    async fn fetch_page(&self, request: &CatalogRequest) -> CatalogResult<BookPage>;
}

/// Supplies pages of the signed-in user's orders to the rental cart.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn fetch_orders(
        &self,
        page: u32,
        page_size: u32,
        status: Option<u8>,
    ) -> CatalogResult<Vec<Order>>;
}

#[derive(Clone)]
pub struct CatalogClient {
    base_url: String,
    session: Arc<dyn SessionStore>,
    client: reqwest::Client,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url)
            .field("has_token", &self.session.bearer_token().is_some())
            .finish()
    }
}

impl CatalogClient {
    /// Create a new client with the given base URL (e.g. "https://primabi.co").
    pub fn new(
        base_url: impl Into<String>,
        session: Arc<dyn SessionStore>,
        timeout: Duration,
    ) -> CatalogResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url_str = base_url.into();
        tracing::debug!(base_url = %base_url_str, ?timeout, "creating CatalogClient");
        Ok(CatalogClient {
            base_url: base_url_str.trim_end_matches('/').to_string(),
            session,
            client,
        })
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn bearer(&self) -> CatalogResult<String> {
        self.session
            .bearer_token()
            .ok_or(CatalogError::MissingCredential)
    }

    /// Sends the request and decodes a 2xx JSON body; non-2xx becomes a typed error.
    async fn send_json<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> CatalogResult<T> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message)
                .or_else(|| {
                    let trimmed = body.trim();
                    (!trimmed.is_empty() && !trimmed.starts_with('{')).then(|| trimmed.to_string())
                });
            tracing::warn!(status = status.as_u16(), message = message.as_deref().unwrap_or(""), "request failed");
            return Err(CatalogError::from_status(status.as_u16(), message));
        }
        match serde_json::from_str::<T>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                let mut snippet_len = body.len().min(2000);
                while !body.is_char_boundary(snippet_len) {
                    snippet_len -= 1;
                }
                let snippet = &body[..snippet_len];
                tracing::error!(error = %e, body_snippet = %snippet, "failed to parse response");
                Err(e.into())
            }
        }
    }

    async fn authorized_get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> CatalogResult<T> {
        let token = self.bearer()?;
        let url = self.url(path);
        tracing::debug!(%url, ?query, "GET");
        let req = self.client.get(&url).bearer_auth(token).query(query);
        self.send_json(req).await
    }

    /// GET /api/v1/Books/search
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn search_books(&self, request: &CatalogRequest) -> CatalogResult<BookPage> {
        let dto: BookPageDto = self
            .authorized_get(request.path(), &request.query_pairs())
            .await?;
        Ok(map_page(dto))
    }

    /// GET /api/v1/Books
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list_books(&self, query: &BookListQuery) -> CatalogResult<BookPage> {
        let dto: BookPageDto = self
            .authorized_get(BookListQuery::PATH, &query.query_pairs())
            .await?;
        Ok(map_page(dto))
    }

    /// GET /api/v1/Books/{id}
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_book(&self, id: &BookId) -> CatalogResult<Book> {
        let dto: BookDto = self
            .authorized_get(&format!("/api/v1/Books/{}", id), &[])
            .await?;
        Ok(crate::domain::mapping::map_book(dto))
    }

    /// GET /api/v1/Books/categories
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_categories(&self) -> CatalogResult<Vec<Category>> {
        let dtos: Vec<CategoryDto> = self.authorized_get("/api/v1/Books/categories", &[]).await?;
        Ok(dtos.into_iter().map(map_category).collect())
    }

    /// POST /api/v1/Auth/login (no auth required). The returned credential is not
    /// stored anywhere; the caller hands it to its session store.
    #[tracing::instrument(level = "debug", skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> CatalogResult<Credential> {
        let url = self.url("/api/v1/Auth/login");
        tracing::debug!(%url, "POST login");
        let req = self.client.post(&url).json(&LoginRequest {
            email,
            password,
            remember_me,
        });
        let resp: LoginResponse = self.send_json(req).await?;
        match resp.token {
            Some(token) if resp.success && !token.is_empty() => Ok(Credential {
                token,
                expires_at: resp.token_expiration.as_deref().and_then(parse_expiry),
            }),
            _ => Err(CatalogError::Validation(
                resp.message.unwrap_or_else(|| "Login failed.".to_string()),
            )),
        }
    }

    /// POST /api/v1/Auth/register (no auth required)
    #[tracing::instrument(level = "debug", skip(self, body))]
    pub async fn register(&self, body: &RegistrationRequest) -> CatalogResult<()> {
        let url = self.url("/api/v1/Auth/register");
        tracing::debug!(%url, "POST register");
        let req = self.client.post(&url).json(body);
        let _: serde_json::Value = self.send_json(req).await?;
        Ok(())
    }

    /// POST /api/v1/Orders/checkout
    #[tracing::instrument(level = "debug", skip(self, delivery_address, notes))]
    pub async fn checkout(
        &self,
        book_ids: &[BookId],
        delivery_address: &str,
        notes: &str,
    ) -> CatalogResult<serde_json::Value> {
        if book_ids.is_empty() {
            return Err(CatalogError::Validation("Book data is not available.".into()));
        }
        let token = self.bearer()?;
        let url = self.url("/api/v1/Orders/checkout");
        tracing::debug!(%url, books = book_ids.len(), "POST checkout");
        let req = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&CheckoutRequest {
                book_ids,
                delivery_address,
                notes,
            });
        self.send_json(req).await
    }

    /// GET /api/v1/Orders/my-orders. `status` is only sent when it is a valid code (1-7).
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn my_orders(
        &self,
        page: u32,
        page_size: u32,
        status: Option<u8>,
    ) -> CatalogResult<Vec<Order>> {
        let mut q: Vec<(&'static str, String)> = vec![
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
        ];
        if let Some(s) = status.filter(|s| (1..=7).contains(s)) {
            q.push(("status", s.to_string()));
        }
        let resp: OrdersResponse = self.authorized_get("/api/v1/Orders/my-orders", &q).await?;
        if !resp.success {
            return Ok(Vec::new());
        }
        Ok(resp
            .data
            .map(|d| d.orders.into_iter().map(map_order).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl BookCatalogService for CatalogClient {
    async fn fetch_page(&self, request: &CatalogRequest) -> CatalogResult<BookPage> {
        self.search_books(request).await
    }
}

#[async_trait]
impl OrderService for CatalogClient {
    async fn fetch_orders(
        &self,
        page: u32,
        page_size: u32,
        status: Option<u8>,
    ) -> CatalogResult<Vec<Order>> {
        self.my_orders(page, page_size, status).await
    }
}
