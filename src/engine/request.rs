//! Request construction for the catalog endpoints.

use crate::domain::models::QueryFilters;

/// Filtered browse request against `/api/v1/Books/search`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredQuery {
    pub category_id: Option<i64>,
    /// Current search text; may be empty.
    pub title: String,
    pub filters: QueryFilters,
    pub page: u32,
    pub page_size: u32,
}

/// Submitted free-text search: the text is matched against title, author and isbn.
#[derive(Debug, Clone, PartialEq)]
pub struct TextQuery {
    pub category_id: Option<i64>,
    pub text: String,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogRequest {
    Filtered(FilteredQuery),
    Text(TextQuery),
}

impl CatalogRequest {
    pub const SEARCH_PATH: &'static str = "/api/v1/Books/search";

    pub fn path(&self) -> &'static str {
        Self::SEARCH_PATH
    }

    pub fn page(&self) -> u32 {
        match self {
            CatalogRequest::Filtered(q) => q.page,
            CatalogRequest::Text(q) => q.page,
        }
    }

    /// Same request, different page.
    pub fn with_page(&self, page: u32) -> Self {
        let mut next = self.clone();
        match &mut next {
            CatalogRequest::Filtered(q) => q.page = page,
            CatalogRequest::Text(q) => q.page = page,
        }
        next
    }

    /// Query string pairs in the order the backend documents them.
    ///
    /// `availableOnly` is left out entirely unless it is set: the backend reads an
    /// absent key as "no availability constraint", which is not the same as `false`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut q: Vec<(&'static str, String)> = Vec::with_capacity(10);
        match self {
            CatalogRequest::Filtered(f) => {
                if let Some(id) = f.category_id {
                    q.push(("categoryId", id.to_string()));
                }
                q.push(("title", f.title.clone()));
                q.push(("bestSellers", f.filters.best_sellers.to_string()));
                q.push(("newReleases", f.filters.new_releases.to_string()));
                q.push(("sortBy", f.filters.sort_by.as_str().to_string()));
                q.push(("sortOrder", f.filters.sort_order.as_str().to_string()));
                q.push(("page", f.page.to_string()));
                q.push(("pageSize", f.page_size.to_string()));
                if f.filters.available_only {
                    q.push(("availableOnly", "true".to_string()));
                }
            }
            CatalogRequest::Text(t) => {
                if let Some(id) = t.category_id {
                    q.push(("categoryId", id.to_string()));
                }
                q.push(("title", t.text.clone()));
                q.push(("author", t.text.clone()));
                q.push(("isbn", t.text.clone()));
                q.push(("page", t.page.to_string()));
                q.push(("pageSize", t.page_size.to_string()));
            }
        }
        q
    }
}

/// Plain listing against `/api/v1/Books`.
#[derive(Debug, Clone, PartialEq)]
pub struct BookListQuery {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub is_available: Option<bool>,
}

impl BookListQuery {
    pub const PATH: &'static str = "/api/v1/Books";

    pub fn new(page: u32, page_size: u32) -> Self {
        BookListQuery {
            page,
            page_size,
            search: None,
            category_id: None,
            is_available: None,
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut q: Vec<(&'static str, String)> = vec![
            ("page", self.page.to_string()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(s) = &self.search {
            q.push(("search", s.clone()));
        }
        if let Some(id) = self.category_id {
            q.push(("categoryId", id.to_string()));
        }
        if let Some(a) = self.is_available {
            q.push(("isAvailable", a.to_string()));
        }
        q
    }
}
