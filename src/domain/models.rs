// Domain models independent of the wire format the backend uses

use std::fmt;

use serde::{Serialize, Serializer};

/// Opaque book identifier. The backend sends numbers, but nothing here relies on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookId(pub String);

impl BookId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookId {
    fn from(s: &str) -> Self {
        BookId(s.to_string())
    }
}

impl From<i64> for BookId {
    fn from(n: i64) -> Self {
        BookId(n.to_string())
    }
}

// Numeric ids go back over the wire as JSON numbers.
impl Serialize for BookId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<i64>() {
            Ok(n) => serializer.serialize_i64(n),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub authors: Vec<Author>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub publisher: Option<String>,
    pub binding: Option<String>,
    pub description: Option<String>,
    /// 0.0 - 5.0, 0.0 when unrated
    pub average_rating: f64,
    pub review_count: u32,
    pub available_copies: u32,
    pub total_copies: u32,
    /// Declared by the server, not derived from copy counts.
    pub is_available: bool,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub book_count: u64,
}

/// One page of books as returned by the listing/search endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookPage {
    pub books: Vec<Book>,
    pub total_pages: u32,
    pub total_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    Title,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// The server-side boolean filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    BestSellers,
    NewReleases,
    AvailableOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryFilters {
    pub best_sellers: bool,
    pub new_releases: bool,
    pub available_only: bool,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl QueryFilters {
    pub fn toggle(&mut self, key: FilterKey) {
        let flag = match key {
            FilterKey::BestSellers => &mut self.best_sellers,
            FilterKey::NewReleases => &mut self.new_releases,
            FilterKey::AvailableOnly => &mut self.available_only,
        };
        *flag = !*flag;
    }
}

// ============ Orders (rental cart) ============

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_id: String,
    pub status: Option<String>,
    pub total_books: u32,
    pub books: Vec<OrderedBook>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderedBook {
    pub item_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub image_url: Option<String>,
    pub status: Option<String>,
    pub return_date: Option<String>,
    pub expected_return_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_only_named_flag() {
        let mut f = QueryFilters::default();
        f.toggle(FilterKey::NewReleases);
        assert!(f.new_releases);
        assert!(!f.best_sellers);
        assert!(!f.available_only);
        f.toggle(FilterKey::NewReleases);
        assert_eq!(f, QueryFilters::default());
    }

    #[test]
    fn sort_order_flips() {
        assert_eq!(SortOrder::Asc.flipped(), SortOrder::Desc);
        assert_eq!(SortOrder::Desc.flipped().as_str(), "asc");
    }

    #[test]
    fn book_id_serializes_numbers_as_numbers() {
        let ids = vec![BookId::from(42), BookId::from("isbn-9780")];
        let json = serde_json::to_string(&ids).unwrap();
        assert_eq!(json, r#"[42,"isbn-9780"]"#);
    }
}
