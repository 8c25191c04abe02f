// Wire DTOs for the book rental backend (camelCase JSON)

use serde::{Deserialize, Serialize};

use crate::domain::models::BookId;

// ============ Books ============

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    #[serde(deserialize_with = "de::id_from_str_or_num")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub authors: Vec<AuthorDto>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub binding: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub available_copies: Option<u32>,
    #[serde(default)]
    pub total_copies: Option<u32>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Authors arrive either as `{ "name": .. }` objects or bare strings.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AuthorDto {
    Named { name: Option<String> },
    Plain(String),
}

impl AuthorDto {
    pub fn name(&self) -> Option<&str> {
        match self {
            AuthorDto::Named { name } => name.as_deref(),
            AuthorDto::Plain(s) => Some(s),
        }
    }
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookPageDto {
    #[serde(default)]
    pub data: Option<Vec<BookDto>>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub book_count: Option<u64>,
}

// ============ Auth ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub remember_me: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_expiration: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

// ============ Orders ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest<'a> {
    pub book_ids: &'a [BookId],
    pub delivery_address: &'a str,
    pub notes: &'a str,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct OrdersResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<OrdersData>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct OrdersData {
    #[serde(default)]
    pub orders: Vec<OrderDto>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    #[serde(deserialize_with = "de::id_from_str_or_num")]
    pub order_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_books: Option<u32>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub books: Vec<OrderedBookDto>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderedBookDto {
    #[serde(deserialize_with = "de::id_from_str_or_num")]
    pub item_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub authors: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub return_date: Option<String>,
    #[serde(default)]
    pub expected_return_date: Option<String>,
}

/// Error payloads vary by endpoint; pick whichever text field is present.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
    pub title: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error).or(self.title)
    }
}

/// Internal serde helpers
pub mod de {
    use serde::{Deserialize, Deserializer};

    /// Accept an id given as a number or a string.
    pub fn id_from_str_or_num<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum NumOrStr {
            Num(i64),
            Str(String),
        }

        Ok(match NumOrStr::deserialize(deserializer)? {
            NumOrStr::Num(n) => n.to_string(),
            NumOrStr::Str(s) => s,
        })
    }

    /// Treat an explicit `null` like a missing field.
    pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }
}
