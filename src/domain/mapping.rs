// Mapping from backend DTOs to domain models

use chrono::{DateTime, NaiveDateTime, Utc};

use super::models::{Author, Book, BookId, BookPage, Category, Order, OrderedBook};
use crate::catalog_client::models::{BookDto, BookPageDto, CategoryDto, OrderDto};

pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/80x120?text=No+Image";

pub fn map_book(dto: BookDto) -> Book {
    let authors = dto
        .authors
        .iter()
        .filter_map(|a| a.name())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| Author { name: n.to_string() })
        .collect();

    let image_url = dto
        .image_url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string());

    Book {
        id: BookId(dto.id),
        title: dto.title.unwrap_or_default(),
        authors,
        isbn: dto.isbn.filter(|s| !s.is_empty()),
        category: dto.category,
        publisher: dto.publisher,
        binding: dto.binding,
        description: dto.description,
        average_rating: dto.average_rating.unwrap_or(0.0).clamp(0.0, 5.0),
        review_count: dto.review_count.unwrap_or(0),
        available_copies: dto.available_copies.unwrap_or(0),
        total_copies: dto.total_copies.unwrap_or(0),
        is_available: dto.is_available.unwrap_or(false),
        image_url,
    }
}

/// Missing `data` is an empty page, missing `totalPages` is 1, missing `totalCount` is 0.
pub fn map_page(dto: BookPageDto) -> BookPage {
    BookPage {
        books: dto.data.unwrap_or_default().into_iter().map(map_book).collect(),
        total_pages: dto.total_pages.filter(|p| *p >= 1).unwrap_or(1),
        total_count: dto.total_count.unwrap_or(0),
    }
}

pub fn map_category(dto: CategoryDto) -> Category {
    Category {
        id: dto.id,
        name: dto.name,
        book_count: dto.book_count.unwrap_or(0),
    }
}

pub fn map_order(dto: OrderDto) -> Order {
    let books: Vec<OrderedBook> = dto
        .books
        .into_iter()
        .map(|b| OrderedBook {
            item_id: b.item_id,
            title: b.title.unwrap_or_default(),
            authors: b.authors,
            image_url: b.image_url,
            status: b.status,
            return_date: b.return_date,
            expected_return_date: b.expected_return_date,
        })
        .collect();
    Order {
        order_id: dto.order_id,
        status: dto.status,
        total_books: dto.total_books.unwrap_or(books.len() as u32),
        books,
    }
}

/// Token expiry as sent by the login endpoint. Timestamps without an offset are UTC.
pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|n| n.and_utc())
}
