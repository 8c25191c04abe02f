//! Client-side display ranking over already fetched results.

use super::highlight::contains_ci;
use crate::domain::models::Book;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    Title,
    /// Matched only through an author name or the isbn.
    Other,
}

pub fn match_field(book: &Book, query: &str) -> Option<MatchField> {
    if contains_ci(&book.title, query) {
        return Some(MatchField::Title);
    }
    let by_author = book.authors.iter().any(|a| contains_ci(&a.name, query));
    let by_isbn = book.isbn.as_deref().is_some_and(|i| contains_ci(i, query));
    (by_author || by_isbn).then_some(MatchField::Other)
}

/// Filters to books matching `query` and puts title matches first, keeping the
/// server order within each group. A blank query returns `books` untouched.
pub fn rank<'a>(books: &'a [Book], query: &str) -> Vec<&'a Book> {
    let query = query.trim();
    if query.is_empty() {
        return books.iter().collect();
    }
    let (mut title, other): (Vec<_>, Vec<_>) = books
        .iter()
        .filter_map(|b| match_field(b, query).map(|m| (b, m)))
        .partition(|(_, m)| *m == MatchField::Title);
    title.extend(other);
    title.into_iter().map(|(b, _)| b).collect()
}
