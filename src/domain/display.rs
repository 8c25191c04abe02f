// Presentation helpers shared by list and detail views

use super::models::Book;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Star {
    Full,
    Half,
    Empty,
}

impl Book {
    /// "A, B" or "Unknown Author".
    pub fn author_line(&self) -> String {
        if self.authors.is_empty() {
            return "Unknown Author".to_string();
        }
        self.authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn stars(&self) -> [Star; 5] {
        star_breakdown(self.average_rating)
    }

    pub fn review_label(&self) -> String {
        review_label(self.review_count)
    }
}

pub fn star_breakdown(rating: f64) -> [Star; 5] {
    let rating = rating.clamp(0.0, 5.0);
    let full = rating.floor() as usize;
    let has_half = rating.fract() != 0.0;
    let mut stars = [Star::Empty; 5];
    for (i, slot) in stars.iter_mut().enumerate() {
        if i < full {
            *slot = Star::Full;
        } else if i == full && has_half {
            *slot = Star::Half;
        }
    }
    stars
}

pub fn review_label(count: u32) -> String {
    if count == 1 {
        "1 Review".to_string()
    } else {
        format!("{count} Reviews")
    }
}
