//! Literal, case-insensitive match spans used for highlighting.
//!
//! The query is never compiled into a pattern, so `C++`, `(`, `.*` and friends
//! match themselves.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub highlighted: bool,
}

fn chars_eq_ci(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Byte length of the match of `needle` at the start of `haystack`, if any.
fn match_at(haystack: &str, needle: &[char]) -> Option<usize> {
    let mut chars = haystack.char_indices();
    for &n in needle {
        let (_, h) = chars.next()?;
        if !chars_eq_ci(h, n) {
            return None;
        }
    }
    Some(chars.next().map_or(haystack.len(), |(i, _)| i))
}

/// All non-overlapping matches of `needle` in `haystack`, left to right.
pub fn match_ranges(haystack: &str, needle: &str) -> Vec<Range<usize>> {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() {
        return Vec::new();
    }
    let mut ranges = Vec::new();
    let mut pos = 0;
    while pos < haystack.len() {
        let rest = &haystack[pos..];
        match match_at(rest, &needle) {
            Some(len) => {
                ranges.push(pos..pos + len);
                pos += len;
            }
            None => {
                pos += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }
    ranges
}

pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() {
        return true;
    }
    haystack
        .char_indices()
        .any(|(i, _)| match_at(&haystack[i..], &needle).is_some())
}

/// Splits `text` into plain and highlighted segments. Concatenating the segments
/// always yields `text` unchanged.
pub fn segments<'a>(text: &'a str, query: &str) -> Vec<Segment<'a>> {
    let mut out = Vec::new();
    let mut last = 0;
    for r in match_ranges(text, query) {
        if r.start > last {
            out.push(Segment {
                text: &text[last..r.start],
                highlighted: false,
            });
        }
        out.push(Segment {
            text: &text[r.clone()],
            highlighted: true,
        });
        last = r.end;
    }
    if last < text.len() || out.is_empty() {
        out.push(Segment {
            text: &text[last..],
            highlighted: false,
        });
    }
    out
}
