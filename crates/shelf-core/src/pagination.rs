//! Offset/limit paging shared by thread and parent-comment listings
//!
//! A [`Cursor`] carries no state beyond the two numbers; "more remain" is
//! computed against a total counted in the same unit of work as the page.
//! Raw request values are coerced rather than rejected: anything absent,
//! non-numeric, negative or zero falls back to the defaults.

use serde::{Deserialize, Serialize};

/// Offset/limit window into an ordered result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Number of rows to skip
    pub offset: u64,
    /// Maximum number of rows to return
    pub limit: u64,
}

impl Cursor {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Cursor for a 1-based page number; page 0 is treated as page 1
    pub fn from_page(page: u64, limit: u64) -> Self {
        let page = page.max(1);
        Self {
            offset: (page - 1).saturating_mul(limit),
            limit,
        }
    }

    /// Coerce raw offset/limit strings
    pub fn parse(raw_offset: Option<&str>, raw_limit: Option<&str>, default_limit: u64) -> Self {
        let offset = raw_offset.and_then(parse_non_negative).unwrap_or(0);
        let limit = raw_limit
            .and_then(parse_non_negative)
            .filter(|l| *l > 0)
            .unwrap_or(default_limit);
        Self::new(offset, limit)
    }

    /// Coerce raw page/limit strings
    pub fn parse_page(raw_page: Option<&str>, raw_limit: Option<&str>, default_limit: u64) -> Self {
        let page = raw_page
            .and_then(parse_non_negative)
            .filter(|p| *p > 0)
            .unwrap_or(1);
        let limit = raw_limit
            .and_then(parse_non_negative)
            .filter(|l| *l > 0)
            .unwrap_or(default_limit);
        Self::from_page(page, limit)
    }

    /// Cap the limit at `max`
    pub fn clamp(self, max: u64) -> Self {
        Self {
            offset: self.offset,
            limit: self.limit.min(max),
        }
    }

    /// 1-based page number this cursor starts on
    pub fn page(&self) -> u64 {
        if self.limit == 0 {
            1
        } else {
            self.offset / self.limit + 1
        }
    }

    /// Whether rows remain after this window
    pub fn has_more(&self, total: u64) -> bool {
        has_more(self.offset, self.limit, total)
    }

    /// Slice an already ordered in-memory result set
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(usize::try_from(self.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .collect()
    }
}

/// `offset + limit < total`
pub fn has_more(offset: u64, limit: u64, total: u64) -> bool {
    offset.saturating_add(limit) < total
}

fn parse_non_negative(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}
