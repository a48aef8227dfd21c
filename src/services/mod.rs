//! Business rules. Each operation opens one unit of work on the [`Store`](crate::store::Store),
//! and commits it only when every step succeeded.
pub mod auth;
pub mod dashboard;
pub mod document;
pub mod employee;
pub mod leave;
pub mod message;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;

use crate::error::{AppError, AppResult};

const MAX_PER_PAGE: u64 = 100;
/// Highest page whose offset still fits in a `u64` at the largest page size.
const MAX_PAGE: u64 = u64::MAX / MAX_PER_PAGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    /// 1-based.
    pub page: u64,
    pub per_page: u64,
}

impl Paging {
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            per_page: per_page.unwrap_or(10).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub paging: Paging,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            paging: self.paging,
            total: self.total,
        }
    }
}

/// Rejects values longer than `max` characters.
pub(crate) fn check_len(field: &str, value: Option<&str>, max: usize) -> AppResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(AppError::validation(format!(
            "{} must not exceed {} characters",
            field, max
        ))),
        _ => Ok(()),
    }
}

/// Rejects blank values, then applies [`check_len`].
pub(crate) fn require_text(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    check_len(field, Some(value), max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_clamps_and_offsets() {
        let p = Paging::new(None, None);
        assert_eq!((p.page, p.per_page, p.offset()), (1, 10, 0));

        let p = Paging::new(Some(0), Some(500));
        assert_eq!((p.page, p.per_page), (1, 100));

        let p = Paging::new(Some(3), Some(20));
        assert_eq!(p.offset(), 40);

        let p = Paging::new(Some(u64::MAX), Some(100));
        assert_eq!(p.page, u64::MAX / 100);
        assert_eq!(p.offset(), (u64::MAX / 100 - 1) * 100);
    }

    #[test]
    fn text_rules() {
        assert!(require_text("Subject", "  ", 10).is_err());
        assert!(require_text("Subject", "hello", 10).is_ok());
        assert!(require_text("Subject", "hello world!", 10).is_err());
        assert!(check_len("Phone", None, 5).is_ok());
    }
}
