pub mod auth;
pub mod health;
pub mod statuses;
pub mod users;

/// Shared list bounds: page is 1-based, size is clamped to 1..=50.
const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 50;

/// Turns raw `page`/`size` query values into a LIMIT/OFFSET pair.
pub(crate) fn page_bounds(page: Option<i64>, size: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let size = size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (size, page.saturating_sub(1).saturating_mul(size))
}
