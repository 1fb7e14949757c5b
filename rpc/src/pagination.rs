//! Cursor-based pagination for list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size when `count` is not specified.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Pagination parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    /// Opaque cursor from a previous response.
    pub cursor: Option<String>,
    /// Number of items per page (default 100, max 1000).
    pub count: Option<u32>,
}

impl PaginationParams {
    /// Effective page size, clamped to `[1, MAX_PAGE_SIZE]`.
    pub fn effective_count(&self) -> u32 {
        self.count
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Offset encoded in the cursor; 0 if absent or unreadable.
    pub fn decode_offset(&self) -> u64 {
        self.cursor
            .as_deref()
            .and_then(decode_cursor)
            .unwrap_or(0)
    }
}

/// A page of items plus the cursor for the next one.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Cursor for `offset`: hex of its big-endian bytes.
pub fn encode_cursor(offset: u64) -> String {
    hex::encode(offset.to_be_bytes())
}

pub fn decode_cursor(cursor: &str) -> Option<u64> {
    let bytes: [u8; 8] = hex::decode(cursor).ok()?.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Cursor for the page after one starting at `current_offset`. `None` once a
/// short page shows the end was reached.
pub fn next_cursor(current_offset: u64, returned: usize, page_size: u32) -> Option<String> {
    if (returned as u32) < page_size {
        None
    } else {
        Some(encode_cursor(current_offset + returned as u64))
    }
}
