//! # Common API Types
//!
//! Pagination helpers shared by list endpoints.

use crate::error::{ApiError, validation_error};

/// Default page size for list endpoints
pub const DEFAULT_PAGE_LIMIT: u64 = 50;
/// Largest page size a client may request
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Resolve a requested page size, rejecting out-of-range values
pub fn page_limit(requested: Option<u64>) -> Result<u64, ApiError> {
    match requested {
        None => Ok(DEFAULT_PAGE_LIMIT),
        Some(limit) if (1..=MAX_PAGE_LIMIT).contains(&limit) => Ok(limit),
        Some(_) => Err(validation_error(
            "Invalid limit",
            serde_json::json!({ "limit": format!("must be between 1 and {}", MAX_PAGE_LIMIT) }),
        )),
    }
}
