//! # Cursor Utilities
//!
//! Opaque keyset pagination cursors. A cursor encodes the `(created_at, id)`
//! of the last row on a page as base64 JSON.

use axum::http::StatusCode;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

const MAX_CURSOR_LEN: usize = 512;

/// Position of the last row returned on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorData {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

/// Encode cursor data as an opaque base64 string
pub fn encode_cursor(created_at: &DateTime<Utc>, id: &Uuid) -> String {
    let cursor_data = CursorData {
        created_at: *created_at,
        id: *id,
    };
    // Serializing a struct of a timestamp and a UUID cannot fail
    let json = serde_json::to_vec(&cursor_data).unwrap_or_default();
    base64::engine::general_purpose::STANDARD.encode(json)
}

/// Decode cursor data from an opaque base64 string with validation
pub fn decode_cursor(cursor: &str) -> Result<CursorData, ApiError> {
    if cursor.is_empty() {
        return Err(invalid_cursor("cursor cannot be empty"));
    }

    if cursor.len() > MAX_CURSOR_LEN {
        return Err(invalid_cursor("cursor is too long"));
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(cursor)
        .map_err(|_| invalid_cursor("cursor is not valid base64"))?;

    let cursor_data: CursorData = serde_json::from_slice(&decoded)
        .map_err(|_| invalid_cursor("cursor contains invalid JSON structure"))?;

    if cursor_data.id.is_nil() {
        return Err(invalid_cursor("cursor contains invalid ID"));
    }

    Ok(cursor_data)
}

fn invalid_cursor(message: &str) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message)
}
