//! Per-feature request builders over [`ApiClient`](crate::client::ApiClient).
//!
//! Each operation is exactly one HTTP call. Operations that change saved
//! items publish `SavedItemsChanged` once the backend confirms.

pub mod chat;
pub mod recipe;
pub mod travel;

pub use chat::ChatClient;
pub use recipe::RecipeClient;
pub use travel::TravelClient;

use crate::client::ApiError;

/// Reject a blank required field before anything is sent.
pub(crate) fn require_text<'a>(value: &'a str, message: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApiError::Validation(message.to_string()))
    } else {
        Ok(trimmed)
    }
}
