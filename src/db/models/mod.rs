//! Record types for the tour store.
//!
//! Each record lives in its own file; everything is re-exported here so callers
//! can write `use crate::db::models::*;`.

pub mod sender_email;
pub mod timeline_event;
pub mod tour_day;
pub mod user;

pub use self::sender_email::*;
pub use self::timeline_event::*;
pub use self::tour_day::*;
pub use self::user::*;

use crate::error::{AppError, AppResult};

/// Reject empty or whitespace-only values for required string fields.
pub(crate) fn require_non_blank(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}
