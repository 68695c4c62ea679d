use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{normalize_email, require_non_blank};
use crate::error::AppResult;

/// Account that owns sender configurations. Only referenced by id.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub display_name: String,
    pub email: String,
}

impl CreateUser {
    /// Validate required fields and return the normalized email.
    pub fn validate(&self) -> AppResult<String> {
        require_non_blank(&self.display_name, "displayName")?;
        normalize_email(&self.email)
    }
}
