use std::fmt;

use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::require_non_blank;
use crate::error::{AppError, AppResult};

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[\w.+-]+@[\w-]+(\.[\w-]+)*\.[a-z]{2,}$").expect("valid email regex");
}

/// Trim and lowercase an address, then check it has a local@domain shape.
pub fn normalize_email(email: &str) -> AppResult<String> {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }
    if !EMAIL_RE.is_match(&normalized) {
        return Err(AppError::Validation(format!(
            "email is not a valid address: {}",
            normalized
        )));
    }
    Ok(normalized)
}

// ============================================================================
// Sender Email Models
// ============================================================================

/// Outbound mail credentials. At most one record carries `is_default = true`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderEmail {
    pub id: String,
    pub display_name: String,
    pub email: String,
    /// base64(nonce || AES-256-GCM ciphertext). Never serialized.
    #[serde(skip_serializing, default)]
    pub password_encrypted: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub is_default: bool,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSenderEmail {
    pub display_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default)]
    pub smtp_port: Option<u16>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSenderEmail {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub is_default: Option<bool>,
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}

fn validate_port(port: u16) -> AppResult<()> {
    if port == 0 {
        return Err(AppError::Validation("smtpPort must be between 1 and 65535".to_string()));
    }
    Ok(())
}

impl CreateSenderEmail {
    pub fn new(display_name: &str, email: &str, password: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            smtp_host: None,
            smtp_port: None,
            is_default: false,
            is_active: true,
        }
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Check required fields and return the normalized email.
    pub fn validate(&self) -> AppResult<String> {
        require_non_blank(&self.display_name, "displayName")?;
        require_non_blank(&self.password, "password")?;
        if let Some(host) = &self.smtp_host {
            require_non_blank(host, "smtpHost")?;
        }
        if let Some(port) = self.smtp_port {
            validate_port(port)?;
        }
        normalize_email(&self.email)
    }
}

impl UpdateSenderEmail {
    /// Check every provided field. Returns the normalized email when one was given.
    pub fn validate(&self) -> AppResult<Option<String>> {
        if let Some(name) = &self.display_name {
            require_non_blank(name, "displayName")?;
        }
        if let Some(password) = &self.password {
            require_non_blank(password, "password")?;
        }
        if let Some(host) = &self.smtp_host {
            require_non_blank(host, "smtpHost")?;
        }
        if let Some(port) = self.smtp_port {
            validate_port(port)?;
        }
        self.email.as_deref().map(normalize_email).transpose()
    }
}

// Keep plaintext passwords out of logs.
impl fmt::Debug for CreateSenderEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateSenderEmail")
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("is_default", &self.is_default)
            .field("is_active", &self.is_active)
            .finish()
    }
}

impl fmt::Debug for UpdateSenderEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateSenderEmail")
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("is_default", &self.is_default)
            .field("is_active", &self.is_active)
            .finish()
    }
}
