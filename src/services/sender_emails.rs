use crate::db::{CreateSenderEmail, SenderEmail, SenderEmailRepository, UpdateSenderEmail};
use crate::error::{AppError, AppResult};
use crate::AppState;

/// Sender record paired with its decrypted password, for the mail transport.
pub struct SenderCredentials {
    pub sender: SenderEmail,
    pub password: String,
}

pub struct SenderEmailService;

impl SenderEmailService {
    /// Create a sender, filling host and port from configuration when absent.
    pub async fn create(
        state: &AppState,
        created_by: &str,
        mut input: CreateSenderEmail,
    ) -> AppResult<SenderEmail> {
        let defaults = &state.config.sender;
        if input.smtp_host.is_none() {
            input.smtp_host = Some(defaults.default_smtp_host.clone());
        }
        if input.smtp_port.is_none() {
            input.smtp_port = Some(defaults.default_smtp_port);
        }
        SenderEmailRepository::create(&state.db, &state.cipher, created_by, input).await
    }

    pub async fn update(
        state: &AppState,
        id: &str,
        update: UpdateSenderEmail,
    ) -> AppResult<SenderEmail> {
        SenderEmailRepository::update(&state.db, &state.cipher, id, update).await
    }

    pub async fn set_as_default(state: &AppState, id: &str) -> AppResult<SenderEmail> {
        SenderEmailRepository::set_as_default(&state.db, id).await
    }

    /// Credentials for `id`, or for the default sender when `id` is `None`.
    pub async fn credentials(state: &AppState, id: Option<&str>) -> AppResult<SenderCredentials> {
        let sender = match id {
            Some(id) => SenderEmailRepository::find_by_id(&state.db, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Sender email {} not found", id)))?,
            None => SenderEmailRepository::find_default(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound("No default sender email".to_string()))?,
        };

        if !sender.is_active {
            return Err(AppError::Validation(format!(
                "Sender email {} is inactive",
                sender.email
            )));
        }

        let password = state.cipher.open(&sender.password_encrypted)?;
        Ok(SenderCredentials { sender, password })
    }
}
