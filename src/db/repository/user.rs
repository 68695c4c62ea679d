use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// User Repository
// ============================================================================

pub struct UserRepository;

impl UserRepository {
    pub async fn create(pool: &SqlitePool, input: CreateUser) -> AppResult<User> {
        let email = input.validate()?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, display_name, email, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, display_name, email, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(input.display_name.trim())
        .bind(&email)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(format!("User {} already exists", email)),
            other => other,
        })?;

        tracing::debug!("Created user {} ({})", user.id, user.email);
        Ok(user)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, display_name, email, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}
