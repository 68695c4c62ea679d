use chrono::{NaiveDateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::config::{DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT};
use crate::crypto::CredentialCipher;
use crate::db::models::*;
use crate::db::UserRepository;
use crate::error::{AppError, AppResult};

// ============================================================================
// Sender Email Repository
// ============================================================================

/// Persists sender configurations and keeps at most one of them marked default.
///
/// Every write that leaves a record with `is_default = true` clears the flag on
/// all other records inside the same transaction.
pub struct SenderEmailRepository;

impl SenderEmailRepository {
    pub async fn create(
        pool: &SqlitePool,
        cipher: &CredentialCipher,
        created_by: &str,
        input: CreateSenderEmail,
    ) -> AppResult<SenderEmail> {
        let email = input.validate()?;

        if UserRepository::find_by_id(pool, created_by).await?.is_none() {
            return Err(AppError::Validation(format!(
                "createdBy does not reference an existing user: {}",
                created_by
            )));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();
        let password_encrypted = cipher.seal(&input.password)?;
        let smtp_host = input
            .smtp_host
            .as_deref()
            .map(str::trim)
            .unwrap_or(DEFAULT_SMTP_HOST)
            .to_string();
        let smtp_port = input.smtp_port.unwrap_or(DEFAULT_SMTP_PORT);

        // The insert is the first statement so the write lock is taken before any read.
        let mut tx = pool.begin().await?;

        let record = sqlx::query_as::<_, SenderEmail>(
            r#"
            INSERT INTO sender_emails (
                id, display_name, email, password_encrypted,
                smtp_host, smtp_port, is_default, is_active,
                created_by, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id, display_name, email, password_encrypted,
                smtp_host, smtp_port, is_default, is_active,
                created_by, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(input.display_name.trim())
        .bind(&email)
        .bind(&password_encrypted)
        .bind(&smtp_host)
        .bind(smtp_port)
        .bind(input.is_default)
        .bind(input.is_active)
        .bind(created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| email_conflict(e, &email))?;

        if record.is_default {
            Self::set_as_default_in(&mut tx, &record.id, now).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Created sender email {} ({}), default={}",
            record.id,
            record.email,
            record.is_default
        );
        Ok(record)
    }

    /// Apply a partial update. Missing fields keep their stored values.
    pub async fn update(
        pool: &SqlitePool,
        cipher: &CredentialCipher,
        id: &str,
        update: UpdateSenderEmail,
    ) -> AppResult<SenderEmail> {
        let new_email = update.validate()?;
        let now = Utc::now().naive_utc();
        let password_encrypted = update
            .password
            .as_deref()
            .map(|p| cipher.seal(p))
            .transpose()?;

        let mut tx = pool.begin().await?;

        // Absent fields keep their stored values through COALESCE.
        let record = sqlx::query_as::<_, SenderEmail>(
            r#"
            UPDATE sender_emails
            SET display_name = COALESCE(?, display_name),
                email = COALESCE(?, email),
                password_encrypted = COALESCE(?, password_encrypted),
                smtp_host = COALESCE(?, smtp_host),
                smtp_port = COALESCE(?, smtp_port),
                is_default = COALESCE(?, is_default),
                is_active = COALESCE(?, is_active),
                updated_at = ?
            WHERE id = ?
            RETURNING
                id, display_name, email, password_encrypted,
                smtp_host, smtp_port, is_default, is_active,
                created_by, created_at, updated_at
            "#,
        )
        .bind(update.display_name.as_deref().map(str::trim))
        .bind(new_email.as_deref())
        .bind(password_encrypted.as_deref())
        .bind(update.smtp_host.as_deref().map(str::trim))
        .bind(update.smtp_port)
        .bind(update.is_default)
        .bind(update.is_active)
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| email_conflict(e, new_email.as_deref().unwrap_or_default()))?
        .ok_or_else(|| AppError::NotFound(format!("Sender email {} not found", id)))?;

        if record.is_default {
            Self::set_as_default_in(&mut tx, &record.id, now).await?;
        }

        tx.commit().await?;

        tracing::debug!("Updated sender email {}", record.id);
        Ok(record)
    }

    /// Mark `id` as the default sender and clear the flag everywhere else.
    pub async fn set_as_default(pool: &SqlitePool, id: &str) -> AppResult<SenderEmail> {
        let now = Utc::now().naive_utc();
        let mut tx = pool.begin().await?;

        Self::set_as_default_in(&mut tx, id, now).await?;
        let record = Self::fetch_in(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Sender email {} not found", id)))?;

        tx.commit().await?;

        tracing::info!("Sender email {} is now the default", id);
        Ok(record)
    }

    /// Bulk-clear `is_default` on every record except `keep_id`.
    ///
    /// Only rows that are still flagged are touched, so a repeated call is a no-op.
    pub async fn clear_other_defaults(
        conn: &mut SqliteConnection,
        keep_id: &str,
        now: NaiveDateTime,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE sender_emails
            SET is_default = 0,
                updated_at = ?
            WHERE id != ? AND is_default = 1
            "#,
        )
        .bind(now)
        .bind(keep_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() > 0 {
            tracing::debug!(
                "Cleared default flag on {} other sender email(s)",
                result.rows_affected()
            );
        }
        Ok(result.rows_affected())
    }

    async fn set_as_default_in(
        conn: &mut SqliteConnection,
        id: &str,
        now: NaiveDateTime,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sender_emails
            SET is_default = 1,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Sender email {} not found", id)));
        }

        Self::clear_other_defaults(conn, id, now).await?;
        Ok(())
    }

    async fn fetch_in(conn: &mut SqliteConnection, id: &str) -> AppResult<Option<SenderEmail>> {
        let record = sqlx::query_as::<_, SenderEmail>(
            r#"
            SELECT
                id, display_name, email, password_encrypted,
                smtp_host, smtp_port, is_default, is_active,
                created_by, created_at, updated_at
            FROM sender_emails
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(record)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<SenderEmail>> {
        let mut conn = pool.acquire().await?;
        Self::fetch_in(&mut conn, id).await
    }

    /// Lookup is case-insensitive because stored addresses are lowercase.
    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<SenderEmail>> {
        let record = sqlx::query_as::<_, SenderEmail>(
            r#"
            SELECT
                id, display_name, email, password_encrypted,
                smtp_host, smtp_port, is_default, is_active,
                created_by, created_at, updated_at
            FROM sender_emails
            WHERE email = ?
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// The active default sender, if any.
    pub async fn find_default(pool: &SqlitePool) -> AppResult<Option<SenderEmail>> {
        let record = sqlx::query_as::<_, SenderEmail>(
            r#"
            SELECT
                id, display_name, email, password_encrypted,
                smtp_host, smtp_port, is_default, is_active,
                created_by, created_at, updated_at
            FROM sender_emails
            WHERE is_default = 1 AND is_active = 1
            "#,
        )
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    pub async fn list(pool: &SqlitePool) -> AppResult<Vec<SenderEmail>> {
        let records = sqlx::query_as::<_, SenderEmail>(
            r#"
            SELECT
                id, display_name, email, password_encrypted,
                smtp_host, smtp_port, is_default, is_active,
                created_by, created_at, updated_at
            FROM sender_emails
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    pub async fn count_defaults(pool: &SqlitePool) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sender_emails WHERE is_default = 1")
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM sender_emails WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Sender email {} not found", id)));
        }
        Ok(())
    }
}

fn email_conflict(err: sqlx::Error, email: &str) -> AppError {
    match AppError::from(err) {
        AppError::Conflict(_) => {
            AppError::Conflict(format!("Sender email {} already exists", email))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::TEST_KEY;
    use crate::db::testing::memory_pool;

    async fn owner(pool: &SqlitePool) -> String {
        UserRepository::create(
            pool,
            CreateUser {
                display_name: "Coordinator".to_string(),
                email: "coordinator@tours.example".to_string(),
            },
        )
        .await
        .unwrap()
        .id
    }

    fn cipher() -> CredentialCipher {
        CredentialCipher::from_hex_key(TEST_KEY).unwrap()
    }

    #[tokio::test]
    async fn create_applies_defaults_and_seals_password() {
        let pool = memory_pool().await;
        let user = owner(&pool).await;
        let cipher = cipher();

        let record = SenderEmailRepository::create(
            &pool,
            &cipher,
            &user,
            CreateSenderEmail::new("Tours", "Bookings@Tours.example", "app-pass"),
        )
        .await
        .unwrap();

        assert_eq!(record.email, "bookings@tours.example");
        assert_eq!(record.smtp_host, "smtp.gmail.com");
        assert_eq!(record.smtp_port, 465);
        assert!(!record.is_default);
        assert!(record.is_active);
        assert_ne!(record.password_encrypted, "app-pass");
        assert_eq!(cipher.open(&record.password_encrypted).unwrap(), "app-pass");
    }

    #[tokio::test]
    async fn second_default_clears_the_first() {
        let pool = memory_pool().await;
        let user = owner(&pool).await;
        let cipher = cipher();

        let a = SenderEmailRepository::create(
            &pool,
            &cipher,
            &user,
            CreateSenderEmail::new("A", "a@tours.example", "pw").as_default(),
        )
        .await
        .unwrap();
        let b = SenderEmailRepository::create(
            &pool,
            &cipher,
            &user,
            CreateSenderEmail::new("B", "b@tours.example", "pw").as_default(),
        )
        .await
        .unwrap();

        let a = SenderEmailRepository::find_by_id(&pool, &a.id).await.unwrap().unwrap();
        assert!(!a.is_default);
        assert!(b.is_default);
        assert_eq!(SenderEmailRepository::count_defaults(&pool).await.unwrap(), 1);
        assert_eq!(
            SenderEmailRepository::find_default(&pool).await.unwrap().unwrap().id,
            b.id
        );
    }

    #[tokio::test]
    async fn non_default_write_leaves_others_alone() {
        let pool = memory_pool().await;
        let user = owner(&pool).await;
        let cipher = cipher();

        let a = SenderEmailRepository::create(
            &pool,
            &cipher,
            &user,
            CreateSenderEmail::new("A", "a@tours.example", "pw").as_default(),
        )
        .await
        .unwrap();
        SenderEmailRepository::create(
            &pool,
            &cipher,
            &user,
            CreateSenderEmail::new("B", "b@tours.example", "pw"),
        )
        .await
        .unwrap();

        let a_after = SenderEmailRepository::find_by_id(&pool, &a.id).await.unwrap().unwrap();
        assert!(a_after.is_default);
        assert_eq!(a_after.updated_at, a.updated_at);
    }

    #[tokio::test]
    async fn at_most_one_default_after_every_write() {
        let pool = memory_pool().await;
        let user = owner(&pool).await;
        let cipher = cipher();

        let mut ids = Vec::new();
        for (i, default) in [true, false, true, true, false].into_iter().enumerate() {
            let mut input = CreateSenderEmail::new("S", &format!("s{}@tours.example", i), "pw");
            input.is_default = default;
            let rec = SenderEmailRepository::create(&pool, &cipher, &user, input)
                .await
                .unwrap();
            ids.push(rec.id);
            assert!(SenderEmailRepository::count_defaults(&pool).await.unwrap() <= 1);
        }

        for id in &ids {
            SenderEmailRepository::update(
                &pool,
                &cipher,
                id,
                UpdateSenderEmail {
                    is_default: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
            assert_eq!(SenderEmailRepository::count_defaults(&pool).await.unwrap(), 1);
        }

        SenderEmailRepository::update(
            &pool,
            &cipher,
            &ids[4],
            UpdateSenderEmail {
                is_default: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(SenderEmailRepository::count_defaults(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clearing_other_defaults_is_idempotent() {
        let pool = memory_pool().await;
        let user = owner(&pool).await;
        let cipher = cipher();

        let a = SenderEmailRepository::create(
            &pool,
            &cipher,
            &user,
            CreateSenderEmail::new("A", "a@tours.example", "pw").as_default(),
        )
        .await
        .unwrap();
        let b = SenderEmailRepository::create(
            &pool,
            &cipher,
            &user,
            CreateSenderEmail::new("B", "b@tours.example", "pw"),
        )
        .await
        .unwrap();

        // The pool has a single connection, so release it before reading back.
        let now = Utc::now().naive_utc();
        let mut conn = pool.acquire().await.unwrap();
        let first = SenderEmailRepository::clear_other_defaults(&mut conn, &b.id, now)
            .await
            .unwrap();
        drop(conn);
        let after_first = SenderEmailRepository::list(&pool).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let second = SenderEmailRepository::clear_other_defaults(&mut conn, &b.id, now)
            .await
            .unwrap();
        drop(conn);
        let after_second = SenderEmailRepository::list(&pool).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 0);
        let flags = |v: &[SenderEmail]| {
            v.iter()
                .map(|r| (r.id.clone(), r.is_default, r.updated_at))
                .collect::<Vec<_>>()
        };
        assert_eq!(flags(&after_first), flags(&after_second));
        assert!(after_second.iter().all(|r| !r.is_default));
        assert!(after_second.iter().any(|r| r.id == a.id));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict_regardless_of_case() {
        let pool = memory_pool().await;
        let user = owner(&pool).await;
        let cipher = cipher();

        SenderEmailRepository::create(
            &pool,
            &cipher,
            &user,
            CreateSenderEmail::new("A", "ops@tours.example", "pw"),
        )
        .await
        .unwrap();
        let err = SenderEmailRepository::create(
            &pool,
            &cipher,
            &user,
            CreateSenderEmail::new("A2", "OPS@Tours.Example", "pw"),
        )
        .await
        .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(SenderEmailRepository::list(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_to_taken_email_conflicts() {
        let pool = memory_pool().await;
        let user = owner(&pool).await;
        let cipher = cipher();

        SenderEmailRepository::create(
            &pool,
            &cipher,
            &user,
            CreateSenderEmail::new("A", "a@tours.example", "pw"),
        )
        .await
        .unwrap();
        let b = SenderEmailRepository::create(
            &pool,
            &cipher,
            &user,
            CreateSenderEmail::new("B", "b@tours.example", "pw"),
        )
        .await
        .unwrap();

        let err = SenderEmailRepository::update(
            &pool,
            &cipher,
            &b.id,
            UpdateSenderEmail {
                email: Some("A@tours.example".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn update_keeps_unspecified_fields_and_bumps_timestamp() {
        let pool = memory_pool().await;
        let user = owner(&pool).await;
        let cipher = cipher();

        let rec = SenderEmailRepository::create(
            &pool,
            &cipher,
            &user,
            CreateSenderEmail::new("A", "a@tours.example", "old-pw"),
        )
        .await
        .unwrap();

        let updated = SenderEmailRepository::update(
            &pool,
            &cipher,
            &rec.id,
            UpdateSenderEmail {
                password: Some("new-pw".to_string()),
                smtp_port: Some(587),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.display_name, "A");
        assert_eq!(updated.email, "a@tours.example");
        assert_eq!(updated.smtp_port, 587);
        assert_eq!(updated.created_at, rec.created_at);
        assert!(updated.updated_at >= rec.updated_at);
        assert_eq!(cipher.open(&updated.password_encrypted).unwrap(), "new-pw");
    }

    #[tokio::test]
    async fn missing_owner_is_rejected() {
        let pool = memory_pool().await;
        let err = SenderEmailRepository::create(
            &pool,
            &cipher(),
            "no-such-user",
            CreateSenderEmail::new("A", "a@tours.example", "pw"),
        )
        .await
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn invalid_email_is_rejected_before_write() {
        let pool = memory_pool().await;
        let user = owner(&pool).await;
        let err = SenderEmailRepository::create(
            &pool,
            &cipher(),
            &user,
            CreateSenderEmail::new("A", "not-an-address", "pw"),
        )
        .await
        .unwrap_err();
        assert!(err.is_validation());
        assert!(SenderEmailRepository::list(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let pool = memory_pool().await;
        let cipher = cipher();

        assert!(SenderEmailRepository::set_as_default(&pool, "nope")
            .await
            .unwrap_err()
            .is_not_found());
        assert!(SenderEmailRepository::delete(&pool, "nope")
            .await
            .unwrap_err()
            .is_not_found());
        assert!(
            SenderEmailRepository::update(&pool, &cipher, "nope", UpdateSenderEmail::default())
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn set_as_default_moves_the_flag() {
        let pool = memory_pool().await;
        let user = owner(&pool).await;
        let cipher = cipher();

        let a = SenderEmailRepository::create(
            &pool,
            &cipher,
            &user,
            CreateSenderEmail::new("A", "a@tours.example", "pw").as_default(),
        )
        .await
        .unwrap();
        assert!(a.is_default);
        let b = SenderEmailRepository::create(
            &pool,
            &cipher,
            &user,
            CreateSenderEmail::new("B", "b@tours.example", "pw"),
        )
        .await
        .unwrap();

        let b = SenderEmailRepository::set_as_default(&pool, &b.id).await.unwrap();
        assert!(b.is_default);
        let a = SenderEmailRepository::find_by_email(&pool, "A@TOURS.example")
            .await
            .unwrap()
            .unwrap();
        assert!(!a.is_default);
        assert_eq!(SenderEmailRepository::count_defaults(&pool).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_default_writes_on_a_shared_file_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let pool = crate::services::init::init_db(&crate::config::DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("tours.db").display()),
            max_connections: 8,
        })
        .await
        .unwrap();
        let user = owner(&pool).await;
        let cipher = cipher();

        let mut handles = Vec::new();
        for n in 0..16 {
            let pool = pool.clone();
            let cipher = cipher.clone();
            let user = user.clone();
            handles.push(tokio::spawn(async move {
                SenderEmailRepository::create(
                    &pool,
                    &cipher,
                    &user,
                    CreateSenderEmail::new(
                        &format!("Desk {}", n),
                        &format!("desk{}@tours.example", n),
                        "pw",
                    )
                    .as_default(),
                )
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(SenderEmailRepository::list(&pool).await.unwrap().len(), 16);
        assert_eq!(SenderEmailRepository::count_defaults(&pool).await.unwrap(), 1);
    }
}
