use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// Intermediate structure for reading from DB (enumerations stored as text)
#[derive(sqlx::FromRow)]
struct RowTourDay {
    id: String,
    day: i64,
    date: String,
    date_obj: chrono::NaiveDate,
    title: String,
    location: String,
    status: String,
    is_active: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl RowTourDay {
    fn into_model(self, events: Vec<TimelineEvent>) -> AppResult<TourDay> {
        Ok(TourDay {
            id: self.id,
            day: self.day,
            date: self.date,
            date_obj: self.date_obj,
            title: self.title,
            location: self.location,
            status: self.status.parse()?,
            events,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Clone, Copy)]
enum DayKey<'a> {
    Id(&'a str),
    Day(i64),
}

fn event_from_row(r: &SqliteRow) -> AppResult<TimelineEvent> {
    Ok(TimelineEvent {
        id: r.try_get("id")?,
        time: r.try_get("time")?,
        title: r.try_get("title")?,
        description: r.try_get("description")?,
        event_type: r.try_get::<String, _>("event_type")?.parse()?,
        status: r.try_get::<String, _>("status")?.parse()?,
    })
}

fn day_conflict(err: AppError, day: i64) -> AppError {
    match err {
        AppError::Conflict(_) => AppError::Conflict(format!("Day {} already exists", day)),
        other => other,
    }
}

// ============================================================================
// Tour Day Repository
// ============================================================================

/// Persists tour days together with their embedded timeline events.
///
/// Events are only ever written through their parent and are returned in
/// insertion order. Canonical read order for days is `day` ascending.
pub struct TourDayRepository;

impl TourDayRepository {
    pub async fn create(pool: &SqlitePool, input: CreateTourDay) -> AppResult<TourDay> {
        input.validate()?;

        let number = input.day;
        let mut tx = pool.begin().await?;
        let day = Self::insert_in(&mut tx, input, Utc::now().naive_utc())
            .await
            .map_err(|e| day_conflict(e, number))?;
        tx.commit().await?;

        tracing::debug!("Created tour day {} with {} event(s)", day.day, day.events.len());
        Ok(day)
    }

    /// Delete every tour day and insert `days` in one transaction.
    ///
    /// Destructive: intended for seed tooling only.
    pub async fn bulk_replace(
        pool: &SqlitePool,
        days: Vec<CreateTourDay>,
    ) -> AppResult<Vec<TourDay>> {
        validate_batch(&days)?;

        let now = Utc::now().naive_utc();
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM timeline_events")
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query("DELETE FROM tour_days")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let mut inserted = Vec::with_capacity(days.len());
        for input in days {
            inserted.push(Self::insert_in(&mut tx, input, now).await?);
        }

        tx.commit().await?;

        tracing::info!(
            "Replaced itinerary: removed {} day(s), inserted {}",
            removed,
            inserted.len()
        );
        inserted.sort_by_key(|d| d.day);
        Ok(inserted)
    }

    /// All tour days sorted by `day` ascending, each with its events in order.
    pub async fn list(pool: &SqlitePool, active_only: bool) -> AppResult<Vec<TourDay>> {
        let rows = sqlx::query_as::<_, RowTourDay>(
            r#"
            SELECT
                id, day, date, date_obj, title, location,
                status, is_active, created_at, updated_at
            FROM tour_days
            WHERE (? = 0 OR is_active = 1)
            ORDER BY day ASC
            "#,
        )
        .bind(active_only)
        .fetch_all(pool)
        .await?;

        let event_rows = sqlx::query(
            r#"
            SELECT e.id, e.tour_day_id, e.time, e.title, e.description, e.event_type, e.status
            FROM timeline_events e
            JOIN tour_days d ON d.id = e.tour_day_id
            WHERE (? = 0 OR d.is_active = 1)
            ORDER BY e.tour_day_id, e.position ASC
            "#,
        )
        .bind(active_only)
        .fetch_all(pool)
        .await?;

        let mut events_by_day: HashMap<String, Vec<TimelineEvent>> = HashMap::new();
        for r in &event_rows {
            let day_id: String = r.try_get("tour_day_id")?;
            events_by_day
                .entry(day_id)
                .or_default()
                .push(event_from_row(r)?);
        }

        rows.into_iter()
            .map(|row| {
                let events = events_by_day.remove(&row.id).unwrap_or_default();
                row.into_model(events)
            })
            .collect()
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<TourDay>> {
        let mut conn = pool.acquire().await?;
        Self::fetch_in(&mut conn, DayKey::Id(id)).await
    }

    pub async fn find_by_day(pool: &SqlitePool, day: i64) -> AppResult<Option<TourDay>> {
        let mut conn = pool.acquire().await?;
        Self::fetch_in(&mut conn, DayKey::Day(day)).await
    }

    /// Update header fields of a tour day. Events are left untouched.
    pub async fn update(pool: &SqlitePool, id: &str, update: UpdateTourDay) -> AppResult<TourDay> {
        update.validate()?;

        let now = Utc::now().naive_utc();
        let mut tx = pool.begin().await?;

        // Absent fields keep their stored values through COALESCE.
        let touched = sqlx::query(
            r#"
            UPDATE tour_days
            SET day = COALESCE(?, day),
                date = COALESCE(?, date),
                date_obj = COALESCE(?, date_obj),
                title = COALESCE(?, title),
                location = COALESCE(?, location),
                status = COALESCE(?, status),
                is_active = COALESCE(?, is_active),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.day)
        .bind(update.date.as_deref().map(str::trim))
        .bind(update.date_obj)
        .bind(update.title.as_deref().map(str::trim))
        .bind(update.location.as_deref().map(str::trim))
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.is_active)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| day_conflict(e.into(), update.day.unwrap_or_default()))?
        .rows_affected();
        if touched == 0 {
            return Err(AppError::NotFound(format!("Tour day {} not found", id)));
        }

        let updated = Self::fetch_in(&mut tx, DayKey::Id(id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tour day {} not found", id)))?;
        tx.commit().await?;

        tracing::debug!("Updated tour day {}", updated.day);
        Ok(updated)
    }

    /// Soft delete: the record stays but `is_active` becomes false.
    pub async fn deactivate(pool: &SqlitePool, id: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE tour_days SET is_active = 0, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now().naive_utc())
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tour day {} not found", id)));
        }
        tracing::info!("Deactivated tour day {}", id);
        Ok(())
    }

    /// Append an event at the end of a day's timeline.
    pub async fn add_event(
        pool: &SqlitePool,
        day_id: &str,
        input: CreateTimelineEvent,
    ) -> AppResult<TimelineEvent> {
        input.validate()?;

        let now = Utc::now().naive_utc();
        let mut tx = pool.begin().await?;

        let touched = sqlx::query("UPDATE tour_days SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(day_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if touched == 0 {
            return Err(AppError::NotFound(format!("Tour day {} not found", day_id)));
        }

        let next: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM timeline_events WHERE tour_day_id = ?",
        )
        .bind(day_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut events = Self::insert_events_in(&mut tx, day_id, next, vec![input]).await?;
        tx.commit().await?;

        events
            .pop()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("event insert returned nothing")))
    }

    pub async fn set_event_status(
        pool: &SqlitePool,
        event_id: &str,
        status: EventStatus,
    ) -> AppResult<()> {
        let now = Utc::now().naive_utc();
        let mut tx = pool.begin().await?;

        let day_id: Option<String> = sqlx::query_scalar(
            "UPDATE timeline_events SET status = ? WHERE id = ? RETURNING tour_day_id",
        )
        .bind(status.as_str())
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;
        let day_id = day_id
            .ok_or_else(|| AppError::NotFound(format!("Timeline event {} not found", event_id)))?;

        sqlx::query("UPDATE tour_days SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(&day_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!("Timeline event {} is now {}", event_id, status);
        Ok(())
    }

    async fn insert_in(
        conn: &mut SqliteConnection,
        input: CreateTourDay,
        now: NaiveDateTime,
    ) -> AppResult<TourDay> {
        let id = Uuid::new_v4().to_string();

        let row = sqlx::query_as::<_, RowTourDay>(
            r#"
            INSERT INTO tour_days (
                id, day, date, date_obj, title, location,
                status, is_active, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id, day, date, date_obj, title, location,
                status, is_active, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(input.day)
        .bind(input.date.trim())
        .bind(input.date_obj)
        .bind(input.title.trim())
        .bind(input.location.trim())
        .bind(input.status.as_str())
        .bind(input.is_active)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        let events = Self::insert_events_in(conn, &id, 0, input.events).await?;
        row.into_model(events)
    }

    async fn insert_events_in(
        conn: &mut SqliteConnection,
        day_id: &str,
        first_position: i64,
        events: Vec<CreateTimelineEvent>,
    ) -> AppResult<Vec<TimelineEvent>> {
        let mut inserted = Vec::with_capacity(events.len());
        for (offset, input) in events.into_iter().enumerate() {
            let event = TimelineEvent {
                id: Uuid::new_v4().to_string(),
                time: input.time.trim().to_string(),
                title: input.title.trim().to_string(),
                description: input.description.trim().to_string(),
                event_type: input.event_type,
                status: input.status,
            };

            sqlx::query(
                r#"
                INSERT INTO timeline_events (
                    id, tour_day_id, position, time, title, description, event_type, status
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&event.id)
            .bind(day_id)
            .bind(first_position + offset as i64)
            .bind(&event.time)
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.event_type.as_str())
            .bind(event.status.as_str())
            .execute(&mut *conn)
            .await?;

            inserted.push(event);
        }
        Ok(inserted)
    }

    async fn fetch_in(conn: &mut SqliteConnection, key: DayKey<'_>) -> AppResult<Option<TourDay>> {
        let row = match key {
            DayKey::Id(id) => {
                sqlx::query_as::<_, RowTourDay>(
                    r#"
                    SELECT
                        id, day, date, date_obj, title, location,
                        status, is_active, created_at, updated_at
                    FROM tour_days
                    WHERE id = ?
                    "#,
                )
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
            }
            DayKey::Day(day) => {
                sqlx::query_as::<_, RowTourDay>(
                    r#"
                    SELECT
                        id, day, date, date_obj, title, location,
                        status, is_active, created_at, updated_at
                    FROM tour_days
                    WHERE day = ?
                    "#,
                )
                .bind(day)
                .fetch_optional(&mut *conn)
                .await?
            }
        };

        let Some(row) = row else {
            return Ok(None);
        };

        let event_rows = sqlx::query(
            r#"
            SELECT id, time, title, description, event_type, status
            FROM timeline_events
            WHERE tour_day_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(&row.id)
        .fetch_all(&mut *conn)
        .await?;

        let events = event_rows
            .iter()
            .map(event_from_row)
            .collect::<AppResult<Vec<_>>>()?;
        row.into_model(events).map(Some)
    }
}
