use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::{validate_batch, CreateTourDay, TourDay, TourDayRepository};
use crate::error::AppResult;

pub struct ItineraryService;

/// Counts reported by the inspect tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItinerarySummary {
    pub days: usize,
    pub active_days: usize,
    pub events: usize,
    pub events_by_type: BTreeMap<String, usize>,
    pub events_by_status: BTreeMap<String, usize>,
    pub days_by_status: BTreeMap<String, usize>,
}

impl ItineraryService {
    /// Validate the whole set first, then swap the stored itinerary for it.
    pub async fn replace_all(
        pool: &SqlitePool,
        days: Vec<CreateTourDay>,
    ) -> AppResult<Vec<TourDay>> {
        if let Err(e) = validate_batch(&days) {
            tracing::warn!("Rejected itinerary replacement: {}", e);
            return Err(e);
        }
        TourDayRepository::bulk_replace(pool, days).await
    }

    /// Days in canonical order (`day` ascending).
    pub async fn sorted_days(pool: &SqlitePool) -> AppResult<Vec<TourDay>> {
        TourDayRepository::list(pool, false).await
    }

    pub fn summarize(days: &[TourDay]) -> ItinerarySummary {
        let mut summary = ItinerarySummary {
            days: days.len(),
            ..Default::default()
        };

        for day in days {
            if day.is_active {
                summary.active_days += 1;
            }
            *summary
                .days_by_status
                .entry(day.status.to_string())
                .or_default() += 1;

            for event in &day.events {
                summary.events += 1;
                *summary
                    .events_by_type
                    .entry(event.event_type.to_string())
                    .or_default() += 1;
                *summary
                    .events_by_status
                    .entry(event.status.to_string())
                    .or_default() += 1;
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::memory_pool;
    use crate::services::seed::sample_itinerary;

    #[tokio::test]
    async fn seeding_an_empty_store_yields_nine_sorted_days() {
        let pool = memory_pool().await;

        ItineraryService::replace_all(&pool, sample_itinerary())
            .await
            .unwrap();
        let days = ItineraryService::sorted_days(&pool).await.unwrap();

        assert_eq!(days.len(), 9);
        assert_eq!(
            days.iter().map(|d| d.day).collect::<Vec<_>>(),
            (1..=9).collect::<Vec<_>>()
        );
        assert_eq!(days[0].events.len(), 3);
        assert_eq!(days[8].events.len(), 1);
    }

    #[tokio::test]
    async fn replace_all_discards_previous_contents() {
        let pool = memory_pool().await;
        ItineraryService::replace_all(&pool, sample_itinerary())
            .await
            .unwrap();

        let shorter: Vec<_> = sample_itinerary().into_iter().take(2).collect();
        ItineraryService::replace_all(&pool, shorter).await.unwrap();

        let days = ItineraryService::sorted_days(&pool).await.unwrap();
        assert_eq!(days.len(), 2);
        let total_events: usize = days.iter().map(|d| d.events.len()).sum();
        assert_eq!(total_events, 7);
    }

    #[tokio::test]
    async fn invalid_batch_leaves_store_untouched() {
        let pool = memory_pool().await;
        ItineraryService::replace_all(&pool, sample_itinerary())
            .await
            .unwrap();

        let mut broken = sample_itinerary();
        broken[4].title = String::new();
        let err = ItineraryService::replace_all(&pool, broken).await.unwrap_err();
        assert!(err.is_validation());

        assert_eq!(ItineraryService::sorted_days(&pool).await.unwrap().len(), 9);
    }

    #[tokio::test]
    async fn summary_counts_sample() {
        let pool = memory_pool().await;
        let days = ItineraryService::replace_all(&pool, sample_itinerary())
            .await
            .unwrap();
        let summary = ItineraryService::summarize(&days);

        assert_eq!(summary.days, 9);
        assert_eq!(summary.active_days, 9);
        assert_eq!(summary.events, 30);
        assert_eq!(summary.events_by_type["industrial"], 5);
        assert_eq!(summary.events_by_type["completion"], 1);
        assert_eq!(summary.events_by_status["upcoming"], 30);
        assert_eq!(summary.days_by_status["upcoming"], 9);
    }
}
