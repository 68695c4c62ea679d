//! Replace the stored itinerary with the built-in sample dataset.

use tour_store::config::Config;
use tour_store::services::init;
use tour_store::services::itinerary::ItineraryService;
use tour_store::services::seed::sample_itinerary;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init::init_tracing();

    let database = Config::database_from_env()?;
    let pool = init::init_db(&database).await?;

    let days = ItineraryService::replace_all(&pool, sample_itinerary()).await?;
    let events: usize = days.iter().map(|d| d.events.len()).sum();

    tracing::info!("Seeded {} tour day(s) with {} event(s)", days.len(), events);
    for day in &days {
        println!(
            "Day {:>2}  {:<12} {:<28} {} event(s)",
            day.day,
            day.date,
            day.title,
            day.events.len()
        );
    }

    pool.close().await;
    Ok(())
}
