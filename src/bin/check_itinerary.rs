//! Print the stored itinerary in day order followed by summary counts.

use tour_store::config::Config;
use tour_store::services::init;
use tour_store::services::itinerary::ItineraryService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init::init_tracing();

    let database = Config::database_from_env()?;
    let pool = init::init_db(&database).await?;

    let days = ItineraryService::sorted_days(&pool).await?;
    if days.is_empty() {
        tracing::warn!("No tour days stored; run seed-itinerary first");
    }

    for day in &days {
        let marker = if day.is_active { "" } else { " (inactive)" };
        println!(
            "Day {} - {} - {} @ {} [{}]{}",
            day.day, day.date, day.title, day.location, day.status, marker
        );
        for event in &day.events {
            println!(
                "    {:>5}  {:<14} {:<10} {}",
                event.time, event.event_type, event.status, event.title
            );
        }
    }

    let summary = ItineraryService::summarize(&days);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    pool.close().await;
    Ok(())
}
