//! Fixed sample itinerary used by the seed tooling.

use chrono::NaiveDate;

use crate::db::models::{CreateTimelineEvent, CreateTourDay, EventType};

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap_or_default()
}

fn ev(time: &str, title: &str, event_type: EventType, description: &str) -> CreateTimelineEvent {
    CreateTimelineEvent::new(time, title, event_type).with_description(description)
}

/// Nine-day industrial study tour, days 1 through 9.
pub fn sample_itinerary() -> Vec<CreateTourDay> {
    vec![
        CreateTourDay::new(1, "Mon, 14 Apr", date(4, 14), "Departure & Arrival", "Shanghai")
            .with_event(ev(
                "06:30",
                "Flight departure",
                EventType::Departure,
                "Meet at terminal 2, check-in counter D",
            ))
            .with_event(ev(
                "14:10",
                "Arrive Shanghai Pudong",
                EventType::Arrival,
                "Coach transfer to the hotel",
            ))
            .with_event(ev(
                "17:00",
                "Hotel check-in",
                EventType::Accommodation,
                "Riverside hotel, Huangpu district",
            )),
        CreateTourDay::new(2, "Tue, 15 Apr", date(4, 15), "Port & Waterfront", "Shanghai")
            .with_event(ev("07:30", "Breakfast", EventType::Meal, ""))
            .with_event(ev(
                "09:00",
                "Yangshan deep-water port",
                EventType::Industrial,
                "Automated container terminal briefing",
            ))
            .with_event(ev("13:00", "Lunch", EventType::Meal, ""))
            .with_event(ev(
                "16:00",
                "The Bund walk",
                EventType::Sightseeing,
                "Guided walk along the waterfront",
            )),
        CreateTourDay::new(3, "Wed, 16 Apr", date(4, 16), "Electronics Manufacturing", "Suzhou")
            .with_event(ev("08:00", "Coach to Suzhou", EventType::Travel, "About 90 minutes"))
            .with_event(ev(
                "10:00",
                "Industrial park visit",
                EventType::Industrial,
                "SMT line and quality lab",
            ))
            .with_event(ev("12:30", "Lunch with hosts", EventType::Meal, ""))
            .with_event(ev("15:00", "Humble Administrator's Garden", EventType::Sightseeing, ""))
            .with_event(ev("18:30", "Hotel check-in", EventType::Accommodation, "")),
        CreateTourDay::new(4, "Thu, 17 Apr", date(4, 17), "Textiles & Canals", "Suzhou")
            .with_event(ev("09:00", "Silk factory tour", EventType::Industrial, ""))
            .with_event(ev("11:30", "Coffee break", EventType::Break, ""))
            .with_event(ev(
                "14:00",
                "Pingjiang Road",
                EventType::Leisure,
                "Free time in the old town",
            ))
            .with_event(ev("16:30", "Silk market", EventType::Shopping, "")),
        CreateTourDay::new(5, "Fri, 18 Apr", date(4, 18), "E-commerce Logistics", "Hangzhou")
            .with_event(ev("08:00", "High-speed rail to Hangzhou", EventType::Travel, ""))
            .with_event(ev(
                "10:30",
                "Fulfilment centre",
                EventType::Industrial,
                "Robotics in warehouse picking",
            ))
            .with_event(ev("15:00", "West Lake boat ride", EventType::Sightseeing, ""))
            .with_event(ev(
                "19:00",
                "Welcome dinner",
                EventType::Special,
                "Hosted by the regional chamber of commerce",
            )),
        CreateTourDay::new(6, "Sat, 19 Apr", date(4, 19), "Tea & Culture", "Hangzhou")
            .with_event(ev(
                "09:30",
                "Longjing tea plantation",
                EventType::Activity,
                "Tea picking and tasting",
            ))
            .with_event(ev("13:00", "Lunch", EventType::Meal, ""))
            .with_event(ev("15:00", "Afternoon at leisure", EventType::Leisure, "")),
        CreateTourDay::new(7, "Sun, 20 Apr", date(4, 20), "Transfer North", "Beijing")
            .with_event(ev("08:30", "Flight to Beijing", EventType::Travel, ""))
            .with_event(ev("12:00", "Hotel check-in", EventType::Accommodation, ""))
            .with_event(ev("15:00", "Forbidden City", EventType::Sightseeing, "")),
        CreateTourDay::new(8, "Mon, 21 Apr", date(4, 21), "Automotive Plant", "Beijing")
            .with_event(ev(
                "09:00",
                "EV assembly plant",
                EventType::Industrial,
                "Battery pack line and final assembly",
            ))
            .with_event(ev("14:00", "Great Wall at Mutianyu", EventType::Sightseeing, ""))
            .with_event(ev("19:30", "Farewell dinner", EventType::Special, "Peking duck banquet")),
        CreateTourDay::new(9, "Tue, 22 Apr", date(4, 22), "Return Home", "Beijing")
            .with_event(ev(
                "10:00",
                "Return flight",
                EventType::Completion,
                "Transfer to Beijing Capital airport",
            )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::validate_batch;

    #[test]
    fn sample_is_nine_consecutive_days() {
        let days = sample_itinerary();
        assert_eq!(days.len(), 9);
        let numbers: Vec<i64> = days.iter().map(|d| d.day).collect();
        assert_eq!(numbers, (1..=9).collect::<Vec<_>>());
        assert_eq!(days[0].events.len(), 3);
        assert_eq!(days[8].events.len(), 1);
    }

    #[test]
    fn sample_passes_validation() {
        assert!(validate_batch(&sample_itinerary()).is_ok());
    }
}
