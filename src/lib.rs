//! Persistence layer for the tour management application.
//!
//! Two independent stores share one SQLite database:
//! - the itinerary store ([`db::TourDayRepository`]): tour days with their
//!   embedded, ordered timeline events;
//! - the sender identity store ([`db::SenderEmailRepository`]): outbound mail
//!   credentials, at most one of which is the default.

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod services;

use config::Config;
use crypto::CredentialCipher;

pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: Config,
    pub cipher: CredentialCipher,
}
