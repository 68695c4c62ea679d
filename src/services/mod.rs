pub mod init;
pub mod itinerary;
pub mod seed;
pub mod sender_emails;
