pub mod sender_email;
pub mod tour_day;
pub mod user;

pub use sender_email::SenderEmailRepository;
pub use tour_day::TourDayRepository;
pub use user::UserRepository;
