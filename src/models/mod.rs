pub mod booking;
pub mod catalog;
pub mod client;
pub mod prize;
pub mod rating;
pub mod schedule;
pub mod stats;

pub use booking::{Booking, BookingStatus};
pub use catalog::{Catalog, Service};
pub use client::Client;
pub use prize::{PrizeRecord, PrizeSpec, Rarity};
pub use rating::Rating;
pub use schedule::SlotAvailability;
pub use stats::UserStats;
