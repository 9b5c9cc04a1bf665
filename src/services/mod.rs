pub mod automation;
pub mod clock;
pub mod loyalty;
pub mod random;
pub mod ratings;
pub mod reports;
pub mod scheduling;
