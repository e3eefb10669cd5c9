// src/services.rs

pub mod allocation;
pub mod auth;
pub mod availability;
pub mod booking;
pub mod manager;
pub mod pricing;
pub mod profile;
pub mod search;

pub use auth::AuthService;
pub use availability::AvailabilityService;
pub use booking::BookingService;
pub use manager::ManagerService;
pub use profile::ProfileService;
pub use search::SearchService;
