pub mod auth;
pub mod booking;
pub mod manager;
pub mod payment;
pub mod space;
