// src/handlers.rs

pub mod auth;
pub mod bookings;
pub mod drivers;
pub mod managers;
pub mod payments;
pub mod search;
pub mod slots;
pub mod spaces;
