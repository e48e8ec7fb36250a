pub mod auth;
pub mod bookings;
pub mod devices;
pub mod inventory;
pub mod services;
pub mod settings;
pub mod tickets;
pub mod uploads;
