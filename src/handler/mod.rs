pub mod appointments;
pub mod auth;
pub mod contractors;
pub mod jobs;
pub mod users;
