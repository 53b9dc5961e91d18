pub mod appointment_service;
pub mod directory_service;
pub mod error;
pub mod job_service;
