pub mod appointments;
pub mod dashboard;
pub mod doctors;
pub mod schedule;
