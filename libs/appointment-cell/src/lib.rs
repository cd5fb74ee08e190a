pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use services::appointments::AppointmentService;
pub use services::booking::{BookingFlow, BookingService};
pub use services::calendar::{next_date_for, Clock, FixedClock, LocalClock};
pub use services::slots::SlotService;
