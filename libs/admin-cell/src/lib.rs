pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use services::appointments::{AdminAppointmentService, AppointmentBoard, BoardService};
pub use services::dashboard::DashboardService;
pub use services::doctors::DoctorAdminService;
pub use services::schedule::{ScheduleEditor, ScheduleService};
