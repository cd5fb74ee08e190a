use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_backend::ImageUpload;
use shared_models::amount::Amount;
use shared_models::directory::{Doctor, Specialty};

// Appointments board

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Booked,
    Completed,
    Canceled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Booked => "booked",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminPatient {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
}

impl AdminPatient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminDoctorRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminAppointment {
    pub id: i64,
    pub patient: AdminPatient,
    pub doctor: AdminDoctorRef,
    pub hospital: Option<String>,
    pub appointment_datetime: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub payment_status: bool,
    pub payment_method: Option<String>,
    pub payment_amount: Option<Amount>,
}

/// Filters for the appointments board. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<bool>,
}

impl AppointmentFilters {
    pub fn is_empty(&self) -> bool {
        self.doctor_id.is_none() && self.status.is_none() && self.payment_status.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardRow {
    #[serde(flatten)]
    pub appointment: AdminAppointment,
    pub patient_name: String,
    /// Changed locally but the backend has not accepted the change.
    pub unconfirmed: bool,
}

impl From<AdminAppointment> for BoardRow {
    fn from(appointment: AdminAppointment) -> Self {
        Self {
            patient_name: appointment.patient.full_name(),
            appointment,
            unconfirmed: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub filters: AppointmentFilters,
    pub doctors: Vec<AdminDoctorRef>,
    pub rows: Vec<BoardRow>,
    pub loading: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdateRequest {
    pub appointment_id: i64,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: AppointmentStatus,
}

// Schedule editor

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayOption {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeOption {
    pub id: i64,
    pub time: String,
}

impl TimeOption {
    pub fn label(&self) -> &str {
        self.time.get(..5).unwrap_or(&self.time)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleOptions {
    #[serde(default)]
    pub days: Vec<DayOption>,
    #[serde(default)]
    pub times: Vec<TimeOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleIds {
    #[serde(default)]
    pub day_ids: Vec<i64>,
    #[serde(default)]
    pub time_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorScheduleResponse {
    pub doctor_name: String,
    #[serde(default)]
    pub all_options: ScheduleOptions,
    #[serde(default)]
    pub current_schedule: ScheduleIds,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleChip {
    pub id: i64,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleView {
    pub doctor_id: i64,
    pub doctor_name: String,
    pub days: Vec<ScheduleChip>,
    pub times: Vec<ScheduleChip>,
}

// Dashboard

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub hospital_name: String,
    pub todays_appointments_count: u64,
    pub upcoming_appointments_count: u64,
    pub todays_revenue: Amount,
    pub pending_payments_count: u64,
    #[serde(default)]
    pub todays_schedule: Vec<AdminAppointment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorCount {
    #[serde(rename(deserialize = "doctor__name"))]
    pub doctor_name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardCharts {
    #[serde(default)]
    pub appointments_by_doctor: Vec<DoctorCount>,
    #[serde(default)]
    pub appointments_by_status: Vec<StatusCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub stats: DashboardStats,
    pub charts: DashboardCharts,
}

// Doctor management

#[derive(Debug, Clone, Deserialize)]
pub struct NewDoctorRequest {
    pub name: String,
    pub email: String,
    /// Specialty id.
    pub specialty: i64,
    pub fees: String,
    #[serde(default)]
    pub about: String,
    pub opd_charge: String,
    pub nmc_no: String,
    pub password: String,
    pub photo: Option<ImageUpload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddExistingDoctorRequest {
    pub doctor_id: i64,
    pub opd_charge: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminActionResponse {
    pub success: Option<String>,
    pub message: Option<String>,
}

impl AdminActionResponse {
    pub fn text(self, fallback: &str) -> String {
        self.success.or(self.message).unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DoctorManagementView {
    pub unassigned: Vec<Doctor>,
    pub specialties: Vec<Specialty>,
}
