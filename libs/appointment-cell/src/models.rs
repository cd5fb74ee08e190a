use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shared_models::directory::Doctor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub id: i64,
    /// `HH:MM:SS` as stored by the backend.
    pub time: String,
}

impl AvailableSlot {
    /// The `HH:MM` form the booking endpoint expects.
    pub fn hhmm(&self) -> &str {
        self.time.get(..5).unwrap_or(&self.time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotQuery {
    #[serde(skip)]
    pub generation: u64,
    pub doctor_id: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: i64,
    pub hospital_id: i64,
    /// Weekday name; the backend resolves it to the next such date.
    pub day: String,
    /// `HH:MM`.
    pub time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentResponse {
    pub message: Option<String>,
    pub appointment_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientAppointment {
    pub id: i64,
    pub doctor_name: String,
    pub doctor_photo: Option<String>,
    pub doctor_specialty: Option<String>,
    pub doctor_address: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub cancelled: bool,
    pub payment: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayStatus {
    Cancelled,
    Booked,
    #[serde(rename = "Pending Payment")]
    PendingPayment,
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayStatus::Cancelled => write!(f, "Cancelled"),
            DisplayStatus::Booked => write!(f, "Booked"),
            DisplayStatus::PendingPayment => write!(f, "Pending Payment"),
        }
    }
}

impl PatientAppointment {
    pub fn display_status(&self) -> DisplayStatus {
        if self.cancelled {
            DisplayStatus::Cancelled
        } else if self.payment {
            DisplayStatus::Booked
        } else {
            DisplayStatus::PendingPayment
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentRow {
    #[serde(flatten)]
    pub appointment: PatientAppointment,
    pub status: DisplayStatus,
    pub can_pay: bool,
    pub can_cancel: bool,
}

impl From<PatientAppointment> for AppointmentRow {
    fn from(appointment: PatientAppointment) -> Self {
        let status = appointment.display_status();
        Self {
            can_pay: status == DisplayStatus::PendingPayment,
            can_cancel: status != DisplayStatus::Cancelled,
            status,
            appointment,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelAppointmentRequest {
    pub appointment_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelAppointmentResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum BookingStage {
    Idle,
    HospitalSelected,
    DaySelected,
    SlotsLoading,
    SlotsLoaded,
    SlotsEmpty,
    Submitting,
    Redirecting,
    /// Booked but the gateway hand-off failed; payment can be retried.
    AwaitingPayment { appointment_id: i64 },
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub doctor: Doctor,
    #[serde(flatten)]
    pub stage: BookingStage,
    pub hospital_id: Option<i64>,
    pub price: String,
    pub day: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub slots: Vec<AvailableSlot>,
    pub time_placeholder: &'static str,
    pub can_submit: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartBookingRequest {
    pub doctor: Option<Doctor>,
    pub doctor_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectHospitalRequest {
    pub hospital_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectDayRequest {
    pub day: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectTimeRequest {
    pub time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment(cancelled: bool, payment: bool) -> PatientAppointment {
        PatientAppointment {
            id: 1,
            doctor_name: "Dr. Heart".into(),
            doctor_photo: None,
            doctor_specialty: None,
            doctor_address: None,
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            time: "09:00".into(),
            cancelled,
            payment,
        }
    }

    #[test]
    fn display_status_prefers_cancellation() {
        assert_eq!(appointment(true, true).display_status(), DisplayStatus::Cancelled);
        assert_eq!(appointment(false, true).display_status(), DisplayStatus::Booked);
        assert_eq!(appointment(false, false).display_status(), DisplayStatus::PendingPayment);
        assert_eq!(DisplayStatus::PendingPayment.to_string(), "Pending Payment");
    }

    #[test]
    fn only_unpaid_rows_can_be_paid() {
        assert!(AppointmentRow::from(appointment(false, false)).can_pay);
        let cancelled = AppointmentRow::from(appointment(true, false));
        assert!(!cancelled.can_pay);
        assert!(!cancelled.can_cancel);
    }

    #[test]
    fn slot_time_is_trimmed_to_minutes() {
        assert_eq!(AvailableSlot { id: 1, time: "09:30:00".into() }.hhmm(), "09:30");
        assert_eq!(AvailableSlot { id: 2, time: "9:30".into() }.hhmm(), "9:30");
    }
}
