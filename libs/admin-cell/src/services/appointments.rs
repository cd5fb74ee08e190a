use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use auth_cell::SessionStore;
use shared_backend::BackendClient;
use shared_config::PortalConfig;
use shared_models::directory::Doctor;
use shared_models::error::AppError;

use crate::models::{
    AdminAppointment, AdminDoctorRef, AppointmentFilters, AppointmentStatus, BoardRow, BoardView,
    StatusUpdateRequest,
};

pub struct AdminAppointmentService {
    backend: BackendClient,
}

impl AdminAppointmentService {
    pub fn new(config: &PortalConfig) -> Self {
        Self { backend: BackendClient::new(config) }
    }

    pub async fn list(&self, filters: &AppointmentFilters, auth_token: &str) -> Result<Vec<AdminAppointment>, AppError> {
        debug!("Fetching hospital appointments with {:?}", filters);
        if filters.is_empty() {
            self.backend.get("admin/all-appointments/", Some(auth_token)).await
        } else {
            self.backend
                .get_with_query("admin/all-appointments/", filters, Some(auth_token))
                .await
        }
    }

    pub async fn doctors(&self, auth_token: &str) -> Result<Vec<AdminDoctorRef>, AppError> {
        let doctors: Vec<Doctor> = self.backend.get("doctors/", Some(auth_token)).await?;
        Ok(doctors
            .into_iter()
            .map(|d| AdminDoctorRef { id: d.id, name: d.name })
            .collect())
    }

    pub async fn update_status(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<(), AppError> {
        let _: serde_json::Value = self
            .backend
            .post(
                "admin/update-appointment-status/",
                &StatusUpdateRequest { appointment_id, status },
                Some(auth_token),
            )
            .await?;
        info!("Appointment {} set to {}", appointment_id, status);
        Ok(())
    }
}

/// A list request tagged with the board generation it was issued for.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardQuery {
    pub generation: u64,
    pub filters: AppointmentFilters,
}

/// Local copy of the hospital's appointments. Status edits are applied
/// immediately; rows the backend refused stay edited but are flagged
/// `unconfirmed` until the next fetch replaces them.
#[derive(Debug, Clone, Default)]
pub struct AppointmentBoard {
    rows: Vec<BoardRow>,
    doctors: Vec<AdminDoctorRef>,
    filters: AppointmentFilters,
    loading: bool,
    generation: u64,
}

impl AppointmentBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[BoardRow] {
        &self.rows
    }

    pub fn filters(&self) -> &AppointmentFilters {
        &self.filters
    }

    pub fn row(&self, appointment_id: i64) -> Option<&BoardRow> {
        self.rows.iter().find(|r| r.appointment.id == appointment_id)
    }

    fn next_query(&mut self) -> BoardQuery {
        self.generation += 1;
        self.loading = true;
        BoardQuery {
            generation: self.generation,
            filters: self.filters.clone(),
        }
    }

    /// Clears the filters for a fresh page load.
    pub fn reset(&mut self) -> BoardQuery {
        self.filters = AppointmentFilters::default();
        self.next_query()
    }

    pub fn set_filters(&mut self, filters: AppointmentFilters) -> BoardQuery {
        self.filters = filters;
        self.next_query()
    }

    /// Refetch with the current filters.
    pub fn reconcile(&mut self) -> BoardQuery {
        self.next_query()
    }

    pub fn set_doctors(&mut self, doctors: Vec<AdminDoctorRef>) {
        self.doctors = doctors;
    }

    /// Replaces the rows unless a newer query has been issued since.
    pub fn apply(&mut self, generation: u64, appointments: Vec<AdminAppointment>) -> bool {
        if generation != self.generation {
            debug!("Discarding appointments for superseded query {}", generation);
            return false;
        }
        self.rows = appointments.into_iter().map(BoardRow::from).collect();
        self.loading = false;
        true
    }

    pub fn fetch_failed(&mut self, generation: u64) {
        if generation == self.generation {
            self.loading = false;
        }
    }

    /// Applies a status change locally before the backend has answered.
    pub fn mark_status(&mut self, appointment_id: i64, status: AppointmentStatus) -> bool {
        match self.rows.iter_mut().find(|r| r.appointment.id == appointment_id) {
            Some(row) => {
                row.appointment.status = status;
                row.unconfirmed = false;
                true
            }
            None => false,
        }
    }

    pub fn flag_unconfirmed(&mut self, appointment_id: i64) {
        if let Some(row) = self.rows.iter_mut().find(|r| r.appointment.id == appointment_id) {
            row.unconfirmed = true;
        }
    }

    pub fn view(&self) -> BoardView {
        BoardView {
            filters: self.filters.clone(),
            doctors: self.doctors.clone(),
            rows: self.rows.clone(),
            loading: self.loading,
        }
    }
}

/// Runs board queries against the backend. The board's mutex is released
/// while requests are in flight.
pub struct BoardService {
    appointments: Arc<AdminAppointmentService>,
    session: Arc<SessionStore>,
}

impl BoardService {
    pub fn new(appointments: Arc<AdminAppointmentService>, session: Arc<SessionStore>) -> Self {
        Self { appointments, session }
    }

    /// Fetches every appointment and the doctor filter options together.
    pub async fn load(&self, board: &Mutex<AppointmentBoard>, auth_token: &str) {
        let query = board.lock().await.reset();

        let result = tokio::try_join!(
            self.appointments.list(&query.filters, auth_token),
            self.appointments.doctors(auth_token),
        );

        let mut board = board.lock().await;
        match result {
            Ok((appointments, doctors)) => {
                board.set_doctors(doctors);
                board.apply(query.generation, appointments);
            }
            Err(e) => {
                error!("Failed to load appointments board: {}", e);
                board.fetch_failed(query.generation);
                self.session.notices().error("Could not load initial data.");
            }
        }
    }

    pub async fn filter(&self, board: &Mutex<AppointmentBoard>, filters: AppointmentFilters, auth_token: &str) {
        let query = board.lock().await.set_filters(filters);
        self.fetch(board, query, auth_token).await;
    }

    pub async fn reconcile(&self, board: &Mutex<AppointmentBoard>, auth_token: &str) {
        let query = board.lock().await.reconcile();
        self.fetch(board, query, auth_token).await;
    }

    async fn fetch(&self, board: &Mutex<AppointmentBoard>, query: BoardQuery, auth_token: &str) {
        let result = self.appointments.list(&query.filters, auth_token).await;

        let mut board = board.lock().await;
        match result {
            Ok(appointments) => {
                board.apply(query.generation, appointments);
            }
            Err(e) => {
                error!("Failed to fetch appointments: {}", e);
                board.fetch_failed(query.generation);
                self.session.notices().error("Failed to fetch appointments.");
            }
        }
    }

    /// Optimistic status change. A rejected change is flagged, not reverted.
    pub async fn change_status(
        &self,
        board: &Mutex<AppointmentBoard>,
        appointment_id: i64,
        status: AppointmentStatus,
        auth_token: &str,
    ) {
        if !board.lock().await.mark_status(appointment_id, status) {
            warn!("Status change for unknown appointment {}", appointment_id);
            self.session.notices().error("Appointment not found.");
            return;
        }

        match self.appointments.update_status(appointment_id, status, auth_token).await {
            Ok(()) => self.session.notices().success("Appointment status updated!"),
            Err(e) => {
                error!("Failed to update status of {}: {}", appointment_id, e);
                board.lock().await.flag_unconfirmed(appointment_id);
                self.session.notices().error(e.user_message("Could not update status."));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn appointment(id: i64, status: &str) -> AdminAppointment {
        serde_json::from_value(json!({
            "id": id,
            "patient": { "id": 1, "first_name": "Test", "last_name": "Patient", "email": "patient@example.com" },
            "doctor": { "id": 3, "name": "Dr. Heart" },
            "hospital": "City Hospital",
            "appointment_datetime": "2024-06-10T09:00:00Z",
            "status": status,
            "payment_status": false,
            "payment_method": null,
            "payment_amount": "0.00"
        }))
        .unwrap()
    }

    #[test]
    fn superseded_fetch_is_ignored() {
        let mut board = AppointmentBoard::new();
        let first = board.reset();
        let second = board.set_filters(AppointmentFilters {
            status: Some(AppointmentStatus::Booked),
            ..AppointmentFilters::default()
        });

        assert!(board.apply(second.generation, vec![appointment(2, "booked")]));
        assert!(!board.apply(first.generation, vec![appointment(1, "pending"), appointment(2, "booked")]));

        assert_eq!(board.rows().len(), 1);
        assert_eq!(board.filters().status, Some(AppointmentStatus::Booked));
        assert!(!board.view().loading);
    }

    #[test]
    fn rejected_status_change_stays_applied() {
        let mut board = AppointmentBoard::new();
        let query = board.reset();
        board.apply(query.generation, vec![appointment(7, "booked")]);

        assert!(board.mark_status(7, AppointmentStatus::Completed));
        board.flag_unconfirmed(7);

        let row = board.row(7).unwrap();
        assert_eq!(row.appointment.status, AppointmentStatus::Completed);
        assert!(row.unconfirmed);
        assert!(!board.mark_status(99, AppointmentStatus::Completed));
    }

    #[test]
    fn reconcile_replaces_unconfirmed_rows() {
        let mut board = AppointmentBoard::new();
        let query = board.reset();
        board.apply(query.generation, vec![appointment(7, "booked")]);
        board.mark_status(7, AppointmentStatus::Completed);
        board.flag_unconfirmed(7);

        let query = board.reconcile();
        board.apply(query.generation, vec![appointment(7, "booked")]);

        let row = board.row(7).unwrap();
        assert_eq!(row.appointment.status, AppointmentStatus::Booked);
        assert!(!row.unconfirmed);
    }
}
