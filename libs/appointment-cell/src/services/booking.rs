use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use auth_cell::SessionStore;
use doctor_cell::models::DoctorQuery;
use doctor_cell::DirectoryService;
use payment_cell::models::GatewayForm;
use payment_cell::PaymentService;
use shared_config::PortalConfig;
use shared_models::amount::Amount;
use shared_models::directory::Doctor;
use shared_models::error::AppError;
use shared_models::route::Route;
use shared_utils::Notices;

use crate::models::{
    AvailableSlot, BookAppointmentRequest, BookingStage, BookingView, SlotQuery, StartBookingRequest,
};
use crate::services::appointments::AppointmentService;
use crate::services::calendar::{next_date_for, parse_weekday, Clock};
use crate::services::slots::SlotService;

pub const DOCTOR_MISSING_MESSAGE: &str = "Doctor details not found. Redirecting...";
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to book an appointment.";
pub const INCOMPLETE_BOOKING_MESSAGE: &str = "Please select a hospital, day and time.";
pub const SLOTS_FAILED_MESSAGE: &str = "Could not load available times.";

/// Shared across every flow so a replaced flow can never accept a
/// response meant for its predecessor.
static SLOT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Result of feeding a slot response into the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotUpdate {
    /// A newer day was picked while this request was in flight.
    Stale,
    Loaded(usize),
    Empty,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBlocked {
    Incomplete,
    LoginRequired,
    InFlight,
}

/// One patient's booking for one doctor. Pure state: every network call is
/// made by [`BookingService`] between transitions.
#[derive(Debug, Clone)]
pub struct BookingFlow {
    doctor: Doctor,
    hospital_id: Option<i64>,
    price: Option<Amount>,
    day: Option<String>,
    date: Option<NaiveDate>,
    time: Option<String>,
    slots: Vec<AvailableSlot>,
    stage: BookingStage,
    slot_generation: u64,
    appointment_id: Option<i64>,
}

impl BookingFlow {
    pub fn new(doctor: Doctor) -> Self {
        Self {
            doctor,
            hospital_id: None,
            price: None,
            day: None,
            date: None,
            time: None,
            slots: Vec::new(),
            stage: BookingStage::Idle,
            slot_generation: 0,
            appointment_id: None,
        }
    }

    /// Starts a flow on the doctor's first hospital and first available
    /// day, returning the slot query for that day.
    pub fn open(doctor: Doctor, today: NaiveDate) -> (Self, Option<SlotQuery>) {
        let mut flow = Self::new(doctor);

        if let Some(first) = flow.doctor.hospitals.first().cloned() {
            flow.hospital_id = Some(first.hospital_id);
            flow.price = Some(first.opd_charge);
            flow.stage = BookingStage::HospitalSelected;
        }

        let query = match flow.doctor.available_days.first().cloned() {
            Some(day) => match flow.select_day(&day, today) {
                Ok(()) => flow.next_slot_query(),
                Err(e) => {
                    warn!("Doctor {} lists an unusable day: {}", flow.doctor.id, e);
                    None
                }
            },
            None => None,
        };

        (flow, query)
    }

    pub fn doctor(&self) -> &Doctor {
        &self.doctor
    }

    pub fn stage(&self) -> BookingStage {
        self.stage
    }

    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    pub fn slots(&self) -> &[AvailableSlot] {
        &self.slots
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn ensure_editable(&self) -> Result<(), AppError> {
        match self.stage {
            BookingStage::Submitting | BookingStage::Redirecting | BookingStage::AwaitingPayment { .. } => Err(
                AppError::ValidationError("This booking has already been submitted.".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Switches hospital and price. Slots do not depend on the hospital, so
    /// nothing is refetched.
    pub fn select_hospital(&mut self, hospital_id: i64) -> Result<(), AppError> {
        self.ensure_editable()?;
        let hospital = self.doctor.hospital(hospital_id).cloned().ok_or_else(|| {
            AppError::ValidationError(format!("{} does not practise at hospital {}", self.doctor.name, hospital_id))
        })?;

        self.hospital_id = Some(hospital.hospital_id);
        self.price = Some(hospital.opd_charge);
        if self.stage == BookingStage::Idle {
            self.stage = BookingStage::HospitalSelected;
        }
        Ok(())
    }

    /// Picks a weekday, resolving it to the next matching date and clearing
    /// the chosen time.
    pub fn select_day(&mut self, day: &str, today: NaiveDate) -> Result<(), AppError> {
        self.ensure_editable()?;
        let day = day.trim();
        let weekday =
            parse_weekday(day).ok_or_else(|| AppError::ValidationError(format!("Unknown day: {}", day)))?;
        if !self.doctor.available_days.iter().any(|d| d.eq_ignore_ascii_case(day)) {
            return Err(AppError::ValidationError(format!(
                "{} is not available on {}",
                self.doctor.name, day
            )));
        }

        self.day = Some(day.to_string());
        self.date = Some(next_date_for(today, weekday));
        self.time = None;
        self.slots.clear();
        self.stage = BookingStage::DaySelected;
        Ok(())
    }

    /// Tags a slot request for the selected day. Only the most recently
    /// issued query is accepted by [`apply_slots`](Self::apply_slots).
    pub fn next_slot_query(&mut self) -> Option<SlotQuery> {
        if self.stage != BookingStage::DaySelected {
            return None;
        }
        let date = self.date?;

        self.slot_generation = SLOT_GENERATION.fetch_add(1, Ordering::Relaxed);
        self.stage = BookingStage::SlotsLoading;
        Some(SlotQuery {
            generation: self.slot_generation,
            doctor_id: self.doctor.id,
            date,
        })
    }

    pub fn apply_slots(&mut self, generation: u64, result: Result<Vec<AvailableSlot>, AppError>) -> SlotUpdate {
        if generation != self.slot_generation || self.stage != BookingStage::SlotsLoading {
            debug!("Discarding slots for superseded query {}", generation);
            return SlotUpdate::Stale;
        }

        match result {
            Ok(slots) if slots.is_empty() => {
                self.stage = BookingStage::SlotsEmpty;
                SlotUpdate::Empty
            }
            Ok(slots) => {
                let count = slots.len();
                self.slots = slots;
                self.stage = BookingStage::SlotsLoaded;
                SlotUpdate::Loaded(count)
            }
            Err(e) => {
                error!("Error fetching slots for doctor {}: {}", self.doctor.id, e);
                self.stage = BookingStage::SlotsEmpty;
                SlotUpdate::Failed
            }
        }
    }

    /// Accepts either the slot's `HH:MM` or its full stored time.
    pub fn select_time(&mut self, time: &str) -> Result<(), AppError> {
        self.ensure_editable()?;
        let slot = self
            .slots
            .iter()
            .find(|s| s.hhmm() == time || s.time == time)
            .ok_or_else(|| AppError::ValidationError("Selected time is not available.".to_string()))?;

        self.time = Some(slot.hhmm().to_string());
        Ok(())
    }

    pub fn can_submit(&self) -> bool {
        self.stage == BookingStage::SlotsLoaded
            && self.hospital_id.is_some()
            && self.day.is_some()
            && self.time.is_some()
    }

    /// Moves to `Submitting` and returns the booking request together with
    /// the token to send it with.
    pub fn begin_submit(&mut self, token: Option<&str>) -> Result<(BookAppointmentRequest, String), SubmitBlocked> {
        if matches!(
            self.stage,
            BookingStage::Submitting | BookingStage::Redirecting | BookingStage::AwaitingPayment { .. }
        ) {
            return Err(SubmitBlocked::InFlight);
        }

        let (Some(hospital_id), Some(day), Some(time)) = (self.hospital_id, &self.day, &self.time) else {
            return Err(SubmitBlocked::Incomplete);
        };
        if !self.can_submit() {
            return Err(SubmitBlocked::Incomplete);
        }
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Err(SubmitBlocked::LoginRequired);
        };

        let request = BookAppointmentRequest {
            doctor_id: self.doctor.id,
            hospital_id,
            day: day.clone(),
            time: time.clone(),
        };
        self.stage = BookingStage::Submitting;
        Ok((request, token.to_string()))
    }

    pub fn booking_failed(&mut self) {
        if self.stage == BookingStage::Submitting {
            self.stage = BookingStage::SlotsLoaded;
        }
    }

    pub fn booked(&mut self, appointment_id: i64) {
        if self.stage == BookingStage::Submitting {
            self.appointment_id = Some(appointment_id);
        }
    }

    pub fn payment_ready(&mut self) {
        if self.stage == BookingStage::Submitting {
            self.stage = BookingStage::Redirecting;
        }
    }

    /// The appointment exists but is unpaid; keep it so payment can be retried.
    pub fn payment_failed(&mut self) {
        if let (BookingStage::Submitting, Some(appointment_id)) = (self.stage, self.appointment_id) {
            self.stage = BookingStage::AwaitingPayment { appointment_id };
        }
    }

    pub fn begin_payment_retry(&mut self) -> Option<i64> {
        match self.stage {
            BookingStage::AwaitingPayment { appointment_id } => {
                self.stage = BookingStage::Submitting;
                Some(appointment_id)
            }
            _ => None,
        }
    }

    pub fn view(&self, config: &PortalConfig) -> BookingView {
        let time_placeholder = match self.stage {
            BookingStage::SlotsLoading => "Loading times...",
            BookingStage::SlotsEmpty => "No slots available",
            _ => "Select a time",
        };

        BookingView {
            doctor: self.doctor.clone(),
            stage: self.stage,
            hospital_id: self.hospital_id,
            price: self
                .price
                .as_ref()
                .map_or_else(|| "N/A".to_string(), |p| config.format_amount(p.as_str())),
            day: self.day.clone(),
            date: self.date,
            time: self.time.clone(),
            slots: self.slots.clone(),
            time_placeholder,
            can_submit: self.can_submit(),
        }
    }
}

/// What the screen should do after a booking action.
#[derive(Debug)]
pub enum BookingStep {
    Stay,
    Redirect(Route),
    /// Hand the browser over to the payment gateway.
    Gateway(GatewayForm),
}

/// Drives a [`BookingFlow`] against the backend. The flow's mutex is only
/// held between awaits, never across a request.
pub struct BookingService {
    config: PortalConfig,
    appointments: Arc<AppointmentService>,
    slots: SlotService,
    payments: Arc<PaymentService>,
    directory: Arc<DirectoryService>,
    session: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    pub fn new(
        config: &PortalConfig,
        appointments: Arc<AppointmentService>,
        payments: Arc<PaymentService>,
        directory: Arc<DirectoryService>,
        session: Arc<SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: config.clone(),
            appointments,
            slots: SlotService::new(config),
            payments,
            directory,
            session,
            clock,
        }
    }

    fn notices(&self) -> &Notices {
        self.session.notices()
    }

    fn missing_doctor(&self) -> BookingStep {
        self.notices().error(DOCTOR_MISSING_MESSAGE);
        BookingStep::Redirect(Route::Doctors)
    }

    /// The doctor carried by the request, or looked up by id in the
    /// session's list and then the directory.
    pub async fn resolve_doctor(&self, request: StartBookingRequest) -> Option<Doctor> {
        if let Some(doctor) = request.doctor {
            return Some(doctor);
        }
        let doctor_id = request.doctor_id?;

        let snapshot = self.session.snapshot().await;
        if let Some(doctor) = snapshot.doctor(doctor_id) {
            return Some(doctor.clone());
        }

        match self
            .directory
            .list_doctors(&DoctorQuery::default(), snapshot.token.as_deref())
            .await
        {
            Ok(doctors) => doctors.into_iter().find(|d| d.id == doctor_id),
            Err(e) => {
                error!("Failed to look up doctor {}: {}", doctor_id, e);
                None
            }
        }
    }

    pub async fn open(&self, flow: &Mutex<Option<BookingFlow>>, doctor: Option<Doctor>) -> BookingStep {
        let Some(doctor) = doctor else {
            return self.missing_doctor();
        };
        info!("Opening booking for doctor {}", doctor.id);

        let (opened, query) = BookingFlow::open(doctor, self.clock.today());
        *flow.lock().await = Some(opened);

        if let Some(query) = query {
            self.load_slots(flow, query).await;
        }
        BookingStep::Stay
    }

    pub async fn view(&self, flow: &Mutex<Option<BookingFlow>>) -> Option<BookingView> {
        flow.lock().await.as_ref().map(|f| f.view(&self.config))
    }

    pub async fn select_hospital(&self, flow: &Mutex<Option<BookingFlow>>, hospital_id: i64) -> Result<(), AppError> {
        let mut guard = flow.lock().await;
        guard.as_mut().ok_or_else(no_booking)?.select_hospital(hospital_id)
    }

    pub async fn select_day(&self, flow: &Mutex<Option<BookingFlow>>, day: &str) -> Result<(), AppError> {
        let query = {
            let mut guard = flow.lock().await;
            let current = guard.as_mut().ok_or_else(no_booking)?;
            current.select_day(day, self.clock.today())?;
            current.next_slot_query()
        };

        if let Some(query) = query {
            self.load_slots(flow, query).await;
        }
        Ok(())
    }

    pub async fn select_time(&self, flow: &Mutex<Option<BookingFlow>>, time: &str) -> Result<(), AppError> {
        let mut guard = flow.lock().await;
        guard.as_mut().ok_or_else(no_booking)?.select_time(time)
    }

    async fn load_slots(&self, flow: &Mutex<Option<BookingFlow>>, query: SlotQuery) {
        let result = self.slots.available_slots(query.doctor_id, query.date).await;

        let mut guard = flow.lock().await;
        let Some(current) = guard.as_mut() else {
            return;
        };
        if current.apply_slots(query.generation, result) == SlotUpdate::Failed {
            self.notices().error(SLOTS_FAILED_MESSAGE);
        }
    }

    /// Books the selected slot, then asks for the gateway form.
    pub async fn submit(&self, flow: &Mutex<Option<BookingFlow>>) -> BookingStep {
        self.session.check_expiry().await;
        let token = self.session.token().await;

        let (request, token) = {
            let mut guard = flow.lock().await;
            let Some(current) = guard.as_mut() else {
                return self.missing_doctor();
            };
            match current.begin_submit(token.as_deref()) {
                Ok(ticket) => ticket,
                Err(SubmitBlocked::Incomplete) => {
                    self.notices().error(INCOMPLETE_BOOKING_MESSAGE);
                    return BookingStep::Stay;
                }
                Err(SubmitBlocked::LoginRequired) => {
                    self.notices().info(LOGIN_REQUIRED_MESSAGE);
                    return BookingStep::Redirect(Route::Login);
                }
                Err(SubmitBlocked::InFlight) => {
                    debug!("Ignoring submit while a booking is in flight");
                    return BookingStep::Stay;
                }
            }
        };

        match self.appointments.book(&request, &token).await {
            Ok(appointment_id) => {
                if let Some(current) = flow.lock().await.as_mut() {
                    current.booked(appointment_id);
                }
                self.initiate_payment(flow, appointment_id, &token).await
            }
            Err(e) => {
                error!("Booking failed: {}", e);
                if let Some(current) = flow.lock().await.as_mut() {
                    current.booking_failed();
                }
                self.notices().error(e.user_message("Booking failed."));
                BookingStep::Stay
            }
        }
    }

    /// Re-initiates payment for a booking whose first hand-off failed.
    pub async fn retry_payment(&self, flow: &Mutex<Option<BookingFlow>>) -> BookingStep {
        self.session.check_expiry().await;
        let Some(token) = self.session.token().await else {
            self.notices().info(LOGIN_REQUIRED_MESSAGE);
            return BookingStep::Redirect(Route::Login);
        };

        let appointment_id = {
            let mut guard = flow.lock().await;
            match guard.as_mut().and_then(BookingFlow::begin_payment_retry) {
                Some(id) => id,
                None => {
                    self.notices().error("There is no unpaid booking to pay for.");
                    return BookingStep::Stay;
                }
            }
        };

        self.initiate_payment(flow, appointment_id, &token).await
    }

    async fn initiate_payment(
        &self,
        flow: &Mutex<Option<BookingFlow>>,
        appointment_id: i64,
        token: &str,
    ) -> BookingStep {
        match self.payments.initiate(appointment_id, token).await {
            Ok(form) => {
                if let Some(current) = flow.lock().await.as_mut() {
                    current.payment_ready();
                }
                BookingStep::Gateway(form)
            }
            Err(e) => {
                error!("Error initiating payment for {}: {}", appointment_id, e);
                if let Some(current) = flow.lock().await.as_mut() {
                    current.payment_failed();
                }
                self.notices().error(e.user_message("Could not initiate payment."));
                BookingStep::Stay
            }
        }
    }
}

fn no_booking() -> AppError {
    AppError::NotFound("No booking in progress".to_string())
}
