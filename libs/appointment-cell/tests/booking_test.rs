use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, header as header_eq, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::handlers::{AppointmentState, BookingState};
use appointment_cell::models::BookingStage;
use appointment_cell::router::appointment_routes;
use appointment_cell::services::booking::{
    BookingStep, INCOMPLETE_BOOKING_MESSAGE, LOGIN_REQUIRED_MESSAGE,
};
use appointment_cell::{AppointmentService, BookingService, FixedClock};
use auth_cell::session::SESSION_EXPIRED_MESSAGE;
use auth_cell::{MemoryTokenStorage, ProfileLoader, ReferenceDataLoader, SessionStore};
use doctor_cell::DirectoryService;
use payment_cell::handlers::PaymentState;
use payment_cell::{AutoSubmitForm, PaymentService};
use shared_config::PortalConfig;
use shared_models::directory::{Doctor, Hospital};
use shared_models::error::AppError;
use shared_models::notice::Notice;
use shared_models::profile::UserProfile;
use shared_models::route::Route;
use shared_utils::test_utils::{JwtTestUtils, MockBackendResponses, TestConfig, TestUser};
use shared_utils::Notices;

struct Patient;

#[async_trait]
impl ProfileLoader for Patient {
    async fn load_profile(&self, _token: &str) -> Result<UserProfile, AppError> {
        let envelope = MockBackendResponses::profile_response(&TestUser::default());
        Ok(serde_json::from_value(envelope["userData"].clone())?)
    }
}

#[async_trait]
impl ReferenceDataLoader for Patient {
    async fn load_doctors(&self, _token: Option<&str>) -> Result<Vec<Doctor>, AppError> {
        Ok(Vec::new())
    }

    async fn load_hospitals(&self, _token: Option<&str>) -> Result<Vec<Hospital>, AppError> {
        Ok(Vec::new())
    }
}

struct Fixture {
    config: PortalConfig,
    session: Arc<SessionStore>,
    booking: Arc<BookingState>,
    token: String,
}

impl Fixture {
    async fn new(server: &MockServer, signed_in: bool) -> Self {
        let secret = TestConfig::default().jwt_secret;
        let token = JwtTestUtils::create_test_token(&TestUser::default(), &secret, Some(1));
        Self::with_token(server, token, signed_in).await
    }

    async fn with_token(server: &MockServer, token: String, signed_in: bool) -> Self {
        let config = TestConfig::for_mock_server(&server.uri()).to_portal_config();
        let storage = if signed_in {
            MemoryTokenStorage::with_token(&token)
        } else {
            MemoryTokenStorage::new()
        };

        let session = Arc::new(SessionStore::new(
            Arc::new(storage),
            Arc::new(Patient),
            Arc::new(Patient),
            Notices::new(),
        ));
        session.restore().await;

        let payments = Arc::new(PaymentService::new(&config));
        let service = BookingService::new(
            &config,
            Arc::new(AppointmentService::new(&config)),
            payments.clone(),
            Arc::new(DirectoryService::new(&config)),
            session.clone(),
            Arc::new(FixedClock(wednesday())),
        );
        let payment = Arc::new(PaymentState::new(payments, Arc::new(AutoSubmitForm), session.clone()));

        Self {
            booking: Arc::new(BookingState::new(service, payment)),
            config,
            session,
            token,
        }
    }

    fn router(&self) -> Router {
        let appointments = AppointmentState::new(Arc::new(AppointmentService::new(&self.config)), self.session.clone());
        appointment_routes(self.booking.clone(), Arc::new(appointments))
    }

    async fn open(&self, days: &[&str]) {
        let doctor: Doctor =
            serde_json::from_value(MockBackendResponses::doctor_response(3, "Dr. Heart", days)).unwrap();
        let step = self.booking.booking.open(&self.booking.flow, Some(doctor)).await;
        assert_matches!(step, BookingStep::Stay);
    }

    async fn stage(&self) -> BookingStage {
        self.booking.booking.view(&self.booking.flow).await.unwrap().stage
    }
}

fn wednesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()
}

async fn mount_slots(server: &MockServer, date: &str, times: &[&str]) {
    let slots: Vec<Value> = times
        .iter()
        .enumerate()
        .map(|(i, t)| MockBackendResponses::slot_response(i as i64 + 1, t))
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/available-slots/"))
        .and(query_param("doctor_id", "3"))
        .and(query_param("date", date))
        .respond_with(ResponseTemplate::new(200).set_body_json(slots))
        .mount(server)
        .await;
}

fn gateway_form() -> Value {
    json!({
        "esewa_url": "https://rc-epay.esewa.com.np/api/epay/main/v2/form",
        "form_data": { "total_amount": "500.00", "transaction_uuid": "u-42", "product_code": "EPAYTEST" }
    })
}

#[tokio::test]
async fn superseded_day_selection_keeps_newer_slots() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/available-slots/"))
        .and(query_param("date", "2024-06-10"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([MockBackendResponses::slot_response(1, "09:00:00")]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    mount_slots(&server, "2024-06-11", &["14:00:00"]).await;

    let fixture = Fixture::new(&server, true).await;
    fixture.open(&["Monday", "Tuesday"]).await;

    let service = &fixture.booking.booking;
    let flow = &fixture.booking.flow;
    let (monday, tuesday) = tokio::join!(service.select_day(flow, "Monday"), service.select_day(flow, "Tuesday"));
    monday.unwrap();
    tuesday.unwrap();

    let view = service.view(flow).await.unwrap();
    assert_eq!(view.day.as_deref(), Some("Tuesday"));
    assert_eq!(view.date, NaiveDate::from_ymd_opt(2024, 6, 11));
    assert_eq!(view.slots.len(), 1);
    assert_eq!(view.slots[0].time, "14:00:00");
    assert_eq!(view.stage, BookingStage::SlotsLoaded);
}

#[tokio::test]
async fn rejected_booking_stays_and_never_initiates_payment() {
    let server = MockServer::start().await;
    mount_slots(&server, "2024-06-10", &["09:00:00"]).await;
    Mock::given(method("POST"))
        .and(path("/api/book-appointment/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(MockBackendResponses::error_response("This appointment slot is already taken.")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/initiate-payment/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gateway_form()))
        .expect(0)
        .mount(&server)
        .await;

    let fixture = Fixture::new(&server, true).await;
    fixture.open(&["Monday"]).await;
    let service = &fixture.booking.booking;
    service.select_time(&fixture.booking.flow, "09:00").await.unwrap();

    let step = service.submit(&fixture.booking.flow).await;

    assert_matches!(step, BookingStep::Stay);
    assert_eq!(fixture.stage().await, BookingStage::SlotsLoaded);
    assert_eq!(
        fixture.session.notices().drain(),
        vec![Notice::error("This appointment slot is already taken.")]
    );
}

#[tokio::test]
async fn incomplete_booking_never_reaches_the_backend() {
    let server = MockServer::start().await;
    mount_slots(&server, "2024-06-10", &["09:00:00"]).await;
    Mock::given(method("POST"))
        .and(path("/api/book-appointment/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let fixture = Fixture::new(&server, true).await;
    fixture.open(&["Monday"]).await;

    let step = fixture.booking.booking.submit(&fixture.booking.flow).await;

    assert_matches!(step, BookingStep::Stay);
    assert_eq!(fixture.session.notices().drain(), vec![Notice::error(INCOMPLETE_BOOKING_MESSAGE)]);
}

#[tokio::test]
async fn anonymous_submit_goes_to_login() {
    let server = MockServer::start().await;
    mount_slots(&server, "2024-06-10", &["09:00:00"]).await;
    Mock::given(method("POST"))
        .and(path("/api/book-appointment/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let fixture = Fixture::new(&server, false).await;
    fixture.open(&["Monday"]).await;
    let service = &fixture.booking.booking;
    service.select_time(&fixture.booking.flow, "09:00").await.unwrap();

    let step = service.submit(&fixture.booking.flow).await;

    assert_matches!(step, BookingStep::Redirect(Route::Login));
    assert_eq!(fixture.session.notices().drain(), vec![Notice::info(LOGIN_REQUIRED_MESSAGE)]);
}

#[tokio::test]
async fn failed_payment_hand_off_can_be_retried() {
    let server = MockServer::start().await;
    mount_slots(&server, "2024-06-10", &["09:00:00"]).await;

    let fixture = Fixture::new(&server, true).await;
    Mock::given(method("POST"))
        .and(path("/api/book-appointment/"))
        .and(header_eq("authorization", format!("Bearer {}", fixture.token).as_str()))
        .and(body_json(json!({ "doctor_id": 3, "hospital_id": 10, "day": "Monday", "time": "09:00" })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "message": "Appointment booked successfully", "appointment_id": 42 })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/initiate-payment/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/initiate-payment/"))
        .and(body_json(json!({ "appointment_id": 42 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gateway_form()))
        .mount(&server)
        .await;

    fixture.open(&["Monday"]).await;
    let service = &fixture.booking.booking;
    let flow = &fixture.booking.flow;
    service.select_time(flow, "09:00").await.unwrap();

    let step = service.submit(flow).await;
    assert_matches!(step, BookingStep::Stay);
    assert_eq!(fixture.stage().await, BookingStage::AwaitingPayment { appointment_id: 42 });
    assert_eq!(fixture.session.notices().drain(), vec![Notice::error("Could not initiate payment.")]);

    let step = service.retry_payment(flow).await;
    assert_matches!(step, BookingStep::Gateway(form) if form.esewa_url.ends_with("/v2/form"));
    assert_eq!(fixture.stage().await, BookingStage::Redirecting);
}

#[tokio::test]
async fn retrying_payment_with_an_expired_session_goes_to_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/initiate-payment/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gateway_form()))
        .expect(0)
        .mount(&server)
        .await;

    let secret = TestConfig::default().jwt_secret;
    let token = JwtTestUtils::create_token_expiring_in(&TestUser::default(), &secret, 2);
    let fixture = Fixture::with_token(&server, token, true).await;
    assert!(fixture.session.snapshot().await.is_authenticated);

    tokio::time::sleep(Duration::from_millis(2100)).await;

    let step = fixture.booking.booking.retry_payment(&fixture.booking.flow).await;
    assert_matches!(step, BookingStep::Redirect(Route::Login));
    assert_eq!(
        fixture.session.notices().drain(),
        vec![Notice::warning(SESSION_EXPIRED_MESSAGE), Notice::info(LOGIN_REQUIRED_MESSAGE)]
    );
}

#[tokio::test]
async fn booking_by_doctor_id_ends_on_the_gateway_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/doctors/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockBackendResponses::doctor_response(3, "Dr. Heart", &["Monday"])
        ])))
        .expect(1)
        .mount(&server)
        .await;
    mount_slots(&server, "2024-06-10", &["09:00:00", "09:30:00"]).await;
    Mock::given(method("POST"))
        .and(path("/api/book-appointment/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "appointment_id": 42 })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/initiate-payment/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gateway_form()))
        .mount(&server)
        .await;

    let fixture = Fixture::new(&server, true).await;
    let app = fixture.router();

    let response = app
        .clone()
        .oneshot(post_json("/book-appointment", json!({ "doctor_id": 3 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let screen: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(screen["view"]["stage"], "slots_loaded");
    assert_eq!(screen["view"]["price"], "Rs. 500.00");
    assert_eq!(screen["view"]["can_submit"], false);

    let response = app
        .clone()
        .oneshot(post_json("/book-appointment/time", json!({ "time": "09:30" })))
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let screen: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(screen["view"]["can_submit"], true);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/book-appointment/submit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("https://rc-epay.esewa.com.np/api/epay/main/v2/form"));
    assert!(html.contains("name=\"transaction_uuid\" value=\"u-42\""));
}

#[tokio::test]
async fn booking_page_without_doctor_returns_to_directory() {
    let server = MockServer::start().await;
    let fixture = Fixture::new(&server, true).await;

    let response = fixture
        .router()
        .oneshot(Request::builder().uri("/book-appointment").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/doctors");
    assert_eq!(
        fixture.session.notices().drain(),
        vec![Notice::error("Doctor details not found. Redirecting...")]
    );
}

#[tokio::test]
async fn my_appointments_lists_display_status() {
    let server = MockServer::start().await;
    let fixture = Fixture::new(&server, true).await;
    Mock::given(method("GET"))
        .and(path("/api/my-appointments/"))
        .and(header_eq("authorization", format!("Bearer {}", fixture.token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1, "doctor_name": "Dr. Heart", "doctor_photo": "/media/doctors/heart.png",
                "doctor_specialty": "Cardiology", "doctor_address": "City Hospital",
                "date": "2024-06-10", "time": "09:00", "cancelled": false, "payment": false
            },
            {
                "id": 2, "doctor_name": "Dr. Heart", "doctor_photo": null,
                "doctor_specialty": "Cardiology", "doctor_address": "City Hospital",
                "date": "2024-06-11", "time": "10:00", "cancelled": true, "payment": true
            }
        ])))
        .mount(&server)
        .await;

    let response = fixture
        .router()
        .oneshot(Request::builder().uri("/my-appointments").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let screen: Value = serde_json::from_slice(&body).unwrap();
    let rows = screen["view"].as_array().unwrap();
    assert_eq!(rows[0]["status"], "Pending Payment");
    assert_eq!(rows[0]["can_pay"], true);
    assert_eq!(rows[0]["doctor_photo"], format!("{}/media/doctors/heart.png", server.uri()));
    assert_eq!(rows[1]["status"], "Cancelled");
    assert_eq!(rows[1]["can_cancel"], false);
}

#[tokio::test]
async fn cancelling_shows_backend_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/cancel-appointment/"))
        .and(body_json(json!({ "appointment_id": 7 })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "message": "Appointment cancelled" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let fixture = Fixture::new(&server, true).await;

    let response = fixture
        .router()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/my-appointments/7/cancel")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/my-appointments");
    assert_eq!(fixture.session.notices().drain(), vec![Notice::success("Appointment cancelled")]);
}

#[tokio::test]
async fn my_appointments_requires_a_session() {
    let server = MockServer::start().await;
    let fixture = Fixture::new(&server, false).await;

    let response = fixture
        .router()
        .oneshot(Request::builder().uri("/my-appointments").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
