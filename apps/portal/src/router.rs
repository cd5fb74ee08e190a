use std::sync::Arc;

use axum::{
    extract::{Json, State},
    routing::get,
    Router,
};
use serde::Serialize;

use admin_cell::handlers::AdminState;
use admin_cell::router::admin_routes;
use appointment_cell::handlers::{AppointmentState, BookingState};
use appointment_cell::router::appointment_routes;
use appointment_cell::{AppointmentService, BookingService, LocalClock};
use auth_cell::handlers::AuthState;
use auth_cell::router::auth_routes;
use auth_cell::SessionStore;
use doctor_cell::handlers::DirectoryState;
use doctor_cell::router::directory_routes;
use doctor_cell::DirectoryService;
use patient_cell::handlers::ProfileState;
use patient_cell::router::profile_routes;
use patient_cell::ProfileService;
use payment_cell::handlers::PaymentState;
use payment_cell::router::payment_routes;
use payment_cell::{AutoSubmitForm, PaymentService};
use shared_config::PortalConfig;
use shared_models::directory::Doctor;
use shared_models::notice::Screen;

const TOP_DOCTORS: usize = 10;

#[derive(Debug, Serialize)]
struct HomeView {
    is_authenticated: bool,
    top_doctors: Vec<Doctor>,
}

async fn home(State(session): State<Arc<SessionStore>>) -> Json<Screen<HomeView>> {
    let snapshot = session.snapshot().await;
    let view = HomeView {
        is_authenticated: snapshot.is_authenticated,
        top_doctors: snapshot.doctors.into_iter().take(TOP_DOCTORS).collect(),
    };
    Json(session.notices().screen(view))
}

pub fn create_router(
    config: Arc<PortalConfig>,
    session: Arc<SessionStore>,
    directory: Arc<DirectoryService>,
    profiles: Arc<ProfileService>,
) -> Router {
    let notices = session.notices().clone();
    let payments = Arc::new(PaymentService::new(&config));
    let appointments = Arc::new(AppointmentService::new(&config));

    let payment_state = Arc::new(PaymentState::new(
        payments.clone(),
        Arc::new(AutoSubmitForm),
        session.clone(),
    ));
    let booking = BookingService::new(
        &config,
        appointments.clone(),
        payments,
        directory.clone(),
        session.clone(),
        Arc::new(LocalClock),
    );

    Router::new()
        .route("/", get(home))
        .with_state(session.clone())
        .merge(auth_routes(Arc::new(AuthState::new(config.clone(), session.clone()))))
        .merge(directory_routes(Arc::new(DirectoryState::new(&config, directory, notices))))
        .merge(profile_routes(Arc::new(ProfileState {
            profiles,
            session: session.clone(),
        })))
        .merge(appointment_routes(
            Arc::new(BookingState::new(booking, payment_state.clone())),
            Arc::new(AppointmentState::new(appointments, session.clone())),
        ))
        .merge(payment_routes(payment_state))
        .merge(admin_routes(Arc::new(AdminState::new(&config, session))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_cell::MemoryTokenStorage;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use shared_utils::Notices;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn app(server: &MockServer) -> Router {
        let config = Arc::new(PortalConfig::new(&format!("{}/api/", server.uri())));
        let directory = Arc::new(DirectoryService::new(&config));
        let profiles = Arc::new(ProfileService::new(&config));
        let session = Arc::new(SessionStore::new(
            Arc::new(MemoryTokenStorage::new()),
            profiles.clone(),
            directory.clone(),
            Notices::new(),
        ));
        session.restore().await;
        create_router(config, session, directory, profiles)
    }

    #[tokio::test]
    async fn home_renders_for_anonymous_visitors() {
        let server = MockServer::start().await;
        let response = app(&server)
            .await
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let screen: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(screen["view"]["is_authenticated"], false);
    }

    #[tokio::test]
    async fn every_cell_is_mounted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/hospitals/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        let app = app(&server).await;

        let cases = [
            ("/hospitals", StatusCode::OK),
            ("/login", StatusCode::OK),
            ("/my-profile", StatusCode::SEE_OTHER),
            ("/my-appointments", StatusCode::SEE_OTHER),
            ("/admin/dashboard", StatusCode::SEE_OTHER),
            ("/payment-success", StatusCode::SEE_OTHER),
            ("/nowhere", StatusCode::NOT_FOUND),
        ];
        for (uri, expected) in cases {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), expected, "{}", uri);
        }
    }

    #[tokio::test]
    async fn anonymous_admin_visit_goes_home() {
        let server = MockServer::start().await;
        let response = app(&server)
            .await
            .oneshot(Request::builder().uri("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }
}
