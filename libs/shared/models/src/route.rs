use std::fmt;

use serde::{Deserialize, Serialize};

/// Who may see a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Public,
    Authenticated,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRoute {
    Dashboard,
    Appointments,
    Doctors,
    ManageDoctors,
    DoctorSchedule(i64),
}

/// Client-side routes of the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Home,
    About,
    Contact,
    Login,
    Search,
    Doctors,
    DoctorsBySpecialty(String),
    Hospitals,
    HospitalDetail(i64),
    Specialities,
    BookAppointment,
    PaymentSuccess,
    PaymentFailure,
    MyAppointments,
    MyProfile,
    Admin(AdminRoute),
}

impl Route {
    pub fn access(&self) -> Access {
        match self {
            Route::MyAppointments | Route::MyProfile => Access::Authenticated,
            Route::Admin(_) => Access::Admin,
            _ => Access::Public,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::About => "/about".to_string(),
            Route::Contact => "/contact".to_string(),
            Route::Login => "/login".to_string(),
            Route::Search => "/search".to_string(),
            Route::Doctors => "/doctors".to_string(),
            Route::DoctorsBySpecialty(specialty) => format!("/doctors/{}", specialty),
            Route::Hospitals => "/hospitals".to_string(),
            Route::HospitalDetail(id) => format!("/hospital/{}", id),
            Route::Specialities => "/speciality".to_string(),
            Route::BookAppointment => "/book-appointment".to_string(),
            Route::PaymentSuccess => "/payment-success".to_string(),
            Route::PaymentFailure => "/payment-failure".to_string(),
            Route::MyAppointments => "/my-appointments".to_string(),
            Route::MyProfile => "/my-profile".to_string(),
            Route::Admin(admin) => match admin {
                AdminRoute::Dashboard => "/admin/dashboard".to_string(),
                AdminRoute::Appointments => "/admin/appointments".to_string(),
                AdminRoute::Doctors => "/admin/doctors".to_string(),
                AdminRoute::ManageDoctors => "/admin/doctors-manage".to_string(),
                AdminRoute::DoctorSchedule(id) => format!("/admin/doctors/{}/schedule", id),
            },
        }
    }

    /// Resolves a browser path (query string and trailing slash ignored).
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] => Route::Home,
            ["about"] => Route::About,
            ["contact"] => Route::Contact,
            ["login"] => Route::Login,
            ["search"] => Route::Search,
            ["doctors"] => Route::Doctors,
            ["doctors", specialty] => Route::DoctorsBySpecialty(specialty.to_string()),
            ["hospitals"] => Route::Hospitals,
            ["hospital", id, ..] => Route::HospitalDetail(id.parse().ok()?),
            ["speciality"] => Route::Specialities,
            ["book-appointment"] => Route::BookAppointment,
            ["payment-success"] => Route::PaymentSuccess,
            ["payment-failure"] => Route::PaymentFailure,
            ["my-appointments"] | ["myappointments"] => Route::MyAppointments,
            ["my-profile"] => Route::MyProfile,
            ["admin"] | ["admin", "dashboard"] => Route::Admin(AdminRoute::Dashboard),
            ["admin", "appointments"] => Route::Admin(AdminRoute::Appointments),
            ["admin", "doctors"] => Route::Admin(AdminRoute::Doctors),
            ["admin", "doctors-manage"] => Route::Admin(AdminRoute::ManageDoctors),
            ["admin", "doctors", id, "schedule"] => {
                Route::Admin(AdminRoute::DoctorSchedule(id.parse().ok()?))
            }
            _ => return None,
        };

        Some(route)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
