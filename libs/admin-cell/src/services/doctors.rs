use reqwest::{multipart::Form, Method};
use tracing::{debug, info};

use shared_backend::BackendClient;
use shared_config::PortalConfig;
use shared_models::directory::{Doctor, Specialty};
use shared_models::error::AppError;

use crate::models::{AddExistingDoctorRequest, AdminActionResponse, DoctorManagementView, NewDoctorRequest};

/// The admin's doctor roster: creating doctors, adopting unassigned ones
/// and listing the hospital's own.
pub struct DoctorAdminService {
    backend: BackendClient,
    config: PortalConfig,
}

impl DoctorAdminService {
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            backend: BackendClient::new(config),
            config: config.clone(),
        }
    }

    pub async fn unassigned(&self, auth_token: &str) -> Result<Vec<Doctor>, AppError> {
        let doctors: Vec<Doctor> = self.backend.get("admin/unassigned-doctors/", Some(auth_token)).await?;
        Ok(self.with_media(doctors))
    }

    pub async fn management_view(&self, auth_token: &str) -> Result<DoctorManagementView, AppError> {
        let (unassigned, specialties) = tokio::try_join!(
            self.unassigned(auth_token),
            self.backend.get::<Vec<Specialty>>("specialties/", Some(auth_token)),
        )?;
        Ok(DoctorManagementView { unassigned, specialties })
    }

    pub async fn create_doctor(&self, request: &NewDoctorRequest, auth_token: &str) -> Result<String, AppError> {
        debug!("Creating doctor {}", request.email);

        let mut form = Form::new()
            .text("name", request.name.clone())
            .text("email", request.email.clone())
            .text("specialty", request.specialty.to_string())
            .text("fees", request.fees.clone())
            .text("about", request.about.clone())
            .text("opd_charge", request.opd_charge.clone())
            .text("nmc_no", request.nmc_no.clone())
            .text("password", request.password.clone());
        if let Some(photo) = &request.photo {
            form = form.part("photo", photo.into_part()?);
        }

        let response: AdminActionResponse = self
            .backend
            .multipart(Method::POST, "admin/create-doctor/", form, Some(auth_token))
            .await?;

        info!("Created doctor {}", request.name);
        Ok(response.text("Doctor created."))
    }

    pub async fn add_existing(&self, request: &AddExistingDoctorRequest, auth_token: &str) -> Result<String, AppError> {
        let response: AdminActionResponse = self
            .backend
            .post("admin/add-existing-doctor/", request, Some(auth_token))
            .await?;

        info!("Added doctor {} to the hospital", request.doctor_id);
        Ok(response.text("Doctor added."))
    }

    pub async fn my_doctors(&self, auth_token: &str) -> Result<Vec<Doctor>, AppError> {
        let doctors: Vec<Doctor> = self.backend.get("admin/my-doctors/", Some(auth_token)).await?;
        Ok(self.with_media(doctors))
    }

    fn with_media(&self, doctors: Vec<Doctor>) -> Vec<Doctor> {
        doctors
            .into_iter()
            .map(|mut d| {
                d.photo = d.photo.filter(|p| !p.is_empty()).map(|p| self.config.media_url(&p));
                d
            })
            .collect()
    }
}
