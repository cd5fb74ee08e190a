use async_trait::async_trait;
use tracing::debug;

use auth_cell::ReferenceDataLoader;
use shared_backend::BackendClient;
use shared_config::PortalConfig;
use shared_models::directory::{Doctor, Hospital, Specialty};
use shared_models::error::AppError;

use crate::models::{DoctorQuery, HospitalDetail, SearchResults};

/// Read-only access to the public directory: doctors, hospitals,
/// specialties and search. Media paths come back absolute.
pub struct DirectoryService {
    backend: BackendClient,
    config: PortalConfig,
}

impl DirectoryService {
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            backend: BackendClient::new(config),
            config: config.clone(),
        }
    }

    pub async fn list_doctors(
        &self,
        query: &DoctorQuery,
        auth_token: Option<&str>,
    ) -> Result<Vec<Doctor>, AppError> {
        debug!("Fetching doctors with {:?}", query);

        let doctors: Vec<Doctor> = if query.is_empty() {
            self.backend.get("doctors/", auth_token).await?
        } else {
            self.backend.get_with_query("doctors/", query, auth_token).await?
        };

        Ok(doctors.into_iter().map(|d| self.doctor_media(d)).collect())
    }

    pub async fn list_hospitals(&self, auth_token: Option<&str>) -> Result<Vec<Hospital>, AppError> {
        let hospitals: Vec<Hospital> = self.backend.get("hospitals/", auth_token).await?;
        Ok(hospitals.into_iter().map(|h| self.hospital_media(h)).collect())
    }

    /// A hospital together with the doctors practising there.
    pub async fn hospital_detail(&self, hospital_id: i64) -> Result<HospitalDetail, AppError> {
        let path = format!("hospitals/{}/", hospital_id);
        let doctors_query = DoctorQuery::by_hospital(hospital_id);

        let (hospital, doctors) = tokio::try_join!(
            self.backend.get::<Hospital>(&path, None),
            self.list_doctors(&doctors_query, None),
        )?;

        Ok(HospitalDetail {
            hospital: self.hospital_media(hospital),
            doctors,
        })
    }

    pub async fn list_specialties(&self) -> Result<Vec<Specialty>, AppError> {
        let specialties: Vec<Specialty> = self.backend.get("specialties/", None).await?;
        Ok(specialties
            .into_iter()
            .map(|mut s| {
                s.icon = self.media(s.icon);
                s
            })
            .collect())
    }

    /// Searches doctors and hospitals. A blank query matches nothing and
    /// is not sent.
    pub async fn search(&self, query: &str) -> Result<SearchResults, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResults::default());
        }

        let results: SearchResults = self
            .backend
            .get_with_query("search/", &[("query", query)], None)
            .await?;

        Ok(SearchResults {
            doctors: results.doctors.into_iter().map(|d| self.doctor_media(d)).collect(),
            hospitals: results.hospitals.into_iter().map(|h| self.hospital_media(h)).collect(),
        })
    }

    fn media(&self, path: Option<String>) -> Option<String> {
        path.filter(|p| !p.is_empty()).map(|p| self.config.media_url(&p))
    }

    fn doctor_media(&self, mut doctor: Doctor) -> Doctor {
        doctor.photo = self.media(doctor.photo.take());
        doctor
    }

    fn hospital_media(&self, mut hospital: Hospital) -> Hospital {
        hospital.logo = self.media(hospital.logo.take());
        hospital.doctors = std::mem::take(&mut hospital.doctors)
            .into_iter()
            .map(|d| self.doctor_media(d))
            .collect();
        hospital
    }
}

#[async_trait]
impl ReferenceDataLoader for DirectoryService {
    async fn load_doctors(&self, token: Option<&str>) -> Result<Vec<Doctor>, AppError> {
        self.list_doctors(&DoctorQuery::default(), token).await
    }

    async fn load_hospitals(&self, token: Option<&str>) -> Result<Vec<Hospital>, AppError> {
        self.list_hospitals(token).await
    }
}
