use serde::{Deserialize, Serialize};

use crate::amount::Amount;

/// A doctor's affiliation with one hospital and the OPD charge there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorHospital {
    pub hospital_id: i64,
    pub hospital_name: String,
    pub opd_charge: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub specialty: Option<String>,
    pub photo: Option<String>,
    pub about: Option<String>,
    pub fees: Option<Amount>,
    #[serde(default)]
    pub hospitals: Vec<DoctorHospital>,
    /// Weekday names, e.g. `"Monday"`.
    #[serde(default)]
    pub available_days: Vec<String>,
    #[serde(default)]
    pub available_times: Vec<String>,
}

impl Doctor {
    pub fn hospital(&self, hospital_id: i64) -> Option<&DoctorHospital> {
        self.hospitals.iter().find(|h| h.hospital_id == hospital_id)
    }

    pub fn specialty_label(&self) -> &str {
        self.specialty.as_deref().unwrap_or("General Medicine")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub description: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub logo: Option<String>,
    #[serde(default)]
    pub doctors: Vec<Doctor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialty {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
}
