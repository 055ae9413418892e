//! Définitions des structures pour les interactions avec l'API.
//! Les champs texte sont reçus bruts et validés dans les handlers.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::{ReminderType, Role};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub phone: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

#[derive(Deserialize)]
pub struct PatientNameRequest {
    pub patient_name: String,
}

#[derive(Deserialize)]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct UsersQuery {
    pub role: Option<Role>,
}

/// Filtre optionnel sur le nom du patient (ou du médecin pour les rendez-vous)
#[derive(Deserialize, Default)]
pub struct FilterQuery {
    pub filter: Option<String>,
}

#[derive(Deserialize)]
pub struct SymptomsRequest {
    pub symptoms: String,
    pub language: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    /// Par défaut, le rôle de l'utilisateur connecté
    pub speaker: Option<Role>,
    pub source_language: Option<String>,
    pub target_language: String,
}

#[derive(Deserialize)]
pub struct PrescriptionTranslationRequest {
    pub text: String,
    pub doctor_language: String,
    pub patient_language: String,
}

#[derive(Deserialize)]
pub struct HospitalSearchRequest {
    pub city: String,
    pub specialty: Option<String>,
    pub language: Option<String>,
}

#[derive(Deserialize)]
pub struct AppointmentRequest {
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub doctor_name: String,
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct PrescriptionRequest {
    pub patient_name: String,
    pub medication: String,
    pub dosage: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub translated_text: Option<String>,
}

#[derive(Deserialize)]
pub struct HealthRecordRequest {
    #[serde(default)]
    pub patient_name: String,
    pub record_type: String,
    pub description: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub report_data: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
pub struct ReminderRequest {
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub reminder_type: ReminderType,
    pub message: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Deserialize)]
pub struct MedicationRequest {
    #[serde(default)]
    pub patient_name: String,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct SaveHospitalRequest {
    pub hospital_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub city: String,
    pub distance_km: Option<f64>,
}

#[derive(Deserialize)]
pub struct SupportRequest {
    pub category: String,
    pub description: String,
}
