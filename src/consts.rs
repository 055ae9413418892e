//! Définition des constantes globales pour l'application.

use std::time::Duration;

pub const HTTP_PORT: u16 = 8080; // Port par défaut pour le serveur HTTP.
pub const DATA_DIR: &str = "./health_data"; // Dossier par défaut des fichiers JSON.

pub const USERS_FILE: &str = "users.json";
pub const APPOINTMENTS_FILE: &str = "appointments.json";
pub const PRESCRIPTIONS_FILE: &str = "prescriptions.json";
pub const HEALTH_RECORDS_FILE: &str = "health_records.json";
pub const REMINDERS_FILE: &str = "reminders.json";
pub const MEDICATIONS_FILE: &str = "medications.json";
pub const SAVED_HOSPITALS_FILE: &str = "saved_hospitals.json";
pub const SUPPORT_TICKETS_FILE: &str = "support_tickets.json";
pub const HEALTH_PROFILES_FILE: &str = "health_profiles.json";
pub const ANALYTICS_FILE: &str = "analytics.json";
pub const ID_COUNTERS_FILE: &str = "ids.json"; // Compteurs d'identifiants par entité.

/// Point d'accès par défaut du fournisseur d'IA générative.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
pub const MODEL_FAST: &str = "gemini-1.5-flash";
pub const MODEL_PRO: &str = "gemini-1.5-pro";
pub const MAX_OUTPUT_TOKENS: u32 = 2048;

pub const MAX_RETRIES: u32 = 3; // Nombre total de tentatives.
pub const RETRY_DELAY: Duration = Duration::from_secs(2); // Délai de base, multiplié par la tentative.

/// Fragments de message identifiant une erreur passagère du fournisseur.
pub const TRANSIENT_MARKERS: &[&str] = &["503", "overloaded", "UNAVAILABLE", "429", "RESOURCE_EXHAUSTED"];

pub const DEFAULT_LANGUAGE: &str = "English";

/// Langues proposées, avec leur code ISO 639-1.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("English", "en"),
    ("हिंदी (Hindi)", "hi"),
    ("मराठी (Marathi)", "mr"),
    ("தமிழ் (Tamil)", "ta"),
    ("తెలుగు (Telugu)", "te"),
    ("বাংলা (Bengali)", "bn"),
    ("ગુજરાતી (Gujarati)", "gu"),
    ("ಕನ್ನಡ (Kannada)", "kn"),
    ("മലയാളം (Malayalam)", "ml"),
    ("ਪੰਜਾਬੀ (Punjabi)", "pa"),
];

/// Mots-clés de symptômes comptés (de manière anonyme) par les statistiques.
pub const COMMON_SYMPTOMS: &[&str] = &[
    "headache", "fever", "cough", "cold", "pain", "fatigue", "nausea",
    "dizziness", "chest", "breathing", "stomach", "back", "joint",
    "throat", "skin", "allergy", "infection", "weakness", "anxiety",
    "सिरदर्द", "बुखार", "खांसी", "दर्द", "थकान", "चक्कर",
];

/// Retourne le code ISO d'une langue supportée.
pub fn language_code(language: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, code)| *code)
}
