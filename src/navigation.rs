//! Menu par rôle et résolution des pages.
//!
//! Chaque page a un identifiant stable, indépendant de la langue d'affichage.
//! Les libellés ne servent qu'à l'affichage et jamais à choisir la page.

use std::str::FromStr;

use serde::Serialize;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

use crate::{consts, models::Role};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, EnumIter, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Route {
    Home,
    SymptomChecker,
    AiChat,
    Translation,
    Prescriptions,
    HealthRecords,
    Appointments,
    Reminders,
    PatientRecords,
    Medications,
    Hospitals,
    Support,
    Profile,
    Analytics,
}

const PATIENT_MENU: &[Route] = &[
    Route::Home,
    Route::SymptomChecker,
    Route::AiChat,
    Route::Prescriptions,
    Route::HealthRecords,
    Route::Appointments,
    Route::Reminders,
    Route::Medications,
    Route::Hospitals,
    Route::Support,
    Route::Profile,
];

const DOCTOR_MENU: &[Route] = &[
    Route::Home,
    Route::AiChat,
    Route::Translation,
    Route::Prescriptions,
    Route::Appointments,
    Route::PatientRecords,
    Route::Hospitals,
    Route::Support,
    Route::Profile,
    Route::Analytics,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Unknown page: {0}")]
    Unknown(String),
    #[error("Page {0:?} is not available for this role")]
    Forbidden(Route),
}

/// Une entrée de menu telle que présentée au client
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct MenuItem {
    pub id: Route,
    pub label: &'static str,
    pub path: &'static str,
}

impl Route {
    pub fn id(self) -> &'static str {
        self.into()
    }

    /// Chemin de l'API qui sert les données de la page
    pub fn api_path(self) -> &'static str {
        match self {
            Route::Home => "/api/session",
            Route::SymptomChecker => "/api/ai/symptoms",
            Route::AiChat => "/api/ai/chat",
            Route::Translation => "/api/ai/translation",
            Route::Prescriptions => "/api/prescriptions",
            Route::HealthRecords | Route::PatientRecords => "/api/health-records",
            Route::Appointments => "/api/appointments",
            Route::Reminders => "/api/reminders",
            Route::Medications => "/api/medications",
            Route::Hospitals => "/api/hospitals/saved",
            Route::Support => "/api/support",
            Route::Profile => "/api/profile",
            Route::Analytics => "/api/analytics",
        }
    }

    fn label_en(self) -> &'static str {
        match self {
            Route::Home => "🏠 Home",
            Route::SymptomChecker => "🔍 Symptom Checker",
            Route::AiChat => "💬 AI Chat Assistant",
            Route::Translation => "🌐 Patient-Doctor Translation",
            Route::Prescriptions => "📋 Prescriptions",
            Route::HealthRecords => "📁 Health Records",
            Route::Appointments => "📅 Appointments",
            Route::Reminders => "🔔 My Reminders",
            Route::PatientRecords => "📊 Patient Records",
            Route::Medications => "💊 Medications",
            Route::Hospitals => "🏥 Hospitals",
            Route::Support => "🆘 Support",
            Route::Profile => "👤 Health Profile",
            Route::Analytics => "📈 Analytics",
        }
    }

    fn label_hi(self) -> &'static str {
        match self {
            Route::Home => "🏠 होम",
            Route::SymptomChecker => "🔍 लक्षण जांच",
            Route::AiChat => "💬 एआई सहायक",
            Route::Translation => "🌐 रोगी-डॉक्टर अनुवाद",
            Route::Prescriptions => "📋 पर्चे",
            Route::HealthRecords => "📁 स्वास्थ्य रिकॉर्ड",
            Route::Appointments => "📅 अपॉइंटमेंट",
            Route::Reminders => "🔔 मेरे रिमाइंडर",
            Route::PatientRecords => "📊 रोगी रिकॉर्ड",
            Route::Medications => "💊 दवाइयाँ",
            Route::Hospitals => "🏥 अस्पताल",
            Route::Support => "🆘 सहायता",
            Route::Profile => "👤 स्वास्थ्य प्रोफ़ाइल",
            Route::Analytics => "📈 आंकड़े",
        }
    }

    /// Libellé affiché; l'anglais sert de repli pour les langues sans traduction
    pub fn label(self, language: &str) -> &'static str {
        match consts::language_code(language) {
            Some("hi") => self.label_hi(),
            _ => self.label_en(),
        }
    }
}

pub fn routes_for(role: Role) -> &'static [Route] {
    match role {
        Role::Patient => PATIENT_MENU,
        Role::Doctor => DOCTOR_MENU,
    }
}

pub fn menu_for(role: Role, language: &str) -> Vec<MenuItem> {
    routes_for(role)
        .iter()
        .map(|route| MenuItem {
            id: *route,
            label: route.label(language),
            path: route.api_path(),
        })
        .collect()
}

/// Résout un identifiant de page pour un rôle donné
pub fn navigate(role: Role, id: &str) -> Result<Route, NavigationError> {
    let route = Route::from_str(id).map_err(|_| NavigationError::Unknown(id.to_string()))?;
    if routes_for(role).contains(&route) {
        Ok(route)
    } else {
        Err(NavigationError::Forbidden(route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_ids_are_kebab_case_and_parse_back() {
        for route in Route::iter() {
            assert!(!route.id().contains(char::is_uppercase));
            assert_eq!(Route::from_str(route.id()), Ok(route));
            assert_eq!(serde_json::to_value(route).unwrap(), route.id());
        }
    }

    #[test]
    fn test_every_route_is_reachable_by_some_role() {
        for route in Route::iter() {
            assert!(
                PATIENT_MENU.contains(&route) || DOCTOR_MENU.contains(&route),
                "{route:?} is not in any menu"
            );
        }
    }

    #[test]
    fn test_menu_labels_follow_language_but_ids_do_not() {
        let english = menu_for(Role::Patient, "English");
        let hindi = menu_for(Role::Patient, "हिंदी (Hindi)");

        assert_eq!(english.len(), hindi.len());
        for (en, hi) in english.iter().zip(&hindi) {
            assert_eq!(en.id, hi.id);
            assert_eq!(en.path, hi.path);
        }
        assert_eq!(english[1].label, "🔍 Symptom Checker");
        assert_eq!(hindi[1].label, "🔍 लक्षण जांच");
        // Pas de traduction tamoule: repli sur l'anglais
        assert_eq!(menu_for(Role::Patient, "தமிழ் (Tamil)")[1].label, english[1].label);
    }

    #[test]
    fn test_navigate_checks_role() {
        assert_eq!(navigate(Role::Patient, "symptom-checker"), Ok(Route::SymptomChecker));
        assert_eq!(
            navigate(Role::Patient, "analytics"),
            Err(NavigationError::Forbidden(Route::Analytics))
        );
        assert_eq!(
            navigate(Role::Doctor, "symptom-checker"),
            Err(NavigationError::Forbidden(Route::SymptomChecker))
        );
        assert_eq!(
            navigate(Role::Doctor, "🔍 Symptom Checker"),
            Err(NavigationError::Unknown("🔍 Symptom Checker".into()))
        );
    }
}
