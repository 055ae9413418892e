//! Statistiques d'utilisation anonymes, stockées dans un seul document JSON

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{today, Store, StoreError};
use crate::{consts, models::Role};

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Analytics {
    pub feature_clicks: BTreeMap<String, u64>,
    pub language_usage: BTreeMap<String, u64>,
    pub symptom_keywords: BTreeMap<String, u64>,
    pub role_sessions: RoleSessions,
    /// Visites par jour, clé au format `YYYY-MM-DD`
    pub daily_visits: BTreeMap<NaiveDate, u64>,
    pub total_sessions: u64,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RoleSessions {
    #[serde(rename = "Patient")]
    pub patient: u64,
    #[serde(rename = "Doctor")]
    pub doctor: u64,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct AnalyticsSummary {
    pub top_features: Vec<(String, u64)>,
    pub language_usage: BTreeMap<String, u64>,
    pub top_symptoms: Vec<(String, u64)>,
    pub role_sessions: RoleSessions,
    pub total_sessions: u64,
    /// Les 7 derniers jours, aujourd'hui inclus, à zéro s'il n'y a eu aucune visite
    pub last_7_days: BTreeMap<NaiveDate, u64>,
}

/// Statistiques affichables publiquement, sans donnée personnelle
#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
pub struct PublicStats {
    pub total_users: u64,
    pub languages_used: usize,
    pub patients_helped: u64,
    pub doctors_assisted: u64,
    pub symptoms_analyzed: u64,
    pub total_visits: u64,
}

const TOP_COUNT: usize = 10;

fn increment(counts: &mut BTreeMap<String, u64>, key: &str) {
    *counts.entry(key.to_string()).or_default() += 1;
}

fn top(counts: &BTreeMap<String, u64>) -> Vec<(String, u64)> {
    let mut sorted: Vec<_> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    // Tri stable: à égalité, l'ordre alphabétique est conservé
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted.truncate(TOP_COUNT);
    sorted
}

impl Store {
    fn track(&self, operation: impl FnOnce(&mut Analytics)) -> Result<(), StoreError> {
        self.modify_document(consts::ANALYTICS_FILE, operation)
    }

    pub fn track_feature_click(&self, feature: &str) -> Result<(), StoreError> {
        self.track(|a| increment(&mut a.feature_clicks, feature))
    }

    pub fn track_language_usage(&self, language: &str) -> Result<(), StoreError> {
        self.track(|a| increment(&mut a.language_usage, language))
    }

    /// Compte chaque mot-clé connu présent dans la description. Le texte lui-même n'est pas conservé.
    pub fn track_symptom_keyword(&self, text: &str) -> Result<(), StoreError> {
        let lowered = text.to_lowercase();
        let found: Vec<&str> = consts::COMMON_SYMPTOMS
            .iter()
            .copied()
            .filter(|keyword| lowered.contains(keyword))
            .collect();

        if found.is_empty() {
            return Ok(());
        }
        self.track(|a| {
            for keyword in found {
                increment(&mut a.symptom_keywords, keyword);
            }
        })
    }

    pub fn track_role_session(&self, role: Role) -> Result<(), StoreError> {
        self.track(|a| match role {
            Role::Patient => a.role_sessions.patient += 1,
            Role::Doctor => a.role_sessions.doctor += 1,
        })
    }

    pub fn track_daily_visit(&self) -> Result<(), StoreError> {
        let day = today();
        self.track(|a| {
            *a.daily_visits.entry(day).or_default() += 1;
            a.total_sessions += 1;
        })
    }

    pub fn get_analytics(&self) -> Result<Analytics, StoreError> {
        self.read_document(consts::ANALYTICS_FILE)
    }

    pub fn get_analytics_summary(&self) -> Result<AnalyticsSummary, StoreError> {
        let analytics = self.get_analytics()?;
        let day = today();

        let last_7_days = (0..7)
            .map(|offset| day - Duration::days(offset))
            .map(|date| (date, analytics.daily_visits.get(&date).copied().unwrap_or(0)))
            .collect();

        Ok(AnalyticsSummary {
            top_features: top(&analytics.feature_clicks),
            top_symptoms: top(&analytics.symptom_keywords),
            language_usage: analytics.language_usage,
            role_sessions: analytics.role_sessions,
            total_sessions: analytics.total_sessions,
            last_7_days,
        })
    }

    pub fn get_public_stats(&self) -> Result<PublicStats, StoreError> {
        let analytics = self.get_analytics()?;

        Ok(PublicStats {
            total_users: analytics.total_sessions,
            languages_used: analytics.language_usage.values().filter(|c| **c > 0).count(),
            patients_helped: analytics.role_sessions.patient,
            doctors_assisted: analytics.role_sessions.doctor,
            symptoms_analyzed: analytics.symptom_keywords.values().sum(),
            total_visits: analytics.daily_visits.values().sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::temp_store;

    #[test]
    fn test_symptom_keywords_are_counted_once_per_call() {
        let (_dir, store) = temp_store();
        store
            .track_symptom_keyword("Severe HEADACHE and fever since yesterday, headache again")
            .unwrap();
        store.track_symptom_keyword("मुझे बुखार है").unwrap();
        store.track_symptom_keyword("nothing relevant").unwrap();

        let analytics = store.get_analytics().unwrap();
        assert_eq!(analytics.symptom_keywords.get("headache"), Some(&1));
        assert_eq!(analytics.symptom_keywords.get("fever"), Some(&1));
        assert_eq!(analytics.symptom_keywords.get("बुखार"), Some(&1));
        assert_eq!(analytics.symptom_keywords.len(), 3);
    }

    #[test]
    fn test_daily_visit_increments_total() {
        let (_dir, store) = temp_store();
        store.track_daily_visit().unwrap();
        store.track_daily_visit().unwrap();

        let summary = store.get_analytics_summary().unwrap();
        assert_eq!(summary.total_sessions, 2);
        assert_eq!(summary.last_7_days.len(), 7);
        assert_eq!(summary.last_7_days.get(&today()), Some(&2));
        assert_eq!(summary.last_7_days.values().sum::<u64>(), 2);
    }

    #[test]
    fn test_top_features_sorted_and_truncated() {
        let (_dir, store) = temp_store();
        for i in 0..12 {
            store.track_feature_click(&format!("feature-{i:02}")).unwrap();
        }
        for _ in 0..3 {
            store.track_feature_click("symptom-checker").unwrap();
        }

        let summary = store.get_analytics_summary().unwrap();
        assert_eq!(summary.top_features.len(), 10);
        assert_eq!(summary.top_features[0], ("symptom-checker".to_string(), 3));
        assert_eq!(summary.top_features[1], ("feature-00".to_string(), 1));
    }

    #[test]
    fn test_public_stats() {
        let (_dir, store) = temp_store();
        store.track_role_session(Role::Patient).unwrap();
        store.track_role_session(Role::Patient).unwrap();
        store.track_role_session(Role::Doctor).unwrap();
        store.track_language_usage("English").unwrap();
        store.track_language_usage("தமிழ் (Tamil)").unwrap();
        store.track_symptom_keyword("cough and cold").unwrap();
        store.track_daily_visit().unwrap();

        let stats = store.get_public_stats().unwrap();
        assert_eq!(
            stats,
            PublicStats {
                total_users: 1,
                languages_used: 2,
                patients_helped: 2,
                doctors_assisted: 1,
                symptoms_analyzed: 2,
                total_visits: 1,
            }
        );
    }

    #[test]
    fn test_legacy_document_shape_is_readable() {
        let (dir, store) = temp_store();
        std::fs::write(
            dir.path().join(consts::ANALYTICS_FILE),
            r#"{"role_sessions": {"Patient": 4, "Doctor": 1}, "daily_visits": {"2024-03-01": 2}, "total_sessions": 2}"#,
        )
        .unwrap();

        let analytics = store.get_analytics().unwrap();
        assert_eq!(analytics.role_sessions, RoleSessions { patient: 4, doctor: 1 });
        assert!(analytics.feature_clicks.is_empty());
        assert_eq!(store.get_public_stats().unwrap().total_visits, 2);
    }
}
