//! Profil de santé d'un utilisateur, utilisé comme contexte pour l'IA

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{now, Record, Store, StoreError, Table};
use crate::consts;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct HealthProfile {
    pub id: u64,
    pub user_id: u64,
    #[serde(flatten)]
    pub data: ProfileData,
    pub updated_at: NaiveDateTime,
}

impl Record for HealthProfile {
    const FILE: &'static str = consts::HEALTH_PROFILES_FILE;

    fn id(&self) -> u64 {
        self.id
    }
}

/// Les champs modifiables du profil. Tous sont optionnels côté client.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ProfileData {
    pub blood_type: String,
    /// Taille en centimètres
    pub height: f64,
    /// Poids en kilogrammes
    pub weight: f64,
    pub date_of_birth: String,
    pub gender: String,
    pub allergies: String,
    pub chronic_conditions: String,
    pub current_medications: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub primary_doctor: String,
    pub smoking_status: String,
    pub alcohol_status: String,
    pub exercise_frequency: String,
}

impl ProfileData {
    /// Les champs texte libres, pour les valider en une fois
    pub fn text_fields_mut(&mut self) -> [&mut String; 12] {
        [
            &mut self.blood_type,
            &mut self.date_of_birth,
            &mut self.gender,
            &mut self.allergies,
            &mut self.chronic_conditions,
            &mut self.current_medications,
            &mut self.emergency_contact_name,
            &mut self.emergency_contact_phone,
            &mut self.primary_doctor,
            &mut self.smoking_status,
            &mut self.alcohol_status,
            &mut self.exercise_frequency,
        ]
    }
}

impl Store {
    /// Crée ou remplace le profil de l'utilisateur, en conservant son identifiant
    pub fn save_health_profile(
        &self,
        user_id: u64,
        data: ProfileData,
    ) -> Result<HealthProfile, StoreError> {
        self.transact(|table: &mut Table<HealthProfile>| {
            if let Some(existing) = table.find_mut(|p| p.user_id == user_id) {
                existing.data = data;
                existing.updated_at = now();
                return existing.clone();
            }

            let profile = HealthProfile {
                id: table.allocate_id(),
                user_id,
                data,
                updated_at: now(),
            };
            table.push(profile.clone());
            profile
        })
    }

    pub fn get_health_profile(&self, user_id: u64) -> Result<Option<HealthProfile>, StoreError> {
        Ok(self
            .filter(|p: &HealthProfile| p.user_id == user_id)?
            .into_iter()
            .next())
    }

    /// Résume le profil pour l'inclure dans une requête à l'IA.
    /// Retourne `None` s'il n'y a aucun profil ou aucun champ renseigné.
    pub fn get_health_context_for_ai(&self, user_id: u64) -> Result<Option<String>, StoreError> {
        Ok(self
            .get_health_profile(user_id)?
            .and_then(|profile| health_context(&profile.data)))
    }
}

fn health_context(data: &ProfileData) -> Option<String> {
    let mut parts = Vec::new();

    if !data.blood_type.is_empty() {
        parts.push(format!("Blood Type: {}", data.blood_type));
    }
    if !data.gender.is_empty() {
        parts.push(format!("Gender: {}", data.gender));
    }
    if data.height > 0.0 && data.weight > 0.0 {
        parts.push(format!("Height: {}cm, Weight: {}kg", data.height, data.weight));
    }
    if !data.allergies.is_empty() {
        parts.push(format!("ALLERGIES: {}", data.allergies));
    }
    if !data.chronic_conditions.is_empty() {
        parts.push(format!("CHRONIC CONDITIONS: {}", data.chronic_conditions));
    }
    if !data.current_medications.is_empty() {
        parts.push(format!("CURRENT MEDICATIONS: {}", data.current_medications));
    }
    if !data.smoking_status.is_empty() {
        parts.push(format!("Smoking: {}", data.smoking_status));
    }
    if !data.alcohol_status.is_empty() {
        parts.push(format!("Alcohol: {}", data.alcohol_status));
    }

    if parts.is_empty() {
        None
    } else {
        Some(format!("PATIENT HEALTH PROFILE:\n{}", parts.join("\n")))
    }
}
