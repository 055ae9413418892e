//! Hôpitaux enregistrés par les utilisateurs

use chrono::NaiveDateTime;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{now, Record, Store, StoreError, Table};
use crate::consts;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SavedHospital {
    pub id: u64,
    pub user_id: u64,
    pub hospital_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub distance_km: Option<f64>,
    pub saved_at: NaiveDateTime,
}

impl Record for SavedHospital {
    const FILE: &'static str = consts::SAVED_HOSPITALS_FILE;

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Clone, Debug)]
pub struct NewSavedHospital {
    pub user_id: u64,
    pub hospital_name: String,
    pub address: String,
    pub phone: String,
    pub specialties: Vec<String>,
    pub city: String,
    pub distance_km: Option<f64>,
}

#[derive(Debug, Error)]
pub enum SaveHospitalError {
    #[error("Hospital already saved")]
    AlreadySaved,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Store {
    /// Enregistre un hôpital, sauf si l'utilisateur l'a déjà enregistré sous le même nom
    pub fn add_saved_hospital(
        &self,
        new: NewSavedHospital,
    ) -> Result<SavedHospital, SaveHospitalError> {
        let saved = self.transact(|table: &mut Table<SavedHospital>| {
            let duplicate = table
                .iter()
                .any(|h| h.user_id == new.user_id && h.hospital_name == new.hospital_name);
            if duplicate {
                return None;
            }

            let hospital = SavedHospital {
                id: table.allocate_id(),
                user_id: new.user_id,
                hospital_name: new.hospital_name,
                address: new.address,
                phone: new.phone,
                specialties: new.specialties,
                city: new.city,
                distance_km: new.distance_km,
                saved_at: now(),
            };
            table.push(hospital.clone());
            Some(hospital)
        })?;

        let hospital = saved.ok_or(SaveHospitalError::AlreadySaved)?;
        info!("Hospital {} saved for user {}", hospital.id, hospital.user_id);
        Ok(hospital)
    }

    pub fn get_saved_hospitals(&self, user_id: Option<u64>) -> Result<Vec<SavedHospital>, StoreError> {
        self.filter(|h: &SavedHospital| user_id.map_or(true, |uid| h.user_id == uid))
    }

    pub fn delete_saved_hospital(&self, id: u64) -> Result<bool, StoreError> {
        self.delete::<SavedHospital>(id)
    }
}
