//! Ordonnances rédigées par les médecins

use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use serde::{Deserialize, Serialize};

use super::{matches_filter, now, today, Record, Store, StoreError};
use crate::consts;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Prescription {
    pub id: u64,
    pub patient_name: String,
    pub doctor_name: String,
    pub medication: String,
    pub dosage: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub translated_text: String,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
}

impl Record for Prescription {
    const FILE: &'static str = consts::PRESCRIPTIONS_FILE;

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Clone, Debug)]
pub struct NewPrescription {
    pub patient_name: String,
    pub doctor_name: String,
    pub medication: String,
    pub dosage: String,
    pub instructions: String,
    pub language: String,
    pub translated_text: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PrescriptionUpdate {
    pub medication: Option<String>,
    pub dosage: Option<String>,
    pub instructions: Option<String>,
    pub language: Option<String>,
    pub translated_text: Option<String>,
}

impl PrescriptionUpdate {
    fn apply(self, prescription: &mut Prescription) {
        if let Some(medication) = self.medication {
            prescription.medication = medication;
        }
        if let Some(dosage) = self.dosage {
            prescription.dosage = dosage;
        }
        if let Some(instructions) = self.instructions {
            prescription.instructions = instructions;
        }
        if let Some(language) = self.language {
            prescription.language = language;
        }
        if let Some(translated_text) = self.translated_text {
            prescription.translated_text = translated_text;
        }
    }
}

impl Store {
    pub fn add_prescription(&self, new: NewPrescription) -> Result<Prescription, StoreError> {
        let prescription = self.insert(|id| Prescription {
            id,
            patient_name: new.patient_name,
            doctor_name: new.doctor_name,
            medication: new.medication,
            dosage: new.dosage,
            instructions: new.instructions,
            language: new.language,
            translated_text: new.translated_text,
            date: today(),
            created_at: now(),
        })?;
        info!("Prescription {} created", prescription.id);
        Ok(prescription)
    }

    pub fn get_prescriptions(
        &self,
        patient_name: Option<&str>,
    ) -> Result<Vec<Prescription>, StoreError> {
        self.filter(|p: &Prescription| matches_filter(patient_name, &[&p.patient_name]))
    }

    pub fn update_prescription(
        &self,
        id: u64,
        update: PrescriptionUpdate,
    ) -> Result<Option<Prescription>, StoreError> {
        self.update(id, |p| update.apply(p))
    }

    pub fn delete_prescription(&self, id: u64) -> Result<bool, StoreError> {
        self.delete::<Prescription>(id)
    }
}
