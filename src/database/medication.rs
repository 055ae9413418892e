//! Suivi des traitements médicamenteux en cours

use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use serde::{Deserialize, Serialize};

use super::{matches_filter, now, Record, Store, StoreError};
use crate::{consts, models::MedicationStatus};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Medication {
    pub id: u64,
    pub patient_name: String,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: MedicationStatus,
    pub created_at: NaiveDateTime,
}

impl Record for Medication {
    const FILE: &'static str = consts::MEDICATIONS_FILE;

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Clone, Debug)]
pub struct NewMedication {
    pub patient_name: String,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MedicationUpdate {
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub status: Option<MedicationStatus>,
}

impl MedicationUpdate {
    fn apply(self, medication: &mut Medication) {
        if let Some(dosage) = self.dosage {
            medication.dosage = dosage;
        }
        if let Some(frequency) = self.frequency {
            medication.frequency = frequency;
        }
        if let Some(end_date) = self.end_date {
            medication.end_date = Some(end_date);
        }
        if let Some(notes) = self.notes {
            medication.notes = notes;
        }
        if let Some(status) = self.status {
            medication.status = status;
        }
    }
}

impl Store {
    pub fn add_medication(&self, new: NewMedication) -> Result<Medication, StoreError> {
        let medication = self.insert(|id| Medication {
            id,
            patient_name: new.patient_name,
            medication_name: new.medication_name,
            dosage: new.dosage,
            frequency: new.frequency,
            start_date: new.start_date,
            end_date: new.end_date,
            notes: new.notes,
            status: MedicationStatus::Active,
            created_at: now(),
        })?;
        info!("Medication {} created", medication.id);
        Ok(medication)
    }

    pub fn get_medications(
        &self,
        patient_name: Option<&str>,
    ) -> Result<Vec<Medication>, StoreError> {
        self.filter(|m: &Medication| matches_filter(patient_name, &[&m.patient_name]))
    }

    pub fn update_medication(
        &self,
        id: u64,
        update: MedicationUpdate,
    ) -> Result<Option<Medication>, StoreError> {
        self.update(id, |m| update.apply(m))
    }

    pub fn delete_medication(&self, id: u64) -> Result<bool, StoreError> {
        self.delete::<Medication>(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::temp_store;

    #[test]
    fn test_discontinue_medication() {
        let (_dir, store) = temp_store();
        let start = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let created = store
            .add_medication(NewMedication {
                patient_name: "Farah".into(),
                medication_name: "Metformin".into(),
                dosage: "500mg".into(),
                frequency: "Twice daily".into(),
                start_date: start,
                end_date: None,
                notes: String::new(),
            })
            .unwrap();
        assert_eq!(created.status, MedicationStatus::Active);

        let end = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        let updated = store
            .update_medication(
                created.id,
                MedicationUpdate {
                    end_date: Some(end),
                    status: Some(MedicationStatus::Discontinued),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.end_date, Some(end));
        assert_eq!(updated.status, MedicationStatus::Discontinued);
        assert_eq!(updated.start_date, start);
        assert_eq!(updated.dosage, "500mg");
    }
}
