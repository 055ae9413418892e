//! Dossiers de santé des patients (rapports, analyses, notes)

use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{matches_filter, now, today, Record, Store, StoreError};
use crate::consts;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct HealthRecord {
    pub id: u64,
    pub patient_name: String,
    pub record_type: String,
    pub description: String,
    #[serde(default)]
    pub language: String,
    /// Données libres du rapport, par exemple le résultat d'une analyse de symptômes
    #[serde(default)]
    pub report_data: Map<String, Value>,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
}

impl Record for HealthRecord {
    const FILE: &'static str = consts::HEALTH_RECORDS_FILE;

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Clone, Debug)]
pub struct NewHealthRecord {
    pub patient_name: String,
    pub record_type: String,
    pub description: String,
    pub language: String,
    pub report_data: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct HealthRecordUpdate {
    pub record_type: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub report_data: Option<Map<String, Value>>,
}

impl HealthRecordUpdate {
    fn apply(self, record: &mut HealthRecord) {
        if let Some(record_type) = self.record_type {
            record.record_type = record_type;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(language) = self.language {
            record.language = language;
        }
        if let Some(report_data) = self.report_data {
            record.report_data = report_data;
        }
    }
}

impl Store {
    pub fn add_health_record(&self, new: NewHealthRecord) -> Result<HealthRecord, StoreError> {
        let record = self.insert(|id| HealthRecord {
            id,
            patient_name: new.patient_name,
            record_type: new.record_type,
            description: new.description,
            language: new.language,
            report_data: new.report_data.unwrap_or_default(),
            date: today(),
            created_at: now(),
        })?;
        info!("Health record {} created", record.id);
        Ok(record)
    }

    pub fn get_health_records(
        &self,
        patient_name: Option<&str>,
    ) -> Result<Vec<HealthRecord>, StoreError> {
        self.filter(|r: &HealthRecord| matches_filter(patient_name, &[&r.patient_name]))
    }

    pub fn update_health_record(
        &self,
        id: u64,
        update: HealthRecordUpdate,
    ) -> Result<Option<HealthRecord>, StoreError> {
        self.update(id, |r| update.apply(r))
    }

    pub fn delete_health_record(&self, id: u64) -> Result<bool, StoreError> {
        self.delete::<HealthRecord>(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::temp_store;
    use serde_json::json;

    #[test]
    fn test_report_data_defaults_to_empty_object() {
        let (_dir, store) = temp_store();
        let record = store
            .add_health_record(NewHealthRecord {
                patient_name: "Meera".into(),
                record_type: "Lab Report".into(),
                description: "CBC normal".into(),
                language: "English".into(),
                report_data: None,
            })
            .unwrap();

        assert!(record.report_data.is_empty());
        assert_eq!(store.get_health_records(Some("meera")).unwrap(), vec![record]);
    }

    #[test]
    fn test_nested_report_data_survives_rewrite() {
        let (_dir, store) = temp_store();
        let data = json!({"severity_level": "High", "possible_conditions": ["Flu"]});
        let record = store
            .add_health_record(NewHealthRecord {
                patient_name: "Meera".into(),
                record_type: "Symptom Analysis".into(),
                description: "fever and cough".into(),
                language: "English".into(),
                report_data: data.as_object().cloned(),
            })
            .unwrap();

        store
            .update_health_record(
                record.id,
                HealthRecordUpdate {
                    description: Some("fever, cough and fatigue".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let stored = &store.get_health_records(None).unwrap()[0];
        assert_eq!(stored.description, "fever, cough and fatigue");
        assert_eq!(Value::Object(stored.report_data.clone()), data);
    }

    #[test]
    fn test_delete_unknown_id_leaves_records() {
        let (_dir, store) = temp_store();
        store
            .add_health_record(NewHealthRecord {
                patient_name: "Meera".into(),
                record_type: "Note".into(),
                description: "-".into(),
                language: "English".into(),
                report_data: None,
            })
            .unwrap();

        assert!(!store.delete_health_record(99).unwrap());
        assert_eq!(store.get_health_records(None).unwrap().len(), 1);
    }
}
