//! Rappels envoyés aux patients (médicaments, rendez-vous, suivis)

use chrono::{Duration, NaiveDateTime};
use log::info;
use serde::{Deserialize, Serialize};

use super::{matches_filter, now, Record, Store, StoreError};
use crate::{
    consts,
    models::{ReminderStatus, ReminderType},
};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Reminder {
    pub id: u64,
    pub patient_name: String,
    pub reminder_type: ReminderType,
    pub message: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub status: ReminderStatus,
    pub created_at: NaiveDateTime,
    pub scheduled_for: NaiveDateTime,
}

impl Record for Reminder {
    const FILE: &'static str = consts::REMINDERS_FILE;

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Clone, Debug)]
pub struct NewReminder {
    pub patient_name: String,
    pub reminder_type: ReminderType,
    pub message: String,
    pub language: String,
    pub phone_number: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReminderUpdate {
    pub reminder_type: Option<ReminderType>,
    pub message: Option<String>,
    pub phone_number: Option<String>,
    pub status: Option<ReminderStatus>,
    pub scheduled_for: Option<NaiveDateTime>,
}

impl ReminderUpdate {
    fn apply(self, reminder: &mut Reminder) {
        if let Some(reminder_type) = self.reminder_type {
            reminder.reminder_type = reminder_type;
        }
        if let Some(message) = self.message {
            reminder.message = message;
        }
        if let Some(phone_number) = self.phone_number {
            reminder.phone_number = phone_number;
        }
        if let Some(status) = self.status {
            reminder.status = status;
        }
        if let Some(scheduled_for) = self.scheduled_for {
            reminder.scheduled_for = scheduled_for;
        }
    }
}

impl Store {
    /// Crée un rappel en attente, planifié pour le lendemain
    pub fn add_reminder(&self, new: NewReminder) -> Result<Reminder, StoreError> {
        let created_at = now();
        let reminder = self.insert(|id| Reminder {
            id,
            patient_name: new.patient_name,
            reminder_type: new.reminder_type,
            message: new.message,
            language: new.language,
            phone_number: new.phone_number,
            status: ReminderStatus::Pending,
            created_at,
            scheduled_for: created_at + Duration::days(1),
        })?;
        info!("Reminder {} created", reminder.id);
        Ok(reminder)
    }

    pub fn get_reminders(&self, patient_name: Option<&str>) -> Result<Vec<Reminder>, StoreError> {
        self.filter(|r: &Reminder| matches_filter(patient_name, &[&r.patient_name]))
    }

    pub fn update_reminder(
        &self,
        id: u64,
        update: ReminderUpdate,
    ) -> Result<Option<Reminder>, StoreError> {
        self.update(id, |r| update.apply(r))
    }

    pub fn delete_reminder(&self, id: u64) -> Result<bool, StoreError> {
        self.delete::<Reminder>(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::temp_store;

    fn reminder_for(patient: &str) -> NewReminder {
        NewReminder {
            patient_name: patient.to_string(),
            reminder_type: ReminderType::Medication,
            message: "Take your evening dose".to_string(),
            language: "English".to_string(),
            phone_number: "+91 98765 43210".to_string(),
        }
    }

    #[test]
    fn test_new_reminder_is_pending_for_tomorrow() {
        let (_dir, store) = temp_store();
        let reminder = store.add_reminder(reminder_for("Kiran")).unwrap();

        assert_eq!(reminder.status, ReminderStatus::Pending);
        assert_eq!(reminder.scheduled_for - reminder.created_at, Duration::days(1));
    }

    #[test]
    fn test_mark_as_sent() {
        let (_dir, store) = temp_store();
        let first = store.add_reminder(reminder_for("Kiran")).unwrap();
        let second = store.add_reminder(reminder_for("Kiran")).unwrap();

        store
            .update_reminder(
                second.id,
                ReminderUpdate {
                    status: Some(ReminderStatus::Sent),
                    ..Default::default()
                },
            )
            .unwrap();

        let all = store.get_reminders(Some("kiran")).unwrap();
        assert_eq!(all[0], first);
        assert_eq!(all[1].status, ReminderStatus::Sent);
        assert_eq!(all[1].message, second.message);
    }
}
