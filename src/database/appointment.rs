//! Rendez-vous entre patients et médecins

use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use serde::{Deserialize, Serialize};

use super::{matches_filter, now, Record, Store, StoreError};
use crate::{consts, models::AppointmentStatus};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Appointment {
    pub id: u64,
    pub patient_name: String,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
}

impl Record for Appointment {
    const FILE: &'static str = consts::APPOINTMENTS_FILE;

    fn id(&self) -> u64 {
        self.id
    }
}

/// Les champs fournis lors d'une prise de rendez-vous
#[derive(Clone, Debug)]
pub struct NewAppointment {
    pub patient_name: String,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub time: String,
    pub language: String,
    pub notes: String,
}

/// Modification partielle: seuls les champs présents sont appliqués
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppointmentUpdate {
    pub doctor_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub language: Option<String>,
    pub notes: Option<String>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentUpdate {
    fn apply(self, appointment: &mut Appointment) {
        if let Some(doctor_name) = self.doctor_name {
            appointment.doctor_name = doctor_name;
        }
        if let Some(date) = self.date {
            appointment.date = date;
        }
        if let Some(time) = self.time {
            appointment.time = time;
        }
        if let Some(language) = self.language {
            appointment.language = language;
        }
        if let Some(notes) = self.notes {
            appointment.notes = notes;
        }
        if let Some(status) = self.status {
            appointment.status = status;
        }
    }
}

impl Store {
    pub fn add_appointment(&self, new: NewAppointment) -> Result<Appointment, StoreError> {
        let appointment = self.insert(|id| Appointment {
            id,
            patient_name: new.patient_name,
            doctor_name: new.doctor_name,
            date: new.date,
            time: new.time,
            language: new.language,
            notes: new.notes,
            status: AppointmentStatus::Scheduled,
            created_at: now(),
        })?;
        info!("Appointment {} created", appointment.id);
        Ok(appointment)
    }

    /// Filtre sur le nom du patient ou du médecin
    pub fn get_appointments(&self, filter: Option<&str>) -> Result<Vec<Appointment>, StoreError> {
        self.filter(|a: &Appointment| matches_filter(filter, &[&a.patient_name, &a.doctor_name]))
    }

    pub fn update_appointment(
        &self,
        id: u64,
        update: AppointmentUpdate,
    ) -> Result<Option<Appointment>, StoreError> {
        self.update(id, |a| update.apply(a))
    }

    pub fn delete_appointment(&self, id: u64) -> Result<bool, StoreError> {
        self.delete::<Appointment>(id)
    }
}
