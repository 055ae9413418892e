//! Routes des dossiers médicaux: rendez-vous, ordonnances, dossiers de santé,
//! rappels et traitements.
//!
//! Un patient ne voit et ne modifie que les enregistrements au nom de son compte.
//! Un médecin accède à tous, et peut filtrer par nom.

use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use http::StatusCode;
use log::warn;

use super::{
    can_access, clean_update, language_or_session, long_text,
    middlewares::{DoctorUser, SessionUser},
    models::{
        AppointmentRequest, FilterQuery, HealthRecordRequest, MedicationRequest,
        PrescriptionRequest, ReminderRequest,
    },
    optional_long_text, short_text, storage_error, supported_language, AppState, HandlerError,
};
use crate::{
    database::{
        appointment::{Appointment, AppointmentUpdate, NewAppointment},
        health_record::{HealthRecord, HealthRecordUpdate, NewHealthRecord},
        medication::{Medication, MedicationUpdate, NewMedication},
        prescription::{NewPrescription, Prescription, PrescriptionUpdate},
        reminder::{NewReminder, Reminder, ReminderUpdate},
        today, Record,
    },
    models::{ReminderType, Role},
    utils::{
        error_messages::{NOT_FOUND, VALIDATION_ERROR},
        validation::PhoneInput,
    },
};

/// Filtre appliqué à la lecture: le nom du compte pour un patient,
/// le filtre de la requête pour un médecin.
fn read_filter<'a>(user: &'a SessionUser, query: &'a FilterQuery) -> Option<&'a str> {
    match user.role() {
        Role::Patient => Some(user.user.name.as_str()),
        Role::Doctor => query.filter.as_deref().map(str::trim).filter(|f| !f.is_empty()),
    }
}

/// Ne garde que les enregistrements accessibles à l'utilisateur
fn visible<T>(user: &SessionUser, records: Vec<T>, patient_of: impl Fn(&T) -> &str) -> Vec<T> {
    records
        .into_iter()
        .filter(|record| can_access(user, patient_of(record)))
        .collect()
}

/// Nom du patient d'un nouvel enregistrement: imposé pour un patient, fourni par un médecin
fn patient_for_new(user: &SessionUser, requested: &str) -> Result<String, HandlerError> {
    match user.role() {
        Role::Patient => short_text(&user.user.name),
        Role::Doctor => short_text(requested),
    }
}

/// Charge un enregistrement existant et vérifie que l'utilisateur y a accès.
/// Un enregistrement inaccessible est traité comme inexistant.
fn accessible<T: Record>(
    state: &AppState,
    user: &SessionUser,
    id: u64,
    patient_of: impl Fn(&T) -> &str,
) -> Result<T, HandlerError> {
    state
        .store
        .find::<T>(id)
        .map_err(storage_error)?
        .filter(|record| can_access(user, patient_of(record)))
        .ok_or((StatusCode::NOT_FOUND, NOT_FOUND))
}

fn optional_language(field: &mut Option<String>) -> Result<(), HandlerError> {
    if let Some(raw) = field.as_deref() {
        *field = Some(supported_language(raw)?);
    }
    Ok(())
}

fn deleted(removed: bool) -> axum::response::Result<StatusCode> {
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, NOT_FOUND).into())
    }
}

// Rendez-vous

fn appointment_reminder_message(appointment: &Appointment) -> String {
    let doctor = appointment.doctor_name.trim();
    let doctor = doctor
        .strip_prefix("Dr.")
        .or_else(|| doctor.strip_prefix("Dr "))
        .unwrap_or(doctor)
        .trim();
    format!(
        "Reminder: You have an appointment with Dr. {} on {} at {}",
        doctor,
        appointment.date.format("%Y-%m-%d"),
        appointment.time
    )
}

pub async fn list_appointments(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Query(query): Query<FilterQuery>,
) -> axum::response::Result<Json<Vec<Appointment>>> {
    let appointments = state
        .store
        .get_appointments(read_filter(&user, &query))
        .map_err(storage_error)?;
    Ok(Json(visible(&user, appointments, |a| a.patient_name.as_str())))
}

pub async fn create_appointment(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Json(payload): Json<AppointmentRequest>,
) -> axum::response::Result<(StatusCode, Json<Appointment>)> {
    let doctor_name = match (user.role(), payload.doctor_name.trim()) {
        (Role::Doctor, "") => user.user.name.clone(),
        (_, name) => short_text(name)?,
    };

    let appointment = state
        .store
        .add_appointment(NewAppointment {
            patient_name: patient_for_new(&user, &payload.patient_name)?,
            doctor_name,
            date: payload.date,
            time: short_text(&payload.time)?,
            language: language_or_session(payload.language.as_deref(), &user)?,
            notes: optional_long_text(payload.notes.as_deref())?,
        })
        .map_err(storage_error)?;

    // Chaque rendez-vous pris reçoit son rappel
    let phone_number = match user.role() {
        Role::Patient => user.user.phone.clone(),
        Role::Doctor => String::new(),
    };
    if let Err(e) = state.store.add_reminder(NewReminder {
        patient_name: appointment.patient_name.clone(),
        reminder_type: ReminderType::Appointment,
        message: appointment_reminder_message(&appointment),
        language: appointment.language.clone(),
        phone_number,
    }) {
        warn!("Failed to add reminder for appointment {}: {}", appointment.id, e);
    }

    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn update_appointment(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<u64>,
    Json(mut update): Json<AppointmentUpdate>,
) -> axum::response::Result<Json<Appointment>> {
    accessible::<Appointment>(&state, &user, id, |a| a.patient_name.as_str())?;

    clean_update(&mut update.doctor_name)?;
    clean_update(&mut update.time)?;
    clean_update(&mut update.notes)?;
    optional_language(&mut update.language)?;

    let appointment = state
        .store
        .update_appointment(id, update)
        .map_err(storage_error)?
        .ok_or((StatusCode::NOT_FOUND, NOT_FOUND))?;
    Ok(Json(appointment))
}

pub async fn delete_appointment(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<u64>,
) -> axum::response::Result<StatusCode> {
    accessible::<Appointment>(&state, &user, id, |a| a.patient_name.as_str())?;
    deleted(state.store.delete_appointment(id).map_err(storage_error)?)
}

// Ordonnances: lecture pour tous, écriture réservée aux médecins

pub async fn list_prescriptions(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Query(query): Query<FilterQuery>,
) -> axum::response::Result<Json<Vec<Prescription>>> {
    let prescriptions = state
        .store
        .get_prescriptions(read_filter(&user, &query))
        .map_err(storage_error)?;
    Ok(Json(visible(&user, prescriptions, |p| p.patient_name.as_str())))
}

pub async fn create_prescription(
    Extension(state): Extension<Arc<AppState>>,
    DoctorUser(doctor): DoctorUser,
    Json(payload): Json<PrescriptionRequest>,
) -> axum::response::Result<(StatusCode, Json<Prescription>)> {
    let prescription = state
        .store
        .add_prescription(NewPrescription {
            patient_name: short_text(&payload.patient_name)?,
            doctor_name: doctor.user.name.clone(),
            medication: short_text(&payload.medication)?,
            dosage: short_text(&payload.dosage)?,
            instructions: optional_long_text(payload.instructions.as_deref())?,
            language: language_or_session(payload.language.as_deref(), &doctor)?,
            translated_text: optional_long_text(payload.translated_text.as_deref())?,
        })
        .map_err(storage_error)?;

    Ok((StatusCode::CREATED, Json(prescription)))
}

pub async fn update_prescription(
    Extension(state): Extension<Arc<AppState>>,
    DoctorUser(_doctor): DoctorUser,
    Path(id): Path<u64>,
    Json(mut update): Json<PrescriptionUpdate>,
) -> axum::response::Result<Json<Prescription>> {
    clean_update(&mut update.medication)?;
    clean_update(&mut update.dosage)?;
    clean_update(&mut update.instructions)?;
    clean_update(&mut update.translated_text)?;
    optional_language(&mut update.language)?;

    let prescription = state
        .store
        .update_prescription(id, update)
        .map_err(storage_error)?
        .ok_or((StatusCode::NOT_FOUND, NOT_FOUND))?;
    Ok(Json(prescription))
}

pub async fn delete_prescription(
    Extension(state): Extension<Arc<AppState>>,
    DoctorUser(_doctor): DoctorUser,
    Path(id): Path<u64>,
) -> axum::response::Result<StatusCode> {
    deleted(state.store.delete_prescription(id).map_err(storage_error)?)
}

// Dossiers de santé

pub async fn list_health_records(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Query(query): Query<FilterQuery>,
) -> axum::response::Result<Json<Vec<HealthRecord>>> {
    let records = state
        .store
        .get_health_records(read_filter(&user, &query))
        .map_err(storage_error)?;
    Ok(Json(visible(&user, records, |r| r.patient_name.as_str())))
}

pub async fn create_health_record(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Json(payload): Json<HealthRecordRequest>,
) -> axum::response::Result<(StatusCode, Json<HealthRecord>)> {
    let record = state
        .store
        .add_health_record(NewHealthRecord {
            patient_name: patient_for_new(&user, &payload.patient_name)?,
            record_type: short_text(&payload.record_type)?,
            description: long_text(&payload.description)?,
            language: language_or_session(payload.language.as_deref(), &user)?,
            report_data: payload.report_data,
        })
        .map_err(storage_error)?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_health_record(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<u64>,
    Json(mut update): Json<HealthRecordUpdate>,
) -> axum::response::Result<Json<HealthRecord>> {
    accessible::<HealthRecord>(&state, &user, id, |r| r.patient_name.as_str())?;

    clean_update(&mut update.record_type)?;
    clean_update(&mut update.description)?;
    optional_language(&mut update.language)?;

    let record = state
        .store
        .update_health_record(id, update)
        .map_err(storage_error)?
        .ok_or((StatusCode::NOT_FOUND, NOT_FOUND))?;
    Ok(Json(record))
}

pub async fn delete_health_record(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<u64>,
) -> axum::response::Result<StatusCode> {
    accessible::<HealthRecord>(&state, &user, id, |r| r.patient_name.as_str())?;
    deleted(state.store.delete_health_record(id).map_err(storage_error)?)
}

// Rappels

pub async fn list_reminders(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Query(query): Query<FilterQuery>,
) -> axum::response::Result<Json<Vec<Reminder>>> {
    let reminders = state
        .store
        .get_reminders(read_filter(&user, &query))
        .map_err(storage_error)?;
    Ok(Json(visible(&user, reminders, |r| r.patient_name.as_str())))
}

pub async fn create_reminder(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Json(payload): Json<ReminderRequest>,
) -> axum::response::Result<(StatusCode, Json<Reminder>)> {
    let phone_number = PhoneInput::optional(&payload.phone_number)
        .map_err(|_| (StatusCode::BAD_REQUEST, VALIDATION_ERROR))?
        .map(PhoneInput::into_string)
        .unwrap_or_default();

    let reminder = state
        .store
        .add_reminder(NewReminder {
            patient_name: patient_for_new(&user, &payload.patient_name)?,
            reminder_type: payload.reminder_type,
            message: long_text(&payload.message)?,
            language: language_or_session(payload.language.as_deref(), &user)?,
            phone_number,
        })
        .map_err(storage_error)?;

    Ok((StatusCode::CREATED, Json(reminder)))
}

pub async fn update_reminder(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<u64>,
    Json(mut update): Json<ReminderUpdate>,
) -> axum::response::Result<Json<Reminder>> {
    accessible::<Reminder>(&state, &user, id, |r| r.patient_name.as_str())?;

    clean_update(&mut update.message)?;
    if let Some(phone) = update.phone_number.as_deref() {
        let phone = PhoneInput::optional(phone)
            .map_err(|_| (StatusCode::BAD_REQUEST, VALIDATION_ERROR))?
            .map(PhoneInput::into_string)
            .unwrap_or_default();
        update.phone_number = Some(phone);
    }

    let reminder = state
        .store
        .update_reminder(id, update)
        .map_err(storage_error)?
        .ok_or((StatusCode::NOT_FOUND, NOT_FOUND))?;
    Ok(Json(reminder))
}

pub async fn delete_reminder(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<u64>,
) -> axum::response::Result<StatusCode> {
    accessible::<Reminder>(&state, &user, id, |r| r.patient_name.as_str())?;
    deleted(state.store.delete_reminder(id).map_err(storage_error)?)
}

// Traitements

pub async fn list_medications(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Query(query): Query<FilterQuery>,
) -> axum::response::Result<Json<Vec<Medication>>> {
    let medications = state
        .store
        .get_medications(read_filter(&user, &query))
        .map_err(storage_error)?;
    Ok(Json(visible(&user, medications, |m| m.patient_name.as_str())))
}

pub async fn create_medication(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Json(payload): Json<MedicationRequest>,
) -> axum::response::Result<(StatusCode, Json<Medication>)> {
    let start_date = payload.start_date.unwrap_or_else(today);
    if payload.end_date.is_some_and(|end| end < start_date) {
        return Err((StatusCode::BAD_REQUEST, VALIDATION_ERROR).into());
    }

    let medication = state
        .store
        .add_medication(NewMedication {
            patient_name: patient_for_new(&user, &payload.patient_name)?,
            medication_name: short_text(&payload.medication_name)?,
            dosage: short_text(&payload.dosage)?,
            frequency: short_text(&payload.frequency)?,
            start_date,
            end_date: payload.end_date,
            notes: optional_long_text(payload.notes.as_deref())?,
        })
        .map_err(storage_error)?;

    Ok((StatusCode::CREATED, Json(medication)))
}

pub async fn update_medication(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<u64>,
    Json(mut update): Json<MedicationUpdate>,
) -> axum::response::Result<Json<Medication>> {
    let current = accessible::<Medication>(&state, &user, id, |m| m.patient_name.as_str())?;
    if update.end_date.is_some_and(|end| end < current.start_date) {
        return Err((StatusCode::BAD_REQUEST, VALIDATION_ERROR).into());
    }

    clean_update(&mut update.dosage)?;
    clean_update(&mut update.frequency)?;
    clean_update(&mut update.notes)?;

    let medication = state
        .store
        .update_medication(id, update)
        .map_err(storage_error)?
        .ok_or((StatusCode::NOT_FOUND, NOT_FOUND))?;
    Ok(Json(medication))
}

pub async fn delete_medication(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<u64>,
) -> axum::response::Result<StatusCode> {
    accessible::<Medication>(&state, &user, id, |m| m.patient_name.as_str())?;
    deleted(state.store.delete_medication(id).map_err(storage_error)?)
}
