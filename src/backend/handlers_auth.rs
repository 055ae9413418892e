//! Gestion des routes nécessitant une authentification utilisateur:
//! session, navigation, compte, profil de santé, support et statistiques.

use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use http::StatusCode;
use log::{info, warn};
use serde_json::{json, Value};

use super::{
    long_text,
    middlewares::{DoctorUser, SessionUser},
    models::{
        LanguageRequest, PasswordChangeRequest, PatientNameRequest, SaveHospitalRequest,
        SupportRequest, UsersQuery,
    },
    optional_short_text, short_text, storage_error, supported_language, AppState,
};
use crate::{
    database::{
        analytics::AnalyticsSummary,
        hospital::{NewSavedHospital, SaveHospitalError, SavedHospital},
        profile::{HealthProfile, ProfileData},
        support::{NewSupportTicket, SupportTicket},
        user::{AuthError, PublicUser, UserUpdate},
    },
    models::Role,
    navigation::{self, MenuItem, NavigationError},
    session::SessionState,
    utils::{
        error_messages::{FORBIDDEN, LOGIN_ERROR, NOT_FOUND, VALIDATION_ERROR},
        validation::{PasswordInput, PhoneInput},
    },
};

/// État complet de la session courante
pub async fn session_info(user: SessionUser) -> Json<SessionState> {
    Json(user.state)
}

/// Change la langue d'affichage, et la mémorise sur le compte
pub async fn set_language(
    Extension(state): Extension<Arc<AppState>>,
    mut user: SessionUser,
    Json(payload): Json<LanguageRequest>,
) -> axum::response::Result<Json<SessionState>> {
    let language = supported_language(&payload.language)?;

    let updated = state
        .store
        .update_user(
            user.user.id,
            UserUpdate {
                language: Some(language.clone()),
                ..Default::default()
            },
        )
        .map_err(storage_error)?;

    if let Err(e) = state.store.track_language_usage(&language) {
        warn!("Failed to record language usage: {}", e);
    }

    user.state.language = language;
    user.state.user = Some(updated);
    user.save().await?;
    Ok(Json(user.state))
}

/// Nom du patient suivi par un médecin. Celui d'un patient reste le nom de son compte.
pub async fn set_patient_name(
    mut user: SessionUser,
    Json(payload): Json<PatientNameRequest>,
) -> axum::response::Result<Json<SessionState>> {
    if user.role() == Role::Patient {
        return Err((StatusCode::FORBIDDEN, FORBIDDEN).into());
    }
    user.state.patient_name = short_text(&payload.patient_name)?;
    user.save().await?;
    Ok(Json(user.state))
}

/// Menu de l'utilisateur, dans sa langue
pub async fn navigation_menu(user: SessionUser) -> Json<Vec<MenuItem>> {
    Json(navigation::menu_for(user.role(), &user.state.language))
}

/// Ouvre une page du menu: vérifie qu'elle est permise et comptabilise l'accès
pub async fn navigate(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Path(route): Path<String>,
) -> axum::response::Result<Json<Value>> {
    let route = navigation::navigate(user.role(), &route).map_err(|e| match e {
        NavigationError::Unknown(_) => (StatusCode::NOT_FOUND, NOT_FOUND),
        NavigationError::Forbidden(_) => (StatusCode::FORBIDDEN, FORBIDDEN),
    })?;

    if let Err(e) = state.store.track_feature_click(route.id()) {
        warn!("Failed to record feature click: {}", e);
    }

    Ok(Json(json!({
        "route": route,
        "label": route.label(&user.state.language),
        "path": route.api_path(),
    })))
}

pub async fn change_password(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Json(payload): Json<PasswordChangeRequest>,
) -> axum::response::Result<StatusCode> {
    let new_password = PasswordInput::new(&payload.new_password, &user.user.email)
        .map_err(|_| (StatusCode::BAD_REQUEST, VALIDATION_ERROR))?;

    state
        .store
        .change_password(user.user.id, &payload.current_password, new_password.as_str())
        .map_err(|e| match e {
            AuthError::WrongCurrentPassword => (StatusCode::FORBIDDEN, LOGIN_ERROR),
            AuthError::UserNotFound => (StatusCode::NOT_FOUND, NOT_FOUND),
            other => storage_error(other),
        })?;

    info!("Password changed for user {}", user.user.id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_profile(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
) -> axum::response::Result<Json<Option<HealthProfile>>> {
    let profile = state.store.get_health_profile(user.user.id).map_err(storage_error)?;
    Ok(Json(profile))
}

pub async fn save_profile(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Json(mut data): Json<ProfileData>,
) -> axum::response::Result<Json<HealthProfile>> {
    for field in data.text_fields_mut() {
        if !field.trim().is_empty() {
            *field = long_text(field)?;
        }
    }
    if !data.emergency_contact_phone.is_empty() {
        PhoneInput::new(&data.emergency_contact_phone)
            .map_err(|_| (StatusCode::BAD_REQUEST, VALIDATION_ERROR))?;
    }
    let measures_ok = [data.height, data.weight]
        .iter()
        .all(|m| m.is_finite() && *m >= 0.0);
    if !measures_ok {
        return Err((StatusCode::BAD_REQUEST, VALIDATION_ERROR).into());
    }

    let profile = state
        .store
        .save_health_profile(user.user.id, data)
        .map_err(storage_error)?;
    Ok(Json(profile))
}

/// Liste des utilisateurs. Un patient ne peut voir que la liste des médecins.
pub async fn list_users(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Query(query): Query<UsersQuery>,
) -> axum::response::Result<Json<Vec<PublicUser>>> {
    let role = match (user.role(), query.role) {
        (Role::Patient, Some(Role::Doctor) | None) => Role::Doctor,
        (Role::Patient, Some(Role::Patient)) => return Err((StatusCode::FORBIDDEN, FORBIDDEN).into()),
        (Role::Doctor, role) => role.unwrap_or(Role::Patient),
    };

    let users = state.store.get_all_users_by_role(role).map_err(storage_error)?;
    Ok(Json(users))
}

pub async fn analytics(
    Extension(state): Extension<Arc<AppState>>,
    DoctorUser(_doctor): DoctorUser,
) -> axum::response::Result<Json<AnalyticsSummary>> {
    let summary = state.store.get_analytics_summary().map_err(storage_error)?;
    Ok(Json(summary))
}

pub async fn list_support_tickets(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
) -> axum::response::Result<Json<Vec<SupportTicket>>> {
    let tickets = state
        .store
        .get_support_tickets(Some(user.user.id))
        .map_err(storage_error)?;
    Ok(Json(tickets))
}

pub async fn create_support_ticket(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Json(payload): Json<SupportRequest>,
) -> axum::response::Result<(StatusCode, Json<SupportTicket>)> {
    let ticket = state
        .store
        .add_support_ticket(NewSupportTicket {
            user_id: user.user.id,
            user_name: user.user.name.clone(),
            user_email: user.user.email.clone(),
            category: short_text(&payload.category)?,
            description: long_text(&payload.description)?,
            language: user.state.language.clone(),
        })
        .map_err(storage_error)?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn list_saved_hospitals(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
) -> axum::response::Result<Json<Vec<SavedHospital>>> {
    let hospitals = state
        .store
        .get_saved_hospitals(Some(user.user.id))
        .map_err(storage_error)?;
    Ok(Json(hospitals))
}

pub async fn save_hospital(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Json(payload): Json<SaveHospitalRequest>,
) -> axum::response::Result<(StatusCode, Json<SavedHospital>)> {
    let specialties = payload
        .specialties
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| short_text(s))
        .collect::<Result<Vec<_>, _>>()?;

    let hospital = state
        .store
        .add_saved_hospital(NewSavedHospital {
            user_id: user.user.id,
            hospital_name: short_text(&payload.hospital_name)?,
            address: optional_short_text(&payload.address)?,
            phone: optional_short_text(&payload.phone)?,
            specialties,
            city: optional_short_text(&payload.city)?,
            distance_km: payload.distance_km.filter(|d| d.is_finite() && *d >= 0.0),
        })
        .map_err(|e| match e {
            SaveHospitalError::AlreadySaved => (StatusCode::CONFLICT, VALIDATION_ERROR),
            SaveHospitalError::Store(e) => storage_error(e),
        })?;
    Ok((StatusCode::CREATED, Json(hospital)))
}

pub async fn delete_saved_hospital(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<u64>,
) -> axum::response::Result<StatusCode> {
    let owned = state
        .store
        .get_saved_hospitals(Some(user.user.id))
        .map_err(storage_error)?
        .iter()
        .any(|h| h.id == id);
    if !owned {
        return Err((StatusCode::NOT_FOUND, NOT_FOUND).into());
    }

    state.store.delete_saved_hospital(id).map_err(storage_error)?;
    Ok(StatusCode::NO_CONTENT)
}
