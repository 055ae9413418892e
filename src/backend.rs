//! Module principal pour le backend de l'application.
//! Contient les gestionnaires pour les routes, les modèles de données,
//! le routeur, et les middlewares.
pub mod handlers_ai;
pub mod handlers_auth;
pub mod handlers_records;
pub mod handlers_unauth;
mod middlewares;
mod models;
pub mod router;

use std::fmt::Display;

use http::StatusCode;
use log::error;

use middlewares::SessionUser;

use crate::{
    consts,
    models::Role,
    database::Store,
    gateway::AiGateway,
    utils::error_messages::{STORAGE_ERROR, VALIDATION_ERROR},
    utils::validation::TextInput,
};

/// État partagé par tous les handlers
pub struct AppState {
    pub store: Store,
    pub ai: AiGateway,
}

type HandlerError = (StatusCode, &'static str);

/// Les erreurs de stockage ne sont jamais détaillées au client
fn storage_error(e: impl Display) -> HandlerError {
    error!("Storage failure: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, STORAGE_ERROR)
}

fn short_text(raw: &str) -> Result<String, HandlerError> {
    TextInput::new_short_form(raw)
        .map(TextInput::into_string)
        .map_err(|_| (StatusCode::BAD_REQUEST, VALIDATION_ERROR))
}

fn long_text(raw: &str) -> Result<String, HandlerError> {
    TextInput::new_long_form(raw)
        .map(TextInput::into_string)
        .map_err(|_| (StatusCode::BAD_REQUEST, VALIDATION_ERROR))
}

fn optional_short_text(raw: &str) -> Result<String, HandlerError> {
    TextInput::optional_short_form(Some(raw))
        .map(|text| text.map(TextInput::into_string).unwrap_or_default())
        .map_err(|_| (StatusCode::BAD_REQUEST, VALIDATION_ERROR))
}

/// Un champ facultatif: vide s'il est absent, validé sinon
fn optional_long_text(raw: Option<&str>) -> Result<String, HandlerError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(String::new()),
        Some(text) => long_text(text),
    }
}

/// Valide en place un champ texte d'une requête de modification
fn clean_update(field: &mut Option<String>) -> Result<(), HandlerError> {
    if let Some(raw) = field.as_deref() {
        *field = Some(long_text(raw)?);
    }
    Ok(())
}

fn supported_language(raw: &str) -> Result<String, HandlerError> {
    consts::language_code(raw.trim())
        .map(|_| raw.trim().to_string())
        .ok_or((StatusCode::BAD_REQUEST, VALIDATION_ERROR))
}

/// Langue demandée, ou à défaut celle de la session
fn language_or_session(raw: Option<&str>, user: &SessionUser) -> Result<String, HandlerError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(user.state.language.clone()),
        Some(language) => supported_language(language),
    }
}

/// Un patient n'accède qu'aux dossiers au nom de son compte; un médecin à tous
fn can_access(user: &SessionUser, patient_name: &str) -> bool {
    match user.role() {
        Role::Doctor => true,
        Role::Patient => {
            !user.user.name.is_empty() && user.user.name.to_lowercase() == patient_name.to_lowercase()
        }
    }
}
