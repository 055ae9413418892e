//! Gestion des routes accessibles sans authentification.
//! Contient l'inscription, la connexion, la déconnexion et les informations publiques.

use std::sync::Arc;

use axum::{extract::Json, Extension};
use http::StatusCode;
use log::{info, warn};
use serde_json::{json, Value};
use tower_sessions::Session;

use super::{
    middlewares::load_state,
    models::{LoginRequest, RegisterRequest},
    short_text, storage_error, supported_language, AppState,
};
use crate::{
    consts,
    database::{
        analytics::PublicStats,
        user::{AuthError, NewUser, PublicUser},
    },
    session::SessionState,
    utils::{
        error_messages::{LOGIN_ERROR, REGISTRATION_ERROR, SESSION_ERROR},
        validation::{EmailInput, PasswordInput, PhoneInput},
    },
};

/// Informations sur le service
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": "Arogya Mitra",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Multilingual AI health assistant for patients and doctors",
    }))
}

/// Langues proposées par l'application
pub async fn languages() -> Json<Value> {
    let languages: Vec<Value> = consts::SUPPORTED_LANGUAGES
        .iter()
        .map(|(name, code)| json!({ "name": name, "code": code }))
        .collect();
    Json(json!({ "default": consts::DEFAULT_LANGUAGE, "languages": languages }))
}

/// Statistiques publiques, sans donnée personnelle
pub async fn stats(
    Extension(state): Extension<Arc<AppState>>,
) -> axum::response::Result<Json<PublicStats>> {
    let stats = state.store.get_public_stats().map_err(storage_error)?;
    Ok(Json(stats))
}

/// Création d'un compte patient ou médecin
pub async fn register(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> axum::response::Result<(StatusCode, Json<PublicUser>)> {
    let email = EmailInput::new(&payload.email)
        .map_err(|_| (StatusCode::BAD_REQUEST, REGISTRATION_ERROR))?;

    let password = PasswordInput::new(&payload.password, email.as_str())
        .map_err(|_| (StatusCode::BAD_REQUEST, REGISTRATION_ERROR))?;

    let name = short_text(&payload.name).map_err(|_| (StatusCode::BAD_REQUEST, REGISTRATION_ERROR))?;

    let language = match payload.language.as_deref() {
        Some(language) => supported_language(language)?,
        None => consts::DEFAULT_LANGUAGE.to_string(),
    };

    let phone = PhoneInput::optional(&payload.phone)
        .map_err(|_| (StatusCode::BAD_REQUEST, REGISTRATION_ERROR))?
        .map(PhoneInput::into_string)
        .unwrap_or_default();

    let user = state
        .store
        .create_user(NewUser {
            name,
            email: email.to_string(),
            password: password.as_str().to_string(),
            role: payload.role,
            language,
            phone,
        })
        .map_err(|e| match e {
            AuthError::EmailTaken => (StatusCode::CONFLICT, REGISTRATION_ERROR),
            other => storage_error(other),
        })?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Connexion par email et mot de passe. Initialise l'état de session.
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> axum::response::Result<Json<SessionState>> {
    let mut session_state = load_state(&session).await?;

    // Un email invalide ne peut correspondre à aucun compte
    let email = EmailInput::new(&payload.email).map_err(|_| (StatusCode::UNAUTHORIZED, LOGIN_ERROR))?;

    let user = state
        .store
        .authenticate_user(email.as_str(), &payload.password)
        .map_err(|e| match e {
            AuthError::Store(e) => storage_error(e),
            _ => (StatusCode::UNAUTHORIZED, LOGIN_ERROR),
        })?;

    let role = user.role;
    session.cycle_id().await.map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, SESSION_ERROR))?;
    session_state.sign_in(user);
    session_state
        .store(&session)
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, SESSION_ERROR))?;

    // Statistiques anonymes: leur échec n'empêche pas la connexion
    let tracked = state
        .store
        .track_role_session(role)
        .and_then(|_| state.store.track_daily_visit())
        .and_then(|_| state.store.track_language_usage(&session_state.language));
    if let Err(e) = tracked {
        warn!("Failed to record analytics: {}", e);
    }

    Ok(Json(session_state))
}

/// Déconnexion: la session est supprimée du stockage et son cookie invalidé
pub async fn logout(session: Session) -> axum::response::Result<StatusCode> {
    let session_state = load_state(&session).await?;

    if let Some(user) = &session_state.user {
        info!("User {} logged out", user.email);
    }
    session.flush().await.map_err(|e| {
        warn!("Failed to delete session: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, SESSION_ERROR)
    })?;

    Ok(StatusCode::NO_CONTENT)
}
