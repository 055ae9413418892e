//! Routes de l'assistant IA: analyse des symptômes, discussion, traduction,
//! transcription et recherche d'hôpitaux.
//!
//! Les échecs du fournisseur ne sont pas des erreurs HTTP: ils sont renvoyés
//! dans la réponse `{success: false, error}`.

use std::sync::Arc;

use axum::{extract::Multipart, Extension, Json};
use http::StatusCode;
use log::{info, warn};

use super::{
    long_text,
    middlewares::SessionUser,
    models::{
        ChatRequest, HospitalSearchRequest, PrescriptionTranslationRequest, SymptomsRequest,
        TranslationRequest,
    },
    language_or_session, short_text, storage_error, supported_language, AppState, HandlerError,
};
use crate::{
    gateway::assistant::{
        AiReply, ChatResponse, Hospitals, SymptomAnalysis, Transcription, Translation,
    },
    models::Role,
    session::{ChatRole, TranslationEntry},
    utils::{error_messages::VALIDATION_ERROR, validation::AudioInput},
};

/// Contexte médical du profil, uniquement pour les patients
fn health_context(state: &AppState, user: &SessionUser) -> Result<Option<String>, HandlerError> {
    match user.role() {
        Role::Patient => state
            .store
            .get_health_context_for_ai(user.user.id)
            .map_err(storage_error),
        Role::Doctor => Ok(None),
    }
}

pub async fn analyze_symptoms(
    Extension(state): Extension<Arc<AppState>>,
    mut user: SessionUser,
    Json(payload): Json<SymptomsRequest>,
) -> axum::response::Result<Json<AiReply<SymptomAnalysis>>> {
    let symptoms = long_text(&payload.symptoms)?;
    let language = language_or_session(payload.language.as_deref(), &user)?;
    let context = health_context(&state, &user)?;

    // Comptage anonyme des mots-clés, sans conserver le texte
    if let Err(e) = state.store.track_symptom_keyword(&symptoms) {
        warn!("Failed to record symptom keywords: {}", e);
    }

    let reply = state
        .ai
        .analyze_symptoms(&symptoms, &language, context.as_deref(), user.role())
        .await;

    if reply.success {
        user.state.last_severity = Some(reply.payload.severity_level);
        user.save().await?;
    }
    Ok(Json(reply))
}

pub async fn chat(
    Extension(state): Extension<Arc<AppState>>,
    mut user: SessionUser,
    Json(payload): Json<ChatRequest>,
) -> axum::response::Result<Json<AiReply<ChatResponse>>> {
    let message = long_text(&payload.message)?;
    let context = health_context(&state, &user)?;

    let reply = state
        .ai
        .medical_chat_response(
            &message,
            &user.state.language,
            user.role(),
            context.as_deref(),
            user.state.last_severity,
        )
        .await;

    user.state.push_chat(ChatRole::User, message);
    if let Some(response) = &reply.payload.response {
        user.state.push_chat(ChatRole::Assistant, response.clone());
    }
    user.save().await?;

    Ok(Json(reply))
}

/// Transcription des échanges patient-médecin de la session
pub async fn translation_history(user: SessionUser) -> Json<Vec<TranslationEntry>> {
    Json(user.state.translation_history)
}

pub async fn translate(
    Extension(state): Extension<Arc<AppState>>,
    mut user: SessionUser,
    Json(payload): Json<TranslationRequest>,
) -> axum::response::Result<Json<AiReply<Translation>>> {
    let text = long_text(&payload.text)?;
    let source = language_or_session(payload.source_language.as_deref(), &user)?;
    let target = supported_language(&payload.target_language)?;
    let speaker = payload.speaker.unwrap_or(user.role());

    let reply = state.ai.translate_text(&text, &source, &target).await;

    if let Some(translation) = &reply.payload.translation {
        user.state.push_translation(speaker, text, translation.clone());
        user.save().await?;
    }
    Ok(Json(reply))
}

pub async fn clear_translation_history(
    mut user: SessionUser,
) -> axum::response::Result<StatusCode> {
    user.state.clear_translations();
    user.save().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reçoit un enregistrement vocal (champ `audio`) et le transcrit
pub async fn transcribe(
    Extension(state): Extension<Arc<AppState>>,
    _user: SessionUser,
    mut multipart: Multipart,
) -> axum::response::Result<Json<AiReply<Transcription>>> {
    let mut audio: Option<AudioInput> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| (StatusCode::BAD_REQUEST, VALIDATION_ERROR))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, VALIDATION_ERROR))?;

        let input = AudioInput::new(bytes.to_vec(), &filename).map_err(|e| {
            warn!("Rejected audio upload: {}", e);
            (StatusCode::BAD_REQUEST, VALIDATION_ERROR)
        })?;
        audio = Some(input);
    }

    let audio = audio.ok_or((StatusCode::BAD_REQUEST, VALIDATION_ERROR))?;
    info!("Transcribing {} ({} bytes)", audio.filename(), audio.content().len());

    let reply = state
        .ai
        .transcribe_audio(audio.content(), audio.mime_type())
        .await;
    Ok(Json(reply))
}

pub async fn translate_prescription(
    Extension(state): Extension<Arc<AppState>>,
    _user: SessionUser,
    Json(payload): Json<PrescriptionTranslationRequest>,
) -> axum::response::Result<Json<AiReply<Translation>>> {
    let text = long_text(&payload.text)?;
    let doctor_language = supported_language(&payload.doctor_language)?;
    let patient_language = supported_language(&payload.patient_language)?;

    let reply = state
        .ai
        .generate_prescription_translation(&text, &doctor_language, &patient_language)
        .await;
    Ok(Json(reply))
}

pub async fn find_hospitals(
    Extension(state): Extension<Arc<AppState>>,
    user: SessionUser,
    Json(payload): Json<HospitalSearchRequest>,
) -> axum::response::Result<Json<AiReply<Hospitals>>> {
    let city = short_text(&payload.city)?;
    let specialty = match payload.specialty.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(specialty) => Some(short_text(specialty)?),
    };
    let language = language_or_session(payload.language.as_deref(), &user)?;

    let reply = state
        .ai
        .find_nearby_hospitals(&city, specialty.as_deref(), &language)
        .await;
    Ok(Json(reply))
}
