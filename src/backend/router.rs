//! Configuration des routes pour l'application.
//! Définit les routes accessibles avec ou sans authentification et configure les middlewares.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_sessions::{MemoryStore, SessionManagerLayer};

use super::{handlers_ai, handlers_auth, handlers_records, handlers_unauth, middlewares::SessionUser, AppState};
use crate::utils::validation::MAX_AUDIO_SIZE;

/// Initialisation du routeur principal et des middlewares
pub fn get_router(state: Arc<AppState>) -> Router {
    // Configuration CORS pour permettre les requêtes de n'importe quelle origine (en mode debug uniquement)
    let router = if cfg!(debug_assertions) {
        let cors = CorsLayer::new()
            .allow_methods(tower_http::cors::AllowMethods::any())
            .allow_headers(Any)
            .allow_origin(Any);
        Router::new().layer(cors)
    } else {
        Router::new()
    };

    // Sessions en mémoire, perdues au redémarrage
    let sessions = MemoryStore::default();
    let session_manager = SessionManagerLayer::new(sessions.clone())
        .with_http_only(true)
        .with_secure(!cfg!(debug_assertions));

    router
        .merge(unauth_routes())
        .merge(auth_routes())
        .merge(ai_routes())
        .merge(record_routes())
        .layer(session_manager)
        .layer(Extension(sessions))
        .layer(Extension(state))
}

/// Routes accessibles sans authentification
fn unauth_routes() -> Router {
    use handlers_unauth::*;

    Router::new()
        .route("/", get(index)) // Informations sur le service
        .route("/api/languages", get(languages))
        .route("/api/stats", get(stats)) // Statistiques publiques
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
}

/// Routes nécessitant une authentification
fn auth_routes() -> Router {
    use handlers_auth::*;

    Router::new()
        .route("/api/session", get(session_info))
        .route("/api/session/language", put(set_language))
        .route("/api/session/patient-name", put(set_patient_name))
        .route("/api/navigation", get(navigation_menu)) // Menu du rôle courant
        .route("/api/navigate/:route", post(navigate))
        .route("/api/account/password", put(change_password))
        .route("/api/profile", get(get_profile).put(save_profile))
        .route("/api/users", get(list_users))
        .route("/api/analytics", get(analytics)) // Réservé aux médecins
        .route("/api/support", get(list_support_tickets).post(create_support_ticket))
        .route("/api/hospitals/saved", get(list_saved_hospitals).post(save_hospital))
        .route("/api/hospitals/saved/:id", axum::routing::delete(delete_saved_hospital))
        .layer(axum::middleware::from_extractor::<SessionUser>())
}

fn ai_routes() -> Router {
    use handlers_ai::*;

    Router::new()
        .route("/api/ai/symptoms", post(analyze_symptoms))
        .route("/api/ai/chat", post(chat))
        .route(
            "/api/ai/translation",
            get(translation_history)
                .post(translate)
                .delete(clear_translation_history),
        )
        .route(
            "/api/ai/transcribe",
            // Marge pour les en-têtes multipart autour du fichier
            post(transcribe).layer(DefaultBodyLimit::max(MAX_AUDIO_SIZE + 64 * 1024)),
        )
        .route("/api/ai/prescription-translation", post(translate_prescription))
        .route("/api/ai/hospitals", post(find_hospitals))
        .layer(axum::middleware::from_extractor::<SessionUser>())
}

fn record_routes() -> Router {
    use handlers_records::*;

    Router::new()
        .route("/api/appointments", get(list_appointments).post(create_appointment))
        .route("/api/appointments/:id", patch(update_appointment).delete(delete_appointment))
        .route("/api/prescriptions", get(list_prescriptions).post(create_prescription))
        .route("/api/prescriptions/:id", patch(update_prescription).delete(delete_prescription))
        .route("/api/health-records", get(list_health_records).post(create_health_record))
        .route("/api/health-records/:id", patch(update_health_record).delete(delete_health_record))
        .route("/api/reminders", get(list_reminders).post(create_reminder))
        .route("/api/reminders/:id", patch(update_reminder).delete(delete_reminder))
        .route("/api/medications", get(list_medications).post(create_medication))
        .route("/api/medications/:id", patch(update_medication).delete(delete_medication))
        .layer(axum::middleware::from_extractor::<SessionUser>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::tests::temp_store,
        gateway::{
            assistant::tests::{gateway, ScriptedModel},
            AiGateway, GenerateRequest, ProviderError, TextModel,
        },
    };
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use axum::body::{to_bytes, Body};
    use http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct TestApp {
        _dir: TempDir,
        router: Router,
    }

    fn app(replies: Vec<Result<String, ProviderError>>) -> TestApp {
        app_with(gateway(ScriptedModel::new(replies)))
    }

    fn app_with(ai: AiGateway) -> TestApp {
        let (dir, store) = temp_store();
        let state = AppState { store, ai };
        TestApp {
            _dir: dir,
            router: get_router(Arc::new(state)),
        }
    }

    impl TestApp {
        async fn send(
            &self,
            method: Method,
            uri: &str,
            cookie: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Option<String>, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(cookie) = cookie {
                request = request.header(header::COOKIE, cookie);
            }
            let request = match body {
                Some(body) => request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string())),
                None => request.body(Body::empty()),
            }
            .unwrap();

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let cookie = response
                .headers()
                .get(header::SET_COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(';').next())
                .map(str::to_string);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, cookie, body)
        }

        /// Inscrit puis connecte un utilisateur, retourne le cookie de session
        async fn sign_up(&self, name: &str, email: &str, role: &str) -> String {
            let (status, _, _) = self
                .send(
                    Method::POST,
                    "/api/register",
                    None,
                    Some(json!({
                        "name": name,
                        "email": email,
                        "password": "correct horse",
                        "role": role,
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);

            let (status, cookie, _) = self
                .send(
                    Method::POST,
                    "/api/login",
                    None,
                    Some(json!({ "email": email, "password": "correct horse" })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            cookie.expect("login sets a session cookie")
        }
    }

    #[tokio::test]
    async fn test_login_opens_session() {
        let app = app(vec![]);
        let cookie = app.sign_up("Asha Rao", "asha@example.com", "Patient").await;

        let (status, _, body) = app.send(Method::GET, "/api/session", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "asha@example.com");
        assert_eq!(body["role"], "Patient");
        assert_eq!(body["patient_name"], "Asha Rao");
        assert!(body["user"].get("password").is_none());

        let (status, _, _) = app.send(Method::POST, "/api/logout", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _, _) = app.send(Method::GET, "/api/session", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_credentials_and_duplicate_email() {
        let app = app(vec![]);
        app.sign_up("Asha Rao", "asha@example.com", "Patient").await;

        let (status, _, _) = app
            .send(
                Method::POST,
                "/api/register",
                None,
                Some(json!({
                    "name": "Other",
                    "email": "ASHA@example.com",
                    "password": "another pass",
                    "role": "Doctor",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, cookie, _) = app
            .send(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "email": "asha@example.com", "password": "wrong password" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(cookie.is_none());
    }

    #[tokio::test]
    async fn test_protected_routes_require_session() {
        let app = app(vec![]);
        for uri in ["/api/session", "/api/appointments", "/api/navigation"] {
            let (status, _, _) = app.send(Method::GET, uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_role_restrictions() {
        let app = app(vec![]);
        let patient = app.sign_up("Asha Rao", "asha@example.com", "Patient").await;

        let (status, _, _) = app.send(Method::GET, "/api/analytics", Some(&patient), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = app
            .send(Method::POST, "/api/navigate/analytics", Some(&patient), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = app
            .send(Method::POST, "/api/navigate/no-such-page", Some(&patient), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, body) = app
            .send(Method::POST, "/api/navigate/symptom-checker", Some(&patient), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["path"], "/api/ai/symptoms");

        let (status, _, _) = app
            .send(
                Method::POST,
                "/api/prescriptions",
                Some(&patient),
                Some(json!({ "patient_name": "Asha Rao", "medication": "Paracetamol", "dosage": "500mg" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_patients_only_see_their_own_records() {
        let app = app(vec![]);
        let doctor = app.sign_up("Dr. Mehta", "mehta@example.com", "Doctor").await;
        let patient = app.sign_up("Asha Rao", "asha@example.com", "Patient").await;

        for patient_name in ["Asha Rao", "Ravi Kumar"] {
            let (status, _, body) = app
                .send(
                    Method::POST,
                    "/api/appointments",
                    Some(&doctor),
                    Some(json!({ "patient_name": patient_name, "date": "2026-11-02", "time": "10:30" })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["doctor_name"], "Dr. Mehta");
            assert_eq!(body["status"], "Scheduled");
        }

        let (_, _, body) = app.send(Method::GET, "/api/appointments", Some(&patient), None).await;
        let visible = body.as_array().unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0]["patient_name"], "Asha Rao");

        // Le nom de patient d'un patient suit son compte
        let (status, _, _) = app
            .send(
                Method::PUT,
                "/api/session/patient-name",
                Some(&patient),
                Some(json!({ "patient_name": "Ravi Kumar" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (_, _, body) = app.send(Method::GET, "/api/appointments", Some(&patient), None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _, body) = app
            .send(
                Method::PUT,
                "/api/session/patient-name",
                Some(&doctor),
                Some(json!({ "patient_name": "Ravi Kumar" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patient_name"], "Ravi Kumar");

        let (_, _, body) = app
            .send(Method::GET, "/api/appointments?filter=ravi", Some(&doctor), None)
            .await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        // Le rendez-vous de Ravi est invisible, donc introuvable, pour Asha
        let (status, _, _) = app
            .send(Method::DELETE, "/api/appointments/2", Some(&patient), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = app
            .send(Method::DELETE, "/api/appointments/1", Some(&patient), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    /// Modèle qui attend un signal avant de répondre
    #[derive(Default)]
    struct GatedModel {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl TextModel for GatedModel {
        async fn generate(&self, _request: GenerateRequest) -> Result<String, ProviderError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok("Please rest and drink water.".into())
        }
    }

    #[tokio::test]
    async fn test_logout_during_chat_stays_logged_out() {
        let model = Arc::new(GatedModel::default());
        let app = app_with(AiGateway::new(model.clone()));
        let cookie = app.sign_up("Asha Rao", "asha@example.com", "Patient").await;

        let chat = app.send(
            Method::POST,
            "/api/ai/chat",
            Some(&cookie),
            Some(json!({ "message": "I have a headache" })),
        );
        let logout = async {
            model.started.notified().await;
            let response = app.send(Method::POST, "/api/logout", Some(&cookie), None).await;
            model.release.notify_one();
            response
        };
        let ((chat_status, _, body), (logout_status, _, _)) = tokio::join!(chat, logout);

        assert_eq!(logout_status, StatusCode::NO_CONTENT);
        assert_eq!(chat_status, StatusCode::OK);
        assert_eq!(body["response"], "Please rest and drink water.");

        let (status, _, _) = app.send(Method::GET, "/api/session", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_booking_adds_an_appointment_reminder() {
        let app = app(vec![]);
        let patient = app.sign_up("Asha Rao", "asha@example.com", "Patient").await;

        let (status, _, _) = app
            .send(
                Method::POST,
                "/api/appointments",
                Some(&patient),
                Some(json!({ "doctor_name": "Dr. Mehta", "date": "2026-11-02", "time": "10:30" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _, body) = app.send(Method::GET, "/api/reminders", Some(&patient), None).await;
        assert_eq!(status, StatusCode::OK);
        let reminders = body.as_array().unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0]["patient_name"], "Asha Rao");
        assert_eq!(reminders[0]["reminder_type"], "Appointment");
        assert_eq!(reminders[0]["status"], "Pending");
        assert_eq!(
            reminders[0]["message"],
            "Reminder: You have an appointment with Dr. Mehta on 2026-11-02 at 10:30"
        );
    }

    #[tokio::test]
    async fn test_empty_required_field_is_rejected() {
        let app = app(vec![]);
        let patient = app.sign_up("Asha Rao", "asha@example.com", "Patient").await;

        let (status, _, _) = app
            .send(
                Method::POST,
                "/api/medications",
                Some(&patient),
                Some(json!({ "medication_name": "   ", "dosage": "5mg", "frequency": "daily" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, _, body) = app.send(Method::GET, "/api/medications", Some(&patient), None).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_symptom_analysis_falls_back_when_provider_fails() {
        let app = app(vec![Err(ProviderError::Api {
            status: 400,
            message: "INVALID_ARGUMENT".into(),
        })]);
        let patient = app.sign_up("Asha Rao", "asha@example.com", "Patient").await;

        let (status, _, body) = app
            .send(
                Method::POST,
                "/api/ai/symptoms",
                Some(&patient),
                Some(json!({ "symptoms": "fever and headache" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["symptoms_summary"], "Unable to analyze symptoms");
        assert_eq!(body["severity_level"], "Unknown");

        // Les mots-clés sont comptés même si l'analyse échoue
        let doctor = app.sign_up("Dr. Mehta", "mehta@example.com", "Doctor").await;
        let (status, _, body) = app.send(Method::GET, "/api/analytics", Some(&doctor), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["top_symptoms"], json!([["fever", 1], ["headache", 1]]));
        assert_eq!(body["role_sessions"]["Patient"], 1);
        assert_eq!(body["role_sessions"]["Doctor"], 1);
    }

    #[tokio::test]
    async fn test_translation_transcript_is_kept_in_session() {
        let app = app(vec![Ok("नमस्ते डॉक्टर".to_string())]);
        let doctor = app.sign_up("Dr. Mehta", "mehta@example.com", "Doctor").await;

        let (status, _, body) = app
            .send(
                Method::POST,
                "/api/ai/translation",
                Some(&doctor),
                Some(json!({
                    "text": "Hello doctor",
                    "speaker": "Patient",
                    "target_language": "हिंदी (Hindi)",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["translation"], "नमस्ते डॉक्टर");

        let (_, _, body) = app
            .send(Method::GET, "/api/ai/translation", Some(&doctor), None)
            .await;
        assert_eq!(body[0]["speaker"], "Patient");
        assert_eq!(body[0]["original"], "Hello doctor");

        let (status, _, _) = app
            .send(Method::DELETE, "/api/ai/translation", Some(&doctor), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, _, body) = app
            .send(Method::GET, "/api/ai/translation", Some(&doctor), None)
            .await;
        assert_eq!(body, json!([]));
    }
}
