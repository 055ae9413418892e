//! Opérations médicales assistées par l'IA.
//!
//! Chaque opération retourne un [`AiReply`] et ne renvoie jamais d'erreur à
//! l'appelant: en cas d'échec, `success` vaut `false`, `error` contient un
//! message affichable et la charge utile contient des valeurs sûres.

use std::sync::Arc;

use derive_more::Display;
use log::{error, info};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

use super::{
    prompts,
    provider::{GenerateRequest, Part, ProviderError, TextModel},
    retry::{with_retry, RetryPolicy},
};
use crate::{consts, models::Role, utils::error_messages::SERVICE_BUSY};

/// Réponse uniforme `{success, error?, ...payload}`
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct AiReply<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> AiReply<T> {
    fn ok(payload: T) -> Self {
        Self {
            success: true,
            error: None,
            payload,
        }
    }

    fn failed(error: &ProviderError, payload: T) -> Self {
        let message = if error.is_transient() {
            SERVICE_BUSY.to_string()
        } else {
            error.to_string()
        };
        Self {
            success: false,
            error: Some(message),
            payload,
        }
    }
}

#[derive(Clone, Serialize, Debug, Default, PartialEq)]
pub struct Translation {
    pub translation: Option<String>,
}

#[derive(Clone, Serialize, Debug, Default, PartialEq)]
pub struct ChatResponse {
    pub response: Option<String>,
}

#[derive(Clone, Serialize, Debug, Default, PartialEq)]
pub struct Transcription {
    pub transcription: Option<String>,
}

/// Niveau de gravité. Tout autre mot renvoyé par le modèle devient `Unknown`.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq, Display)]
pub enum Severity {
    #[serde(alias = "low", alias = "LOW")]
    Low,
    #[serde(alias = "medium", alias = "MEDIUM", alias = "Moderate", alias = "moderate")]
    Medium,
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "critical", alias = "CRITICAL")]
    Critical,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn is_urgent(self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct SymptomAnalysis {
    pub symptoms_summary: String,
    pub possible_conditions: Vec<String>,
    #[serde(deserialize_with = "severity_or_unknown")]
    pub severity_level: Severity,
    pub recommendations: Vec<String>,
    pub urgent_care_needed: bool,
    pub follow_up_questions: Vec<String>,
    pub disclaimer: String,
}

impl Default for SymptomAnalysis {
    fn default() -> Self {
        Self {
            symptoms_summary: String::new(),
            possible_conditions: Vec::new(),
            severity_level: Severity::Unknown,
            recommendations: Vec::new(),
            urgent_care_needed: false,
            follow_up_questions: Vec::new(),
            disclaimer: prompts::DISCLAIMER.to_string(),
        }
    }
}

impl SymptomAnalysis {
    /// Les valeurs affichées quand l'analyse a échoué
    pub fn unavailable() -> Self {
        Self {
            symptoms_summary: "Unable to analyze symptoms".to_string(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Hospital {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, deserialize_with = "string_or_list")]
    pub specialties: Vec<String>,
}

#[derive(Clone, Serialize, Debug, Default, PartialEq)]
pub struct Hospitals {
    pub hospitals: Vec<Hospital>,
}

/// `null` vaut une gravité inconnue
fn severity_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Severity, D::Error> {
    Ok(Option::<Severity>::deserialize(deserializer)?.unwrap_or_default())
}

/// Le modèle renvoie les spécialités sous forme de liste ou de chaîne séparée par des virgules
fn string_or_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(list)) => list,
        Some(OneOrMany::One(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// Retire les balises Markdown ```json ... ``` qui entourent parfois une réponse
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.split_once('\n') {
        Some((_language, body)) => body,
        None => without_language_tag(rest),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Balise de langage sur la même ligne que le contenu: ```json {"a": 1}```
fn without_language_tag(line: &str) -> &str {
    let tag_len = line
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(line.len());
    let after = &line[tag_len..];
    if tag_len > 0 && after.starts_with(|c: char| c.is_whitespace() || c == '{' || c == '[') {
        after
    } else {
        line
    }
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, ProviderError> {
    serde_json::from_str(strip_code_fences(text)).map_err(|e| ProviderError::Malformed(e.to_string()))
}

pub struct AiGateway {
    model: Arc<dyn TextModel>,
    policy: RetryPolicy,
}

impl AiGateway {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self {
            model,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String, ProviderError> {
        let model = Arc::clone(&self.model);
        with_retry(self.policy, move || {
            let model = Arc::clone(&model);
            let request = request.clone();
            async move { model.generate(request).await }
        })
        .await
    }

    pub async fn translate_text(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> AiReply<Translation> {
        let request = GenerateRequest::new(
            consts::MODEL_FAST,
            prompts::translation(text, source_language, target_language),
        )
        .with_system(prompts::TRANSLATOR_SYSTEM);

        match self.generate(request).await {
            Ok(translation) => {
                info!("Translated text from {} to {}", source_language, target_language);
                AiReply::ok(Translation {
                    translation: Some(translation.trim().to_string()),
                })
            }
            Err(e) => AiReply::failed(&e, Translation::default()),
        }
    }

    /// Analyse des symptômes. Les médecins utilisent le modèle le plus précis.
    pub async fn analyze_symptoms(
        &self,
        symptoms: &str,
        language: &str,
        health_context: Option<&str>,
        role: Role,
    ) -> AiReply<SymptomAnalysis> {
        let model = match role {
            Role::Doctor => consts::MODEL_PRO,
            Role::Patient => consts::MODEL_FAST,
        };
        let request = GenerateRequest::new(
            model,
            prompts::symptom_analysis(symptoms, language, health_context, role),
        )
        .with_system(prompts::ASSISTANT_SYSTEM)
        .expect_json();

        let analysis = self
            .generate(request)
            .await
            .and_then(|text| parse_json::<SymptomAnalysis>(&text));

        match analysis {
            Ok(mut analysis) => {
                if analysis.disclaimer.trim().is_empty() {
                    analysis.disclaimer = prompts::DISCLAIMER.to_string();
                }
                // Une gravité élevée implique toujours une consultation urgente
                if analysis.severity_level.is_urgent() {
                    analysis.urgent_care_needed = true;
                }
                info!("Symptom analysis completed with severity {}", analysis.severity_level);
                AiReply::ok(analysis)
            }
            Err(e) => {
                error!("Symptom analysis failed: {}", e);
                AiReply::failed(&e, SymptomAnalysis::unavailable())
            }
        }
    }

    pub async fn medical_chat_response(
        &self,
        message: &str,
        language: &str,
        role: Role,
        health_context: Option<&str>,
        severity: Option<Severity>,
    ) -> AiReply<ChatResponse> {
        let severity = severity.map(|s| s.to_string());
        let request = GenerateRequest::new(
            consts::MODEL_FAST,
            prompts::medical_chat(message, language, role, health_context, severity.as_deref()),
        )
        .with_system(prompts::ASSISTANT_SYSTEM);

        match self.generate(request).await {
            Ok(response) => AiReply::ok(ChatResponse {
                response: Some(response),
            }),
            Err(e) => AiReply::failed(&e, ChatResponse::default()),
        }
    }

    pub async fn transcribe_audio(&self, audio: &[u8], mime_type: &str) -> AiReply<Transcription> {
        let request = GenerateRequest::new(consts::MODEL_FAST, prompts::TRANSCRIBE).with_part(
            Part::InlineData {
                mime_type: mime_type.to_string(),
                data: audio.to_vec(),
            },
        );

        match self.generate(request).await {
            Ok(text) => AiReply::ok(Transcription {
                transcription: Some(text.trim().to_string()),
            }),
            Err(e) => AiReply::failed(&e, Transcription::default()),
        }
    }

    /// Traduit une ordonnance de la langue du médecin vers celle du patient
    pub async fn generate_prescription_translation(
        &self,
        text: &str,
        doctor_language: &str,
        patient_language: &str,
    ) -> AiReply<Translation> {
        self.translate_text(text, doctor_language, patient_language)
            .await
    }

    pub async fn find_nearby_hospitals(
        &self,
        city: &str,
        specialty: Option<&str>,
        language: &str,
    ) -> AiReply<Hospitals> {
        // Le modèle renvoie un tableau, ou parfois un objet `{"hospitals": [...]}`
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum HospitalList {
            Bare(Vec<Hospital>),
            Wrapped { hospitals: Vec<Hospital> },
        }

        let request = GenerateRequest::new(
            consts::MODEL_FAST,
            prompts::nearby_hospitals(city, specialty, language),
        )
        .expect_json();

        let hospitals = self
            .generate(request)
            .await
            .and_then(|text| parse_json::<HospitalList>(&text));

        match hospitals {
            Ok(HospitalList::Bare(hospitals) | HospitalList::Wrapped { hospitals }) => {
                AiReply::ok(Hospitals { hospitals })
            }
            Err(e) => AiReply::failed(&e, Hospitals::default()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::{collections::VecDeque, sync::Mutex, time::Duration};

    /// Modèle factice rejouant des réponses préparées
    #[derive(Default)]
    pub struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        pub requests: Mutex<Vec<GenerateRequest>>,
    }

    impl ScriptedModel {
        pub fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::default(),
            })
        }
    }

    #[async_trait]
    impl TextModel for ScriptedModel {
        async fn generate(&self, request: GenerateRequest) -> Result<String, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Malformed("no scripted reply".into())))
        }
    }

    pub fn gateway(model: Arc<ScriptedModel>) -> AiGateway {
        AiGateway::new(model).with_policy(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
        })
    }

    fn busy() -> ProviderError {
        ProviderError::Api {
            status: 503,
            message: "UNAVAILABLE The model is overloaded.".into(),
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n[1]\n```  "), "[1]");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json {\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json[1]```"), "[1]");
        assert_eq!(strip_code_fences("```[1]```"), "[1]");
    }

    #[test]
    fn test_unknown_severity_word() {
        let analysis: SymptomAnalysis =
            serde_json::from_value(json!({"severity_level": "Severe"})).unwrap();
        assert_eq!(analysis.severity_level, Severity::Unknown);

        let analysis: SymptomAnalysis =
            serde_json::from_value(json!({"severity_level": "moderate"})).unwrap();
        assert_eq!(analysis.severity_level, Severity::Medium);

        let analysis: SymptomAnalysis = parse_json(
            r#"```json {"symptoms_summary": "Mild cough", "severity_level": null}```"#,
        )
        .unwrap();
        assert_eq!(analysis.symptoms_summary, "Mild cough");
        assert_eq!(analysis.severity_level, Severity::Unknown);
    }

    #[tokio::test]
    async fn test_analysis_success_uses_pro_model_for_doctors() {
        let reply = json!({
            "symptoms_summary": "Fever with headache",
            "possible_conditions": ["Viral fever"],
            "severity_level": "High",
            "recommendations": ["Rest", "Hydrate"],
            "urgent_care_needed": false,
            "follow_up_questions": ["Since when?"],
            "disclaimer": ""
        });
        let model = ScriptedModel::new(vec![Ok(format!("```json\n{reply}\n```"))]);
        let result = gateway(model.clone())
            .analyze_symptoms("fever and headache", "English", None, Role::Doctor)
            .await;

        assert!(result.success);
        assert_eq!(result.payload.severity_level, Severity::High);
        assert!(result.payload.urgent_care_needed);
        assert_eq!(result.payload.possible_conditions, vec!["Viral fever"]);
        assert_eq!(result.payload.disclaimer, prompts::DISCLAIMER);

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[0].model, consts::MODEL_PRO);
        assert_eq!(requests[0].response_mime_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_malformed_analysis_returns_safe_defaults_without_retry() {
        let model = ScriptedModel::new(vec![Ok("I think you have a cold".into())]);
        let result = gateway(model.clone())
            .analyze_symptoms("cold", "English", None, Role::Patient)
            .await;

        assert!(!result.success);
        assert!(result.error.is_some());
        assert_eq!(result.payload, SymptomAnalysis::unavailable());
        assert_eq!(model.requests.lock().unwrap().len(), 1);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["severity_level"], "Unknown");
        assert_eq!(value["symptoms_summary"], "Unable to analyze symptoms");
        assert_eq!(value["possible_conditions"], json!([]));
        assert_eq!(value["urgent_care_needed"], false);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let model = ScriptedModel::new(vec![Err(busy()), Err(busy()), Ok("नमस्ते".into())]);
        let result = gateway(model.clone())
            .translate_text("Hello", "English", "हिंदी (Hindi)")
            .await;

        assert!(result.success);
        assert_eq!(result.payload.translation.as_deref(), Some("नमस्ते"));
        assert_eq!(model.requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_busy_service() {
        let model = ScriptedModel::new(vec![Err(busy()), Err(busy()), Err(busy())]);
        let result = gateway(model).medical_chat_response("hi", "English", Role::Patient, None, None).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(SERVICE_BUSY));
        assert_eq!(result.payload.response, None);
    }

    #[tokio::test]
    async fn test_config_error_fails_immediately() {
        let model = ScriptedModel::new(vec![Err(ProviderError::Config("GEMINI_API_KEY is not set".into()))]);
        let result = gateway(model.clone()).transcribe_audio(b"RIFF", "audio/wav").await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("GEMINI_API_KEY"));
        assert_eq!(model.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_hospitals_accept_string_specialties_and_wrapped_list() {
        let reply = json!({"hospitals": [
            {"name": "Ruby Hall Clinic", "address": "Sassoon Road", "phone": "020-66455100",
             "specialties": "Cardiology, Neurology"},
            {"name": "KEM Hospital", "specialties": ["Pediatrics"]}
        ]});
        let model = ScriptedModel::new(vec![Ok(reply.to_string())]);
        let result = gateway(model).find_nearby_hospitals("Pune", None, "English").await;

        assert!(result.success);
        let hospitals = result.payload.hospitals;
        assert_eq!(hospitals.len(), 2);
        assert_eq!(hospitals[0].specialties, vec!["Cardiology", "Neurology"]);
        assert_eq!(hospitals[1].address, "");
    }

    #[tokio::test]
    async fn test_prescription_translation_goes_from_doctor_to_patient_language() {
        let model = ScriptedModel::new(vec![Ok("दिन में दो बार".into())]);
        let result = gateway(model.clone())
            .generate_prescription_translation("Twice a day", "English", "हिंदी (Hindi)")
            .await;

        assert!(result.success);
        let requests = model.requests.lock().unwrap();
        match &requests[0].parts[0] {
            Part::Text(prompt) => assert!(prompt.contains("from English to हिंदी (Hindi)")),
            other => panic!("unexpected part {other:?}"),
        }
    }
}
