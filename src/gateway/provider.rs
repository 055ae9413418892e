//! Client du fournisseur d'IA (API `generateContent` de Gemini)

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::consts;

/// Un élément du contenu envoyé au modèle
#[derive(Clone, Debug, PartialEq)]
pub enum Part {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
}

/// Une requête de génération, indépendante du fournisseur
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub parts: Vec<Part>,
    pub max_output_tokens: u32,
    /// `application/json` pour obtenir une réponse structurée
    pub response_mime_type: Option<String>,
}

impl GenerateRequest {
    pub fn new(model: &str, prompt: impl Into<String>) -> Self {
        Self {
            model: model.to_string(),
            system_instruction: None,
            parts: vec![Part::Text(prompt.into())],
            max_output_tokens: consts::MAX_OUTPUT_TOKENS,
            response_mime_type: None,
        }
    }

    pub fn with_system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn expect_json(mut self) -> Self {
        self.response_mime_type = Some("application/json".to_string());
        self
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("AI service is not configured: {0}")]
    Config(String),
    #[error("Request to AI service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("AI service error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Unexpected response from AI service: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Une erreur passagère (surcharge, quota) mérite une nouvelle tentative.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Config(_) | ProviderError::Malformed(_) => false,
            _ => {
                let text = self.to_string();
                consts::TRANSIENT_MARKERS.iter().any(|m| text.contains(m))
            }
        }
    }
}

/// Un modèle capable de produire du texte à partir d'une requête
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, ProviderError>;
}

pub struct GeminiClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, url::ParseError> {
        // `Url::join` remplace le dernier segment s'il n'y a pas de slash final
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };

        Ok(Self {
            http: Client::new(),
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn endpoint(&self, model: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(&format!("v1beta/models/{model}:generateContent"))
            .map_err(|e| ProviderError::Config(format!("invalid model URL: {e}")))
    }
}

// Format des messages échangés avec l'API

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    contents: Vec<WireContent>,
    generation_config: WireGenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Serialize, Deserialize)]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "inline_data")]
    inline_data: Option<WireBlob>,
}

#[derive(Serialize, Deserialize)]
struct WireBlob {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Deserialize)]
struct WireCandidate {
    #[serde(default)]
    content: WireContent,
}

#[derive(Deserialize)]
struct WireErrorBody {
    error: WireError,
}

#[derive(Deserialize)]
struct WireError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl From<Part> for WirePart {
    fn from(part: Part) -> Self {
        match part {
            Part::Text(text) => WirePart {
                text: Some(text),
                inline_data: None,
            },
            Part::InlineData { mime_type, data } => WirePart {
                text: None,
                inline_data: Some(WireBlob {
                    mime_type,
                    data: STANDARD.encode(data),
                }),
            },
        }
    }
}

impl From<GenerateRequest> for WireRequest {
    fn from(request: GenerateRequest) -> Self {
        WireRequest {
            system_instruction: request.system_instruction.map(|text| WireContent {
                role: None,
                parts: vec![Part::Text(text).into()],
            }),
            contents: vec![WireContent {
                role: Some("user".to_string()),
                parts: request.parts.into_iter().map(WirePart::from).collect(),
            }],
            generation_config: WireGenerationConfig {
                max_output_tokens: request.max_output_tokens,
                response_mime_type: request.response_mime_type,
            },
        }
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::Config("GEMINI_API_KEY is not set".to_string()));
        };

        let url = self.endpoint(&request.model)?;
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&WireRequest::from(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Le corps contient normalement `{"error": {"status": "UNAVAILABLE", ...}}`
            let message = match serde_json::from_str::<WireErrorBody>(&body) {
                Ok(WireErrorBody { error }) => format!("{} {}", error.status, error.message),
                Err(_) => body,
            };
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        let parsed: WireResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::Malformed("no candidate text".to_string()));
        }
        Ok(text)
    }
}
