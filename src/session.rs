//! État de session d'un navigateur: utilisateur connecté, langue et transcriptions.
//!
//! Tout l'état est regroupé dans une seule structure stockée sous une seule clé,
//! ce qui rend la déconnexion triviale: on remet la structure à sa valeur par défaut.

use serde::{Deserialize, Serialize};
use tower_sessions::{session::Record, Session};

use crate::{
    consts,
    database::user::PublicUser,
    gateway::assistant::Severity,
    models::Role,
};

const SESSION_KEY: &str = "arogya_state";

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TranslationEntry {
    pub speaker: Role,
    pub original: String,
    pub translation: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SessionState {
    pub user: Option<PublicUser>,
    pub role: Option<Role>,
    pub language: String,
    /// Nom sous lequel le patient apparaît dans les rendez-vous et ordonnances
    pub patient_name: String,
    pub chat_history: Vec<ChatEntry>,
    pub translation_history: Vec<TranslationEntry>,
    pub last_severity: Option<Severity>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            role: None,
            language: consts::DEFAULT_LANGUAGE.to_string(),
            patient_name: String::new(),
            chat_history: Vec::new(),
            translation_history: Vec::new(),
            last_severity: None,
        }
    }
}

impl SessionState {
    /// Déconnexion: retour aux valeurs initiales
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn sign_in(&mut self, user: PublicUser) {
        self.reset();
        self.role = Some(user.role);
        if !user.language.is_empty() {
            self.language = user.language.clone();
        }
        if user.role == Role::Patient {
            self.patient_name = user.name.clone();
        }
        self.user = Some(user);
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn push_chat(&mut self, role: ChatRole, content: impl Into<String>) {
        self.chat_history.push(ChatEntry {
            role,
            content: content.into(),
        });
    }

    pub fn push_translation(&mut self, speaker: Role, original: String, translation: String) {
        self.translation_history.push(TranslationEntry {
            speaker,
            original,
            translation,
        });
    }

    pub fn clear_translations(&mut self) {
        self.translation_history.clear();
    }

    /// Charge l'état depuis la session, ou l'état par défaut au premier accès
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        Ok(session.get::<Self>(SESSION_KEY).await?.unwrap_or_default())
    }

    /// Lit l'état dans un enregistrement brut du stockage de sessions
    pub fn from_record(record: &Record) -> Option<Self> {
        record
            .data
            .get(SESSION_KEY)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub async fn store(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(SESSION_KEY, self).await
    }
}
