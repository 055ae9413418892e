//! Middleware pour gérer les sessions utilisateur.
//! Vérifie la validité d'une session utilisateur et rejette les requêtes non autorisées.

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Extension;
use log::{error, info};
use tower_sessions::{MemoryStore, Session, SessionStore};

use crate::database::user::PublicUser;
use crate::models::Role;
use crate::session::SessionState;
use crate::utils::error_messages::{AUTH_FAILED, FORBIDDEN, SESSION_ERROR};

/// Utilisateur connecté, avec l'état de sa session
pub struct SessionUser {
    pub session: Session,
    pub state: SessionState,
    pub user: PublicUser,
    sessions: MemoryStore,
}

impl SessionUser {
    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn is_doctor(&self) -> bool {
        self.user.role == Role::Doctor
    }

    /// Enregistre les modifications de l'état de session, seulement si la session
    /// appartient toujours au même utilisateur: une déconnexion survenue pendant la
    /// requête n'est pas annulée.
    pub async fn save(&self) -> Result<(), (StatusCode, &'static str)> {
        let still_signed_in = self
            .latest_state()
            .await?
            .and_then(|latest| latest.user)
            .is_some_and(|user| user.id == self.user.id);
        if !still_signed_in {
            info!("Session of {} closed during the request, state not saved", self.user.email);
            return Ok(());
        }

        self.state.store(&self.session).await.map_err(|e| {
            error!("Failed to store session state: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, SESSION_ERROR)
        })
    }

    /// État tel qu'enregistré actuellement, sans le cache de la requête
    async fn latest_state(&self) -> Result<Option<SessionState>, (StatusCode, &'static str)> {
        let Some(id) = self.session.id() else {
            return Ok(None);
        };
        let record = self.sessions.load(&id).await.map_err(|e| {
            error!("Failed to reload session: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, SESSION_ERROR)
        })?;
        Ok(record.as_ref().and_then(SessionState::from_record))
    }
}

/// Charge l'état de session, qu'un utilisateur soit connecté ou non
pub async fn load_state(session: &Session) -> Result<SessionState, (StatusCode, &'static str)> {
    SessionState::load(session).await.map_err(|e| {
        error!("Failed to load session state: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, SESSION_ERROR)
    })
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, SESSION_ERROR))?;
        let Extension(sessions) = Extension::<MemoryStore>::from_request_parts(parts, state)
            .await
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, SESSION_ERROR))?;
        let session_state = load_state(&session).await?;

        let user = session_state
            .user
            .clone()
            .ok_or((StatusCode::UNAUTHORIZED, AUTH_FAILED))?;

        Ok(SessionUser {
            session,
            state: session_state,
            user,
            sessions,
        })
    }
}

/// Utilisateur connecté avec le rôle de médecin
pub struct DoctorUser(pub SessionUser);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for DoctorUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = SessionUser::from_request_parts(parts, state).await?;
        if !user.is_doctor() {
            return Err((StatusCode::FORBIDDEN, FORBIDDEN));
        }
        Ok(DoctorUser(user))
    }
}
