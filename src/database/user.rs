//! Gestion des utilisateurs et authentification par mot de passe

use chrono::NaiveDateTime;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{now, Record, Store, StoreError, Table};
use crate::{
    consts,
    models::Role,
    utils::password_utils::{hash, verify, PWHash},
};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: PWHash,
    pub role: Role,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub phone: String,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub last_login: Option<NaiveDateTime>,
}

impl Record for User {
    const FILE: &'static str = consts::USERS_FILE;

    fn id(&self) -> u64 {
        self.id
    }
}

/// Les données d'un utilisateur sans son mot de passe, exposables à l'API
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct PublicUser {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub language: String,
    pub phone: String,
    pub created_at: NaiveDateTime,
    pub last_login: Option<NaiveDateTime>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            language: user.language.clone(),
            phone: user.phone.clone(),
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub language: String,
    pub phone: String,
}

/// Modification du profil; l'identifiant et le mot de passe ne sont pas modifiables ici
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub language: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered. Please sign in instead.")]
    EmailTaken,
    #[error("Email not found. Please sign up first.")]
    UnknownEmail,
    #[error("Incorrect password. Please try again.")]
    WrongPassword,
    #[error("Current password is incorrect")]
    WrongCurrentPassword,
    #[error("User not found")]
    UserNotFound,
    #[error("Failed to hash password")]
    Hashing,
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Store {
    /// Enregistre un nouvel utilisateur. L'adresse email est unique, sans tenir compte de la casse.
    pub fn create_user(&self, new: NewUser) -> Result<PublicUser, AuthError> {
        let email = normalize_email(&new.email);
        let password = hash(&new.password).map_err(|_| AuthError::Hashing)?;

        let created = self.transact(|table: &mut Table<User>| {
            if table.iter().any(|u| u.email.eq_ignore_ascii_case(&email)) {
                return None;
            }

            let user = User {
                id: table.allocate_id(),
                name: new.name.trim().to_string(),
                email,
                password,
                role: new.role,
                language: new.language,
                phone: new.phone,
                created_at: now(),
                last_login: None,
            };
            table.push(user.clone());
            Some(user)
        })?;

        let user = created.ok_or(AuthError::EmailTaken)?;
        info!("Account created for {} ({})", user.email, user.role);
        Ok(PublicUser::from(&user))
    }

    /// Vérifie les identifiants et enregistre la date de connexion
    pub fn authenticate_user(&self, email: &str, password: &str) -> Result<PublicUser, AuthError> {
        let email = normalize_email(email);

        let outcome = self.transact(|table: &mut Table<User>| -> Result<PublicUser, AuthError> {
            let stored = table
                .iter()
                .find(|u| u.email.eq_ignore_ascii_case(&email))
                .map(|u| u.password.clone());

            if !verify(password, stored.as_ref()) {
                return Err(if stored.is_some() {
                    AuthError::WrongPassword
                } else {
                    AuthError::UnknownEmail
                });
            }

            let user = table
                .find_mut(|u| u.email.eq_ignore_ascii_case(&email))
                .ok_or(AuthError::UnknownEmail)?;
            user.last_login = Some(now());
            Ok(PublicUser::from(&*user))
        })?;

        match &outcome {
            Ok(user) => info!("Login succeeded for {}", user.email),
            Err(_) => warn!("Login failed for {}", email),
        }
        outcome
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<PublicUser>, StoreError> {
        let email = normalize_email(email);
        Ok(self
            .filter(|u: &User| u.email.eq_ignore_ascii_case(&email))?
            .first()
            .map(PublicUser::from))
    }

    pub fn get_user(&self, id: u64) -> Result<Option<PublicUser>, StoreError> {
        Ok(self.find::<User>(id)?.as_ref().map(PublicUser::from))
    }

    pub fn update_user(&self, id: u64, update: UserUpdate) -> Result<PublicUser, AuthError> {
        let updated = self.update(id, |user: &mut User| {
            if let Some(name) = update.name {
                user.name = name.trim().to_string();
            }
            if let Some(language) = update.language {
                user.language = language;
            }
            if let Some(phone) = update.phone {
                user.phone = phone;
            }
        })?;

        updated
            .as_ref()
            .map(PublicUser::from)
            .ok_or(AuthError::UserNotFound)
    }

    /// Change le mot de passe après vérification de l'ancien
    pub fn change_password(&self, id: u64, old: &str, new: &str) -> Result<(), AuthError> {
        let new_hash = hash(new).map_err(|_| AuthError::Hashing)?;

        self.transact(|table: &mut Table<User>| -> Result<(), AuthError> {
            let user = table.get_mut(id).ok_or(AuthError::UserNotFound)?;
            if !verify(old, Some(&user.password)) {
                return Err(AuthError::WrongCurrentPassword);
            }
            user.password = new_hash;
            Ok(())
        })?
    }

    pub fn get_all_users_by_role(&self, role: Role) -> Result<Vec<PublicUser>, StoreError> {
        Ok(self
            .filter(|u: &User| u.role == role)?
            .iter()
            .map(PublicUser::from)
            .collect())
    }
}
