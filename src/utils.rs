//! Utilitaires partagés: messages d'erreur, hachage des mots de passe et
//! validation des entrées utilisateur.
pub mod error_messages;
pub mod password_utils;
pub mod validation;
