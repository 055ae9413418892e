//! Arogya Mitra: assistant de santé multilingue pour patients et médecins.
//!
//! Le binaire expose une API JSON (axum) au-dessus d'un stockage en fichiers
//! JSON plats et d'une passerelle vers un fournisseur d'IA générative.
pub mod backend;
pub mod config;
pub mod consts;
pub mod database;
pub mod gateway;
pub mod models;
pub mod navigation;
pub mod session;
pub mod utils;
