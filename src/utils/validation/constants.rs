//! Constants used throughout the validation system

/// Maximum length, in characters, for long-form content (symptoms, chat messages, notes)
pub const MAX_CONTENT_LENGTH: usize = 5_000;
/// Maximum length, in characters, for short-form content (names, titles, cities)
pub const MAX_SHORT_CONTENT_LENGTH: usize = 200;

/// Password length bounds
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 64;

/// Maximum size of an uploaded audio clip (10 MiB)
pub const MAX_AUDIO_SIZE: usize = 10 * 1024 * 1024;
