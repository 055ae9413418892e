//! Type definitions for the validation system

mod audio_input;
mod email_input;
mod password_input;
mod phone_input;
mod text_input;

// Re-export commonly used types and functions
pub use audio_input::AudioInput;
pub use email_input::EmailInput;
pub use password_input::PasswordInput;
pub use phone_input::PhoneInput;
pub use text_input::TextInput;
