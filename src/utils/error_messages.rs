//! Messages d'erreur renvoyés au client HTTP

pub const VALIDATION_ERROR: &str = "Validation failed";

pub const LOGIN_ERROR: &str = "Login failed";

pub const REGISTRATION_ERROR: &str = "Registration failed";

pub const AUTH_FAILED: &str = "Authentication required";

pub const FORBIDDEN: &str = "You are not allowed to access this resource";

pub const NOT_FOUND: &str = "Not found";

pub const STORAGE_ERROR: &str = "Could not access health data";

pub const SESSION_ERROR: &str = "Session error";

pub const SERVICE_BUSY: &str = "The AI service is busy right now. Please try again in a moment.";
