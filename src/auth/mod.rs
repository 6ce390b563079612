pub mod auth;
pub mod validation;

pub use auth::{AuthService, AuthSuccess, LOGIN_FALLBACK, REGISTER_FALLBACK};
pub use validation::{validate_login, RegistrationForm, ValidatedRegistration, MIN_PASSWORD_LENGTH};
