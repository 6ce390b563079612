use crate::client::ApiError;
use crate::models::{LoginRequest, RegisterRequest};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Registration input as the user typed it.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// A registration that passed local checks. Only `RegistrationForm::validate`
/// constructs one, so the auth service never sends unchecked input.
#[derive(Debug, Clone)]
pub struct ValidatedRegistration {
    request: RegisterRequest,
}

impl ValidatedRegistration {
    pub fn username(&self) -> &str {
        &self.request.username
    }

    pub(crate) fn request(&self) -> &RegisterRequest {
        &self.request
    }
}

impl RegistrationForm {
    /// Checks run in order and the first failure is reported: required
    /// fields, an `@` in the email, matching confirmation, then password length.
    pub fn validate(&self) -> Result<ValidatedRegistration, ApiError> {
        let fields = [
            ("Full name", self.full_name.trim()),
            ("Username", self.username.trim()),
            ("Email", self.email.trim()),
            ("Password", self.password.as_str()),
            ("Password confirmation", self.confirm_password.as_str()),
        ];
        if let Some((label, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
            return Err(ApiError::Validation(format!("{label} is required")));
        }
        if !self.email.contains('@') {
            return Err(ApiError::Validation(
                "Please enter a valid email address".to_string(),
            ));
        }
        if self.password != self.confirm_password {
            return Err(ApiError::Validation("Passwords do not match".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        Ok(ValidatedRegistration {
            request: RegisterRequest {
                username: self.username.trim().to_string(),
                email: self.email.trim().to_string(),
                password: self.password.clone(),
                full_name: self.full_name.trim().to_string(),
            },
        })
    }
}

/// Build a login request, rejecting blank fields. Passwords are sent as typed.
pub fn validate_login(username_or_email: &str, password: &str) -> Result<LoginRequest, ApiError> {
    let username_or_email = username_or_email.trim();
    if username_or_email.is_empty() {
        return Err(ApiError::Validation(
            "Username or email is required".to_string(),
        ));
    }
    if password.is_empty() {
        return Err(ApiError::Validation("Password is required".to_string()));
    }
    Ok(LoginRequest {
        username_or_email: username_or_email.to_string(),
        password: password.to_string(),
    })
}
