use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::shared::{BLANK, Violations, normalize_email, validate_email, validate_username};

/// Request body for signup.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    /// 1-150 characters from `[A-Za-z0-9_.@+-]`; `me` is reserved.
    #[schema(example = "alice")]
    pub username: String,
    /// Where the confirmation code is sent.
    #[schema(example = "alice@example.com")]
    pub email: String,
}

impl SignupRequest {
    /// Validate and return `(username, email)` with the email normalized.
    pub fn validate(&self) -> Result<(String, String), AppError> {
        let mut violations = Violations::new();
        violations.check("username", validate_username(&self.username));
        violations.check("email", validate_email(self.email.trim()));
        violations.finish()?;
        Ok((self.username.clone(), normalize_email(&self.email)))
    }
}

/// Signup echo. The confirmation code only travels by mail.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SignupResponse {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
}

/// Request body for exchanging a confirmation code for a token.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct TokenRequest {
    #[schema(example = "alice")]
    pub username: String,
    /// The 6-digit code received by mail.
    #[schema(example = "042917")]
    pub confirmation_code: String,
}

impl TokenRequest {
    /// Only the username is checked up front, so an unknown user is reported
    /// as such even when the code is missing.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().is_empty() {
            return Err(AppError::field("username", BLANK));
        }
        Ok(())
    }

    /// Whether the submitted code equals `stored`. An empty code never matches.
    pub fn code_matches(&self, stored: &str) -> bool {
        !stored.is_empty() && self.confirmation_code.trim() == stored
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
}
