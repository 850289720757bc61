use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::store::{Role, User};

use super::shared::{
    PERSON_NAME_MAX_LEN, Pagination, Violations, normalize_email, validate_email,
    validate_optional_text, validate_username,
};

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;

/// Public profile of a user.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "Alice")]
    pub first_name: String,
    #[schema(example = "Liddell")]
    pub last_name: String,
    #[schema(example = "Reads a lot.")]
    pub bio: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            role: user.role,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Page number (default 1).
    pub page: Option<u64>,
    /// Items per page (default 10, max 100).
    pub per_page: Option<u64>,
    /// Case-insensitive username substring.
    pub search: Option<String>,
}

/// Admin request to create a user.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub bio: String,
    /// Optional login password (8-128 characters). Without one the account
    /// can only obtain tokens through signup confirmation codes.
    pub password: Option<String>,
}

impl CreateUserRequest {
    pub fn validate(&mut self) -> Result<(), AppError> {
        let mut violations = Violations::new();
        violations.check("username", validate_username(&self.username));
        violations.check("email", validate_email(self.email.trim()));
        check_person_names(&mut violations, Some(&self.first_name), Some(&self.last_name));
        if let Some(password) = &self.password {
            violations.check("password", validate_password(password));
        }
        violations.finish()?;
        self.email = normalize_email(&self.email);
        Ok(())
    }
}

/// Admin partial update of any user, including the role.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<Role>,
}

/// Self-service profile update. There is no `role` field: a submitted role
/// is silently dropped.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateUserRequest {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            bio: req.bio,
            role: None,
        }
    }
}

impl UpdateUserRequest {
    pub fn validate(&mut self) -> Result<(), AppError> {
        let mut violations = Violations::new();
        if let Some(username) = &self.username {
            violations.check("username", validate_username(username));
        }
        if let Some(email) = &self.email {
            violations.check("email", validate_email(email.trim()));
        }
        check_person_names(
            &mut violations,
            self.first_name.as_deref(),
            self.last_name.as_deref(),
        );
        violations.finish()?;
        if let Some(email) = &mut self.email {
            *email = normalize_email(email);
        }
        Ok(())
    }

    /// Apply the present fields onto `user`.
    pub fn apply(self, mut user: User) -> User {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(bio) = self.bio {
            user.bio = bio;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        user
    }
}

fn check_person_names(violations: &mut Violations, first: Option<&str>, last: Option<&str>) {
    if let Some(first) = first {
        violations.check("first_name", validate_optional_text(first, PERSON_NAME_MAX_LEN));
    }
    if let Some(last) = last {
        violations.check("last_name", validate_optional_text(last, PERSON_NAME_MAX_LEN));
    }
}

fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Err(format!(
            "Password must be {PASSWORD_MIN_LEN}-{PASSWORD_MAX_LEN} characters."
        ));
    }
    Ok(())
}
