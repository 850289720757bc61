use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::shared::{Pagination, page_request};
use crate::models::user::*;
use crate::policy;
use crate::state::AppState;
use crate::store::{NewUser, Store, UNUSABLE_PASSWORD, User};
use crate::utils::hash;

/// Look up a user by username, returning 404 if not found.
async fn find_user(store: &dyn Store, username: &str) -> Result<User, AppError> {
    store
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Reject a username or email that belongs to an account other than `except`.
async fn ensure_identity_free(
    store: &dyn Store,
    username: Option<&str>,
    email: Option<&str>,
    except: Option<i32>,
) -> Result<(), AppError> {
    let taken_by_other = |found: Option<User>| found.is_some_and(|u| Some(u.id) != except);
    let username_taken = match username {
        Some(username) => taken_by_other(store.find_user_by_username(username).await?),
        None => false,
    };
    let email_taken = match email {
        Some(email) => taken_by_other(store.find_user_by_email(email).await?),
        None => false,
    };
    if username_taken || email_taken {
        return Err(AppError::identity_taken(username_taken, email_taken));
    }
    Ok(())
}

/// Validate and persist a partial update of `user`.
async fn apply_update(
    store: &dyn Store,
    user: User,
    mut payload: UpdateUserRequest,
) -> Result<User, AppError> {
    payload.validate()?;
    ensure_identity_free(
        store,
        payload.username.as_deref(),
        payload.email.as_deref(),
        Some(user.id),
    )
    .await?;
    Ok(store.update_user(payload.apply(user)).await?)
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users",
    description = "Paginated roster ordered by username, optionally filtered by a username substring. Admin only.",
    params(UserListQuery),
    responses(
        (status = 200, description = "List of users", body = UserListResponse),
        (status = 400, description = "Invalid pagination (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_users(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    policy::enforce(auth_user.as_ref(), policy::admin_only(auth_user.as_ref()))?;
    let page = page_request(query.page, query.per_page)?;

    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let result = state.store.list_users(search, page).await?;

    Ok(Json(UserListResponse {
        data: result.items.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(page, result.total),
    }))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create a user",
    description = "Creates an account with any role. Without `password` the account can only log in through a signup confirmation code. Admin only.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error or identity taken (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(username = %payload.username))]
pub async fn create_user(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::enforce(auth_user.as_ref(), policy::admin_only(auth_user.as_ref()))?;
    payload.validate()?;
    ensure_identity_free(
        state.store.as_ref(),
        Some(&payload.username),
        Some(&payload.email),
        None,
    )
    .await?;

    let password = match &payload.password {
        Some(plain) => hash::hash_password(plain)
            .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?,
        None => UNUSABLE_PASSWORD.to_string(),
    };

    let user = state
        .store
        .insert_user(NewUser {
            username: payload.username,
            email: payload.email,
            role: payload.role,
            first_name: payload.first_name,
            last_name: payload.last_name,
            bio: payload.bio,
            confirmation_code: String::new(),
            password,
            is_superuser: false,
        })
        .await?;
    tracing::info!(user_id = user.id, role = %user.role, "User created by admin");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/users/{username}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user by username",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_user(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    policy::enforce(auth_user.as_ref(), policy::admin_only(auth_user.as_ref()))?;
    let user = find_user(state.store.as_ref(), &username).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/users/{username}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update a user",
    description = "Partially updates a user, including the role. Superusers always keep the admin role. Admin only.",
    params(("username" = String, Path, description = "Username")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Validation error or identity taken (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_user(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(username): Path<String>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    policy::enforce(auth_user.as_ref(), policy::admin_only(auth_user.as_ref()))?;
    let user = find_user(state.store.as_ref(), &username).await?;
    let updated = apply_update(state.store.as_ref(), user, payload).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/users/{username}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete a user",
    description = "Deletes the account together with the reviews and comments it authored. Admin only.",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_user(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    policy::enforce(auth_user.as_ref(), policy::admin_only(auth_user.as_ref()))?;
    let user = find_user(state.store.as_ref(), &username).await?;
    if !state.store.delete_user(user.id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    tracing::info!(user_id = user.id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    operation_id = "getMe",
    summary = "Get the caller's profile",
    responses(
        (status = 200, description = "Caller's profile", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .store
        .find_user(auth_user.user_id)
        .await?
        .ok_or(AppError::TokenInvalid)?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/users/me",
    tag = "Users",
    operation_id = "updateMe",
    summary = "Update the caller's profile",
    description = "Updates username, email, names and bio. A submitted `role` is ignored.",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Validation error or identity taken (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .store
        .find_user(auth_user.user_id)
        .await?
        .ok_or(AppError::TokenInvalid)?;
    let updated = apply_update(state.store.as_ref(), user, payload.into()).await?;
    Ok(Json(updated.into()))
}
