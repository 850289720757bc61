//! Categories and genres share one shape and one set of rules; the public
//! handlers only pick the [`TermKind`].

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::shared::{Pagination, page_request};
use crate::models::taxonomy::*;
use crate::policy;
use crate::state::AppState;
use crate::store::TermKind;

async fn list_terms(
    state: &AppState,
    kind: TermKind,
    query: TermListQuery,
) -> Result<Json<TermListResponse>, AppError> {
    let page = page_request(query.page, query.per_page)?;
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let result = state.store.list_terms(kind, search, page).await?;
    Ok(Json(TermListResponse {
        data: result.items.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(page, result.total),
    }))
}

async fn create_term(
    state: &AppState,
    auth_user: Option<&AuthUser>,
    method: &Method,
    kind: TermKind,
    payload: TermRequest,
) -> Result<(StatusCode, Json<TermResponse>), AppError> {
    policy::enforce(auth_user, policy::admin_or_read_only(auth_user, method))?;
    let term = state.store.insert_term(kind, payload.validate()?).await?;
    tracing::info!(kind = kind.label(), slug = %term.slug, "Term created");
    Ok((StatusCode::CREATED, Json(TermResponse::from(term))))
}

async fn delete_term(
    state: &AppState,
    auth_user: Option<&AuthUser>,
    method: &Method,
    kind: TermKind,
    slug: &str,
) -> Result<StatusCode, AppError> {
    policy::enforce(auth_user, policy::admin_or_read_only(auth_user, method))?;
    // Terms have no owner.
    policy::enforce(auth_user, policy::staff_or_owner(auth_user, None))?;
    if !state.store.delete_term(kind, slug).await? {
        return Err(AppError::NotFound(format!("{} not found", kind.label())));
    }
    tracing::info!(kind = kind.label(), slug, "Term deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/categories",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List categories",
    params(TermListQuery),
    responses(
        (status = 200, description = "List of categories", body = TermListResponse),
        (status = 400, description = "Invalid pagination (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_categories(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TermListQuery>,
) -> Result<Json<TermListResponse>, AppError> {
    list_terms(&state, TermKind::Category, query).await
}

#[utoipa::path(
    post,
    path = "/categories",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    description = "Admin only. Slugs are unique among categories.",
    request_body = TermRequest,
    responses(
        (status = 201, description = "Category created", body = TermResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, method, payload), fields(slug = %payload.slug))]
pub async fn create_category(
    auth_user: Option<AuthUser>,
    method: Method,
    State(state): State<AppState>,
    AppJson(payload): AppJson<TermRequest>,
) -> Result<impl IntoResponse, AppError> {
    create_term(&state, auth_user.as_ref(), &method, TermKind::Category, payload).await
}

#[utoipa::path(
    delete,
    path = "/categories/{slug}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a category",
    description = "Admin only. Titles in the category are kept with no category.",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, method))]
pub async fn delete_category(
    auth_user: Option<AuthUser>,
    method: Method,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    delete_term(&state, auth_user.as_ref(), &method, TermKind::Category, &slug).await
}

#[utoipa::path(
    get,
    path = "/genres",
    tag = "Genres",
    operation_id = "listGenres",
    summary = "List genres",
    params(TermListQuery),
    responses(
        (status = 200, description = "List of genres", body = TermListResponse),
        (status = 400, description = "Invalid pagination (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_genres(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TermListQuery>,
) -> Result<Json<TermListResponse>, AppError> {
    list_terms(&state, TermKind::Genre, query).await
}

#[utoipa::path(
    post,
    path = "/genres",
    tag = "Genres",
    operation_id = "createGenre",
    summary = "Create a genre",
    description = "Admin only. Slugs are unique among genres.",
    request_body = TermRequest,
    responses(
        (status = 201, description = "Genre created", body = TermResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, method, payload), fields(slug = %payload.slug))]
pub async fn create_genre(
    auth_user: Option<AuthUser>,
    method: Method,
    State(state): State<AppState>,
    AppJson(payload): AppJson<TermRequest>,
) -> Result<impl IntoResponse, AppError> {
    create_term(&state, auth_user.as_ref(), &method, TermKind::Genre, payload).await
}

#[utoipa::path(
    delete,
    path = "/genres/{slug}",
    tag = "Genres",
    operation_id = "deleteGenre",
    summary = "Delete a genre",
    description = "Admin only. The genre is removed from every title carrying it.",
    params(("slug" = String, Path, description = "Genre slug")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Genre not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, method))]
pub async fn delete_genre(
    auth_user: Option<AuthUser>,
    method: Method,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    delete_term(&state, auth_user.as_ref(), &method, TermKind::Genre, &slug).await
}
