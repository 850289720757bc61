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
use crate::models::title::*;
use crate::policy;
use crate::state::AppState;
use crate::store::{NewTitle, Store, TermKind, TitleChanges, TitleDetails, TitleFilter};

/// Look up a title by ID, returning 404 if not found.
pub(crate) async fn find_title(store: &dyn Store, id: i32) -> Result<TitleDetails, AppError> {
    store
        .find_title(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Title not found".into()))
}

fn unknown_slug(field: &str, slug: &str) -> AppError {
    AppError::field(field, format!("Object with slug={slug} does not exist."))
}

async fn resolve_category(store: &dyn Store, slug: &str) -> Result<i32, AppError> {
    store
        .find_terms(TermKind::Category, &[slug.to_string()])
        .await?
        .first()
        .map(|t| t.id)
        .ok_or_else(|| unknown_slug("category", slug))
}

/// Map genre slugs to IDs, failing on the first unknown slug.
async fn resolve_genres(store: &dyn Store, slugs: &[String]) -> Result<Vec<i32>, AppError> {
    let found = store.find_terms(TermKind::Genre, slugs).await?;
    slugs
        .iter()
        .map(|slug| {
            found
                .iter()
                .find(|t| &t.slug == slug)
                .map(|t| t.id)
                .ok_or_else(|| unknown_slug("genre", slug))
        })
        .collect()
}

#[utoipa::path(
    get,
    path = "/titles",
    tag = "Titles",
    operation_id = "listTitles",
    summary = "List titles",
    description = "Paginated titles ordered by name. Filters combine: `category` and `genre` match slugs exactly, `name` is a case-insensitive substring, `year` an exact release year.",
    params(TitleListQuery),
    responses(
        (status = 200, description = "List of titles", body = TitleListResponse),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_titles(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TitleListQuery>,
) -> Result<Json<TitleListResponse>, AppError> {
    let page = page_request(query.page, query.per_page)?;
    let filter = TitleFilter {
        category: query.category,
        genre: query.genre,
        name: query.name.filter(|n| !n.trim().is_empty()),
        year: query.year,
    };
    let result = state.store.list_titles(&filter, page).await?;
    Ok(Json(TitleListResponse {
        data: result.items.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(page, result.total),
    }))
}

#[utoipa::path(
    post,
    path = "/titles",
    tag = "Titles",
    operation_id = "createTitle",
    summary = "Create a title",
    description = "Admin only. `category` is a category slug and `genre` a non-empty list of genre slugs.",
    request_body = CreateTitleRequest,
    responses(
        (status = 201, description = "Title created", body = TitleWriteResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, method, payload), fields(name = %payload.name))]
pub async fn create_title(
    auth_user: Option<AuthUser>,
    method: Method,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTitleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let principal = auth_user.as_ref();
    policy::enforce(principal, policy::admin_or_read_only(principal, &method))?;
    payload.validate()?;

    let store = state.store.as_ref();
    let category_id = match payload.category.as_deref() {
        Some(slug) => Some(resolve_category(store, slug).await?),
        None => None,
    };
    let genre_ids = resolve_genres(store, &payload.genre).await?;

    let title = store
        .insert_title(NewTitle {
            name: payload.name.trim().to_string(),
            year: payload.year,
            description: payload.description,
            category_id,
            genre_ids,
        })
        .await?;
    tracing::info!(title_id = title.id, "Title created");

    Ok((StatusCode::CREATED, Json(TitleWriteResponse::from(title))))
}

#[utoipa::path(
    get,
    path = "/titles/{title_id}",
    tag = "Titles",
    operation_id = "getTitle",
    summary = "Get a title",
    params(("title_id" = i32, Path, description = "Title ID")),
    responses(
        (status = 200, description = "Title with rating, category and genres", body = TitleResponse),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_title(
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
) -> Result<Json<TitleResponse>, AppError> {
    let title = find_title(state.store.as_ref(), title_id).await?;
    Ok(Json(title.into()))
}

#[utoipa::path(
    patch,
    path = "/titles/{title_id}",
    tag = "Titles",
    operation_id = "updateTitle",
    summary = "Update a title",
    description = "Admin only. `genre`, when present, replaces the whole genre set; `category: null` detaches the category.",
    params(("title_id" = i32, Path, description = "Title ID")),
    request_body = UpdateTitleRequest,
    responses(
        (status = 200, description = "Updated title", body = TitleWriteResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, method, payload))]
pub async fn update_title(
    auth_user: Option<AuthUser>,
    method: Method,
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
    AppJson(payload): AppJson<UpdateTitleRequest>,
) -> Result<Json<TitleWriteResponse>, AppError> {
    let principal = auth_user.as_ref();
    policy::enforce(principal, policy::admin_or_read_only(principal, &method))?;
    let store = state.store.as_ref();
    find_title(store, title_id).await?;
    policy::enforce(principal, policy::title_object(principal, &method))?;
    payload.validate()?;

    let category_id = match payload.category {
        Some(Some(slug)) => Some(Some(resolve_category(store, &slug).await?)),
        Some(None) => Some(None),
        None => None,
    };
    let genre_ids = match &payload.genre {
        Some(slugs) => Some(resolve_genres(store, slugs).await?),
        None => None,
    };

    let title = store
        .update_title(
            title_id,
            TitleChanges {
                name: payload.name.map(|n| n.trim().to_string()),
                year: payload.year,
                description: payload.description,
                category_id,
                genre_ids,
            },
        )
        .await?;

    Ok(Json(title.into()))
}

#[utoipa::path(
    delete,
    path = "/titles/{title_id}",
    tag = "Titles",
    operation_id = "deleteTitle",
    summary = "Delete a title",
    description = "Admin only. Deletes the title's reviews and their comments as well.",
    params(("title_id" = i32, Path, description = "Title ID")),
    responses(
        (status = 204, description = "Title deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, method))]
pub async fn delete_title(
    auth_user: Option<AuthUser>,
    method: Method,
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let principal = auth_user.as_ref();
    policy::enforce(principal, policy::admin_or_read_only(principal, &method))?;
    find_title(state.store.as_ref(), title_id).await?;
    policy::enforce(principal, policy::title_object(principal, &method))?;

    if !state.store.delete_title(title_id).await? {
        return Err(AppError::NotFound("Title not found".into()));
    }
    tracing::info!(title_id, "Title deleted");
    Ok(StatusCode::NO_CONTENT)
}
