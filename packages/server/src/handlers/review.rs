use axum::Json;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::handlers::title::find_title;
use crate::models::review::*;
use crate::models::shared::{Pagination, page_request};
use crate::policy;
use crate::state::AppState;
use crate::store::{NewReview, Review, Store};

pub const DUPLICATE_REVIEW: &str = "You have already reviewed this title";

/// Look up a review of a title, returning 404 if either is missing.
pub(crate) async fn find_review(
    store: &dyn Store,
    title_id: i32,
    review_id: i32,
) -> Result<Review, AppError> {
    store
        .find_review(title_id, review_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".into()))
}

#[utoipa::path(
    get,
    path = "/titles/{title_id}/reviews",
    tag = "Reviews",
    operation_id = "listReviews",
    summary = "List reviews of a title",
    params(("title_id" = i32, Path, description = "Title ID"), ReviewListQuery),
    responses(
        (status = 200, description = "List of reviews, oldest first", body = ReviewListResponse),
        (status = 400, description = "Invalid pagination (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
    AppQuery(query): AppQuery<ReviewListQuery>,
) -> Result<Json<ReviewListResponse>, AppError> {
    let page = page_request(query.page, query.per_page)?;
    find_title(state.store.as_ref(), title_id).await?;
    let result = state.store.list_reviews(title_id, page).await?;
    Ok(Json(ReviewListResponse {
        data: result.items.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(page, result.total),
    }))
}

#[utoipa::path(
    post,
    path = "/titles/{title_id}/reviews",
    tag = "Reviews",
    operation_id = "createReview",
    summary = "Review a title",
    description = "Any signed-in user may review a title once.",
    params(("title_id" = i32, Path, description = "Title ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Caller already reviewed this title (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, method, payload))]
pub async fn create_review(
    auth_user: Option<AuthUser>,
    method: Method,
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let principal = auth_user.as_ref();
    policy::enforce(principal, policy::authenticated_or_read_only(principal, &method))?;
    let author = auth_user.ok_or(AppError::TokenMissing)?;

    let store = state.store.as_ref();
    find_title(store, title_id).await?;
    payload.validate()?;

    if store.review_exists(author.user_id, title_id).await? {
        return Err(AppError::Conflict(DUPLICATE_REVIEW.into()));
    }
    // A concurrent insert that slipped past the check is rejected by the store.
    let review = store
        .insert_review(NewReview {
            title_id,
            author_id: author.user_id,
            text: payload.text,
            score: payload.score,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

#[utoipa::path(
    get,
    path = "/titles/{title_id}/reviews/{review_id}",
    tag = "Reviews",
    operation_id = "getReview",
    summary = "Get a review",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 200, description = "Review", body = ReviewResponse),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_review(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
) -> Result<Json<ReviewResponse>, AppError> {
    let review = find_review(state.store.as_ref(), title_id, review_id).await?;
    Ok(Json(review.into()))
}

#[utoipa::path(
    patch,
    path = "/titles/{title_id}/reviews/{review_id}",
    tag = "Reviews",
    operation_id = "updateReview",
    summary = "Update a review",
    description = "Allowed for the author, moderators and admins.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Updated review", body = ReviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, method, payload))]
pub async fn update_review(
    auth_user: Option<AuthUser>,
    method: Method,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let principal = auth_user.as_ref();
    policy::enforce(principal, policy::authenticated_or_read_only(principal, &method))?;
    let store = state.store.as_ref();
    let review = find_review(store, title_id, review_id).await?;
    policy::enforce(
        principal,
        policy::author_or_staff(principal, &method, review.author_id),
    )?;

    let changes = payload.validate()?;
    let review = store.update_review(review.id, changes).await?;
    Ok(Json(review.into()))
}

#[utoipa::path(
    delete,
    path = "/titles/{title_id}/reviews/{review_id}",
    tag = "Reviews",
    operation_id = "deleteReview",
    summary = "Delete a review",
    description = "Allowed for the author, moderators and admins. Deletes the review's comments as well.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, method))]
pub async fn delete_review(
    auth_user: Option<AuthUser>,
    method: Method,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let principal = auth_user.as_ref();
    policy::enforce(principal, policy::authenticated_or_read_only(principal, &method))?;
    let store = state.store.as_ref();
    let review = find_review(store, title_id, review_id).await?;
    policy::enforce(
        principal,
        policy::author_or_staff(principal, &method, review.author_id),
    )?;

    if !store.delete_review(review.id).await? {
        return Err(AppError::NotFound("Review not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
