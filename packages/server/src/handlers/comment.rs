use axum::Json;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::handlers::review::find_review;
use crate::models::comment::*;
use crate::models::shared::{Pagination, page_request};
use crate::policy;
use crate::state::AppState;
use crate::store::{Comment, NewComment, Store};

/// Look up a comment under a title's review, returning 404 if any link is missing.
async fn find_comment(
    store: &dyn Store,
    title_id: i32,
    review_id: i32,
    comment_id: i32,
) -> Result<Comment, AppError> {
    find_review(store, title_id, review_id).await?;
    store
        .find_comment(review_id, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}

#[utoipa::path(
    get,
    path = "/titles/{title_id}/reviews/{review_id}/comments",
    tag = "Comments",
    operation_id = "listComments",
    summary = "List comments on a review",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        CommentListQuery,
    ),
    responses(
        (status = 200, description = "List of comments, oldest first", body = CommentListResponse),
        (status = 400, description = "Invalid pagination (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_comments(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
    AppQuery(query): AppQuery<CommentListQuery>,
) -> Result<Json<CommentListResponse>, AppError> {
    let page = page_request(query.page, query.per_page)?;
    find_review(state.store.as_ref(), title_id, review_id).await?;
    let result = state.store.list_comments(review_id, page).await?;
    Ok(Json(CommentListResponse {
        data: result.items.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(page, result.total),
    }))
}

#[utoipa::path(
    post,
    path = "/titles/{title_id}/reviews/{review_id}/comments",
    tag = "Comments",
    operation_id = "createComment",
    summary = "Comment on a review",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, method, payload))]
pub async fn create_comment(
    auth_user: Option<AuthUser>,
    method: Method,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let principal = auth_user.as_ref();
    policy::enforce(principal, policy::authenticated_or_read_only(principal, &method))?;
    let author = auth_user.ok_or(AppError::TokenMissing)?;

    let store = state.store.as_ref();
    find_review(store, title_id, review_id).await?;
    payload.validate()?;

    let comment = store
        .insert_comment(NewComment {
            review_id,
            author_id: author.user_id,
            text: payload.text,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

#[utoipa::path(
    get,
    path = "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "getComment",
    summary = "Get a comment",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 200, description = "Comment", body = CommentResponse),
        (status = 404, description = "Title, review or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_comment(
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
) -> Result<Json<CommentResponse>, AppError> {
    let comment = find_comment(state.store.as_ref(), title_id, review_id, comment_id).await?;
    Ok(Json(comment.into()))
}

#[utoipa::path(
    patch,
    path = "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Update a comment",
    description = "Allowed for the author, moderators and admins.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Updated comment", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title, review or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, method, payload))]
pub async fn update_comment(
    auth_user: Option<AuthUser>,
    method: Method,
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let principal = auth_user.as_ref();
    policy::enforce(principal, policy::authenticated_or_read_only(principal, &method))?;
    let store = state.store.as_ref();
    let comment = find_comment(store, title_id, review_id, comment_id).await?;
    policy::enforce(
        principal,
        policy::author_or_staff(principal, &method, comment.author_id),
    )?;
    payload.validate()?;

    let comment = match payload.text {
        Some(text) => store.update_comment(comment.id, text).await?,
        None => comment,
    };
    Ok(Json(comment.into()))
}

#[utoipa::path(
    delete,
    path = "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment",
    description = "Allowed for the author, moderators and admins.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title, review or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, method))]
pub async fn delete_comment(
    auth_user: Option<AuthUser>,
    method: Method,
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let principal = auth_user.as_ref();
    policy::enforce(principal, policy::authenticated_or_read_only(principal, &method))?;
    let store = state.store.as_ref();
    let comment = find_comment(store, title_id, review_id, comment_id).await?;
    policy::enforce(
        principal,
        policy::author_or_staff(principal, &method, comment.author_id),
    )?;

    if !store.delete_comment(comment.id).await? {
        return Err(AppError::NotFound("Comment not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
