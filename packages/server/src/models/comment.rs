use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::store::Comment;

use super::review::validate_text;
use super::shared::{Pagination, Violations};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CommentRequest {
    #[schema(example = "Agreed, the ending stays with you.")]
    pub text: String,
}

impl CommentRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut violations = Violations::new();
        violations.check("text", validate_text(&self.text));
        violations.finish()
    }
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateCommentRequest {
    pub text: Option<String>,
}

impl UpdateCommentRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut violations = Violations::new();
        if let Some(text) = &self.text {
            violations.check("text", validate_text(text));
        }
        violations.finish()
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentResponse {
    #[schema(example = 1)]
    pub id: i32,
    /// Username of the author.
    #[schema(example = "bob")]
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            author: comment.author,
            text: comment.text,
            pub_date: comment.pub_date,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentListResponse {
    pub data: Vec<CommentResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommentListQuery {
    /// Page number (default 1).
    pub page: Option<u64>,
    /// Items per page (default 10, max 100).
    pub per_page: Option<u64>,
}
