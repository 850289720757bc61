use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::store::{Review, ReviewChanges};

use super::shared::{BLANK, Pagination, Violations};

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 10;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateReviewRequest {
    #[schema(example = "A slow, haunting masterpiece.")]
    pub text: String,
    /// Integer from 1 to 10.
    #[schema(example = 9)]
    pub score: i32,
}

impl CreateReviewRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut violations = Violations::new();
        violations.check("text", validate_text(&self.text));
        violations.check("score", validate_score(self.score));
        violations.finish()
    }
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateReviewRequest {
    pub text: Option<String>,
    pub score: Option<i32>,
}

impl UpdateReviewRequest {
    pub fn validate(self) -> Result<ReviewChanges, AppError> {
        let mut violations = Violations::new();
        if let Some(text) = &self.text {
            violations.check("text", validate_text(text));
        }
        if let Some(score) = self.score {
            violations.check("score", validate_score(score));
        }
        violations.finish()?;
        Ok(ReviewChanges {
            text: self.text,
            score: self.score,
        })
    }
}

pub(super) fn validate_text(text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err(BLANK.into());
    }
    Ok(())
}

fn validate_score(score: i32) -> Result<(), String> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(format!(
            "Score must be between {MIN_SCORE} and {MAX_SCORE}."
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewResponse {
    #[schema(example = 1)]
    pub id: i32,
    /// Username of the author.
    #[schema(example = "alice")]
    pub author: String,
    pub text: String,
    #[schema(example = 9)]
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            author: review.author,
            text: review.text,
            score: review.score,
            pub_date: review.pub_date,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewListResponse {
    pub data: Vec<ReviewResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReviewListQuery {
    /// Page number (default 1).
    pub page: Option<u64>,
    /// Items per page (default 10, max 100).
    pub per_page: Option<u64>,
}
