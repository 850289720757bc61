use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::store::TitleDetails;

use super::shared::{
    Pagination, REQUIRED, TITLE_NAME_MAX_LEN, Violations, double_option, validate_required_text,
};
use super::taxonomy::TermResponse;

/// Request body for creating a title. Category and genres are referenced by slug.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTitleRequest {
    #[schema(example = "Solaris")]
    pub name: String,
    #[schema(example = 1961)]
    pub year: i32,
    #[serde(default)]
    pub description: String,
    #[schema(example = "book")]
    pub category: Option<String>,
    #[serde(default)]
    #[schema(example = json!(["sci-fi"]))]
    pub genre: Vec<String>,
}

impl CreateTitleRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut violations = Violations::new();
        violations.check("name", validate_required_text(&self.name, TITLE_NAME_MAX_LEN));
        violations.check("year", validate_year(self.year));
        if self.category.as_deref().is_none_or(|c| c.is_empty()) {
            violations.add("category", REQUIRED);
        }
        violations.check("genre", validate_genre(&self.genre));
        violations.finish()
    }
}

/// Partial update of a title. `category: null` detaches the category.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateTitleRequest {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub category: Option<Option<String>>,
    pub genre: Option<Vec<String>>,
}

impl UpdateTitleRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut violations = Violations::new();
        if let Some(name) = &self.name {
            violations.check("name", validate_required_text(name, TITLE_NAME_MAX_LEN));
        }
        if let Some(year) = self.year {
            violations.check("year", validate_year(year));
        }
        if let Some(genre) = &self.genre {
            violations.check("genre", validate_genre(genre));
        }
        violations.finish()
    }
}

fn validate_year(year: i32) -> Result<(), String> {
    let current = Utc::now().year();
    if year < 0 {
        return Err("Year must not be negative.".into());
    }
    if year > current {
        return Err(format!("Year {year} is later than the current year."));
    }
    Ok(())
}

fn validate_genre(slugs: &[String]) -> Result<(), String> {
    if slugs.is_empty() {
        return Err("At least one genre is required.".into());
    }
    Ok(())
}

/// Title as returned by reads.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TitleResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Solaris")]
    pub name: String,
    #[schema(example = 1961)]
    pub year: i32,
    pub description: String,
    /// Mean review score, 0 without reviews.
    #[schema(example = 8.5)]
    pub rating: f64,
    pub category: Option<TermResponse>,
    pub genre: Vec<TermResponse>,
}

impl From<TitleDetails> for TitleResponse {
    fn from(title: TitleDetails) -> Self {
        Self {
            id: title.id,
            name: title.name,
            year: title.year,
            description: title.description,
            rating: title.rating,
            category: title.category.map(Into::into),
            genre: title.genres.into_iter().map(Into::into).collect(),
        }
    }
}

/// Title as returned by create and update, with references as slugs.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TitleWriteResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Solaris")]
    pub name: String,
    #[schema(example = 1961)]
    pub year: i32,
    pub description: String,
    #[schema(example = "book")]
    pub category: Option<String>,
    #[schema(example = json!(["sci-fi"]))]
    pub genre: Vec<String>,
}

impl From<TitleDetails> for TitleWriteResponse {
    fn from(title: TitleDetails) -> Self {
        Self {
            id: title.id,
            name: title.name,
            year: title.year,
            description: title.description,
            category: title.category.map(|c| c.slug),
            genre: title.genres.into_iter().map(|g| g.slug).collect(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TitleListResponse {
    pub data: Vec<TitleResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TitleListQuery {
    /// Page number (default 1).
    pub page: Option<u64>,
    /// Items per page (default 10, max 100).
    pub per_page: Option<u64>,
    /// Category slug.
    pub category: Option<String>,
    /// Genre slug.
    pub genre: Option<String>,
    /// Case-insensitive name substring.
    pub name: Option<String>,
    pub year: Option<i32>,
}
