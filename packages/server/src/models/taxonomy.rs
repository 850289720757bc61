use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::store::{NewTerm, Term};

use super::shared::{TERM_NAME_MAX_LEN, Pagination, Violations, validate_required_text, validate_slug};

/// Request body for creating a category or genre.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct TermRequest {
    #[schema(example = "Science fiction")]
    pub name: String,
    /// Unique within its kind; `[-a-zA-Z0-9_]`, at most 50 characters.
    #[schema(example = "sci-fi")]
    pub slug: String,
}

impl TermRequest {
    pub fn validate(self) -> Result<NewTerm, AppError> {
        let mut violations = Violations::new();
        violations.check("name", validate_required_text(&self.name, TERM_NAME_MAX_LEN));
        violations.check("slug", validate_slug(&self.slug));
        violations.finish()?;
        Ok(NewTerm {
            name: self.name.trim().to_string(),
            slug: self.slug,
        })
    }
}

/// A category or genre as clients see it.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TermResponse {
    #[schema(example = "Science fiction")]
    pub name: String,
    #[schema(example = "sci-fi")]
    pub slug: String,
}

impl From<Term> for TermResponse {
    fn from(term: Term) -> Self {
        Self {
            name: term.name,
            slug: term.slug,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TermListResponse {
    pub data: Vec<TermResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TermListQuery {
    /// Page number (default 1).
    pub page: Option<u64>,
    /// Items per page (default 10, max 100).
    pub per_page: Option<u64>,
    /// Case-insensitive name substring.
    pub search: Option<String>,
}
