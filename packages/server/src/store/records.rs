use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Password value for accounts that can only authenticate with a confirmation code.
pub const UNUSABLE_PASSWORD: &str = "!";

/// Role of a user. Trust grows from `User` to `Admin`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(format!("\"{other}\" is not a valid role")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub confirmation_code: String,
    /// Argon2 PHC string, or [`UNUSABLE_PASSWORD`].
    pub password: String,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Superusers are always persisted with the admin role.
    pub fn normalized(mut self) -> Self {
        if self.is_superuser {
            self.role = Role::Admin;
        }
        self
    }
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub confirmation_code: String,
    pub password: String,
    pub is_superuser: bool,
}

impl NewUser {
    /// A plain user as created by signup: default role, no usable password.
    pub fn signup(username: String, email: String, confirmation_code: String) -> Self {
        Self {
            username,
            email,
            role: Role::User,
            first_name: String::new(),
            last_name: String::new(),
            bio: String::new(),
            confirmation_code,
            password: UNUSABLE_PASSWORD.to_string(),
            is_superuser: false,
        }
    }

    pub fn normalized(mut self) -> Self {
        if self.is_superuser {
            self.role = Role::Admin;
        }
        self
    }
}

/// The two admin-managed classifications of titles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TermKind {
    Category,
    Genre,
}

impl TermKind {
    pub fn label(&self) -> &'static str {
        match self {
            TermKind::Category => "Category",
            TermKind::Genre => "Genre",
        }
    }
}

/// A category or a genre.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Term {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Clone, Debug)]
pub struct NewTerm {
    pub name: String,
    pub slug: String,
}

/// A title together with its resolved category, genres and rating.
#[derive(Clone, Debug, PartialEq)]
pub struct TitleDetails {
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category: Option<Term>,
    pub genres: Vec<Term>,
    /// Mean review score, `0.0` when the title has no reviews.
    pub rating: f64,
}

#[derive(Clone, Debug)]
pub struct NewTitle {
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category_id: Option<i32>,
    pub genre_ids: Vec<i32>,
}

/// Partial update of a title; `None` leaves a field untouched.
#[derive(Clone, Debug, Default)]
pub struct TitleChanges {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category_id: Option<Option<i32>>,
    pub genre_ids: Option<Vec<i32>>,
}

/// Title list filters. Slug filters match exactly, `name` is a case-insensitive substring.
#[derive(Clone, Debug, Default)]
pub struct TitleFilter {
    pub category: Option<String>,
    pub genre: Option<String>,
    pub name: Option<String>,
    pub year: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Review {
    pub id: i32,
    pub title_id: i32,
    pub author_id: i32,
    /// Username of the author.
    pub author: String,
    pub text: String,
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewReview {
    pub title_id: i32,
    pub author_id: i32,
    pub text: String,
    pub score: i32,
}

#[derive(Clone, Debug, Default)]
pub struct ReviewChanges {
    pub text: Option<String>,
    pub score: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    pub id: i32,
    pub review_id: i32,
    pub author_id: i32,
    /// Username of the author.
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewComment {
    pub review_id: i32,
    pub author_id: i32,
    pub text: String,
}

/// 1-based page selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

/// One page of results plus the total number of matches.
#[derive(Clone, Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    /// Cut a page out of an already filtered and ordered list.
    pub fn slice(all: Vec<T>, page: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .collect();
        Self { items, total }
    }
}

/// Arithmetic mean of review scores; an unreviewed title rates `0.0`.
pub fn mean_score(scores: &[i32]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64
}
