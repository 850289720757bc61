mod records;

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

pub use records::*;

/// Uniqueness rules the store enforces on insert and update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constraint {
    Username,
    Email,
    Slug,
    /// At most one review per (author, title).
    AuthorTitle,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Constraint::Username => "user.username",
            Constraint::Email => "user.email",
            Constraint::Slug => "slug",
            Constraint::AuthorTitle => "review.author_title",
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    Conflict(Constraint),
    /// The record addressed by an update does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent record collections.
///
/// Implementations must enforce every [`Constraint`] atomically with the write
/// that could violate it, apply [`User::normalized`] on every user write, and
/// perform deletes with these cascades:
///
/// * user: their reviews (with those reviews' comments) and their comments
/// * category: titles keep existing with `category = None`
/// * genre: removed from every title's genre set
/// * title: its reviews and their comments
/// * review: its comments
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, id: i32) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Users ordered by username, optionally filtered by a username substring.
    async fn list_users(&self, search: Option<&str>, page: PageRequest) -> StoreResult<Page<User>>;
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    /// Persist every field of `user` except `id` and `created_at`.
    async fn update_user(&self, user: User) -> StoreResult<User>;
    async fn delete_user(&self, id: i32) -> StoreResult<bool>;

    /// Terms ordered by name, optionally filtered by a name substring.
    async fn list_terms(
        &self,
        kind: TermKind,
        search: Option<&str>,
        page: PageRequest,
    ) -> StoreResult<Page<Term>>;
    /// The terms among `slugs` that exist; unknown slugs are skipped.
    async fn find_terms(&self, kind: TermKind, slugs: &[String]) -> StoreResult<Vec<Term>>;
    async fn insert_term(&self, kind: TermKind, term: NewTerm) -> StoreResult<Term>;
    async fn delete_term(&self, kind: TermKind, slug: &str) -> StoreResult<bool>;

    /// Titles ordered by name.
    async fn list_titles(
        &self,
        filter: &TitleFilter,
        page: PageRequest,
    ) -> StoreResult<Page<TitleDetails>>;
    async fn find_title(&self, id: i32) -> StoreResult<Option<TitleDetails>>;
    async fn insert_title(&self, title: NewTitle) -> StoreResult<TitleDetails>;
    async fn update_title(&self, id: i32, changes: TitleChanges) -> StoreResult<TitleDetails>;
    async fn delete_title(&self, id: i32) -> StoreResult<bool>;

    /// Reviews of a title, oldest first.
    async fn list_reviews(&self, title_id: i32, page: PageRequest) -> StoreResult<Page<Review>>;
    async fn find_review(&self, title_id: i32, review_id: i32) -> StoreResult<Option<Review>>;
    async fn review_exists(&self, author_id: i32, title_id: i32) -> StoreResult<bool>;
    /// Fails with `Conflict(AuthorTitle)` if the author already reviewed the title.
    async fn insert_review(&self, review: NewReview) -> StoreResult<Review>;
    async fn update_review(&self, id: i32, changes: ReviewChanges) -> StoreResult<Review>;
    async fn delete_review(&self, id: i32) -> StoreResult<bool>;

    /// Comments of a review, oldest first.
    async fn list_comments(&self, review_id: i32, page: PageRequest)
    -> StoreResult<Page<Comment>>;
    async fn find_comment(&self, review_id: i32, comment_id: i32) -> StoreResult<Option<Comment>>;
    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment>;
    async fn update_comment(&self, id: i32, text: String) -> StoreResult<Comment>;
    async fn delete_comment(&self, id: i32) -> StoreResult<bool>;
}
