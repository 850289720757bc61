use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, IntoColumnRef, LikeExpr};
use sea_orm::*;

use super::{
    Comment, Constraint, NewComment, NewReview, NewTerm, NewTitle, NewUser, Page, PageRequest,
    Review, ReviewChanges, Store, StoreError, StoreResult, Term, TermKind, TitleChanges,
    TitleDetails, TitleFilter, User,
};
use crate::entity::{category, comment, genre, review, title, title_genre, user};

/// [`Store`] backed by a SeaORM connection (PostgreSQL in production).
///
/// Uniqueness is left to the database's unique indexes; cascades run inside a
/// transaction so readers never observe a half-deleted subtree.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Escape SQL LIKE wildcards so user input is matched literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Case-insensitive substring match on `col`.
fn contains_ci(col: impl IntoColumnRef, term: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    Condition::all().add(
        Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(pattern).escape('\\')),
    )
}

fn is_unique_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => Some(msg),
        _ => None,
    }
}

fn user_write_error(err: DbErr) -> StoreError {
    match is_unique_violation(&err) {
        Some(msg) if msg.contains("email") => StoreError::Conflict(Constraint::Email),
        Some(_) => StoreError::Conflict(Constraint::Username),
        None => err.into(),
    }
}

fn unique_or(constraint: Constraint) -> impl FnOnce(DbErr) -> StoreError {
    move |err| match is_unique_violation(&err) {
        Some(_) => StoreError::Conflict(constraint),
        None => err.into(),
    }
}

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        let role = m.role.parse().unwrap_or_else(|e: String| {
            tracing::warn!(user_id = m.id, error = %e, "Stored role is unknown, treating as user");
            Default::default()
        });
        User {
            id: m.id,
            username: m.username,
            email: m.email,
            role,
            first_name: m.first_name,
            last_name: m.last_name,
            bio: m.bio,
            confirmation_code: m.confirmation_code,
            password: m.password,
            is_superuser: m.is_superuser,
            created_at: m.created_at,
        }
    }
}

impl From<category::Model> for Term {
    fn from(m: category::Model) -> Self {
        Term {
            id: m.id,
            name: m.name,
            slug: m.slug,
        }
    }
}

impl From<genre::Model> for Term {
    fn from(m: genre::Model) -> Self {
        Term {
            id: m.id,
            name: m.name,
            slug: m.slug,
        }
    }
}

async fn usernames<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, String>, DbErr> {
    let mut ids: Vec<i32> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i32, String)> = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::Username)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

fn to_review(m: review::Model, names: &HashMap<i32, String>) -> Review {
    Review {
        id: m.id,
        title_id: m.title_id,
        author_id: m.author_id,
        author: names.get(&m.author_id).cloned().unwrap_or_default(),
        text: m.text,
        score: m.score,
        pub_date: m.pub_date,
    }
}

fn to_comment(m: comment::Model, names: &HashMap<i32, String>) -> Comment {
    Comment {
        id: m.id,
        review_id: m.review_id,
        author_id: m.author_id,
        author: names.get(&m.author_id).cloned().unwrap_or_default(),
        text: m.text,
        pub_date: m.pub_date,
    }
}

/// Resolve category, genres and rating for each title, keeping input order.
async fn load_titles<C: ConnectionTrait>(
    db: &C,
    models: Vec<title::Model>,
) -> Result<Vec<TitleDetails>, DbErr> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let title_ids: Vec<i32> = models.iter().map(|t| t.id).collect();

    let category_ids: Vec<i32> = models.iter().filter_map(|t| t.category_id).collect();
    let categories: HashMap<i32, Term> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, Term::from(c)))
            .collect()
    };

    let links = title_genre::Entity::find()
        .filter(title_genre::Column::TitleId.is_in(title_ids.clone()))
        .all(db)
        .await?;
    let genre_ids: Vec<i32> = links.iter().map(|l| l.genre_id).collect();
    let genres: Vec<genre::Model> = if genre_ids.is_empty() {
        Vec::new()
    } else {
        genre::Entity::find()
            .filter(genre::Column::Id.is_in(genre_ids))
            .order_by_asc(genre::Column::Name)
            .order_by_asc(genre::Column::Id)
            .all(db)
            .await?
    };

    // AVG over an integer column is NUMERIC in Postgres; cast so it decodes as f64.
    let ratings: HashMap<i32, f64> = review::Entity::find()
        .filter(review::Column::TitleId.is_in(title_ids))
        .select_only()
        .column(review::Column::TitleId)
        .column_as(
            Expr::expr(Func::cast_as(
                Func::avg(Expr::col(review::Column::Score)),
                "float8",
            )),
            "rating",
        )
        .group_by(review::Column::TitleId)
        .into_tuple::<(i32, f64)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(models
        .into_iter()
        .map(|t| {
            let title_genres = genres
                .iter()
                .filter(|g| links.iter().any(|l| l.title_id == t.id && l.genre_id == g.id))
                .cloned()
                .map(Term::from)
                .collect();
            let rating = ratings.get(&t.id).copied().unwrap_or(0.0);
            TitleDetails {
                id: t.id,
                name: t.name,
                year: t.year,
                description: t.description,
                category: t.category_id.and_then(|id| categories.get(&id).cloned()),
                genres: title_genres,
                rating,
            }
        })
        .collect())
}

async fn link_genres<C: ConnectionTrait>(
    db: &C,
    title_id: i32,
    genre_ids: &[i32],
) -> Result<(), DbErr> {
    let mut ids = genre_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(());
    }
    let rows = ids.into_iter().map(|genre_id| title_genre::ActiveModel {
        title_id: Set(title_id),
        genre_id: Set(genre_id),
    });
    title_genre::Entity::insert_many(rows).exec(db).await?;
    Ok(())
}

/// Fail with `NotFound` if the category or any genre does not exist.
async fn check_title_refs<C: ConnectionTrait>(
    db: &C,
    category_id: Option<i32>,
    genre_ids: &[i32],
) -> StoreResult<()> {
    if let Some(id) = category_id
        && category::Entity::find_by_id(id).one(db).await?.is_none()
    {
        return Err(StoreError::NotFound("Category"));
    }
    let mut ids = genre_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(());
    }
    let found = genre::Entity::find()
        .filter(genre::Column::Id.is_in(ids.clone()))
        .count(db)
        .await?;
    if found != ids.len() as u64 {
        return Err(StoreError::NotFound("Genre"));
    }
    Ok(())
}

/// Delete the reviews matching `condition` together with their comments.
async fn delete_reviews_where<C: ConnectionTrait>(
    db: &C,
    condition: Condition,
) -> Result<u64, DbErr> {
    let review_ids: Vec<i32> = review::Entity::find()
        .filter(condition)
        .select_only()
        .column(review::Column::Id)
        .into_tuple()
        .all(db)
        .await?;
    if review_ids.is_empty() {
        return Ok(0);
    }
    comment::Entity::delete_many()
        .filter(comment::Column::ReviewId.is_in(review_ids.clone()))
        .exec(db)
        .await?;
    let result = review::Entity::delete_many()
        .filter(review::Column::Id.is_in(review_ids))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

#[async_trait]
impl Store for SeaOrmStore {
    async fn find_user(&self, id: i32) -> StoreResult<Option<User>> {
        Ok(user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(User::from))
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .map(User::from))
    }

    async fn list_users(&self, search: Option<&str>, page: PageRequest) -> StoreResult<Page<User>> {
        let mut select = user::Entity::find();
        if let Some(term) = search {
            select = select.filter(contains_ci(user::Column::Username, term));
        }
        let total = select.clone().count(&self.db).await?;
        let items = select
            .order_by_asc(user::Column::Username)
            .offset(Some(page.offset()))
            .limit(Some(page.per_page))
            .all(&self.db)
            .await?
            .into_iter()
            .map(User::from)
            .collect();
        Ok(Page { items, total })
    }

    async fn insert_user(&self, new_user: NewUser) -> StoreResult<User> {
        let new_user = new_user.normalized();
        let model = user::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            role: Set(new_user.role.as_str().to_string()),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            bio: Set(new_user.bio),
            confirmation_code: Set(new_user.confirmation_code),
            password: Set(new_user.password),
            is_superuser: Set(new_user.is_superuser),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(user_write_error)?;
        Ok(model.into())
    }

    async fn update_user(&self, changed: User) -> StoreResult<User> {
        let changed = changed.normalized();
        let model = user::ActiveModel {
            id: Unchanged(changed.id),
            username: Set(changed.username),
            email: Set(changed.email),
            role: Set(changed.role.as_str().to_string()),
            first_name: Set(changed.first_name),
            last_name: Set(changed.last_name),
            bio: Set(changed.bio),
            confirmation_code: Set(changed.confirmation_code),
            password: Set(changed.password),
            is_superuser: Set(changed.is_superuser),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| match e {
            DbErr::RecordNotUpdated => StoreError::NotFound("User"),
            other => user_write_error(other),
        })?;
        Ok(model.into())
    }

    async fn delete_user(&self, id: i32) -> StoreResult<bool> {
        let txn = self.db.begin().await?;
        delete_reviews_where(&txn, Condition::all().add(review::Column::AuthorId.eq(id))).await?;
        comment::Entity::delete_many()
            .filter(comment::Column::AuthorId.eq(id))
            .exec(&txn)
            .await?;
        let result = user::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_terms(
        &self,
        kind: TermKind,
        search: Option<&str>,
        page: PageRequest,
    ) -> StoreResult<Page<Term>> {
        match kind {
            TermKind::Category => {
                let mut select = category::Entity::find();
                if let Some(term) = search {
                    select = select.filter(contains_ci(category::Column::Name, term));
                }
                let total = select.clone().count(&self.db).await?;
                let items = select
                    .order_by_asc(category::Column::Name)
                    .order_by_asc(category::Column::Id)
                    .offset(Some(page.offset()))
                    .limit(Some(page.per_page))
                    .all(&self.db)
                    .await?
                    .into_iter()
                    .map(Term::from)
                    .collect();
                Ok(Page { items, total })
            }
            TermKind::Genre => {
                let mut select = genre::Entity::find();
                if let Some(term) = search {
                    select = select.filter(contains_ci(genre::Column::Name, term));
                }
                let total = select.clone().count(&self.db).await?;
                let items = select
                    .order_by_asc(genre::Column::Name)
                    .order_by_asc(genre::Column::Id)
                    .offset(Some(page.offset()))
                    .limit(Some(page.per_page))
                    .all(&self.db)
                    .await?
                    .into_iter()
                    .map(Term::from)
                    .collect();
                Ok(Page { items, total })
            }
        }
    }

    async fn find_terms(&self, kind: TermKind, slugs: &[String]) -> StoreResult<Vec<Term>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }
        let terms = match kind {
            TermKind::Category => category::Entity::find()
                .filter(category::Column::Slug.is_in(slugs.iter().cloned()))
                .all(&self.db)
                .await?
                .into_iter()
                .map(Term::from)
                .collect(),
            TermKind::Genre => genre::Entity::find()
                .filter(genre::Column::Slug.is_in(slugs.iter().cloned()))
                .all(&self.db)
                .await?
                .into_iter()
                .map(Term::from)
                .collect(),
        };
        Ok(terms)
    }

    async fn insert_term(&self, kind: TermKind, term: NewTerm) -> StoreResult<Term> {
        let inserted = match kind {
            TermKind::Category => category::ActiveModel {
                name: Set(term.name),
                slug: Set(term.slug),
                ..Default::default()
            }
            .insert(&self.db)
            .await
            .map_err(unique_or(Constraint::Slug))?
            .into(),
            TermKind::Genre => genre::ActiveModel {
                name: Set(term.name),
                slug: Set(term.slug),
                ..Default::default()
            }
            .insert(&self.db)
            .await
            .map_err(unique_or(Constraint::Slug))?
            .into(),
        };
        Ok(inserted)
    }

    async fn delete_term(&self, kind: TermKind, slug: &str) -> StoreResult<bool> {
        let txn = self.db.begin().await?;
        match kind {
            TermKind::Category => {
                let Some(found) = category::Entity::find()
                    .filter(category::Column::Slug.eq(slug))
                    .one(&txn)
                    .await?
                else {
                    return Ok(false);
                };
                title::Entity::update_many()
                    .col_expr(title::Column::CategoryId, Expr::value(Option::<i32>::None))
                    .filter(title::Column::CategoryId.eq(found.id))
                    .exec(&txn)
                    .await?;
                category::Entity::delete_by_id(found.id).exec(&txn).await?;
            }
            TermKind::Genre => {
                let Some(found) = genre::Entity::find()
                    .filter(genre::Column::Slug.eq(slug))
                    .one(&txn)
                    .await?
                else {
                    return Ok(false);
                };
                title_genre::Entity::delete_many()
                    .filter(title_genre::Column::GenreId.eq(found.id))
                    .exec(&txn)
                    .await?;
                genre::Entity::delete_by_id(found.id).exec(&txn).await?;
            }
        }
        txn.commit().await?;
        Ok(true)
    }

    async fn list_titles(
        &self,
        filter: &TitleFilter,
        page: PageRequest,
    ) -> StoreResult<Page<TitleDetails>> {
        let empty = Page {
            items: Vec::new(),
            total: 0,
        };
        let mut select = title::Entity::find();

        if let Some(slug) = &filter.category {
            let Some(found) = category::Entity::find()
                .filter(category::Column::Slug.eq(slug.as_str()))
                .one(&self.db)
                .await?
            else {
                return Ok(empty);
            };
            select = select.filter(title::Column::CategoryId.eq(found.id));
        }
        if let Some(slug) = &filter.genre {
            let Some(found) = genre::Entity::find()
                .filter(genre::Column::Slug.eq(slug.as_str()))
                .one(&self.db)
                .await?
            else {
                return Ok(empty);
            };
            let title_ids: Vec<i32> = title_genre::Entity::find()
                .filter(title_genre::Column::GenreId.eq(found.id))
                .select_only()
                .column(title_genre::Column::TitleId)
                .into_tuple()
                .all(&self.db)
                .await?;
            if title_ids.is_empty() {
                return Ok(empty);
            }
            select = select.filter(title::Column::Id.is_in(title_ids));
        }
        if let Some(name) = &filter.name {
            select = select.filter(contains_ci(title::Column::Name, name));
        }
        if let Some(year) = filter.year {
            select = select.filter(title::Column::Year.eq(year));
        }

        let total = select.clone().count(&self.db).await?;
        let models = select
            .order_by_asc(title::Column::Name)
            .order_by_asc(title::Column::Id)
            .offset(Some(page.offset()))
            .limit(Some(page.per_page))
            .all(&self.db)
            .await?;
        let items = load_titles(&self.db, models).await?;
        Ok(Page { items, total })
    }

    async fn find_title(&self, id: i32) -> StoreResult<Option<TitleDetails>> {
        let Some(model) = title::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        Ok(load_titles(&self.db, vec![model]).await?.pop())
    }

    async fn insert_title(&self, new_title: NewTitle) -> StoreResult<TitleDetails> {
        let txn = self.db.begin().await?;
        check_title_refs(&txn, new_title.category_id, &new_title.genre_ids).await?;
        let model = title::ActiveModel {
            name: Set(new_title.name),
            year: Set(new_title.year),
            description: Set(new_title.description),
            category_id: Set(new_title.category_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        link_genres(&txn, model.id, &new_title.genre_ids).await?;
        let details = load_titles(&txn, vec![model]).await?.pop();
        txn.commit().await?;
        details.ok_or(StoreError::NotFound("Title"))
    }

    async fn update_title(&self, id: i32, changes: TitleChanges) -> StoreResult<TitleDetails> {
        let txn = self.db.begin().await?;
        let existing = title::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(StoreError::NotFound("Title"))?;
        check_title_refs(
            &txn,
            changes.category_id.flatten(),
            changes.genre_ids.as_deref().unwrap_or_default(),
        )
        .await?;

        let mut active: title::ActiveModel = existing.clone().into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(year) = changes.year {
            active.year = Set(year);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(category_id) = changes.category_id {
            active.category_id = Set(category_id);
        }
        let model = if active.is_changed() {
            active.update(&txn).await?
        } else {
            existing
        };

        if let Some(genre_ids) = changes.genre_ids {
            title_genre::Entity::delete_many()
                .filter(title_genre::Column::TitleId.eq(id))
                .exec(&txn)
                .await?;
            link_genres(&txn, id, &genre_ids).await?;
        }

        let details = load_titles(&txn, vec![model]).await?.pop();
        txn.commit().await?;
        details.ok_or(StoreError::NotFound("Title"))
    }

    async fn delete_title(&self, id: i32) -> StoreResult<bool> {
        let txn = self.db.begin().await?;
        delete_reviews_where(&txn, Condition::all().add(review::Column::TitleId.eq(id))).await?;
        title_genre::Entity::delete_many()
            .filter(title_genre::Column::TitleId.eq(id))
            .exec(&txn)
            .await?;
        let result = title::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_reviews(&self, title_id: i32, page: PageRequest) -> StoreResult<Page<Review>> {
        let select = review::Entity::find().filter(review::Column::TitleId.eq(title_id));
        let total = select.clone().count(&self.db).await?;
        let models = select
            .order_by_asc(review::Column::Id)
            .offset(Some(page.offset()))
            .limit(Some(page.per_page))
            .all(&self.db)
            .await?;
        let names = usernames(&self.db, models.iter().map(|r| r.author_id)).await?;
        let items = models.into_iter().map(|m| to_review(m, &names)).collect();
        Ok(Page { items, total })
    }

    async fn find_review(&self, title_id: i32, review_id: i32) -> StoreResult<Option<Review>> {
        let Some(model) = review::Entity::find_by_id(review_id)
            .filter(review::Column::TitleId.eq(title_id))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        let names = usernames(&self.db, [model.author_id]).await?;
        Ok(Some(to_review(model, &names)))
    }

    async fn review_exists(&self, author_id: i32, title_id: i32) -> StoreResult<bool> {
        let count = review::Entity::find()
            .filter(review::Column::AuthorId.eq(author_id))
            .filter(review::Column::TitleId.eq(title_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn insert_review(&self, new_review: NewReview) -> StoreResult<Review> {
        if title::Entity::find_by_id(new_review.title_id)
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(StoreError::NotFound("Title"));
        }
        let model = review::ActiveModel {
            title_id: Set(new_review.title_id),
            author_id: Set(new_review.author_id),
            text: Set(new_review.text),
            score: Set(new_review.score),
            pub_date: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(unique_or(Constraint::AuthorTitle))?;
        let names = usernames(&self.db, [model.author_id]).await?;
        Ok(to_review(model, &names))
    }

    async fn update_review(&self, id: i32, changes: ReviewChanges) -> StoreResult<Review> {
        let existing = review::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound("Review"))?;
        let mut active: review::ActiveModel = existing.clone().into();
        if let Some(text) = changes.text {
            active.text = Set(text);
        }
        if let Some(score) = changes.score {
            active.score = Set(score);
        }
        let model = if active.is_changed() {
            active.update(&self.db).await?
        } else {
            existing
        };
        let names = usernames(&self.db, [model.author_id]).await?;
        Ok(to_review(model, &names))
    }

    async fn delete_review(&self, id: i32) -> StoreResult<bool> {
        let txn = self.db.begin().await?;
        let deleted =
            delete_reviews_where(&txn, Condition::all().add(review::Column::Id.eq(id))).await?;
        txn.commit().await?;
        Ok(deleted > 0)
    }

    async fn list_comments(
        &self,
        review_id: i32,
        page: PageRequest,
    ) -> StoreResult<Page<Comment>> {
        let select = comment::Entity::find().filter(comment::Column::ReviewId.eq(review_id));
        let total = select.clone().count(&self.db).await?;
        let models = select
            .order_by_asc(comment::Column::Id)
            .offset(Some(page.offset()))
            .limit(Some(page.per_page))
            .all(&self.db)
            .await?;
        let names = usernames(&self.db, models.iter().map(|c| c.author_id)).await?;
        let items = models.into_iter().map(|m| to_comment(m, &names)).collect();
        Ok(Page { items, total })
    }

    async fn find_comment(&self, review_id: i32, comment_id: i32) -> StoreResult<Option<Comment>> {
        let Some(model) = comment::Entity::find_by_id(comment_id)
            .filter(comment::Column::ReviewId.eq(review_id))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        let names = usernames(&self.db, [model.author_id]).await?;
        Ok(Some(to_comment(model, &names)))
    }

    async fn insert_comment(&self, new_comment: NewComment) -> StoreResult<Comment> {
        if review::Entity::find_by_id(new_comment.review_id)
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(StoreError::NotFound("Review"));
        }
        let model = comment::ActiveModel {
            review_id: Set(new_comment.review_id),
            author_id: Set(new_comment.author_id),
            text: Set(new_comment.text),
            pub_date: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        let names = usernames(&self.db, [model.author_id]).await?;
        Ok(to_comment(model, &names))
    }

    async fn update_comment(&self, id: i32, text: String) -> StoreResult<Comment> {
        let existing = comment::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound("Comment"))?;
        let mut active: comment::ActiveModel = existing.into();
        active.text = Set(text);
        let model = active.update(&self.db).await?;
        let names = usernames(&self.db, [model.author_id]).await?;
        Ok(to_comment(model, &names))
    }

    async fn delete_comment(&self, id: i32) -> StoreResult<bool> {
        let result = comment::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
