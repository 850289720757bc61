use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::*;

/// In-process [`Store`].
///
/// All collections live behind one mutex, so every check-then-write sequence
/// (uniqueness, cascades) is atomic with respect to concurrent requests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    last_id: i32,
    users: BTreeMap<i32, User>,
    categories: BTreeMap<i32, Term>,
    genres: BTreeMap<i32, Term>,
    titles: BTreeMap<i32, TitleRow>,
    reviews: BTreeMap<i32, ReviewRow>,
    comments: BTreeMap<i32, CommentRow>,
}

struct TitleRow {
    id: i32,
    name: String,
    year: i32,
    description: String,
    category_id: Option<i32>,
    genre_ids: Vec<i32>,
}

struct ReviewRow {
    id: i32,
    title_id: i32,
    author_id: i32,
    text: String,
    score: i32,
    pub_date: DateTime<Utc>,
}

struct CommentRow {
    id: i32,
    review_id: i32,
    author_id: i32,
    text: String,
    pub_date: DateTime<Utc>,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn dedup_ids(ids: Vec<i32>) -> Vec<i32> {
    let mut out: Vec<i32> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

impl Inner {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn terms(&self, kind: TermKind) -> &BTreeMap<i32, Term> {
        match kind {
            TermKind::Category => &self.categories,
            TermKind::Genre => &self.genres,
        }
    }

    fn terms_mut(&mut self, kind: TermKind) -> &mut BTreeMap<i32, Term> {
        match kind {
            TermKind::Category => &mut self.categories,
            TermKind::Genre => &mut self.genres,
        }
    }

    fn check_user_unique(&self, username: &str, email: &str, except: Option<i32>) -> StoreResult<()> {
        let others = self.users.values().filter(|u| Some(u.id) != except);
        for other in others {
            if other.username == username {
                return Err(StoreError::Conflict(Constraint::Username));
            }
            if other.email == email {
                return Err(StoreError::Conflict(Constraint::Email));
            }
        }
        Ok(())
    }

    fn check_title_refs(&self, category_id: Option<i32>, genre_ids: &[i32]) -> StoreResult<()> {
        if let Some(id) = category_id
            && !self.categories.contains_key(&id)
        {
            return Err(StoreError::NotFound("Category"));
        }
        if genre_ids.iter().any(|id| !self.genres.contains_key(id)) {
            return Err(StoreError::NotFound("Genre"));
        }
        Ok(())
    }

    fn username(&self, user_id: i32) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn title_details(&self, row: &TitleRow) -> TitleDetails {
        let mut genres: Vec<Term> = row
            .genre_ids
            .iter()
            .filter_map(|id| self.genres.get(id).cloned())
            .collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name));
        let scores: Vec<i32> = self
            .reviews
            .values()
            .filter(|r| r.title_id == row.id)
            .map(|r| r.score)
            .collect();
        TitleDetails {
            id: row.id,
            name: row.name.clone(),
            year: row.year,
            description: row.description.clone(),
            category: row.category_id.and_then(|id| self.categories.get(&id).cloned()),
            genres,
            rating: mean_score(&scores),
        }
    }

    fn review(&self, row: &ReviewRow) -> Review {
        Review {
            id: row.id,
            title_id: row.title_id,
            author_id: row.author_id,
            author: self.username(row.author_id),
            text: row.text.clone(),
            score: row.score,
            pub_date: row.pub_date,
        }
    }

    fn comment(&self, row: &CommentRow) -> Comment {
        Comment {
            id: row.id,
            review_id: row.review_id,
            author_id: row.author_id,
            author: self.username(row.author_id),
            text: row.text.clone(),
            pub_date: row.pub_date,
        }
    }

    /// Remove reviews matching `pred` together with their comments.
    fn remove_reviews(&mut self, pred: impl Fn(&ReviewRow) -> bool) {
        let doomed: Vec<i32> = self
            .reviews
            .values()
            .filter(|&r| pred(r))
            .map(|r| r.id)
            .collect();
        self.comments.retain(|_, c| !doomed.contains(&c.review_id));
        self.reviews.retain(|id, _| !doomed.contains(id));
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, id: i32) -> StoreResult<Option<User>> {
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, search: Option<&str>, page: PageRequest) -> StoreResult<Page<User>> {
        let inner = self.inner.lock().await;
        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|u| search.is_none_or(|s| contains_ignore_case(&u.username, s)))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(Page::slice(users, page))
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let user = user.normalized();
        let mut inner = self.inner.lock().await;
        inner.check_user_unique(&user.username, &user.email, None)?;
        let id = inner.next_id();
        let record = User {
            id,
            username: user.username,
            email: user.email,
            role: user.role,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            confirmation_code: user.confirmation_code,
            password: user.password,
            is_superuser: user.is_superuser,
            created_at: Utc::now(),
        };
        inner.users.insert(id, record.clone());
        Ok(record)
    }

    async fn update_user(&self, user: User) -> StoreResult<User> {
        let user = user.normalized();
        let mut inner = self.inner.lock().await;
        let created_at = inner
            .users
            .get(&user.id)
            .map(|u| u.created_at)
            .ok_or(StoreError::NotFound("User"))?;
        inner.check_user_unique(&user.username, &user.email, Some(user.id))?;
        let record = User { created_at, ..user };
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete_user(&self, id: i32) -> StoreResult<bool> {
        let mut inner = self.inner.lock().await;
        if inner.users.remove(&id).is_none() {
            return Ok(false);
        }
        inner.remove_reviews(|r| r.author_id == id);
        inner.comments.retain(|_, c| c.author_id != id);
        Ok(true)
    }

    async fn list_terms(
        &self,
        kind: TermKind,
        search: Option<&str>,
        page: PageRequest,
    ) -> StoreResult<Page<Term>> {
        let inner = self.inner.lock().await;
        let mut terms: Vec<Term> = inner
            .terms(kind)
            .values()
            .filter(|t| search.is_none_or(|s| contains_ignore_case(&t.name, s)))
            .cloned()
            .collect();
        terms.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(Page::slice(terms, page))
    }

    async fn find_terms(&self, kind: TermKind, slugs: &[String]) -> StoreResult<Vec<Term>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .terms(kind)
            .values()
            .filter(|t| slugs.contains(&t.slug))
            .cloned()
            .collect())
    }

    async fn insert_term(&self, kind: TermKind, term: NewTerm) -> StoreResult<Term> {
        let mut inner = self.inner.lock().await;
        if inner.terms(kind).values().any(|t| t.slug == term.slug) {
            return Err(StoreError::Conflict(Constraint::Slug));
        }
        let id = inner.next_id();
        let record = Term {
            id,
            name: term.name,
            slug: term.slug,
        };
        inner.terms_mut(kind).insert(id, record.clone());
        Ok(record)
    }

    async fn delete_term(&self, kind: TermKind, slug: &str) -> StoreResult<bool> {
        let mut inner = self.inner.lock().await;
        let Some(id) = inner
            .terms(kind)
            .values()
            .find(|t| t.slug == slug)
            .map(|t| t.id)
        else {
            return Ok(false);
        };
        inner.terms_mut(kind).remove(&id);
        for title in inner.titles.values_mut() {
            match kind {
                TermKind::Category => {
                    if title.category_id == Some(id) {
                        title.category_id = None;
                    }
                }
                TermKind::Genre => title.genre_ids.retain(|&g| g != id),
            }
        }
        Ok(true)
    }

    async fn list_titles(
        &self,
        filter: &TitleFilter,
        page: PageRequest,
    ) -> StoreResult<Page<TitleDetails>> {
        let inner = self.inner.lock().await;
        let mut titles: Vec<TitleDetails> = inner
            .titles
            .values()
            .map(|row| inner.title_details(row))
            .filter(|t| {
                filter.category.as_deref().is_none_or(|slug| {
                    t.category.as_ref().is_some_and(|c| c.slug == slug)
                })
            })
            .filter(|t| {
                filter
                    .genre
                    .as_deref()
                    .is_none_or(|slug| t.genres.iter().any(|g| g.slug == slug))
            })
            .filter(|t| {
                filter
                    .name
                    .as_deref()
                    .is_none_or(|name| contains_ignore_case(&t.name, name))
            })
            .filter(|t| filter.year.is_none_or(|year| t.year == year))
            .collect();
        titles.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(Page::slice(titles, page))
    }

    async fn find_title(&self, id: i32) -> StoreResult<Option<TitleDetails>> {
        let inner = self.inner.lock().await;
        Ok(inner.titles.get(&id).map(|row| inner.title_details(row)))
    }

    async fn insert_title(&self, title: NewTitle) -> StoreResult<TitleDetails> {
        let mut inner = self.inner.lock().await;
        let genre_ids = dedup_ids(title.genre_ids);
        inner.check_title_refs(title.category_id, &genre_ids)?;
        let id = inner.next_id();
        let row = TitleRow {
            id,
            name: title.name,
            year: title.year,
            description: title.description,
            category_id: title.category_id,
            genre_ids,
        };
        let details = inner.title_details(&row);
        inner.titles.insert(id, row);
        Ok(details)
    }

    async fn update_title(&self, id: i32, changes: TitleChanges) -> StoreResult<TitleDetails> {
        let mut inner = self.inner.lock().await;
        let current = inner.titles.get(&id).ok_or(StoreError::NotFound("Title"))?;
        let category_id = changes.category_id.unwrap_or(current.category_id);
        let genre_ids = match changes.genre_ids {
            Some(ids) => dedup_ids(ids),
            None => current.genre_ids.clone(),
        };
        inner.check_title_refs(category_id, &genre_ids)?;

        let Some(row) = inner.titles.get_mut(&id) else {
            return Err(StoreError::NotFound("Title"));
        };
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(year) = changes.year {
            row.year = year;
        }
        if let Some(description) = changes.description {
            row.description = description;
        }
        row.category_id = category_id;
        row.genre_ids = genre_ids;

        let row = &inner.titles[&id];
        Ok(inner.title_details(row))
    }

    async fn delete_title(&self, id: i32) -> StoreResult<bool> {
        let mut inner = self.inner.lock().await;
        if inner.titles.remove(&id).is_none() {
            return Ok(false);
        }
        inner.remove_reviews(|r| r.title_id == id);
        Ok(true)
    }

    async fn list_reviews(&self, title_id: i32, page: PageRequest) -> StoreResult<Page<Review>> {
        let inner = self.inner.lock().await;
        let reviews: Vec<Review> = inner
            .reviews
            .values()
            .filter(|r| r.title_id == title_id)
            .map(|r| inner.review(r))
            .collect();
        Ok(Page::slice(reviews, page))
    }

    async fn find_review(&self, title_id: i32, review_id: i32) -> StoreResult<Option<Review>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .reviews
            .get(&review_id)
            .filter(|r| r.title_id == title_id)
            .map(|r| inner.review(r)))
    }

    async fn review_exists(&self, author_id: i32, title_id: i32) -> StoreResult<bool> {
        let inner = self.inner.lock().await;
        Ok(inner
            .reviews
            .values()
            .any(|r| r.author_id == author_id && r.title_id == title_id))
    }

    async fn insert_review(&self, review: NewReview) -> StoreResult<Review> {
        let mut inner = self.inner.lock().await;
        if !inner.titles.contains_key(&review.title_id) {
            return Err(StoreError::NotFound("Title"));
        }
        if !inner.users.contains_key(&review.author_id) {
            return Err(StoreError::NotFound("User"));
        }
        if inner
            .reviews
            .values()
            .any(|r| r.author_id == review.author_id && r.title_id == review.title_id)
        {
            return Err(StoreError::Conflict(Constraint::AuthorTitle));
        }
        let id = inner.next_id();
        let row = ReviewRow {
            id,
            title_id: review.title_id,
            author_id: review.author_id,
            text: review.text,
            score: review.score,
            pub_date: Utc::now(),
        };
        let record = inner.review(&row);
        inner.reviews.insert(id, row);
        Ok(record)
    }

    async fn update_review(&self, id: i32, changes: ReviewChanges) -> StoreResult<Review> {
        let mut inner = self.inner.lock().await;
        let row = inner
            .reviews
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Review"))?;
        if let Some(text) = changes.text {
            row.text = text;
        }
        if let Some(score) = changes.score {
            row.score = score;
        }
        let row = &inner.reviews[&id];
        Ok(inner.review(row))
    }

    async fn delete_review(&self, id: i32) -> StoreResult<bool> {
        let mut inner = self.inner.lock().await;
        if !inner.reviews.contains_key(&id) {
            return Ok(false);
        }
        inner.remove_reviews(|r| r.id == id);
        Ok(true)
    }

    async fn list_comments(
        &self,
        review_id: i32,
        page: PageRequest,
    ) -> StoreResult<Page<Comment>> {
        let inner = self.inner.lock().await;
        let comments: Vec<Comment> = inner
            .comments
            .values()
            .filter(|c| c.review_id == review_id)
            .map(|c| inner.comment(c))
            .collect();
        Ok(Page::slice(comments, page))
    }

    async fn find_comment(&self, review_id: i32, comment_id: i32) -> StoreResult<Option<Comment>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .comments
            .get(&comment_id)
            .filter(|c| c.review_id == review_id)
            .map(|c| inner.comment(c)))
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let mut inner = self.inner.lock().await;
        if !inner.reviews.contains_key(&comment.review_id) {
            return Err(StoreError::NotFound("Review"));
        }
        if !inner.users.contains_key(&comment.author_id) {
            return Err(StoreError::NotFound("User"));
        }
        let id = inner.next_id();
        let row = CommentRow {
            id,
            review_id: comment.review_id,
            author_id: comment.author_id,
            text: comment.text,
            pub_date: Utc::now(),
        };
        let record = inner.comment(&row);
        inner.comments.insert(id, row);
        Ok(record)
    }

    async fn update_comment(&self, id: i32, text: String) -> StoreResult<Comment> {
        let mut inner = self.inner.lock().await;
        let row = inner
            .comments
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Comment"))?;
        row.text = text;
        let row = &inner.comments[&id];
        Ok(inner.comment(row))
    }

    async fn delete_comment(&self, id: i32) -> StoreResult<bool> {
        Ok(self.inner.lock().await.comments.remove(&id).is_some())
    }
}
