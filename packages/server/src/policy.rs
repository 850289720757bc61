//! Permission predicates.
//!
//! Each check is a pure function of the caller, the HTTP method and, for
//! object checks, the owner of the loaded object. Handlers run the collection
//! check before loading anything and the object check after, then turn a
//! `false` into an error with [`enforce`].

use axum::http::Method;

use crate::error::AppError;
use crate::extractors::auth::AuthUser;

fn is_staff(user: &AuthUser) -> bool {
    user.is_admin() || user.is_moderator()
}

/// Public reads; writes need an admin. Categories, genres and titles.
pub fn admin_or_read_only(principal: Option<&AuthUser>, method: &Method) -> bool {
    method.is_safe() || principal.is_some_and(AuthUser::is_admin)
}

/// The user roster, for every method.
pub fn admin_only(principal: Option<&AuthUser>) -> bool {
    principal.is_some_and(AuthUser::is_admin)
}

/// Public reads; writes need any signed-in user. Reviews and comments.
pub fn authenticated_or_read_only(principal: Option<&AuthUser>, method: &Method) -> bool {
    method.is_safe() || principal.is_some()
}

/// Object check for categories and genres. `owner` is `None` for objects
/// nobody owns.
pub fn staff_or_owner(principal: Option<&AuthUser>, owner: Option<i32>) -> bool {
    principal.is_some_and(|p| is_staff(p) || owner == Some(p.user_id))
}

/// Object check for reviews and comments.
pub fn author_or_staff(principal: Option<&AuthUser>, method: &Method, author_id: i32) -> bool {
    method.is_safe() || principal.is_some_and(|p| is_staff(p) || p.user_id == author_id)
}

/// Object check for titles.
pub fn title_object(principal: Option<&AuthUser>, method: &Method) -> bool {
    method.is_safe() || principal.is_some_and(is_staff)
}

/// Map a failed check to 401 for anonymous callers and 403 otherwise.
pub fn enforce(principal: Option<&AuthUser>, allowed: bool) -> Result<(), AppError> {
    match (allowed, principal) {
        (true, _) => Ok(()),
        (false, None) => Err(AppError::TokenMissing),
        (false, Some(_)) => Err(AppError::PermissionDenied),
    }
}
