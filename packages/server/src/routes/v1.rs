use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::auth::*;
use crate::handlers::comment::*;
use crate::handlers::review::*;
use crate::handlers::taxonomy::*;
use crate::handlers::title::*;
use crate::handlers::user::*;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(taxonomy_routes())
        .merge(title_routes())
        .merge(review_routes())
        .merge(comment_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(signup))
        .routes(routes!(obtain_token))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_users, create_user))
        .routes(routes!(get_me, update_me))
        .routes(routes!(get_user, update_user, delete_user))
}

fn taxonomy_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_categories, create_category))
        .routes(routes!(delete_category))
        .routes(routes!(list_genres, create_genre))
        .routes(routes!(delete_genre))
}

fn title_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_titles, create_title))
        .routes(routes!(get_title, update_title, delete_title))
}

fn review_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_reviews, create_review))
        .routes(routes!(get_review, update_review, delete_review))
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_comments, create_comment))
        .routes(routes!(get_comment, update_comment, delete_comment))
}
