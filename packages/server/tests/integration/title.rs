use serde_json::json;
use server::store::Role;

use crate::common::{TestApp, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn returns_slugs_for_references() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.create_category(&admin, "book").await;
        app.create_genre(&admin, "sci-fi").await;

        let res = app
            .post_with_token(
                routes::TITLES,
                &json!({
                    "name": "Solaris",
                    "year": 1961,
                    "description": "Ocean planet.",
                    "category": "book",
                    "genre": ["sci-fi"],
                }),
                &admin,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "Solaris");
        assert_eq!(res.body["year"], 1961);
        assert_eq!(res.body["category"], "book");
        assert_eq!(res.body["genre"], json!(["sci-fi"]));
        assert!(res.body.get("rating").is_none());
    }

    #[tokio::test]
    async fn unknown_category_slug_is_field_error() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.create_genre(&admin, "sci-fi").await;

        let res = app
            .post_with_token(
                routes::TITLES,
                &json!({"name": "X", "year": 2000, "category": "nope", "genre": ["sci-fi"]}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(
            res.body["fields"]["category"][0],
            "Object with slug=nope does not exist."
        );
    }

    #[tokio::test]
    async fn unknown_genre_slug_is_field_error() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.create_category(&admin, "book").await;

        let res = app
            .post_with_token(
                routes::TITLES,
                &json!({"name": "X", "year": 2000, "category": "book", "genre": ["nope"]}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["genre"].is_array());
    }

    #[tokio::test]
    async fn empty_genre_list_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.create_category(&admin, "book").await;

        let res = app
            .post_with_token(
                routes::TITLES,
                &json!({"name": "X", "year": 2000, "category": "book", "genre": []}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["genre"].is_array());
    }

    #[tokio::test]
    async fn future_year_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.create_category(&admin, "book").await;
        app.create_genre(&admin, "sci-fi").await;

        let res = app
            .post_with_token(
                routes::TITLES,
                &json!({"name": "X", "year": 9999, "category": "book", "genre": ["sci-fi"]}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["year"].is_array());
    }

    #[tokio::test]
    async fn missing_category_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.create_genre(&admin, "sci-fi").await;

        let res = app
            .post_with_token(
                routes::TITLES,
                &json!({"name": "X", "year": 2000, "genre": ["sci-fi"]}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["category"].is_array());
    }

    #[tokio::test]
    async fn moderator_is_forbidden() {
        let app = TestApp::spawn().await;
        let moderator = app.create_user_with_role("mod", Role::Moderator).await;

        let res = app
            .post_with_token(
                routes::TITLES,
                &json!({"name": "X", "year": 2000, "category": "book", "genre": ["sci-fi"]}),
                &moderator,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn anonymous_is_token_missing() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::TITLES,
                &json!({"name": "X", "year": 2000, "category": "book", "genre": ["sci-fi"]}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn title_without_reviews_has_zero_rating() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;

        let res = app.get_without_token(&routes::title(title_id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["rating"], 0.0);
        assert_eq!(res.body["category"], json!({"name": "Category book", "slug": "book"}));
        assert_eq!(res.body["genre"][0]["slug"], "sci-fi");
    }

    #[tokio::test]
    async fn rating_is_mean_of_scores() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.login("alice").await;
        let bob = app.login("bob").await;
        app.create_review(&alice, title_id, 7).await;
        app.create_review(&bob, title_id, 10).await;

        let res = app.get_without_token(&routes::title(title_id)).await;

        assert_eq!(res.body["rating"], 8.5);
    }

    #[tokio::test]
    async fn unknown_title_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::title(999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn list_filters_combine() {
        let app = TestApp::spawn().await;
        let (admin, _) = app.seed_title().await;
        app.create_category(&admin, "film").await;
        app.create_genre(&admin, "drama").await;
        app.create_title(&admin, "Stalker", "film", &["sci-fi", "drama"])
            .await;
        app.create_title(&admin, "Mirror", "film", &["drama"]).await;

        let res = app
            .get_without_token(&format!("{}?category=film&genre=sci-fi", routes::TITLES))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["name"], "Stalker");

        let res = app
            .get_without_token(&format!("{}?name=SOL", routes::TITLES))
            .await;
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["name"], "Solaris");

        let res = app
            .get_without_token(&format!("{}?year=1961", routes::TITLES))
            .await;
        assert_eq!(res.body["pagination"]["total"], 3);

        let res = app
            .get_without_token(&format!("{}?category=unknown", routes::TITLES))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn list_is_ordered_by_name() {
        let app = TestApp::spawn().await;
        let (admin, _) = app.seed_title().await;
        app.create_title(&admin, "Eden", "book", &["sci-fi"]).await;

        let res = app.get_without_token(routes::TITLES).await;

        assert_eq!(res.body["data"][0]["name"], "Eden");
        assert_eq!(res.body["data"][1]["name"], "Solaris");
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn patch_replaces_genres_and_keeps_other_fields() {
        let app = TestApp::spawn().await;
        let (admin, title_id) = app.seed_title().await;
        app.create_genre(&admin, "classic").await;

        let res = app
            .patch_with_token(
                &routes::title(title_id),
                &json!({"genre": ["classic"], "description": "Updated"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["genre"], json!(["classic"]));
        assert_eq!(res.body["description"], "Updated");
        assert_eq!(res.body["name"], "Solaris");
        assert_eq!(res.body["category"], "book");
    }

    #[tokio::test]
    async fn null_category_detaches_it() {
        let app = TestApp::spawn().await;
        let (admin, title_id) = app.seed_title().await;

        let res = app
            .patch_with_token(&routes::title(title_id), &json!({"category": null}), &admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["category"].is_null());
    }

    #[tokio::test]
    async fn unknown_title_is_not_found_for_admin() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .patch_with_token(&routes::title(999), &json!({"name": "X"}), &admin)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn regular_user_is_forbidden_before_lookup() {
        let app = TestApp::spawn().await;
        let alice = app.login("alice").await;

        let res = app
            .patch_with_token(&routes::title(999), &json!({"name": "X"}), &alice)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn removes_reviews_and_comments() {
        let app = TestApp::spawn().await;
        let (admin, title_id) = app.seed_title().await;
        let alice = app.login("alice").await;
        let review_id = app.create_review(&alice, title_id, 9).await;
        let comment_id = app.create_comment(&admin, title_id, review_id).await;

        let res = app.delete_with_token(&routes::title(title_id), &admin).await;
        assert_eq!(res.status, 204);

        assert_eq!(
            app.get_without_token(&routes::title(title_id)).await.status,
            404
        );
        assert_eq!(
            app.get_without_token(&routes::review(title_id, review_id))
                .await
                .status,
            404
        );
        assert_eq!(
            app.get_without_token(&routes::comment(title_id, review_id, comment_id))
                .await
                .status,
            404
        );

        let other = app.create_title(&admin, "Eden", "book", &["sci-fi"]).await;
        app.create_review(&alice, other, 5).await;
    }

    #[tokio::test]
    async fn anonymous_is_token_missing() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;

        let res = app.delete_without_token(&routes::title(title_id)).await;

        assert_eq!(res.status, 401);
    }
}
