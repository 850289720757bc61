use serde_json::json;
use server::store::Role;

use crate::common::{TestApp, routes};

mod roster {
    use super::*;

    #[tokio::test]
    async fn admin_lists_users_ordered_by_username() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.login("zed").await;
        app.login("bob").await;

        let res = app.get_with_token(routes::USERS, &admin).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let names: Vec<&str> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["username"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["admin", "bob", "zed"]);
        assert_eq!(res.body["pagination"]["total"], 3);
    }

    #[tokio::test]
    async fn search_filters_by_username_substring() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.login("alice").await;
        app.login("malice").await;
        app.login("bob").await;

        let res = app
            .get_with_token(&format!("{}?search=lic", routes::USERS), &admin)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn pagination_splits_results() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        for name in ["u1", "u2", "u3", "u4"] {
            app.login(name).await;
        }

        let res = app
            .get_with_token(&format!("{}?page=2&per_page=2", routes::USERS), &admin)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 2);
        assert_eq!(res.body["pagination"]["page"], 2);
        assert_eq!(res.body["pagination"]["total"], 5);
        assert_eq!(res.body["pagination"]["total_pages"], 3);
    }

    #[tokio::test]
    async fn page_zero_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .get_with_token(&format!("{}?page=0", routes::USERS), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn huge_page_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let huge = "page=1844674407370955161&per_page=100";

        let res = app
            .get_with_token(&format!("{}?{huge}", routes::USERS), &admin)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let res = app
            .get_without_token(&format!("{}?{huge}", routes::TITLES))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn anonymous_caller_gets_token_missing() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::USERS).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn moderator_is_forbidden() {
        let app = TestApp::spawn().await;
        let moderator = app.create_user_with_role("mod", Role::Moderator).await;

        let res = app.get_with_token(routes::USERS, &moderator).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn superuser_with_user_role_counts_as_admin() {
        let app = TestApp::spawn().await;
        let token = app.login("root").await;
        let mut user = app.store_user("root").await;
        user.is_superuser = true;
        server::store::Store::update_user(app.store.as_ref(), user)
            .await
            .unwrap();

        let res = app.get_with_token(routes::USERS, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(app.store_user("root").await.role, Role::Admin);
    }
}

mod admin_crud {
    use super::*;

    #[tokio::test]
    async fn create_user_with_role() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({
                    "username": "carol",
                    "email": "carol@EXAMPLE.com",
                    "role": "moderator",
                    "first_name": "Carol",
                }),
                &admin,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["username"], "carol");
        assert_eq!(res.body["email"], "carol@example.com");
        assert_eq!(res.body["role"], "moderator");
        assert_eq!(res.body["first_name"], "Carol");
        assert_eq!(res.body["bio"], "");
        assert!(res.body.get("password").is_none());
    }

    #[tokio::test]
    async fn create_user_defaults_to_user_role() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({"username": "carol", "email": "carol@example.com"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["role"], "user");
    }

    #[tokio::test]
    async fn create_user_with_taken_identity_reports_fields() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({"username": "admin", "email": "admin@example.com"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["username"].is_array());
        assert!(res.body["fields"]["email"].is_array());
    }

    #[tokio::test]
    async fn create_user_rejects_unknown_role() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({"username": "carol", "email": "carol@example.com", "role": "owner"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn create_user_rejects_short_password() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({"username": "carol", "email": "carol@example.com", "password": "short"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["password"].is_array());
    }

    #[tokio::test]
    async fn get_user_by_username() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.login("alice").await;

        let res = app.get_with_token(&routes::user("alice"), &admin).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["email"], "alice@example.com");
        assert_eq!(res.body["role"], "user");
    }

    #[tokio::test]
    async fn get_unknown_user_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app.get_with_token(&routes::user("ghost"), &admin).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn admin_can_change_role() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let alice = app.login("alice").await;

        let res = app
            .patch_with_token(&routes::user("alice"), &json!({"role": "admin"}), &admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["role"], "admin");
        assert_eq!(app.get_with_token(routes::USERS, &alice).await.status, 200);
    }

    #[tokio::test]
    async fn patch_keeps_own_username_without_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.login("alice").await;

        let res = app
            .patch_with_token(
                &routes::user("alice"),
                &json!({"username": "alice", "email": "alice@example.com", "bio": "Reader"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["bio"], "Reader");
    }

    #[tokio::test]
    async fn patch_to_taken_username_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.login("alice").await;
        app.login("bob").await;

        let res = app
            .patch_with_token(&routes::user("bob"), &json!({"username": "alice"}), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(
            res.body["fields"]["username"][0],
            server::error::USERNAME_TAKEN
        );
    }

    #[tokio::test]
    async fn superuser_keeps_admin_role() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.login("root").await;
        let mut root = app.store_user("root").await;
        root.is_superuser = true;
        server::store::Store::update_user(app.store.as_ref(), root)
            .await
            .unwrap();

        let res = app
            .patch_with_token(&routes::user("root"), &json!({"role": "user"}), &admin)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["role"], "admin");
    }

    #[tokio::test]
    async fn delete_user_removes_their_reviews_and_comments() {
        let app = TestApp::spawn().await;
        let (admin, title_id) = app.seed_title().await;
        let alice = app.login("alice").await;
        let bob = app.login("bob").await;
        let alice_review = app.create_review(&alice, title_id, 8).await;
        let bob_review = app.create_review(&bob, title_id, 4).await;
        app.create_comment(&bob, title_id, alice_review).await;
        app.create_comment(&alice, title_id, bob_review).await;

        let res = app.delete_with_token(&routes::user("alice"), &admin).await;
        assert_eq!(res.status, 204);

        let reviews = app.get_without_token(&routes::reviews(title_id)).await;
        assert_eq!(reviews.body["pagination"]["total"], 1);
        assert_eq!(reviews.body["data"][0]["author"], "bob");

        let comments = app
            .get_without_token(&routes::comments(title_id, bob_review))
            .await;
        assert_eq!(comments.body["pagination"]["total"], 0);

        let title = app.get_without_token(&routes::title(title_id)).await;
        assert_eq!(title.body["rating"], 4.0);
    }

    #[tokio::test]
    async fn delete_unknown_user_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app.delete_with_token(&routes::user("ghost"), &admin).await;

        assert_eq!(res.status, 404);
    }
}

mod me {
    use super::*;

    #[tokio::test]
    async fn get_me_returns_own_profile() {
        let app = TestApp::spawn().await;
        let token = app.login("alice").await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["username"], "alice");
        assert_eq!(res.body["role"], "user");
    }

    #[tokio::test]
    async fn get_me_requires_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn update_me_changes_profile() {
        let app = TestApp::spawn().await;
        let token = app.login("alice").await;

        let res = app
            .patch_with_token(
                routes::ME,
                &json!({"first_name": "Alice", "last_name": "Liddell", "bio": "Curious"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["first_name"], "Alice");
        assert_eq!(res.body["last_name"], "Liddell");
        assert_eq!(res.body["bio"], "Curious");
    }

    #[tokio::test]
    async fn update_me_ignores_role() {
        let app = TestApp::spawn().await;
        let token = app.login("alice").await;

        let res = app
            .patch_with_token(routes::ME, &json!({"role": "admin", "bio": "hi"}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["role"], "user");
        assert_eq!(app.store_user("alice").await.role, Role::User);
    }

    #[tokio::test]
    async fn update_me_rejects_email_of_other_account() {
        let app = TestApp::spawn().await;
        let token = app.login("alice").await;
        app.login("bob").await;

        let res = app
            .patch_with_token(routes::ME, &json!({"email": "bob@example.com"}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["fields"]["email"][0], server::error::EMAIL_TAKEN);
    }

    #[tokio::test]
    async fn renamed_user_keeps_working_token() {
        let app = TestApp::spawn().await;
        let token = app.login("alice").await;

        let res = app
            .patch_with_token(routes::ME, &json!({"username": "alice2"}), &token)
            .await;
        assert_eq!(res.status, 200);

        let res = app.get_with_token(routes::ME, &token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["username"], "alice2");
    }
}
