use serde_json::json;
use server::store::Role;

use crate::common::{TestApp, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn signed_in_user_reviews_title() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.login("alice").await;

        let res = app
            .post_with_token(
                &routes::reviews(title_id),
                &json!({"text": "A classic.", "score": 9}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["author"], "alice");
        assert_eq!(res.body["text"], "A classic.");
        assert_eq!(res.body["score"], 9);
        assert!(res.body["pub_date"].is_string());
    }

    #[tokio::test]
    async fn second_review_by_same_author_is_conflict() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.login("alice").await;
        app.create_review(&alice, title_id, 9).await;

        let res = app
            .post_with_token(
                &routes::reviews(title_id),
                &json!({"text": "Again.", "score": 1}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");

        let list = app.get_without_token(&routes::reviews(title_id)).await;
        assert_eq!(list.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn concurrent_duplicates_store_one_review() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.login("alice").await;
        let url = format!("http://{}{}", app.addr, routes::reviews(title_id));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let client = app.client.clone();
                let url = url.clone();
                let token = alice.clone();
                tokio::spawn(async move {
                    client
                        .post(url)
                        .header("Authorization", format!("Bearer {token}"))
                        .json(&json!({"text": format!("Take {i}"), "score": 5}))
                        .send()
                        .await
                        .unwrap()
                        .status()
                        .as_u16()
                })
            })
            .collect();

        let mut statuses = Vec::new();
        for handle in handles {
            statuses.push(handle.await.unwrap());
        }

        assert_eq!(statuses.iter().filter(|&&s| s == 201).count(), 1);
        assert_eq!(statuses.iter().filter(|&&s| s == 409).count(), 7);

        let list = app.get_without_token(&routes::reviews(title_id)).await;
        assert_eq!(list.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn different_authors_may_review_same_title() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.login("alice").await;
        let bob = app.login("bob").await;

        app.create_review(&alice, title_id, 3).await;
        app.create_review(&bob, title_id, 4).await;

        let list = app.get_without_token(&routes::reviews(title_id)).await;
        assert_eq!(list.body["pagination"]["total"], 2);
        assert_eq!(list.body["data"][0]["author"], "alice");
    }

    #[tokio::test]
    async fn score_out_of_range_is_rejected() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.login("alice").await;

        for score in [0, 11] {
            let res = app
                .post_with_token(
                    &routes::reviews(title_id),
                    &json!({"text": "Hmm.", "score": score}),
                    &alice,
                )
                .await;
            assert_eq!(res.status, 400, "score {score}");
            assert!(res.body["fields"]["score"].is_array());
        }
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.login("alice").await;

        let res = app
            .post_with_token(
                &routes::reviews(title_id),
                &json!({"text": "   ", "score": 5}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["text"].is_array());
    }

    #[tokio::test]
    async fn unknown_title_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.login("alice").await;

        let res = app
            .post_with_token(&routes::reviews(999), &json!({"text": "x", "score": 5}), &alice)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn anonymous_is_token_missing() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;

        let res = app
            .post_without_token(&routes::reviews(title_id), &json!({"text": "x", "score": 5}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn list_of_unknown_title_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::reviews(999)).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn review_under_wrong_title_is_not_found() {
        let app = TestApp::spawn().await;
        let (admin, title_id) = app.seed_title().await;
        let other = app.create_title(&admin, "Eden", "book", &["sci-fi"]).await;
        let alice = app.login("alice").await;
        let review_id = app.create_review(&alice, title_id, 6).await;

        let res = app.get_without_token(&routes::review(other, review_id)).await;
        assert_eq!(res.status, 404);

        let res = app.get_without_token(&routes::review(title_id, review_id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], review_id);
    }
}

mod permissions {
    use super::*;

    async fn setup(app: &TestApp) -> (i32, i32) {
        let (_, title_id) = app.seed_title().await;
        let author = app.login("author").await;
        let review_id = app.create_review(&author, title_id, 6).await;
        (title_id, review_id)
    }

    #[tokio::test]
    async fn other_user_cannot_edit_or_delete() {
        let app = TestApp::spawn().await;
        let (title_id, review_id) = setup(&app).await;
        let stranger = app.login("stranger").await;

        let res = app
            .patch_with_token(
                &routes::review(title_id, review_id),
                &json!({"score": 1}),
                &stranger,
            )
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let res = app
            .delete_with_token(&routes::review(title_id, review_id), &stranger)
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn author_can_edit() {
        let app = TestApp::spawn().await;
        let (title_id, review_id) = setup(&app).await;
        let author = app.login("author").await;

        let res = app
            .patch_with_token(
                &routes::review(title_id, review_id),
                &json!({"score": 2}),
                &author,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["score"], 2);
        assert_eq!(res.body["text"], "Worth reading.");

        let title = app.get_without_token(&routes::title(title_id)).await;
        assert_eq!(title.body["rating"], 2.0);
    }

    #[tokio::test]
    async fn moderator_can_edit_and_delete() {
        let app = TestApp::spawn().await;
        let (title_id, review_id) = setup(&app).await;
        let moderator = app.create_user_with_role("mod", Role::Moderator).await;

        let res = app
            .patch_with_token(
                &routes::review(title_id, review_id),
                &json!({"text": "Edited by moderator."}),
                &moderator,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["author"], "author");

        let res = app
            .delete_with_token(&routes::review(title_id, review_id), &moderator)
            .await;
        assert_eq!(res.status, 204);
    }

    #[tokio::test]
    async fn admin_can_delete_and_comments_go_with_it() {
        let app = TestApp::spawn().await;
        let (title_id, review_id) = setup(&app).await;
        let admin = app.login("admin").await;
        let comment_id = app.create_comment(&admin, title_id, review_id).await;

        let res = app
            .delete_with_token(&routes::review(title_id, review_id), &admin)
            .await;
        assert_eq!(res.status, 204);

        let res = app
            .get_without_token(&routes::comment(title_id, review_id, comment_id))
            .await;
        assert_eq!(res.status, 404);

        let title = app.get_without_token(&routes::title(title_id)).await;
        assert_eq!(title.body["rating"], 0.0);
    }

    #[tokio::test]
    async fn anonymous_edit_is_token_missing() {
        let app = TestApp::spawn().await;
        let (title_id, review_id) = setup(&app).await;

        let res = app
            .patch_without_token(&routes::review(title_id, review_id), &json!({"score": 1}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn missing_review_is_not_found_for_author() {
        let app = TestApp::spawn().await;
        let (title_id, _) = setup(&app).await;
        let author = app.login("author").await;

        let res = app
            .patch_with_token(&routes::review(title_id, 999), &json!({"score": 1}), &author)
            .await;

        assert_eq!(res.status, 404);
    }
}
