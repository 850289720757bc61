use std::net::SocketAddr;
use std::sync::Arc;

use common::MailConfig;
use common::mail::memory::MemoryMailer;
use reqwest::Client;
use serde_json::{Value, json};

use server::config::{AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig};
use server::state::AppState;
use server::store::memory::MemoryStore;
use server::store::{Role, Store, User};
use server::utils::jwt::TokenIssuer;

pub const JWT_SECRET: &str = "test-secret-for-integration-tests";

pub mod routes {
    pub const SIGNUP: &str = "/api/v1/auth/signup";
    pub const TOKEN: &str = "/api/v1/auth/token";
    pub const USERS: &str = "/api/v1/users";
    pub const ME: &str = "/api/v1/users/me";
    pub const CATEGORIES: &str = "/api/v1/categories";
    pub const GENRES: &str = "/api/v1/genres";
    pub const TITLES: &str = "/api/v1/titles";

    pub fn user(username: &str) -> String {
        format!("/api/v1/users/{username}")
    }

    pub fn category(slug: &str) -> String {
        format!("/api/v1/categories/{slug}")
    }

    pub fn genre(slug: &str) -> String {
        format!("/api/v1/genres/{slug}")
    }

    pub fn title(id: i32) -> String {
        format!("/api/v1/titles/{id}")
    }

    pub fn reviews(title_id: i32) -> String {
        format!("/api/v1/titles/{title_id}/reviews")
    }

    pub fn review(title_id: i32, review_id: i32) -> String {
        format!("/api/v1/titles/{title_id}/reviews/{review_id}")
    }

    pub fn comments(title_id: i32, review_id: i32) -> String {
        format!("/api/v1/titles/{title_id}/reviews/{review_id}/comments")
    }

    pub fn comment(title_id: i32, review_id: i32, comment_id: i32) -> String {
        format!("/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}")
    }
}

/// A running test server over the in-memory store and mailer.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<MemoryMailer>,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors: CorsConfig {
                allow_origins: vec![],
                max_age: 3600,
            },
        },
        database: DatabaseConfig {
            url: "memory://".to_string(),
        },
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
            token_ttl_hours: 1,
            consume_confirmation_code: false,
        },
        mail: MailConfig::default(),
        bootstrap: None,
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn with a tweaked configuration.
    pub async fn spawn_with(configure: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = test_config();
        configure(&mut config);

        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(MemoryMailer::new());
        let state = AppState {
            store: store.clone(),
            mailer: mailer.clone(),
            tokens: TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl_hours),
            config,
        };

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            store,
            mailer,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder, token: Option<&str>) -> TestResponse {
        let request = match token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        };
        let res = request.send().await.expect("Failed to send request");
        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        self.send(self.client.get(self.url(path)), None).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        self.send(self.client.get(self.url(path)), Some(token)).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        self.send(self.client.post(self.url(path)).json(body), None)
            .await
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        self.send(self.client.post(self.url(path)).json(body), Some(token))
            .await
    }

    pub async fn patch_without_token(&self, path: &str, body: &Value) -> TestResponse {
        self.send(self.client.patch(self.url(path)).json(body), None)
            .await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        self.send(self.client.patch(self.url(path)).json(body), Some(token))
            .await
    }

    pub async fn delete_without_token(&self, path: &str) -> TestResponse {
        self.send(self.client.delete(self.url(path)), None).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        self.send(self.client.delete(self.url(path)), Some(token))
            .await
    }

    pub async fn signup(&self, username: &str, email: &str) -> TestResponse {
        self.post_without_token(
            routes::SIGNUP,
            &json!({"username": username, "email": email}),
        )
        .await
    }

    /// The confirmation code in the newest mail sent to `email`.
    pub async fn last_code(&self, email: &str) -> String {
        let mail = self
            .mailer
            .last_to(email)
            .await
            .unwrap_or_else(|| panic!("no mail sent to {email}"));
        mail.body
            .split("confirmation code: ")
            .nth(1)
            .expect("mail should contain a confirmation code")
            .chars()
            .take_while(char::is_ascii_digit)
            .collect()
    }

    pub async fn exchange(&self, username: &str, code: &str) -> TestResponse {
        self.post_without_token(
            routes::TOKEN,
            &json!({"username": username, "confirmation_code": code}),
        )
        .await
    }

    /// Sign up through the API, read the mailed code and return an access token.
    pub async fn login(&self, username: &str) -> String {
        let email = format!("{username}@example.com");
        let res = self.signup(username, &email).await;
        assert_eq!(res.status, 200, "signup failed: {}", res.text);
        let code = self.last_code(&email).await;
        let res = self.exchange(username, &code).await;
        assert_eq!(res.status, 200, "token exchange failed: {}", res.text);
        res.body["token"]
            .as_str()
            .expect("token response should contain a token")
            .to_string()
    }

    /// The stored record for `username`.
    pub async fn store_user(&self, username: &str) -> User {
        self.store
            .find_user_by_username(username)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("user {username} should exist"))
    }

    /// Sign up a user, set their role directly in the store and return a token.
    pub async fn create_user_with_role(&self, username: &str, role: Role) -> String {
        let token = self.login(username).await;
        let mut user = self.store_user(username).await;
        user.role = role;
        self.store.update_user(user).await.unwrap();
        token
    }

    pub async fn admin_token(&self) -> String {
        self.create_user_with_role("admin", Role::Admin).await
    }

    pub async fn create_category(&self, token: &str, slug: &str) {
        let res = self
            .post_with_token(
                routes::CATEGORIES,
                &json!({"name": format!("Category {slug}"), "slug": slug}),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_category failed: {}", res.text);
    }

    pub async fn create_genre(&self, token: &str, slug: &str) {
        let res = self
            .post_with_token(
                routes::GENRES,
                &json!({"name": format!("Genre {slug}"), "slug": slug}),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_genre failed: {}", res.text);
    }

    /// Create a title via the API and return its `id`.
    pub async fn create_title(
        &self,
        token: &str,
        name: &str,
        category: &str,
        genres: &[&str],
    ) -> i32 {
        let res = self
            .post_with_token(
                routes::TITLES,
                &json!({
                    "name": name,
                    "year": 1961,
                    "description": "",
                    "category": category,
                    "genre": genres,
                }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_title failed: {}", res.text);
        res.id()
    }

    /// Admin token plus one title in category `book` with genre `sci-fi`.
    pub async fn seed_title(&self) -> (String, i32) {
        let admin = self.admin_token().await;
        self.create_category(&admin, "book").await;
        self.create_genre(&admin, "sci-fi").await;
        let title_id = self.create_title(&admin, "Solaris", "book", &["sci-fi"]).await;
        (admin, title_id)
    }

    /// Create a review via the API and return its `id`.
    pub async fn create_review(&self, token: &str, title_id: i32, score: i32) -> i32 {
        let res = self
            .post_with_token(
                &routes::reviews(title_id),
                &json!({"text": "Worth reading.", "score": score}),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_review failed: {}", res.text);
        res.id()
    }

    /// Create a comment via the API and return its `id`.
    pub async fn create_comment(&self, token: &str, title_id: i32, review_id: i32) -> i32 {
        let res = self
            .post_with_token(
                &routes::comments(title_id, review_id),
                &json!({"text": "Agreed."}),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_comment failed: {}", res.text);
        res.id()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }
}
