use std::net::SocketAddr;

use reqwest::Client;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde_json::{Value, json};
use tempfile::TempDir;

use foodgram_server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, SeedConfig, ServerConfig,
};
use foodgram_server::entity::{ingredient, user};
use foodgram_server::state::AppState;

pub const PUBLIC_URL: &str = "http://foodgram.test";

pub mod routes {
    pub const REGISTER: &str = "/api/v1/auth/register";
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const USERS: &str = "/api/v1/users";
    pub const ME: &str = "/api/v1/users/me";
    pub const SET_PASSWORD: &str = "/api/v1/users/set_password";
    pub const SUBSCRIPTIONS: &str = "/api/v1/users/subscriptions";
    pub const INGREDIENTS: &str = "/api/v1/ingredients";
    pub const RECIPES: &str = "/api/v1/recipes";
    pub const DOWNLOAD_SHOPPING_CART: &str = "/api/v1/recipes/download_shopping_cart";

    pub fn user(id: i32) -> String {
        format!("/api/v1/users/{id}")
    }

    pub fn subscribe(id: i32) -> String {
        format!("/api/v1/users/{id}/subscribe")
    }

    pub fn ingredient(id: i32) -> String {
        format!("/api/v1/ingredients/{id}")
    }

    pub fn recipe(id: i32) -> String {
        format!("/api/v1/recipes/{id}")
    }

    pub fn favorite(id: i32) -> String {
        format!("/api/v1/recipes/{id}/favorite")
    }

    pub fn shopping_cart(id: i32) -> String {
        format!("/api/v1/recipes/{id}/shopping_cart")
    }

    pub fn get_link(id: i32) -> String {
        format!("/api/v1/recipes/{id}/get-link")
    }
}

/// A running test server backed by its own SQLite file.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
    pub content_disposition: Option<String>,
}

/// An authenticated test user.
pub struct TestUser {
    pub id: i32,
    pub token: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());

        let db = foodgram_server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");
        foodgram_server::seed::ensure_indexes(&db)
            .await
            .expect("Failed to create indexes");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                public_url: PUBLIC_URL.to_string(),
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig { url: db_url },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                token_ttl_days: 1,
            },
            seed: SeedConfig::default(),
        };

        let state = AppState {
            db: db.clone(),
            config: app_config,
        };
        let app = foodgram_server::build_router(state);

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
            db,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn authorize(builder: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
        match token {
            Some(token) => builder.header("Authorization", format!("Bearer {token}")),
            None => builder,
        }
    }

    pub async fn post(&self, path: &str, body: &Value, token: Option<&str>) -> TestResponse {
        let req = Self::authorize(self.client.post(self.url(path)), token).json(body);
        TestResponse::from_response(req.send().await.expect("Failed to send POST request")).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        let req = Self::authorize(self.client.get(self.url(path)), token);
        TestResponse::from_response(req.send().await.expect("Failed to send GET request")).await
    }

    pub async fn patch(&self, path: &str, body: &Value, token: Option<&str>) -> TestResponse {
        let req = Self::authorize(self.client.patch(self.url(path)), token).json(body);
        TestResponse::from_response(req.send().await.expect("Failed to send PATCH request")).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        let req = Self::authorize(self.client.delete(self.url(path)), token);
        TestResponse::from_response(req.send().await.expect("Failed to send DELETE request"))
            .await
    }

    /// Register a user named `username` and log in.
    pub async fn create_authenticated_user(&self, username: &str) -> TestUser {
        let email = format!("{username}@example.com");
        let password = "securepass";

        let reg = self
            .post(
                routes::REGISTER,
                &json!({
                    "email": email,
                    "username": username,
                    "first_name": "Test",
                    "last_name": "User",
                    "password": password,
                }),
                None,
            )
            .await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);

        let res = self
            .post(
                routes::LOGIN,
                &json!({"email": email, "password": password}),
                None,
            )
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        TestUser {
            id: reg.id(),
            token: res.body["auth_token"]
                .as_str()
                .expect("Login response should contain a token")
                .to_string(),
        }
    }

    /// Register a user, promote them to `role`, then log in.
    pub async fn create_user_with_role(&self, username: &str, role: &str) -> TestUser {
        let created = self.create_authenticated_user(username).await;

        let db_user = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .expect("DB query failed")
            .expect("User not found after registration");
        let mut active: user::ActiveModel = db_user.into();
        active.role = Set(role.to_string());
        active.update(&self.db).await.expect("Failed to update role");

        let res = self
            .post(
                routes::LOGIN,
                &json!({"email": format!("{username}@example.com"), "password": "securepass"}),
                None,
            )
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        TestUser {
            id: created.id,
            token: res.body["auth_token"].as_str().unwrap().to_string(),
        }
    }

    /// Insert a catalog ingredient directly and return its `id`.
    pub async fn seed_ingredient(&self, name: &str, unit: &str) -> i32 {
        ingredient::ActiveModel {
            name: Set(name.to_string()),
            measurement_unit: Set(unit.to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("Failed to insert ingredient")
        .id
    }

    /// Create a recipe via the API and return its `id`.
    pub async fn create_recipe(&self, token: &str, name: &str, ingredients: &[(i32, i64)]) -> i32 {
        let res = self
            .post(routes::RECIPES, &recipe_body(name, ingredients), Some(token))
            .await;
        assert_eq!(res.status, 201, "create_recipe failed: {}", res.text);
        res.id()
    }
}

/// JSON body for a valid recipe with the given ingredient lines.
pub fn recipe_body(name: &str, ingredients: &[(i32, i64)]) -> Value {
    let lines: Vec<Value> = ingredients
        .iter()
        .map(|(id, amount)| json!({"id": id, "amount": amount}))
        .collect();
    json!({
        "name": name,
        "text": "Mix everything and cook.",
        "cooking_time": 20,
        "image": "recipes/images/dish.png",
        "ingredients": lines,
    })
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let content_disposition = res
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            text,
            body,
            content_disposition,
        }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }
}
