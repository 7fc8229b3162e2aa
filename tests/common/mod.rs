use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use maintenix::config::Config;

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST a JSON body and return (body, status).
    pub async fn post(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> (Value, StatusCode) {
        self.post(
            "/api/auth/signup",
            &json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    /// Create a technician account usable by the reset flow.
    pub async fn seed_account(&self, email: &str) {
        let (body, status) = self.signup("Field Tech", email, "OldPass1!").await;
        assert_eq!(status, StatusCode::OK, "seed signup failed: {body}");
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post(
            "/api/auth/login",
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn forgot_password(&self, email: &str) -> (Value, StatusCode) {
        self.post("/api/auth/forgot-password", &json!({ "email": email }))
            .await
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> (Value, StatusCode) {
        self.post("/api/auth/verify-otp", &json!({ "email": email, "otp": otp }))
            .await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> (Value, StatusCode) {
        self.post(
            "/api/auth/reset-password",
            &json!({ "email": email, "otp": otp, "newPassword": new_password }),
        )
        .await
    }

    /// Codes are only delivered out-of-band, so tests read them from the table.
    pub async fn latest_otp(&self, email: &str) -> String {
        sqlx::query_scalar::<_, String>(
            "SELECT otp_code FROM password_resets
             WHERE account_email = $1 AND used = false
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .expect("no pending reset")
    }

    pub async fn unused_reset_count(&self, email: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM password_resets WHERE account_email = $1 AND used = false",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    /// Push every reset for this email past its expiry.
    pub async fn expire_resets(&self, email: &str) {
        sqlx::query(
            "UPDATE password_resets
             SET created_at = now() - interval '11 minutes',
                 expires_at = now() - interval '1 minute'
             WHERE account_email = $1",
        )
        .bind(email)
        .execute(&self.pool)
        .await
        .unwrap();
    }

    pub async fn password_hash(&self, email: &str) -> String {
        sqlx::query_scalar::<_, String>("SELECT password_hash FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let db_name = format!("maintenix_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        max_body_size: 65_536,
        log_level: "warn".to_string(),
        otp_ttl_minutes: 10,
        min_password_length: 6,
        allowed_domains: vec!["maintenix.com".to_string(), "company.com".to_string()],
        reset_retention_hours: 24,
        sweep_interval_secs: 300,
        smtp: None,
    };

    let (app, _state) = maintenix::build_app(pool.clone(), config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        pool,
        client: Client::new(),
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
