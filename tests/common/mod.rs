#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use serde_json::Value;
use userexe::auth::{PasswordHasher, TokenSigner, TokenVerifier};
use userexe::configuration::JwtSettings;
use userexe::service::AuthService;
use userexe::startup::run;
use userexe::store::InMemoryUserStore;

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryUserStore>,
    pub jwt: JwtSettings,
    pub client: reqwest::Client,
}

pub fn jwt_settings() -> JwtSettings {
    JwtSettings {
        signing_secret: Some("x".repeat(128)),
        issuer: "TestIssuer".to_string(),
        audience: "TestAudience".to_string(),
    }
}

pub fn spawn_app(admins: &[&str]) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let jwt = jwt_settings();
    let store = Arc::new(InMemoryUserStore::new());
    let service = AuthService::new(store.clone(), TokenSigner::from_settings(&jwt).unwrap())
        .with_hasher(PasswordHasher::new(4))
        .with_admin_allow_list(admins.iter().map(|s| s.to_string()).collect());
    let verifier = TokenVerifier::from_settings(&jwt).unwrap();

    let server = run(listener, service, verifier).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        jwt,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}{}", self.address, path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}
