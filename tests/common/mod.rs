#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use inventory_api::{config::AppConfig, db, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "inventory-test-boundary";

/// Application router over a fresh SQLite file that lives as long as the harness.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("inventory_test.db").display()
        );

        let mut cfg = AppConfig::new(url, "127.0.0.1".to_string(), 18_080, "test".to_string());
        cfg.cors_allow_any_origin = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = inventory_api::app(state.clone());

        Self {
            router,
            state,
            _dir: dir,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.send(request).await
    }

    /// Posts `csv` as the `file` part of a multipart form.
    pub async fn upload_csv(&self, uri: &str, field: &str, csv: &str) -> Response {
        let form = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"products.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {csv}\r\n\
             --{BOUNDARY}--\r\n"
        );

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(form))
            .expect("failed to build multipart request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Creates a product through the API and returns its JSON body.
    pub async fn create_product(&self, name: &str, stock: i64) -> Value {
        let response = self
            .request(
                Method::POST,
                "/api/v1/products",
                Some(json!({
                    "name": name,
                    "unit": "pcs",
                    "category": "Tools",
                    "brand": "Acme",
                    "stock": stock,
                    "status": "In Stock",
                    "image": ""
                })),
            )
            .await;
        assert_eq!(response.status(), 201, "create {name} failed");
        response_json(response).await
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = response_bytes(response).await;
    serde_json::from_slice(&bytes).expect("json response")
}

pub async fn response_text(response: Response) -> String {
    String::from_utf8(response_bytes(response).await).expect("utf-8 response")
}

async fn response_bytes(response: Response) -> Vec<u8> {
    body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes")
        .to_vec()
}
