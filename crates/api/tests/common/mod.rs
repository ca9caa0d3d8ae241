#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use custodia_core::catalog::{AssetRef, OriginPool};
use custodia_db::models::asset::CreateAsset;
use custodia_db::models::director::CreateDirector;
use custodia_db::repositories::{AreaRepo, AssetRepo, DirectorRepo};
use custodia_events::EventBus;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use custodia_api::config::ServerConfig;
use custodia_api::router::build_app_router;
use custodia_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// The catalog TTL is zero so every request sees freshly seeded rows.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        catalog_cache_ttl_secs: 0,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState::new(pool, config.clone(), Arc::new(EventBus::default()));
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

async fn send_json(app: Router, method: Method, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::POST, uri, body).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::PUT, uri, body).await
}

pub async fn patch_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::PATCH, uri, body).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

pub async fn seed_asset(
    pool: &PgPool,
    origin: OriginPool,
    code: &str,
    custodian: Option<&str>,
) -> AssetRef {
    let row = AssetRepo::create(
        pool,
        origin,
        &CreateAsset {
            inventory_code: code.to_string(),
            description: format!("Silla {code}"),
            category: "MOBILIARIO".to_string(),
            condition: "B".to_string(),
            status: "ACTIVO".to_string(),
            custodian: custodian.map(str::to_string),
            area: custodian.map(|_| "FINANZAS".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    AssetRef {
        pool: origin,
        id: row.id,
    }
}

/// A director with a position, optionally linked to one area. Returns its id.
pub async fn seed_director(
    pool: &PgPool,
    name: &str,
    position: Option<&str>,
    area: Option<&str>,
) -> i64 {
    let director = DirectorRepo::create(
        pool,
        &CreateDirector {
            name: name.to_string(),
            legacy_area: None,
            legacy_position: position.map(str::to_string),
        },
    )
    .await
    .unwrap();
    if let Some(area) = area {
        let area = AreaRepo::create(pool, area).await.unwrap();
        DirectorRepo::link_area(pool, director.id, area.id)
            .await
            .unwrap();
    }
    director.id
}
