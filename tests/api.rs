//! End-to-end API tests
//!
//! Spin up the full router against an in-memory database and walk the
//! main flows: login, session auth, entity CRUD and the error envelope.

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use atrium::api::{build_router, AppState};
use atrium::cache::create_cache;
use atrium::config::CacheConfig;
use atrium::db::repositories::{
    SqlxCategoryRepository, SqlxFailedLoginRepository, SqlxFileRepository,
    SqlxPermissionRepository, SqlxPostRepository, SqlxRoleRepository, SqlxSessionRepository,
    SqlxTagRepository, SqlxUserRepository, UserRepository,
};
use atrium::db::{create_test_pool, migrations};
use atrium::models::User;
use atrium::services::{
    hash_password, AuthService, CategoryService, FailedLoginService, FileService,
    LoginRateLimiter, PermissionService, PostService, RoleService, TagService, UserService,
};

async fn test_server() -> TestServer {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let users = SqlxUserRepository::boxed(pool.clone());
    let admin = User::new(
        Uuid::new_v4(),
        "admin".to_string(),
        "admin@example.com".to_string(),
        hash_password("correct horse").expect("Failed to hash"),
    );
    users.create(&admin).await.expect("Failed to create admin");

    let cache = create_cache(&CacheConfig::default());
    let rate_limiter = Arc::new(LoginRateLimiter::new());
    let tag_repo = SqlxTagRepository::boxed(pool.clone());

    let state = AppState {
        pool: pool.clone(),
        auth_service: Arc::new(AuthService::new(
            users.clone(),
            SqlxSessionRepository::boxed(pool.clone()),
            SqlxFailedLoginRepository::boxed(pool.clone()),
            rate_limiter.clone(),
            pool.clone(),
            3600,
            900,
        )),
        user_service: Arc::new(UserService::new(users, pool.clone())),
        role_service: Arc::new(RoleService::new(
            SqlxRoleRepository::boxed(pool.clone()),
            pool.clone(),
            cache.clone(),
        )),
        permission_service: Arc::new(PermissionService::new(
            SqlxPermissionRepository::boxed(pool.clone()),
            pool.clone(),
            cache.clone(),
        )),
        category_service: Arc::new(CategoryService::new(
            SqlxCategoryRepository::boxed(pool.clone()),
            pool.clone(),
            cache.clone(),
        )),
        tag_service: Arc::new(TagService::new(tag_repo.clone(), pool.clone())),
        post_service: Arc::new(PostService::new(
            SqlxPostRepository::boxed(pool.clone()),
            tag_repo,
            pool.clone(),
        )),
        failed_login_service: Arc::new(FailedLoginService::new(
            SqlxFailedLoginRepository::boxed(pool.clone()),
            pool.clone(),
        )),
        file_service: Arc::new(FileService::new(
            SqlxFileRepository::boxed(pool.clone()),
            pool,
        )),
        rate_limiter,
    };

    let app = build_router(state, "http://localhost:3000");
    TestServer::new(app).expect("Failed to start test server")
}

async fn login(server: &TestServer) -> String {
    let response = server
        .post("/api/v1/auth/token")
        .json(&json!({ "username": "admin", "password": "correct horse" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["token"].as_str().expect("Token missing").to_string()
}

#[tokio::test]
async fn test_login_and_me() {
    let server = test_server().await;
    let token = login(&server).await;

    let response = server
        .get("/api/v1/auth/me")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["username"], "admin");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let server = test_server().await;

    let response = server
        .post("/api/v1/auth/token")
        .json(&json!({ "username": "admin", "password": "wrong" }))
        .await;

    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_entity_routes_require_session() {
    let server = test_server().await;

    let response = server.get("/api/v1/tags").await;

    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_tag_crud_roundtrip() {
    let server = test_server().await;
    let token = login(&server).await;
    let id = Uuid::new_v4();

    let response = server
        .post("/api/v1/tags")
        .authorization_bearer(&token)
        .json(&json!({ "id": id.to_string(), "name": "rust" }))
        .await;
    response.assert_status_ok();

    let response = server
        .put(&format!("/api/v1/tags/{}", id))
        .authorization_bearer(&token)
        .json(&json!({ "name": "rustlang" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "rustlang");

    let response = server
        .delete(&format!("/api/v1/tags/{}", id))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();

    let response = server
        .get(&format!("/api/v1/tags/{}", id))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_validation_error_envelope() {
    let server = test_server().await;
    let token = login(&server).await;

    // Name below the minimum length
    let response = server
        .post("/api/v1/tags")
        .authorization_bearer(&token)
        .json(&json!({ "id": Uuid::new_v4().to_string(), "name": "ab" }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["name"].is_object());
}

#[tokio::test]
async fn test_paged_list_envelope() {
    let server = test_server().await;
    let token = login(&server).await;

    for name in ["alpha", "beta", "gamma"] {
        server
            .post("/api/v1/categories")
            .authorization_bearer(&token)
            .json(&json!({ "id": Uuid::new_v4().to_string(), "name": name }))
            .await
            .assert_status_ok();
    }

    let response = server
        .get("/api/v1/categories?page=1&per_page=2")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 2);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["total_items"], 3);
}

#[tokio::test]
async fn test_logout_drops_session() {
    let server = test_server().await;
    let token = login(&server).await;

    server
        .post("/api/v1/auth/logout")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    let response = server
        .get("/api/v1/auth/me")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_permission_copy_endpoint() {
    let server = test_server().await;
    let token = login(&server).await;
    let id = Uuid::new_v4();

    server
        .post("/api/v1/permissions")
        .authorization_bearer(&token)
        .json(&json!({
            "id": id.to_string(),
            "module": "posts",
            "name": "posts:create",
            "action": "create",
            "method": "POST",
        }))
        .await
        .assert_status_ok();

    let response = server
        .post(&format!("/api/v1/permissions/{}/copy", id))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["name"], "posts:create - copy");
    assert_ne!(body["id"], id.to_string());
}
