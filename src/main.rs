//! Atrium - A modular admin backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atrium::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{
            SqlxCategoryRepository, SqlxFailedLoginRepository, SqlxFileRepository,
            SqlxPermissionRepository, SqlxPostRepository, SqlxRoleRepository,
            SqlxSessionRepository, SqlxTagRepository, SqlxUserRepository,
        },
    },
    services::{
        AuthService, CategoryService, FailedLoginService, FileService, LoginRateLimiter,
        PermissionService, PostService, RoleService, TagService, UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atrium=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Atrium admin backend...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize cache
    let cache = create_cache(&config.cache);
    tracing::info!("Cache initialized");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let failed_login_repo = SqlxFailedLoginRepository::boxed(pool.clone());
    let role_repo = SqlxRoleRepository::boxed(pool.clone());
    let permission_repo = SqlxPermissionRepository::boxed(pool.clone());
    let category_repo = SqlxCategoryRepository::boxed(pool.clone());
    let tag_repo = SqlxTagRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let file_repo = SqlxFileRepository::boxed(pool.clone());

    // Initialize services
    let rate_limiter = Arc::new(LoginRateLimiter::new());
    let auth_service = Arc::new(AuthService::new(
        user_repo.clone(),
        session_repo,
        failed_login_repo.clone(),
        rate_limiter.clone(),
        pool.clone(),
        config.auth.session_ttl_seconds as i64,
        config.auth.reset_code_ttl_seconds as i64,
    ));
    let user_service = Arc::new(UserService::new(user_repo, pool.clone()));
    let role_service = Arc::new(RoleService::new(role_repo, pool.clone(), cache.clone()));
    let permission_service = Arc::new(PermissionService::new(
        permission_repo,
        pool.clone(),
        cache.clone(),
    ));
    let category_service = Arc::new(CategoryService::new(
        category_repo,
        pool.clone(),
        cache.clone(),
    ));
    let tag_service = Arc::new(TagService::new(tag_repo.clone(), pool.clone()));
    let post_service = Arc::new(PostService::new(post_repo, tag_repo, pool.clone()));
    let failed_login_service = Arc::new(FailedLoginService::new(failed_login_repo, pool.clone()));
    let file_service = Arc::new(FileService::new(file_repo, pool.clone()));

    // Build application state
    let state = AppState {
        pool,
        auth_service: auth_service.clone(),
        user_service,
        role_service,
        permission_service,
        category_service,
        tag_service,
        post_service,
        failed_login_service,
        file_service,
        rate_limiter: rate_limiter.clone(),
    };

    // Periodic cleanup: expired sessions and stale rate limiter entries
    {
        let auth = auth_service.clone();
        let limiter = rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
                match auth.purge_expired_sessions().await {
                    Ok(purged) if purged > 0 => {
                        tracing::debug!(purged, "purged expired sessions");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("session cleanup failed: {}", e),
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
