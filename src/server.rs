//! # Server Configuration
//!
//! Router assembly, shared state and OpenAPI documentation for the postpilot API.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::crypto::CryptoKey;
use crate::handlers;
use crate::lifecycle::PostLifecycleController;
use crate::publisher::{HttpPublisher, PlatformPublisher};
use crate::repositories::SocialAccountRepository;
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub crypto_key: CryptoKey,
    /// Platform client used by the publish endpoint; `None` disables publishing
    pub publisher: Option<Arc<dyn PlatformPublisher>>,
}

impl AppState {
    pub fn post_controller(&self) -> PostLifecycleController {
        PostLifecycleController::new(Arc::new(self.db.clone()), self.crypto_key.clone())
            .with_publisher(self.publisher.clone())
    }

    pub fn social_accounts(&self) -> SocialAccountRepository {
        SocialAccountRepository::new(Arc::new(self.db.clone()), self.crypto_key.clone())
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/connect/{platform}", post(handlers::connect::start_connect))
        .route(
            "/social-accounts",
            post(handlers::social_accounts::create_social_account)
                .get(handlers::social_accounts::list_social_accounts),
        )
        .route(
            "/social-accounts/{id}",
            axum::routing::delete(handlers::social_accounts::delete_social_account),
        )
        .route(
            "/posts",
            post(handlers::posts::create_post).get(handlers::posts::list_posts),
        )
        .route(
            "/posts/{id}",
            get(handlers::posts::get_post).delete(handlers::posts::delete_post),
        )
        .route("/posts/{id}/schedule", put(handlers::posts::schedule_post))
        .route("/posts/{id}/approve", post(handlers::posts::approve_post))
        .route("/posts/{id}/reject", post(handlers::posts::reject_post))
        .route("/posts/{id}/publish", post(handlers::posts::publish_post))
        .route(
            "/posts/{id}/mark-published",
            post(handlers::posts::mark_post_published),
        )
        .route(
            "/posts/{id}/metrics",
            put(handlers::engagement::put_post_metrics)
                .get(handlers::engagement::get_post_metrics),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route(
            "/oauth/callback/{platform}",
            get(handlers::connect::oauth_callback),
        )
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(CorsLayer::permissive())
}

/// Build the platform publisher from configuration, if a gateway is set
pub fn build_publisher(
    config: &AppConfig,
) -> anyhow::Result<Option<Arc<dyn PlatformPublisher>>> {
    let Some(endpoint) = config.publish_gateway()? else {
        tracing::warn!("No publish gateway configured; publish requests will be refused");
        return Ok(None);
    };

    let publisher = HttpPublisher::new(endpoint, config.publish_timeout())?;
    tracing::info!(endpoint = %publisher.endpoint(), "Publish gateway configured");
    Ok(Some(Arc::new(publisher)))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
    crypto_key: CryptoKey,
) -> anyhow::Result<()> {
    let publisher = build_publisher(&config)?;

    // Resolve the configured bind address
    let addr = config
        .bind_addr()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    let state = AppState {
        config: Arc::new(config),
        db,
        crypto_key,
        publisher,
    };
    let profile = state.config.profile.clone();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::connect::start_connect,
        crate::handlers::connect::oauth_callback,
        crate::handlers::social_accounts::create_social_account,
        crate::handlers::social_accounts::list_social_accounts,
        crate::handlers::social_accounts::delete_social_account,
        crate::handlers::posts::create_post,
        crate::handlers::posts::list_posts,
        crate::handlers::posts::get_post,
        crate::handlers::posts::delete_post,
        crate::handlers::posts::schedule_post,
        crate::handlers::posts::approve_post,
        crate::handlers::posts::reject_post,
        crate::handlers::posts::publish_post,
        crate::handlers::posts::mark_post_published,
        crate::handlers::engagement::put_post_metrics,
        crate::handlers::engagement::get_post_metrics,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::Platform,
            crate::models::PostStatus,
            crate::error::ApiError,
            crate::handlers::HealthResponse,
            crate::handlers::connect::StartConnectRequest,
            crate::handlers::connect::StartConnectResponse,
            crate::handlers::connect::OAuthCallbackResponse,
            crate::handlers::social_accounts::CreateSocialAccountRequest,
            crate::handlers::social_accounts::SocialAccountResponse,
            crate::handlers::social_accounts::SocialAccountsResponse,
            crate::handlers::posts::CreatePostRequest,
            crate::handlers::posts::SchedulePostRequest,
            crate::handlers::posts::PublishPostRequest,
            crate::handlers::posts::MarkPublishedRequest,
            crate::handlers::posts::PostResponse,
            crate::handlers::posts::PostsResponse,
            crate::handlers::engagement::EngagementMetricsRequest,
            crate::handlers::engagement::EngagementMetricsResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "connect", description = "OAuth handshake for linking platform accounts"),
        (name = "social-accounts", description = "Linked social accounts"),
        (name = "posts", description = "Post lifecycle and engagement"),
    ),
    info(
        title = "Postpilot API",
        description = "API for scheduling, approving and publishing social media posts",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
