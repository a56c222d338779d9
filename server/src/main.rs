mod api;
mod auth;
mod state;
mod telemetry;

#[cfg(test)]
mod tests;

pub use state::AppState;

use anyhow::Context;
use axum::extract::MatchedPath;
use axum::http::{header, HeaderName, Request};
use axum::Router;
use essensplan_core::ai::ConfigError;
use essensplan_core::{
    AiClient, AiConfig, AssetPipeline, EnhancementWorkflow, ImportService, LocalObjectStore,
    MemoryRecipeRepository, OpenAiClient, StorageConfig, WebClient,
};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::StaticTokenVerifier;
use crate::state::UnconfiguredAi;

/// Committed images are served from here; must match the path of
/// `ESSENSPLAN_PUBLIC_BASE_URL`.
pub const STORAGE_ROUTE: &str = "/storage/v1/object/public/recipe-images";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// How often expired staged images and orphaned objects are cleaned up.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(300);

fn build_state() -> anyhow::Result<AppState> {
    let ai: Arc<dyn AiClient> = match AiConfig::from_env() {
        Ok(config) => Arc::new(OpenAiClient::new(config).context("AI client")?),
        Err(ConfigError::MissingEnvVar(name)) => {
            tracing::warn!("{} not set, AI endpoints will fail", name);
            Arc::new(UnconfiguredAi)
        }
        Err(e) => return Err(e).context("AI configuration"),
    };

    let storage = StorageConfig::from_env().context("storage configuration")?;
    let store = Arc::new(LocalObjectStore::new(
        storage.root_dir.clone(),
        storage.public_base_url.clone(),
    ));
    let http = WebClient::builder()
        .max_body_bytes(storage.max_image_bytes)
        .build()
        .context("HTTP client")?;

    let assets = Arc::new(AssetPipeline::new(
        store,
        Arc::new(http),
        storage.max_image_bytes,
        storage.staging_ttl,
    ));
    let repository = Arc::new(MemoryRecipeRepository::new());

    let sessions = StaticTokenVerifier::from_env()?;
    if sessions.is_empty() {
        tracing::warn!("ESSENSPLAN_API_TOKENS not set, every request will be rejected");
    }

    Ok(AppState {
        imports: Arc::new(ImportService::new(
            ai.clone(),
            assets.clone(),
            repository.clone(),
        )),
        enhancements: Arc::new(EnhancementWorkflow::new(ai.clone(), assets, repository)),
        ai,
        sessions: Arc::new(sessions),
        storage_root: storage.root_dir,
    })
}

fn app(state: AppState) -> Router {
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ]);

    Router::new()
        .merge(api::router())
        .nest_service(STORAGE_ROUTE, ServeDir::new(&state.storage_root))
        .merge(swagger_ui)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, _span: &Span| {
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        )
}

/// Periodically drop expired staged images along with the enhancement
/// candidates pointing at them, and retry failed deletions.
fn spawn_maintenance(assets: Arc<AssetPipeline>, enhancements: Arc<EnhancementWorkflow>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
        loop {
            interval.tick().await;
            let expired = assets.purge_expired();
            let candidates = enhancements.purge_expired();
            let remaining = assets.sweep_orphans().await;
            if expired > 0 || candidates > 0 || !remaining.is_empty() {
                tracing::info!(
                    expired,
                    candidates,
                    orphans_remaining = remaining.len(),
                    "Storage maintenance finished"
                );
            }
        }
    });
}

#[tokio::main]
async fn main() {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        let spec = api::openapi()
            .to_pretty_json()
            .expect("OpenAPI document serializes");
        println!("{}", spec);
        return;
    }

    telemetry::init_telemetry();

    let state = build_state().expect("Failed to configure server");
    spawn_maintenance(state.imports.assets().clone(), state.enhancements.clone());

    let bind_addr = env::var("ESSENSPLAN_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind listener");
    let local_addr = listener.local_addr().expect("Listener has an address");

    tracing::info!("Server listening on {}", local_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", local_addr);
    tracing::info!(
        "OpenAPI spec available at http://{}/api-docs/openapi.json",
        local_addr
    );

    axum::serve(listener, app(state))
        .await
        .expect("Server error");
}
