use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::gitops::{GitRepository, PublishOutcome};
use crate::server::error::ApiError;
use crate::server::middleware::{cors_layer, request_id};
use crate::server::state::AppState;
use crate::service::{
    ClusterRequest, FlavorGenerateRequest, GenerateClusterRequest, Generation, HealthResponse,
    ServiceError,
};

type ApiResult<T> = Result<T, ApiError>;

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse::healthy())
}

// ============================================================================
// Catalogue
// ============================================================================

pub async fn defaults(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.defaults())
}

pub async fn vendors(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.vendors())
}

pub async fn versions(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.versions())
}

pub async fn sites(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.sites())
}

pub async fn image_content_sources(
    State(state): State<AppState>,
    Path(version): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let sources = state.service.image_content_sources(&version)?;
    Ok(Json(json!({
        "version": version,
        "imageContentSources": sources,
    })))
}

pub async fn reload_registry(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let count = state.service.reload_registry()?;
    Ok(Json(json!({
        "message": "Image content sources reloaded successfully",
        "versions_loaded": count,
    })))
}

// ============================================================================
// Flavors
// ============================================================================

pub async fn list_flavors(State(state): State<AppState>) -> impl IntoResponse {
    let flavors = state.service.list_flavors();
    Json(json!({
        "total": flavors.len(),
        "flavors": flavors,
    }))
}

pub async fn get_flavor(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.flavor_details(&name)?))
}

pub async fn reload_flavors(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let count = state.service.reload_flavors()?;
    Ok(Json(json!({
        "message": "Flavors reloaded successfully",
        "flavors_loaded": count,
        "available_flavors": state.service.flavor_catalog().keys(),
    })))
}

pub async fn generate_from_flavor(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<FlavorGenerateRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let cluster_request = state.service.flavor_request(
        &name,
        &request.cluster_name,
        &request.site,
        request.dns_domain.clone(),
    )?;
    let generation = state.service.generate(&cluster_request)?;

    let git = if request.commit {
        Some(publish(&state, &generation).await?)
    } else {
        None
    };

    let message = format!("Cluster configuration generated successfully from flavor '{name}'");
    Ok((
        StatusCode::CREATED,
        Json(generation.generate_response(message, git)),
    ))
}

// ============================================================================
// Generation
// ============================================================================

/// Generate a cluster document, optionally committing it
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateClusterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let generation = state.service.generate(&request.cluster)?;

    let git = if request.commit {
        Some(publish(&state, &generation).await?)
    } else {
        None
    };

    info!(
        "Generated cluster {} ({} nodepool(s))",
        generation.input.cluster_name,
        generation.nodepool_count()
    );
    let message = generation.success_message();
    Ok((
        StatusCode::CREATED,
        Json(generation.generate_response(message, git)),
    ))
}

pub async fn preview(
    State(state): State<AppState>,
    payload: Result<Json<ClusterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    Ok(Json(state.service.preview(&request)?))
}

/// Commit through the configured checkout, one publish per path at a time
async fn publish(state: &AppState, generation: &Generation) -> ApiResult<PublishOutcome> {
    let config = state
        .settings
        .repository_config()
        .ok_or(ServiceError::GitOpsDisabled)?;

    // Held until the git work returns, not until this future is dropped
    let guard = state.repo_lock(&config.repo_path).lock_owned().await;

    let service = state.service.clone();
    let generation = generation.clone();
    let author = state.settings.commit_author();

    tokio::task::spawn_blocking(move || {
        let _guard = guard;
        let sink = GitRepository::new(config);
        service.publish(&sink, &generation, author)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .map_err(ApiError::from)
}

/// Create the Axum router
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.server.cors_origins);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/v1/clusters/defaults", get(defaults))
        .route("/api/v1/clusters/vendors", get(vendors))
        .route("/api/v1/clusters/versions", get(versions))
        .route("/api/v1/clusters/sites", get(sites))
        .route("/api/v1/clusters/flavors", get(list_flavors))
        .route("/api/v1/clusters/flavors/reload", post(reload_flavors))
        .route("/api/v1/clusters/flavors/{name}", get(get_flavor))
        .route(
            "/api/v1/clusters/flavors/{name}/generate",
            post(generate_from_flavor),
        )
        .route("/api/v1/clusters/generate", post(generate))
        .route("/api/v1/clusters/preview", post(preview))
        .route(
            "/api/v1/versions/{version}/image-content-sources",
            get(image_content_sources),
        )
        .route("/api/v1/registry/reload", post(reload_registry))
        .layer(middleware::from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
