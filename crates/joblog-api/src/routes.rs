use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use joblog_core::models::{Application, ApplicationDocument};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::authorize;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::store::{DocumentStore, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    documents: Arc<DocumentStore>,
}

impl AppState {
    /// Open the document store named by `config.db_path`
    pub async fn open(config: Arc<AppConfig>) -> Result<Self, StoreError> {
        let documents = DocumentStore::open(&config.db_path).await?;
        Ok(Self::with_store(config, documents))
    }

    pub fn with_store(config: Arc<AppConfig>, documents: DocumentStore) -> Self {
        Self {
            config,
            documents: Arc::new(documents),
        }
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }
}

pub fn app_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/applications", get(list_applications))
        .route(
            "/applications/{id}",
            get(get_application)
                .put(put_application)
                .delete(delete_application),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/v1", protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
    documents: usize,
}

async fn healthz(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    Ok(Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
        documents: state.documents.len().await?,
    }))
}

async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authorize(state.config.api_token.as_deref(), request.headers())?;
    Ok(next.run(request).await)
}

#[derive(Debug, Serialize)]
struct ApplicationsResponse {
    applications: Vec<ApplicationDocument>,
}

async fn list_applications(
    State(state): State<AppState>,
) -> Result<Json<ApplicationsResponse>, AppError> {
    let applications = state.documents.all().await?;
    tracing::debug!(count = applications.len(), "Listed applications");
    Ok(Json(ApplicationsResponse { applications }))
}

async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationDocument>, AppError> {
    state
        .documents
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(id))
}

async fn put_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut document): Json<ApplicationDocument>,
) -> Result<StatusCode, AppError> {
    match document.id() {
        Some(body_id) if body_id != id => {
            return Err(AppError::bad_request(format!(
                "Body id '{body_id}' does not match path id '{id}'"
            )));
        }
        Some(_) => {}
        None => document.id = Some(id.clone()),
    }

    // Stored documents are always canonical.
    let application = Application::try_from(document)
        .map_err(|error| AppError::bad_request(error.to_string()))?;
    let created = state
        .documents
        .upsert(&id, &ApplicationDocument::from(&application))
        .await?;

    tracing::info!(endpoint = "put_application", id = %id, created, "Stored application");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.documents.remove(&id).await? {
        return Err(AppError::not_found(id));
    }
    tracing::info!(endpoint = "delete_application", id = %id, "Deleted application");
    Ok(StatusCode::NO_CONTENT)
}
