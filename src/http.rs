//! HTTP surface: maps browser actions onto session transitions and answers
//! with the re-rendered view.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::analysis::AnalysisClient;
use crate::error::AppError;
use crate::page;
use crate::render::render_session;
use crate::schema::AnalysisMode;
use crate::session::{SessionController, SessionSnapshot};
use crate::store::SessionStore;
use crate::upload::FileUpload;

/// Request bodies up to this size reach the handlers, so an oversize image
/// is reported by the upload check instead of being cut off with a 413.
pub const MAX_REQUEST_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn AnalysisClient>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(client: Arc<dyn AnalysisClient>) -> Self {
        Self::with_sessions(client, Arc::new(SessionStore::default()))
    }

    pub fn with_sessions(client: Arc<dyn AnalysisClient>, sessions: Arc<SessionStore>) -> Self {
        Self { client, sessions }
    }

    async fn session(&self, id: Uuid) -> Result<Arc<SessionController>, ApiError> {
        self.sessions
            .get(id)
            .await
            .ok_or(ApiError::SessionNotFound(id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("session {0} not found")]
    SessionNotFound(Uuid),
    #[error("too many active sessions, try again later")]
    TooManySessions,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManySessions => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectModeRequest {
    pub mode: AnalysisMode,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/:id",
            get(get_session).delete(delete_session),
        )
        .route("/api/sessions/:id/view", get(view))
        .route("/api/sessions/:id/mode", post(select_mode))
        .route(
            "/api/sessions/:id/image",
            post(upload_image).delete(change_image),
        )
        .route("/api/sessions/:id/analyze", post(analyze))
        .route("/api/sessions/:id/reset", post(reset))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

fn fragment(snapshot: &SessionSnapshot) -> Html<String> {
    Html(render_session(snapshot))
}

async fn index() -> Html<String> {
    Html(page::index_page())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let id = state
        .sessions
        .create(state.client.clone())
        .await
        .ok_or(ApiError::TooManySessions)?;
    tracing::info!("Created session {}", id);
    Ok((StatusCode::CREATED, Json(json!({ "session_id": id }))))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = state.session(id).await?;
    Ok(Json(session.snapshot().await))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(id).await {
        tracing::info!("Closed session {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

async fn view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
    let session = state.session(id).await?;
    Ok(fragment(&session.snapshot().await))
}

async fn select_mode(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectModeRequest>,
) -> Result<Html<String>, ApiError> {
    let session = state.session(id).await?;
    Ok(fragment(&session.select_mode(request.mode).await))
}

async fn upload_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Html<String>, ApiError> {
    let session = state.session(id).await?;
    let snapshot = match read_image_field(&mut multipart).await {
        Ok(file) => session.upload_image(file).await,
        Err(err) => session.reject_upload(err).await,
    };
    Ok(fragment(&snapshot))
}

async fn read_image_field(multipart: &mut Multipart) -> Result<FileUpload, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        return Ok(FileUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(AppError::DecodeError("no image field in upload".into()))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::FileTooLarge {
            size: MAX_REQUEST_BYTES,
        }
    } else {
        AppError::DecodeError(err.body_text())
    }
}

async fn change_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
    let session = state.session(id).await?;
    Ok(fragment(&session.change_image().await))
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
    let session = state.session(id).await?;
    Ok(fragment(&session.analyze().await))
}

async fn reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
    let session = state.session(id).await?;
    Ok(fragment(&session.reset().await))
}
