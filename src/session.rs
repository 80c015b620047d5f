//! Per-session view controller.
//!
//! A session moves Home → Analyzing → Result and back to Home on reset.
//! [`SessionController`] is the only writer of a session's state; everything
//! else works from [`SessionSnapshot`] copies.
//!
//! An analysis releases the state lock while the model call is in flight.
//! `busy` keeps a second analysis from starting in the meantime, and the
//! epoch (bumped on every reset) lets a late reply notice that the session it
//! was started for no longer exists, in which case the reply is dropped.
//!
//! The model call and the write-back that clears `busy` run on their own
//! task, so a caller that goes away mid-analysis (a closed connection, a
//! timeout) never leaves the session stuck.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::analysis::AnalysisClient;
use crate::error::{AppError, Result};
use crate::schema::{AnalysisMode, AnalysisResult};
use crate::upload::{self, FileUpload, UploadedImage};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum View {
    #[default]
    Home,
    Analyzing,
    Result,
}

#[derive(Debug, Default)]
struct SessionState {
    view: View,
    mode: Option<AnalysisMode>,
    image: Option<UploadedImage>,
    result: Option<AnalysisResult>,
    error: Option<String>,
    busy: bool,
    progress_message: Option<String>,
    epoch: u64,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            view: self.view,
            mode: self.mode,
            image: self.image.clone(),
            result: self.result.clone(),
            error: self.error.clone(),
            busy: self.busy,
            progress_message: self.progress_message.clone(),
        }
    }

    fn accepts_image_changes(&self) -> bool {
        self.view == View::Analyzing && !self.busy
    }
}

/// Read-only copy of a session, the renderer's only input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub view: View,
    pub mode: Option<AnalysisMode>,
    pub image: Option<UploadedImage>,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
    pub busy: bool,
    pub progress_message: Option<String>,
}

impl SessionSnapshot {
    /// State of a fresh session.
    pub fn initial() -> Self {
        SessionState::default().snapshot()
    }
}

pub struct SessionController {
    client: Arc<dyn AnalysisClient>,
    state: Arc<Mutex<SessionState>>,
}

impl SessionController {
    pub fn new(client: Arc<dyn AnalysisClient>) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Home → Analyzing. The mode stays fixed until reset.
    pub async fn select_mode(&self, mode: AnalysisMode) -> SessionSnapshot {
        let mut state = self.state.lock().await;
        if state.view != View::Home {
            tracing::debug!("Ignoring mode selection outside Home ({:?})", state.view);
            return state.snapshot();
        }

        state.mode = Some(mode);
        state.image = None;
        state.result = None;
        state.error = None;
        state.view = View::Analyzing;
        tracing::info!("Session entered {:?} mode", mode);
        state.snapshot()
    }

    /// Validate and store an uploaded file, or record why it was refused.
    pub async fn upload_image(&self, file: FileUpload) -> SessionSnapshot {
        let epoch = {
            let state = self.state.lock().await;
            if !state.accepts_image_changes() {
                tracing::debug!("Ignoring upload (view {:?}, busy {})", state.view, state.busy);
                return state.snapshot();
            }
            state.epoch
        };

        let loaded = upload::validate_and_load(file).await;
        self.store_upload(epoch, loaded).await
    }

    async fn store_upload(&self, epoch: u64, loaded: Result<UploadedImage>) -> SessionSnapshot {
        let mut state = self.state.lock().await;
        if state.epoch != epoch || !state.accepts_image_changes() {
            tracing::debug!("Dropping upload that finished after the session moved on");
            return state.snapshot();
        }
        match loaded {
            Ok(image) => {
                tracing::info!("Stored {} image ({} bytes)", image.mime_type, image.size_bytes);
                state.image = Some(image);
                state.error = None;
            }
            Err(err) => {
                tracing::warn!("Upload rejected: {}", err);
                state.image = None;
                state.error = Some(err.user_message().to_string());
            }
        }
        state.snapshot()
    }

    /// Record an upload that failed before a file could be extracted.
    pub async fn reject_upload(&self, err: AppError) -> SessionSnapshot {
        let mut state = self.state.lock().await;
        if state.accepts_image_changes() {
            tracing::warn!("Upload rejected: {}", err);
            state.image = None;
            state.error = Some(err.user_message().to_string());
        }
        state.snapshot()
    }

    /// Drop the current image so another can be uploaded.
    pub async fn change_image(&self) -> SessionSnapshot {
        let mut state = self.state.lock().await;
        if state.accepts_image_changes() {
            state.image = None;
            state.error = None;
        }
        state.snapshot()
    }

    /// Run the analysis for the current mode and image.
    ///
    /// A no-op unless a mode and an image are present and no analysis is
    /// already running. Failures keep the image so the user can retry.
    pub async fn analyze(&self) -> SessionSnapshot {
        let (mode, image, epoch) = {
            let mut state = self.state.lock().await;
            let (Some(mode), Some(image)) = (state.mode, state.image.clone()) else {
                tracing::debug!("Analyze ignored: mode or image missing");
                return state.snapshot();
            };
            if state.view != View::Analyzing || state.busy {
                tracing::debug!("Analyze ignored (view {:?}, busy {})", state.view, state.busy);
                return state.snapshot();
            }

            state.busy = true;
            state.progress_message = Some(mode.progress_message().to_string());
            state.error = None;
            state.result = None;
            (mode, image, state.epoch)
        };

        let client = self.client.clone();
        let state = self.state.clone();
        let task = tokio::spawn(async move {
            let call = tokio::spawn(async move { client.analyze(mode, &image).await });
            let outcome = match call.await {
                Ok(outcome) => outcome,
                Err(err) => Err(AppError::RequestError(format!("analysis task failed: {}", err))),
            };
            let outcome = outcome.and_then(|result| {
                if result.mode() == mode {
                    Ok(result)
                } else {
                    Err(AppError::ResponseParseError(format!(
                        "expected {:?} result, got {:?}",
                        mode,
                        result.mode()
                    )))
                }
            });
            finish_analysis(&state, mode, epoch, outcome).await
        });

        match task.await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::error!("{:?} analysis task did not complete: {}", mode, err);
                self.snapshot().await
            }
        }
    }

    /// Back to Home from any state. In-flight work started before the reset
    /// is ignored when it completes.
    pub async fn reset(&self) -> SessionSnapshot {
        let mut state = self.state.lock().await;
        let epoch = state.epoch.wrapping_add(1);
        *state = SessionState {
            epoch,
            ..SessionState::default()
        };
        state.snapshot()
    }
}

async fn finish_analysis(
    state: &Mutex<SessionState>,
    mode: AnalysisMode,
    epoch: u64,
    outcome: Result<AnalysisResult>,
) -> SessionSnapshot {
    let mut state = state.lock().await;
    if state.epoch != epoch {
        tracing::debug!("Discarding {:?} analysis that finished after a reset", mode);
        return state.snapshot();
    }

    state.busy = false;
    state.progress_message = None;
    match outcome {
        Ok(result) => {
            state.result = Some(result);
            state.view = View::Result;
        }
        Err(err) => {
            tracing::error!("{:?} analysis failed: {}", mode, err);
            state.error = Some(err.user_message().to_string());
        }
    }
    state.snapshot()
}
