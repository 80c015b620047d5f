//! EcoGuard: upload a photo, pick waste classification or disease-risk
//! prediction, and get a structured answer back from Google Gemini.

pub mod analysis;
pub mod config;
pub mod error;
pub mod http;
pub mod page;
pub mod render;
pub mod schema;
pub mod session;
pub mod store;
pub mod upload;

pub use analysis::{AnalysisClient, GeminiClient};
pub use config::Config;
pub use error::{AppError, Result};
pub use http::{build_router, AppState};
pub use schema::{AnalysisMode, AnalysisResult};
pub use session::{SessionController, SessionSnapshot, View};
pub use store::SessionStore;
pub use upload::{validate_and_load, FileUpload, UploadedImage, MAX_UPLOAD_BYTES};
