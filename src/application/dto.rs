use serde::{de::IgnoredAny, Deserialize, Serialize};

use crate::domain::{detection::Detection, stats::Statistics};

/// The `file` part of a `/detect` form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Threshold as sent by a client: a JSON number, or text from a form field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ConfidenceField {
    Number(f64),
    Text(String),
    /// Booleans, arrays, objects: kept so the request still parses, then rejected.
    Unsupported(IgnoredAny),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameRequest {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub confidence: Option<ConfidenceField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadDetectionResponse {
    pub success: bool,
    pub original_image: String,
    pub detected_image: String,
    pub detections: Vec<Detection>,
    pub statistics: Statistics,
    pub confidence_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameDetectionResponse {
    pub success: bool,
    pub annotated_image: String,
    pub detections: Vec<Detection>,
    pub statistics: Statistics,
    pub confidence_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub model_path: String,
    pub upload_folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { success: false, error: error.into() }
    }
}
