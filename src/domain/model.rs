use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelId {
    pub name: String,       // logical name, e.g. "best"
    pub onnx_path: String,  // filesystem path
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoloParams {
    pub input_size: u32,        // 640 typical
    pub iou_threshold: f32,     // 0..1
    pub max_detections: usize,  // e.g. 300
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            iou_threshold: 0.45,
            max_detections: 100,
        }
    }
}

/// Confidence threshold used when the caller does not send one.
pub const DEFAULT_CONFIDENCE: f32 = 0.25;

/// Class table used when the model ships without a labels file.
pub const DEFAULT_CLASS_NAMES: [&str; 6] =
    ["plastic", "paper", "metal", "glass", "organic", "cardboard"];
