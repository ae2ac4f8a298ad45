use clap::Parser;
use std::path::PathBuf;

use crate::domain::model::YoloParams;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Waste detection web service.
#[derive(Debug, Clone, Parser)]
#[command(name = "waste-vision", version, about)]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(long, env = "WASTE_VISION_BIND", default_value = "0.0.0.0:5000")]
    pub bind: String,

    /// ONNX export of the trained detector.
    #[arg(long, env = "WASTE_VISION_MODEL_PATH", default_value = "models/best.onnx")]
    pub model_path: PathBuf,

    /// Class names, one per line. Defaults to `<model>.names` when present.
    #[arg(long, env = "WASTE_VISION_LABELS_PATH")]
    pub labels_path: Option<PathBuf>,

    #[arg(long, env = "WASTE_VISION_UPLOAD_DIR", default_value = "static/uploads")]
    pub upload_dir: PathBuf,

    /// Served under `/static`.
    #[arg(long, env = "WASTE_VISION_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    #[arg(long, env = "WASTE_VISION_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    #[arg(long, env = "WASTE_VISION_INPUT_SIZE", default_value_t = 640)]
    pub input_size: u32,

    #[arg(long, env = "WASTE_VISION_IOU_THRESHOLD", default_value_t = 0.45)]
    pub iou_threshold: f32,

    #[arg(long, env = "WASTE_VISION_MAX_DETECTIONS", default_value_t = 100)]
    pub max_detections: usize,

    /// ONNX Runtime intra-op threads.
    #[arg(long, env = "WASTE_VISION_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,
}

impl ServerConfig {
    pub fn yolo_params(&self) -> YoloParams {
        YoloParams {
            input_size: self.input_size,
            iou_threshold: self.iou_threshold,
            max_detections: self.max_detections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_service() {
        let cfg = ServerConfig::parse_from(["waste-vision"]);
        assert_eq!(cfg.bind, "0.0.0.0:5000");
        assert_eq!(cfg.model_path, PathBuf::from("models/best.onnx"));
        assert_eq!(cfg.upload_dir, PathBuf::from("static/uploads"));
        assert_eq!(cfg.max_upload_bytes, 16 * 1024 * 1024);
        assert!(cfg.labels_path.is_none());
        assert_eq!(cfg.yolo_params().input_size, 640);
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = ServerConfig::parse_from([
            "waste-vision",
            "--model-path",
            "/srv/m.onnx",
            "--iou-threshold",
            "0.6",
            "--max-detections",
            "20",
        ]);
        assert_eq!(cfg.model_path, PathBuf::from("/srv/m.onnx"));
        let params = cfg.yolo_params();
        assert_eq!(params.iou_threshold, 0.6);
        assert_eq!(params.max_detections, 20);
    }
}
