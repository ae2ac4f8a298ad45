use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::application::ports::{DetectorPort, ModelCatalogPort};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{ModelId, YoloParams, DEFAULT_CLASS_NAMES};

pub struct OnnxModelCatalog {
    labels_path: Option<PathBuf>,
    params: YoloParams,
    intra_threads: usize,
}

impl OnnxModelCatalog {
    pub fn new(labels_path: Option<PathBuf>, params: YoloParams, intra_threads: usize) -> Self {
        Self { labels_path, params, intra_threads }
    }

    /// Explicit labels file, else `<model>.names` next to the model, else the
    /// built-in waste classes.
    fn class_names_for(&self, model: &ModelId) -> Vec<String> {
        let candidate = self
            .labels_path
            .clone()
            .unwrap_or_else(|| Path::new(&model.onnx_path).with_extension("names"));

        match std::fs::read_to_string(&candidate) {
            Ok(text) => {
                let names = parse_labels(&text);
                if !names.is_empty() {
                    info!("Loaded {} class names from {}", names.len(), candidate.display());
                    return names;
                }
                warn!("{} has no class names, using built-in table", candidate.display());
            }
            Err(e) if self.labels_path.is_some() => {
                warn!("Could not read labels {}: {e}; using built-in table", candidate.display());
            }
            Err(_) => {}
        }
        DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect()
    }
}

#[async_trait]
impl ModelCatalogPort for OnnxModelCatalog {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()> {
        if model.onnx_path.trim().is_empty() {
            return Err(DomainError::InvalidInput("onnx_path empty".into()));
        }
        if !Path::new(&model.onnx_path).exists() {
            return Err(DomainError::NotFound(format!("Model not found at {}", model.onnx_path)));
        }
        Ok(())
    }

    async fn load(&self, model: &ModelId) -> DomainResult<Arc<dyn DetectorPort>> {
        self.validate_model(model).await?;

        let class_names = self.class_names_for(model);
        let path = model.onnx_path.clone();
        let params = self.params.clone();
        let threads = self.intra_threads;

        let failed = |e: &dyn std::fmt::Display| {
            DomainError::OperationFailed(format!("Failed to load model: {e}"))
        };
        let engine = tokio::task::spawn_blocking(move || {
            OnnxYoloEngine::load(&path, class_names, params, threads)
        })
        .await
        .map_err(|e| failed(&e))?
        .map_err(|e| failed(&e))?;

        info!("Classes: {:?}", engine.class_names());
        Ok(Arc::new(engine))
    }
}

/// One class per line; blank lines and `#` comments are skipped.
pub fn parse_labels(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}
