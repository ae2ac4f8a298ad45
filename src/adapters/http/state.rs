use std::sync::Arc;
use crate::application::services::DetectionService;

/// Estado compartido para los manejadores HTTP de Axum.
#[derive(Clone)]
pub struct HttpState {
    /// Casos de uso de detección (subida y frame de cámara) y el gate del modelo.
    pub detection: Arc<DetectionService>,
    /// Tope de cuerpo de petición, en bytes.
    pub max_upload_bytes: usize,
}

impl HttpState {
    pub fn max_upload_mb(&self) -> u64 {
        (self.max_upload_bytes / (1024 * 1024)) as u64
    }
}
