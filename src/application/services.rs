use image::RgbImage;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use crate::{
    application::{
        dto::{
            ConfidenceField, FrameDetectionResponse, FrameRequest, HealthResponse,
            UploadDetectionResponse, UploadedFile,
        },
        ports::{DetectorPort, StoredFile, UploadStorePort},
    },
    domain::{
        detection::{postprocess, Detection},
        errors::{DomainError, DomainResult},
        model::{ModelId, DEFAULT_CONFIDENCE},
        stats::summarize,
        upload::{validate_filename, DETECTED_PREFIX},
    },
    imaging::{annotator::Annotator, codec},
};

pub const CONFIDENCE_RANGE_MSG: &str = "Confidence threshold must be between 0.0 and 1.0";

/// Handle del detector: se instala una sola vez al arrancar y después solo se lee.
/// Mientras esté vacío, todo endpoint que dependa del modelo responde 500.
pub struct ModelGate {
    model: ModelId,
    slot: OnceLock<Arc<dyn DetectorPort>>,
}

impl ModelGate {
    pub fn new(model: ModelId) -> Self {
        Self { model, slot: OnceLock::new() }
    }

    /// Returns `false` if a detector was already installed.
    pub fn install(&self, detector: Arc<dyn DetectorPort>) -> bool {
        self.slot.set(detector).is_ok()
    }

    pub fn is_ready(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn model(&self) -> &ModelId {
        &self.model
    }

    pub fn detector(&self) -> DomainResult<Arc<dyn DetectorPort>> {
        self.slot
            .get()
            .cloned()
            .ok_or_else(|| DomainError::ModelUnavailable(self.model.onnx_path.clone()))
    }
}

/// Detect → annotate on an in-memory raster. Blocking: run it off the async runtime.
pub fn run_detection(
    detector: &dyn DetectorPort,
    annotator: &Annotator,
    image: &RgbImage,
    conf_threshold: f32,
) -> DomainResult<(RgbImage, Vec<Detection>)> {
    let raw = detector.detect(image, conf_threshold)?;
    let detections = postprocess(&raw, detector.class_names(), image.width(), image.height());
    let annotated = annotator.annotate(image, &detections);
    Ok((annotated, detections))
}

/// Missing → default; otherwise must parse to a finite value in [0, 1].
pub fn resolve_confidence(field: Option<&ConfidenceField>) -> DomainResult<f32> {
    let value = match field {
        None => return Ok(DEFAULT_CONFIDENCE),
        Some(ConfidenceField::Text(s)) if s.trim().is_empty() => return Ok(DEFAULT_CONFIDENCE),
        Some(ConfidenceField::Number(v)) => Some(*v),
        Some(ConfidenceField::Text(s)) => s.trim().parse::<f64>().ok(),
        Some(ConfidenceField::Unsupported(_)) => None,
    };
    match value {
        Some(v) if v.is_finite() && (0.0..=1.0).contains(&v) => Ok(v as f32),
        _ => Err(DomainError::InvalidInput(CONFIDENCE_RANGE_MSG.into())),
    }
}

/// Orquestador de los dos flujos de detección (subida de fichero y frame de cámara).
#[derive(Clone)]
pub struct DetectionService {
    gate: Arc<ModelGate>,
    store: Arc<dyn UploadStorePort>,
    annotator: Arc<Annotator>,
}

impl DetectionService {
    pub fn new(
        gate: Arc<ModelGate>,
        store: Arc<dyn UploadStorePort>,
        annotator: Arc<Annotator>,
    ) -> Self {
        Self { gate, store, annotator }
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy".into(),
            model_loaded: self.gate.is_ready(),
            model_path: self.gate.model().onnx_path.clone(),
            upload_folder: self.store.location(),
        }
    }

    /// Upload flow: validate, persist, detect, write the annotated copy,
    /// aggregate. Any failure after the upload is on disk removes what this
    /// request wrote.
    pub async fn detect_upload(
        &self,
        file: Option<UploadedFile>,
        confidence: Option<ConfidenceField>,
    ) -> DomainResult<UploadDetectionResponse> {
        let detector = self.gate.detector()?;

        let file = file.ok_or_else(|| DomainError::InvalidInput("No file uploaded".into()))?;
        let ext = validate_filename(&file.filename)?;
        let confidence = resolve_confidence(confidence.as_ref())?;

        let original = self
            .store
            .persist(&file.filename, &file.bytes)
            .await
            .map_err(|e| DomainError::DetectionFailed(format!("Detection failed: {e}")))?;

        match self.process_upload(detector, &original, &ext, file.bytes, confidence).await {
            Ok(response) => {
                info!(
                    "{}: {} items at conf {:.2}",
                    original.file_name, response.statistics.total_items, confidence
                );
                Ok(response)
            }
            Err(e) => {
                self.cleanup(&original).await;
                Err(DomainError::DetectionFailed(format!("Detection failed: {e}")))
            }
        }
    }

    async fn process_upload(
        &self,
        detector: Arc<dyn DetectorPort>,
        original: &StoredFile,
        ext: &str,
        bytes: Vec<u8>,
        confidence: f32,
    ) -> DomainResult<UploadDetectionResponse> {
        let format = codec::format_for_extension(ext)
            .ok_or_else(|| DomainError::OperationFailed(format!("no encoder for .{ext}")))?;
        let annotator = self.annotator.clone();

        let (detections, encoded) = tokio::task::spawn_blocking(move || -> DomainResult<_> {
            let image = codec::decode_rgb(&bytes)
                .map_err(|e| DomainError::DetectionFailed(format!("Could not read image: {e}")))?;
            let (annotated, detections) =
                run_detection(detector.as_ref(), &annotator, &image, confidence)?;
            let encoded = codec::encode(&annotated, format)
                .map_err(|e| DomainError::OperationFailed(format!("Could not encode image: {e}")))?;
            Ok((detections, encoded))
        })
        .await
        .map_err(|e| DomainError::OperationFailed(e.to_string()))??;

        let output = self.store.persist_derived(original, DETECTED_PREFIX, &encoded).await?;
        let statistics = summarize(&detections);

        Ok(UploadDetectionResponse {
            success: true,
            original_image: original.url.clone(),
            detected_image: output.url,
            detections,
            statistics,
            confidence_threshold: confidence,
        })
    }

    /// Best effort: errors are logged and never replace the original failure.
    async fn cleanup(&self, original: &StoredFile) {
        let output = self.store.derived(original, DETECTED_PREFIX);
        for file in [original, &output] {
            if let Err(e) = self.store.remove(file).await {
                warn!("cleanup of {} failed: {e}", file.file_name);
            }
        }
    }

    /// Camera flow: everything stays in memory, nothing to clean up.
    pub async fn detect_frame(
        &self,
        request: Option<FrameRequest>,
    ) -> DomainResult<FrameDetectionResponse> {
        let detector = self.gate.detector()?;

        let request = request.unwrap_or_default();
        let payload = request
            .image
            .ok_or_else(|| DomainError::InvalidInput("No image data provided".into()))?;
        let confidence = resolve_confidence(request.confidence.as_ref())?;
        let annotator = self.annotator.clone();

        let failed = |e: &dyn std::fmt::Display| {
            DomainError::DetectionFailed(format!("Frame detection failed: {e}"))
        };
        let (annotated_image, detections) =
            tokio::task::spawn_blocking(move || -> DomainResult<_> {
                let frame = codec::decode_base64_image(&payload)
                    .ok_or_else(|| DomainError::InvalidInput("Failed to decode image".into()))?;

                let (annotated, detections) =
                    run_detection(detector.as_ref(), &annotator, &frame, confidence)
                        .map_err(|e| failed(&e))?;
                let data_url = codec::to_jpeg_data_url(&annotated).map_err(|e| failed(&e))?;
                Ok((data_url, detections))
            })
            .await
            .map_err(|e| failed(&e))??;

        let statistics = summarize(&detections);
        Ok(FrameDetectionResponse {
            success: true,
            annotated_image,
            detections,
            statistics,
            confidence_threshold: confidence,
        })
    }
}
