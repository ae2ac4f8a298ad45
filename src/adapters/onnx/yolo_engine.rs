use anyhow::{anyhow, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4, ArrayView2, ArrayViewD, Axis, Ix2, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use std::fs;
use std::sync::Mutex;
use tracing::debug;

use crate::application::ports::DetectorPort;
use crate::domain::detection::RawDetection;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::YoloParams;

/// YOLOv8-style ONNX export: one input `[1,3,S,S]`, one output `[1,4+nc,N]`.
pub struct OnnxYoloEngine {
    // `Session::run` takes `&mut self`; requests queue on this lock.
    session: Mutex<Session>,
    class_names: Vec<String>,
    params: YoloParams,
}

impl OnnxYoloEngine {
    pub fn load(
        path: &str,
        class_names: Vec<String>,
        params: YoloParams,
        intra_threads: usize,
    ) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(intra_threads)?;

        // CUDA is optional: registered when available, CPU otherwise.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        Ok(Self {
            session: Mutex::new(session),
            class_names,
            params,
        })
    }

    pub fn infer(&self, rgb: &RgbImage, conf_threshold: f32) -> Result<Vec<RawDetection>> {
        let imgsz = self.params.input_size as usize;
        let resized =
            image::imageops::resize(rgb, imgsz as u32, imgsz as u32, FilterType::Triangle);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let (data, _) = input.into_raw_vec_and_offset();
        let input_tensor = Value::from_array((input_shape, data))?;

        let sx = rgb.width() as f32 / imgsz as f32;
        let sy = rgb.height() as f32 / imgsz as f32;

        let candidates = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow!("ONNX session lock poisoned"))?;
            let outputs = session.run(ort::inputs![input_tensor])?;
            let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

            let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
            let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
            let view = array_view.index_axis(Axis(0), 0).into_dimensionality::<Ix2>()?;
            decode_predictions(view, conf_threshold, sx, sy)
        };

        debug!("{} candidates above {:.2}", candidates.len(), conf_threshold);
        Ok(non_max_suppression(candidates, self.params.iou_threshold, self.params.max_detections))
    }
}

impl DetectorPort for OnnxYoloEngine {
    fn detect(&self, image: &RgbImage, conf_threshold: f32) -> DomainResult<Vec<RawDetection>> {
        self.infer(image, conf_threshold)
            .map_err(|e| DomainError::DetectionFailed(e.to_string()))
    }

    fn class_names(&self) -> &[String] {
        &self.class_names
    }
}

/// Rows 0..4 are cx, cy, w, h in model-input pixels, the rest are class
/// scores; one column per candidate. Boxes come back in source-image pixels.
pub fn decode_predictions(
    view: ArrayView2<f32>,
    conf_threshold: f32,
    sx: f32,
    sy: f32,
) -> Vec<RawDetection> {
    if view.shape()[0] <= 4 {
        return Vec::new();
    }
    let num_candidates = view.shape()[1];
    let mut detections = Vec::new();

    for i in 0..num_candidates {
        let scores = view.slice(s![4.., i]);
        let Some((class_id, max_score)) = scores
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (idx, v)| match best {
                Some((_, b)) if b >= v => best,
                _ => Some((idx, v)),
            })
        else {
            continue;
        };

        if max_score > conf_threshold {
            let cx = view[[0, i]];
            let cy = view[[1, i]];
            let w = view[[2, i]];
            let h = view[[3, i]];

            detections.push(RawDetection {
                x1: (cx - w / 2.0) * sx,
                y1: (cy - h / 2.0) * sy,
                x2: (cx + w / 2.0) * sx,
                y2: (cy + h / 2.0) * sy,
                score: max_score,
                class_id,
            });
        }
    }
    detections
}

fn iou(a: &RawDetection, b: &RawDetection) -> f32 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let inter = ix * iy;
    let area = |d: &RawDetection| (d.x2 - d.x1).max(0.0) * (d.y2 - d.y1).max(0.0);
    let union = area(a) + area(b) - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

/// Greedy per-class NMS, highest score first, capped at `max_detections`.
pub fn non_max_suppression(
    mut candidates: Vec<RawDetection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<RawDetection> {
    candidates.sort_unstable_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<RawDetection> = Vec::new();
    for cand in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == cand.class_id && iou(k, &cand) > iou_threshold);
        if !suppressed {
            kept.push(cand);
        }
    }
    kept
}
