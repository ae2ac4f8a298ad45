use serde::{Deserialize, Serialize};

/// One candidate straight out of the detector, in source-image pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: usize,
}

/// Axis-aligned box, top-left / bottom-right, always `x1 < x2` and `y1 < y2`.
/// Serialized as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[i32; 4]", try_from = "[i32; 4]")]
pub struct BoundingBox {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Option<Self> {
        (x1 < x2 && y1 < y2).then_some(Self { x1, y1, x2, y2 })
    }

    pub fn x1(&self) -> i32 { self.x1 }
    pub fn y1(&self) -> i32 { self.y1 }
    pub fn x2(&self) -> i32 { self.x2 }
    pub fn y2(&self) -> i32 { self.y2 }

    pub fn width(&self) -> u32 { (self.x2 - self.x1) as u32 }
    pub fn height(&self) -> u32 { (self.y2 - self.y1) as u32 }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

impl TryFrom<[i32; 4]> for BoundingBox {
    type Error = String;

    fn try_from([x1, y1, x2, y2]: [i32; 4]) -> Result<Self, Self::Error> {
        BoundingBox::new(x1, y1, x2, y2)
            .ok_or_else(|| format!("degenerate bbox [{x1}, {y1}, {x2}, {y2}]"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub category: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
}

impl Detection {
    /// Resolves the class name and snaps the raw box onto the pixel grid of a
    /// `width`×`height` image. Returns `None` when nothing of the box is left.
    pub fn from_raw(
        raw: &RawDetection,
        class_names: &[String],
        width: u32,
        height: u32,
    ) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let clamp = |v: f32, max: u32| -> i32 {
            // `as` truncates toward zero and saturates NaN to 0
            (v as i32).clamp(0, max as i32 - 1)
        };
        let bbox = BoundingBox::new(
            clamp(raw.x1, width),
            clamp(raw.y1, height),
            clamp(raw.x2, width),
            clamp(raw.y2, height),
        )?;

        let category = class_names
            .get(raw.class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", raw.class_id));

        Some(Self {
            category,
            confidence: round_confidence(raw.score),
            bbox,
        })
    }

    /// `"<category>: <confidence with 2 decimals>"`
    pub fn label(&self) -> String {
        format!("{}: {:.2}", self.category, self.confidence)
    }
}

fn round_confidence(score: f32) -> f64 {
    (score as f64 * 10_000.0).round() / 10_000.0
}

/// Converts a whole detector output, in order, dropping boxes that collapse.
pub fn postprocess(
    raw: &[RawDetection],
    class_names: &[String],
    width: u32,
    height: u32,
) -> Vec<Detection> {
    raw.iter()
        .filter_map(|r| Detection::from_raw(r, class_names, width, height))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["plastic".into(), "paper".into()]
    }

    fn raw(x1: f32, y1: f32, x2: f32, y2: f32, class_id: usize) -> RawDetection {
        RawDetection { x1, y1, x2, y2, score: 0.876_54, class_id }
    }

    fn vga(raw: RawDetection) -> Option<Detection> {
        Detection::from_raw(&raw, &names(), 640, 480)
    }

    #[test]
    fn truncates_coordinates_and_rounds_confidence() {
        let det = vga(raw(10.9, 20.2, 100.7, 80.5, 1)).unwrap();
        assert_eq!(det.category, "paper");
        assert_eq!(<[i32; 4]>::from(det.bbox), [10, 20, 100, 80]);
        assert!((det.confidence - 0.8765).abs() < 1e-9);
        assert_eq!(det.label(), "paper: 0.88");
    }

    #[test]
    fn clamps_to_image_and_drops_collapsed_boxes() {
        let det = vga(raw(-5.0, -3.0, 900.0, 50.0, 0)).unwrap();
        assert_eq!(<[i32; 4]>::from(det.bbox), [0, 0, 639, 50]);

        assert!(vga(raw(700.0, 10.0, 800.0, 20.0, 0)).is_none());
        assert!(vga(raw(10.2, 10.0, 10.8, 20.0, 0)).is_none());
    }

    #[test]
    fn unknown_class_id_gets_placeholder_name() {
        let det = Detection::from_raw(&raw(1.0, 1.0, 5.0, 5.0, 7), &names(), 10, 10).unwrap();
        assert_eq!(det.category, "class_7");
    }

    #[test]
    fn serializes_with_wire_names() {
        let det = Detection {
            category: "glass".into(),
            confidence: 0.5,
            bbox: BoundingBox::new(1, 2, 3, 4).unwrap(),
        };
        let v = serde_json::to_value(&det).unwrap();
        assert_eq!(
            v,
            serde_json::json!({ "class": "glass", "confidence": 0.5, "bbox": [1, 2, 3, 4] })
        );
        assert!(serde_json::from_str::<BoundingBox>("[5, 2, 3, 4]").is_err());
    }
}
