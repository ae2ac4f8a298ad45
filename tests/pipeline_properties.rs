// Properties of detect → annotate → summarize on arbitrary detector output.

use image::{Rgb, RgbImage};
use proptest::prelude::*;

use waste_vision::application::ports::DetectorPort;
use waste_vision::application::services::run_detection;
use waste_vision::domain::detection::RawDetection;
use waste_vision::domain::errors::DomainResult;
use waste_vision::domain::model::DEFAULT_CLASS_NAMES;
use waste_vision::domain::stats::summarize;
use waste_vision::imaging::annotator::Annotator;

struct Replay {
    names: Vec<String>,
    raw: Vec<RawDetection>,
}

impl DetectorPort for Replay {
    fn detect(&self, _image: &RgbImage, _conf: f32) -> DomainResult<Vec<RawDetection>> {
        Ok(self.raw.clone())
    }

    fn class_names(&self) -> &[String] {
        &self.names
    }
}

fn raw_detection() -> impl Strategy<Value = RawDetection> {
    (
        -20.0f32..220.0,
        -20.0f32..220.0,
        1.0f32..120.0,
        1.0f32..120.0,
        0.0f32..1.0,
        0usize..8,
    )
        .prop_map(|(x, y, w, h, score, class_id)| RawDetection {
            x1: x,
            y1: y,
            x2: x + w,
            y2: y + h,
            score,
            class_id,
        })
}

proptest! {
    #[test]
    fn statistics_cover_every_detection(
        raw in proptest::collection::vec(raw_detection(), 0..24),
        w in 8u32..200,
        h in 8u32..200,
    ) {
        let detector = Replay {
            names: DEFAULT_CLASS_NAMES.map(String::from).to_vec(),
            raw,
        };
        let input = RgbImage::from_pixel(w, h, Rgb([12, 34, 56]));
        let pristine = input.clone();

        let (annotated, detections) =
            run_detection(&detector, &Annotator::default(), &input, 0.25).unwrap();
        let stats = summarize(&detections);

        prop_assert_eq!(annotated.dimensions(), (w, h));
        prop_assert_eq!(&input, &pristine);
        prop_assert_eq!(stats.total_items, detections.len());
        prop_assert_eq!(stats.categories.values().sum::<usize>(), detections.len());
        for d in &detections {
            let [x1, y1, x2, y2]: [i32; 4] = d.bbox.into();
            prop_assert!(x1 < x2 && y1 < y2);
            prop_assert!(x2 < w as i32 && y2 < h as i32);
            prop_assert!((0.0..=1.0).contains(&d.confidence));
        }
    }
}
