use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use super::detection::Detection;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_items: usize,
    pub categories: BTreeMap<String, usize>,
}

pub fn summarize(detections: &[Detection]) -> Statistics {
    let mut categories = BTreeMap::new();
    for det in detections {
        *categories.entry(det.category.clone()).or_insert(0) += 1;
    }
    Statistics {
        total_items: detections.len(),
        categories,
    }
}
