//! Per-frame aggregation of detections by class.

use crate::detect::{to_percent, Detection};

#[derive(Clone, Debug, PartialEq)]
pub struct TallyEntry {
    pub class: String,
    pub count: u32,
    pub max_confidence: f32,
}

impl TallyEntry {
    /// `Count: <n> | <p>%`
    pub fn summary(&self) -> String {
        format!("Count: {} | {}%", self.count, to_percent(self.max_confidence))
    }
}

/// Classes seen in one frame, in order of first appearance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectTally {
    entries: Vec<TallyEntry>,
}

impl ObjectTally {
    pub fn from_detections(detections: &[Detection]) -> Self {
        let mut entries: Vec<TallyEntry> = Vec::new();
        for detection in detections {
            match entries.iter_mut().find(|e| e.class == detection.class) {
                Some(entry) => {
                    entry.count += 1;
                    entry.max_confidence = entry.max_confidence.max(detection.score);
                }
                None => entries.push(TallyEntry {
                    class: detection.class.clone(),
                    count: 1,
                    max_confidence: detection.score,
                }),
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[TallyEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BBox;

    fn det(class: &str, score: f32) -> Detection {
        Detection::new(class, score, BBox::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn merges_same_class_and_keeps_max() {
        let tally = ObjectTally::from_detections(&[det("cup", 0.7), det("cup", 0.9)]);
        assert_eq!(tally.entries().len(), 1);
        let entry = &tally.entries()[0];
        assert_eq!(entry.count, 2);
        assert_eq!(entry.summary(), "Count: 2 | 90%");
    }

    #[test]
    fn preserves_first_appearance_order() {
        let tally = ObjectTally::from_detections(&[
            det("person", 0.8),
            det("bottle", 0.6),
            det("person", 0.55),
            det("cup", 0.51),
        ]);
        let classes: Vec<&str> = tally.entries().iter().map(|e| e.class.as_str()).collect();
        assert_eq!(classes, vec!["person", "bottle", "cup"]);
        assert_eq!(tally.entries()[0].count, 2);
        assert_eq!(tally.entries()[0].max_confidence, 0.8);
    }

    #[test]
    fn no_detections_is_empty() {
        assert!(ObjectTally::from_detections(&[]).is_empty());
    }
}
