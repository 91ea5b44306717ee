use crate::detect::result::Detection;

/// Greedy non-maximum suppression followed by score filtering and truncation.
///
/// Candidates below `min_score` are dropped, the rest are visited in descending score
/// order and kept unless they overlap an already kept box of any class by more than
/// `iou_threshold`. At most `max_detections` survive, highest score first.
pub fn suppress(
    mut candidates: Vec<Detection>,
    iou_threshold: f32,
    min_score: f32,
    max_detections: usize,
) -> Vec<Detection> {
    candidates.retain(|d| d.score >= min_score);
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Detection> = Vec::with_capacity(max_detections.min(candidates.len()));
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let overlaps = kept
            .iter()
            .any(|k| k.bbox.iou(&candidate.bbox) > iou_threshold);
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}
