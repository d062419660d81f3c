//! Box decoding helpers shared by the ONNX detectors.

use crate::shared::face_box::FaceBox;

/// A decoded detection in frame coordinates, corners as `x1,y1,x2,y2`.
///
/// Coordinates are not clamped: the aggregator decides how to treat boxes
/// that hang off the frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub score: f64,
}

impl RawDetection {
    pub fn to_face_box(&self) -> FaceBox {
        let x = self.x1.round() as i32;
        let y = self.y1.round() as i32;
        let width = (self.x2.round() as i32).saturating_sub(x);
        let height = (self.y2.round() as i32).saturating_sub(y);
        FaceBox::new(x, y, width, height).with_confidence(self.score as f32)
    }

    fn iou(&self, other: &RawDetection) -> f64 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        let area_a = (self.x2 - self.x1) * (self.y2 - self.y1);
        let area_b = (other.x2 - other.x1) * (other.y2 - other.y1);
        inter / (area_a + area_b - inter)
    }
}

/// Greedy NMS: highest score first, suppressing any later box whose IoU with
/// a kept box exceeds `iou_thresh`. Output is sorted by descending score.
pub fn nms(mut dets: Vec<RawDetection>, iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<RawDetection> = Vec::with_capacity(dets.len());
    for det in dets {
        if keep.iter().all(|k| k.iou(&det) <= iou_thresh) {
            keep.push(det);
        }
    }
    keep
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f64, y1: f64, x2: f64, y2: f64, score: f64) -> RawDetection {
        RawDetection {
            x1,
            y1,
            x2,
            y2,
            score,
        }
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let kept = nms(
            vec![
                det(0.0, 0.0, 100.0, 100.0, 0.9),
                det(5.0, 5.0, 105.0, 105.0, 0.8),
            ],
            0.3,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_nms_keeps_separate_boxes() {
        let kept = nms(
            vec![
                det(0.0, 0.0, 50.0, 50.0, 0.9),
                det(200.0, 200.0, 250.0, 250.0, 0.8),
            ],
            0.3,
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_nms_higher_score_wins_regardless_of_input_order() {
        let kept = nms(
            vec![
                det(0.0, 0.0, 100.0, 100.0, 0.5),
                det(2.0, 2.0, 102.0, 102.0, 0.9),
            ],
            0.3,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(nms(Vec::new(), 0.3).is_empty());
    }

    #[test]
    fn test_to_face_box_keeps_off_frame_coordinates() {
        let b = det(-12.4, -3.6, 40.2, 50.0, 0.75).to_face_box();
        assert_eq!((b.x, b.y, b.width, b.height), (-12, -4, 52, 54));
        assert_eq!(b.confidence, Some(0.75));
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!((sigmoid(10.0) - 1.0).abs() < 0.001);
        assert!(sigmoid(-10.0) < 0.001);
    }
}
