//! BlazeFace short-range detector on ONNX Runtime.
//!
//! The fast, lower-recall face locator: a single 128x128 pass with no
//! letterboxing, suited to webcam-style close-up faces.

use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;
use crate::shared::onnx_session::load_session;

use super::math::{nms, sigmoid, RawDetection};

const INPUT_SIZE: u32 = 128;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const NMS_IOU_THRESH: f64 = 0.3;

/// 16x16 grid x 2 anchors + 8x8 grid x 6 anchors.
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output: box (4) + 6 keypoints (12).
const REGRESSOR_STRIDE: usize = 16;

pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: load_session(model_path)?,
            confidence,
            anchors: generate_anchors(),
        })
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(Vec::new());
        }

        let input = ort::value::Tensor::from_array(preprocess(frame, INPUT_SIZE))?;
        let outputs = self.session.run(ort::inputs![input])?;

        // regressors: [1, 896, 16], classificators: [1, 896, 1]
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }
        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        let dets = decode(
            reg_data,
            score_data,
            &self.anchors,
            self.confidence as f32,
            frame.width(),
            frame.height(),
        );

        Ok(nms(dets, NMS_IOU_THRESH)
            .iter()
            .map(RawDetection::to_face_box)
            .collect())
    }
}

/// Turns anchor-relative regressions into frame-space boxes above `threshold`.
fn decode(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    threshold: f32,
    frame_width: u32,
    frame_height: u32,
) -> Vec<RawDetection> {
    let size = INPUT_SIZE as f32;
    let fw = frame_width as f32;
    let fh = frame_height as f32;

    score_data
        .iter()
        .zip(anchors)
        .enumerate()
        .filter_map(|(i, (&raw_score, anchor))| {
            let score = sigmoid(raw_score);
            if score < threshold {
                return None;
            }
            let reg = reg_data.get(i * REGRESSOR_STRIDE..i * REGRESSOR_STRIDE + 4)?;
            let cx = anchor[0] + reg[0] / size;
            let cy = anchor[1] + reg[1] / size;
            let w = reg[2] / size;
            let h = reg[3] / size;
            Some(RawDetection {
                x1: ((cx - w / 2.0) * fw) as f64,
                y1: ((cy - h / 2.0) * fh) as f64,
                x2: ((cx + w / 2.0) * fw) as f64,
                y2: ((cy + h / 2.0) * fh) as f64,
                score: score as f64,
            })
        })
        .collect()
}

/// Nearest-neighbour resize to `size x size`, normalized to [0,1], NCHW.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    ndarray::Array4::from_shape_fn((1, 3, s, s), |(_, c, y, x)| {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
        src[[src_y, src_x, c]] as f32 / 255.0
    })
}

fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, per_cell) in &strides {
        let grid = INPUT_SIZE as usize / stride;
        for y in 0..grid {
            for x in 0..grid {
                let cx = (x as f32 + 0.5) / grid as f32;
                let cy = (y as f32 + 0.5) / grid as f32;
                anchors.extend(std::iter::repeat([cx, cy]).take(per_cell));
            }
        }
    }

    anchors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_shape() {
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let tensor = preprocess(&frame, 128);
        assert_eq!(tensor.shape(), &[1, 3, 128, 128]);
    }

    #[test]
    fn test_preprocess_normalized() {
        let frame = Frame::new(vec![255u8; 50 * 50 * 3], 50, 50, 3, 0);
        let tensor = preprocess(&frame, 128);
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 0.01);
        assert!((tensor[[0, 2, 127, 127]] - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_generate_anchors_count_and_range() {
        let anchors = generate_anchors();
        assert_eq!(anchors.len(), NUM_ANCHORS);
        for a in &anchors {
            assert!(a[0] > 0.0 && a[0] < 1.0);
            assert!(a[1] > 0.0 && a[1] < 1.0);
        }
    }

    #[test]
    fn test_decode_filters_by_confidence() {
        let anchors = vec![[0.5, 0.5], [0.25, 0.25]];
        let reg = vec![0.0f32; 2 * REGRESSOR_STRIDE];
        // sigmoid(3) ≈ 0.95, sigmoid(-3) ≈ 0.05
        let scores = vec![3.0f32, -3.0];
        let dets = decode(&reg, &scores, &anchors, 0.5, 100, 100);
        assert_eq!(dets.len(), 1);
        assert!(dets[0].score > 0.9);
    }

    #[test]
    fn test_decode_maps_to_frame_coordinates() {
        // Box centered at (0.5, 0.5), 64/128 = half the frame in each axis.
        let anchors = vec![[0.5, 0.5]];
        let mut reg = vec![0.0f32; REGRESSOR_STRIDE];
        reg[2] = 64.0;
        reg[3] = 64.0;
        let dets = decode(&reg, &[5.0], &anchors, 0.5, 200, 100);
        let b = dets[0].to_face_box();
        assert_eq!((b.x, b.y, b.width, b.height), (50, 25, 100, 50));
    }

    #[test]
    fn test_decode_leaves_edge_boxes_unclamped() {
        // Anchor near the left edge with a wide box: x1 goes negative.
        let anchors = vec![[0.05, 0.5]];
        let mut reg = vec![0.0f32; REGRESSOR_STRIDE];
        reg[2] = 64.0;
        reg[3] = 64.0;
        let dets = decode(&reg, &[5.0], &anchors, 0.5, 100, 100);
        assert!(dets[0].x1 < 0.0);
    }

    #[test]
    fn test_decode_stops_at_truncated_regressors() {
        let anchors = vec![[0.5, 0.5], [0.5, 0.5]];
        let reg = vec![0.0f32; REGRESSOR_STRIDE]; // only one anchor's worth
        let dets = decode(&reg, &[5.0, 5.0], &anchors, 0.5, 100, 100);
        assert_eq!(dets.len(), 1);
    }
}
