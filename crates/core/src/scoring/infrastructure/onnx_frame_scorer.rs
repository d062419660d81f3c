//! Real/fake face classifier on ONNX Runtime.
//!
//! Expects a MobileNetV2-style binary classifier exported from Keras: float
//! input of shape `[N, S, S, 3]` (or `[N, 3, S, S]`), sigmoid output `[N, 1]`.
//! Two-class softmax outputs `[N, 2]` are also accepted, column 1 being fake.

use std::path::Path;

use crate::scoring::domain::face_crop::FaceCrop;
use crate::scoring::domain::frame_scorer::FrameScorer;
use crate::shared::constants::CROP_SIZE;
use crate::shared::onnx_session::{load_session, square_input_size};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layout {
    Nhwc,
    Nchw,
}

pub struct OnnxFrameScorer {
    session: ort::session::Session,
    layout: Layout,
    input_size: u32,
}

impl OnnxFrameScorer {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        let layout = input_layout(&session);
        let input_size = square_input_size(&session).unwrap_or(CROP_SIZE);
        log::debug!("Classifier input: {input_size}x{input_size}, {layout:?}");
        Ok(Self {
            session,
            layout,
            input_size,
        })
    }
}

impl FrameScorer for OnnxFrameScorer {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn predict(&mut self, batch: &[FaceCrop]) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(crop) = batch.iter().find(|c| c.size() != self.input_size) {
            return Err(format!(
                "crop is {0}x{0}, classifier expects {1}x{1}",
                crop.size(),
                self.input_size
            )
            .into());
        }

        let input = ort::value::Tensor::from_array(to_tensor(batch, self.layout))?;
        let outputs = self.session.run(ort::inputs![input])?;
        if outputs.len() == 0 {
            return Err("classifier produced no outputs".into());
        }
        let probs = outputs[0].try_extract_array::<f32>()?;
        let shape = probs.shape().to_vec();
        let data: Vec<f32> = probs.iter().copied().collect();

        parse_scores(&data, &shape, batch.len())
    }
}

fn input_layout(session: &ort::session::Session) -> Layout {
    let Some(input) = session.inputs().first() else {
        return Layout::Nhwc;
    };
    match input.dtype() {
        ort::value::ValueType::Tensor { ref shape, .. } if shape.len() == 4 && shape[1] == 3 => {
            Layout::Nchw
        }
        _ => Layout::Nhwc,
    }
}

fn to_tensor(batch: &[FaceCrop], layout: Layout) -> ndarray::Array4<f32> {
    let n = batch.len();
    let s = batch.first().map(|c| c.size() as usize).unwrap_or(0);
    match layout {
        Layout::Nhwc => ndarray::Array4::from_shape_fn((n, s, s, 3), |(i, y, x, c)| {
            batch[i].value(y, x, c)
        }),
        Layout::Nchw => ndarray::Array4::from_shape_fn((n, 3, s, s), |(i, c, y, x)| {
            batch[i].value(y, x, c)
        }),
    }
}

/// Extracts one fake-probability per crop from the classifier output.
fn parse_scores(
    data: &[f32],
    shape: &[usize],
    expected: usize,
) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    let columns = match shape {
        [n] if *n == expected => 1,
        [n, c] if *n == expected && (*c == 1 || *c == 2) => *c,
        _ => {
            return Err(format!(
                "classifier output shape {shape:?} does not match batch of {expected}"
            )
            .into())
        }
    };
    Ok((0..expected)
        .map(|i| data[i * columns + columns - 1].clamp(0.0, 1.0))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::Frame;
    use approx::assert_relative_eq;

    fn crop(rgb: [u8; 3]) -> FaceCrop {
        let data = rgb.iter().copied().cycle().take(4 * 4 * 3).collect();
        FaceCrop::from_frame(&Frame::new(data, 4, 4, 3, 0), 4).unwrap()
    }

    #[test]
    fn test_to_tensor_nhwc() {
        let t = to_tensor(&[crop([255, 0, 0]), crop([0, 0, 255])], Layout::Nhwc);
        assert_eq!(t.shape(), &[2, 4, 4, 3]);
        assert_relative_eq!(t[[0, 1, 2, 0]], 1.0);
        assert_relative_eq!(t[[1, 3, 3, 2]], 1.0);
        assert_relative_eq!(t[[1, 3, 3, 0]], 0.0);
    }

    #[test]
    fn test_to_tensor_nchw() {
        let t = to_tensor(&[crop([0, 255, 0])], Layout::Nchw);
        assert_eq!(t.shape(), &[1, 3, 4, 4]);
        assert_relative_eq!(t[[0, 1, 2, 3]], 1.0);
        assert_relative_eq!(t[[0, 0, 2, 3]], 0.0);
    }

    #[test]
    fn test_parse_sigmoid_column() {
        let scores = parse_scores(&[0.1, 0.9, 0.5], &[3, 1], 3).unwrap();
        assert_eq!(scores, vec![0.1, 0.9, 0.5]);
    }

    #[test]
    fn test_parse_flat_output() {
        let scores = parse_scores(&[0.3, 0.7], &[2], 2).unwrap();
        assert_eq!(scores, vec![0.3, 0.7]);
    }

    #[test]
    fn test_parse_softmax_uses_fake_column() {
        let scores = parse_scores(&[0.8, 0.2, 0.1, 0.9], &[2, 2], 2).unwrap();
        assert_eq!(scores, vec![0.2, 0.9]);
    }

    #[test]
    fn test_parse_clamps_out_of_range() {
        let scores = parse_scores(&[1.2, -0.1], &[2, 1], 2).unwrap();
        assert_eq!(scores, vec![1.0, 0.0]);
    }

    #[test]
    fn test_parse_rejects_count_mismatch() {
        assert!(parse_scores(&[0.1, 0.2], &[2, 1], 3).is_err());
        assert!(parse_scores(&[0.1, 0.2, 0.3], &[1, 3], 1).is_err());
    }
}
