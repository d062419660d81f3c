use crate::shared::constants::CROP_SIZE;

use super::face_crop::FaceCrop;

/// Estimates, per crop, the probability that the face was manipulated.
///
/// Returns exactly one score in [0,1] per input crop, in input order. Scoring
/// is a pure function of the crop for a loaded model.
pub trait FrameScorer: Send {
    /// Side length of the square crops this scorer expects.
    fn input_size(&self) -> u32 {
        CROP_SIZE
    }

    fn predict(&mut self, batch: &[FaceCrop]) -> Result<Vec<f32>, Box<dyn std::error::Error>>;
}
