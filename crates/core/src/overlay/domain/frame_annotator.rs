use crate::scoring::domain::verdict::{confidence_for, Label};
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// A clamped face box together with the classifier's fake probability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredFace {
    pub face: FaceBox,
    pub score: f32,
}

impl ScoredFace {
    pub fn new(face: FaceBox, score: f32) -> Self {
        Self { face, score }
    }

    pub fn label(&self) -> Label {
        Label::from_score(self.score as f64)
    }

    /// Certainty of [`ScoredFace::label`], in [0.5, 1.0].
    pub fn confidence(&self) -> f64 {
        confidence_for(self.score as f64)
    }
}

/// Draws per-face results onto a frame in place.
pub trait FrameAnnotator: Send {
    fn annotate(
        &self,
        frame: &mut Frame,
        faces: &[ScoredFace],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
