use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Locates faces in a frame.
///
/// Returns boxes in detector order; an empty vector means no face. Boxes may
/// extend past the frame edges, callers clamp before cropping. Takes
/// `&mut self` because ONNX sessions need exclusive access while running.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>>;
}
