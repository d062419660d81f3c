use crate::overlay::domain::frame_annotator::{FrameAnnotator, ScoredFace};
use crate::scoring::domain::verdict::Label;
use crate::shared::frame::Frame;

pub const FAKE_COLOR: [u8; 3] = [255, 0, 0];
pub const REAL_COLOR: [u8; 3] = [0, 255, 0];

const DEFAULT_THICKNESS: u32 = 2;
const BAR_HEIGHT: u32 = 4;
const BAR_GAP: u32 = 2;

/// CPU annotator: a colored outline around each face and a confidence bar
/// above it.
///
/// The bar spans `confidence x box width` pixels. When there is no room above
/// the box it is drawn just inside the top edge instead.
pub struct BoxAnnotator {
    thickness: u32,
}

impl BoxAnnotator {
    pub fn new(thickness: u32) -> Self {
        Self {
            thickness: thickness.max(1),
        }
    }
}

impl Default for BoxAnnotator {
    fn default() -> Self {
        Self::new(DEFAULT_THICKNESS)
    }
}

impl FrameAnnotator for BoxAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        faces: &[ScoredFace],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!("cannot annotate {}-channel frame", frame.channels()).into());
        }
        let fw = frame.width();
        let fh = frame.height();

        for scored in faces {
            let Some(b) = scored.face.clamp_to(fw, fh) else {
                continue;
            };
            let color = match scored.label() {
                Label::Fake => FAKE_COLOR,
                Label::Real => REAL_COLOR,
            };
            let (x, y, w, h) = (b.x as u32, b.y as u32, b.width as u32, b.height as u32);
            let t = self.thickness.min(w).min(h);

            // Outline: top, bottom, left, right bands.
            fill(frame, x, y, w, t, color);
            fill(frame, x, y + h - t, w, t, color);
            fill(frame, x, y, t, h, color);
            fill(frame, x + w - t, y, t, h, color);

            let bar_w = ((scored.confidence() * w as f64).round() as u32).min(w);
            let bar_y = if y >= BAR_HEIGHT + BAR_GAP {
                y - BAR_GAP - BAR_HEIGHT
            } else {
                y + t
            };
            fill(frame, x, bar_y, bar_w, BAR_HEIGHT, color);
        }

        Ok(())
    }
}

/// Fills a rectangle, silently cropping whatever falls outside the frame.
fn fill(frame: &mut Frame, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
    let fw = frame.width();
    let fh = frame.height();
    let x2 = x.saturating_add(w).min(fw);
    let y2 = y.saturating_add(h).min(fh);
    if x >= x2 || y >= y2 {
        return;
    }
    let stride = fw as usize * 3;
    let data = frame.data_mut();
    for row in y as usize..y2 as usize {
        for col in x as usize..x2 as usize {
            let idx = row * stride + col * 3;
            data[idx..idx + 3].copy_from_slice(&color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face_box::FaceBox;

    fn black(width: u32, height: u32) -> Frame {
        Frame::new(vec![0u8; (width * height * 3) as usize], width, height, 3, 0)
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let v = frame.as_ndarray();
        [v[[y, x, 0]], v[[y, x, 1]], v[[y, x, 2]]]
    }

    #[test]
    fn test_no_faces_frame_unchanged() {
        let mut frame = black(50, 50);
        BoxAnnotator::default().annotate(&mut frame, &[]).unwrap();
        assert!(frame.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_fake_face_outlined_in_red() {
        let mut frame = black(100, 100);
        let face = ScoredFace::new(FaceBox::new(20, 20, 40, 40), 0.9);
        BoxAnnotator::default().annotate(&mut frame, &[face]).unwrap();

        assert_eq!(pixel(&frame, 20, 20), FAKE_COLOR);
        assert_eq!(pixel(&frame, 59, 59), FAKE_COLOR);
        assert_eq!(pixel(&frame, 21, 40), FAKE_COLOR);
        // Interior untouched
        assert_eq!(pixel(&frame, 40, 40), [0, 0, 0]);
        // Two-pixel border ends at offset 2
        assert_eq!(pixel(&frame, 22, 40), [0, 0, 0]);
    }

    #[test]
    fn test_real_face_outlined_in_green() {
        let mut frame = black(100, 100);
        let face = ScoredFace::new(FaceBox::new(20, 20, 40, 40), 0.2);
        BoxAnnotator::default().annotate(&mut frame, &[face]).unwrap();
        assert_eq!(pixel(&frame, 20, 30), REAL_COLOR);
    }

    #[test]
    fn test_score_at_threshold_is_real() {
        let mut frame = black(100, 100);
        let face = ScoredFace::new(FaceBox::new(20, 20, 40, 40), 0.5);
        BoxAnnotator::default().annotate(&mut frame, &[face]).unwrap();
        assert_eq!(pixel(&frame, 20, 30), REAL_COLOR);
    }

    #[test]
    fn test_confidence_bar_length_follows_confidence() {
        let mut frame = black(100, 100);
        // confidence 0.75 over a 40px box → 30px bar at rows 14..18
        let face = ScoredFace::new(FaceBox::new(20, 20, 40, 40), 0.25);
        BoxAnnotator::default().annotate(&mut frame, &[face]).unwrap();

        assert_eq!(pixel(&frame, 20, 15), REAL_COLOR);
        assert_eq!(pixel(&frame, 49, 15), REAL_COLOR);
        assert_eq!(pixel(&frame, 50, 15), [0, 0, 0]);
        assert_eq!(pixel(&frame, 20, 19), [0, 0, 0]);
    }

    #[test]
    fn test_bar_moves_inside_box_at_top_edge() {
        let mut frame = black(100, 100);
        let face = ScoredFace::new(FaceBox::new(10, 0, 40, 40), 1.0);
        BoxAnnotator::default().annotate(&mut frame, &[face]).unwrap();
        // Full-width bar just below the two-pixel top border
        assert_eq!(pixel(&frame, 30, 3), FAKE_COLOR);
        assert_eq!(pixel(&frame, 30, 6), [0, 0, 0]);
    }

    #[test]
    fn test_overhanging_box_is_clamped() {
        let mut frame = black(50, 50);
        let face = ScoredFace::new(FaceBox::new(-10, -10, 100, 100), 0.9);
        BoxAnnotator::default().annotate(&mut frame, &[face]).unwrap();
        assert_eq!(pixel(&frame, 0, 25), FAKE_COLOR);
        assert_eq!(pixel(&frame, 49, 25), FAKE_COLOR);
    }

    #[test]
    fn test_box_outside_frame_skipped() {
        let mut frame = black(50, 50);
        let face = ScoredFace::new(FaceBox::new(60, 60, 10, 10), 0.9);
        BoxAnnotator::default().annotate(&mut frame, &[face]).unwrap();
        assert!(frame.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_preserves_frame_index() {
        let mut frame = Frame::new(vec![0u8; 30 * 30 * 3], 30, 30, 3, 42);
        let face = ScoredFace::new(FaceBox::new(5, 5, 10, 10), 0.9);
        BoxAnnotator::default().annotate(&mut frame, &[face]).unwrap();
        assert_eq!(frame.index(), 42);
    }

    #[test]
    fn test_rejects_non_rgb_frame() {
        let mut frame = Frame::new(vec![0u8; 16], 4, 4, 1, 0);
        assert!(BoxAnnotator::default().annotate(&mut frame, &[]).is_err());
    }
}
