use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// A square RGB crop resized for the classifier, channels scaled to [0,1].
///
/// Stored as `f32` in HWC order, which is how the Keras-exported model
/// expects its input.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceCrop {
    data: Vec<f32>,
    size: u32,
}

impl FaceCrop {
    /// Resizes the whole frame to `size x size` (bilinear) and normalizes it.
    ///
    /// Returns `None` for empty or non-RGB frames.
    pub fn from_frame(frame: &Frame, size: u32) -> Option<FaceCrop> {
        if frame.channels() != 3 || frame.width() == 0 || frame.height() == 0 || size == 0 {
            return None;
        }
        let img = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())?;
        let resized = if img.dimensions() == (size, size) {
            img
        } else {
            imageops::resize(&img, size, size, FilterType::Triangle)
        };
        let data = resized
            .into_raw()
            .into_iter()
            .map(|v| v as f32 / 255.0)
            .collect();
        Some(FaceCrop { data, size })
    }

    /// Crops `face` out of `frame` (clamped to the frame) and resizes it.
    ///
    /// Returns `None` when the clamped box is empty.
    pub fn from_face(frame: &Frame, face: &FaceBox, size: u32) -> Option<FaceCrop> {
        let region = frame.crop(face)?;
        Self::from_frame(&region, size)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Normalized pixels, HWC.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn value(&self, row: usize, col: usize, channel: usize) -> f32 {
        self.data[(row * self.size as usize + col) * 3 + channel]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Frame::new(data, width, height, 3, 0)
    }

    #[test]
    fn test_from_frame_resizes_to_square() {
        let crop = FaceCrop::from_frame(&solid(64, 48, [0, 0, 0]), 128).unwrap();
        assert_eq!(crop.size(), 128);
        assert_eq!(crop.data().len(), 128 * 128 * 3);
    }

    #[test]
    fn test_values_are_normalized() {
        let crop = FaceCrop::from_frame(&solid(40, 40, [255, 51, 0]), 128).unwrap();
        assert_relative_eq!(crop.value(0, 0, 0), 1.0);
        assert_relative_eq!(crop.value(64, 64, 1), 0.2);
        assert_relative_eq!(crop.value(127, 127, 2), 0.0);
        assert!(crop.data().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_same_size_frame_is_not_resampled() {
        let mut frame = solid(2, 2, [0, 0, 0]);
        frame.data_mut()[3] = 255; // pixel (0, 1), red
        let crop = FaceCrop::from_frame(&frame, 2).unwrap();
        assert_relative_eq!(crop.value(0, 1, 0), 1.0);
        assert_relative_eq!(crop.value(0, 0, 0), 0.0);
    }

    #[test]
    fn test_from_face_uses_only_face_pixels() {
        // Left half black, right half white; the face sits in the white half.
        let (w, h) = (100u32, 50u32);
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for _row in 0..h {
            for col in 0..w {
                let v = if col >= 50 { 255 } else { 0 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        let frame = Frame::new(data, w, h, 3, 0);

        let crop = FaceCrop::from_face(&frame, &FaceBox::new(60, 10, 30, 30), 128).unwrap();
        assert!(crop.data().iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_from_face_clamps_overhanging_box() {
        let frame = solid(50, 50, [10, 20, 30]);
        let crop = FaceCrop::from_face(&frame, &FaceBox::new(-20, 30, 100, 100), 128);
        assert!(crop.is_some());
    }

    #[test]
    fn test_from_face_outside_frame_is_none() {
        let frame = solid(50, 50, [10, 20, 30]);
        assert!(FaceCrop::from_face(&frame, &FaceBox::new(60, 60, 10, 10), 128).is_none());
    }

    #[test]
    fn test_non_rgb_frame_is_rejected() {
        let frame = Frame::new(vec![0u8; 16], 4, 4, 1, 0);
        assert!(FaceCrop::from_frame(&frame, 128).is_none());
    }
}
