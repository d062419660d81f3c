use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Frame count reported by the container; 0 when unknown (live capture).
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Frame rate to encode output at, falling back to 30 when the source
    /// does not report one (still images, some capture devices).
    pub fn output_fps(&self) -> i32 {
        let fps = self.fps.round() as i32;
        if fps <= 0 {
            30
        } else {
            fps
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(fps: f64) -> VideoMetadata {
        VideoMetadata {
            width: 640,
            height: 480,
            fps,
            total_frames: 100,
            codec: "h264".to_string(),
            source_path: Some(PathBuf::from("/tmp/clip.mp4")),
        }
    }

    #[test]
    fn test_output_fps_rounds_source_rate() {
        assert_eq!(metadata(29.97).output_fps(), 30);
        assert_eq!(metadata(24.0).output_fps(), 24);
    }

    #[test]
    fn test_output_fps_defaults_when_unknown() {
        assert_eq!(metadata(0.0).output_fps(), 30);
        assert_eq!(metadata(-1.0).output_fps(), 30);
    }

    #[test]
    fn test_clone_is_equal() {
        let meta = metadata(25.0);
        assert_eq!(meta.clone(), meta);
    }
}
