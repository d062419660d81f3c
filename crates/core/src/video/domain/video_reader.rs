use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// A source of frames: a video file, a still image or a capture device.
///
/// The iterator returned by [`VideoReader::frames`] ending is end of stream.
/// An `Err` item is a single undecodable frame; callers may keep pulling.
pub trait VideoReader: Send {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases the source. Must be safe to call more than once.
    fn close(&mut self);
}
