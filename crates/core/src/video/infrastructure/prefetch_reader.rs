use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

pub const DEFAULT_CAPACITY: usize = 8;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Decodes on a dedicated thread, `capacity` frames ahead of the consumer.
///
/// The queue is bounded, so a slow consumer stalls the decoder instead of
/// letting decoded frames pile up. Closing stops and joins the decode thread,
/// then closes the wrapped reader.
pub struct PrefetchReader {
    inner: Option<Box<dyn VideoReader>>,
    capacity: usize,
    frames_rx: Option<crossbeam_channel::Receiver<Result<Frame, SendError>>>,
    decode_thread: Option<JoinHandle<Box<dyn VideoReader>>>,
    stop: Arc<AtomicBool>,
}

impl PrefetchReader {
    pub fn new(inner: Box<dyn VideoReader>) -> Self {
        Self::with_capacity(inner, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: Box<dyn VideoReader>, capacity: usize) -> Self {
        Self {
            inner: Some(inner),
            capacity: capacity.max(1),
            frames_rx: None,
            decode_thread: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    fn stop_decoding(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // Dropping the receiver unblocks a decoder waiting on a full queue.
        self.frames_rx = None;
        if let Some(handle) = self.decode_thread.take() {
            match handle.join() {
                Ok(reader) => self.inner = Some(reader),
                Err(_) => log::warn!("Prefetch decode thread panicked"),
            }
        }
    }
}

impl VideoReader for PrefetchReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        self.stop_decoding();
        let mut reader = self.inner.take().ok_or("PrefetchReader: inner reader lost")?;
        let metadata = match reader.open(path) {
            Ok(m) => m,
            Err(e) => {
                self.inner = Some(reader);
                return Err(e);
            }
        };

        let (tx, rx) = crossbeam_channel::bounded(self.capacity);
        let stop = Arc::new(AtomicBool::new(false));
        self.stop = stop.clone();
        self.frames_rx = Some(rx);
        self.decode_thread = Some(std::thread::spawn(move || {
            for frame_result in reader.frames() {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                let mapped = frame_result.map_err(|e| -> SendError { e.to_string().into() });
                if tx.send(mapped).is_err() {
                    break;
                }
            }
            reader
        }));

        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        match &self.frames_rx {
            Some(rx) => Box::new(
                rx.iter()
                    .map(|r| r.map_err(|e| e as Box<dyn std::error::Error>)),
            ),
            None => Box::new(std::iter::once(Err("PrefetchReader: not opened".into()))),
        }
    }

    fn close(&mut self) {
        self.stop_decoding();
        if let Some(inner) = self.inner.as_mut() {
            inner.close();
        }
    }
}

impl Drop for PrefetchReader {
    fn drop(&mut self) {
        self.stop_decoding();
    }
}
