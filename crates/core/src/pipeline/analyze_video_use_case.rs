use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use crate::detection::domain::face_detector::FaceDetector;
use crate::scoring::domain::face_crop::FaceCrop;
use crate::scoring::domain::frame_scorer::FrameScorer;
use crate::scoring::domain::verdict::Verdict;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;
use crate::video::domain::video_reader::VideoReader;

use super::analysis_config::{AnalysisConfig, ConfigError};
use super::analysis_error::AnalysisError;
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};

pub type ProgressFn = Box<dyn Fn(usize, usize) -> bool + Send>;

/// Outcome of one analysis run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisReport {
    #[serde(flatten)]
    pub verdict: Verdict,
    /// Frames pulled from the source, including undecodable ones.
    pub frames_examined: usize,
    /// Decoded frames that produced no crop.
    pub faces_missed: usize,
    /// Per-crop scores, in stream order.
    #[serde(skip)]
    pub scores: Vec<f32>,
}

/// Reduces a frame stream to a single verdict.
///
/// Frames are pulled one at a time. In face mode the best detected face of
/// each frame is cropped; otherwise the whole frame is used. Crops are scored
/// in batches until `max_frames` scores are collected, the stream ends or
/// `max_examined` frames have been pulled. Frames that fail to decode, yield
/// no usable face or whose batch fails to score are skipped and do not count
/// toward the budget.
///
/// The reader is closed on every exit path.
pub struct AnalyzeVideoUseCase {
    reader: Box<dyn VideoReader>,
    detector: Option<Box<dyn FaceDetector>>,
    scorer: Box<dyn FrameScorer>,
    config: AnalysisConfig,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<ProgressFn>,
}

impl AnalyzeVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: Option<Box<dyn FaceDetector>>,
        scorer: Box<dyn FrameScorer>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            reader,
            detector,
            scorer,
            config,
            logger: Box::new(NullPipelineLogger),
            on_progress: None,
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Called with `(frames_examined, total_frames)` after every pulled
    /// frame; returning `false` cancels the run.
    pub fn with_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn logger(&self) -> &dyn PipelineLogger {
        self.logger.as_ref()
    }

    pub fn execute(&mut self, source: &Path) -> Result<AnalysisReport, AnalysisError> {
        let Self {
            reader,
            detector,
            scorer,
            config,
            logger,
            on_progress,
        } = self;

        let mut guard = CloseOnDrop(reader.as_mut());
        config.validate()?;
        if config.face_required && detector.is_none() {
            return Err(ConfigError::Invalid("face mode needs a face detector".into()).into());
        }

        let metadata = match guard.0.open(source) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("Cannot open {}: {e}", source.display());
                return Err(AnalysisError::NoFramesDecoded);
            }
        };
        let total = metadata.total_frames;
        let crop_size = scorer.input_size();
        let mode = if config.face_required { "best face" } else { "whole frame" };
        logger.info(&format!(
            "Analyzing {} ({mode}, up to {} scores)",
            source.display(),
            config.max_frames
        ));

        let mut frames = guard.0.frames();
        let mut examined = 0usize;
        let mut decoded = 0usize;
        let mut faces_missed = 0usize;
        let mut scores: Vec<f32> = Vec::with_capacity(config.max_frames);
        let mut pending: Vec<FaceCrop> = Vec::with_capacity(config.batch_size);

        while scores.len() < config.max_frames {
            if config.max_examined.is_some_and(|max| examined >= max) {
                logger.info(&format!("Stopped after examining {examined} frames"));
                break;
            }

            let t0 = Instant::now();
            let Some(item) = frames.next() else {
                break;
            };
            logger.timing("decode", elapsed_ms(t0));
            examined += 1;

            match item {
                Ok(frame) => {
                    decoded += 1;
                    let crop = match detector.as_deref_mut() {
                        Some(d) if config.face_required => best_face_crop(d, &frame, crop_size, logger.as_mut()),
                        _ => FaceCrop::from_frame(&frame, crop_size),
                    };
                    match crop {
                        Some(c) => pending.push(c),
                        None => faces_missed += 1,
                    }
                }
                Err(e) => log::debug!("Skipping undecodable frame {examined}: {e}"),
            }

            logger.progress(examined, total);
            if let Some(cb) = on_progress.as_ref() {
                if !cb(examined, total) {
                    return Err(AnalysisError::Cancelled);
                }
            }

            let remaining = config.max_frames - scores.len();
            if pending.len() >= config.batch_size.min(remaining) {
                score_batch(scorer.as_mut(), &mut pending, &mut scores, logger.as_mut());
            }
        }
        if !pending.is_empty() {
            score_batch(scorer.as_mut(), &mut pending, &mut scores, logger.as_mut());
        }
        drop(frames);

        if decoded == 0 {
            return Err(AnalysisError::NoFramesDecoded);
        }
        let verdict = match Verdict::from_scores(&scores) {
            Some(v) => v,
            None if config.face_required => return Err(AnalysisError::NoFaceDetected),
            None => return Err(AnalysisError::EmptyStream),
        };
        logger.info(&format!(
            "{} from {} scores ({examined} frames examined, {faces_missed} without a face)",
            verdict.label(),
            scores.len()
        ));

        Ok(AnalysisReport {
            verdict,
            frames_examined: examined,
            faces_missed,
            scores,
        })
    }
}

/// Closes the wrapped reader when dropped.
struct CloseOnDrop<'a>(&'a mut dyn VideoReader);

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn best_face_crop(
    detector: &mut dyn FaceDetector,
    frame: &Frame,
    crop_size: u32,
    logger: &mut dyn PipelineLogger,
) -> Option<FaceCrop> {
    let t0 = Instant::now();
    let faces = match detector.detect(frame) {
        Ok(faces) => faces,
        Err(e) => {
            log::warn!("Face detection failed on frame {}: {e}", frame.index());
            return None;
        }
    };
    logger.timing("detect", elapsed_ms(t0));
    logger.metric("faces", faces.len() as f64);

    let Some(face) = FaceBox::best(&faces, frame.width(), frame.height()) else {
        log::debug!("No usable face in frame {}", frame.index());
        return None;
    };
    FaceCrop::from_face(frame, &face, crop_size)
}

/// Scores and drains `pending`. A failed batch, or one that returns the wrong
/// number of scores, is dropped.
fn score_batch(
    scorer: &mut dyn FrameScorer,
    pending: &mut Vec<FaceCrop>,
    scores: &mut Vec<f32>,
    logger: &mut dyn PipelineLogger,
) {
    let t0 = Instant::now();
    let result = scorer.predict(pending);
    logger.timing("score", elapsed_ms(t0));
    match result {
        Ok(batch) if batch.len() == pending.len() => {
            scores.extend(batch.into_iter().map(|s| s.clamp(0.0, 1.0)));
        }
        Ok(batch) => log::warn!(
            "Scorer returned {} scores for {} crops; dropping batch",
            batch.len(),
            pending.len()
        ),
        Err(e) => log::warn!("Scoring failed for {} crops: {e}", pending.len()),
    }
    pending.clear();
}
