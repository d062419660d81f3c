use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use crate::detection::domain::face_detector::FaceDetector;
use crate::overlay::domain::frame_annotator::{FrameAnnotator, ScoredFace};
use crate::scoring::domain::face_crop::FaceCrop;
use crate::scoring::domain::frame_scorer::FrameScorer;
use crate::scoring::domain::score_smoother::{AlertLevel, ScoreSmoother};
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::analysis_error::AnalysisError;
use super::analyze_video_use_case::ProgressFn;
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct OverlaySummary {
    pub frames_written: usize,
    pub faces_scored: usize,
    /// Most severe smoothed alert level reached during the run.
    pub peak_alert: AlertLevel,
}

/// Scores every face of every frame, draws the results and writes the
/// annotated stream.
///
/// Every decoded frame is written, annotated or not. Each frame's highest
/// face score feeds a [`ScoreSmoother`]; alert level changes are logged.
/// Runs until the stream ends or the progress callback returns `false`,
/// which is a normal stop here. Reader and writer are closed on every path.
pub struct OverlayVideoUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    detector: Box<dyn FaceDetector>,
    scorer: Box<dyn FrameScorer>,
    annotator: Box<dyn FrameAnnotator>,
    smoother: ScoreSmoother,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<ProgressFn>,
}

impl OverlayVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        detector: Box<dyn FaceDetector>,
        scorer: Box<dyn FrameScorer>,
        annotator: Box<dyn FrameAnnotator>,
    ) -> Self {
        Self {
            reader,
            writer,
            detector,
            scorer,
            annotator,
            smoother: ScoreSmoother::default(),
            logger: Box::new(NullPipelineLogger),
            on_progress: None,
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn with_smoother(mut self, smoother: ScoreSmoother) -> Self {
        self.smoother = smoother;
        self
    }

    pub fn logger(&self) -> &dyn PipelineLogger {
        self.logger.as_ref()
    }

    pub fn execute(&mut self, input: &Path, output: &Path) -> Result<OverlaySummary, AnalysisError> {
        let Self {
            reader,
            writer,
            detector,
            scorer,
            annotator,
            smoother,
            logger,
            on_progress,
        } = self;

        let mut reader_guard = CloseReader(reader.as_mut());
        let metadata = match reader_guard.0.open(input) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("Cannot open {}: {e}", input.display());
                return Err(AnalysisError::NoFramesDecoded);
            }
        };

        let mut writer_guard = CloseWriter {
            writer: writer.as_mut(),
            open: false,
        };
        writer_guard
            .writer
            .open(output, &metadata)
            .map_err(|e| AnalysisError::Output(e.to_string()))?;
        writer_guard.open = true;

        let total = metadata.total_frames;
        let crop_size = scorer.input_size();
        let mut summary = OverlaySummary {
            frames_written: 0,
            faces_scored: 0,
            peak_alert: smoother.level(),
        };
        let mut examined = 0usize;

        for item in reader_guard.0.frames() {
            examined += 1;
            match item {
                Ok(mut frame) => {
                    let scored =
                        score_faces(detector.as_mut(), scorer.as_mut(), &frame, crop_size, logger.as_mut());
                    summary.faces_scored += scored.len();

                    if let Some(max) = scored.iter().map(|f| f.score).reduce(f32::max) {
                        let previous = smoother.level();
                        let level = smoother.push(max as f64);
                        if level != previous {
                            log::info!(
                                "Alert {previous} -> {level} at frame {} (window mean {:.3})",
                                frame.index(),
                                smoother.mean()
                            );
                        }
                        summary.peak_alert = summary.peak_alert.max(level);
                    }

                    if !scored.is_empty() {
                        if let Err(e) = annotator.annotate(&mut frame, &scored) {
                            log::warn!("Could not annotate frame {}: {e}", frame.index());
                        }
                    }
                    writer_guard
                        .writer
                        .write(&frame)
                        .map_err(|e| AnalysisError::Output(e.to_string()))?;
                    summary.frames_written += 1;
                }
                Err(e) => log::debug!("Skipping undecodable frame {examined}: {e}"),
            }

            logger.progress(examined, total);
            if let Some(cb) = on_progress.as_ref() {
                if !cb(examined, total) {
                    logger.info("Stopped by request");
                    break;
                }
            }
        }

        writer_guard
            .finish()
            .map_err(|e| AnalysisError::Output(e.to_string()))?;
        if summary.frames_written == 0 {
            return Err(AnalysisError::NoFramesDecoded);
        }
        logger.info(&format!(
            "Wrote {} frames, {} faces scored, peak alert {}",
            summary.frames_written, summary.faces_scored, summary.peak_alert
        ));
        Ok(summary)
    }
}

struct CloseReader<'a>(&'a mut dyn VideoReader);

impl Drop for CloseReader<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Finalizes the writer on drop if [`CloseWriter::finish`] was not reached.
struct CloseWriter<'a> {
    writer: &'a mut dyn VideoWriter,
    open: bool,
}

impl CloseWriter<'_> {
    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.open = false;
        self.writer.close()
    }
}

impl Drop for CloseWriter<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.writer.close() {
                log::warn!("Closing output failed: {e}");
            }
        }
    }
}

/// Detects, clamps and scores every face in `frame` in one scorer call.
///
/// Returns an empty list when detection or scoring fails.
fn score_faces(
    detector: &mut dyn FaceDetector,
    scorer: &mut dyn FrameScorer,
    frame: &Frame,
    crop_size: u32,
    logger: &mut dyn PipelineLogger,
) -> Vec<ScoredFace> {
    let t0 = Instant::now();
    let faces = match detector.detect(frame) {
        Ok(faces) => FaceBox::usable(&faces, frame.width(), frame.height()),
        Err(e) => {
            log::warn!("Face detection failed on frame {}: {e}", frame.index());
            return Vec::new();
        }
    };
    logger.timing("detect", t0.elapsed().as_secs_f64() * 1000.0);

    let (faces, crops): (Vec<FaceBox>, Vec<FaceCrop>) = faces
        .into_iter()
        .filter_map(|f| FaceCrop::from_face(frame, &f, crop_size).map(|c| (f, c)))
        .unzip();
    if crops.is_empty() {
        return Vec::new();
    }

    let t0 = Instant::now();
    let result = scorer.predict(&crops);
    logger.timing("score", t0.elapsed().as_secs_f64() * 1000.0);
    match result {
        Ok(scores) if scores.len() == faces.len() => faces
            .into_iter()
            .zip(scores)
            .map(|(f, s)| ScoredFace::new(f, s.clamp(0.0, 1.0)))
            .collect(),
        Ok(scores) => {
            log::warn!(
                "Scorer returned {} scores for {} faces on frame {}",
                scores.len(),
                faces.len(),
                frame.index()
            );
            Vec::new()
        }
        Err(e) => {
            log::warn!("Scoring failed on frame {}: {e}", frame.index());
            Vec::new()
        }
    }
}
