use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use deepfake_core::detection::domain::face_detector::FaceDetector;
use deepfake_core::detection::infrastructure::onnx_blazeface_detector::{
    self, OnnxBlazefaceDetector,
};
use deepfake_core::detection::infrastructure::onnx_yolo_detector::{self, OnnxYoloDetector};
use deepfake_core::overlay::infrastructure::box_annotator::BoxAnnotator;
use deepfake_core::pipeline::analysis_config::{AnalysisConfig, DetectorKind};
use deepfake_core::pipeline::analyze_video_use_case::{AnalyzeVideoUseCase, ProgressFn};
use deepfake_core::pipeline::overlay_video_use_case::OverlayVideoUseCase;
use deepfake_core::pipeline::pipeline_logger::SummaryPipelineLogger;
use deepfake_core::scoring::domain::frame_scorer::FrameScorer;
use deepfake_core::scoring::infrastructure::onnx_frame_scorer::OnnxFrameScorer;
use deepfake_core::shared::constants::{
    BLAZEFACE_MODEL_NAME, CLASSIFIER_MODEL_NAME, IMAGE_EXTENSIONS, YOLO_MODEL_NAME,
    YOLO_MODEL_URL,
};
use deepfake_core::shared::model_resolver;
use deepfake_core::video::domain::video_reader::VideoReader;
use deepfake_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use deepfake_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use deepfake_core::video::infrastructure::image_file_reader::ImageFileReader;
use deepfake_core::video::infrastructure::prefetch_reader::PrefetchReader;

/// Directory searched for model files after the user cache.
const BUNDLED_MODEL_DIR: &str = "models";

/// Classify a video, image or camera stream as REAL or FAKE.
#[derive(Parser)]
#[command(name = "deepfake-detect", version)]
struct Cli {
    /// Input video or image file, capture device path, or camera index.
    input: String,

    /// Scored face crops to collect before deciding [default: 20].
    #[arg(long)]
    max_frames: Option<usize>,

    /// Stop after pulling this many frames, scored or not.
    #[arg(long)]
    max_examined: Option<usize>,

    /// Score whole frames instead of detected faces.
    #[arg(long)]
    whole_frame: bool,

    /// Face detector [default: yolo].
    #[arg(long, value_enum)]
    detector: Option<DetectorArg>,

    /// Face detector ONNX model (skips lookup and download).
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Real/fake classifier ONNX model.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Crops per classifier call [default: 1].
    #[arg(long)]
    batch_size: Option<usize>,

    /// Write an annotated copy of the input instead of printing a verdict.
    #[arg(long, value_name = "OUT.mp4")]
    overlay: Option<PathBuf>,

    /// Decode on a background thread.
    #[arg(long)]
    prefetch: bool,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// JSON file with analysis settings; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DetectorArg {
    Blazeface,
    Yolo,
}

impl From<DetectorArg> for DetectorKind {
    fn from(arg: DetectorArg) -> Self {
        match arg {
            DetectorArg::Blazeface => DetectorKind::Blazeface,
            DetectorArg::Yolo => DetectorKind::Yolo,
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let input = resolve_input(&cli.input);
    let config = build_config(&cli)?;
    validate(&cli, &input)?;

    let scorer = build_scorer(&cli)?;
    let quit = install_quit_flag();

    if let Some(output) = cli.overlay.as_deref() {
        let detector = build_detector(&cli, &config)?;
        return run_overlay(&input, output, detector, scorer, cli.prefetch, quit);
    }

    let detector = if config.face_required {
        Some(build_detector(&cli, &config)?)
    } else {
        None
    };
    run_analysis(&input, detector, scorer, config, cli.prefetch, cli.json, quit)
}

fn run_analysis(
    input: &Path,
    detector: Option<Box<dyn FaceDetector>>,
    scorer: Box<dyn FrameScorer>,
    config: AnalysisConfig,
    prefetch: bool,
    json: bool,
    quit: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader = open_reader(input, prefetch);
    let mut use_case = AnalyzeVideoUseCase::new(reader, detector, scorer, config)
        .with_logger(Box::new(SummaryPipelineLogger::default()))
        .with_progress(progress("Examining", quit));

    let result = use_case.execute(input);
    eprintln!();
    use_case.logger().summary();
    let report = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Result: {}", report.verdict.label());
        println!("Confidence: {:.4}", report.verdict.confidence());
    }
    Ok(())
}

fn run_overlay(
    input: &Path,
    output: &Path,
    detector: Box<dyn FaceDetector>,
    scorer: Box<dyn FrameScorer>,
    prefetch: bool,
    quit: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader = open_reader(input, prefetch);
    let mut use_case = OverlayVideoUseCase::new(
        reader,
        Box::new(FfmpegWriter::new()),
        detector,
        scorer,
        Box::new(BoxAnnotator::default()),
    )
    .with_logger(Box::new(SummaryPipelineLogger::default()))
    .with_progress(progress("Rendering", quit));

    let result = use_case.execute(input, output);
    eprintln!();
    use_case.logger().summary();
    let summary = result?;

    log::info!("Output written to {}", output.display());
    println!(
        "Frames: {}  Faces scored: {}  Peak alert: {}",
        summary.frames_written, summary.faces_scored, summary.peak_alert
    );
    Ok(())
}

/// Config file (if any) with command-line flags applied on top.
fn build_config(cli: &Cli) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(n) = cli.max_frames {
        config.max_frames = n;
    }
    if cli.max_examined.is_some() {
        config.max_examined = cli.max_examined;
    }
    if cli.whole_frame {
        config.face_required = false;
    }
    if let Some(n) = cli.batch_size {
        config.batch_size = n;
    }
    if let Some(d) = cli.detector {
        config.detector = d.into();
    }
    if cli.confidence.is_some() {
        config.detector_confidence = cli.confidence;
    }
    config.validate()?;
    Ok(config)
}

fn build_scorer(cli: &Cli) -> Result<Box<dyn FrameScorer>, Box<dyn std::error::Error>> {
    let model_path = match &cli.model {
        Some(path) => path.clone(),
        None => {
            log::info!("Resolving model: {CLASSIFIER_MODEL_NAME}");
            model_resolver::resolve(
                CLASSIFIER_MODEL_NAME,
                None,
                Some(Path::new(BUNDLED_MODEL_DIR)),
                None,
            )?
        }
    };
    Ok(Box::new(OnnxFrameScorer::new(&model_path)?))
}

fn build_detector(
    cli: &Cli,
    config: &AnalysisConfig,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let (name, url) = match config.detector {
        DetectorKind::Yolo => (YOLO_MODEL_NAME, Some(YOLO_MODEL_URL)),
        DetectorKind::Blazeface => (BLAZEFACE_MODEL_NAME, None),
    };
    let model_path = match &cli.detector_model {
        Some(path) => path.clone(),
        None => {
            log::info!("Resolving model: {name}");
            model_resolver::resolve(
                name,
                url,
                Some(Path::new(BUNDLED_MODEL_DIR)),
                Some(Box::new(download_progress)),
            )?
        }
    };

    log::info!("Using {} face detector", config.detector);
    let detector: Box<dyn FaceDetector> = match config.detector {
        DetectorKind::Yolo => Box::new(OnnxYoloDetector::new(
            &model_path,
            config
                .detector_confidence
                .unwrap_or(onnx_yolo_detector::DEFAULT_CONFIDENCE),
        )?),
        DetectorKind::Blazeface => Box::new(OnnxBlazefaceDetector::new(
            &model_path,
            config
                .detector_confidence
                .unwrap_or(onnx_blazeface_detector::DEFAULT_CONFIDENCE),
        )?),
    };
    Ok(detector)
}

fn validate(cli: &Cli, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !is_device(input) && !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    if cli.overlay.is_some() && cli.whole_frame {
        return Err("--overlay draws detected faces and cannot be combined with --whole-frame".into());
    }
    if cli.overlay.is_some() && cli.json {
        return Err("--json applies to verdicts, not --overlay".into());
    }
    if let Some(path) = &cli.model {
        if !path.exists() {
            return Err(format!("Model file not found: {}", path.display()).into());
        }
    }
    if let Some(path) = &cli.detector_model {
        if !path.exists() {
            return Err(format!("Detector model not found: {}", path.display()).into());
        }
    }
    Ok(())
}

/// A bare number selects a camera, like `/dev/video<N>`.
fn resolve_input(input: &str) -> PathBuf {
    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        PathBuf::from(format!("/dev/video{input}"))
    } else {
        PathBuf::from(input)
    }
}

fn is_device(path: &Path) -> bool {
    path.starts_with("/dev")
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn open_reader(input: &Path, prefetch: bool) -> Box<dyn VideoReader> {
    if is_image(input) {
        return Box::new(ImageFileReader::new());
    }
    if prefetch {
        Box::new(PrefetchReader::new(Box::new(FfmpegReader::new())))
    } else {
        Box::new(FfmpegReader::new())
    }
}

/// Raised by the first Ctrl-C so the run can stop and finalize its output.
/// A second Ctrl-C exits immediately.
fn install_quit_flag() -> Arc<AtomicBool> {
    let quit = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&quit);
    let installed = ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            process::exit(130);
        }
        eprintln!("\nStopping...");
    });
    if let Err(e) = installed {
        log::warn!("Ctrl-C will not stop cleanly: {e}");
    }
    quit
}

/// Prints progress and asks the use case to stop once `quit` is raised.
fn progress(verb: &'static str, quit: Arc<AtomicBool>) -> ProgressFn {
    Box::new(move |current, total| {
        if total > 0 {
            eprint!("\r{verb} frame {current}/{total}");
        } else {
            eprint!("\r{verb} frame {current}");
        }
        !quit.load(Ordering::SeqCst)
    })
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
    if total > 0 && downloaded >= total {
        eprintln!();
    }
}
