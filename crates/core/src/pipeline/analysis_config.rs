use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::DEFAULT_MAX_FRAMES;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// Fast, lower recall.
    Blazeface,
    /// Slower, higher recall.
    Yolo,
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorKind::Blazeface => write!(f, "blazeface"),
            DetectorKind::Yolo => write!(f, "yolo"),
        }
    }
}

/// Sampling and scoring parameters for one analysis run.
///
/// Loadable from a JSON file; every key is optional and falls back to the
/// default below. Command-line flags are applied on top by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Scored crops to collect before forming a verdict.
    pub max_frames: usize,
    /// Ceiling on frames pulled from the source, scored or not.
    pub max_examined: Option<usize>,
    /// Score the best detected face (`true`) or the whole frame (`false`).
    pub face_required: bool,
    /// Crops per scorer call.
    pub batch_size: usize,
    pub detector: DetectorKind,
    /// Detector threshold; `None` keeps the detector's own default.
    pub detector_confidence: Option<f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            max_examined: None,
            face_required: true,
            batch_size: 1,
            detector: DetectorKind::Yolo,
            detector_confidence: None,
        }
    }
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frames == 0 {
            return Err(ConfigError::Invalid("max_frames must be at least 1".into()));
        }
        if self.max_examined == Some(0) {
            return Err(ConfigError::Invalid(
                "max_examined must be at least 1".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if let Some(c) = self.detector_confidence {
            if !(c > 0.0 && c <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "detector_confidence must be in (0, 1], got {c}"
                )));
            }
        }
        Ok(())
    }
}
