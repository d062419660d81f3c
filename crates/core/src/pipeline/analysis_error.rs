use thiserror::Error;

use super::analysis_config::ConfigError;

/// Why a stream produced no verdict.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Also covers sources that cannot be opened at all.
    #[error("no frames could be decoded from the source")]
    NoFramesDecoded,
    #[error("no face detected in any examined frame")]
    NoFaceDetected,
    #[error("frames were decoded but none could be scored")]
    EmptyStream,
    #[error("analysis cancelled")]
    Cancelled,
    #[error("cannot write output: {0}")]
    Output(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
