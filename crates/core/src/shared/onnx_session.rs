use std::path::Path;

/// Opens an ONNX model for inference on the platform's preferred
/// accelerator, falling back to CPU when it is unavailable.
pub fn load_session(model_path: &Path) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    let providers = preferred_execution_providers();
    log::debug!(
        "Loading ONNX model {} ({} accelerated providers)",
        model_path.display(),
        providers.len()
    );
    let session = ort::session::Session::builder()?
        .with_execution_providers(providers)?
        .commit_from_file(model_path)?;
    Ok(session)
}

/// CoreML on macOS, DirectML on Windows, CPU only elsewhere.
pub fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Reads the spatial input size from an NCHW or NHWC model input.
///
/// Returns `None` for dynamic or non-tensor inputs.
pub fn square_input_size(session: &ort::session::Session) -> Option<u32> {
    let input = session.inputs().first()?;
    let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() else {
        return None;
    };
    if shape.len() != 4 {
        return None;
    }
    // NCHW puts channels at 1, NHWC at 3; the spatial size is whichever
    // positive dimension is not the 3-channel one.
    let side = if shape[1] == 3 { shape[2] } else { shape[1] };
    (side > 0).then_some(side as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(any(target_os = "macos", target_os = "windows"))]
    fn test_accelerated_platforms_request_one_provider() {
        assert_eq!(preferred_execution_providers().len(), 1);
    }

    #[test]
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    fn test_other_platforms_run_on_cpu() {
        assert!(preferred_execution_providers().is_empty());
    }

    #[test]
    fn test_missing_model_is_an_error() {
        assert!(load_session(Path::new("/nonexistent/model.onnx")).is_err());
    }
}
