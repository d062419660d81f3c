//! HTTP handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::score_source::round_score;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// A frame submitted for scoring. Every field is optional; `image_base64`
/// is accepted but not decoded.
#[derive(Debug, Default, PartialEq)]
pub struct FrameRequest {
    pub frame_id: Option<Value>,
    pub image_base64: Option<String>,
}

impl FrameRequest {
    /// Parses a request body, treating anything that is not a JSON object
    /// as an empty request. Fields are read independently, so a malformed
    /// field never hides a valid `frame_id`.
    pub fn parse_lenient(body: &[u8]) -> Self {
        let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
            return Self::default();
        };
        Self {
            frame_id: map.get("frame_id").filter(|v| !v.is_null()).cloned(),
            image_base64: map
                .get("image_base64")
                .and_then(Value::as_str)
                .map(str::to_owned),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FrameScore {
    pub frame_id: Option<Value>,
    pub score: f64,
}

impl FrameScore {
    pub fn new(request: FrameRequest, score: f64) -> Self {
        Self {
            frame_id: request.frame_id,
            score: round_score(score),
        }
    }
}

/// Scores one frame. The body is read as raw bytes so a missing or wrong
/// content type still gets an answer.
pub async fn predict_frame(State(state): State<AppState>, body: Bytes) -> Json<FrameScore> {
    let request = FrameRequest::parse_lenient(&body);
    Json(FrameScore::new(request, state.scores.score()))
}
