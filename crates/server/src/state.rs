use std::sync::Arc;

use crate::score_source::{RandomScoreSource, ScoreSource};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub scores: Arc<dyn ScoreSource>,
}

impl AppState {
    pub fn new(scores: Arc<dyn ScoreSource>) -> Self {
        Self { scores }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(RandomScoreSource))
    }
}
