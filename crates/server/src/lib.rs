//! Placeholder scoring endpoint for the browser extension.
//!
//! Serves the same message shapes a real detector backend would, backed by
//! a [`ScoreSource`] that currently produces random scores.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod score_source;
pub mod state;
pub mod ws;

pub use config::ServerConfig;
pub use error::ServerError;
pub use routes::create_router;
pub use score_source::{RandomScoreSource, ScoreSource};
pub use state::AppState;
