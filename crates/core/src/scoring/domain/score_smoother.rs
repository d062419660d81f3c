use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

pub const DEFAULT_WINDOW: usize = 5;
pub const DEFAULT_DANGER_THRESHOLD: f64 = 0.75;
pub const DEFAULT_WARNING_THRESHOLD: f64 = 0.4;
pub const DEFAULT_REQUIRED_CONSECUTIVE: usize = 3;

/// Alert level of a running score stream, ordered by severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Safe,
    Warning,
    Danger,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Safe => write!(f, "safe"),
            AlertLevel::Warning => write!(f, "warning"),
            AlertLevel::Danger => write!(f, "danger"),
        }
    }
}

/// Sliding-window mean over a live score stream with a debounce on the
/// danger level.
///
/// A window mean at or above the danger threshold only raises `Danger` after
/// `required_consecutive` such updates in a row; until then the previous
/// level is kept. Any mean below it resets the streak.
pub struct ScoreSmoother {
    window: VecDeque<f64>,
    capacity: usize,
    danger_threshold: f64,
    warning_threshold: f64,
    required_consecutive: usize,
    consecutive: usize,
    level: AlertLevel,
}

impl ScoreSmoother {
    pub fn new(
        capacity: usize,
        danger_threshold: f64,
        warning_threshold: f64,
        required_consecutive: usize,
    ) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            danger_threshold,
            warning_threshold,
            required_consecutive: required_consecutive.max(1),
            consecutive: 0,
            level: AlertLevel::Safe,
        }
    }

    /// Adds a score and returns the resulting level.
    pub fn push(&mut self, score: f64) -> AlertLevel {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(score);

        let mean = self.mean();
        if mean >= self.danger_threshold {
            self.consecutive += 1;
            if self.consecutive >= self.required_consecutive {
                self.level = AlertLevel::Danger;
            }
        } else if mean >= self.warning_threshold {
            self.consecutive = 0;
            self.level = AlertLevel::Warning;
        } else {
            self.consecutive = 0;
            self.level = AlertLevel::Safe;
        }
        self.level
    }

    pub fn level(&self) -> AlertLevel {
        self.level
    }

    /// Mean of the current window; 0 when nothing has been pushed.
    pub fn mean(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }
}

impl Default for ScoreSmoother {
    fn default() -> Self {
        Self::new(
            DEFAULT_WINDOW,
            DEFAULT_DANGER_THRESHOLD,
            DEFAULT_WARNING_THRESHOLD,
            DEFAULT_REQUIRED_CONSECUTIVE,
        )
    }
}
