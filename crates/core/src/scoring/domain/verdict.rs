use std::fmt;

use serde::Serialize;

use crate::shared::constants::FAKE_THRESHOLD;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Real,
    Fake,
}

impl Label {
    /// `Fake` iff `score` is strictly above the midpoint.
    pub fn from_score(score: f64) -> Self {
        if score > FAKE_THRESHOLD as f64 {
            Label::Fake
        } else {
            Label::Real
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Real => write!(f, "REAL"),
            Label::Fake => write!(f, "FAKE"),
        }
    }
}

/// Distance of `score` from the midpoint, expressed as the probability of the
/// winning label. Always in [0.5, 1.0] for scores in [0,1].
pub fn confidence_for(score: f64) -> f64 {
    match Label::from_score(score) {
        Label::Fake => score,
        Label::Real => 1.0 - score,
    }
}

/// Video-level classification: label, confidence in [0.5, 1.0] and the
/// number of scored crops it was derived from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Verdict {
    label: Label,
    confidence: f64,
    frames_used: usize,
}

impl Verdict {
    /// Averages the scores and thresholds the mean at 0.5.
    ///
    /// Returns `None` for an empty slice; there is no default verdict.
    pub fn from_scores(scores: &[f32]) -> Option<Verdict> {
        if scores.is_empty() {
            return None;
        }
        let mean = scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64;
        let mean = mean.clamp(0.0, 1.0);
        Some(Verdict {
            label: Label::from_score(mean),
            confidence: confidence_for(mean),
            frames_used: scores.len(),
        })
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn frames_used(&self) -> usize {
        self.frames_used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_mostly_fake_scores() {
        let v = Verdict::from_scores(&[0.9, 0.8, 0.95]).unwrap();
        assert_eq!(v.label(), Label::Fake);
        assert_relative_eq!(v.confidence(), 0.8833333, epsilon = 1e-6);
        assert_eq!(v.frames_used(), 3);
    }

    #[test]
    fn test_mostly_real_scores() {
        let v = Verdict::from_scores(&[0.1, 0.2]).unwrap();
        assert_eq!(v.label(), Label::Real);
        assert_relative_eq!(v.confidence(), 0.85, epsilon = 1e-6);
        assert_eq!(v.frames_used(), 2);
    }

    #[test]
    fn test_empty_scores_give_no_verdict() {
        assert_eq!(Verdict::from_scores(&[]), None);
    }

    #[test]
    fn test_exact_midpoint_is_real() {
        let v = Verdict::from_scores(&[0.5]).unwrap();
        assert_eq!(v.label(), Label::Real);
        assert_relative_eq!(v.confidence(), 0.5);
    }

    #[test]
    fn test_midpoint_reached_by_averaging_is_real() {
        let v = Verdict::from_scores(&[0.25, 0.75]).unwrap();
        assert_eq!(v.label(), Label::Real);
    }

    #[rstest]
    #[case(&[0.0])]
    #[case(&[1.0])]
    #[case(&[0.5, 0.5000001])]
    #[case(&[0.3, 0.9, 0.1, 0.99])]
    #[case(&[0.49999, 0.0, 1.0])]
    fn test_confidence_is_within_half_and_one(#[case] scores: &[f32]) {
        let v = Verdict::from_scores(scores).unwrap();
        assert!((0.5..=1.0).contains(&v.confidence()), "{}", v.confidence());
        let mean = scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64;
        assert_eq!(v.label() == Label::Fake, mean > 0.5);
    }

    #[test]
    fn test_label_display() {
        assert_eq!(Label::Real.to_string(), "REAL");
        assert_eq!(Label::Fake.to_string(), "FAKE");
    }

    #[test]
    fn test_serializes_with_uppercase_label() {
        let v = Verdict::from_scores(&[1.0]).unwrap();
        let json = serde_json::to_value(v).unwrap();
        assert_eq!(json["label"], "FAKE");
        assert_eq!(json["frames_used"], 1);
        assert_eq!(json["confidence"], 1.0);
    }
}
