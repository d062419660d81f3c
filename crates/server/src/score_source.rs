use rand::Rng;

/// Supplies the per-frame score reported to clients.
pub trait ScoreSource: Send + Sync {
    /// A value in [0, 1].
    fn score(&self) -> f64;
}

/// Uniform random scores. Carries no meaning; stands in until a real
/// detector is wired behind the endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomScoreSource;

impl ScoreSource for RandomScoreSource {
    fn score(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Rounds to the four decimal places clients display.
pub fn round_score(score: f64) -> f64 {
    (score.clamp(0.0, 1.0) * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_random_scores_stay_in_unit_range() {
        let source = RandomScoreSource;
        for _ in 0..1000 {
            let s = source.score();
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[rstest]
    #[case(0.123_456, 0.1235)]
    #[case(0.999_99, 1.0)]
    #[case(0.0, 0.0)]
    #[case(1.7, 1.0)]
    #[case(-0.2, 0.0)]
    fn test_round_score(#[case] input: f64, #[case] expected: f64) {
        assert_eq!(round_score(input), expected);
    }
}
