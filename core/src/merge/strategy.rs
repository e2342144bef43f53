use serde::{Deserialize, Serialize};

/// How contributing confidences combine into `merged_confidence`.
///
/// Both strategies return at least the maximum input, so a single strong
/// detector is never outvoted by weaker ones.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceStrategy {
    #[default]
    Max,
    /// Probabilistic union of independent detectors: `1 - Π(1 - c)`.
    NoisyOr,
}

impl ConfidenceStrategy {
    pub fn combine(&self, confidences: &[f64]) -> f64 {
        if confidences.is_empty() {
            return 0.0;
        }
        let max = confidences.iter().copied().fold(0.0, f64::max);
        match self {
            ConfidenceStrategy::Max => max,
            ConfidenceStrategy::NoisyOr => {
                let miss: f64 = confidences.iter().map(|c| 1.0 - c).product();
                // Rounding in the product must not push the result under the max.
                (1.0 - miss).clamp(max, 1.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_takes_strongest() {
        assert_eq!(ConfidenceStrategy::Max.combine(&[0.4, 0.9, 0.2]), 0.9);
        assert_eq!(ConfidenceStrategy::Max.combine(&[]), 0.0);
    }

    #[test]
    fn noisy_or_never_drops_below_max() {
        let c = ConfidenceStrategy::NoisyOr.combine(&[0.5, 0.5]);
        assert!((c - 0.75).abs() < 1e-12);
        let single = ConfidenceStrategy::NoisyOr.combine(&[0.3]);
        assert!((single - 0.3).abs() < 1e-12);
        assert!(ConfidenceStrategy::NoisyOr.combine(&[0.9, 0.1]) >= 0.9);
    }
}
