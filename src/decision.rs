use serde::Serialize;
use thiserror::Error;

/// Probabilities strictly above this value are classified as potholes.
pub const THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Pothole,
    Safe,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Pothole => "pothole",
            Label::Safe => "safe",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    pub label: Label,
    /// Percentage in [50, 100].
    pub confidence: f32,
}

impl Decision {
    /// Whole-percent value for the confidence bar, truncated like the UI expects.
    pub fn progress(&self) -> u8 {
        self.confidence.clamp(0., 100.) as u8
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum DecisionError {
    #[error("probability {0} is outside [0, 1]")]
    ProbabilityOutOfRange(f32),
}

pub fn decide(probability: f32) -> Result<Decision, DecisionError> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(DecisionError::ProbabilityOutOfRange(probability));
    }

    let decision = if probability > THRESHOLD {
        Decision {
            label: Label::Pothole,
            confidence: probability * 100.,
        }
    } else {
        Decision {
            label: Label::Safe,
            confidence: (1. - probability) * 100.,
        }
    };

    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_boundary_is_safe() {
        let decision = decide(0.5).unwrap();
        assert_eq!(decision.label, Label::Safe);
        assert_eq!(decision.confidence, 50.0);
    }

    #[test]
    fn test_safe_range() {
        for step in 0..=500 {
            let p = step as f32 / 1000.;
            let decision = decide(p).unwrap();
            assert_eq!(decision.label, Label::Safe, "p = {}", p);
            assert!(approx_eq(decision.confidence, (1. - p) * 100.));
            assert!((50.0..=100.0).contains(&decision.confidence));
        }
    }

    #[test]
    fn test_pothole_range() {
        for step in 501..=1000 {
            let p = step as f32 / 1000.;
            let decision = decide(p).unwrap();
            assert_eq!(decision.label, Label::Pothole, "p = {}", p);
            assert!(approx_eq(decision.confidence, p * 100.));
            assert!(decision.confidence > 50.0 && decision.confidence <= 100.0);
        }
    }

    #[test]
    fn test_just_above_threshold_is_pothole() {
        let p = f32::from_bits(THRESHOLD.to_bits() + 1);
        assert_eq!(decide(p).unwrap().label, Label::Pothole);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(
            decide(0.0).unwrap(),
            Decision {
                label: Label::Safe,
                confidence: 100.0
            }
        );
        assert_eq!(
            decide(1.0).unwrap(),
            Decision {
                label: Label::Pothole,
                confidence: 100.0
            }
        );
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        assert!(decide(-0.01).is_err());
        assert!(decide(1.01).is_err());
        assert!(decide(f32::NAN).is_err());
        assert!(decide(f32::INFINITY).is_err());
    }

    #[test]
    fn test_progress_truncates() {
        let decision = decide(0.9299).unwrap();
        assert_eq!(decision.progress(), 92);
        assert_eq!(decide(0.0).unwrap().progress(), 100);
        assert_eq!(decide(0.5).unwrap().progress(), 50);
    }

    #[test]
    fn test_label_serializes_lowercase() {
        let json = serde_json::to_string(&decide(0.9).unwrap()).unwrap();
        assert!(json.contains("\"label\":\"pothole\""));
    }
}
