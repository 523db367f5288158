// Presence Node: Presence Classifier
//
// Majority-threshold vote over one active window. Sample order does not
// matter; only the number of close readings does.

use crate::config::DetectionConfig;
use crate::events::{PresenceVerdict, Sample};

/// What to do with samples whose echo timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidSamplePolicy {
    /// Timeouts occupy a slot in the window but never vote "close".
    #[default]
    Exclude,
    /// Timeouts vote "close", as a 0 cm reading would.
    CountAsClose,
}

/// Vote counts for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub total: usize,
    pub close: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone)]
pub struct PresenceClassifier {
    threshold_cm: f32,
    required_count: usize,
    invalid_samples: InvalidSamplePolicy,
}

impl PresenceClassifier {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            threshold_cm: config.threshold_cm,
            required_count: config.required_count,
            invalid_samples: config.invalid_samples,
        }
    }

    pub fn is_close(&self, sample: &Sample) -> bool {
        match sample {
            Sample::Distance(cm) => *cm < self.threshold_cm,
            Sample::Invalid => self.invalid_samples == InvalidSamplePolicy::CountAsClose,
        }
    }

    pub fn tally(&self, samples: &[Sample]) -> Tally {
        samples.iter().fold(Tally::default(), |mut tally, sample| {
            tally.total += 1;
            if !sample.is_valid() {
                tally.invalid += 1;
            }
            if self.is_close(sample) {
                tally.close += 1;
            }
            tally
        })
    }

    pub fn decide(&self, tally: &Tally) -> PresenceVerdict {
        PresenceVerdict::from_present(tally.close >= self.required_count)
    }

    pub fn classify(&self, samples: &[Sample]) -> PresenceVerdict {
        self.decide(&self.tally(samples))
    }
}

/// One-shot classification with timeouts excluded from the vote.
pub fn classify(samples: &[Sample], threshold_cm: f32, required_count: usize) -> PresenceVerdict {
    PresenceClassifier::new(&DetectionConfig {
        threshold_cm,
        required_count,
        invalid_samples: InvalidSamplePolicy::Exclude,
    })
    .classify(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(distances: &[f32]) -> Vec<Sample> {
        distances.iter().map(|cm| Sample::Distance(*cm)).collect()
    }

    #[test]
    fn six_of_ten_close_is_presence() {
        let samples = window(&[40.0, 40.0, 40.0, 40.0, 40.0, 40.0, 60.0, 60.0, 60.0, 60.0]);
        assert_eq!(classify(&samples, 50.0, 6), PresenceVerdict::Present);
    }

    #[test]
    fn one_short_of_required_is_absence() {
        let samples = window(&[40.0, 40.0, 40.0, 40.0, 40.0, 60.0, 60.0, 60.0, 60.0, 60.0]);
        assert_eq!(classify(&samples, 50.0, 6), PresenceVerdict::Absent);
    }

    #[test]
    fn threshold_is_strict() {
        let samples = window(&[50.0; 10]);
        assert_eq!(classify(&samples, 50.0, 1), PresenceVerdict::Absent);
        let samples = window(&[49.9]);
        assert_eq!(classify(&samples, 50.0, 1), PresenceVerdict::Present);
    }

    #[test]
    fn order_does_not_matter() {
        let forward = window(&[10.0, 90.0, 20.0, 80.0, 30.0, 70.0, 40.0, 60.0, 45.0, 200.0]);
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut sorted = forward.clone();
        sorted.sort_by(|a, b| a.distance_cm().partial_cmp(&b.distance_cm()).unwrap());

        for required in 1..=10 {
            let expected = classify(&forward, 50.0, required);
            assert_eq!(classify(&reversed, 50.0, required), expected);
            assert_eq!(classify(&sorted, 50.0, required), expected);
            // 5 of these readings are below 50 cm.
            assert_eq!(expected.is_present(), required <= 5);
        }
    }

    #[test]
    fn empty_window_is_absence() {
        assert_eq!(classify(&[], 50.0, 1), PresenceVerdict::Absent);
    }

    #[test]
    fn timeouts_are_excluded_by_default() {
        let classifier = PresenceClassifier::new(&DetectionConfig {
            threshold_cm: 50.0,
            required_count: 6,
            invalid_samples: InvalidSamplePolicy::default(),
        });
        let mut samples = vec![Sample::Invalid; 8];
        samples.extend(window(&[30.0, 30.0]));

        let tally = classifier.tally(&samples);
        assert_eq!(tally, Tally { total: 10, close: 2, invalid: 8 });
        assert_eq!(classifier.decide(&tally), PresenceVerdict::Absent);
    }

    #[test]
    fn timeouts_can_vote_close() {
        let classifier = PresenceClassifier::new(&DetectionConfig {
            threshold_cm: 50.0,
            required_count: 6,
            invalid_samples: InvalidSamplePolicy::CountAsClose,
        });
        let samples = vec![Sample::Invalid; 6];
        assert_eq!(classifier.classify(&samples), PresenceVerdict::Present);
        assert_eq!(classifier.tally(&samples).invalid, 6);
    }
}
