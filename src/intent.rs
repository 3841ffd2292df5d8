//! Gesture intent classification with jitter and glitch rejection

/// A discrete action classified from continuous input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Brighten,
    Dim,
    Toggle,
}

/// Converts a stream of tracked y-coordinates into directional intents.
///
/// Keeps exactly one reference value: the y-coordinate of the last accepted
/// movement. A new sample triggers an intent only when it has moved far enough
/// from the reference to not be jitter, but not so far that it looks like the
/// tracker lost the hand and found it somewhere else.
///
/// Must be fed from a single sequential frame stream; it holds no other state.
pub struct IntentDebouncer {
    min_delta: f64,
    max_delta: f64,
    reference_y: Option<f64>,
}

impl IntentDebouncer {
    pub fn new(min_delta: f64, max_delta: f64) -> Self {
        Self {
            min_delta,
            max_delta,
            reference_y: None,
        }
    }

    /// Feed the next frame's tracked y-coordinate.
    ///
    /// The first sample only establishes the reference. Afterwards the delta
    /// is `reference - y` (screen coordinates grow downward, so an upward hand
    /// movement yields a positive delta). On acceptance the reference moves to
    /// the current position, so a continuous gesture keeps triggering.
    pub fn observe(&mut self, y: f64) -> Option<Intent> {
        let reference = match self.reference_y {
            Some(reference) => reference,
            None => {
                self.reference_y = Some(y);
                return None;
            }
        };

        let delta = reference - y;
        if delta.abs() <= self.min_delta || delta.abs() >= self.max_delta {
            return None;
        }

        self.reference_y = Some(y);
        Some(if delta > 0.0 {
            Intent::Brighten
        } else {
            Intent::Dim
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> IntentDebouncer {
        IntentDebouncer::new(0.1, 0.6)
    }

    #[test]
    fn test_first_sample_emits_nothing() {
        let mut d = debouncer();
        assert_eq!(d.observe(0.5), None);
    }

    #[test]
    fn test_upward_movement_brightens() {
        let mut d = debouncer();
        d.observe(0.5);
        assert_eq!(d.observe(0.3), Some(Intent::Brighten));
    }

    #[test]
    fn test_downward_movement_dims() {
        let mut d = debouncer();
        d.observe(0.3);
        assert_eq!(d.observe(0.5), Some(Intent::Dim));
    }

    #[test]
    fn test_continuous_gesture_triggers_per_step() {
        let mut d = debouncer();
        d.observe(0.9);
        // Each step is measured from the previously accepted position.
        assert_eq!(d.observe(0.7), Some(Intent::Brighten));
        assert_eq!(d.observe(0.5), Some(Intent::Brighten));
        assert_eq!(d.observe(0.7), Some(Intent::Dim));
    }

    #[test]
    fn test_jitter_is_ignored_and_reference_kept() {
        let mut d = debouncer();
        d.observe(0.5);
        assert_eq!(d.observe(0.45), None);
        assert_eq!(d.observe(0.55), None);
        // Reference is still 0.5: a move that qualifies against it triggers.
        assert_eq!(d.observe(0.3), Some(Intent::Brighten));
    }

    #[test]
    fn test_tracking_glitch_is_ignored() {
        let mut d = debouncer();
        d.observe(0.9);
        // Hand "reappearing" across the screen is not a gesture.
        assert_eq!(d.observe(0.1), None);
        // Reference unchanged, so a real movement from 0.9 still works.
        assert_eq!(d.observe(0.6), Some(Intent::Brighten));
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        // Dyadic samples so the computed deltas land exactly on the bounds.
        let mut d = IntentDebouncer::new(0.25, 0.5);
        d.observe(0.75);
        assert_eq!(d.observe(0.5), None); // |delta| == min_delta
        assert_eq!(d.observe(0.25), None); // |delta| == max_delta
        // Neither rejection moved the reference off 0.75.
        assert_eq!(d.observe(0.375), Some(Intent::Brighten));
    }
}
