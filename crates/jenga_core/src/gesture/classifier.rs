//! Pinch detection from a continuous pinch strength.

/// Discrete gesture derived from consecutive hand frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    /// First pinched frame of a contact
    Pinch,
    /// Every later pinched frame of the same contact
    Hold,
    /// First open frame after a contact
    Release,
}

/// Round to `digits` significant digits (half away from zero).
pub fn round_significant(value: f32, digits: i32) -> f32 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10f32.powi(digits - 1 - magnitude);
    (value * scale).round() / scale
}

/// Edge-detecting pinch classifier.
///
/// The tracker's pinch strength is rounded to two significant digits and
/// compared against the threshold. A contact produces exactly one `Pinch`, any
/// number of `Hold`s and one `Release`.
#[derive(Debug, Clone, PartialEq)]
pub struct PinchClassifier {
    threshold: f32,
    holding: bool,
}

impl Default for PinchClassifier {
    fn default() -> Self {
        Self::new(0.70)
    }
}

impl PinchClassifier {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            holding: false,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_holding(&self) -> bool {
        self.holding
    }

    pub fn is_pinched(&self, pinch_strength: f32) -> bool {
        round_significant(pinch_strength, 2) > self.threshold
    }

    /// Feed one frame's pinch strength. `None` while the hand stays open.
    pub fn classify(&mut self, pinch_strength: f32) -> Option<GestureKind> {
        if self.is_pinched(pinch_strength) {
            if self.holding {
                Some(GestureKind::Hold)
            } else {
                self.holding = true;
                Some(GestureKind::Pinch)
            }
        } else if self.holding {
            self.holding = false;
            Some(GestureKind::Release)
        } else {
            None
        }
    }
}
