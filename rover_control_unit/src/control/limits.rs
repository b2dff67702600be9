//! Travel-limit output guard.
//!
//! Applied after the controller decision: at or beyond a physical limit the
//! voltage that would push further into the hard stop is replaced by zero.
//! Voltage pulling away from the limit always passes.

use rover_common::control_unit::state::LimitClamp;

/// Slack for the rotations to degrees round trip of a pinned encoder [deg].
const LIMIT_TOLERANCE: f64 = 1e-6;

/// Physical travel range of a joint [deg].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelLimits {
    lower: f64,
    upper: f64,
}

impl TravelLimits {
    /// `lower < upper` is checked at configuration time.
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    #[inline]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Guard a voltage at `position`. Returns the voltage to apply and the
    /// limit that suppressed it, if any.
    #[inline]
    pub fn guard(&self, position: f64, volts: f64) -> (f64, Option<LimitClamp>) {
        if volts > 0.0 && position >= self.upper - LIMIT_TOLERANCE {
            (0.0, Some(LimitClamp::Upper))
        } else if volts < 0.0 && position <= self.lower + LIMIT_TOLERANCE {
            (0.0, Some(LimitClamp::Lower))
        } else {
            (volts, None)
        }
    }

    /// Whether `position` lies within the range, limits included.
    #[inline]
    pub fn contains(&self, position: f64) -> bool {
        (self.lower..=self.upper).contains(&position)
    }
}
