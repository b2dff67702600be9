//! Wheel-velocity feedforward.
//!
//! ```text
//! ff = ks × sign(ω) + kv × ω
//! ```
//!
//! `ks` covers static friction, `kv` the back-EMF slope. A zero gain
//! disables its term.

use rover_common::control_unit::config::FeedforwardConfig;

/// Static + velocity feedforward, volts out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleFeedforward {
    /// [V]
    pub ks: f64,
    /// [V per rad/s]
    pub kv: f64,
}

impl SimpleFeedforward {
    pub const fn new(ks: f64, kv: f64) -> Self {
        Self { ks, kv }
    }

    /// Feedforward voltage for a wheel speed [rad/s].
    #[inline]
    pub fn calculate(&self, omega: f64) -> f64 {
        let mut volts = self.kv * omega;
        if self.ks != 0.0 && omega != 0.0 {
            volts += self.ks * omega.signum();
        }
        volts
    }
}

impl From<&FeedforwardConfig> for SimpleFeedforward {
    fn from(cfg: &FeedforwardConfig) -> Self {
        Self::new(cfg.ks, cfg.kv)
    }
}
