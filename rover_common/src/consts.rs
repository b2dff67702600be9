//! System-wide constants for the rover workspace.
//!
//! Single source of truth for fixed-capacity limits and default values.
//! Imported by all crates; nothing here is duplicated elsewhere.

use static_assertions::const_assert;

/// Maximum number of motor groups a single mechanism port drives
/// (the drivetrain has two: left and right).
pub const MAX_GROUPS: usize = 2;

/// Maximum number of followers in one motor group.
pub const MAX_FOLLOWERS: usize = 3;

/// Maximum number of physical motors in one group (leader + followers).
pub const MAX_MOTORS_PER_GROUP: usize = 1 + MAX_FOLLOWERS;

/// Default tick period in microseconds (50 Hz).
pub const DEFAULT_PERIOD_US: u64 = 20_000;

/// Smallest accepted tick period in microseconds.
pub const PERIOD_US_MIN: u64 = 1_000;

/// Largest accepted tick period in microseconds.
pub const PERIOD_US_MAX: u64 = 100_000;

/// Nominal battery / voltage-compensation voltage.
pub const NOMINAL_BUS_VOLTAGE: f64 = 12.0;

/// Default CAN timeout applied to every motor controller at start-up.
pub const DEFAULT_CAN_TIMEOUT_MS: u32 = 250;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/robot.toml";

/// Standard gravity [m/s²].
pub const GRAVITY: f64 = 9.80665;

const_assert!(MAX_GROUPS >= 2);
const_assert!(MAX_MOTORS_PER_GROUP > MAX_FOLLOWERS);
const_assert!(PERIOD_US_MIN <= DEFAULT_PERIOD_US && DEFAULT_PERIOD_US <= PERIOD_US_MAX);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert_eq!(MAX_MOTORS_PER_GROUP, MAX_FOLLOWERS + 1);
        assert!(NOMINAL_BUS_VOLTAGE > 0.0);
        assert!(DEFAULT_CAN_TIMEOUT_MS > 0);
    }
}
