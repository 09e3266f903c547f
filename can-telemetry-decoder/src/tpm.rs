//! Tire pressure heuristic
//!
//! A soft tire has a smaller rolling radius and so turns faster than the other
//! three. After every wheel speed frame the four wheels are compared pairwise
//! (front axle, rear axle, left side, right side). A corner whose wheel is
//! faster on both of its pairs gains a point; otherwise it loses one, subject
//! to the two-tier hysteresis below. A corner whose counter exceeds the alert
//! threshold raises a "check pressure" advisory.
//!
//! Decrement tiers for a non-triggering sample:
//! - counter below the threshold: lose one point
//! - threshold up to ten times the threshold: lose one point per
//!   `cautious_decay_interval` consecutive non-triggering samples
//! - ten times the threshold or more: held
//!
//! Counters never go below zero. Nothing is evaluated while cornering.

use crate::config::MonitorConfig;
use crate::message_decoder::WheelSpeeds;
use crate::types::Corner;
use serde::Serialize;

/// Relative speed difference of each wheel pairing
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PairSkew {
    /// (FL - FR) / avg
    pub front: f64,
    /// (RL - RR) / avg
    pub rear: f64,
    /// (FL - RL) / avg
    pub left: f64,
    /// (FR - RR) / avg
    pub right: f64,
}

impl PairSkew {
    pub fn from_speeds(speeds: &WheelSpeeds) -> Self {
        Self {
            front: relative(speeds.front_left, speeds.front_right),
            rear: relative(speeds.rear_left, speeds.rear_right),
            left: relative(speeds.front_left, speeds.rear_left),
            right: relative(speeds.front_right, speeds.rear_right),
        }
    }

    /// Whether `corner` is spinning faster than both of its neighbours
    fn favours(&self, corner: Corner, ratio: f64) -> bool {
        match corner {
            Corner::FrontLeft => self.front > ratio && self.left > ratio,
            Corner::FrontRight => self.front < -ratio && self.right > ratio,
            Corner::RearLeft => self.rear > ratio && self.left < -ratio,
            Corner::RearRight => self.rear < -ratio && self.right < -ratio,
        }
    }
}

/// Difference of `a` and `b` relative to their mean, zero when the mean is zero
fn relative(a: f64, b: f64) -> f64 {
    let avg = (a + b) / 2.0;
    if avg == 0.0 {
        0.0
    } else {
        (a - b) / avg
    }
}

/// Result of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TpmReport {
    pub skew: PairSkew,
    pub counters: [i32; 4],
    pub advisories: [bool; 4],
}

impl TpmReport {
    pub fn advisory(&self, corner: Corner) -> bool {
        self.advisories[corner.index()]
    }

    pub fn counter(&self, corner: Corner) -> i32 {
        self.counters[corner.index()]
    }

    /// Corners currently raising an advisory
    pub fn alerted(&self) -> impl Iterator<Item = Corner> + '_ {
        Corner::ALL.into_iter().filter(move |corner| self.advisory(*corner))
    }
}

/// Per-corner hysteresis counters
#[derive(Debug, Clone, PartialEq)]
pub struct TirePressureMonitor {
    steering_limit_squared: i64,
    alert_threshold: i32,
    skew_ratio: f64,
    cautious_decay_interval: u32,
    counters: [i32; 4],
    cautious_streak: [u32; 4],
}

impl TirePressureMonitor {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            steering_limit_squared: config.steering_limit_squared(),
            alert_threshold: config.alert_threshold,
            skew_ratio: config.skew_ratio,
            cautious_decay_interval: config.cautious_decay_interval.max(1),
            counters: [0; 4],
            cautious_streak: [0; 4],
        }
    }

    /// Whether the steering angle excludes this sample
    pub fn is_cornering(&self, steering_angle: i32) -> bool {
        let angle = i64::from(steering_angle);
        angle * angle > self.steering_limit_squared
    }

    /// Evaluate one set of fresh wheel speeds
    ///
    /// Returns `None` without touching any counter while cornering.
    pub fn check(&mut self, steering_angle: i32, speeds: &WheelSpeeds) -> Option<TpmReport> {
        if self.is_cornering(steering_angle) {
            log::trace!("Cornering at {} deg, tire check skipped", steering_angle);
            return None;
        }

        let skew = PairSkew::from_speeds(speeds);
        let mut advisories = [false; 4];

        for corner in Corner::ALL {
            let triggered = skew.favours(corner, self.skew_ratio);
            self.step(corner.index(), triggered);
            advisories[corner.index()] = self.counters[corner.index()] > self.alert_threshold;
        }

        Some(TpmReport {
            skew,
            counters: self.counters,
            advisories,
        })
    }

    fn step(&mut self, i: usize, triggered: bool) {
        let counter = &mut self.counters[i];
        let streak = &mut self.cautious_streak[i];

        if triggered {
            *counter += 1;
            *streak = 0;
        } else if *counter < self.alert_threshold {
            *counter -= 1;
            *streak = 0;
        } else if *counter < self.alert_threshold.saturating_mul(10) {
            *streak += 1;
            if *streak >= self.cautious_decay_interval {
                *counter -= 1;
                *streak = 0;
            }
        }

        if *counter < 0 {
            *counter = 0;
        }
    }

    pub fn counter(&self, corner: Corner) -> i32 {
        self.counters[corner.index()]
    }

    pub fn counters(&self) -> [i32; 4] {
        self.counters
    }

    pub fn advisory(&self, corner: Corner) -> bool {
        self.counter(corner) > self.alert_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speeds(front_left: f64, front_right: f64, rear_left: f64, rear_right: f64) -> WheelSpeeds {
        WheelSpeeds {
            front_left,
            front_right,
            rear_left,
            rear_right,
        }
    }

    fn monitor() -> TirePressureMonitor {
        TirePressureMonitor::new(
            &MonitorConfig::new()
                .with_steering_limit(10)
                .with_alert_threshold(5)
                .with_cautious_decay_interval(3),
        )
    }

    #[test]
    fn test_skew_ratios() {
        let skew = PairSkew::from_speeds(&speeds(52.0, 50.0, 50.0, 50.0));
        assert!((skew.front - 2.0 / 51.0).abs() < 1e-12);
        assert!((skew.left - 2.0 / 51.0).abs() < 1e-12);
        assert_eq!(skew.rear, 0.0);
        assert_eq!(skew.right, 0.0);
    }

    #[test]
    fn test_standstill_has_no_skew() {
        let skew = PairSkew::from_speeds(&speeds(0.0, 0.0, 0.0, 0.0));
        assert_eq!(skew, PairSkew::default());
    }

    #[test]
    fn test_cornering_is_a_no_op() {
        let mut tpm = monitor();
        for _ in 0..20 {
            assert_eq!(tpm.check(11, &speeds(60.0, 50.0, 50.0, 50.0)), None);
            assert_eq!(tpm.check(-11, &speeds(60.0, 50.0, 50.0, 50.0)), None);
        }
        assert_eq!(tpm.counters(), [0; 4]);
    }

    #[test]
    fn test_limit_angle_is_not_cornering() {
        let tpm = monitor();
        assert!(!tpm.is_cornering(10));
        assert!(!tpm.is_cornering(-10));
        assert!(tpm.is_cornering(11));
    }

    #[test]
    fn test_front_left_skew_raises_advisory() {
        let mut tpm = monitor();
        let skewed = speeds(52.0, 50.0, 50.0, 50.0);

        let mut last = 0;
        for _ in 0..5 {
            let report = tpm.check(0, &skewed).unwrap();
            assert!(report.counter(Corner::FrontLeft) > last);
            last = report.counter(Corner::FrontLeft);
            assert!(!report.advisory(Corner::FrontLeft));
        }

        let report = tpm.check(0, &skewed).unwrap();
        assert_eq!(report.counter(Corner::FrontLeft), 6);
        assert!(report.advisory(Corner::FrontLeft));
        assert_eq!(report.alerted().collect::<Vec<_>>(), vec![Corner::FrontLeft]);
        assert_eq!(report.counter(Corner::FrontRight), 0);
    }

    #[test]
    fn test_single_favourable_sample_keeps_advisory() {
        let mut tpm = monitor();
        for _ in 0..6 {
            tpm.check(0, &speeds(52.0, 50.0, 50.0, 50.0));
        }
        assert!(tpm.advisory(Corner::FrontLeft));

        let even = speeds(50.0, 50.0, 50.0, 50.0);
        let report = tpm.check(0, &even).unwrap();
        assert!(report.advisory(Corner::FrontLeft));
        assert_eq!(report.counter(Corner::FrontLeft), 6);

        // third consecutive even sample costs one point
        tpm.check(0, &even);
        let report = tpm.check(0, &even).unwrap();
        assert_eq!(report.counter(Corner::FrontLeft), 5);
        assert!(!report.advisory(Corner::FrontLeft));
    }

    #[test]
    fn test_trusted_regime_decays_each_sample_and_clamps() {
        let mut tpm = monitor();
        for _ in 0..3 {
            tpm.check(0, &speeds(52.0, 50.0, 50.0, 50.0));
        }
        assert_eq!(tpm.counter(Corner::FrontLeft), 3);

        let even = speeds(50.0, 50.0, 50.0, 50.0);
        for expected in [2, 1, 0, 0, 0] {
            tpm.check(0, &even);
            assert_eq!(tpm.counter(Corner::FrontLeft), expected);
        }
    }

    #[test]
    fn test_counter_held_at_ten_times_threshold() {
        let mut tpm = monitor();
        for _ in 0..50 {
            tpm.check(0, &speeds(52.0, 50.0, 50.0, 50.0));
        }
        assert_eq!(tpm.counter(Corner::FrontLeft), 50);

        for _ in 0..100 {
            tpm.check(0, &speeds(50.0, 50.0, 50.0, 50.0));
        }
        assert_eq!(tpm.counter(Corner::FrontLeft), 50);
        assert!(tpm.advisory(Corner::FrontLeft));
    }

    #[test]
    fn test_each_corner_direction() {
        let cases = [
            (speeds(52.0, 50.0, 50.0, 50.0), Corner::FrontLeft),
            (speeds(50.0, 52.0, 50.0, 50.0), Corner::FrontRight),
            (speeds(50.0, 50.0, 52.0, 50.0), Corner::RearLeft),
            (speeds(50.0, 50.0, 50.0, 52.0), Corner::RearRight),
        ];

        for (wheels, expected) in cases {
            let mut tpm = monitor();
            let report = tpm.check(0, &wheels).unwrap();
            for corner in Corner::ALL {
                let want = if corner == expected { 1 } else { 0 };
                assert_eq!(report.counter(corner), want, "{:?} with {:?}", corner, wheels);
            }
        }
    }
}
