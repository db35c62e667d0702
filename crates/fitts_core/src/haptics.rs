//! Haptic guidance intensity.
//!
//! The closeness ratio `r = clamp(1 - d / D, 0, 1)` compares the controller's
//! current distance `d` to the active target with the nominal pair distance
//! `D`, so intensity rises from 0 at the departure target to full strength on
//! arrival.

use crate::{
    constants::{MAX_HAPTIC_INTENSITY, PULSE_PERIOD_FAR_S, PULSE_PERIOD_NEAR_S, STAIR_STEPS},
    targets::GrowthPattern,
};
use log::warn;

/// Intensity request for the actuator driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HapticRequest {
    /// 0..=100
    pub intensity: u8,
    pub growth: GrowthPattern,
    pub ratio: f64,
}

pub fn closeness_ratio(distance_to_target: f64, target_distance: f64) -> f64 {
    if !(target_distance.is_finite() && target_distance > 0.0) || !distance_to_target.is_finite() {
        warn!(
            "Cannot scale haptics: distance {} over nominal distance {}",
            distance_to_target, target_distance
        );
        return 0.0;
    }
    (1.0 - distance_to_target / target_distance).clamp(0.0, 1.0)
}

/// Intensity in 0..=100 for a closeness ratio. `elapsed` drives the pulse
/// pattern's on/off cycle.
pub fn intensity(growth: GrowthPattern, ratio: f64, elapsed: f64) -> u8 {
    let r = ratio.clamp(0.0, 1.0);
    let level = match growth {
        GrowthPattern::Linear => r,
        GrowthPattern::Quadratic => r * r,
        GrowthPattern::Stair => (r * STAIR_STEPS).floor() / STAIR_STEPS,
        GrowthPattern::Pulse => {
            let period = PULSE_PERIOD_FAR_S + (PULSE_PERIOD_NEAR_S - PULSE_PERIOD_FAR_S) * r;
            let phase = elapsed.max(0.0).rem_euclid(period);
            if phase < period / 2.0 { r } else { 0.0 }
        }
    };
    (level * f64::from(MAX_HAPTIC_INTENSITY)).round() as u8
}

pub fn request(
    growth: GrowthPattern,
    distance_to_target: f64,
    target_distance: f64,
    elapsed: f64,
) -> HapticRequest {
    let ratio = closeness_ratio(distance_to_target, target_distance);
    HapticRequest {
        intensity: intensity(growth, ratio, elapsed),
        growth,
        ratio,
    }
}
