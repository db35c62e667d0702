//! Closed trials.
//!
//! A trial spans two consecutive selections. Everything measured about it is
//! frozen into a [`CompletedTrial`] once, when the second selection arrives.

use crate::{
    error::Result,
    geometry::{AxisResolution, Direction, Quat},
    metrics::TrialMeasurement,
    movement::{MovementSample, MovementSampleBuffer, PhaseSplit, SpeedStats},
    overshoot::OvershootSummary,
    targets::{ActiveTarget, GrowthPattern, TargetPair},
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Training,
    Testing,
}

/// Where the closing selection sits in the session
#[derive(Debug, Clone, Copy)]
pub struct TrialContext<'a> {
    pub phase: Phase,
    pub set_index: usize,
    /// 1-based within the set
    pub trial_index: usize,
    pub pair: &'a TargetPair,
    pub active: ActiveTarget,
    pub axis: AxisResolution,
    pub dwell_time: f64,
    pub min_speed: f64,
    /// Controller orientation at the opening and closing selections
    pub start_rotation: Quat,
    pub end_rotation: Quat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletedTrial {
    pub phase: Phase,
    pub set_index: usize,
    pub trial_index: usize,
    pub pair_index: usize,
    pub block_index: usize,
    pub block_label: char,
    pub target_id: i32,
    pub active_target: ActiveTarget,
    pub direction: Direction,
    pub growth: GrowthPattern,
    pub axis: AxisResolution,
    /// The block's direction label was not recognised
    pub direction_fallback: bool,
    /// Nominal amplitude [m]
    pub amplitude: f64,
    /// Nominal width [m]
    pub width: f64,
    pub start: MovementSample,
    pub end: MovementSample,
    pub start_rotation: Quat,
    pub end_rotation: Quat,
    pub movement_time: f64,
    pub reaction_time: Option<f64>,
    pub dwell_time: f64,
    pub hit: bool,
    pub axis_distance: f64,
    pub path_length: f64,
    pub euclidean_distance: f64,
    pub euclidean_deviation: f64,
    pub endpoint_deviation: f64,
    pub perpendicular_deviation: f64,
    pub effective_amplitude: f64,
    pub split: PhaseSplit,
    pub speed: SpeedStats,
    pub overshoot: OvershootSummary,
}

impl CompletedTrial {
    pub fn close(
        ctx: TrialContext<'_>,
        buffer: &MovementSampleBuffer,
        overshoot: OvershootSummary,
    ) -> Result<Self> {
        let pair = ctx.pair;
        let target = pair.geometry(ctx.active)?;
        let axis = ctx.axis.axis;

        let start = buffer.first().copied().unwrap_or_default();
        let end = buffer.last().copied().unwrap_or(start);
        let delta = end.position - start.position;

        let path_length = buffer.path_length();
        let euclidean_distance = buffer.euclidean_distance();

        Ok(Self {
            phase: ctx.phase,
            set_index: ctx.set_index,
            trial_index: ctx.trial_index,
            pair_index: pair.pair_index,
            block_index: pair.block_index,
            block_label: pair.block_label(),
            target_id: pair.target_id,
            active_target: ctx.active,
            direction: pair.direction(),
            growth: pair.growth(),
            axis: ctx.axis,
            direction_fallback: pair.direction_fallback,
            amplitude: pair.distance,
            width: pair.width,
            start,
            end,
            start_rotation: ctx.start_rotation,
            end_rotation: ctx.end_rotation,
            movement_time: end.timestamp - start.timestamp,
            reaction_time: buffer.movement_onset(ctx.min_speed),
            dwell_time: ctx.dwell_time,
            hit: target.contains(&end.position),
            axis_distance: buffer.axis_aligned_distance(&axis),
            path_length,
            euclidean_distance,
            euclidean_deviation: (path_length - euclidean_distance).max(0.0),
            endpoint_deviation: axis.project(end.position - target.center),
            perpendicular_deviation: axis.perpendicular(delta).norm(),
            effective_amplitude: axis.project(delta).abs(),
            split: buffer.phase_split(&axis),
            speed: buffer.speed_stats(ctx.min_speed),
            overshoot,
        })
    }

    pub fn measurement(&self) -> TrialMeasurement {
        TrialMeasurement {
            amplitude: self.amplitude,
            width: self.width,
            movement_time: self.movement_time,
            axis_distance: self.axis_distance,
            path_length: self.path_length,
            euclidean_distance: self.euclidean_distance,
            euclidean_deviation: self.euclidean_deviation,
            endpoint_deviation: self.endpoint_deviation,
            perpendicular_deviation: self.perpendicular_deviation,
            effective_amplitude: self.effective_amplitude,
            hit: self.hit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::{MovementAxis, TargetGeometry, Vec3},
        targets::{SizeClass, TargetSpec, WidthClass, DistanceClass},
    };

    fn pair() -> TargetPair {
        let spec = TargetSpec {
            direction: Direction::Horizontal,
            size: SizeClass::Testing {
                width: WidthClass::Wide,
                distance: DistanceClass::Short,
            },
            growth: GrowthPattern::Linear,
        };
        let mut pair = TargetPair::new(spec, 3, 0, 0.5, 2.0);
        let half = Vec3::new(0.25, 0.25, 0.25);
        pair.attach_geometry(
            TargetGeometry::new(Vec3::new(-1.0, 0.0, 0.0), half),
            TargetGeometry::new(Vec3::new(1.0, 0.0, 0.0), half),
        );
        pair
    }

    fn context(pair: &TargetPair) -> TrialContext<'_> {
        TrialContext {
            phase: Phase::Testing,
            set_index: 0,
            trial_index: 1,
            pair,
            active: ActiveTarget::Second,
            axis: AxisResolution {
                axis: MovementAxis::new(Direction::Horizontal, true),
                fallback: false,
            },
            dwell_time: 0.0,
            min_speed: 0.01,
            start_rotation: Quat::identity(),
            end_rotation: Quat::from_euler_angles(0.0, 0.0, 0.5),
        }
    }

    #[test]
    fn straight_movement_measures() {
        let pair = pair();
        let mut buffer = MovementSampleBuffer::new();
        buffer.push(Vec3::new(-1.0, 0.0, 0.0), 0.0);
        buffer.push(Vec3::new(0.0, 0.0, 0.0), 0.25);
        buffer.push(Vec3::new(1.125, 0.0, 0.0), 0.5);

        let trial = CompletedTrial::close(context(&pair), &buffer, OvershootSummary::default()).unwrap();
        assert_eq!(trial.movement_time, 0.5);
        assert!(trial.hit);
        assert_eq!(trial.endpoint_deviation, 0.125);
        assert_eq!(trial.perpendicular_deviation, 0.0);
        assert_eq!(trial.effective_amplitude, 2.125);
        assert_eq!(trial.axis_distance, 2.125);
        assert_eq!(trial.euclidean_deviation, 0.0);
        assert_eq!(trial.amplitude, 2.0);
        assert_eq!(trial.target_id, 4);
        assert_eq!(trial.block_label, 'A');
        assert_eq!(trial.start_rotation, Quat::identity());
        assert!((trial.end_rotation.angle() - 0.5).abs() < 1e-12);
        assert!(!trial.direction_fallback);
    }

    #[test]
    fn miss_off_axis() {
        let pair = pair();
        let mut buffer = MovementSampleBuffer::new();
        buffer.push(Vec3::new(-1.0, 0.0, 0.0), 0.0);
        buffer.push(Vec3::new(1.0, 0.5, 0.0), 1.0);

        let trial = CompletedTrial::close(context(&pair), &buffer, OvershootSummary::default()).unwrap();
        assert!(!trial.hit);
        assert_eq!(trial.perpendicular_deviation, 0.5);
        assert_eq!(trial.endpoint_deviation, 0.0);
        assert!(trial.measurement().euclidean_distance > 2.0);
    }
}
