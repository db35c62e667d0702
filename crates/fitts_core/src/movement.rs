//! Per-trial pose buffer and the path measures derived from it.
//!
//! Samples are collected from the selection that opens a trial up to the
//! selection that closes it. All measures are zero for buffers with fewer
//! than two samples.

use crate::geometry::{MovementAxis, Vec3};
use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementSample {
    pub position: Vec3,
    /// Seconds
    pub timestamp: f64,
}

impl Default for MovementSample {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            timestamp: 0.0,
        }
    }
}

/// Distances and duration of one sub-phase of a movement
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseStats {
    pub axis_distance: f64,
    pub path_length: f64,
    pub duration: f64,
}

/// Ballistic (start to peak speed) and correction (peak speed to end) phases
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseSplit {
    pub peak_index: usize,
    pub peak_speed: f64,
    pub ballistic: PhaseStats,
    pub correction: PhaseStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpeedStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MovementSampleBuffer {
    samples: Vec<MovementSample>,
}

impl MovementSampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, position: Vec3, timestamp: f64) {
        self.samples.push(MovementSample {
            position,
            timestamp,
        });
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[MovementSample] {
        &self.samples
    }

    pub fn first(&self) -> Option<&MovementSample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&MovementSample> {
        self.samples.last()
    }

    /// Σ |Δp · axis|, back-and-forth included
    pub fn axis_aligned_distance(&self, axis: &MovementAxis) -> f64 {
        axis_distance(&self.samples, axis)
    }

    /// Σ |Δp|
    pub fn path_length(&self) -> f64 {
        path_length(&self.samples)
    }

    /// Straight-line start to end distance
    pub fn euclidean_distance(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(a), Some(b)) if self.samples.len() >= 2 => {
                a.position.metric_distance(&b.position)
            }
            _ => 0.0,
        }
    }

    pub fn elapsed(&self) -> f64 {
        duration(&self.samples)
    }

    /// Index of the sample that ends the fastest step. Steps with a
    /// non-positive time delta are ignored; ties keep the earliest step.
    pub fn peak_speed_index(&self) -> Option<(usize, f64)> {
        self.step_speeds()
            .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
                Some((_, best_v)) if best_v >= v => best,
                _ => Some((i, v)),
            })
    }

    pub fn phase_split(&self, axis: &MovementAxis) -> PhaseSplit {
        let Some((peak_index, peak_speed)) = self.peak_speed_index() else {
            return PhaseSplit::default();
        };
        let ballistic = &self.samples[..=peak_index];
        let correction = &self.samples[peak_index..];
        PhaseSplit {
            peak_index,
            peak_speed,
            ballistic: phase_stats(ballistic, axis),
            correction: phase_stats(correction, axis),
        }
    }

    /// Speed statistics over steps at or above `min_speed`
    pub fn speed_stats(&self, min_speed: f64) -> SpeedStats {
        let speeds: Vec<f64> = self
            .step_speeds()
            .map(|(_, v)| v)
            .filter(|&v| v >= min_speed)
            .collect();
        if speeds.is_empty() {
            return SpeedStats::default();
        }
        let (min, max) = speeds
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        SpeedStats {
            average: speeds.iter().sum::<f64>() / speeds.len() as f64,
            min,
            max,
        }
    }

    /// Time from the first sample to the end of the first step reaching
    /// `min_speed`; `None` if the point never moved.
    pub fn movement_onset(&self, min_speed: f64) -> Option<f64> {
        let start = self.samples.first()?.timestamp;
        self.step_speeds()
            .find(|&(_, v)| v >= min_speed && v > 0.0)
            .map(|(i, _)| self.samples[i].timestamp - start)
    }

    /// (index of step end sample, speed) for every step with Δt > 0
    fn step_speeds(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.samples
            .iter()
            .tuple_windows()
            .enumerate()
            .filter_map(|(i, (a, b))| {
                let dt = b.timestamp - a.timestamp;
                (dt > 0.0).then(|| (i + 1, a.position.metric_distance(&b.position) / dt))
            })
    }
}

fn axis_distance(samples: &[MovementSample], axis: &MovementAxis) -> f64 {
    samples
        .iter()
        .tuple_windows()
        .map(|(a, b)| axis.project(b.position - a.position).abs())
        .sum()
}

fn path_length(samples: &[MovementSample]) -> f64 {
    samples
        .iter()
        .tuple_windows()
        .map(|(a, b)| a.position.metric_distance(&b.position))
        .sum()
}

fn duration(samples: &[MovementSample]) -> f64 {
    match (samples.first(), samples.last()) {
        (Some(a), Some(b)) if samples.len() >= 2 => b.timestamp - a.timestamp,
        _ => 0.0,
    }
}

fn phase_stats(samples: &[MovementSample], axis: &MovementAxis) -> PhaseStats {
    PhaseStats {
        axis_distance: axis_distance(samples, axis),
        path_length: path_length(samples),
        duration: duration(samples),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Direction;

    fn x_axis() -> MovementAxis {
        MovementAxis::new(Direction::Horizontal, true)
    }

    fn buffer(points: &[(f64, f64, f64)]) -> MovementSampleBuffer {
        // (x, y, t)
        let mut b = MovementSampleBuffer::new();
        for &(x, y, t) in points {
            b.push(Vec3::new(x, y, 0.0), t);
        }
        b
    }

    #[test]
    fn empty_and_single_sample_are_zero() {
        let axis = x_axis();
        for b in [buffer(&[]), buffer(&[(1.0, 0.0, 0.0)])] {
            assert_eq!(b.axis_aligned_distance(&axis), 0.0);
            assert_eq!(b.path_length(), 0.0);
            assert_eq!(b.euclidean_distance(), 0.0);
            assert_eq!(b.elapsed(), 0.0);
            assert_eq!(b.peak_speed_index(), None);
            assert_eq!(b.phase_split(&axis), PhaseSplit::default());
            assert_eq!(b.speed_stats(0.0), SpeedStats::default());
            assert_eq!(b.movement_onset(0.0), None);
        }
    }

    #[test]
    fn axis_distance_counts_back_and_forth() {
        let b = buffer(&[(0.0, 0.0, 0.0), (0.5, 0.0, 0.1), (0.25, 0.0, 0.2), (0.5, 0.0, 0.3)]);
        assert_eq!(b.axis_aligned_distance(&x_axis()), 1.0);
        assert_eq!(b.euclidean_distance(), 0.5);
    }

    #[test]
    fn path_length_includes_off_axis_motion() {
        let b = buffer(&[(0.0, 0.0, 0.0), (0.3, 0.4, 0.5)]);
        assert!((b.path_length() - 0.5).abs() < 1e-12);
        assert!((b.axis_aligned_distance(&x_axis()) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn peak_speed_splits_phases() {
        // steps: 0.1 m/s, 1.0 m/s, 0.2 m/s
        let b = buffer(&[(0.0, 0.0, 0.0), (0.01, 0.0, 0.1), (0.11, 0.0, 0.2), (0.13, 0.0, 0.3)]);
        let split = b.phase_split(&x_axis());
        assert_eq!(split.peak_index, 2);
        assert!((split.peak_speed - 1.0).abs() < 1e-9);
        assert!((split.ballistic.axis_distance - 0.11).abs() < 1e-12);
        assert!((split.correction.axis_distance - 0.02).abs() < 1e-12);
        assert!((split.ballistic.duration - 0.2).abs() < 1e-12);
        assert!((split.correction.duration - 0.1).abs() < 1e-12);
        assert!(
            (split.ballistic.axis_distance + split.correction.axis_distance
                - b.axis_aligned_distance(&x_axis()))
            .abs()
                < 1e-12
        );
    }

    #[test]
    fn zero_time_steps_are_ignored_for_speed() {
        let b = buffer(&[(0.0, 0.0, 0.0), (0.5, 0.0, 0.0), (0.75, 0.0, 0.5)]);
        assert_eq!(b.peak_speed_index(), Some((2, 0.5)));
    }

    #[test]
    fn speed_stats_filter_noise() {
        // steps: 0.001, 0.5, 1.0 m/s
        let b = buffer(&[(0.0, 0.0, 0.0), (0.001, 0.0, 1.0), (0.501, 0.0, 2.0), (1.501, 0.0, 3.0)]);
        let stats = b.speed_stats(0.01);
        assert!((stats.min - 0.5).abs() < 1e-9);
        assert!((stats.max - 1.0).abs() < 1e-9);
        assert!((stats.average - 0.75).abs() < 1e-9);

        assert_eq!(b.speed_stats(10.0), SpeedStats::default());
    }

    #[test]
    fn onset_is_first_fast_step() {
        let b = buffer(&[(0.0, 0.0, 0.0), (0.0, 0.0, 0.25), (0.001, 0.0, 0.5), (0.25, 0.0, 0.75)]);
        assert_eq!(b.movement_onset(0.01), Some(0.75));
        assert_eq!(buffer(&[(0.0, 0.0, 0.0), (0.0, 0.0, 1.0)]).movement_onset(0.0), None);
    }

    #[test]
    fn clear_empties_buffer() {
        let mut b = buffer(&[(0.0, 0.0, 0.0), (1.0, 0.0, 1.0)]);
        assert_eq!(b.len(), 2);
        b.clear();
        assert!(b.is_empty());
    }
}
