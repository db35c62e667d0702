//! Fitts' law metrics at trial, set and block scope.
//!
//! Trial metrics use the nominal amplitude and width. Set and block metrics
//! follow ISO 9241-411 and use the spread of the buffered endpoints instead:
//! `We = 4.133 · SD(endpoint deviation)`, `IDe = log2(De / We + 1)`,
//! `TPe = IDe / mean MT`.

use crate::constants::{
    EFFECTIVE_WIDTH_FACTOR, HIGH_PRECISION_ID, LOW_PRECISION_ID, MEDIUM_PRECISION_ID,
    MIN_EFFECTIVE_SAMPLES, UNASSIGNED_TARGET_ID,
};
use log::warn;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// A computed value, or the reason it could not be computed.
/// Non-valid metrics read as 0 so no NaN or infinity reaches a record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Metric {
    Valid(f64),
    /// Division by zero or a non-finite input
    Invalid,
    /// Not enough samples
    Incomplete { samples: usize },
}

impl Metric {
    pub fn from_value(v: f64) -> Self {
        if v.is_finite() {
            Metric::Valid(v)
        } else {
            Metric::Invalid
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Metric::Valid(v) => *v,
            _ => 0.0,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Metric::Valid(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            Metric::Valid(_) => "ok",
            Metric::Invalid => "invalid",
            Metric::Incomplete { .. } => "incomplete",
        }
    }

    fn and_then(self, f: impl FnOnce(f64) -> Metric) -> Metric {
        match self {
            Metric::Valid(v) => f(v),
            other => other,
        }
    }
}

/// `log2(A / W + 1)`
pub fn index_of_difficulty(amplitude: f64, width: f64) -> Metric {
    if !(amplitude.is_finite() && width.is_finite()) || width <= 0.0 || amplitude < 0.0 {
        return Metric::Invalid;
    }
    Metric::from_value((amplitude / width + 1.0).log2())
}

/// Bits per second
pub fn throughput(id: f64, movement_time_s: f64) -> Metric {
    if !movement_time_s.is_finite() || movement_time_s <= 0.0 {
        return Metric::Invalid;
    }
    Metric::from_value(id / movement_time_s)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum PrecisionClass {
    High,
    Medium,
    Low,
    Minimal,
}

impl PrecisionClass {
    pub fn from_id(id: f64) -> Self {
        if id > HIGH_PRECISION_ID {
            PrecisionClass::High
        } else if id > MEDIUM_PRECISION_ID {
            PrecisionClass::Medium
        } else if id > LOW_PRECISION_ID {
            PrecisionClass::Low
        } else {
            PrecisionClass::Minimal
        }
    }

    /// 1 (most demanding) to 4
    pub fn number(self) -> u8 {
        match self {
            PrecisionClass::High => 1,
            PrecisionClass::Medium => 2,
            PrecisionClass::Low => 3,
            PrecisionClass::Minimal => 4,
        }
    }
}

/// Why a trial was left out of all aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidTargetId,
    NonPositiveAmplitude,
    NonPositiveWidth,
    NonPositiveMovementTime,
    NonFiniteInput,
}

/// Everything the engine needs from one closed trial
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrialMeasurement {
    /// Nominal center-to-center distance [m]
    pub amplitude: f64,
    /// Nominal target width [m]
    pub width: f64,
    /// Seconds between the two selections
    pub movement_time: f64,
    pub axis_distance: f64,
    pub path_length: f64,
    pub euclidean_distance: f64,
    /// Path length in excess of the straight line
    pub euclidean_deviation: f64,
    /// Signed axis offset of the end point from the target center
    pub endpoint_deviation: f64,
    /// |end - start| orthogonal to the axis
    pub perpendicular_deviation: f64,
    /// |(end - start) · axis|
    pub effective_amplitude: f64,
    pub hit: bool,
}

impl TrialMeasurement {
    fn is_finite(&self) -> bool {
        [
            self.amplitude,
            self.width,
            self.movement_time,
            self.axis_distance,
            self.path_length,
            self.euclidean_distance,
            self.euclidean_deviation,
            self.endpoint_deviation,
            self.perpendicular_deviation,
            self.effective_amplitude,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialMetrics {
    pub id: f64,
    pub throughput: f64,
    pub precision: PrecisionClass,
}

/// Trial-level metrics, or the reason the trial cannot be used
pub fn trial_metrics(m: &TrialMeasurement) -> Result<TrialMetrics, SkipReason> {
    if !m.is_finite() {
        return Err(SkipReason::NonFiniteInput);
    }
    if m.amplitude <= 0.0 {
        return Err(SkipReason::NonPositiveAmplitude);
    }
    if m.width <= 0.0 {
        return Err(SkipReason::NonPositiveWidth);
    }
    if m.movement_time <= 0.0 {
        return Err(SkipReason::NonPositiveMovementTime);
    }
    let id = index_of_difficulty(m.amplitude, m.width);
    let Metric::Valid(id) = id else {
        return Err(SkipReason::NonFiniteInput);
    };
    Ok(TrialMetrics {
        id,
        throughput: throughput(id, m.movement_time).value(),
        precision: PrecisionClass::from_id(id),
    })
}

/// Snapshot of a set or block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateMetrics {
    pub trials: usize,
    pub hits: usize,
    pub misses: usize,
    pub error_rate: Metric,
    pub sum_amplitude: f64,
    pub sum_width: f64,
    pub sum_axis_distance: f64,
    pub sum_path_length: f64,
    pub sum_euclidean_distance: f64,
    pub sum_euclidean_deviation: f64,
    pub mean_movement_time: Metric,
    pub effective_width: Metric,
    pub effective_perpendicular_deviation: Metric,
    pub effective_distance: Metric,
    pub effective_id: Metric,
    pub effective_throughput: Metric,
    pub group_id: Metric,
    pub group_throughput: Metric,
}

#[derive(Debug, Clone, Default)]
pub struct MetricAccumulator {
    hits: usize,
    sum_amplitude: f64,
    sum_width: f64,
    sum_axis_distance: f64,
    sum_path_length: f64,
    sum_euclidean_distance: f64,
    sum_euclidean_deviation: f64,
    ids: Vec<f64>,
    movement_times: Vec<f64>,
    endpoint_deviations: Vec<f64>,
    perpendicular_deviations: Vec<f64>,
    effective_amplitudes: Vec<f64>,
}

impl MetricAccumulator {
    pub fn push(&mut self, m: &TrialMeasurement, metrics: &TrialMetrics) {
        if m.hit {
            self.hits += 1;
        }
        self.sum_amplitude += m.amplitude;
        self.sum_width += m.width;
        self.sum_axis_distance += m.axis_distance;
        self.sum_path_length += m.path_length;
        self.sum_euclidean_distance += m.euclidean_distance;
        self.sum_euclidean_deviation += m.euclidean_deviation;
        self.ids.push(metrics.id);
        self.movement_times.push(m.movement_time);
        self.endpoint_deviations.push(m.endpoint_deviation);
        self.perpendicular_deviations.push(m.perpendicular_deviation);
        self.effective_amplitudes.push(m.effective_amplitude);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> AggregateMetrics {
        let trials = self.len();
        let total_mt: f64 = self.movement_times.iter().sum();
        let mean_mt = mean(&self.movement_times);

        let effective_width = effective_spread(&self.endpoint_deviations);
        let effective_distance = mean(&self.effective_amplitudes);
        let effective_id = match (effective_distance, effective_width) {
            (Metric::Valid(de), Metric::Valid(we)) if we > 0.0 => {
                Metric::from_value(((de + we) / we).log2())
            }
            (Metric::Valid(_), Metric::Valid(_)) => Metric::Invalid,
            (Metric::Incomplete { samples }, _) | (_, Metric::Incomplete { samples }) => {
                Metric::Incomplete { samples }
            }
            _ => Metric::Invalid,
        };
        let effective_throughput = effective_id.and_then(|ide| match mean_mt {
            Metric::Valid(mt) => throughput(ide, mt),
            other => other,
        });

        let group_id = if trials == 0 {
            Metric::Incomplete { samples: 0 }
        } else {
            index_of_difficulty(self.sum_amplitude, self.sum_width)
        };
        let group_throughput = if trials == 0 {
            Metric::Incomplete { samples: 0 }
        } else {
            throughput(self.ids.iter().sum(), total_mt)
        };

        let error_rate = if trials == 0 {
            Metric::Incomplete { samples: 0 }
        } else {
            Metric::from_value((trials - self.hits) as f64 / trials as f64)
        };

        AggregateMetrics {
            trials,
            hits: self.hits,
            misses: trials - self.hits,
            error_rate,
            sum_amplitude: self.sum_amplitude,
            sum_width: self.sum_width,
            sum_axis_distance: self.sum_axis_distance,
            sum_path_length: self.sum_path_length,
            sum_euclidean_distance: self.sum_euclidean_distance,
            sum_euclidean_deviation: self.sum_euclidean_deviation,
            mean_movement_time: mean_mt,
            effective_width,
            effective_perpendicular_deviation: effective_spread(&self.perpendicular_deviations),
            effective_distance,
            effective_id,
            effective_throughput,
            group_id,
            group_throughput,
        }
    }
}

/// Result of feeding one trial to the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialEvaluation {
    pub trial: Result<TrialMetrics, SkipReason>,
    /// Present when the trial closed its set
    pub set: Option<AggregateMetrics>,
    /// Present when the trial closed its block
    pub block: Option<AggregateMetrics>,
}

/// Set and block accumulators. A snapshot is taken and the accumulator
/// cleared when a trial is flagged as the last of its set or block.
#[derive(Debug, Clone, Default)]
pub struct FittsMetricsEngine {
    set: MetricAccumulator,
    block: MetricAccumulator,
}

impl FittsMetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_accumulator(&self) -> &MetricAccumulator {
        &self.set
    }

    pub fn block_accumulator(&self) -> &MetricAccumulator {
        &self.block
    }

    pub fn reset_set(&mut self) {
        self.set.clear();
    }

    pub fn reset_block(&mut self) {
        self.block.clear();
    }

    pub fn evaluate(
        &mut self,
        target_id: i32,
        m: &TrialMeasurement,
        last_in_set: bool,
        last_in_block: bool,
    ) -> TrialEvaluation {
        let trial = if target_id == UNASSIGNED_TARGET_ID {
            Err(SkipReason::InvalidTargetId)
        } else {
            trial_metrics(m)
        };

        match &trial {
            Ok(metrics) => {
                self.set.push(m, metrics);
                self.block.push(m, metrics);
            }
            Err(reason) => warn!("Trial skipped from aggregates: {}", reason),
        }

        let set = last_in_set.then(|| {
            let snapshot = self.set.snapshot();
            self.set.clear();
            snapshot
        });
        let block = last_in_block.then(|| {
            let snapshot = self.block.snapshot();
            self.block.clear();
            snapshot
        });

        TrialEvaluation { trial, set, block }
    }
}

fn mean(values: &[f64]) -> Metric {
    if values.is_empty() {
        return Metric::Incomplete { samples: 0 };
    }
    Metric::from_value(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1)
fn sample_sd(values: &[f64]) -> Metric {
    let n = values.len();
    if n < MIN_EFFECTIVE_SAMPLES {
        return Metric::Incomplete { samples: n };
    }
    let m = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    Metric::from_value(var.sqrt())
}

fn effective_spread(values: &[f64]) -> Metric {
    sample_sd(values).and_then(|sd| Metric::from_value(EFFECTIVE_WIDTH_FACTOR * sd))
}
