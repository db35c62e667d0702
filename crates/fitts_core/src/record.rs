//! Flat per-trial output row.
//!
//! One [`TrialRecord`] per logged selection. Columns are grouped as trial log,
//! Fitts' law and overshoot/undershoot data; set and block columns are only
//! filled on the trial that closed the set or block.

use crate::{
    error::Result,
    geometry::Quat,
    metrics::{AggregateMetrics, TrialEvaluation},
    trial::CompletedTrial,
};
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrialRecord {
    // trial log
    pub phase: String,
    pub block_label: String,
    pub block_index: usize,
    pub set_index: usize,
    pub trial_index: usize,
    pub pair_index: usize,
    pub target_id: i32,
    pub active_target: u8,
    pub direction: String,
    pub growth: String,
    pub axis_fallback: bool,
    pub width: f64,
    pub amplitude: f64,
    pub start_time: f64,
    pub end_time: f64,
    pub movement_time: f64,
    pub reaction_time: Option<f64>,
    pub dwell_time: f64,
    pub start_x: f64,
    pub start_y: f64,
    pub start_z: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub end_z: f64,
    pub start_qx: f64,
    pub start_qy: f64,
    pub start_qz: f64,
    pub start_qw: f64,
    pub end_qx: f64,
    pub end_qy: f64,
    pub end_qz: f64,
    pub end_qw: f64,
    pub hit: bool,
    pub axis_distance: f64,
    pub path_length: f64,
    pub euclidean_distance: f64,
    pub euclidean_deviation: f64,
    pub endpoint_deviation: f64,
    pub perpendicular_deviation: f64,
    pub effective_amplitude: f64,
    pub peak_speed: f64,
    pub ballistic_axis_distance: f64,
    pub ballistic_path_length: f64,
    pub ballistic_duration: f64,
    pub correction_phase_axis_distance: f64,
    pub correction_phase_path_length: f64,
    pub correction_phase_duration: f64,
    pub average_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,

    // fitts' law
    pub id: f64,
    pub throughput: f64,
    pub precision_class: u8,
    pub skip_reason: Option<String>,
    pub set_trials: Option<usize>,
    pub set_hits: Option<usize>,
    pub set_sum_amplitude: Option<f64>,
    pub set_sum_width: Option<f64>,
    pub set_sum_axis_distance: Option<f64>,
    pub set_sum_path_length: Option<f64>,
    pub set_sum_euclidean_distance: Option<f64>,
    pub set_sum_euclidean_deviation: Option<f64>,
    pub set_mean_movement_time: Option<f64>,
    pub set_effective_width: Option<f64>,
    pub set_effective_perpendicular_deviation: Option<f64>,
    pub set_effective_distance: Option<f64>,
    pub set_effective_id: Option<f64>,
    pub set_effective_throughput: Option<f64>,
    pub set_group_id: Option<f64>,
    pub set_group_throughput: Option<f64>,
    pub set_error_rate: Option<f64>,
    pub set_status: Option<String>,
    pub block_trials: Option<usize>,
    pub block_hits: Option<usize>,
    pub block_sum_amplitude: Option<f64>,
    pub block_sum_width: Option<f64>,
    pub block_sum_axis_distance: Option<f64>,
    pub block_sum_path_length: Option<f64>,
    pub block_sum_euclidean_distance: Option<f64>,
    pub block_sum_euclidean_deviation: Option<f64>,
    pub block_mean_movement_time: Option<f64>,
    pub block_effective_width: Option<f64>,
    pub block_effective_perpendicular_deviation: Option<f64>,
    pub block_effective_distance: Option<f64>,
    pub block_effective_id: Option<f64>,
    pub block_effective_throughput: Option<f64>,
    pub block_group_id: Option<f64>,
    pub block_group_throughput: Option<f64>,
    pub block_error_rate: Option<f64>,
    pub block_status: Option<String>,

    // overshoot / undershoot
    pub overshoot_count: u32,
    pub undershoot_count: u32,
    pub re_entry_count: u32,
    pub last_overshoot_distance: f64,
    pub last_undershoot_distance: f64,
    pub total_overshoot_distance: f64,
    pub total_undershoot_distance: f64,
    pub correction_overshoot_distance: f64,
    pub correction_undershoot_distance: f64,
    pub correction_axis_distance: f64,
    pub final_axis_difference: f64,
    pub contacted: bool,
    pub immediate_undershoot: bool,
}

/// Columns shared by the set and block snapshots
struct AggregateColumns {
    trials: Option<usize>,
    hits: Option<usize>,
    sum_amplitude: Option<f64>,
    sum_width: Option<f64>,
    sum_axis_distance: Option<f64>,
    sum_path_length: Option<f64>,
    sum_euclidean_distance: Option<f64>,
    sum_euclidean_deviation: Option<f64>,
    mean_movement_time: Option<f64>,
    effective_width: Option<f64>,
    effective_perpendicular_deviation: Option<f64>,
    effective_distance: Option<f64>,
    effective_id: Option<f64>,
    effective_throughput: Option<f64>,
    group_id: Option<f64>,
    group_throughput: Option<f64>,
    error_rate: Option<f64>,
    status: Option<String>,
}

impl From<Option<&AggregateMetrics>> for AggregateColumns {
    fn from(agg: Option<&AggregateMetrics>) -> Self {
        Self {
            trials: agg.map(|a| a.trials),
            hits: agg.map(|a| a.hits),
            sum_amplitude: agg.map(|a| a.sum_amplitude),
            sum_width: agg.map(|a| a.sum_width),
            sum_axis_distance: agg.map(|a| a.sum_axis_distance),
            sum_path_length: agg.map(|a| a.sum_path_length),
            sum_euclidean_distance: agg.map(|a| a.sum_euclidean_distance),
            sum_euclidean_deviation: agg.map(|a| a.sum_euclidean_deviation),
            mean_movement_time: agg.map(|a| a.mean_movement_time.value()),
            effective_width: agg.map(|a| a.effective_width.value()),
            effective_perpendicular_deviation: agg
                .map(|a| a.effective_perpendicular_deviation.value()),
            effective_distance: agg.map(|a| a.effective_distance.value()),
            effective_id: agg.map(|a| a.effective_id.value()),
            effective_throughput: agg.map(|a| a.effective_throughput.value()),
            group_id: agg.map(|a| a.group_id.value()),
            group_throughput: agg.map(|a| a.group_throughput.value()),
            error_rate: agg.map(|a| a.error_rate.value()),
            status: agg.map(|a| a.effective_throughput.status().to_string()),
        }
    }
}

impl TrialRecord {
    pub fn new(trial: &CompletedTrial, eval: &TrialEvaluation) -> Self {
        let (id, throughput, precision_class, skip_reason) = match &eval.trial {
            Ok(m) => (m.id, m.throughput, m.precision.number(), None),
            Err(reason) => (0.0, 0.0, 0, Some(reason.to_string())),
        };
        let set = AggregateColumns::from(eval.set.as_ref());
        let block = AggregateColumns::from(eval.block.as_ref());
        let os = &trial.overshoot;
        let [start_qx, start_qy, start_qz, start_qw] = quat_columns(&trial.start_rotation);
        let [end_qx, end_qy, end_qz, end_qw] = quat_columns(&trial.end_rotation);

        Self {
            phase: trial.phase.to_string(),
            block_label: trial.block_label.to_string(),
            block_index: trial.block_index,
            set_index: trial.set_index,
            trial_index: trial.trial_index,
            pair_index: trial.pair_index,
            target_id: trial.target_id,
            active_target: trial.active_target.number(),
            direction: trial.direction.to_string(),
            growth: trial.growth.to_string(),
            axis_fallback: trial.axis.fallback || trial.direction_fallback,
            width: trial.width,
            amplitude: trial.amplitude,
            start_time: trial.start.timestamp,
            end_time: trial.end.timestamp,
            movement_time: trial.movement_time,
            reaction_time: trial.reaction_time,
            dwell_time: trial.dwell_time,
            start_x: trial.start.position.x,
            start_y: trial.start.position.y,
            start_z: trial.start.position.z,
            end_x: trial.end.position.x,
            end_y: trial.end.position.y,
            end_z: trial.end.position.z,
            start_qx,
            start_qy,
            start_qz,
            start_qw,
            end_qx,
            end_qy,
            end_qz,
            end_qw,
            hit: trial.hit,
            axis_distance: trial.axis_distance,
            path_length: trial.path_length,
            euclidean_distance: trial.euclidean_distance,
            euclidean_deviation: trial.euclidean_deviation,
            endpoint_deviation: trial.endpoint_deviation,
            perpendicular_deviation: trial.perpendicular_deviation,
            effective_amplitude: trial.effective_amplitude,
            peak_speed: trial.split.peak_speed,
            ballistic_axis_distance: trial.split.ballistic.axis_distance,
            ballistic_path_length: trial.split.ballistic.path_length,
            ballistic_duration: trial.split.ballistic.duration,
            correction_phase_axis_distance: trial.split.correction.axis_distance,
            correction_phase_path_length: trial.split.correction.path_length,
            correction_phase_duration: trial.split.correction.duration,
            average_speed: trial.speed.average,
            min_speed: trial.speed.min,
            max_speed: trial.speed.max,

            id,
            throughput,
            precision_class,
            skip_reason,
            set_trials: set.trials,
            set_hits: set.hits,
            set_sum_amplitude: set.sum_amplitude,
            set_sum_width: set.sum_width,
            set_sum_axis_distance: set.sum_axis_distance,
            set_sum_path_length: set.sum_path_length,
            set_sum_euclidean_distance: set.sum_euclidean_distance,
            set_sum_euclidean_deviation: set.sum_euclidean_deviation,
            set_mean_movement_time: set.mean_movement_time,
            set_effective_width: set.effective_width,
            set_effective_perpendicular_deviation: set.effective_perpendicular_deviation,
            set_effective_distance: set.effective_distance,
            set_effective_id: set.effective_id,
            set_effective_throughput: set.effective_throughput,
            set_group_id: set.group_id,
            set_group_throughput: set.group_throughput,
            set_error_rate: set.error_rate,
            set_status: set.status,
            block_trials: block.trials,
            block_hits: block.hits,
            block_sum_amplitude: block.sum_amplitude,
            block_sum_width: block.sum_width,
            block_sum_axis_distance: block.sum_axis_distance,
            block_sum_path_length: block.sum_path_length,
            block_sum_euclidean_distance: block.sum_euclidean_distance,
            block_sum_euclidean_deviation: block.sum_euclidean_deviation,
            block_mean_movement_time: block.mean_movement_time,
            block_effective_width: block.effective_width,
            block_effective_perpendicular_deviation: block.effective_perpendicular_deviation,
            block_effective_distance: block.effective_distance,
            block_effective_id: block.effective_id,
            block_effective_throughput: block.effective_throughput,
            block_group_id: block.group_id,
            block_group_throughput: block.group_throughput,
            block_error_rate: block.error_rate,
            block_status: block.status,

            overshoot_count: os.overshoot_count,
            undershoot_count: os.undershoot_count,
            re_entry_count: os.re_entry_count,
            last_overshoot_distance: os.last_overshoot_distance,
            last_undershoot_distance: os.last_undershoot_distance,
            total_overshoot_distance: os.total_overshoot_distance,
            total_undershoot_distance: os.total_undershoot_distance,
            correction_overshoot_distance: os.correction_overshoot_distance,
            correction_undershoot_distance: os.correction_undershoot_distance,
            correction_axis_distance: os.correction_axis_distance,
            final_axis_difference: os.final_axis_difference,
            contacted: os.contacted,
            immediate_undershoot: os.immediate_undershoot,
        }
    }
}

/// (x, y, z, w) of a unit quaternion
fn quat_columns(q: &Quat) -> [f64; 4] {
    let c = &q.quaternion().coords;
    [c.x, c.y, c.z, c.w]
}

/// Serializes the records through `wtr`; the header row comes from the
/// first record.
pub fn write_records<W: Write>(wtr: &mut csv::Writer<W>, records: &[TrialRecord]) -> Result<()> {
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}
