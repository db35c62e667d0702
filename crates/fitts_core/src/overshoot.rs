//! Overshoot / undershoot classification along the movement axis.
//!
//! Every sample is reduced to a signed `axis_difference` (negative beyond the
//! target, positive before it, zero on or inside it) plus a contact flag. An
//! excursion is a contiguous run of samples on one side of the target; its
//! peak magnitude is added to the totals when the excursion ends.
//!
//! Undershoots only count once the approach has overshot at least once. The
//! one exception is a selection press made in the undershoot region before
//! the target was ever touched, which is logged immediately. Holding the
//! trigger down is not a selection; only the press edge is.

use crate::geometry::{MovementAxis, TargetGeometry, Vec3};
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcursionKind {
    Overshoot,
    Undershoot,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Excursion {
    #[default]
    Idle,
    Active {
        kind: ExcursionKind,
        peak: f64,
    },
    /// Left the region less than a cooldown ago; re-entering resumes it
    Lingering {
        kind: ExcursionKind,
        peak: f64,
        left_at: f64,
    },
}

/// Per-approach detector state
#[derive(Debug, Clone, Default)]
pub struct OvershootState {
    excursion: Excursion,
    has_overshot: bool,
    has_contacted: bool,
    in_contact: bool,
    correction_active: bool,
    re_entry_counted: bool,
    immediate_undershoot: bool,
    overshoot_count: u32,
    undershoot_count: u32,
    re_entry_count: u32,
    last_overshoot_distance: f64,
    last_undershoot_distance: f64,
    total_overshoot_distance: f64,
    total_undershoot_distance: f64,
    correction_overshoot_distance: f64,
    correction_undershoot_distance: f64,
    correction_axis_distance: f64,
    axis_difference: f64,
    last_axis_position: Option<f64>,
}

/// Per-trial detector output
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OvershootSummary {
    pub overshoot_count: u32,
    pub undershoot_count: u32,
    pub re_entry_count: u32,
    pub last_overshoot_distance: f64,
    pub last_undershoot_distance: f64,
    pub total_overshoot_distance: f64,
    pub total_undershoot_distance: f64,
    pub correction_overshoot_distance: f64,
    pub correction_undershoot_distance: f64,
    /// Axis distance moved while the correction phase was active
    pub correction_axis_distance: f64,
    pub final_axis_difference: f64,
    pub contacted: bool,
    pub immediate_undershoot: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OvershootUndershootDetector {
    cooldown: f64,
    state: OvershootState,
}

impl OvershootUndershootDetector {
    pub fn new(cooldown_secs: f64) -> Self {
        Self {
            cooldown: cooldown_secs.max(0.0),
            state: OvershootState::default(),
        }
    }

    pub fn state(&self) -> &OvershootState {
        &self.state
    }

    pub fn axis_difference(&self) -> f64 {
        self.state.axis_difference
    }

    pub fn in_contact(&self) -> bool {
        self.state.in_contact
    }

    pub fn correction_active(&self) -> bool {
        self.state.correction_active
    }

    /// Feeds one sample and returns its axis difference. `selection` is true
    /// only on the frame the trigger goes down.
    pub fn update(
        &mut self,
        position: Vec3,
        target: &TargetGeometry,
        axis: &MovementAxis,
        selection: bool,
        timestamp: f64,
    ) -> f64 {
        let diff = axis.axis_difference(position, target);
        let contact = target.contains(&position);
        let axis_position = axis.project(position);
        let s = &mut self.state;

        if s.correction_active
            && let Some(prev) = s.last_axis_position
        {
            s.correction_axis_distance += (axis_position - prev).abs();
        }
        s.last_axis_position = Some(axis_position);
        s.axis_difference = diff;

        self.update_contact(contact);
        self.expire_lingering(timestamp);

        if diff < 0.0 {
            self.enter(ExcursionKind::Overshoot, -diff, timestamp);
        } else if diff > 0.0 {
            if self.state.has_overshot {
                self.enter(ExcursionKind::Undershoot, diff, timestamp);
            } else if selection && !self.state.has_contacted && !self.state.immediate_undershoot
            {
                self.log_immediate_undershoot(diff);
            } else {
                self.leave(timestamp);
            }
        } else {
            self.leave(timestamp);
        }

        diff
    }

    /// Moves any open or lingering peak into the totals. A second call
    /// without new samples does nothing.
    pub fn flush_pending(&mut self) {
        let s = &mut self.state;
        let (kind, peak) = match s.excursion {
            Excursion::Idle => return,
            Excursion::Active { kind, peak } | Excursion::Lingering { kind, peak, .. } => {
                (kind, peak)
            }
        };
        match kind {
            ExcursionKind::Overshoot => {
                s.total_overshoot_distance += peak;
                s.last_overshoot_distance = peak;
                if s.correction_active {
                    s.correction_overshoot_distance += peak;
                }
            }
            ExcursionKind::Undershoot => {
                s.total_undershoot_distance += peak;
                s.last_undershoot_distance = peak;
                if s.correction_active {
                    s.correction_undershoot_distance += peak;
                }
            }
        }
        s.excursion = Excursion::Idle;
    }

    pub fn end_correction_phase(&mut self) {
        self.state.correction_active = false;
    }

    /// Closes the approach at a selection: flushes pending peaks, ends the
    /// correction phase and returns the final figures.
    pub fn finish_approach(&mut self) -> OvershootSummary {
        self.flush_pending();
        self.end_correction_phase();
        self.summary()
    }

    pub fn summary(&self) -> OvershootSummary {
        let s = &self.state;
        OvershootSummary {
            overshoot_count: s.overshoot_count,
            undershoot_count: s.undershoot_count,
            re_entry_count: s.re_entry_count,
            last_overshoot_distance: s.last_overshoot_distance,
            last_undershoot_distance: s.last_undershoot_distance,
            total_overshoot_distance: s.total_overshoot_distance,
            total_undershoot_distance: s.total_undershoot_distance,
            correction_overshoot_distance: s.correction_overshoot_distance,
            correction_undershoot_distance: s.correction_undershoot_distance,
            correction_axis_distance: s.correction_axis_distance,
            final_axis_difference: s.axis_difference,
            contacted: s.has_contacted,
            immediate_undershoot: s.immediate_undershoot,
        }
    }

    /// Start of a new trial: everything goes back to its initial value.
    pub fn reset_approach(&mut self) {
        self.state = OvershootState::default();
    }

    /// Zeroes the accumulated distances only; counts, flags and any open
    /// excursion are kept.
    pub fn reset_totals(&mut self) {
        let s = &mut self.state;
        s.total_overshoot_distance = 0.0;
        s.total_undershoot_distance = 0.0;
        s.correction_overshoot_distance = 0.0;
        s.correction_undershoot_distance = 0.0;
        s.correction_axis_distance = 0.0;
    }

    fn update_contact(&mut self, contact: bool) {
        let s = &mut self.state;
        if contact && !s.in_contact {
            s.has_contacted = true;
            if s.overshoot_count + s.undershoot_count > 0 && !s.re_entry_counted {
                s.re_entry_count += 1;
                s.re_entry_counted = true;
                trace!("re-entry #{}", s.re_entry_count);
            }
        } else if !contact && s.in_contact && s.has_contacted && !s.correction_active {
            s.correction_active = true;
            trace!("correction phase started");
        }
        s.in_contact = contact;
    }

    fn expire_lingering(&mut self, timestamp: f64) {
        if let Excursion::Lingering { left_at, .. } = self.state.excursion
            && timestamp - left_at >= self.cooldown
        {
            self.flush_pending();
        }
    }

    fn enter(&mut self, kind: ExcursionKind, magnitude: f64, timestamp: f64) {
        let resumed = match self.state.excursion {
            Excursion::Active { kind: k, peak } if k == kind => Some(peak),
            Excursion::Lingering {
                kind: k,
                peak,
                left_at,
            } if k == kind && timestamp - left_at < self.cooldown => Some(peak),
            _ => None,
        };
        if let Some(peak) = resumed {
            self.state.excursion = Excursion::Active {
                kind,
                peak: peak.max(magnitude),
            };
            return;
        }

        self.flush_pending();
        let s = &mut self.state;
        match kind {
            ExcursionKind::Overshoot => {
                s.overshoot_count += 1;
                s.has_overshot = true;
            }
            ExcursionKind::Undershoot => s.undershoot_count += 1,
        }
        s.re_entry_counted = false;
        s.excursion = Excursion::Active {
            kind,
            peak: magnitude,
        };
        trace!("{:?} started at {:.4}", kind, magnitude);
    }

    fn leave(&mut self, timestamp: f64) {
        if let Excursion::Active { kind, peak } = self.state.excursion {
            if self.cooldown > 0.0 {
                self.state.excursion = Excursion::Lingering {
                    kind,
                    peak,
                    left_at: timestamp,
                };
            } else {
                self.flush_pending();
            }
        }
    }

    fn log_immediate_undershoot(&mut self, magnitude: f64) {
        self.flush_pending();
        let s = &mut self.state;
        s.undershoot_count += 1;
        s.immediate_undershoot = true;
        s.re_entry_counted = false;
        s.excursion = Excursion::Active {
            kind: ExcursionKind::Undershoot,
            peak: magnitude,
        };
        self.flush_pending();
        trace!("immediate undershoot at {:.4}", magnitude);
    }
}
