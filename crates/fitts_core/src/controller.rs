//! Session state machine.
//!
//! The controller advances through training and testing on selection events
//! (trigger rising edges). Each set is one target pair; the first selection of
//! a set only opens the first trial and is never logged. Every later selection
//! closes a trial, emits a [`TrialRecord`] and either starts the next trial or,
//! once the quota is reached, closes the set.

use crate::{
    config::SessionConfig,
    error::{FittsError, Result},
    geometry::{AxisResolution, Direction, MovementAxis, Quat, Vec3, resolve_axis},
    haptics::{self, HapticRequest},
    layout::TargetLayout,
    metrics::{AggregateMetrics, FittsMetricsEngine},
    movement::MovementSampleBuffer,
    overshoot::OvershootUndershootDetector,
    record::TrialRecord,
    targets::{ActiveTarget, SessionPlan, TargetPair},
    trial::{CompletedTrial, Phase, TrialContext},
};
use log::{debug, info};
use rand::{Rng, rngs::StdRng};

/// One tracked-controller frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    pub position: Vec3,
    pub rotation: Quat,
    pub trigger_pressed: bool,
    /// Seconds
    pub timestamp: f64,
}

impl Default for PoseSample {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            trigger_pressed: false,
            timestamp: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    WithinSet,
    BetweenSets,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    AwaitingStart,
    Running { phase: Phase, stage: Stage },
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseStarted(Phase),
    SetClosed {
        phase: Phase,
        set_index: usize,
        pair_index: usize,
        metrics: Option<AggregateMetrics>,
    },
    BlockClosed {
        phase: Phase,
        block_index: usize,
        label: char,
        metrics: Option<AggregateMetrics>,
    },
    /// Waiting for `ready()` before the next set
    Paused { phase: Phase, next_set: usize },
    Ended,
}

/// Receives everything the controller produces
pub trait TrialSink {
    fn emit(&mut self, record: TrialRecord);

    fn haptic(&mut self, _request: HapticRequest) {}

    fn session_event(&mut self, _event: SessionEvent) {}
}

/// Collects output in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<TrialRecord>,
    pub haptics: Vec<HapticRequest>,
    pub events: Vec<SessionEvent>,
}

impl TrialSink for MemorySink {
    fn emit(&mut self, record: TrialRecord) {
        self.records.push(record);
    }

    fn haptic(&mut self, request: HapticRequest) {
        self.haptics.push(request);
    }

    fn session_event(&mut self, event: SessionEvent) {
        self.events.push(event);
    }
}

pub struct TrialController<R: Rng = StdRng> {
    config: SessionConfig,
    plan: SessionPlan,
    rng: R,
    state: ControllerState,
    /// Index into the current phase's pairs
    cursor: usize,
    /// Logged selections in the current set
    selections: usize,
    trial_open: bool,
    trial_start: f64,
    trial_start_rotation: Quat,
    active: ActiveTarget,
    axis: AxisResolution,
    buffer: MovementSampleBuffer,
    detector: OvershootUndershootDetector,
    metrics: FittsMetricsEngine,
    trigger_was_pressed: bool,
    dwell_time: f64,
    last_timestamp: Option<f64>,
    emitted: usize,
}

impl<R: Rng> TrialController<R> {
    /// Resolves target geometry and checks the plan. Any error here means the
    /// session cannot start.
    pub fn new(
        config: SessionConfig,
        mut plan: SessionPlan,
        layout: &dyn TargetLayout,
        rng: R,
    ) -> Result<Self> {
        config.validate()?;
        layout.apply(&mut plan)?;
        plan.validate(&config)?;
        for pair in plan.training.iter().chain(&plan.testing) {
            pair.geometry(ActiveTarget::First)?;
            pair.geometry(ActiveTarget::Second)?;
        }

        let detector = OvershootUndershootDetector::new(config.cooldown_secs);
        Ok(Self {
            config,
            plan,
            rng,
            state: ControllerState::AwaitingStart,
            cursor: 0,
            selections: 0,
            trial_open: false,
            trial_start: 0.0,
            trial_start_rotation: Quat::identity(),
            active: ActiveTarget::First,
            axis: AxisResolution {
                axis: MovementAxis::new(Direction::FALLBACK, true),
                fallback: false,
            },
            buffer: MovementSampleBuffer::new(),
            detector,
            metrics: FittsMetricsEngine::new(),
            trigger_was_pressed: false,
            dwell_time: 0.0,
            last_timestamp: None,
            emitted: 0,
        })
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_ended(&self) -> bool {
        self.state == ControllerState::Ended
    }

    pub fn active_target(&self) -> ActiveTarget {
        self.active
    }

    pub fn current_pair(&self) -> Option<&TargetPair> {
        match self.state {
            ControllerState::Running { phase, .. } => self.pairs(phase).get(self.cursor),
            _ => None,
        }
    }

    /// Logged selections in the current set
    pub fn selections(&self) -> usize {
        self.selections
    }

    pub fn records_emitted(&self) -> usize {
        self.emitted
    }

    pub fn plan(&self) -> &SessionPlan {
        &self.plan
    }

    /// Starts the session, or resumes after a pause between sets.
    pub fn ready(&mut self, sink: &mut impl TrialSink) -> Result<()> {
        match self.state {
            ControllerState::AwaitingStart => self.start_phase(Phase::Training, sink),
            ControllerState::Running {
                phase,
                stage: Stage::BetweenSets,
            } => {
                info!("Resuming {} at set {}", phase, self.cursor);
                self.state = ControllerState::Running {
                    phase,
                    stage: Stage::WithinSet,
                };
                self.begin_set()
            }
            _ => {
                debug!("ready() ignored in state {:?}", self.state);
                Ok(())
            }
        }
    }

    /// Processes one frame: buffer and detector first, then the selection.
    pub fn tick(&mut self, pose: &PoseSample, sink: &mut impl TrialSink) -> Result<()> {
        let selection = pose.trigger_pressed && !self.trigger_was_pressed;
        self.trigger_was_pressed = pose.trigger_pressed;

        let ControllerState::Running {
            phase,
            stage: Stage::WithinSet,
        } = self.state
        else {
            return Ok(());
        };

        if self.trial_open {
            self.track(pose, selection, sink)?;
        }
        self.last_timestamp = Some(pose.timestamp);

        if selection {
            self.select(phase, pose, sink)?;
        }
        Ok(())
    }

    fn pairs(&self, phase: Phase) -> &[TargetPair] {
        match phase {
            Phase::Training => &self.plan.training,
            Phase::Testing => &self.plan.testing,
        }
    }

    fn pair(&self, phase: Phase) -> Result<&TargetPair> {
        self.pairs(phase)
            .get(self.cursor)
            .ok_or(FittsError::EmptyPairList {
                phase: phase.to_string(),
            })
    }

    fn skipped(&self, phase: Phase) -> bool {
        match phase {
            Phase::Training => self.config.skip_training,
            Phase::Testing => self.config.skip_testing,
        }
    }

    fn quota(&self, phase: Phase) -> usize {
        match phase {
            Phase::Training => self.config.training_selections,
            Phase::Testing => self.config.testing_selections,
        }
    }

    fn start_phase(&mut self, phase: Phase, sink: &mut impl TrialSink) -> Result<()> {
        if self.skipped(phase) || self.pairs(phase).is_empty() {
            info!("Skipping {} phase", phase);
            return match phase {
                Phase::Training => self.start_phase(Phase::Testing, sink),
                Phase::Testing => {
                    self.end(sink);
                    Ok(())
                }
            };
        }

        if phase == Phase::Testing {
            self.plan.shuffle_testing(&mut self.rng);
        }
        info!("{} phase started ({} sets)", phase, self.pairs(phase).len());
        self.cursor = 0;
        self.metrics.reset_set();
        self.metrics.reset_block();
        self.state = ControllerState::Running {
            phase,
            stage: Stage::WithinSet,
        };
        sink.session_event(SessionEvent::PhaseStarted(phase));
        self.begin_set()
    }

    fn begin_set(&mut self) -> Result<()> {
        self.selections = 0;
        self.trial_open = false;
        self.active = ActiveTarget::First;
        self.buffer.clear();
        self.detector.reset_approach();
        self.dwell_time = 0.0;
        if let ControllerState::Running { phase, .. } = self.state {
            let pair = self.pair(phase)?;
            debug!(
                "Set {} ({}): target {} block {}",
                self.cursor,
                phase,
                pair.target_id,
                pair.block_label()
            );
            self.axis = self.active_axis(phase)?;
        }
        Ok(())
    }

    fn active_axis(&self, phase: Phase) -> Result<AxisResolution> {
        let pair = self.pair(phase)?;
        let from = pair.geometry(self.active.flipped())?.center;
        let to = pair.geometry(self.active)?.center;
        Ok(resolve_axis(Some(pair.direction()), from, to))
    }

    /// Zeroes the overshoot/undershoot distance totals of the open trial
    /// while keeping its counts. For harness events that move the scene under
    /// the participant mid-trial, such as a view recenter.
    pub fn reset_totals(&mut self) {
        if self.trial_open {
            debug!("Overshoot totals reset mid-trial");
            self.detector.reset_totals();
        }
    }

    /// Per-frame work while a trial is open
    fn track(
        &mut self,
        pose: &PoseSample,
        selection: bool,
        sink: &mut impl TrialSink,
    ) -> Result<()> {
        let ControllerState::Running { phase, .. } = self.state else {
            return Ok(());
        };
        self.buffer.push(pose.position, pose.timestamp);

        let pair = self.pair(phase)?;
        let target = *pair.geometry(self.active)?;
        let growth = pair.growth();
        let distance = pair.distance;

        let was_in_contact = self.detector.in_contact();
        self.detector.update(
            pose.position,
            &target,
            &self.axis.axis,
            selection,
            pose.timestamp,
        );
        if was_in_contact
            && let Some(prev) = self.last_timestamp
        {
            self.dwell_time += (pose.timestamp - prev).max(0.0);
        }

        sink.haptic(haptics::request(
            growth,
            pose.position.metric_distance(&target.center),
            distance,
            pose.timestamp - self.trial_start,
        ));
        Ok(())
    }

    fn select(&mut self, phase: Phase, pose: &PoseSample, sink: &mut impl TrialSink) -> Result<()> {
        if !self.trial_open {
            debug!("Baseline selection at {:.3}s", pose.timestamp);
            self.trial_open = true;
            self.open_trial(phase, pose)?;
            return Ok(());
        }

        self.selections += 1;
        let quota = self.quota(phase);
        let last_in_set = self.selections >= quota;
        let last_in_block = last_in_set && {
            let pairs = self.pairs(phase);
            match (pairs.get(self.cursor), pairs.get(self.cursor + 1)) {
                (Some(current), Some(next)) => current.block_index != next.block_index,
                _ => true,
            }
        };

        let overshoot = self.detector.finish_approach();
        let ctx = TrialContext {
            phase,
            set_index: self.cursor,
            trial_index: self.selections,
            pair: self.pair(phase)?,
            active: self.active,
            axis: self.axis,
            dwell_time: self.dwell_time,
            min_speed: self.config.min_speed_threshold,
            start_rotation: self.trial_start_rotation,
            end_rotation: pose.rotation,
        };
        let trial = CompletedTrial::close(ctx, &self.buffer, overshoot)?;
        let eval = self.metrics.evaluate(
            trial.target_id,
            &trial.measurement(),
            last_in_set,
            last_in_block,
        );
        debug!(
            "Trial {}/{} closed: MT {:.3}s hit {} overshoots {}",
            self.selections, quota, trial.movement_time, trial.hit, trial.overshoot.overshoot_count
        );
        sink.emit(TrialRecord::new(&trial, &eval));
        self.emitted += 1;

        if last_in_set {
            sink.session_event(SessionEvent::SetClosed {
                phase,
                set_index: self.cursor,
                pair_index: trial.pair_index,
                metrics: eval.set,
            });
            if last_in_block {
                info!("Block {} ({}) closed", trial.block_label, phase);
                sink.session_event(SessionEvent::BlockClosed {
                    phase,
                    block_index: trial.block_index,
                    label: trial.block_label,
                    metrics: eval.block,
                });
            }
            self.advance(phase, sink)
        } else {
            self.open_trial(phase, pose)
        }
    }

    /// Flips the target and starts a new trial at `pose`
    fn open_trial(&mut self, phase: Phase, pose: &PoseSample) -> Result<()> {
        self.active = self.active.flipped();
        self.axis = self.active_axis(phase)?;
        self.buffer.clear();
        self.buffer.push(pose.position, pose.timestamp);
        self.detector.reset_approach();
        self.dwell_time = 0.0;
        self.trial_start = pose.timestamp;
        self.trial_start_rotation = pose.rotation;
        Ok(())
    }

    fn advance(&mut self, phase: Phase, sink: &mut impl TrialSink) -> Result<()> {
        info!("Set {} of {} phase closed", self.cursor, phase);
        self.cursor += 1;
        self.trial_open = false;

        if self.cursor < self.pairs(phase).len() {
            if self.config.pause_between_sets {
                self.state = ControllerState::Running {
                    phase,
                    stage: Stage::BetweenSets,
                };
                sink.session_event(SessionEvent::Paused {
                    phase,
                    next_set: self.cursor,
                });
                return Ok(());
            }
            return self.begin_set();
        }

        match phase {
            Phase::Training => self.start_phase(Phase::Testing, sink),
            Phase::Testing => {
                self.end(sink);
                Ok(())
            }
        }
    }

    fn end(&mut self, sink: &mut impl TrialSink) {
        info!("Session ended after {} trials", self.emitted);
        self.state = ControllerState::Ended;
        self.trial_open = false;
        self.buffer.clear();
        sink.session_event(SessionEvent::Ended);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BlockConfig, layout::LinearLayout};
    use rand::SeedableRng;

    // Horizontal targets of width 0.5 centered at x = -1 and x = 1.
    fn config(training: usize, testing: usize) -> SessionConfig {
        let mut config = SessionConfig {
            training_selections: training.max(1),
            testing_selections: testing.max(1),
            skip_training: training == 0,
            skip_testing: testing == 0,
            blocks: vec![BlockConfig::new("horizontal", "linear")],
            ..SessionConfig::default()
        };
        config.widths.narrow = 0.5;
        config.widths.wide = 0.5;
        config.distances.short = 2.0;
        config.distances.medium = 2.0;
        config.distances.long = 2.0;
        config.training.width = 0.5;
        config.training.distance = 2.0;
        config.layout.origin = Vec3::zeros();
        config.layout.thickness = 0.5;
        config
    }

    fn controller(config: SessionConfig) -> TrialController {
        let plan = SessionPlan::from_config(&config).unwrap();
        let layout = LinearLayout::from(&config.layout);
        TrialController::new(config, plan, &layout, StdRng::seed_from_u64(1)).unwrap()
    }

    struct Driver {
        t: f64,
        sink: MemorySink,
    }

    impl Driver {
        fn new() -> Self {
            Self {
                t: 0.0,
                sink: MemorySink::default(),
            }
        }

        fn frame(&mut self, c: &mut TrialController, x: f64, trigger: bool) {
            self.t += 0.125;
            let pose = PoseSample {
                position: Vec3::new(x, 0.0, 0.0),
                trigger_pressed: trigger,
                timestamp: self.t,
                ..PoseSample::default()
            };
            c.tick(&pose, &mut self.sink).unwrap();
        }

        /// Press and release at `x`
        fn click(&mut self, c: &mut TrialController, x: f64) {
            self.frame(c, x, true);
            self.frame(c, x, false);
        }
    }

    #[test]
    fn ticks_before_ready_do_nothing() {
        let mut c = controller(config(2, 0));
        let mut d = Driver::new();
        d.click(&mut c, -1.0);
        assert_eq!(c.state(), ControllerState::AwaitingStart);
        assert!(d.sink.records.is_empty());
    }

    #[test]
    fn baseline_selection_is_not_logged() {
        let mut c = controller(config(2, 0));
        let mut d = Driver::new();
        c.ready(&mut d.sink).unwrap();
        assert_eq!(
            c.state(),
            ControllerState::Running {
                phase: Phase::Training,
                stage: Stage::WithinSet
            }
        );

        d.click(&mut c, -1.0);
        assert!(d.sink.records.is_empty());
        assert_eq!(c.active_target(), ActiveTarget::Second);

        d.frame(&mut c, 0.0, false);
        d.click(&mut c, 1.0);
        assert_eq!(d.sink.records.len(), 1);
        let r = &d.sink.records[0];
        assert_eq!(r.phase, "training");
        assert_eq!(r.target_id, 0);
        assert_eq!(r.active_target, 2);
        assert!(r.hit);
        assert_eq!(r.trial_index, 1);
        assert_eq!(c.active_target(), ActiveTarget::First);
    }

    #[test]
    fn quota_closes_set_and_phase() {
        let mut c = controller(config(2, 0));
        let mut d = Driver::new();
        c.ready(&mut d.sink).unwrap();
        d.click(&mut c, -1.0); // baseline
        d.click(&mut c, 1.0);
        d.click(&mut c, -1.0);

        // training had one pair and testing is skipped
        assert!(c.is_ended());
        assert_eq!(d.sink.records.len(), 2);
        let last = &d.sink.records[1];
        assert!(last.set_effective_width.is_some());
        assert!(last.block_effective_width.is_some());
        assert!(d.sink.records[0].set_effective_width.is_none());
        assert!(matches!(d.sink.events.last(), Some(SessionEvent::Ended)));

        // ended is terminal
        d.click(&mut c, 1.0);
        c.ready(&mut d.sink).unwrap();
        assert_eq!(d.sink.records.len(), 2);
    }

    #[test]
    fn skipped_training_starts_in_testing() {
        let mut c = controller(config(0, 1));
        let mut d = Driver::new();
        c.ready(&mut d.sink).unwrap();
        assert_eq!(
            c.state(),
            ControllerState::Running {
                phase: Phase::Testing,
                stage: Stage::WithinSet
            }
        );
        assert_eq!(d.sink.events, vec![SessionEvent::PhaseStarted(Phase::Testing)]);
    }

    #[test]
    fn testing_runs_every_pair_then_ends() {
        let mut c = controller(config(1, 1));
        let mut d = Driver::new();
        c.ready(&mut d.sink).unwrap();
        // training: one pair, one logged selection
        d.click(&mut c, -1.0);
        d.click(&mut c, 1.0);
        assert_eq!(
            c.state(),
            ControllerState::Running {
                phase: Phase::Testing,
                stage: Stage::WithinSet
            }
        );

        for _ in 0..6 {
            d.click(&mut c, -1.0);
            d.click(&mut c, 1.0);
        }
        assert!(c.is_ended());

        let testing: Vec<_> = d.sink.records.iter().filter(|r| r.phase == "testing").collect();
        assert_eq!(testing.len(), 6);
        let mut ids: Vec<i32> = testing.iter().map(|r| r.target_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);

        let blocks = d
            .sink
            .events
            .iter()
            .filter(|e| matches!(e, SessionEvent::BlockClosed { .. }))
            .count();
        // one training block and one testing block
        assert_eq!(blocks, 2);
        assert_eq!(testing.last().map(|r| r.block_label.as_str()), Some("A"));
        assert!(testing[5].block_effective_width.is_some());
        assert!(testing[4].block_effective_width.is_none());
    }

    #[test]
    fn pause_between_sets_waits_for_ready() {
        let mut cfg = config(0, 1);
        cfg.pause_between_sets = true;
        let mut c = controller(cfg);
        let mut d = Driver::new();
        c.ready(&mut d.sink).unwrap();
        d.click(&mut c, -1.0);
        d.click(&mut c, 1.0);
        assert_eq!(
            c.state(),
            ControllerState::Running {
                phase: Phase::Testing,
                stage: Stage::BetweenSets
            }
        );

        // selections while paused are ignored
        d.click(&mut c, -1.0);
        d.click(&mut c, 1.0);
        assert_eq!(d.sink.records.len(), 1);

        c.ready(&mut d.sink).unwrap();
        d.click(&mut c, -1.0);
        d.click(&mut c, 1.0);
        assert_eq!(d.sink.records.len(), 2);
    }

    #[test]
    fn held_trigger_is_one_selection() {
        let mut c = controller(config(3, 0));
        let mut d = Driver::new();
        c.ready(&mut d.sink).unwrap();
        d.frame(&mut c, -1.0, true);
        d.frame(&mut c, -1.0, true);
        d.frame(&mut c, 0.0, true);
        d.frame(&mut c, 1.0, false);
        assert!(d.sink.records.is_empty());
        d.frame(&mut c, 1.0, true);
        assert_eq!(d.sink.records.len(), 1);
    }

    #[test]
    fn overshoot_is_recorded_before_selection() {
        let mut c = controller(config(2, 0));
        let mut d = Driver::new();
        c.ready(&mut d.sink).unwrap();
        d.click(&mut c, -1.0);
        d.frame(&mut c, 0.0, false);
        d.frame(&mut c, 1.0, false);
        d.frame(&mut c, 1.5, false);
        d.frame(&mut c, 1.0, false);
        d.click(&mut c, 1.0);

        let r = &d.sink.records[0];
        assert_eq!(r.overshoot_count, 1);
        assert_eq!(r.total_overshoot_distance, 0.25);
        assert_eq!(r.re_entry_count, 1);
        assert!(r.contacted);
        assert!(r.dwell_time > 0.0);
    }

    #[test]
    fn early_press_logs_immediate_undershoot() {
        let mut c = controller(config(2, 0));
        let mut d = Driver::new();
        c.ready(&mut d.sink).unwrap();
        d.click(&mut c, -1.0);
        d.frame(&mut c, 0.0, false);
        d.click(&mut c, 0.5); // short of x = 0.75

        let r = &d.sink.records[0];
        assert!(!r.hit);
        assert_eq!(r.undershoot_count, 1);
        assert!(r.immediate_undershoot);
        assert_eq!(r.final_axis_difference, 0.25);
    }

    #[test]
    fn held_opening_press_is_not_an_undershoot() {
        let mut c = controller(config(2, 0));
        let mut d = Driver::new();
        c.ready(&mut d.sink).unwrap();
        // the baseline press stays down while the hand leaves the first target
        d.frame(&mut c, -1.0, true);
        d.frame(&mut c, -0.9, true);
        d.frame(&mut c, -0.5, true);
        d.frame(&mut c, 0.0, false);
        d.frame(&mut c, 1.0, false);
        d.click(&mut c, 1.0);

        let r = &d.sink.records[0];
        assert!(r.hit);
        assert_eq!(r.overshoot_count, 0);
        assert_eq!(r.undershoot_count, 0);
        assert!(!r.immediate_undershoot);
        assert_eq!(r.total_undershoot_distance, 0.0);
        assert_eq!(r.re_entry_count, 0);
    }

    #[test]
    fn set_sums_match_logged_trials() {
        let mut c = controller(config(3, 0));
        let mut d = Driver::new();
        c.ready(&mut d.sink).unwrap();
        d.click(&mut c, -1.0);
        d.frame(&mut c, 0.0, false);
        d.click(&mut c, 1.0);
        d.frame(&mut c, 0.2, false);
        d.frame(&mut c, -1.2, false);
        d.click(&mut c, -1.0);
        d.click(&mut c, 1.1);

        let records = &d.sink.records;
        assert_eq!(records.len(), 3);
        let last = &records[2];
        assert_eq!(last.set_trials, Some(3));
        assert_eq!(last.set_hits, Some(3));

        let axis: f64 = records.iter().map(|r| r.axis_distance).sum();
        let path: f64 = records.iter().map(|r| r.path_length).sum();
        let amplitude: f64 = records.iter().map(|r| r.amplitude).sum();
        assert!((last.set_sum_axis_distance.unwrap() - axis).abs() < 1e-12);
        assert!((last.set_sum_path_length.unwrap() - path).abs() < 1e-12);
        assert!((last.set_sum_amplitude.unwrap() - amplitude).abs() < 1e-12);
        assert!((last.block_sum_axis_distance.unwrap() - axis).abs() < 1e-12);

        let mean_mt = records.iter().map(|r| r.movement_time).sum::<f64>() / 3.0;
        assert!((last.set_mean_movement_time.unwrap() - mean_mt).abs() < 1e-12);
        assert!(records[..2].iter().all(|r| r.set_sum_axis_distance.is_none()));
    }

    #[test]
    fn unknown_direction_is_flagged_on_records() {
        let cfg = SessionConfig {
            blocks: vec![BlockConfig::new("diagonal", "linear")],
            ..config(0, 1)
        };
        let mut c = controller(cfg);
        let mut d = Driver::new();
        c.ready(&mut d.sink).unwrap();
        d.click(&mut c, -1.0);
        d.click(&mut c, 1.0);

        let r = &d.sink.records[0];
        assert!(r.axis_fallback);
        assert_eq!(r.direction, "horizontal");
        assert!(r.hit);
    }

    #[test]
    fn start_and_end_rotation_are_recorded() {
        let mut c = controller(config(2, 0));
        let mut sink = MemorySink::default();
        c.ready(&mut sink).unwrap();
        let pose = |x: f64, t: f64, trigger: bool, rotation: Quat| PoseSample {
            position: Vec3::new(x, 0.0, 0.0),
            rotation,
            trigger_pressed: trigger,
            timestamp: t,
        };
        let tilted = Quat::from_euler_angles(0.0, 0.0, 0.3);
        c.tick(&pose(-1.0, 0.0, true, tilted), &mut sink).unwrap();
        c.tick(&pose(0.0, 0.1, false, tilted), &mut sink).unwrap();
        c.tick(&pose(1.0, 0.2, true, Quat::identity()), &mut sink).unwrap();

        let r = &sink.records[0];
        assert!((r.start_qw - 0.15f64.cos()).abs() < 1e-12);
        assert!((r.start_qz - 0.15f64.sin()).abs() < 1e-12);
        assert_eq!((r.end_qx, r.end_qy, r.end_qz, r.end_qw), (0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn reset_totals_mid_trial_keeps_counts() {
        let mut c = controller(config(2, 0));
        let mut d = Driver::new();
        c.ready(&mut d.sink).unwrap();
        // no trial open yet
        c.reset_totals();
        d.click(&mut c, -1.0);
        d.frame(&mut c, 0.0, false);
        d.frame(&mut c, 1.0, false);
        d.frame(&mut c, 1.5, false);
        d.frame(&mut c, 1.0, false);
        c.reset_totals();
        d.click(&mut c, 1.0);

        let r = &d.sink.records[0];
        assert_eq!(r.overshoot_count, 1);
        assert_eq!(r.re_entry_count, 1);
        assert_eq!(r.total_overshoot_distance, 0.0);
        assert_eq!(r.last_overshoot_distance, 0.25);
    }

    #[test]
    fn zero_movement_time_is_skipped_not_aggregated() {
        let mut c = controller(config(2, 0));
        let mut sink = MemorySink::default();
        c.ready(&mut sink).unwrap();
        let at = |t: f64, trigger: bool| PoseSample {
            position: Vec3::new(1.0, 0.0, 0.0),
            trigger_pressed: trigger,
            timestamp: t,
            ..PoseSample::default()
        };
        c.tick(&at(0.0, true), &mut sink).unwrap();
        c.tick(&at(0.0, false), &mut sink).unwrap();
        c.tick(&at(0.0, true), &mut sink).unwrap();

        let r = &sink.records[0];
        assert_eq!(r.skip_reason.as_deref(), Some("non_positive_movement_time"));
        assert_eq!(r.throughput, 0.0);
    }

    #[test]
    fn haptics_follow_active_target() {
        let mut c = controller(config(2, 0));
        let mut d = Driver::new();
        c.ready(&mut d.sink).unwrap();
        d.click(&mut c, -1.0);
        assert!(d.sink.haptics.iter().all(|h| h.intensity == 0));
        d.frame(&mut c, 1.0, false);
        assert_eq!(d.sink.haptics.last().map(|h| h.intensity), Some(100));
    }

    #[test]
    fn missing_block_rejected_at_setup() {
        let cfg = SessionConfig {
            blocks: vec![],
            ..config(1, 1)
        };
        let plan = SessionPlan {
            training: SessionPlan::from_config(&config(1, 1)).unwrap().training,
            testing: vec![],
        };
        let layout = LinearLayout::from(&cfg.layout);
        assert!(TrialController::new(cfg, plan, &layout, StdRng::seed_from_u64(0)).is_err());
    }
}
