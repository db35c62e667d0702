use crate::error::Result;
use fitts_core::{
    ControllerState, HapticRequest, LinearLayout, Metric, PoseSample, SessionConfig,
    SessionEvent, SessionPlan, Stage, TrialController, TrialRecord, TrialSink,
};
use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};

/// Collects records and reports session progress through the log
#[derive(Debug, Default)]
pub struct ReplaySink {
    pub records: Vec<TrialRecord>,
    pub peak_intensity: u8,
    pub blocks_closed: usize,
}

impl TrialSink for ReplaySink {
    fn emit(&mut self, record: TrialRecord) {
        debug!(
            "{} pair {} trial {}: MT {:.3}s TP {:.2} hit {}",
            record.phase,
            record.pair_index,
            record.trial_index,
            record.movement_time,
            record.throughput,
            record.hit
        );
        self.records.push(record);
    }

    fn haptic(&mut self, request: HapticRequest) {
        self.peak_intensity = self.peak_intensity.max(request.intensity);
    }

    fn session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::PhaseStarted(phase) => info!("{} phase started", phase),
            SessionEvent::SetClosed {
                phase,
                set_index,
                metrics,
                ..
            } => {
                if let Some(m) = metrics {
                    info!(
                        "{} set {} closed: {} trials, We {:.4} TPe {:.2} ({})",
                        phase,
                        set_index,
                        m.trials,
                        m.effective_width.value(),
                        m.effective_throughput.value(),
                        m.effective_throughput.status()
                    );
                }
            }
            SessionEvent::BlockClosed {
                label, metrics, ..
            } => {
                self.blocks_closed += 1;
                if let Some(m) = metrics {
                    info!(
                        "Block {} closed: TPe {:.2}, error rate {:.1}%",
                        label,
                        m.effective_throughput.value(),
                        m.error_rate.value() * 100.0
                    );
                }
            }
            SessionEvent::Paused { phase, next_set } => {
                info!("Paused before {} set {}", phase, next_set)
            }
            SessionEvent::Ended => info!("Session ended"),
        }
    }
}

#[derive(Debug)]
pub struct ReplayOutcome {
    pub sink: ReplaySink,
    pub final_state: ControllerState,
    pub frames: usize,
}

/// Drives a controller with a recorded pose stream. Pauses between sets are
/// resumed immediately.
pub fn replay(config: SessionConfig, poses: &[PoseSample]) -> Result<ReplayOutcome> {
    let seed = config.seed.unwrap_or(0);
    let plan = SessionPlan::from_config(&config)?;
    let layout = LinearLayout::from(&config.layout);
    let mut controller =
        TrialController::new(config, plan, &layout, StdRng::seed_from_u64(seed))?;
    let mut sink = ReplaySink::default();

    controller.ready(&mut sink)?;
    let mut frames = 0;
    for pose in poses {
        if controller.is_ended() {
            break;
        }
        if let ControllerState::Running {
            stage: Stage::BetweenSets,
            ..
        } = controller.state()
        {
            controller.ready(&mut sink)?;
        }
        controller.tick(pose, &mut sink)?;
        frames += 1;
    }

    Ok(ReplayOutcome {
        final_state: controller.state(),
        sink,
        frames,
    })
}

/// Mean trial throughput over trials that were not skipped
pub fn mean_throughput(records: &[TrialRecord]) -> Metric {
    let tps: Vec<f64> = records
        .iter()
        .filter(|r| r.skip_reason.is_none())
        .map(|r| r.throughput)
        .collect();
    if tps.is_empty() {
        return Metric::Incomplete { samples: 0 };
    }
    Metric::from_value(tps.iter().sum::<f64>() / tps.len() as f64)
}
