pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod haptics;
pub mod layout;
pub mod metrics;
pub mod movement;
pub mod overshoot;
pub mod record;
pub mod targets;
pub mod trial;

pub use config::SessionConfig;
pub use constants::{EFFECTIVE_WIDTH_FACTOR, POSE_HEADER, TRAINING_TARGET_ID};
pub use controller::{
    ControllerState, MemorySink, PoseSample, SessionEvent, Stage, TrialController, TrialSink,
};
pub use error::FittsError;
pub use geometry::{Direction, MovementAxis, Quat, TargetGeometry, Vec3, resolve_axis};
pub use haptics::HapticRequest;
pub use layout::{LinearLayout, TargetLayout};
pub use metrics::{AggregateMetrics, FittsMetricsEngine, Metric, SkipReason};
pub use movement::MovementSampleBuffer;
pub use overshoot::{OvershootSummary, OvershootUndershootDetector};
pub use record::{TrialRecord, write_records};
pub use targets::{GrowthPattern, SessionPlan, TargetPair, block_label};
pub use trial::{CompletedTrial, Phase};
