/// ISO 9241-411 effective width factor (√(2πe))
pub const EFFECTIVE_WIDTH_FACTOR: f64 = 4.133;

/// Minimum endpoints needed for a standard deviation
pub const MIN_EFFECTIVE_SAMPLES: usize = 2;

/// Reserved target id for the training configuration
pub const TRAINING_TARGET_ID: i32 = 0;
/// Sentinel for an unassigned target id
pub const UNASSIGNED_TARGET_ID: i32 = -1;
pub const MAX_TARGET_ID: i32 = 6;

/// Precision class thresholds on ID [bits]
pub const HIGH_PRECISION_ID: f64 = 6.0;
pub const MEDIUM_PRECISION_ID: f64 = 4.0;
pub const LOW_PRECISION_ID: f64 = 3.0;

/// Default numeric tables [m]
pub const DEFAULT_WIDTHS_M: [f64; 2] = [0.02, 0.04];
pub const DEFAULT_DISTANCES_M: [f64; 3] = [0.10, 0.20, 0.30];
pub const DEFAULT_TRAINING_WIDTH_M: f64 = 0.05;
pub const DEFAULT_TRAINING_DISTANCE_M: f64 = 0.15;

/// Steps below this speed [m/s] count as sensor noise
pub const DEFAULT_MIN_SPEED: f64 = 0.01;

/// Haptic intensity range
pub const MAX_HAPTIC_INTENSITY: u8 = 100;
pub const STAIR_STEPS: f64 = 4.0;
/// Pulse period at the far and near ends of the approach [s]
pub const PULSE_PERIOD_FAR_S: f64 = 0.5;
pub const PULSE_PERIOD_NEAR_S: f64 = 0.1;

/// Pose stream CSV header
pub const POSE_HEADER: [&str; 9] = ["timestamp", "x", "y", "z", "qx", "qy", "qz", "qw", "trigger"];
