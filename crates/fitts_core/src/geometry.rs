pub mod axis;
pub mod types;

pub use axis::{AxisResolution, Direction, MovementAxis, resolve_axis};
pub use types::{Quat, TargetGeometry, Vec3};
