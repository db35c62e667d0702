use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// 3-D vector in world space [m]
pub type Vec3 = Vector3<f64>;

/// Controller orientation
pub type Quat = UnitQuaternion<f64>;

/// Axis-aligned target box resolved by the layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetGeometry {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl TargetGeometry {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    /// Boundary inclusive
    pub fn contains(&self, p: &Vec3) -> bool {
        (p - self.center)
            .abs()
            .iter()
            .zip(self.half_extents.iter())
            .all(|(d, h)| d <= h)
    }

    /// Closest point of the box to `p` (p itself when inside)
    pub fn closest_point(&self, p: &Vec3) -> Vec3 {
        let min = self.center - self.half_extents;
        let max = self.center + self.half_extents;
        p.sup(&min).inf(&max)
    }
}
