//! Target placement.
//!
//! A [`TargetLayout`] resolves the two boxes of a pair before the session
//! starts. The controller never places targets itself.

use crate::{
    config::LayoutConfig,
    error::Result,
    geometry::{TargetGeometry, Vec3},
    targets::{SessionPlan, TargetPair},
};
use log::debug;

pub trait TargetLayout {
    /// Geometry of (first, second) target
    fn place(&self, pair: &TargetPair) -> Result<(TargetGeometry, TargetGeometry)>;

    /// Attaches geometry to every pair of the plan
    fn apply(&self, plan: &mut SessionPlan) -> Result<()> {
        for pair in plan.training.iter_mut().chain(plan.testing.iter_mut()) {
            let (first, second) = self.place(pair)?;
            debug!(
                "pair {} ({}): {:?} <-> {:?}",
                pair.pair_index, pair.target_id, first.center, second.center
            );
            pair.attach_geometry(first, second);
        }
        Ok(())
    }
}

/// Both targets on the pair's axis, symmetric about `origin`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearLayout {
    pub origin: Vec3,
    /// Extent across the movement axis [m]
    pub thickness: f64,
}

impl LinearLayout {
    pub fn new(origin: Vec3, thickness: f64) -> Self {
        Self { origin, thickness }
    }
}

impl From<&LayoutConfig> for LinearLayout {
    fn from(config: &LayoutConfig) -> Self {
        Self::new(config.origin, config.thickness)
    }
}

impl TargetLayout for LinearLayout {
    fn place(&self, pair: &TargetPair) -> Result<(TargetGeometry, TargetGeometry)> {
        let unit = pair.direction().unit();
        let offset = unit * (pair.distance / 2.0);

        // width along the axis, thickness across it
        let across = Vec3::repeat(1.0) - unit;
        let half_extents = unit * (pair.width / 2.0) + across * (self.thickness / 2.0);

        Ok((
            TargetGeometry::new(self.origin - offset, half_extents),
            TargetGeometry::new(self.origin + offset, half_extents),
        ))
    }
}
