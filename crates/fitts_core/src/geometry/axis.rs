use super::types::{TargetGeometry, Vec3};
use log::warn;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

/// Movement direction of a target pair
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Horizontal,
    Vertical,
    Depth,
}

impl Direction {
    /// Used whenever a label or a delta cannot be resolved.
    pub const FALLBACK: Direction = Direction::Horizontal;

    pub fn unit(self) -> Vec3 {
        match self {
            Direction::Horizontal => Vec3::x(),
            Direction::Vertical => Vec3::y(),
            Direction::Depth => Vec3::z(),
        }
    }

    fn component(self, v: Vec3) -> f64 {
        match self {
            Direction::Horizontal => v.x,
            Direction::Vertical => v.y,
            Direction::Depth => v.z,
        }
    }

    /// Parses a direction label, falling back to [`Direction::FALLBACK`].
    /// The returned flag is true when the fallback was taken.
    pub fn from_label(label: &str) -> (Direction, bool) {
        match Direction::from_str(label.trim()) {
            Ok(direction) => (direction, false),
            Err(_) => {
                warn!(
                    "Unknown direction '{}', falling back to {}",
                    label,
                    Direction::FALLBACK
                );
                (Direction::FALLBACK, true)
            }
        }
    }
}

/// Signed unit axis pointing from the departure target toward the active one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementAxis {
    pub direction: Direction,
    pub unit: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisResolution {
    pub axis: MovementAxis,
    /// True when the fallback axis was used
    pub fallback: bool,
}

impl MovementAxis {
    pub fn new(direction: Direction, positive: bool) -> Self {
        let unit = if positive {
            direction.unit()
        } else {
            -direction.unit()
        };
        Self { direction, unit }
    }

    #[inline]
    pub fn project(&self, v: Vec3) -> f64 {
        v.dot(&self.unit)
    }

    /// Component of `v` orthogonal to the axis
    #[inline]
    pub fn perpendicular(&self, v: Vec3) -> Vec3 {
        v - self.unit * self.project(v)
    }

    /// Signed axis distance from `p` to the nearest point of the target box.
    /// Negative beyond the target, positive before it, zero on or inside it.
    pub fn axis_difference(&self, p: Vec3, target: &TargetGeometry) -> f64 {
        self.project(target.closest_point(&p) - p)
    }

    /// Extent of the target along the axis
    pub fn target_width(&self, target: &TargetGeometry) -> f64 {
        2.0 * target.half_extents.dot(&self.unit.abs())
    }
}

/// Resolves the movement axis between two target centers.
///
/// With a preferred direction the axis follows it and only the sign comes from
/// the delta; otherwise the dominant component of the delta wins. Coincident
/// centers resolve to `+X` and are flagged.
pub fn resolve_axis(preferred: Option<Direction>, from: Vec3, to: Vec3) -> AxisResolution {
    let delta = to - from;
    let direction = preferred.unwrap_or_else(|| dominant_direction(delta));
    let along = direction.component(delta);

    if !along.is_finite() || along == 0.0 {
        warn!(
            "Degenerate movement axis between {:?} and {:?}, using +{}",
            from,
            to,
            Direction::FALLBACK
        );
        return AxisResolution {
            axis: MovementAxis::new(Direction::FALLBACK, true),
            fallback: true,
        };
    }

    AxisResolution {
        axis: MovementAxis::new(direction, along > 0.0),
        fallback: false,
    }
}

fn dominant_direction(delta: Vec3) -> Direction {
    let a = delta.abs();
    if a.x >= a.y && a.x >= a.z {
        Direction::Horizontal
    } else if a.y >= a.z {
        Direction::Vertical
    } else {
        Direction::Depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!(Direction::from_label("Vertical"), (Direction::Vertical, false));
        assert_eq!(Direction::from_label(" depth "), (Direction::Depth, false));
    }

    #[test]
    fn unknown_label_falls_back_with_flag() {
        assert_eq!(
            Direction::from_label("diagonal"),
            (Direction::Horizontal, true)
        );
    }

    #[test]
    fn dominant_component_selects_axis() {
        let r = resolve_axis(None, Vec3::zeros(), Vec3::new(0.01, -0.3, 0.05));
        assert!(!r.fallback);
        assert_eq!(r.axis.direction, Direction::Vertical);
        assert_eq!(r.axis.unit, Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn preferred_direction_keeps_sign_of_delta() {
        let r = resolve_axis(
            Some(Direction::Horizontal),
            Vec3::new(0.2, 0.0, 0.0),
            Vec3::new(-0.1, 0.5, 0.0),
        );
        assert!(!r.fallback);
        assert_eq!(r.axis.unit, Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn coincident_targets_fall_back_to_x() {
        let p = Vec3::new(0.3, 0.3, 0.3);
        let r = resolve_axis(None, p, p);
        assert!(r.fallback);
        assert_eq!(r.axis.unit, Vec3::x());
    }

    #[test]
    fn axis_difference_sign_convention() {
        let axis = MovementAxis::new(Direction::Horizontal, true);
        let target = TargetGeometry::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.25, 0.25, 0.25));

        // before the target
        assert_eq!(axis.axis_difference(Vec3::new(0.5, 0.0, 0.0), &target), 0.25);
        // beyond the target
        assert_eq!(axis.axis_difference(Vec3::new(1.5, 0.0, 0.0), &target), -0.25);
        // on the boundary and inside
        assert_eq!(axis.axis_difference(Vec3::new(0.75, 0.0, 0.0), &target), 0.0);
        assert_eq!(axis.axis_difference(Vec3::new(1.0, 0.1, 0.0), &target), 0.0);
    }

    #[test]
    fn negative_axis_flips_overshoot_side() {
        let axis = MovementAxis::new(Direction::Horizontal, false);
        let target = TargetGeometry::new(Vec3::zeros(), Vec3::new(0.1, 0.1, 0.1));
        assert!(axis.axis_difference(Vec3::new(-0.5, 0.0, 0.0), &target) < 0.0);
        assert!(axis.axis_difference(Vec3::new(0.5, 0.0, 0.0), &target) > 0.0);
    }

    #[test]
    fn perpendicular_of_axis_aligned_delta_is_zero() {
        let axis = MovementAxis::new(Direction::Depth, true);
        assert_eq!(axis.perpendicular(Vec3::new(0.0, 0.0, 0.4)).norm(), 0.0);
        assert!((axis.perpendicular(Vec3::new(0.3, 0.0, 0.4)).norm() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn target_width_along_axis() {
        let axis = MovementAxis::new(Direction::Vertical, false);
        let target = TargetGeometry::new(Vec3::zeros(), Vec3::new(0.5, 0.02, 0.5));
        assert!((axis.target_width(&target) - 0.04).abs() < 1e-12);
    }
}
