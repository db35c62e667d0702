use crate::{
    config::SessionConfig,
    constants::{MAX_TARGET_ID, TRAINING_TARGET_ID},
    error::{FittsError, Result},
    geometry::{Direction, TargetGeometry},
};
use itertools::iproduct;
use log::debug;
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum WidthClass {
    Narrow,
    Wide,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DistanceClass {
    Short,
    Medium,
    Long,
}

/// Haptic intensity growth pattern
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum GrowthPattern {
    Linear,
    Quadratic,
    Stair,
    Pulse,
}

impl WidthClass {
    pub fn index(self) -> usize {
        self as usize
    }
}

impl DistanceClass {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Size class of one target. Training targets have their own numeric size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    Training,
    Testing {
        width: WidthClass,
        distance: DistanceClass,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetSpec {
    pub direction: Direction,
    pub size: SizeClass,
    pub growth: GrowthPattern,
}

/// Numeric target id for a size class: 0 for training, 1..=6 otherwise
pub fn target_id(size: SizeClass) -> i32 {
    match size {
        SizeClass::Training => TRAINING_TARGET_ID,
        SizeClass::Testing { width, distance } => {
            let n_distances = DistanceClass::iter().count();
            1 + (width.index() * n_distances + distance.index()) as i32
        }
    }
}

pub fn is_valid_target_id(id: i32) -> bool {
    (TRAINING_TARGET_ID..=MAX_TARGET_ID).contains(&id)
}

/// Block letter for a testing condition. Horizontal blocks are A-D,
/// vertical E-H and depth I-L, in growth order.
pub fn block_label(direction: Direction, growth: GrowthPattern) -> char {
    use Direction::*;
    use GrowthPattern::*;
    match (direction, growth) {
        (Horizontal, Linear) => 'A',
        (Horizontal, Quadratic) => 'B',
        (Horizontal, Stair) => 'C',
        (Horizontal, Pulse) => 'D',
        (Vertical, Linear) => 'E',
        (Vertical, Quadratic) => 'F',
        (Vertical, Stair) => 'G',
        (Vertical, Pulse) => 'H',
        (Depth, Linear) => 'I',
        (Depth, Quadratic) => 'J',
        (Depth, Stair) => 'K',
        (Depth, Pulse) => 'L',
    }
}

/// Two targets the participant alternates between
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPair {
    pub first: TargetSpec,
    pub second: TargetSpec,
    pub target_id: i32,
    pub pair_index: usize,
    pub block_index: usize,
    /// Nominal center-to-center distance [m]
    pub distance: f64,
    /// Nominal width along the movement axis [m]
    pub width: f64,
    /// The direction label was unknown and [`Direction::FALLBACK`] was used
    pub direction_fallback: bool,
    geometry: Option<(TargetGeometry, TargetGeometry)>,
}

/// Which target of the pair is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum ActiveTarget {
    #[strum(serialize = "1")]
    First,
    #[strum(serialize = "2")]
    Second,
}

impl ActiveTarget {
    pub fn flipped(self) -> Self {
        match self {
            ActiveTarget::First => ActiveTarget::Second,
            ActiveTarget::Second => ActiveTarget::First,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            ActiveTarget::First => 1,
            ActiveTarget::Second => 2,
        }
    }
}

impl TargetPair {
    pub fn new(spec: TargetSpec, pair_index: usize, block_index: usize, width: f64, distance: f64) -> Self {
        Self {
            first: spec,
            second: spec,
            target_id: target_id(spec.size),
            pair_index,
            block_index,
            distance,
            width,
            direction_fallback: false,
            geometry: None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.first.direction
    }

    pub fn growth(&self) -> GrowthPattern {
        self.first.growth
    }

    pub fn block_label(&self) -> char {
        block_label(self.direction(), self.growth())
    }

    pub fn attach_geometry(&mut self, first: TargetGeometry, second: TargetGeometry) {
        self.geometry = Some((first, second));
    }

    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn geometry(&self, which: ActiveTarget) -> Result<&TargetGeometry> {
        let (first, second) = self.geometry.as_ref().ok_or(FittsError::MissingGeometry {
            pair_index: self.pair_index,
            target: which.number(),
        })?;
        Ok(match which {
            ActiveTarget::First => first,
            ActiveTarget::Second => second,
        })
    }

    pub fn spec(&self, which: ActiveTarget) -> &TargetSpec {
        match which {
            ActiveTarget::First => &self.first,
            ActiveTarget::Second => &self.second,
        }
    }
}

/// Ordered target pairs for both phases
#[derive(Debug, Clone, Default)]
pub struct SessionPlan {
    pub training: Vec<TargetPair>,
    pub testing: Vec<TargetPair>,
}

impl SessionPlan {
    /// Expands the configuration into pairs: `training_sets` training pairs and,
    /// per testing block, one pair for each width × distance combination.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let mut pair_index = 0;

        let (training_direction, training_fallback) =
            Direction::from_label(&config.training.direction);
        let training_growth = config.training.growth_pattern()?;
        let mut training = Vec::with_capacity(config.training.sets);
        for _ in 0..config.training.sets {
            let spec = TargetSpec {
                direction: training_direction,
                size: SizeClass::Training,
                growth: training_growth,
            };
            let mut pair = TargetPair::new(
                spec,
                pair_index,
                0,
                config.training.width,
                config.training.distance,
            );
            pair.direction_fallback = training_fallback;
            training.push(pair);
            pair_index += 1;
        }

        let mut testing = Vec::new();
        for (block_index, block) in config.blocks.iter().enumerate() {
            let (direction, direction_fallback) = Direction::from_label(&block.direction);
            let growth = block.growth_pattern()?;
            for (width, distance) in iproduct!(WidthClass::iter(), DistanceClass::iter()) {
                let spec = TargetSpec {
                    direction,
                    size: SizeClass::Testing { width, distance },
                    growth,
                };
                let mut pair = TargetPair::new(
                    spec,
                    pair_index,
                    block_index,
                    config.widths.value(width),
                    config.distances.value(distance),
                );
                pair.direction_fallback = direction_fallback;
                testing.push(pair);
                pair_index += 1;
            }
        }

        let plan = Self { training, testing };
        plan.validate(config)?;
        Ok(plan)
    }

    /// Fatal setup checks: target ids and non-empty phases
    pub fn validate(&self, config: &SessionConfig) -> Result<()> {
        if !config.skip_training && self.training.is_empty() {
            return Err(FittsError::EmptyPairList {
                phase: "training".to_string(),
            });
        }
        if !config.skip_testing && self.testing.is_empty() {
            return Err(FittsError::EmptyPairList {
                phase: "testing".to_string(),
            });
        }
        for pair in self.training.iter().chain(self.testing.iter()) {
            if !is_valid_target_id(pair.target_id) {
                return Err(FittsError::InvalidTargetId {
                    pair_index: pair.pair_index,
                    id: pair.target_id,
                });
            }
        }
        Ok(())
    }

    /// Shuffles testing pairs within each block; block order is kept.
    pub fn shuffle_testing<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for chunk in self
            .testing
            .chunk_by_mut(|a, b| a.block_index == b.block_index)
        {
            chunk.shuffle(rng);
        }
        debug!(
            "Testing order: {:?}",
            self.testing.iter().map(|p| p.target_id).collect::<Vec<_>>()
        );
    }
}
