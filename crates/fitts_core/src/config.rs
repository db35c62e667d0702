use crate::{
    constants::{
        DEFAULT_DISTANCES_M, DEFAULT_MIN_SPEED, DEFAULT_TRAINING_DISTANCE_M,
        DEFAULT_TRAINING_WIDTH_M, DEFAULT_WIDTHS_M,
    },
    error::{FittsError, Result},
    geometry::Vec3,
    targets::{DistanceClass, GrowthPattern, WidthClass},
};
use serde::{Deserialize, Serialize};
use std::{path::Path, str::FromStr};

/// Session configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Selections per training set, the baseline selection excluded
    pub training_selections: usize,
    /// Selections per testing set, the baseline selection excluded
    pub testing_selections: usize,
    pub skip_training: bool,
    pub skip_testing: bool,
    /// Wait for a ready signal between sets
    pub pause_between_sets: bool,
    /// Overshoot/undershoot re-trigger debounce [s]
    pub cooldown_secs: f64,
    /// Speeds below this are noise [m/s]
    pub min_speed_threshold: f64,
    /// Seed for the testing order shuffle
    pub seed: Option<u64>,
    pub widths: WidthTable,
    pub distances: DistanceTable,
    pub training: TrainingConfig,
    pub blocks: Vec<BlockConfig>,
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct WidthTable {
    pub narrow: f64,
    pub wide: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DistanceTable {
    pub short: f64,
    pub medium: f64,
    pub long: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    pub sets: usize,
    pub direction: String,
    pub growth: String,
    pub width: f64,
    pub distance: f64,
}

/// One testing block condition
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BlockConfig {
    pub direction: String, // "horizontal" | "vertical" | "depth"
    pub growth: String,    // "linear" | "quadratic" | "stair" | "pulse"
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Midpoint between the two targets [m]
    pub origin: Vec3,
    /// Target extent across the movement axis [m]
    pub thickness: f64,
}

impl WidthTable {
    pub fn value(&self, class: WidthClass) -> f64 {
        match class {
            WidthClass::Narrow => self.narrow,
            WidthClass::Wide => self.wide,
        }
    }
}

impl DistanceTable {
    pub fn value(&self, class: DistanceClass) -> f64 {
        match class {
            DistanceClass::Short => self.short,
            DistanceClass::Medium => self.medium,
            DistanceClass::Long => self.long,
        }
    }
}

fn parse_growth(label: &str) -> Result<GrowthPattern> {
    GrowthPattern::from_str(label.trim()).map_err(|_| {
        FittsError::Config(format!(
            "Invalid growth pattern: {}. Must be 'linear', 'quadratic', 'stair', or 'pulse'",
            label
        ))
    })
}

impl TrainingConfig {
    pub fn growth_pattern(&self) -> Result<GrowthPattern> {
        parse_growth(&self.growth)
    }
}

impl BlockConfig {
    pub fn new(direction: &str, growth: &str) -> Self {
        Self {
            direction: direction.to_string(),
            growth: growth.to_string(),
        }
    }

    pub fn growth_pattern(&self) -> Result<GrowthPattern> {
        parse_growth(&self.growth)
    }
}

impl Default for WidthTable {
    fn default() -> Self {
        Self {
            narrow: DEFAULT_WIDTHS_M[0],
            wide: DEFAULT_WIDTHS_M[1],
        }
    }
}

impl Default for DistanceTable {
    fn default() -> Self {
        Self {
            short: DEFAULT_DISTANCES_M[0],
            medium: DEFAULT_DISTANCES_M[1],
            long: DEFAULT_DISTANCES_M[2],
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            sets: 1,
            direction: "horizontal".to_string(),
            growth: "linear".to_string(),
            width: DEFAULT_TRAINING_WIDTH_M,
            distance: DEFAULT_TRAINING_DISTANCE_M,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin: Vec3::new(0.0, 1.0, 0.4),
            thickness: 0.1,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            training_selections: 10,
            testing_selections: 10,
            skip_training: false,
            skip_testing: false,
            pause_between_sets: false,
            cooldown_secs: 0.0,
            min_speed_threshold: DEFAULT_MIN_SPEED,
            seed: None,
            widths: WidthTable::default(),
            distances: DistanceTable::default(),
            training: TrainingConfig::default(),
            blocks: vec![
                BlockConfig::new("horizontal", "linear"),
                BlockConfig::new("horizontal", "quadratic"),
                BlockConfig::new("horizontal", "stair"),
                BlockConfig::new("horizontal", "pulse"),
            ],
            layout: LayoutConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Load from a TOML file and validate
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FittsError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: SessionConfig = toml::from_str(&content).map_err(|e| {
            FittsError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.skip_training && self.training_selections == 0 {
            return Err(FittsError::Config(
                "training_selections must be at least 1".to_string(),
            ));
        }
        if !self.skip_testing && self.testing_selections == 0 {
            return Err(FittsError::Config(
                "testing_selections must be at least 1".to_string(),
            ));
        }
        if !(self.cooldown_secs.is_finite() && self.cooldown_secs >= 0.0) {
            return Err(FittsError::Config(format!(
                "cooldown_secs must be a non-negative number, got {}",
                self.cooldown_secs
            )));
        }
        if !(self.min_speed_threshold.is_finite() && self.min_speed_threshold >= 0.0) {
            return Err(FittsError::Config(format!(
                "min_speed_threshold must be a non-negative number, got {}",
                self.min_speed_threshold
            )));
        }

        for (name, value) in [("narrow", self.widths.narrow), ("wide", self.widths.wide)] {
            check_positive("width", name, value)?;
        }
        for (name, value) in [
            ("short", self.distances.short),
            ("medium", self.distances.medium),
            ("long", self.distances.long),
        ] {
            check_positive("distance", name, value)?;
        }
        check_positive("training", "width", self.training.width)?;
        check_positive("training", "distance", self.training.distance)?;
        check_positive("layout", "thickness", self.layout.thickness)?;

        // Targets must not overlap along the movement axis
        let min_gap = self.distances.short.min(self.training.distance);
        let max_width = self.widths.wide.max(self.widths.narrow);
        if min_gap <= max_width.max(self.training.width) {
            return Err(FittsError::InvalidTable {
                table: "distance",
                message: format!(
                    "shortest distance {} does not clear the widest target {}",
                    min_gap,
                    max_width.max(self.training.width)
                ),
            });
        }

        if !self.skip_training {
            self.training.growth_pattern()?;
        }
        for block in &self.blocks {
            block.growth_pattern()?;
        }
        Ok(())
    }
}

fn check_positive(table: &'static str, name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FittsError::InvalidTable {
            table,
            message: format!("{} must be positive, got {}", name, value),
        })
    }
}
