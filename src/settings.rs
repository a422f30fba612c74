// Copyright (c) 2026 rezky_nightky

use std::time::Duration;

use thiserror::Error;

use crate::geometry::{Domain, Point};
use crate::phase::PhaseSchedule;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("cloud point count must be at least 1")]
    EmptyCloud,
    #[error("{0} phase must last at least one frame")]
    EmptyPhase(&'static str),
    #[error("domain bounds are malformed (x {x_min}..{x_max}, y {y_min}..{y_max})")]
    MalformedDomain {
        x_min: f32,
        x_max: f32,
        y_min: f32,
        y_max: f32,
    },
    #[error("leader origin ({x}, {y}) must lie inside the domain, above the floor")]
    OriginOutsideDomain { x: f32, y: f32 },
    #[error("invalid {name} distribution: {reason}")]
    Distribution { name: &'static str, reason: String },
    #[error("speed range {min}..={max} is invalid (min must be >= 1 and <= max)")]
    SpeedRange { min: u32, max: u32 },
    #[error("minimum frame delay must be greater than zero")]
    ZeroDelayFloor,
}

/// Generation and animation profile.
///
/// `Classic` is the plain zigzag animation with a single cloud cluster.
/// `Storm` adds the cumulonimbus silhouette, charge pulse, tapered leader
/// with kinks, staggered branches and secondary strokes.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    #[value(name = "classic")]
    Classic,
    #[value(name = "storm")]
    Storm,
}

impl Style {
    pub fn default_cloud_count(self) -> usize {
        match self {
            Style::Classic => 100,
            Style::Storm => 160,
        }
    }

    pub fn default_stroke_count(self) -> usize {
        match self {
            Style::Classic => 0,
            Style::Storm => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Style::Classic => "classic",
            Style::Storm => "storm",
        }
    }
}

/// Maps the user-facing speed value to the delay between frame advances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedControl {
    pub min: u32,
    pub max: u32,
    pub base_delay: Duration,
    pub min_delay: Duration,
}

impl Default for SpeedControl {
    fn default() -> Self {
        Self {
            min: 1,
            max: 20,
            base_delay: Duration::from_millis(200),
            min_delay: Duration::from_millis(10),
        }
    }
}

impl SpeedControl {
    pub fn clamp(&self, value: u32) -> u32 {
        value.clamp(self.min, self.max)
    }

    /// Higher speed means a shorter delay, never below `min_delay`.
    pub fn delay_for(&self, value: u32) -> Duration {
        let v = self.clamp(value).max(1);
        (self.base_delay / v).max(self.min_delay)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min == 0 || self.min > self.max {
            return Err(ConfigError::SpeedRange {
                min: self.min,
                max: self.max,
            });
        }
        if self.min_delay.is_zero() {
            return Err(ConfigError::ZeroDelayFloor);
        }
        Ok(())
    }
}

/// Everything needed to build a [`crate::scheduler::Simulation`].
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    pub style: Style,
    pub domain: Domain,
    pub origin: Point,
    pub cloud_count: usize,
    pub branch_count: usize,
    pub stroke_count: usize,
    pub schedule: PhaseSchedule,
    pub speed: SpeedControl,
    pub initial_speed: u32,
    pub seed: u64,
    pub start_paused: bool,
}

pub const DEFAULT_BRANCH_COUNT: usize = 5;
pub const DEFAULT_PHASE_FRAMES: u32 = 60;
pub const DEFAULT_SPEED: u32 = 10;

impl SimConfig {
    pub fn new(style: Style, seed: u64) -> Self {
        let domain = Domain::default();
        Self {
            style,
            domain,
            origin: domain.at(0.5, 0.8),
            cloud_count: style.default_cloud_count(),
            branch_count: DEFAULT_BRANCH_COUNT,
            stroke_count: style.default_stroke_count(),
            schedule: PhaseSchedule::uniform(DEFAULT_PHASE_FRAMES),
            speed: SpeedControl::default(),
            initial_speed: DEFAULT_SPEED,
            seed,
            start_paused: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cloud_count == 0 {
            return Err(ConfigError::EmptyCloud);
        }
        if !self.domain.is_well_formed() {
            return Err(ConfigError::MalformedDomain {
                x_min: self.domain.x_min,
                x_max: self.domain.x_max,
                y_min: self.domain.y_min,
                y_max: self.domain.y_max,
            });
        }
        if !self.domain.contains(self.origin) || self.origin.y <= self.domain.floor() {
            return Err(ConfigError::OriginOutsideDomain {
                x: self.origin.x,
                y: self.origin.y,
            });
        }
        self.schedule.validate()?;
        self.speed.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_for_both_styles() {
        assert_eq!(SimConfig::new(Style::Classic, 1).validate(), Ok(()));
        assert_eq!(SimConfig::new(Style::Storm, 1).validate(), Ok(()));
    }

    #[test]
    fn zero_clouds_fail_fast() {
        let mut cfg = SimConfig::new(Style::Storm, 1);
        cfg.cloud_count = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyCloud));
    }

    #[test]
    fn origin_on_the_floor_is_rejected() {
        let mut cfg = SimConfig::new(Style::Classic, 1);
        cfg.origin = Point::new(5.0, 0.0);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OriginOutsideDomain { .. })
        ));
    }

    #[test]
    fn inverted_speed_range_is_rejected() {
        let mut cfg = SimConfig::new(Style::Classic, 1);
        cfg.speed.min = 9;
        cfg.speed.max = 3;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::SpeedRange { min: 9, max: 3 })
        );
    }

    #[test]
    fn malformed_domain_fails_validation() {
        let mut cfg = SimConfig::new(Style::Storm, 1);
        cfg.domain = Domain {
            x_min: 0.0,
            x_max: 0.0,
            y_min: 0.0,
            y_max: 10.0,
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MalformedDomain { .. })
        ));
    }

    #[test]
    fn zero_delay_floor_is_rejected() {
        let mut cfg = SimConfig::new(Style::Classic, 1);
        cfg.speed.min_delay = Duration::ZERO;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroDelayFloor));
    }

    #[test]
    fn max_speed_hits_the_delay_floor() {
        let s = SpeedControl::default();
        assert_eq!(s.delay_for(s.max), s.min_delay);
        assert_eq!(s.delay_for(u32::MAX), s.min_delay);
        assert_eq!(s.delay_for(10), Duration::from_millis(20));
        assert!(s.delay_for(1) > s.delay_for(2));
    }

    #[test]
    fn delay_never_drops_below_floor() {
        let s = SpeedControl {
            min_delay: Duration::from_millis(50),
            ..SpeedControl::default()
        };
        for v in s.min..=s.max {
            assert!(s.delay_for(v) >= s.min_delay);
        }
    }
}
