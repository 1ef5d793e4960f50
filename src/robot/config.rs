//! Physical and movement constants for the robot.
//!
//! Compile-time defaults live in the `const`s below; [`RobotConfig`] bundles them
//! into a runtime value that can be tweaked and must pass [`RobotConfig::validate`]
//! before any motion starts.
use embassy_time::Duration;
use fugit::HertzU32;

use crate::error::ConfigError;
use crate::robot::joint::Position;
use crate::robot::leg::LegMount;
use crate::LEG_COUNT;

// LEG SIZE (mm)
pub const COXA_LENGTH: f32 = 40.0;
pub const FEMUR_LENGTH: f32 = 60.0;
pub const TIBIA_LENGTH: f32 = 90.0;

/// Neutral foot position in the leg frame, shared by every mount
pub const X_DEFAULT: f32 = 70.0;
pub const Y_DEFAULT: f32 = -70.0;
pub const Z_DEFAULT: f32 = -70.0;

///CONST FOR MOVEMENT
pub const STRIDE_LENGTH: f32 = 40.0;
pub const SWING_HEIGHT: f32 = 15.0;
pub const SAMPLES_PER_CURVE: u16 = 10;
pub const CURVE_DURATION_MS: u64 = 500;
pub const TICK_PERIOD_MS: u64 = 20;
/// Per-mille of [`MAX_JOINT_STEP_DEG`] a joint moves each tick
pub const JOINT_SPEED: u16 = 100;
pub const STAND_SPEED: u16 = 50;
pub const MAX_JOINT_STEP_DEG: f32 = 10.0;
pub const MAX_RAMP_STEPS: u32 = 20_000;
pub const PWM_FREQUENCY_HZ: u32 = 50;

/// Segment lengths of one leg, nearest to farthest from the body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegGeometry {
    pub coxa: f32,
    pub femur: f32,
    pub tibia: f32,
}

impl LegGeometry {
    pub fn new(coxa: f32, femur: f32, tibia: f32) -> Result<Self, ConfigError> {
        let geometry = Self { coxa, femur, tibia };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (segment, value) in [
            ("coxa", self.coxa),
            ("femur", self.femur),
            ("tibia", self.tibia),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Segment { segment, value });
            }
        }
        Ok(())
    }
}

impl Default for LegGeometry {
    fn default() -> Self {
        Self {
            coxa: COXA_LENGTH,
            femur: FEMUR_LENGTH,
            tibia: TIBIA_LENGTH,
        }
    }
}

/// Shape and pacing of the swing/stance curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaitParams {
    pub stride_length: f32,
    pub swing_height: f32,
    pub samples_per_curve: u16,
    /// Time budget for traversing one full curve
    pub curve_duration: Duration,
    /// Per-mille of [`MAX_JOINT_STEP_DEG`] moved per tick
    pub speed: u16,
    pub pwm_frequency: HertzU32,
}

impl GaitParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.stride_length.is_finite() || self.stride_length <= 0.0 {
            return Err(ConfigError::Stride(self.stride_length));
        }
        if !self.swing_height.is_finite() || self.swing_height < 0.0 {
            return Err(ConfigError::SwingHeight(self.swing_height));
        }
        if self.samples_per_curve == 0 {
            return Err(ConfigError::ZeroSamples);
        }
        if self.speed == 0 {
            return Err(ConfigError::ZeroSpeed);
        }
        if self.curve_duration.as_ticks() == 0 {
            return Err(ConfigError::ZeroDuration("curve duration"));
        }
        if self.pwm_frequency.raw() == 0 {
            return Err(ConfigError::ZeroDuration("pwm frequency"));
        }
        Ok(())
    }

    pub fn with_stride(mut self, stride_length: f32, swing_height: f32) -> Self {
        self.stride_length = stride_length;
        self.swing_height = swing_height;
        self
    }

    pub fn with_samples(mut self, samples_per_curve: u16) -> Self {
        self.samples_per_curve = samples_per_curve;
        self
    }
}

impl Default for GaitParams {
    fn default() -> Self {
        Self {
            stride_length: STRIDE_LENGTH,
            swing_height: SWING_HEIGHT,
            samples_per_curve: SAMPLES_PER_CURVE,
            curve_duration: Duration::from_millis(CURVE_DURATION_MS),
            speed: JOINT_SPEED,
            pwm_frequency: HertzU32::from_raw(PWM_FREQUENCY_HZ),
        }
    }
}

/// Everything needed to build a [`crate::robot::leg::Robot`] and run gaits on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotConfig {
    pub geometry: LegGeometry,
    pub mounts: [LegMount; LEG_COUNT],
    /// Neutral foot position in the leg frame
    pub neutral: Position,
    pub gait: GaitParams,
    pub stand_speed: u16,
    pub tick_period: Duration,
}

impl RobotConfig {
    pub fn new() -> Self {
        Self {
            geometry: LegGeometry::default(),
            mounts: LegMount::ALL,
            neutral: Position::new(X_DEFAULT, Y_DEFAULT, Z_DEFAULT),
            gait: GaitParams::default(),
            stand_speed: STAND_SPEED,
            tick_period: Duration::from_millis(TICK_PERIOD_MS),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geometry.validate()?;
        self.gait.validate()?;
        if self.stand_speed == 0 {
            return Err(ConfigError::ZeroSpeed);
        }
        if self.tick_period.as_ticks() == 0 {
            return Err(ConfigError::ZeroDuration("tick period"));
        }
        Ok(())
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self::new()
    }
}
