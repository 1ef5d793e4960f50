//! Error taxonomy for the kinematics, motion and gait layers.
//!
//! Reachability and actuator errors are recovered per leg by the gait engine;
//! configuration and curve errors are meant to surface before any motion starts.
use thiserror::Error;

use crate::robot::leg::LegMount;

/// Failures of the inverse kinematics solver.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum KinematicsError {
    #[error("target ({x:.1}, {y:.1}, {z:.1}) is outside the leg workspace")]
    UnreachableTarget { x: f32, y: f32, z: f32 },
}

/// Failures of a curve (construction or evaluation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CurveError {
    #[error("curve has no control points")]
    Degenerate,
    #[error("curve already holds {0} control points")]
    Full(usize),
}

/// A PWM write that the driver layer refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActuatorError {
    #[error("no servo on channel {0}")]
    UnknownChannel(u8),
    #[error("pwm write failed on channel {0}")]
    Write(u8),
    #[error("invalid pwm frequency {0} Hz")]
    Frequency(u32),
}

/// Failures of the leg motion interpolator.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MotionError {
    #[error("joint speed must be non-zero")]
    ZeroSpeed,
    #[error("interpolation needs more than {0} steps")]
    StepLimit(u32),
    #[error(transparent)]
    Actuator(#[from] ActuatorError),
}

/// Setup-time configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("{segment} length must be positive and finite, got {value}")]
    Segment { segment: &'static str, value: f32 },
    #[error("samples per curve must be non-zero")]
    ZeroSamples,
    #[error("joint speed must be non-zero")]
    ZeroSpeed,
    #[error("stride length must be positive and finite, got {0}")]
    Stride(f32),
    #[error("swing height must be non-negative and finite, got {0}")]
    SwingHeight(f32),
    #[error("{0} must be non-zero")]
    ZeroDuration(&'static str),
    #[error("neutral foot position: {0}")]
    Neutral(#[from] KinematicsError),
}

/// Errors returned when a gait cannot be started.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GaitError {
    #[error("a gait is already running")]
    Busy,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{leg}: {source}")]
    Curve { leg: LegMount, source: CurveError },
}
