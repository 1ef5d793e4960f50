//! Leg identity, per-mount axis remapping, and per-leg state.
//!
//! Every leg shares one kinematic solver expressed in a canonical leg frame.
//! [`LegMount`] selects an entry of [`AXIS_MAP`] that converts between that
//! frame and the body-aligned hip frame (x forward, y left, z up).
use core::fmt::Display;
use core::ops::Index;

use crate::error::ConfigError;
use crate::kinematics::conversion::{normalize_angles, refresh_foot, solve_leg_frame};
use crate::robot::config::{LegGeometry, RobotConfig};
use crate::robot::joint::{JointAngles, Position};
use crate::LEG_COUNT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegMount {
    FrontLeft = 0,
    BackLeft = 1,
    FrontRight = 2,
    BackRight = 3,
}

impl LegMount {
    pub const ALL: [LegMount; LEG_COUNT] = [
        LegMount::FrontLeft,
        LegMount::BackLeft,
        LegMount::FrontRight,
        LegMount::BackRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Body-aligned hip frame -> canonical leg frame.
    pub fn to_leg(self, p: Position) -> Position {
        let map = &AXIS_MAP[self as usize];
        let (a, b) = if map.swap { (p.y, p.x) } else { (p.x, p.y) };
        Position::new(map.sign_x * a, map.sign_y * b, p.z)
    }

    /// Canonical leg frame -> body-aligned hip frame.
    pub fn to_body(self, p: Position) -> Position {
        let map = &AXIS_MAP[self as usize];
        let (u, v) = (map.sign_x * p.x, map.sign_y * p.y);
        if map.swap {
            Position::new(v, u, p.z)
        } else {
            Position::new(u, v, p.z)
        }
    }
}

impl Display for LegMount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LegMount::FrontLeft => f.write_str("Front left"),
            LegMount::FrontRight => f.write_str("Front right"),
            LegMount::BackLeft => f.write_str("Back left"),
            LegMount::BackRight => f.write_str("Back right"),
        }
    }
}

impl TryFrom<usize> for LegMount {
    type Error = usize;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        LegMount::ALL.get(value).copied().ok_or(value)
    }
}

/// Axis permutation and signs taking body (x, y) to leg (x, y).
#[derive(Debug, Clone, Copy)]
pub struct AxisMap {
    pub swap: bool,
    pub sign_x: f32,
    pub sign_y: f32,
}

/// Indexed by [`LegMount`]: leg = (sign_x * a, sign_y * b) with (a, b) = (y, x) when swapped.
pub static AXIS_MAP: [AxisMap; LEG_COUNT] = [
    // front left: (y, -x)
    AxisMap {
        swap: true,
        sign_x: 1.0,
        sign_y: -1.0,
    },
    // back left: (-x, -y)
    AxisMap {
        swap: false,
        sign_x: -1.0,
        sign_y: -1.0,
    },
    // front right: identity
    AxisMap {
        swap: false,
        sign_x: 1.0,
        sign_y: 1.0,
    },
    // back right: (-y, x)
    AxisMap {
        swap: true,
        sign_x: -1.0,
        sign_y: 1.0,
    },
];

/// One leg: its identity, last commanded joint angles and cached foot position.
///
/// Angles change only through the motion interpolator; the foot position only
/// through forward kinematics once a motion step has completed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leg {
    mount: LegMount,
    geometry: LegGeometry,
    angles: JointAngles,
    foot: Position,
}

impl Leg {
    pub fn new(mount: LegMount, geometry: LegGeometry, angles: JointAngles) -> Self {
        let mut leg = Self {
            mount,
            geometry,
            angles: normalize_angles(angles),
            foot: Position::default(),
        };
        refresh_foot(&mut leg);
        leg
    }

    pub fn mount(&self) -> LegMount {
        self.mount
    }

    pub fn geometry(&self) -> &LegGeometry {
        &self.geometry
    }

    pub fn angles(&self) -> JointAngles {
        self.angles
    }

    /// Foot position in the body-aligned hip frame.
    pub fn foot(&self) -> Position {
        self.foot
    }

    pub(crate) fn commit_angles(&mut self, angles: JointAngles) {
        self.angles = angles;
    }

    pub(crate) fn cache_foot(&mut self, foot: Position) {
        self.foot = foot;
    }
}

/// The robot body: owner of the leg array and of the configuration it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Robot {
    config: RobotConfig,
    legs: [Leg; LEG_COUNT],
}

impl Robot {
    /// Builds every leg resting at the neutral foot position (no actuator writes).
    pub fn new(config: &RobotConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let angles = normalize_angles(solve_leg_frame(&config.geometry, config.neutral)?);
        let legs = config
            .mounts
            .map(|mount| Leg::new(mount, config.geometry, angles));
        Ok(Self {
            config: *config,
            legs,
        })
    }

    /// Legs in an arbitrary pose, driven with `config`.
    pub fn from_legs(config: &RobotConfig, legs: [Leg; LEG_COUNT]) -> Self {
        Self {
            config: *config,
            legs,
        }
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn legs(&self) -> &[Leg; LEG_COUNT] {
        &self.legs
    }

    pub(crate) fn legs_mut(&mut self) -> &mut [Leg; LEG_COUNT] {
        &mut self.legs
    }
}

impl Index<usize> for Robot {
    type Output = Leg;

    fn index(&self, index: usize) -> &Self::Output {
        &self.legs[index]
    }
}
