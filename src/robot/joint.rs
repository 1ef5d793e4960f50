//! Joint enumeration, joint-angle triples and foot positions.
//!
//! Defines the [`Joint`] enum for identifying each joint (coxa, femur, tibia),
//! the [`JointAngles`] triple indexed by it, and the Cartesian [`Position`] of a foot.
use core::fmt::Display;
use core::ops::{Index, IndexMut};
use micromath::F32Ext;

/// Tolerance under which two joint angles are considered equal, in degrees.
pub const ANGLE_TOLERANCE_DEG: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joint {
    Coxa = 0,
    Femur = 1,
    Tibia = 2,
}

impl Joint {
    pub const ALL: [Joint; 3] = [Joint::Coxa, Joint::Femur, Joint::Tibia];
}

impl Display for Joint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Joint::Coxa => f.write_str("coxa"),
            Joint::Femur => f.write_str("femur"),
            Joint::Tibia => f.write_str("tibia"),
        }
    }
}

impl TryFrom<usize> for Joint {
    type Error = usize;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Joint::ALL.get(value).copied().ok_or(value)
    }
}

/// Joint angles of one leg in degrees, ordered `[coxa, femur, tibia]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointAngles(pub [f32; 3]);

impl JointAngles {
    pub const fn new(coxa: f32, femur: f32, tibia: f32) -> Self {
        Self([coxa, femur, tibia])
    }

    pub fn coxa(&self) -> f32 {
        self.0[Joint::Coxa as usize]
    }

    pub fn femur(&self) -> f32 {
        self.0[Joint::Femur as usize]
    }

    pub fn tibia(&self) -> f32 {
        self.0[Joint::Tibia as usize]
    }

    /// True when every joint is within [`ANGLE_TOLERANCE_DEG`] of `other`.
    pub fn approx_eq(&self, other: &JointAngles) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| (a - b).abs() <= ANGLE_TOLERANCE_DEG)
    }

    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self(self.0.map(f))
    }
}

impl Index<Joint> for JointAngles {
    type Output = f32;

    fn index(&self, joint: Joint) -> &Self::Output {
        &self.0[joint as usize]
    }
}

impl IndexMut<Joint> for JointAngles {
    fn index_mut(&mut self, joint: Joint) -> &mut Self::Output {
        &mut self.0[joint as usize]
    }
}

impl Display for JointAngles {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[coxa {:.2}, femur {:.2}, tibia {:.2}]",
            self.coxa(),
            self.femur(),
            self.tibia()
        )
    }
}

/// Foot position in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        libm::sqrtf(
            (self.x - other.x) * (self.x - other.x)
                + (self.y - other.y) * (self.y - other.y)
                + (self.z - other.z) * (self.z - other.z),
        )
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angles_index_by_joint() {
        let mut angles = JointAngles::new(10.0, 20.0, 30.0);
        angles[Joint::Tibia] = 35.0;
        assert_eq!(angles[Joint::Femur], 20.0);
        assert_eq!(angles.tibia(), 35.0);
        assert_eq!(Joint::try_from(1), Ok(Joint::Femur));
        assert_eq!(Joint::try_from(3), Err(3));
    }

    #[test]
    fn approx_eq_uses_tolerance() {
        let a = JointAngles::new(90.0, 45.0, 10.0);
        assert!(a.approx_eq(&JointAngles::new(90.005, 45.0, 9.995)));
        assert!(!a.approx_eq(&JointAngles::new(90.02, 45.0, 10.0)));
    }
}
