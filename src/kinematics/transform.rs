//! Denavit-Hartenberg link transforms and chain composition.
//!
//! Matrices are plain `[[f32; 4]; 4]` arrays (row-major) so the chain can be
//! evaluated without an allocator or a linear-algebra crate.
use libm::{cosf, sinf};

use crate::robot::joint::Position;

/// Links in a leg chain: coxa, femur, tibia and a zero-length terminal link.
pub const NUM_LINKS: usize = 4;

/// DH constants of one link. Angles in radians, lengths in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinkParameters {
    /// Link twist (alpha)
    pub twist: f32,
    /// Link length (a)
    pub length: f32,
    /// Link offset (d)
    pub offset: f32,
    /// Joint angle (theta)
    pub angle: f32,
}

impl LinkParameters {
    pub const fn new(twist: f32, length: f32, offset: f32, angle: f32) -> Self {
        Self {
            twist,
            length,
            offset,
            angle,
        }
    }
}

/// A 4x4 homogeneous transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform(pub [[f32; 4]; 4]);

impl Transform {
    pub const IDENTITY: Transform = Transform([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.0[row][col]
    }

    /// Translation column.
    pub fn translation(&self) -> Position {
        Position::new(self.0[0][3], self.0[1][3], self.0[2][3])
    }

    /// `self * other`
    pub fn mul(&self, other: &Transform) -> Transform {
        let mut result = [[0.0; 4]; 4];
        for (row, out) in result.iter_mut().enumerate() {
            for (col, cell) in out.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.0[row][k] * other.0[k][col]).sum();
            }
        }
        Transform(result)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Standard DH link transform: `Rot_z(theta) * Trans_z(d) * Trans_x(a) * Rot_x(alpha)`.
pub fn build_transform(params: &LinkParameters) -> Transform {
    let (st, ct) = (sinf(params.angle), cosf(params.angle));
    let (sa, ca) = (sinf(params.twist), cosf(params.twist));

    Transform([
        [ct, -st * ca, st * sa, params.length * ct],
        [st, ct * ca, -ct * sa, params.length * st],
        [0.0, sa, ca, params.offset],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Cumulative transforms of a chain: `links[i]` maps link `i`'s frame to the base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chain {
    pub links: [Transform; NUM_LINKS],
}

impl Chain {
    /// Base-to-end-effector transform.
    pub fn end_effector(&self) -> &Transform {
        &self.links[NUM_LINKS - 1]
    }

    /// Origin of the base frame followed by the origin of every link frame.
    pub fn joint_positions(&self) -> [Position; NUM_LINKS + 1] {
        let mut positions = [Position::default(); NUM_LINKS + 1];
        for (slot, link) in positions[1..].iter_mut().zip(self.links.iter()) {
            *slot = link.translation();
        }
        positions
    }
}

/// Left-multiplies an identity accumulator by each link, recording every step.
pub fn compose_chain(params: &[LinkParameters; NUM_LINKS]) -> Chain {
    let mut links = [Transform::IDENTITY; NUM_LINKS];
    let mut acc = Transform::IDENTITY;
    for (out, link) in links.iter_mut().zip(params.iter()) {
        acc = acc.mul(&build_transform(link));
        *out = acc;
    }
    Chain { links }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::FRAC_PI_2;

    fn assert_close(a: &Transform, b: &Transform) {
        for row in 0..4 {
            for col in 0..4 {
                assert!(
                    (a.at(row, col) - b.at(row, col)).abs() < 1e-5,
                    "({row},{col}): {} vs {}",
                    a.at(row, col),
                    b.at(row, col)
                );
            }
        }
    }

    #[test]
    fn zero_link_is_identity() {
        let t = build_transform(&LinkParameters::default());
        assert_close(&t, &Transform::IDENTITY);
    }

    #[test]
    fn rotation_then_length() {
        // theta = 90deg swings a 10mm link onto +y
        let t = build_transform(&LinkParameters::new(0.0, 10.0, 2.0, FRAC_PI_2));
        let p = t.translation();
        assert!(p.x.abs() < 1e-5);
        assert!((p.y - 10.0).abs() < 1e-5);
        assert!((p.z - 2.0).abs() < 1e-5);
    }

    #[test]
    fn twist_fills_rotation_block() {
        let t = build_transform(&LinkParameters::new(FRAC_PI_2, 0.0, 0.0, 0.0));
        let expected = Transform([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, -1.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        assert_close(&t, &expected);
    }

    #[test]
    fn chain_records_intermediate_transforms() {
        let params = [
            LinkParameters::new(0.0, 10.0, 0.0, 0.0),
            LinkParameters::new(0.0, 20.0, 0.0, FRAC_PI_2),
            LinkParameters::new(0.0, 5.0, 0.0, 0.0),
            LinkParameters::default(),
        ];
        let chain = compose_chain(&params);
        let joints = chain.joint_positions();

        assert_eq!(joints[0], Position::default());
        assert!((joints[1].x - 10.0).abs() < 1e-4);
        assert!((joints[2].x - 10.0).abs() < 1e-4 && (joints[2].y - 20.0).abs() < 1e-4);
        assert!((joints[3].y - 25.0).abs() < 1e-4);
        assert_close(chain.end_effector(), &chain.links[2]);
    }
}
