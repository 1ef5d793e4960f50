//! Forward and inverse kinematics for one 3-DOF leg.
//!
//! Both directions work in the canonical leg frame and convert at the edge to
//! the body-aligned hip frame through the leg's [`LegMount`](crate::robot::leg::LegMount).
//!
//! Used by the gait engine on every trajectory sample.
use core::f32::consts::{FRAC_PI_2, PI};
use libm::{acosf, atan2f, fabsf, fmodf, hypotf};
use log::{debug, warn};

use crate::error::KinematicsError;
use crate::kinematics::transform::{compose_chain, Chain, LinkParameters, NUM_LINKS};
use crate::robot::config::LegGeometry;
use crate::robot::joint::{JointAngles, Position};
use crate::robot::leg::Leg;

pub fn degrees(rad: f32) -> f32 {
    rad * (180.0 / PI)
}

pub fn radians(deg: f32) -> f32 {
    deg * (PI / 180.0)
}

/// Folds any angle into [0, 180] degrees. Idempotent on that range.
pub fn normalize_angle(angle: f32) -> f32 {
    let mut angle = fmodf(angle, 360.0);
    if angle < 0.0 {
        angle += 360.0;
    }
    if angle > 180.0 {
        angle = 360.0 - angle;
    }
    angle
}

pub fn normalize_angles(angles: JointAngles) -> JointAngles {
    angles.map(normalize_angle)
}

/// DH parameters of the leg chain for the given servo angles (degrees).
///
/// The femur and tibia servos are mounted 90 degrees off the link frames, hence the
/// fixed offsets on joints 2 and 3.
pub fn leg_chain_parameters(
    geometry: &LegGeometry,
    angles: JointAngles,
) -> [LinkParameters; NUM_LINKS] {
    let theta1 = radians(angles.coxa());
    let theta2 = radians(angles.femur()) - FRAC_PI_2;
    let theta3 = -radians(angles.tibia()) + FRAC_PI_2;

    [
        LinkParameters::new(FRAC_PI_2, geometry.coxa, 0.0, theta1 + FRAC_PI_2),
        LinkParameters::new(0.0, geometry.femur, 0.0, theta2),
        LinkParameters::new(-FRAC_PI_2, geometry.tibia, 0.0, theta3 - FRAC_PI_2),
        LinkParameters::new(FRAC_PI_2, 0.0, 0.0, -FRAC_PI_2),
    ]
}

/// Every intermediate transform of the leg chain, in the leg frame.
pub fn forward_chain(geometry: &LegGeometry, angles: JointAngles) -> Chain {
    compose_chain(&leg_chain_parameters(geometry, angles))
}

/// Foot position in the leg frame. The chain reports x mirrored; the leg never
/// folds behind its mount, so x is taken as a magnitude.
pub fn foot_in_leg_frame(geometry: &LegGeometry, angles: JointAngles) -> Position {
    let p = forward_chain(geometry, angles).end_effector().translation();
    Position::new(fabsf(p.x), p.y, p.z)
}

/// Computes the foot position for `angles`, caches it on the leg and returns it
/// (body-aligned hip frame).
pub fn forward_kinematics(leg: &mut Leg, angles: JointAngles) -> Position {
    let foot = leg
        .mount()
        .to_body(foot_in_leg_frame(leg.geometry(), angles));
    debug!("[FK] {} {} -> {}", leg.mount(), angles, foot);
    leg.cache_foot(foot);
    foot
}

/// Recomputes the cached foot position from the leg's committed angles.
pub fn refresh_foot(leg: &mut Leg) -> Position {
    let angles = leg.angles();
    forward_kinematics(leg, angles)
}

/// Closed-form solution in the leg frame. Targets whose servo angles would fall
/// outside [0, 180] degrees are unreachable.
pub fn solve_leg_frame(
    geometry: &LegGeometry,
    target: Position,
) -> Result<JointAngles, KinematicsError> {
    let Position { x, y, z } = target;
    let unreachable = KinematicsError::UnreachableTarget { x, y, z };

    // coxa swing in the horizontal plane
    let theta1 = atan2f(x, y);

    // femur/tibia problem in the vertical plane of the leg
    let p = hypotf(x, y) - geometry.coxa;
    if !(p > 0.0) {
        return Err(unreachable);
    }
    let g = hypotf(z, p);
    let alpha = atan2f(z, p);

    let (femur, tibia) = (geometry.femur, geometry.tibia);
    let gamma_cos = (femur * femur + g * g - tibia * tibia) / (2.0 * femur * g);
    let beta_cos = (femur * femur + tibia * tibia - g * g) / (2.0 * femur * tibia);
    if !(-1.0..=1.0).contains(&gamma_cos) || !(-1.0..=1.0).contains(&beta_cos) {
        return Err(unreachable);
    }
    let gamma = acosf(gamma_cos);
    let beta = acosf(beta_cos);

    // femur elevation above the horizontal is alpha + gamma, signed
    let theta2 = FRAC_PI_2 + gamma + alpha;
    let theta3 = PI - beta;

    let angles = JointAngles::new(degrees(theta1), degrees(theta2), degrees(theta3));
    // folding an out-of-range servo angle would land on a different pose
    if !angles.0.iter().all(|a| (0.0..=180.0).contains(a)) {
        return Err(unreachable);
    }
    Ok(angles)
}

/// Joint angles (normalized) that put the leg's foot on `target` (body-aligned hip frame).
///
/// Never moves the leg; speed is the caller's business.
pub fn inverse_kinematics(leg: &Leg, target: Position) -> Result<JointAngles, KinematicsError> {
    let local = leg.mount().to_leg(target);
    match solve_leg_frame(leg.geometry(), local) {
        Ok(angles) => Ok(normalize_angles(angles)),
        Err(_) => {
            warn!("[IK] {} cannot reach {}", leg.mount(), target);
            Err(KinematicsError::UnreachableTarget {
                x: target.x,
                y: target.y,
                z: target.z,
            })
        }
    }
}
