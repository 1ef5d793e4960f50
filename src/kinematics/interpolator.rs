//! Leg motion interpolator.
//!
//! An [`AngleRamp`] walks the three joints of a leg from their current angles to a
//! target, moving each joint by at most a fixed increment per step. The gait engine
//! advances a ramp one step per tick; [`move_to_angles`] runs one to completion.
use fugit::HertzU32;
use log::{debug, warn};
use micromath::F32Ext;

use crate::error::MotionError;
use crate::kinematics::conversion::{normalize_angles, refresh_foot};
use crate::robot::config::{MAX_JOINT_STEP_DEG, MAX_RAMP_STEPS};
use crate::robot::joint::JointAngles;
use crate::robot::leg::Leg;
use crate::robot::servo::{write_leg, Actuator};

/// Largest per-step joint change for a speed setting (per-mille of [`MAX_JOINT_STEP_DEG`]).
pub fn joint_increment(speed: u16) -> f32 {
    MAX_JOINT_STEP_DEG * speed as f32 / 1000.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct AngleRamp {
    start: JointAngles,
    current: JointAngles,
    target: JointAngles,
    directions: [f32; 3],
    increment: f32,
    steps: u32,
    limit: u32,
}

impl AngleRamp {
    pub fn new(current: JointAngles, target: JointAngles, speed: u16) -> Result<Self, MotionError> {
        if speed == 0 {
            return Err(MotionError::ZeroSpeed);
        }
        let increment = joint_increment(speed);

        let mut directions = [0.0; 3];
        let mut widest: f32 = 0.0;
        for (i, direction) in directions.iter_mut().enumerate() {
            *direction = if target.0[i] > current.0[i] { 1.0 } else { -1.0 };
            widest = widest.max((target.0[i] - current.0[i]).abs());
        }

        let needed = (widest / increment).ceil();
        if !needed.is_finite() || needed > MAX_RAMP_STEPS as f32 {
            warn!("[MOTION] ramp {current} -> {target} needs {needed} steps");
            return Err(MotionError::StepLimit(MAX_RAMP_STEPS));
        }

        Ok(Self {
            start: current,
            current,
            target,
            directions,
            increment,
            steps: 0,
            limit: needed as u32 + 1,
        })
    }

    pub fn current(&self) -> JointAngles {
        self.current
    }

    pub fn target(&self) -> JointAngles {
        self.target
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn is_done(&self) -> bool {
        self.current.approx_eq(&self.target)
    }

    /// Next angle triple, without committing it. `None` once the target is reached.
    pub fn peek(&self) -> Result<Option<JointAngles>, MotionError> {
        if self.is_done() {
            return Ok(None);
        }
        if self.steps >= self.limit {
            return Err(MotionError::StepLimit(self.limit));
        }

        // offsets from the start, so rounding does not accumulate over long ramps
        let travel = self.increment * (self.steps + 1) as f32;
        let mut next = self.current;
        for i in 0..3 {
            let direction = self.directions[i];
            let mut angle = self.start.0[i] + travel * direction;
            // never overshoot the target
            if (direction > 0.0 && angle > self.target.0[i])
                || (direction < 0.0 && angle < self.target.0[i])
            {
                angle = self.target.0[i];
            }
            next.0[i] = angle;
        }
        Ok(Some(next))
    }

    fn commit(&mut self, angles: JointAngles) {
        self.current = angles;
        self.steps += 1;
    }
}

impl Iterator for AngleRamp {
    type Item = JointAngles;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.peek().ok().flatten()?;
        self.commit(next);
        Some(next)
    }
}

/// Writes the next ramp step to the actuators and commits it to the leg once all
/// three writes went through. Returns `true` when the ramp has reached its target.
pub fn advance<A: Actuator + ?Sized>(
    leg: &mut Leg,
    ramp: &mut AngleRamp,
    actuator: &mut A,
    frequency: HertzU32,
) -> Result<bool, MotionError> {
    let Some(next) = ramp.peek()? else {
        return Ok(true);
    };
    write_leg(actuator, leg.mount(), next, frequency)?;
    ramp.commit(next);
    leg.commit_angles(next);
    Ok(ramp.is_done())
}

/// Drives `leg` to `target` one increment per step, then refreshes its foot position.
///
/// Returns the number of steps taken.
pub fn move_to_angles<A: Actuator + ?Sized>(
    leg: &mut Leg,
    target: JointAngles,
    speed: u16,
    actuator: &mut A,
    frequency: HertzU32,
) -> Result<u32, MotionError> {
    let mut ramp = AngleRamp::new(leg.angles(), normalize_angles(target), speed)?;
    while !advance(leg, &mut ramp, actuator, frequency)? {}
    refresh_foot(leg);
    debug!("[MOTION] {} reached {} in {} steps", leg.mount(), leg.angles(), ramp.steps());
    Ok(ramp.steps())
}
