//! Kinematics and gait generation for the spider legs.
//!
//! - [`transform`]: DH link transforms and chain composition.
//! - [`conversion`]: forward/inverse kinematics between joint angles and foot positions.
//! - [`interpolator`]: speed-limited joint ramps and the actuator writes behind them.
//! - [`bezier`]: foot trajectories and their text export.
//! - [`gait_plan`]: slot tables for each gait.
//! - [`gait_engine`]: the tick scheduler running a plan on the legs.
//!
//! Used by the motion task on target and by the blocking gait runners on the host.
pub mod bezier;
pub mod conversion;
pub mod gait_engine;
pub mod gait_plan;
pub mod interpolator;
pub mod transform;
