//! Core robot types and configuration.
//!
//! - [`commands`]: gait commands sent to the motion task.
//! - [`config`]: physical and movement constants, and the runtime [`config::RobotConfig`].
//! - [`leg`]: leg mounts, their axis remapping, and the [`leg::Robot`] owning the legs.
//! - [`joint`]: joint identifiers, angle triples and foot positions.
//! - [`servo`]: the actuator boundary and the PWM servo bank.
pub mod commands;
pub mod config;
pub mod joint;
pub mod leg;
pub mod servo;
