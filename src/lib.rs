//! Library root for the spider gait controller.
//!
//! [`kinematics`] and [`robot`] build for any target and run on the host in tests.
//! [`tasks`] holds the embassy tasks of the ESP32 firmware (`firmware` feature).
#![cfg_attr(not(test), no_std)]

pub mod error;
pub mod kinematics;
pub mod robot;
#[cfg(feature = "firmware")]
pub mod tasks;

pub const LEG_COUNT: usize = 4;
pub const GAITCMD_CHANNEL_SIZE: usize = 4;
