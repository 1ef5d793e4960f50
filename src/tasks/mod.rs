//! Embassy tasks of the ESP32 firmware.
//!
//! - [`servo_bank`]: LEDC timer/channel setup producing the [`servo_bank::LedcServoBank`].
//! - [`motion_task`]: owns the legs and the gait engine, ticks them and takes
//!   [`GaitCommand`](crate::robot::commands::GaitCommand)s from a channel.
//!
//! Tasks are spawned from `main.rs`.

/// Moves a value into a `StaticCell` and hands back the `&'static mut`.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        STATIC_CELL.init_with(|| $val)
    }};
}

pub mod motion_task;
pub mod servo_bank;
