//! Motion task: owns the [`Robot`], the [`GaitEngine`] and the servo bank.
//!
//! Waits for a command while idle. While a gait runs it ticks the engine on a fixed
//! period and drains the command channel between ticks, so a stop always lands on
//! a tick boundary.
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Receiver};
use embassy_time::{Instant, Ticker};
use log::{error, info, warn};

use crate::kinematics::gait_engine::{GaitEngine, TickStatus};
use crate::robot::commands::GaitCommand;
use crate::robot::config::RobotConfig;
use crate::robot::leg::Robot;
use crate::robot::servo::Actuator;
use crate::tasks::servo_bank::LedcServoBank;
use crate::GAITCMD_CHANNEL_SIZE;

pub type GaitCommandReceiver =
    Receiver<'static, CriticalSectionRawMutex, GaitCommand, GAITCMD_CHANNEL_SIZE>;

#[embassy_executor::task]
pub async fn motion_task(mut servos: LedcServoBank, commands: GaitCommandReceiver) {
    let config = RobotConfig::new();
    let mut robot = match Robot::new(&config) {
        Ok(robot) => robot,
        Err(e) => {
            error!("[MOTION_TASK] invalid robot config: {e}");
            return;
        }
    };
    let mut engine = GaitEngine::new(&config);
    if let Err(e) = servos.init() {
        error!("[MOTION_TASK] servo init failed: {e}");
    }
    info!("[MOTION_TASK] ready, feet at {}", robot[0].foot());

    let mut ticker = Ticker::every(config.tick_period);
    loop {
        if !engine.is_running() {
            let cmd = commands.receive().await;
            handle_command(cmd, &mut engine, &mut robot);
            ticker.reset();
        }
        while let Ok(cmd) = commands.try_receive() {
            handle_command(cmd, &mut engine, &mut robot);
        }

        match engine.tick(&mut robot, &mut servos, Instant::now()) {
            TickStatus::Finished | TickStatus::Stopped => {
                let report = engine.take_report();
                info!(
                    "[MOTION_TASK] gait done: {} ticks, {} slots, {} faults, stopped: {}",
                    report.ticks,
                    report.slots,
                    report.faults.len() as u32 + report.dropped_faults,
                    report.stopped
                );
            }
            TickStatus::Running | TickStatus::Idle => {}
        }
        ticker.next().await;
    }
}

fn handle_command(cmd: GaitCommand, engine: &mut GaitEngine, robot: &mut Robot) {
    let stamp = "[MOTION_TASK] received";
    info!("{stamp} {cmd:?}");
    match cmd.gait() {
        None => engine.request_stop(),
        Some((kind, cycles)) => {
            if let Err(e) = engine.start(robot, kind, cycles, Instant::now()) {
                warn!("{stamp} {cmd:?} rejected: {e}");
            }
        }
    }
}
