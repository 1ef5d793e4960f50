#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use embassy_executor::Spawner;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_time::Timer;
use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{AnyPin, Pin};
use esp_hal::timer::timg::TimerGroup;
use log::{error, info};
use spider_gait::robot::commands::{parse_script, GaitCommand};
use spider_gait::robot::config::PWM_FREQUENCY_HZ;
use spider_gait::robot::servo::SERVO_COUNT;
use spider_gait::tasks::motion_task::motion_task;
use spider_gait::tasks::servo_bank::setup_servo_bank;
use spider_gait::GAITCMD_CHANNEL_SIZE;

esp_bootloader_esp_idf::esp_app_desc!();

//LEGS: [coxa, femur, tibia]
//FRONT_L: [32, 33, 25]
//BACK_L: [26, 27, 14]
//FRONT_R: [12, 13, 19]
//BACK_R: [18, 5, 17]

static GAIT_COMMANDS: Channel<CriticalSectionRawMutex, GaitCommand, GAITCMD_CHANNEL_SIZE> =
    Channel::new();

/// Pause between two patrol runs
const PATROL_PERIOD_SECS: u64 = 20;

/// Sent once after the motion task starts
const BOOT_SCRIPT: &str = "# stand up\ns\n";

/// Sent every `PATROL_PERIOD_SECS`
const PATROL_SCRIPT: &str = "c 2\n";

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger_from_env();
    if let Err(e) = run(spawner).await {
        error!("Startup failed: {e}");
    }
}

async fn run(spawner: Spawner) -> anyhow::Result<()> {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let p = esp_hal::init(config);

    let timer0 = TimerGroup::new(p.TIMG1);
    esp_hal_embassy::init(timer0.timer0);
    info!("Embassy initialized");

    let servo_pins: [AnyPin<'static>; SERVO_COUNT] = [
        p.GPIO32.degrade(),
        p.GPIO33.degrade(),
        p.GPIO25.degrade(),
        p.GPIO26.degrade(),
        p.GPIO27.degrade(),
        p.GPIO14.degrade(),
        p.GPIO12.degrade(),
        p.GPIO13.degrade(),
        p.GPIO19.degrade(),
        p.GPIO18.degrade(),
        p.GPIO5.degrade(),
        p.GPIO17.degrade(),
    ];
    let servos = setup_servo_bank(p.LEDC, servo_pins, PWM_FREQUENCY_HZ)?;

    info!("Starting spider gait controller...");
    spawner
        .spawn(motion_task(servos, GAIT_COMMANDS.receiver()))
        .map_err(|e| anyhow::anyhow!("spawning motion task: {:?}", e))?;

    // no remote control link: the scripts stand in for one
    let sender = GAIT_COMMANDS.sender();
    for cmd in parse_script(BOOT_SCRIPT) {
        sender.send(cmd).await;
    }
    loop {
        Timer::after_secs(PATROL_PERIOD_SECS).await;
        for cmd in parse_script(PATROL_SCRIPT) {
            sender.send(cmd).await;
        }
    }
}
