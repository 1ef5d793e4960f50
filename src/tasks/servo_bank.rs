//! LEDC-backed servo bank.
//!
//! The ESP32 LEDC has 8 low speed and 4 high speed channels, one per servo. Both
//! kinds are wrapped in [`AnyChannel`] so the twelve servos fit one [`ServoBank`]
//! and are addressed by the channel numbers of `SERVO_CHANNEL_MAP`.
use anyhow::anyhow;
use embedded_hal::pwm::{Error as _, ErrorKind, ErrorType, SetDutyCycle};
use esp_hal::gpio::AnyPin;
use esp_hal::ledc::channel::{self, Channel, ChannelIFace, Number};
use esp_hal::ledc::timer::{self, LSClockSource, TimerIFace};
use esp_hal::ledc::{HighSpeed, LSGlobalClkSource, Ledc, LowSpeed};
use esp_hal::peripherals::LEDC;
use esp_hal::time::Rate;
use log::info;

use crate::robot::servo::{ServoBank, SERVO_COUNT};

pub type LedcServoBank = ServoBank<AnyChannel, SERVO_COUNT>;

pub enum AnyChannel {
    Low(Channel<'static, LowSpeed>),
    High(Channel<'static, HighSpeed>),
}

impl ErrorType for AnyChannel {
    type Error = ErrorKind;
}

impl SetDutyCycle for AnyChannel {
    fn max_duty_cycle(&self) -> u16 {
        match self {
            AnyChannel::Low(c) => c.max_duty_cycle(),
            AnyChannel::High(c) => c.max_duty_cycle(),
        }
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        match self {
            AnyChannel::Low(c) => c.set_duty_cycle(duty).map_err(|e| e.kind()),
            AnyChannel::High(c) => c.set_duty_cycle(duty).map_err(|e| e.kind()),
        }
    }
}

/// Configures both LEDC timers at `frequency_hz` and binds one channel per servo pin,
/// in bank order.
pub fn setup_servo_bank(
    ledc: LEDC<'static>,
    servo_pins: [AnyPin<'static>; SERVO_COUNT],
    frequency_hz: u32,
) -> anyhow::Result<LedcServoBank> {
    let ledc = mk_static!(Ledc<'static>, Ledc::new(ledc));
    ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);

    // 14 bit duty: about 1.2us of pulse resolution at 50Hz
    let timer_low = mk_static!(
        timer::Timer<'static, LowSpeed>,
        ledc.timer::<LowSpeed>(timer::Number::Timer0)
    );
    timer_low
        .configure(timer::config::Config {
            duty: timer::config::Duty::Duty14Bit,
            clock_source: LSClockSource::APBClk,
            frequency: Rate::from_hz(frequency_hz),
        })
        .map_err(|e| anyhow!("low speed timer: {:?}", e))?;

    let timer_high = mk_static!(
        timer::Timer<'static, HighSpeed>,
        ledc.timer::<HighSpeed>(timer::Number::Timer0)
    );
    timer_high
        .configure(timer::config::Config {
            duty: timer::config::Duty::Duty14Bit,
            clock_source: timer::HSClockSource::APBClk,
            frequency: Rate::from_hz(frequency_hz),
        })
        .map_err(|e| anyhow!("high speed timer: {:?}", e))?;
    let timer_low: &'static timer::Timer<'static, LowSpeed> = timer_low;
    let timer_high: &'static timer::Timer<'static, HighSpeed> = timer_high;

    let [p0, p1, p2, p3, p4, p5, p6, p7, p8, p9, p10, p11] = servo_pins;
    let mut bank = LedcServoBank::new();

    let low_speed_channels: [Channel<'static, LowSpeed>; 8] = [
        ledc.channel(Number::Channel0, p0),
        ledc.channel(Number::Channel1, p1),
        ledc.channel(Number::Channel2, p2),
        ledc.channel(Number::Channel3, p3),
        ledc.channel(Number::Channel4, p4),
        ledc.channel(Number::Channel5, p5),
        ledc.channel(Number::Channel6, p6),
        ledc.channel(Number::Channel7, p7),
    ];
    for mut channel in low_speed_channels {
        channel
            .configure(channel::config::Config {
                timer: timer_low,
                duty_pct: 0,
                pin_config: channel::config::PinConfig::PushPull,
            })
            .map_err(|e| anyhow!("low speed channel: {:?}", e))?;
        bank.push(AnyChannel::Low(channel))
            .map_err(|_| anyhow!("servo bank full"))?;
    }

    let high_speed_channels: [Channel<'static, HighSpeed>; 4] = [
        ledc.channel(Number::Channel0, p8),
        ledc.channel(Number::Channel1, p9),
        ledc.channel(Number::Channel2, p10),
        ledc.channel(Number::Channel3, p11),
    ];
    for mut channel in high_speed_channels {
        channel
            .configure(channel::config::Config {
                timer: timer_high,
                duty_pct: 0,
                pin_config: channel::config::PinConfig::PushPull,
            })
            .map_err(|e| anyhow!("high speed channel: {:?}", e))?;
        bank.push(AnyChannel::High(channel))
            .map_err(|_| anyhow!("servo bank full"))?;
    }

    info!("[SERVO] {} servos ready at {frequency_hz}Hz", bank.len());
    Ok(bank)
}
