//! Actuator boundary: the [`Actuator`] trait the core writes joint angles through,
//! and a PWM servo bank implementing it over `embedded-hal` duty-cycle channels.
use embedded_hal::pwm::{Error as _, SetDutyCycle};
use fugit::HertzU32;
use heapless::Vec;
use log::error;
use micromath::F32Ext;

use crate::error::ActuatorError;
use crate::robot::joint::{Joint, JointAngles};
use crate::robot::leg::LegMount;
use crate::LEG_COUNT;

// --- Servo Configuration ---
pub const SERVO_MIN_PULSE_US: u32 = 544;
pub const SERVO_MAX_PULSE_US: u32 = 2400;
pub const SERVO_ANGLE_RANGE: f32 = 180.0;
pub const SERVO_COUNT: usize = LEG_COUNT * 3;

//[coxa, femur, tibia]
pub static SERVO_CHANNEL_MAP: [[u8; 3]; LEG_COUNT] = [
    [0, 1, 2],   // front left
    [3, 4, 5],   // back left
    [6, 7, 8],   // front right
    [9, 10, 11], // back right
];

/// Fire-and-forget hardware write primitive consumed by the motion layer.
pub trait Actuator {
    fn init(&mut self) -> Result<(), ActuatorError> {
        Ok(())
    }

    fn set_joint_angle(
        &mut self,
        channel: u8,
        angle: f32,
        pwm_frequency_hz: u32,
    ) -> Result<(), ActuatorError>;
}

impl<A: Actuator + ?Sized> Actuator for &mut A {
    fn init(&mut self) -> Result<(), ActuatorError> {
        (**self).init()
    }

    fn set_joint_angle(
        &mut self,
        channel: u8,
        angle: f32,
        pwm_frequency_hz: u32,
    ) -> Result<(), ActuatorError> {
        (**self).set_joint_angle(channel, angle, pwm_frequency_hz)
    }
}

/// Writes the three joints of one leg, coxa first.
pub fn write_leg<A: Actuator + ?Sized>(
    actuator: &mut A,
    mount: LegMount,
    angles: JointAngles,
    frequency: HertzU32,
) -> Result<(), ActuatorError> {
    let channels = SERVO_CHANNEL_MAP[mount as usize];
    for joint in Joint::ALL {
        actuator.set_joint_angle(channels[joint as usize], angles[joint], frequency.raw())?;
    }
    Ok(())
}

/// Pulse width for an angle in degrees. Out of range angles are clamped.
pub fn angle_to_pulse_us(angle: f32) -> u32 {
    let angle = angle.clamp(0.0, SERVO_ANGLE_RANGE);
    let range = (SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US) as f32;
    SERVO_MIN_PULSE_US + (angle / SERVO_ANGLE_RANGE * range).round() as u32
}

/// Duty cycle register value for a pulse width at the given PWM frequency.
pub fn pulse_to_duty(pulse_us: u32, max_duty: u16, frequency: HertzU32) -> u16 {
    // THE WIDTH OF THE PULSE DRIVES THE ANGLE, NOT FREQ
    let period_us = 1_000_000 / frequency.raw();
    ((pulse_us * max_duty as u32) / period_us).min(max_duty as u32) as u16
}

#[derive(Debug)]
pub struct Servo<PWM> {
    pwm: PWM,
    duty: Option<u16>,
    max_duty: u16,
}

impl<PWM> Servo<PWM>
where
    PWM: SetDutyCycle,
{
    pub fn new(pwm: PWM) -> Self {
        let max_duty = pwm.max_duty_cycle();
        Self {
            pwm,
            duty: None,
            max_duty,
        }
    }

    /// Sets the servo angle in degrees (clamped to 0..=180).
    pub fn set_angle(&mut self, angle: f32, frequency: HertzU32) -> Result<(), PWM::Error> {
        let duty = pulse_to_duty(angle_to_pulse_us(angle), self.max_duty, frequency);

        //Avoid setting the same duty again
        if self.duty == Some(duty) {
            return Ok(());
        }
        self.pwm.set_duty_cycle(duty)?;
        self.duty = Some(duty);
        Ok(())
    }

    /// Stops driving the servo until the next [`Servo::set_angle`].
    pub fn release(&mut self) -> Result<(), PWM::Error> {
        self.pwm.set_duty_cycle_fully_off()?;
        self.duty = None;
        Ok(())
    }

    pub fn duty(&self) -> Option<u16> {
        self.duty
    }
}

/// Servos addressed by channel number (their index in the bank).
#[derive(Debug)]
pub struct ServoBank<PWM, const N: usize> {
    servos: Vec<Servo<PWM>, N>,
}

impl<PWM, const N: usize> ServoBank<PWM, N>
where
    PWM: SetDutyCycle,
{
    pub fn new() -> Self {
        Self { servos: Vec::new() }
    }

    /// Appends a channel; hands it back if the bank is full.
    pub fn push(&mut self, pwm: PWM) -> Result<(), PWM> {
        self.servos
            .push(Servo::new(pwm))
            .map_err(|servo| servo.pwm)
    }

    pub fn servo(&self, channel: u8) -> Option<&Servo<PWM>> {
        self.servos.get(channel as usize)
    }

    pub fn len(&self) -> usize {
        self.servos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servos.is_empty()
    }
}

impl<PWM, const N: usize> Default for ServoBank<PWM, N>
where
    PWM: SetDutyCycle,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<PWM, const N: usize> Actuator for ServoBank<PWM, N>
where
    PWM: SetDutyCycle,
{
    /// Releases every servo so nothing moves before the first command.
    fn init(&mut self) -> Result<(), ActuatorError> {
        for (channel, servo) in self.servos.iter_mut().enumerate() {
            servo.release().map_err(|e| {
                error!("[SERVO] channel {channel} release failed: {:?}", e.kind());
                ActuatorError::Write(channel as u8)
            })?;
        }
        Ok(())
    }

    fn set_joint_angle(
        &mut self,
        channel: u8,
        angle: f32,
        pwm_frequency_hz: u32,
    ) -> Result<(), ActuatorError> {
        if pwm_frequency_hz == 0 {
            return Err(ActuatorError::Frequency(pwm_frequency_hz));
        }
        let servo = self
            .servos
            .get_mut(channel as usize)
            .ok_or(ActuatorError::UnknownChannel(channel))?;
        servo
            .set_angle(angle, HertzU32::from_raw(pwm_frequency_hz))
            .map_err(|e| {
                error!("[SERVO] channel {channel} error writing angle {angle}: {:?}", e.kind());
                ActuatorError::Write(channel)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::pwm::{ErrorKind, ErrorType};

    #[derive(Debug, Default)]
    struct MockPwm {
        duty: u16,
        writes: u32,
        broken: bool,
    }

    impl ErrorType for MockPwm {
        type Error = ErrorKind;
    }

    impl SetDutyCycle for MockPwm {
        fn max_duty_cycle(&self) -> u16 {
            4095
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            if self.broken {
                return Err(ErrorKind::Other);
            }
            self.duty = duty;
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn pulse_range_matches_servo_datasheet() {
        assert_eq!(angle_to_pulse_us(0.0), 544);
        assert_eq!(angle_to_pulse_us(180.0), 2400);
        assert_eq!(angle_to_pulse_us(90.0), 1472);
        assert_eq!(angle_to_pulse_us(-20.0), 544);
        assert_eq!(angle_to_pulse_us(500.0), 2400);
    }

    #[test]
    fn duty_scales_with_period() {
        let hz = HertzU32::from_raw(50);
        assert_eq!(pulse_to_duty(1472, 4095, hz), 301);
        assert_eq!(pulse_to_duty(20_000, 4095, hz), 4095);
        assert_eq!(pulse_to_duty(100_000, 4095, hz), 4095);
    }

    #[test]
    fn bank_routes_channels_and_skips_repeats() {
        let mut bank: ServoBank<MockPwm, 2> = ServoBank::new();
        assert!(bank.push(MockPwm::default()).is_ok());
        assert!(bank.push(MockPwm::default()).is_ok());
        assert!(bank.push(MockPwm::default()).is_err());

        bank.set_joint_angle(1, 90.0, 50).unwrap();
        bank.set_joint_angle(1, 90.0, 50).unwrap();
        assert_eq!(bank.servo(1).unwrap().duty(), Some(301));
        assert_eq!(bank.servo(1).unwrap().pwm.writes, 1);
        assert_eq!(bank.servo(0).unwrap().duty(), None);

        assert_eq!(
            bank.set_joint_angle(5, 90.0, 50),
            Err(ActuatorError::UnknownChannel(5))
        );
        assert_eq!(
            bank.set_joint_angle(0, 90.0, 0),
            Err(ActuatorError::Frequency(0))
        );
    }

    #[test]
    fn write_failures_surface() {
        let mut bank: ServoBank<MockPwm, 1> = ServoBank::new();
        assert!(bank
            .push(MockPwm {
                broken: true,
                ..Default::default()
            })
            .is_ok());
        assert_eq!(
            bank.set_joint_angle(0, 10.0, 50),
            Err(ActuatorError::Write(0))
        );
        assert_eq!(bank.init(), Err(ActuatorError::Write(0)));
    }
}
