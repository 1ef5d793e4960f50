//! Tick-driven gait scheduler.
//!
//! [`GaitEngine`] walks a [`GaitPlan`] slot by slot. Inside a slot every active leg
//! owns a track: an optional Bezier path sampled with arc-length pacing, and the
//! [`AngleRamp`] moving it toward the current sample. Each [`GaitEngine::tick`]
//! issues at most one new sample and one interpolator step per leg, and never
//! blocks. Time comes from the caller, so the same scheduler runs on the firmware
//! ticker and on a simulated host clock.
//!
//! A leg whose sample is out of reach, or whose servos refuse a write, drops the
//! rest of its curve and holds; the fault lands in the [`GaitReport`] and the other
//! legs carry on.
use embassy_time::{Duration, Instant};
use fugit::HertzU32;
use heapless::Vec;
use log::{debug, error, info, warn};

use crate::error::{CurveError, GaitError, MotionError};
use crate::kinematics::bezier::{BezierCurve, Point2};
use crate::kinematics::conversion::{inverse_kinematics, refresh_foot};
use crate::kinematics::gait_plan::{swinging_in, GaitKind, GaitPlan, LegPhase};
use crate::kinematics::interpolator::{advance, AngleRamp};
use crate::robot::config::{GaitParams, RobotConfig};
use crate::robot::joint::Position;
use crate::robot::leg::{Leg, LegMount, Robot};
use crate::robot::servo::Actuator;
use crate::LEG_COUNT;

/// Faults kept per run; later ones are only counted.
pub const MAX_FAULTS: usize = 16;

/// Guard for the blocking runners, which never see a real clock.
pub const MAX_SIMULATED_TICKS: u32 = 200_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaultCause {
    /// The sample was outside the leg workspace
    Unreachable,
    Motion(MotionError),
    Curve(CurveError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegFault {
    pub leg: LegMount,
    pub slot: usize,
    /// Index of the curve sample being executed (0 for pose moves)
    pub sample: u16,
    pub cause: FaultCause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// No gait loaded
    Idle,
    Running,
    /// The last slot completed on this tick
    Finished,
    /// A stop request was honoured on this tick
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GaitReport {
    pub ticks: u32,
    pub slots: u32,
    pub max_swinging: usize,
    pub stopped: bool,
    pub faults: Vec<LegFault, MAX_FAULTS>,
    pub dropped_faults: u32,
}

impl GaitReport {
    pub fn faults_for(&self, leg: LegMount) -> impl Iterator<Item = &LegFault> {
        self.faults.iter().filter(move |f| f.leg == leg)
    }

    fn record(&mut self, fault: LegFault) {
        warn!(
            "[GAIT] {} fault in slot {} sample {}: {:?}",
            fault.leg, fault.slot, fault.sample, fault.cause
        );
        if self.faults.push(fault).is_err() {
            self.dropped_faults += 1;
        }
    }
}

/// A curve in the body (x, z) plane with the foot's y held, plus its pacing state.
#[derive(Debug, Clone, PartialEq)]
struct CurvePath {
    curve: BezierCurve,
    hold_y: f32,
    samples: u16,
    next: u16,
    due: Instant,
    duration: Duration,
    length: f32,
}

impl CurvePath {
    fn new(curve: BezierCurve, hold_y: f32, params: &GaitParams, now: Instant) -> Self {
        let samples = params.samples_per_curve;
        let length = curve.arc_length(samples);
        Self {
            curve,
            hold_y,
            samples,
            next: 0,
            due: now,
            duration: params.curve_duration,
            length,
        }
    }

    fn is_exhausted(&self) -> bool {
        self.next > self.samples
    }

    fn param(&self, index: u16) -> f32 {
        index as f32 / self.samples as f32
    }

    /// Share of the curve duration spent reaching sample `index` from the one before.
    fn segment_time(&self, index: u16) -> Duration {
        let share = if self.length > 0.0 {
            let from = self.curve.evaluate(self.param(index - 1));
            let to = self.curve.evaluate(self.param(index));
            from.distance(&to) / self.length
        } else {
            1.0 / self.samples as f32
        };
        Duration::from_ticks((self.duration.as_ticks() as f32 * share) as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct LegTrack {
    phase: LegPhase,
    path: Option<CurvePath>,
    ramp: Option<AngleRamp>,
    sample: u16,
}

impl LegTrack {
    fn is_active(&self) -> bool {
        self.path.is_some() || self.ramp.is_some()
    }

    fn is_swinging(&self) -> bool {
        self.is_active() && self.phase == LegPhase::Swing
    }

    fn clear(&mut self) {
        self.path = None;
        self.ramp = None;
    }
}

/// Advances one leg by at most one sample and one interpolator step.
fn step_track<A: Actuator + ?Sized>(
    track: &mut LegTrack,
    leg: &mut Leg,
    actuator: &mut A,
    speed: u16,
    frequency: HertzU32,
    now: Instant,
) -> Result<(), FaultCause> {
    if track.ramp.is_none() {
        if let Some(path) = track.path.as_mut() {
            if !path.is_exhausted() && now >= path.due {
                let index = path.next;
                track.sample = index;
                let point = path
                    .curve
                    .try_evaluate(path.param(index))
                    .map_err(FaultCause::Curve)?;
                let target = Position::new(point.x, path.hold_y, point.y);
                let angles =
                    inverse_kinematics(leg, target).map_err(|_| FaultCause::Unreachable)?;
                let ramp = AngleRamp::new(leg.angles(), angles, speed).map_err(FaultCause::Motion)?;
                track.ramp = Some(ramp);

                path.next += 1;
                if !path.is_exhausted() {
                    let wait = path.segment_time(path.next);
                    path.due += wait;
                }
            }
        }
    }

    if let Some(ramp) = track.ramp.as_mut() {
        if advance(leg, ramp, actuator, frequency).map_err(FaultCause::Motion)? {
            track.ramp = None;
        }
    }

    if track.ramp.is_none() && track.path.as_ref().is_some_and(CurvePath::is_exhausted) {
        track.path = None;
    }
    if !track.is_active() {
        refresh_foot(leg);
    }
    Ok(())
}

/// Gait scheduler. One instance drives one [`Robot`]; at most one gait runs at a time.
#[derive(Debug, Clone)]
pub struct GaitEngine {
    config: RobotConfig,
    plan: Option<GaitPlan>,
    slot: usize,
    tracks: [LegTrack; LEG_COUNT],
    stop_requested: bool,
    report: GaitReport,
}

impl GaitEngine {
    pub fn new(config: &RobotConfig) -> Self {
        Self {
            config: *config,
            plan: None,
            slot: 0,
            tracks: Default::default(),
            stop_requested: false,
            report: GaitReport::default(),
        }
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.plan.is_some()
    }

    pub fn plan(&self) -> Option<&GaitPlan> {
        self.plan.as_ref()
    }

    /// Legs currently lifted.
    pub fn swinging(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_swinging()).count()
    }

    pub fn report(&self) -> &GaitReport {
        &self.report
    }

    pub fn take_report(&mut self) -> GaitReport {
        core::mem::take(&mut self.report)
    }

    /// Loads a gait and its first slot. Nothing moves until the next [`GaitEngine::tick`].
    pub fn start(
        &mut self,
        robot: &mut Robot,
        kind: GaitKind,
        cycles: u8,
        now: Instant,
    ) -> Result<(), GaitError> {
        if self.is_running() {
            return Err(GaitError::Busy);
        }
        self.config.validate()?;

        let mounts = robot.legs().map(|leg| leg.mount());
        let plan = GaitPlan::new(kind, cycles, mounts);
        self.plan = Some(plan);
        self.slot = 0;
        self.stop_requested = false;
        self.report = GaitReport::default();
        self.tracks = Default::default();
        info!(
            "[GAIT] starting {kind} x{cycles} ({} slots)",
            plan.slot_count()
        );

        if let Err(e) = self.load_slot(robot, now) {
            self.plan = None;
            self.tracks = Default::default();
            return Err(e);
        }
        Ok(())
    }

    /// Asks the running gait to halt at the next tick boundary.
    pub fn request_stop(&mut self) {
        if self.is_running() {
            info!("[GAIT] stop requested");
            self.stop_requested = true;
        }
    }

    pub fn tick<A: Actuator + ?Sized>(
        &mut self,
        robot: &mut Robot,
        actuator: &mut A,
        now: Instant,
    ) -> TickStatus {
        let Some(plan) = self.plan else {
            return TickStatus::Idle;
        };
        if self.stop_requested {
            self.halt(robot);
            self.report.stopped = true;
            info!("[GAIT] {} stopped in slot {}", plan.kind(), self.slot);
            return TickStatus::Stopped;
        }
        if plan.slot_count() == 0 {
            self.plan = None;
            info!("[GAIT] {} has no slots, nothing to do", plan.kind());
            return TickStatus::Finished;
        }

        self.report.ticks += 1;
        let frequency = self.config.gait.pwm_frequency;
        for (track, leg) in self.tracks.iter_mut().zip(robot.legs_mut().iter_mut()) {
            if !track.is_active() {
                continue;
            }
            let speed = match track.phase {
                LegPhase::Settle => self.config.stand_speed,
                _ => self.config.gait.speed,
            };
            if let Err(cause) = step_track(track, leg, actuator, speed, frequency, now) {
                track.clear();
                refresh_foot(leg);
                self.report.record(LegFault {
                    leg: leg.mount(),
                    slot: self.slot,
                    sample: track.sample,
                    cause,
                });
            }
        }

        if self.tracks.iter().any(LegTrack::is_active) {
            return TickStatus::Running;
        }

        self.report.slots += 1;
        self.slot += 1;
        if self.slot >= plan.slot_count() {
            self.plan = None;
            info!(
                "[GAIT] {} finished: {} ticks, {} faults",
                plan.kind(),
                self.report.ticks,
                self.report.faults.len()
            );
            return TickStatus::Finished;
        }
        // curve errors are already recorded as faults
        let _ = self.load_slot(robot, now);
        TickStatus::Running
    }

    fn halt(&mut self, robot: &mut Robot) {
        for (track, leg) in self.tracks.iter_mut().zip(robot.legs_mut().iter_mut()) {
            track.clear();
            refresh_foot(leg);
        }
        self.plan = None;
        self.stop_requested = false;
    }

    /// Builds the tracks of the current slot from the legs' current feet.
    fn load_slot(&mut self, robot: &Robot, now: Instant) -> Result<(), GaitError> {
        let Some(slot) = self.plan.and_then(|plan| plan.slot(self.slot)) else {
            return Ok(());
        };
        debug!("[GAIT] slot {}: {:?}", self.slot, slot);
        self.report.max_swinging = self.report.max_swinging.max(swinging_in(&slot));

        let params = self.config.gait;
        let mut first_error = None;
        for ((track, leg), phase) in self.tracks.iter_mut().zip(robot.legs()).zip(slot) {
            *track = LegTrack {
                phase,
                ..Default::default()
            };
            let foot = leg.foot();
            let start = Point2::new(foot.x, foot.z);
            let curve = match phase {
                LegPhase::Hold => continue,
                LegPhase::Swing => {
                    BezierCurve::swing(start, params.stride_length, params.swing_height)
                }
                LegPhase::Stance { stroke } => {
                    BezierCurve::stance(start, params.stride_length * stroke)
                }
                LegPhase::Settle => {
                    let neutral = leg.mount().to_body(self.config.neutral);
                    match inverse_kinematics(leg, neutral)
                        .map_err(|_| FaultCause::Unreachable)
                        .and_then(|angles| {
                            AngleRamp::new(leg.angles(), angles, self.config.stand_speed)
                                .map_err(FaultCause::Motion)
                        }) {
                        Ok(ramp) => track.ramp = Some(ramp),
                        Err(cause) => self.report.record(LegFault {
                            leg: leg.mount(),
                            slot: self.slot,
                            sample: 0,
                            cause,
                        }),
                    }
                    continue;
                }
            };

            if let Err(source) = curve.try_evaluate(0.0) {
                self.report.record(LegFault {
                    leg: leg.mount(),
                    slot: self.slot,
                    sample: 0,
                    cause: FaultCause::Curve(source),
                });
                if first_error.is_none() {
                    first_error = Some(GaitError::Curve {
                        leg: leg.mount(),
                        source,
                    });
                }
                continue;
            }
            track.path = Some(CurvePath::new(curve, foot.y, &params, now));
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Runs `kind` to completion against a simulated clock advancing one tick period per tick.
pub fn run_gait<A: Actuator + ?Sized>(
    robot: &mut Robot,
    actuator: &mut A,
    config: &RobotConfig,
    kind: GaitKind,
    cycles: u8,
) -> Result<GaitReport, GaitError> {
    let mut engine = GaitEngine::new(config);
    let mut now = Instant::from_ticks(0);
    engine.start(robot, kind, cycles, now)?;

    while engine.tick(robot, actuator, now) == TickStatus::Running {
        now += config.tick_period;
        if engine.report().ticks >= MAX_SIMULATED_TICKS {
            error!("[GAIT] {kind} still running after {MAX_SIMULATED_TICKS} ticks, stopping");
            engine.request_stop();
        }
    }
    Ok(engine.take_report())
}

/// Every leg in turn swings forward by `stride` then pushes back, one gait cycle.
pub fn walk_forward<A: Actuator + ?Sized>(
    robot: &mut Robot,
    actuator: &mut A,
    stride: f32,
    swing_height: f32,
    samples: u16,
) -> Result<GaitReport, GaitError> {
    let mut config = *robot.config();
    config.gait = config
        .gait
        .with_stride(stride, swing_height)
        .with_samples(samples);
    run_gait(robot, actuator, &config, GaitKind::Walk, 1)
}

/// One crawl cycle with the robot's stride.
pub fn crawl_gait<A: Actuator + ?Sized>(
    robot: &mut Robot,
    actuator: &mut A,
) -> Result<GaitReport, GaitError> {
    let config = *robot.config();
    run_gait(robot, actuator, &config, GaitKind::Crawl, 1)
}

/// One wave cycle.
pub fn wave_gait<A: Actuator + ?Sized>(
    robot: &mut Robot,
    actuator: &mut A,
    stride: f32,
    swing_height: f32,
) -> Result<GaitReport, GaitError> {
    let mut config = *robot.config();
    config.gait = config.gait.with_stride(stride, swing_height);
    run_gait(robot, actuator, &config, GaitKind::Wave, 1)
}

/// One tripod cycle with the robot's stride.
pub fn tripod_gait<A: Actuator + ?Sized>(
    robot: &mut Robot,
    actuator: &mut A,
) -> Result<GaitReport, GaitError> {
    let config = *robot.config();
    run_gait(robot, actuator, &config, GaitKind::Tripod, 1)
}

/// Drives every leg to the robot's neutral foot position.
pub fn stand<A: Actuator + ?Sized>(
    robot: &mut Robot,
    actuator: &mut A,
) -> Result<GaitReport, GaitError> {
    let config = *robot.config();
    run_gait(robot, actuator, &config, GaitKind::Stand, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ActuatorError, ConfigError};
    use crate::kinematics::conversion::forward_kinematics;
    use crate::robot::joint::JointAngles;

    #[derive(Default)]
    struct Sink {
        writes: usize,
    }

    impl Actuator for Sink {
        fn set_joint_angle(&mut self, _: u8, _: f32, _: u32) -> Result<(), ActuatorError> {
            self.writes += 1;
            Ok(())
        }
    }

    struct Broken(u8);

    impl Actuator for Broken {
        fn set_joint_angle(&mut self, channel: u8, _: f32, _: u32) -> Result<(), ActuatorError> {
            if channel == self.0 {
                Err(ActuatorError::Write(channel))
            } else {
                Ok(())
            }
        }
    }

    fn robot() -> Robot {
        Robot::new(&RobotConfig::new()).unwrap()
    }

    #[test]
    fn idle_engine_does_nothing() {
        let mut engine = GaitEngine::new(&RobotConfig::new());
        let mut robot = robot();
        let mut sink = Sink::default();
        assert_eq!(
            engine.tick(&mut robot, &mut sink, Instant::from_ticks(0)),
            TickStatus::Idle
        );
        assert_eq!(sink.writes, 0);
    }

    #[test]
    fn second_start_is_busy() {
        let mut engine = GaitEngine::new(&RobotConfig::new());
        let mut robot = robot();
        let now = Instant::from_ticks(0);
        engine.start(&mut robot, GaitKind::Wave, 1, now).unwrap();
        assert_eq!(
            engine.start(&mut robot, GaitKind::Crawl, 1, now),
            Err(GaitError::Busy)
        );
    }

    #[test]
    fn zero_cycles_finish_without_a_slot() {
        let mut engine = GaitEngine::new(&RobotConfig::new());
        let mut robot = robot();
        let mut sink = Sink::default();
        let now = Instant::from_ticks(0);
        engine.start(&mut robot, GaitKind::Walk, 0, now).unwrap();
        assert_eq!(engine.tick(&mut robot, &mut sink, now), TickStatus::Finished);
        assert!(!engine.is_running());
        assert_eq!(engine.report().slots, 0);
        assert_eq!(engine.report().ticks, 0);
        assert_eq!(sink.writes, 0);
        assert_eq!(engine.tick(&mut robot, &mut sink, now), TickStatus::Idle);
    }

    #[test]
    fn invalid_config_is_rejected_before_motion() {
        let mut config = RobotConfig::new();
        config.gait = config.gait.with_samples(0);
        let mut robot = robot();
        let before = robot.clone();
        let result = run_gait(&mut robot, &mut Sink::default(), &config, GaitKind::Walk, 1);
        assert_eq!(result, Err(GaitError::Config(ConfigError::ZeroSamples)));
        assert_eq!(robot, before);
    }

    #[test]
    fn stand_reaches_neutral() {
        let config = RobotConfig::new();
        let geometry = config.geometry;
        let legs = LegMount::ALL.map(|m| Leg::new(m, geometry, JointAngles::new(80.0, 100.0, 70.0)));
        let mut robot = Robot::from_legs(&config, legs);

        let report = stand(&mut robot, &mut Sink::default()).unwrap();
        assert!(report.faults.is_empty());
        assert_eq!(report.slots, 1);
        for leg in robot.legs() {
            let neutral = leg.mount().to_body(config.neutral);
            assert!(leg.foot().distance(&neutral) < 0.5, "{}: {}", leg.mount(), leg.foot());
        }
    }

    #[test]
    fn stand_uses_the_robot_neutral() {
        let mut config = RobotConfig::new();
        config.neutral = Position::new(80.0, -60.0, -80.0);
        let legs = *robot().legs();
        let mut robot = Robot::from_legs(&config, legs);

        let report = stand(&mut robot, &mut Sink::default()).unwrap();
        assert!(report.faults.is_empty(), "{:?}", report.faults);
        for leg in robot.legs() {
            let neutral = leg.mount().to_body(config.neutral);
            assert!(leg.foot().distance(&neutral) < 0.5, "{}: {}", leg.mount(), leg.foot());
        }
    }

    #[test]
    fn arc_length_pacing_holds_samples_until_due() {
        let config = RobotConfig::new();
        let mut robot = robot();
        let mut engine = GaitEngine::new(&config);
        let t0 = Instant::from_ticks(0);
        engine.start(&mut robot, GaitKind::Walk, 1, t0).unwrap();

        let mut sink = Sink::default();
        // sample 0 is the current foot: no motion needed
        engine.tick(&mut robot, &mut sink, t0);
        let path = engine.tracks[0].path.clone().unwrap();
        assert_eq!(path.next, 1);
        assert!(path.due > t0);
        assert!(path.due < t0 + config.gait.curve_duration);

        // not due yet: nothing new is issued
        engine.tick(&mut robot, &mut sink, t0);
        assert_eq!(engine.tracks[0].path.as_ref().unwrap().next, 1);
    }

    #[test]
    fn segment_times_add_up_to_curve_duration() {
        let params = GaitParams::default();
        let curve = BezierCurve::swing(Point2::new(70.0, -70.0), 40.0, 15.0);
        let path = CurvePath::new(curve, -70.0, &params, Instant::from_ticks(0));
        let total: u64 = (1..=params.samples_per_curve)
            .map(|i| path.segment_time(i).as_ticks())
            .sum();
        let budget = params.curve_duration.as_ticks();
        // truncation loses at most one tick per segment
        assert!(total <= budget && total + params.samples_per_curve as u64 >= budget);
    }

    #[test]
    fn actuator_failure_pauses_only_that_leg() {
        let mut robot = robot();
        // front right femur
        let report = run_gait(
            &mut robot,
            &mut Broken(7),
            &RobotConfig::new(),
            GaitKind::Tripod,
            1,
        )
        .unwrap();

        assert!(!report.faults.is_empty());
        for fault in report.faults.iter() {
            assert_eq!(fault.leg, LegMount::FrontRight);
            assert_eq!(
                fault.cause,
                FaultCause::Motion(MotionError::Actuator(ActuatorError::Write(7)))
            );
        }
        assert_eq!(report.slots, 3);
    }

    #[test]
    fn stop_lands_on_tick_boundary() {
        let config = RobotConfig::new();
        let mut robot = robot();
        let mut engine = GaitEngine::new(&config);
        let mut sink = Sink::default();
        let mut now = Instant::from_ticks(0);
        engine.start(&mut robot, GaitKind::Wave, 2, now).unwrap();
        for _ in 0..15 {
            assert_eq!(engine.tick(&mut robot, &mut sink, now), TickStatus::Running);
            now += config.tick_period;
        }
        let writes = sink.writes;
        engine.request_stop();
        assert_eq!(engine.tick(&mut robot, &mut sink, now), TickStatus::Stopped);
        assert_eq!(sink.writes, writes);
        assert!(!engine.is_running());
        assert!(engine.report().stopped);
        assert_eq!(engine.swinging(), 0);

        for leg in robot.legs() {
            let mut probe = *leg;
            let foot = forward_kinematics(&mut probe, leg.angles());
            assert_eq!(leg.foot(), foot);
        }
    }
}
