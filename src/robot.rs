use crate::block::Block;
use crate::config::Config;
use crate::error::{Result, SimError};
use crate::geometry::BodyAnchor;
use crate::sonar::{SonarReading, SonarSensor};
use crate::world::World;
use glam::DVec2;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Sensor mounts, registered clockwise starting from front-left.
/// Every tick updates them in this order.
pub const SONAR_LAYOUT: [(&str, BodyAnchor, f64); 6] = [
    ("Front-Left", BodyAnchor::FrontLeft, 315.0),
    ("Front", BodyAnchor::FrontCenter, 0.0),
    ("Front-Right", BodyAnchor::FrontRight, 45.0),
    ("Right", BodyAnchor::RightCenter, 90.0),
    ("Rear", BodyAnchor::RearCenter, 180.0),
    ("Left", BodyAnchor::LeftCenter, 270.0),
];

/// Single-character command vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    StrafeLeft,
    StrafeRight,
    Stop,
}

impl Command {
    pub fn as_char(self) -> char {
        match self {
            Command::Forward => 'f',
            Command::Backward => 'b',
            Command::TurnLeft => 'l',
            Command::TurnRight => 'r',
            Command::StrafeLeft => 'h',
            Command::StrafeRight => 'i',
            Command::Stop => 's',
        }
    }

    /// Commands that translate the body
    pub fn is_drive(self) -> bool {
        matches!(
            self,
            Command::Forward | Command::Backward | Command::StrafeLeft | Command::StrafeRight
        )
    }

    /// Commands that rotate the body
    pub fn is_turn(self) -> bool {
        matches!(self, Command::TurnLeft | Command::TurnRight)
    }
}

impl TryFrom<char> for Command {
    type Error = SimError;

    fn try_from(c: char) -> Result<Self> {
        match c {
            'f' => Ok(Command::Forward),
            'b' => Ok(Command::Backward),
            'l' => Ok(Command::TurnLeft),
            'r' => Ok(Command::TurnRight),
            'h' => Ok(Command::StrafeLeft),
            'i' => Ok(Command::StrafeRight),
            's' => Ok(Command::Stop),
            other => Err(SimError::UnknownCommand(other)),
        }
    }
}

/// Result of asking the robot to start or stop moving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// A loop was already running; nothing changed
    AlreadyRunning,
    Stopped,
}

/// Static robot setup
#[derive(Debug, Clone)]
pub struct RobotParams {
    pub start: DVec2,
    pub heading: f64,
    pub body_width: f64,
    pub body_height: f64,
    pub sonar_range: f64,
    pub boundary_blocks: bool,
    pub tick_period: Duration,
    pub min_sleep: Duration,
    /// World units moved per drive tick
    pub linear_step: f64,
    /// Degrees turned per turn tick
    pub angular_step: f64,
}

impl Default for RobotParams {
    fn default() -> Self {
        RobotParams::from_config(&Config::default())
    }
}

impl RobotParams {
    pub fn from_config(config: &Config) -> Self {
        RobotParams {
            start: DVec2::new(config.robot.start_x, config.robot.start_y),
            heading: config.robot.heading,
            body_width: config.robot.body_width,
            body_height: config.robot.body_height,
            sonar_range: config.sonar.max_range,
            boundary_blocks: config.sonar.boundary_blocks,
            tick_period: Duration::from_millis(config.robot.tick_ms),
            min_sleep: Duration::from_millis(config.robot.min_sleep_ms),
            linear_step: config.robot.linear_step,
            angular_step: config.robot.angular_step,
        }
    }

    /// Body extents must be positive and the sonar range non-negative.
    /// A zero tick period is refused.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("robot.body_width", self.body_width),
            ("robot.body_height", self.body_height),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidSetting {
                    name,
                    value,
                    reason: "must be finite and greater than zero",
                });
            }
        }
        if !(self.sonar_range.is_finite() && self.sonar_range >= 0.0) {
            return Err(SimError::InvalidSetting {
                name: "sonar.max_range",
                value: self.sonar_range,
                reason: "must be finite and not negative",
            });
        }
        if self.tick_period.is_zero() {
            return Err(SimError::InvalidSetting {
                name: "robot.tick_ms",
                value: 0.0,
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}

/// Sleep before the next tick: what is left of `period`, never less than
/// `min_sleep`. An overrun tick is not skipped, the loop just falls behind.
fn pace(elapsed: Duration, period: Duration, min_sleep: Duration) -> Duration {
    period.saturating_sub(elapsed).max(min_sleep)
}

/// Body and sensors, always mutated together under one lock
#[derive(Debug, Clone)]
struct Rig {
    body: Block,
    sonars: Vec<SonarSensor>,
    state: Command,
    ticks: u64,
}

impl Rig {
    fn apply(&mut self, command: Command, params: &RobotParams) {
        let body = &mut self.body;
        let sonars = &mut self.sonars;
        match command {
            Command::Forward | Command::Backward | Command::StrafeLeft | Command::StrafeRight => {
                let old = body.center();
                match command {
                    Command::Forward => body.translate(params.linear_step),
                    Command::Backward => body.translate(-params.linear_step),
                    Command::StrafeLeft => body.strafe(-params.linear_step),
                    _ => body.strafe(params.linear_step),
                }
                let delta = body.center() - old;
                for sonar in sonars.iter_mut() {
                    sonar.translate(delta.x, delta.y);
                }
            }
            Command::TurnLeft | Command::TurnRight => {
                let old = body.heading();
                if command == Command::TurnLeft {
                    body.rotate(-params.angular_step);
                } else {
                    body.rotate(params.angular_step);
                }
                let delta = body.heading() - old;
                for sonar in sonars.iter_mut() {
                    sonar.rotate(delta, body);
                }
            }
            Command::Stop => return,
        }
        self.ticks += 1;
    }
}

/// Consistent copy of the robot taken between ticks
#[derive(Debug, Clone)]
pub struct RobotSnapshot {
    pub body: Block,
    pub sonars: Vec<SonarSensor>,
    pub state: Command,
    /// Motion ticks applied since creation
    pub ticks: u64,
}

impl RobotSnapshot {
    pub fn center(&self) -> DVec2 {
        self.body.center()
    }

    pub fn heading(&self) -> f64 {
        self.body.heading()
    }

    pub fn corners(&self) -> [DVec2; 4] {
        self.body.corners()
    }

    pub fn front_center(&self) -> DVec2 {
        self.body.front_center()
    }

    pub fn rear_center(&self) -> DVec2 {
        self.body.rear_center()
    }

    pub fn left_center(&self) -> DVec2 {
        self.body.left_center()
    }

    pub fn right_center(&self) -> DVec2 {
        self.body.right_center()
    }
}

struct Shared {
    rig: RwLock<Rig>,
    running: AtomicBool,
    /// Bumped on every start and stop; a loop runs only while it matches
    epoch: AtomicU64,
}

/// A rectangular robot carrying six sonar sensors.
///
/// Motion runs on a background thread at a fixed tick period. At most one
/// loop runs at a time: `drive`/`turn` while moving are no-ops, `stop` ends
/// the loop within one tick.
pub struct Robot {
    shared: Arc<Shared>,
    params: RobotParams,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Robot {
    pub fn new(params: RobotParams) -> Self {
        let body = Block::new(
            params.body_width,
            params.body_height,
            params.start.x,
            params.start.y,
            params.heading,
        );
        let sonars = SONAR_LAYOUT
            .iter()
            .map(|(name, anchor, bearing)| {
                SonarSensor::new(*name, &body, *anchor, *bearing, params.sonar_range, 'l')
                    .with_boundary_walls(params.boundary_blocks)
            })
            .collect();

        Robot {
            shared: Arc::new(Shared {
                rig: RwLock::new(Rig {
                    body,
                    sonars,
                    state: Command::Stop,
                    ticks: 0,
                }),
                running: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
            }),
            params,
            worker: Mutex::new(None),
        }
    }

    pub fn params(&self) -> &RobotParams {
        &self.params
    }

    /// Start driving with one of `f`, `b`, `h`, `i`; `s` stops
    pub fn drive(&self, direction: char) -> Result<StartOutcome> {
        let command = Command::try_from(direction)?;
        match command {
            Command::Stop => Ok(self.stop()),
            c if c.is_drive() => self.start(c),
            _ => Err(SimError::InvalidCommand {
                command: direction,
                entry: "drive",
            }),
        }
    }

    /// Start turning with `l` or `r`; `s` stops
    pub fn turn(&self, direction: char) -> Result<StartOutcome> {
        let command = Command::try_from(direction)?;
        match command {
            Command::Stop => Ok(self.stop()),
            c if c.is_turn() => self.start(c),
            _ => Err(SimError::InvalidCommand {
                command: direction,
                entry: "turn",
            }),
        }
    }

    fn start(&self, command: Command) -> Result<StartOutcome> {
        let mut worker = self.worker.lock();

        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("Robot already moving, ignoring {:?}", command);
            return Ok(StartOutcome::AlreadyRunning);
        }

        let epoch = self.shared.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        self.shared.rig.write().state = command;

        let shared = Arc::clone(&self.shared);
        let params = self.params.clone();
        let spawned = thread::Builder::new()
            .name("robot-control".to_string())
            .spawn(move || control_loop(shared, params, command, epoch));

        match spawned {
            Ok(handle) => {
                // A previous loop has been cancelled and exits on its own
                if let Some(old) = worker.replace(handle) {
                    if old.is_finished() && old.join().is_err() {
                        log::error!("Robot control thread panicked");
                    }
                }
                Ok(StartOutcome::Started)
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                self.shared.rig.write().state = Command::Stop;
                Err(SimError::Io(e))
            }
        }
    }

    /// Cancel the control loop; takes effect within one tick
    pub fn stop(&self) -> StartOutcome {
        let _worker = self.worker.lock();
        self.shared.epoch.fetch_add(1, Ordering::AcqRel);
        if self.shared.running.swap(false, Ordering::AcqRel) {
            log::info!("Robot stop requested");
        }
        self.shared.rig.write().state = Command::Stop;
        StartOutcome::Stopped
    }

    /// Stop and wait for the control thread to exit
    pub fn stop_and_wait(&self) {
        self.stop();
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("Robot control thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn state(&self) -> Command {
        self.shared.rig.read().state
    }

    /// Apply exactly one tick of `command` right now, outside the control loop
    pub fn tick(&self, command: Command) {
        self.shared.rig.write().apply(command, &self.params);
    }

    pub fn snapshot(&self) -> RobotSnapshot {
        let rig = self.shared.rig.read();
        RobotSnapshot {
            body: rig.body.clone(),
            sonars: rig.sonars.clone(),
            state: rig.state,
            ticks: rig.ticks,
        }
    }

    pub fn center(&self) -> DVec2 {
        self.shared.rig.read().body.center()
    }

    pub fn heading(&self) -> f64 {
        self.shared.rig.read().body.heading()
    }

    pub fn corners(&self) -> [DVec2; 4] {
        self.shared.rig.read().body.corners()
    }

    pub fn sonar_count(&self) -> usize {
        self.shared.rig.read().sonars.len()
    }

    pub fn sonar(&self, index: usize) -> Result<SonarSensor> {
        let rig = self.shared.rig.read();
        rig.sonars.get(index).cloned().ok_or(SimError::SensorIndex {
            index,
            count: rig.sonars.len(),
        })
    }

    /// Range reading of one sensor against `world`
    pub fn measure(&self, index: usize, world: &World) -> Result<f64> {
        let rig = self.shared.rig.read();
        rig.sonars
            .get(index)
            .map(|sonar| sonar.measure(world))
            .ok_or(SimError::SensorIndex {
                index,
                count: rig.sonars.len(),
            })
    }

    pub fn measure_all(&self, world: &World) -> Vec<SonarReading> {
        let rig = self.shared.rig.read();
        rig.sonars.iter().map(|sonar| sonar.reading(world)).collect()
    }
}

impl Drop for Robot {
    fn drop(&mut self) {
        self.stop_and_wait();
    }
}

fn control_loop(shared: Arc<Shared>, params: RobotParams, command: Command, epoch: u64) {
    log::info!(
        "Control loop started: {:?} every {:?}",
        command,
        params.tick_period
    );

    while shared.epoch.load(Ordering::Acquire) == epoch {
        let cycle_start = Instant::now();

        {
            let mut rig = shared.rig.write();
            // stop() may have landed while we waited for the lock
            if shared.epoch.load(Ordering::Acquire) != epoch {
                break;
            }
            rig.apply(command, &params);
        }

        let elapsed = cycle_start.elapsed();
        if elapsed > params.tick_period {
            log::debug!(
                "Tick overrun: {:?} (target: {:?})",
                elapsed,
                params.tick_period
            );
        }
        thread::sleep(pace(elapsed, params.tick_period, params.min_sleep));
    }

    log::info!("Control loop stopped");
}
