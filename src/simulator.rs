//! Simulator root: owns the shared world and the robot and is the single
//! entry point for rendering, input and telemetry clients.

use crate::action_log::{Action, ActionLog};
use crate::config::Config;
use crate::error::{Result, SimError};
use crate::robot::{Command, Robot, RobotParams, RobotSnapshot, StartOutcome};
use crate::sonar::SonarReading;
use crate::world::{Toggle, World};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::path::Path;
use std::sync::Arc;

pub struct Simulator {
    world: Arc<RwLock<World>>,
    robot: Robot,
    action_log: Option<Mutex<ActionLog>>,
}

impl Simulator {
    pub fn new(config: &Config) -> Result<Self> {
        let world = World::with_cell_size(
            config.world.width,
            config.world.height,
            config.world.cell_width,
            config.world.cell_height,
        )?;
        let params = RobotParams::from_config(config);
        params.validate()?;
        let robot = Robot::new(params);
        let action_log = config
            .logging
            .enable_action_log
            .then(|| Mutex::new(ActionLog::new()));

        log::info!(
            "Simulator ready: world {}x{}, robot at ({}, {})",
            config.world.width,
            config.world.height,
            config.robot.start_x,
            config.robot.start_y
        );

        Ok(Simulator {
            world: Arc::new(RwLock::new(world)),
            robot,
            action_log,
        })
    }

    /// Shared handle for consumers that outlive a borrow of the simulator
    pub fn world_handle(&self) -> Arc<RwLock<World>> {
        Arc::clone(&self.world)
    }

    /// Read access to the world; holds off obstacle edits while alive
    pub fn world(&self) -> RwLockReadGuard<'_, World> {
        self.world.read()
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    pub fn toggle_cell(&self, x: i32, y: i32) -> Result<Toggle> {
        let result = self.world.write().toggle_cell(x, y);
        let outcome = match &result {
            Ok(Toggle::Placed(id)) => format!("placed {}", id),
            Ok(Toggle::Removed(id)) => format!("removed {}", id),
            Err(e) => {
                log::warn!("Toggle at ({}, {}) rejected: {}", x, y, e);
                format!("error: {}", e)
            }
        };
        self.record(Action::ToggleCell { x, y }, outcome);
        result
    }

    pub fn drive(&self, direction: char) -> Result<StartOutcome> {
        let result = self.robot.drive(direction);
        self.record(Action::Drive { command: direction }, describe(&result));
        result
    }

    pub fn turn(&self, direction: char) -> Result<StartOutcome> {
        let result = self.robot.turn(direction);
        self.record(Action::Turn { command: direction }, describe(&result));
        result
    }

    pub fn stop(&self) -> StartOutcome {
        let outcome = self.robot.stop();
        self.record(Action::Stop, describe(&Ok(outcome)));
        outcome
    }

    pub fn state(&self) -> Command {
        self.robot.state()
    }

    pub fn snapshot(&self) -> RobotSnapshot {
        self.robot.snapshot()
    }

    /// Range reading of sensor `index`
    pub fn measure(&self, index: usize) -> Result<f64> {
        let world = self.world.read();
        self.robot.measure(index, &world)
    }

    pub fn measure_all(&self) -> Vec<SonarReading> {
        let world = self.world.read();
        self.robot.measure_all(&world)
    }

    /// Run `f` against the action log, if logging is enabled
    pub fn with_action_log<R>(&self, f: impl FnOnce(&ActionLog) -> R) -> Option<R> {
        self.action_log.as_ref().map(|log| f(&log.lock()))
    }

    pub fn save_action_log(&self, path: impl AsRef<Path>) -> Result<()> {
        match &self.action_log {
            Some(log) => log.lock().save_to_file(path),
            None => {
                log::debug!("Action log disabled, nothing to save");
                Ok(())
            }
        }
    }

    fn record(&self, action: Action, outcome: String) {
        if let Some(log) = &self.action_log {
            log.lock().log(action, outcome);
        }
    }
}

fn describe(result: &std::result::Result<StartOutcome, SimError>) -> String {
    match result {
        Ok(StartOutcome::Started) => "started".to_string(),
        Ok(StartOutcome::AlreadyRunning) => "already running".to_string(),
        Ok(StartOutcome::Stopped) => "stopped".to_string(),
        Err(e) => format!("error: {}", e),
    }
}
