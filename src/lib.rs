pub mod action_log;
pub mod block;
pub mod config;
pub mod error;
pub mod geometry;
pub mod point;
pub mod robot;
pub mod simulator;
pub mod sonar;
pub mod world;

pub use block::{Block, BlockId};
pub use config::Config;
pub use error::{Result, SimError};
pub use point::{GridPoint, Point};
pub use robot::{Command, Robot, RobotParams, RobotSnapshot, StartOutcome};
pub use simulator::Simulator;
pub use sonar::{SonarReading, SonarSensor};
pub use world::{Toggle, World};
