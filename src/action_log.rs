use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

use crate::error::Result;

/// Calls made against the simulator's mutation API
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Toggle the coarse cell under world point (x, y)
    ToggleCell { x: i32, y: i32 },
    /// Start driving with the given command character
    Drive { command: char },
    /// Start turning with the given command character
    Turn { command: char },
    Stop,
}

/// Logged action with timestamp and what came of it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoggedAction {
    /// Milliseconds since start
    pub timestamp_ms: u64,
    pub action: Action,
    /// Human-readable result, e.g. "placed #3" or "error: ..."
    pub outcome: String,
}

/// Session log of everything a client asked the simulator to do
pub struct ActionLog {
    start_time: Instant,
    actions: Vec<LoggedAction>,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionLog {
    pub fn new() -> Self {
        ActionLog {
            start_time: Instant::now(),
            actions: Vec::new(),
        }
    }

    /// Log an action with current timestamp
    pub fn log(&mut self, action: Action, outcome: impl Into<String>) {
        let timestamp_ms = self.start_time.elapsed().as_millis() as u64;
        self.actions.push(LoggedAction {
            timestamp_ms,
            action,
            outcome: outcome.into(),
        });
    }

    pub fn actions(&self) -> &[LoggedAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Save log to JSON file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.actions)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Vec<LoggedAction>> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Dump the log at info level
    pub fn print(&self) {
        log::info!("=== Action Log ({} events) ===", self.actions.len());
        for (i, logged) in self.actions.iter().enumerate() {
            log::info!(
                "[{:6}ms] #{:3} {:?} -> {}",
                logged.timestamp_ms,
                i + 1,
                logged.action,
                logged.outcome
            );
        }
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let mut toggles = 0;
        let mut drives = 0;
        let mut turns = 0;
        let mut stops = 0;
        let mut errors = 0;

        for logged in &self.actions {
            match logged.action {
                Action::ToggleCell { .. } => toggles += 1,
                Action::Drive { .. } => drives += 1,
                Action::Turn { .. } => turns += 1,
                Action::Stop => stops += 1,
            }
            if logged.outcome.starts_with("error") {
                errors += 1;
            }
        }

        let duration = self.actions.last().map_or(0, |last| last.timestamp_ms);

        format!(
            "Session Duration: {}ms\n\
             Total Events: {} ({} rejected)\n\
             Grid Modifications: {} toggled\n\
             Robot Commands: {} drive, {} turn, {} stop",
            duration,
            self.actions.len(),
            errors,
            toggles,
            drives,
            turns,
            stops
        )
    }
}
