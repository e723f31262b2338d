//! Error types for the simulator

/// Result type alias
pub type Result<T> = std::result::Result<T, SimError>;

/// Everything the simulator can refuse to do.
///
/// Geometry and occupancy queries are total over valid input, so only
/// construction, out-of-range authoring and malformed commands end up here.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// World or grid cell dimensions must be strictly positive
    #[error("world must have a positive width and height (got {width}x{height})")]
    InvalidDimensions { width: i32, height: i32 },

    /// A coordinate or footprint falls outside the world
    #[error("({x}, {y}) is outside the {width}x{height} world")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    /// A robot or sensor setting outside its usable range
    #[error("invalid setting {name} = {value}: {reason}")]
    InvalidSetting {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// No placed block carries this id
    #[error("no block with id {0}")]
    UnknownBlock(u64),

    /// Character outside the command vocabulary
    #[error("unknown command '{0}'")]
    UnknownCommand(char),

    /// A known command handed to the wrong entry point (e.g. `turn('f')`)
    #[error("command '{command}' cannot be used with {entry}")]
    InvalidCommand { command: char, entry: &'static str },

    /// Sensor index past the end of the sonar array
    #[error("no sonar sensor at index {index} (robot has {count})")]
    SensorIndex { index: usize, count: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}
