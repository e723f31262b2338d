//! Headless runner: builds a simulator from `config.toml` and plays a command
//! script against it, logging sonar readings as it goes.
//!
//! Script format, one step per line (`#` starts a comment):
//!
//! ```text
//! toggle 50 50
//! drive f
//! wait 500
//! stop
//! sense
//! ```

use clap::Parser;
use robosim::{Config, Simulator};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "robosim", about = "2D robot sonar simulator")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = robosim::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Command script; read from stdin when omitted
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Where to write the action log (overrides the config)
    #[arg(long)]
    action_log: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Toggle(i32, i32),
    Drive(char),
    Turn(char),
    Stop,
    Wait(u64),
    Sense,
}

fn parse_step(line: &str) -> Result<Option<Step>, String> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or("");
    let args: Vec<&str> = parts.collect();

    let single_char = |args: &[&str]| -> Result<char, String> {
        let mut chars = args.first().ok_or("missing command character")?.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(format!("expected a single character, got '{}'", args[0])),
        }
    };
    let coordinate = |s: Option<&&str>| -> Result<i32, String> {
        let s = s.ok_or("missing coordinate")?;
        s.parse::<i32>().map_err(|e| format!("bad coordinate '{}': {}", s, e))
    };
    let millis = |s: Option<&&str>| -> Result<u64, String> {
        let s = s.ok_or("missing duration")?;
        s.parse::<u64>().map_err(|e| format!("bad duration '{}': {}", s, e))
    };

    let step = match verb {
        "toggle" => Step::Toggle(coordinate(args.first())?, coordinate(args.get(1))?),
        "drive" => Step::Drive(single_char(&args[..])?),
        "turn" => Step::Turn(single_char(&args[..])?),
        "stop" => Step::Stop,
        "wait" => Step::Wait(millis(args.first())?),
        "sense" => Step::Sense,
        other => return Err(format!("unknown step '{}'", other)),
    };
    Ok(Some(step))
}

fn run_step(sim: &Simulator, step: &Step) {
    let result = match step {
        Step::Toggle(x, y) => sim.toggle_cell(*x, *y).map(|t| format!("{:?}", t)),
        Step::Drive(c) => sim.drive(*c).map(|o| format!("{:?}", o)),
        Step::Turn(c) => sim.turn(*c).map(|o| format!("{:?}", o)),
        Step::Stop => Ok(format!("{:?}", sim.stop())),
        Step::Wait(ms) => {
            thread::sleep(Duration::from_millis(*ms));
            Ok(format!("waited {}ms", ms))
        }
        Step::Sense => {
            let snap = sim.snapshot();
            log::info!(
                "Robot at ({:.2}, {:.2}) heading {:.1}",
                snap.center().x,
                snap.center().y,
                snap.heading()
            );
            for reading in sim.measure_all() {
                log::info!("  {:<12} {:8.2}", reading.name, reading.distance);
            }
            Ok("sensed".to_string())
        }
    };

    match result {
        Ok(outcome) => log::debug!("{:?} -> {}", step, outcome),
        Err(e) => log::warn!("{:?} failed: {}", step, e),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config);

    let sim = match Simulator::new(&config) {
        Ok(sim) => sim,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let script = match &cli.script {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).map(|_| buf)
        }
    };
    let script = match script {
        Ok(script) => script,
        Err(e) => {
            log::error!("Failed to read script: {}", e);
            std::process::exit(1);
        }
    };

    for (lineno, line) in script.lines().enumerate() {
        match parse_step(line) {
            Ok(Some(step)) => run_step(&sim, &step),
            Ok(None) => {}
            Err(e) => log::warn!("line {}: {}", lineno + 1, e),
        }
    }

    sim.robot().stop_and_wait();

    if config.logging.enable_action_log {
        let path = cli
            .action_log
            .unwrap_or_else(|| PathBuf::from(&config.logging.action_log_path));
        match sim.save_action_log(&path) {
            Ok(()) => log::info!("Action log saved to {}", path.display()),
            Err(e) => log::error!("Failed to save action log: {}", e),
        }
        if log::log_enabled!(log::Level::Debug) {
            sim.with_action_log(|log| log.print());
        }
        if let Some(summary) = sim.with_action_log(|log| log.summary()) {
            log::info!("{}", summary);
        }
    }
}
