use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use welcome_core::scenario_file;
use welcome_core::welcome::{self, WelcomeSettings};
use welcome_core::{ConfigurationError, ScenarioTable};

/// Largest accepted `BUS_CHANNEL_CAPACITY`.
pub const MAX_BUS_CHANNEL_CAPACITY: usize = 1 << 16;

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// Worker configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local run against the
/// in-process bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Delay between the door closing and the lights going off.
    pub lights_off_delay: Duration,
    /// JSON scenario table replacing the built-in one.
    pub scenario_file: Option<PathBuf>,
    /// Broadcast buffer of the in-process bus.
    pub bus_capacity: usize,
    /// When set, the door is toggled at this interval.
    pub door_simulation_interval: Option<Duration>,
    /// Upper bound on waiting for each background task at shutdown.
    pub shutdown_timeout: Duration,
    pub log_format: LogFormat,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            lights_off_delay: welcome::DEFAULT_LIGHTS_OFF_DELAY,
            scenario_file: None,
            bus_capacity: welcome_bus::memory::DEFAULT_CAPACITY,
            door_simulation_interval: None,
            shutdown_timeout: Duration::from_secs(5),
            log_format: LogFormat::Text,
        }
    }
}

impl WorkerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                       | Default | Notes          |
    /// |-------------------------------|---------|----------------|
    /// | `LIGHTS_OFF_DELAY_MS`         | `2000`  |                |
    /// | `SCENARIO_FILE`               | unset   |                |
    /// | `BUS_CHANNEL_CAPACITY`        | `1024`  | at most `65536`|
    /// | `DOOR_SIMULATION_INTERVAL_MS` | unset   |                |
    /// | `SHUTDOWN_TIMEOUT_SECS`       | `5`     |                |
    /// | `LOG_FORMAT`                  | `text`  | `text`, `json` |
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let lights_off_delay = match get("LIGHTS_OFF_DELAY_MS") {
            Some(raw) => Duration::from_millis(parse_positive("LIGHTS_OFF_DELAY_MS", &raw)?),
            None => defaults.lights_off_delay,
        };

        let scenario_file = get("SCENARIO_FILE").map(PathBuf::from);

        let bus_capacity = match get("BUS_CHANNEL_CAPACITY") {
            Some(raw) => parse_capacity(&raw)?,
            None => defaults.bus_capacity,
        };

        let door_simulation_interval = get("DOOR_SIMULATION_INTERVAL_MS")
            .map(|raw| parse_positive("DOOR_SIMULATION_INTERVAL_MS", &raw))
            .transpose()?
            .map(Duration::from_millis);

        let shutdown_timeout = match get("SHUTDOWN_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("SHUTDOWN_TIMEOUT_SECS", &raw)?),
            None => defaults.shutdown_timeout,
        };

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => raw
                .parse()
                .map_err(|()| ConfigurationError::InvalidEnv {
                    var: "LOG_FORMAT",
                    value: raw.clone(),
                })?,
            None => defaults.log_format,
        };

        Ok(Self {
            lights_off_delay,
            scenario_file,
            bus_capacity,
            door_simulation_interval,
            shutdown_timeout,
            log_format,
        })
    }

    /// The scenario table to serve: the configured file, or the built-in
    /// passenger welcome table.
    pub fn scenario_table(&self) -> Result<ScenarioTable, ConfigurationError> {
        match &self.scenario_file {
            Some(path) => scenario_file::load(path),
            None => welcome::passenger_welcome(&WelcomeSettings {
                lights_off_delay: self.lights_off_delay,
            }),
        }
    }
}

/// Parse a strictly positive integer.
fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigurationError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigurationError::InvalidEnv {
            var,
            value: raw.to_string(),
        }),
    }
}

/// Parse a channel capacity in `1..=MAX_BUS_CHANNEL_CAPACITY`.
fn parse_capacity(raw: &str) -> Result<usize, ConfigurationError> {
    let capacity = parse_positive("BUS_CHANNEL_CAPACITY", raw)?;
    usize::try_from(capacity)
        .ok()
        .filter(|capacity| *capacity <= MAX_BUS_CHANNEL_CAPACITY)
        .ok_or_else(|| ConfigurationError::InvalidEnv {
            var: "BUS_CHANNEL_CAPACITY",
            value: raw.to_string(),
        })
}
