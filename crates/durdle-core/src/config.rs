//! Configuration loading and typed config structures for the Durdle simulation.
//!
//! The canonical configuration lives in `durdle-config.yaml` at the project
//! root. Every section is optional; missing fields fall back to the classic
//! setup: two ticks per second and one computer cycling a ten-second durdle
//! task.

use std::path::Path;

use serde::Deserialize;

use crate::executor::TaskSource;
use crate::task::{Task, TaskError};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an unusable simulation.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Tick rate settings.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Frame loop settings and run bounds.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Executors to create, in subscription order.
    #[serde(default = "default_executors")]
    pub executors: Vec<ExecutorConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            clock: ClockConfig::default(),
            runner: RunnerConfig::default(),
            logging: LoggingConfig::default(),
            executors: default_executors(),
        }
    }
}

impl SimulationConfig {
    /// Load and validate configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot drive a simulation.
    ///
    /// Task times and executor speeds are checked again when the objects
    /// are built; this catches them before anything starts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock.ticks_per_second == 0 {
            return Err(ConfigError::Invalid {
                reason: "clock.ticks_per_second must be at least 1".to_owned(),
            });
        }

        for executor in &self.executors {
            if executor.name.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    reason: "executor names must not be empty".to_owned(),
                });
            }
            if !executor.speed.is_finite() || executor.speed < 0.0 {
                return Err(ConfigError::Invalid {
                    reason: format!(
                        "executor {}: speed {} must be finite and non-negative",
                        executor.name, executor.speed
                    ),
                });
            }
            for task in &executor.tasks {
                if !task.complete_time.is_finite() || task.complete_time <= 0.0 {
                    return Err(ConfigError::Invalid {
                        reason: format!(
                            "executor {}: task {} complete_time {} must be positive",
                            executor.name, task.name, task.complete_time
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Tick rate configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClockConfig {
    /// Logical ticks per second of frame time.
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: default_ticks_per_second(),
        }
    }
}

/// Frame loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunnerConfig {
    /// Real-time milliseconds between frames.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Stop after this many ticks (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Stop after this many wall-clock seconds (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            max_ticks: 0,
            max_real_time_seconds: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// One executor and the tasks it starts with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExecutorConfig {
    /// Human-readable executor name.
    pub name: String,

    /// Throughput multiplier applied to every tick.
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Initial queue, head first.
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

impl TaskSource for ExecutorConfig {
    fn initial_tasks(&self) -> Result<Vec<Task>, TaskError> {
        self.tasks.iter().map(TaskConfig::build).collect()
    }
}

/// One queued task.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskConfig {
    /// Human-readable task name.
    #[serde(default = "default_task_name")]
    pub name: String,

    /// Seconds of progress needed to complete the task.
    pub complete_time: f64,

    /// Whether the task cycles after completing.
    #[serde(default)]
    pub repeatable: bool,
}

impl TaskConfig {
    /// Build a fresh task from this entry.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidCompleteTime`] for a non-positive time.
    pub fn build(&self) -> Result<Task, TaskError> {
        Task::new(&self.name, self.complete_time, self.repeatable)
    }
}

const fn default_ticks_per_second() -> u32 {
    2
}

const fn default_frame_interval_ms() -> u64 {
    16
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_speed() -> f64 {
    1.0
}

fn default_task_name() -> String {
    "durdle".to_owned()
}

fn default_executors() -> Vec<ExecutorConfig> {
    vec![ExecutorConfig {
        name: "computer".to_owned(),
        speed: default_speed(),
        tasks: vec![TaskConfig {
            name: default_task_name(),
            complete_time: 10.0,
            repeatable: true,
        }],
    }]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.clock.ticks_per_second, 2);
        assert_eq!(config.runner.frame_interval_ms, 16);
        assert_eq!(config.runner.max_ticks, 0);
        assert_eq!(config.executors.len(), 1);
        assert_eq!(config.executors[0].tasks[0].complete_time, 10.0);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
clock:
  ticks_per_second: 4

runner:
  frame_interval_ms: 10
  max_ticks: 100
  max_real_time_seconds: 30

logging:
  level: "debug"

executors:
  - name: "easy"
    speed: 1.5
    tasks:
      - name: "durdle"
        complete_time: 10.0
        repeatable: true
  - name: "batch"
    tasks:
      - complete_time: 3.0
      - name: "report"
        complete_time: 5.0
"#;

        let config = SimulationConfig::parse(yaml).unwrap();

        assert_eq!(config.clock.ticks_per_second, 4);
        assert_eq!(config.runner.max_ticks, 100);
        assert_eq!(config.runner.max_real_time_seconds, 30);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.executors.len(), 2);

        let easy = &config.executors[0];
        assert_eq!(easy.speed, 1.5);
        assert!(easy.tasks[0].repeatable);

        let batch = &config.executors[1];
        assert_eq!(batch.speed, 1.0);
        assert_eq!(batch.tasks[0].name, "durdle");
        assert!(!batch.tasks[1].repeatable);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = SimulationConfig::parse("clock:\n  ticks_per_second: 10\n").unwrap();

        assert_eq!(config.clock.ticks_per_second, 10);
        // Everything else uses defaults.
        assert_eq!(config.runner.frame_interval_ms, 16);
        assert_eq!(config.executors[0].name, "computer");
    }

    #[test]
    fn parse_empty_yaml() {
        let config = SimulationConfig::parse("").unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn explicit_empty_executor_list_is_allowed() {
        let config = SimulationConfig::parse("executors: []\n").unwrap();
        assert!(config.executors.is_empty());
    }

    #[test]
    fn zero_tick_rate_is_invalid() {
        let result = SimulationConfig::parse("clock:\n  ticks_per_second: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn non_positive_task_time_is_invalid() {
        let yaml = "executors:\n  - name: bad\n    tasks:\n      - complete_time: 0\n";
        let result = SimulationConfig::parse(yaml);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn empty_executor_name_is_invalid() {
        let result = SimulationConfig::parse("executors:\n  - name: \"\"\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));

        let result = SimulationConfig::parse("executors:\n  - name: \"   \"\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn negative_speed_is_invalid() {
        let yaml = "executors:\n  - name: slow\n    speed: -2\n";
        let result = SimulationConfig::parse(yaml);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let result = SimulationConfig::parse("clock: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn executor_config_builds_its_queue() {
        let config = SimulationConfig::default();
        let tasks = config.executors[0].initial_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].is_repeatable());
        assert_eq!(tasks[0].complete_time(), 10.0);
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("durdle-config.yaml");
        if path.exists() {
            let config = SimulationConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
