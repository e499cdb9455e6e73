// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::in_process::ResponseOwnership;
use crate::backends::process::ProcessOptions;
use crate::backends::wasm::InstanceOptions;
use crate::config::consts::{
    DEFAULT_FUEL_LEVEL, DEFAULT_PROCESS_ARG, DEFAULT_SHUTDOWN_GRACE_MS,
    DEFAULT_STDERR_CAPTURE_LINES, MAX_FUEL_LEVEL, MIN_FUEL_LEVEL,
};
use crate::errors::ConfigError;
use crate::observability::messages::config::{ConfigLoaded, FuelClamped};
use crate::protocol::IdMismatchPolicy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level translator configuration.
///
/// Only the section matching `backend` is required; the other may be present and
/// is ignored.
///
/// # Example
/// ```yaml
/// backend: wasm
/// protocol:
///   id_mismatch: reject
/// wasm:
///   module: translator/angle_translator.wasm
///   fuel:
///     default: 1000000000
/// ```
#[derive(Debug, Deserialize)]
pub struct Config {
    pub backend: BackendType,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    pub wasm: Option<WasmConfig>,
    pub process: Option<ProcessConfig>,
}

/// Which binding carries requests to the translator.
///
/// # Variants
/// * `Wasm` - in-process wasmtime instance, linear memory marshalling
/// * `Process` - child process speaking line-delimited JSON over stdio
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    Wasm,
    Process,
}

impl BackendType {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendType::Wasm => "wasm",
            BackendType::Process => "process",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default)]
    pub id_mismatch: IdMismatchPolicy,
}

/// In-process binding settings.
///
/// # Example
/// ```yaml
/// wasm:
///   module: translator/angle_translator.wasm
///   response_ownership: host   # or: module
///   inherit_stderr: false
///   fuel:
///     default: 1000000000
///     minimum: 1000000
///     maximum: 10000000000
/// ```
#[derive(Debug, Deserialize)]
pub struct WasmConfig {
    pub module: String,
    #[serde(default)]
    pub response_ownership: ResponseOwnership,
    #[serde(default)]
    pub inherit_stderr: bool,
    #[serde(default)]
    pub fuel: FuelConfig,
}

impl WasmConfig {
    pub fn instance_options(&self) -> InstanceOptions {
        InstanceOptions {
            fuel: self.fuel.validate_and_clamp(self.fuel.get_default()),
            inherit_stderr: self.inherit_stderr,
        }
    }
}

/// Fuel granted to each entry-point call of the translator module.
///
/// Fuel stops a runaway translation instead of hanging the host. Every value is
/// optional and falls back to the constants in `config::consts`.
///
/// # Example
/// ```yaml
/// fuel:
///   default: 1000000000    # 1 billion instructions
///   minimum: 1000000       # 1 million instructions
///   maximum: 10000000000   # 10 billion instructions (hard limit)
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FuelConfig {
    pub default: Option<u64>,
    pub minimum: Option<u64>,
    pub maximum: Option<u64>,
}

impl FuelConfig {
    /// Get the default fuel level, using built-in default if not configured.
    pub fn get_default(&self) -> u64 {
        self.default.unwrap_or(DEFAULT_FUEL_LEVEL)
    }

    /// Get the minimum fuel level, using built-in default if not configured.
    pub fn get_minimum(&self) -> u64 {
        self.minimum.unwrap_or(MIN_FUEL_LEVEL)
    }

    /// Get the maximum fuel level, using built-in default if not configured.
    pub fn get_maximum(&self) -> u64 {
        self.maximum.unwrap_or(MAX_FUEL_LEVEL)
    }

    /// Clamp a fuel level to `[minimum, maximum]`, warning when it had to move.
    ///
    /// # Example
    /// ```
    /// use shader_bridge::config::FuelConfig;
    ///
    /// let config = FuelConfig::default();
    /// let fuel = config.validate_and_clamp(50_000_000_000); // Too high
    /// assert_eq!(fuel, 10_000_000_000); // Clamped to maximum
    /// ```
    pub fn validate_and_clamp(&self, requested: u64) -> u64 {
        let minimum = self.get_minimum();
        let maximum = self.get_maximum();
        // `max` then `min`, so an unvalidated inverted range settles on `maximum`.
        let applied = requested.max(minimum).min(maximum);

        if applied != requested {
            tracing::warn!(
                "{}",
                FuelClamped {
                    requested,
                    applied,
                    minimum,
                    maximum,
                }
            );
        }
        applied
    }
}

/// Out-of-process binding settings.
///
/// # Example
/// ```yaml
/// process:
///   executable: /usr/local/bin/angle_shader_translator
///   args: ["--json-rpc"]
///   shutdown_grace_ms: 500
///   stderr_capture_lines: 64
/// ```
#[derive(Debug, Deserialize)]
pub struct ProcessConfig {
    pub executable: String,
    #[serde(default = "default_process_args")]
    pub args: Vec<String>,
    pub shutdown_grace_ms: Option<u64>,
    pub stderr_capture_lines: Option<usize>,
}

fn default_process_args() -> Vec<String> {
    vec![DEFAULT_PROCESS_ARG.to_string()]
}

impl ProcessConfig {
    pub fn get_shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms.unwrap_or(DEFAULT_SHUTDOWN_GRACE_MS))
    }

    pub fn get_stderr_capture_lines(&self) -> usize {
        self.stderr_capture_lines
            .unwrap_or(DEFAULT_STDERR_CAPTURE_LINES)
    }

    pub fn process_options(&self) -> ProcessOptions {
        ProcessOptions {
            executable: PathBuf::from(&self.executable),
            args: self.args.clone(),
            shutdown_grace: self.get_shutdown_grace(),
            stderr_capture_lines: self.get_stderr_capture_lines(),
        }
    }
}

impl Config {
    /// Checks cross-field rules serde cannot express.
    ///
    /// # Errors
    /// * `ConfigError::MissingSection` - the selected backend has no section
    /// * `ConfigError::Invalid` - an empty path or an inverted fuel range
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.backend {
            BackendType::Wasm => {
                let wasm = self.wasm_section()?;
                if wasm.module.trim().is_empty() {
                    return Err(ConfigError::Invalid("wasm.module must not be empty".to_string()));
                }
                let (minimum, maximum) = (wasm.fuel.get_minimum(), wasm.fuel.get_maximum());
                if minimum > maximum {
                    return Err(ConfigError::Invalid(format!(
                        "wasm.fuel.minimum ({}) exceeds wasm.fuel.maximum ({})",
                        minimum, maximum
                    )));
                }
            }
            BackendType::Process => {
                let process = self.process_section()?;
                if process.executable.trim().is_empty() {
                    return Err(ConfigError::Invalid(
                        "process.executable must not be empty".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn wasm_section(&self) -> Result<&WasmConfig, ConfigError> {
        self.wasm.as_ref().ok_or(ConfigError::MissingSection {
            backend: BackendType::Wasm.as_str(),
            section: "wasm",
        })
    }

    pub fn process_section(&self) -> Result<&ProcessConfig, ConfigError> {
        self.process.as_ref().ok_or(ConfigError::MissingSection {
            backend: BackendType::Process.as_str(),
            section: "process",
        })
    }
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Load and validate a config from a YAML file
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let cfg = load_config(path)?;
    cfg.validate()?;

    tracing::info!(
        "{}",
        ConfigLoaded {
            path: &path.display().to_string(),
            backend: cfg.backend.as_str(),
        }
    );
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_wasm_config() {
        let yaml = r#"
backend: wasm
wasm:
  module: translator.wasm
  response_ownership: module
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.backend, BackendType::Wasm);
        assert_eq!(cfg.protocol.id_mismatch, IdMismatchPolicy::Reject);

        let wasm = cfg.wasm_section().unwrap();
        assert_eq!(wasm.module, "translator.wasm");
        assert_eq!(wasm.response_ownership, ResponseOwnership::Module);
        assert!(!wasm.inherit_stderr);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parse_process_config_defaults() {
        let yaml = r#"
backend: process
protocol:
  id_mismatch: warn
process:
  executable: /usr/local/bin/angle_shader_translator
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.protocol.id_mismatch, IdMismatchPolicy::Warn);

        let options = cfg.process_section().unwrap().process_options();
        assert_eq!(options.args, vec!["--json-rpc"]);
        assert_eq!(options.shutdown_grace, Duration::from_millis(500));
        assert_eq!(options.stderr_capture_lines, 64);
    }

    #[test]
    fn test_missing_backend_section() {
        let cfg: Config = serde_yaml::from_str("backend: process\n").unwrap();

        match cfg.validate() {
            Err(ConfigError::MissingSection { backend, section }) => {
                assert_eq!(backend, "process");
                assert_eq!(section, "process");
            }
            other => panic!("expected MissingSection, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_backend_is_a_parse_error() {
        let result: Result<Config, _> = serde_yaml::from_str("backend: grpc\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_module_path_is_invalid() {
        let cfg: Config = serde_yaml::from_str("backend: wasm\nwasm:\n  module: ''\n").unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_wasm_config_defaults() {
        let cfg: Config =
            serde_yaml::from_str("backend: wasm\nwasm:\n  module: translator.wasm\n").unwrap();
        let fuel = &cfg.wasm_section().unwrap().fuel;

        assert_eq!(fuel.get_default(), 1_000_000_000);
        assert_eq!(fuel.get_minimum(), 1_000_000);
        assert_eq!(fuel.get_maximum(), 10_000_000_000);
    }

    #[test]
    fn test_wasm_config_partial_override() {
        let yaml = r#"
backend: wasm
wasm:
  module: translator.wasm
  fuel:
    default: 150000000
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let wasm = cfg.wasm_section().unwrap();

        assert_eq!(wasm.fuel.get_default(), 150_000_000);
        assert_eq!(wasm.fuel.get_minimum(), 1_000_000);
        assert_eq!(wasm.instance_options().fuel, 150_000_000);
    }

    #[test]
    fn test_fuel_clamping() {
        let config = FuelConfig {
            default: Some(10),
            minimum: Some(1_000),
            maximum: Some(5_000),
        };

        assert_eq!(config.validate_and_clamp(10), 1_000);
        assert_eq!(config.validate_and_clamp(2_500), 2_500);
        assert_eq!(config.validate_and_clamp(u64::MAX), 5_000);
    }

    #[test]
    fn test_clamping_inverted_range_does_not_panic() {
        let config = FuelConfig {
            default: None,
            minimum: Some(5_000),
            maximum: Some(1_000),
        };

        assert_eq!(config.validate_and_clamp(3_000), 1_000);
        assert_eq!(config.validate_and_clamp(10), 1_000);
    }

    #[test]
    fn test_inverted_fuel_range_is_invalid() {
        let yaml = r#"
backend: wasm
wasm:
  module: translator.wasm
  fuel:
    minimum: 5000
    maximum: 1000
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        match cfg.validate() {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("exceeds")),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_load_config_missing_file() {
        match load_config("/nonexistent/translator.yaml") {
            Err(ConfigError::Io { path, .. }) => assert!(path.contains("translator.yaml")),
            other => panic!("expected Io error, got {:?}", other),
        }
    }
}
