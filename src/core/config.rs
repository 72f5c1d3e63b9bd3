//! Startup configuration
//!
//! Settings come from an optional JSON file (same keys as the environment
//! variables) with environment variables taking precedence. Everything is
//! validated once at startup; a bad value stops the process before it
//! connects anywhere.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.2.0: Schedule and timezone are required
//! - 1.1.0: JSON config file support with env overrides
//! - 1.0.0: Environment-only configuration

use chrono_tz::Tz;
use log::info;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::error::{RelayError, RelayResult};
use crate::features::policy::WindowPolicy;
use crate::features::scheduler::Cadence;

pub const DEFAULT_CONFIG_PATH: &str = "./config/config.json";
pub const DEFAULT_MAX_RESULTS: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub calendar_id: String,
    pub channel_id: u64,
    pub credentials_path: PathBuf,
    pub reminded_events_path: PathBuf,
    pub server_id: u64,
    pub cadence: Cadence,
    pub timezone: Tz,
    pub policy: WindowPolicy,
    /// Page size for each calendar fetch
    pub max_results: usize,
    /// Run one tick as soon as the bot is ready, before the first scheduled time
    pub run_on_start: bool,
    pub log_level: String,
}

impl Config {
    /// Load from `CONFIG_PATH` (if the file exists) and the process environment
    pub fn load() -> RelayResult<Self> {
        Self::from_sources(&load_config_file()?, |key| std::env::var(key).ok())
    }

    /// Build a config from file values and an environment lookup.
    ///
    /// The lookup wins over the file for every key.
    pub fn from_sources<F>(file: &HashMap<String, Value>, env: F) -> RelayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(file, &env, key);
        let require = |key: &str| get(key).ok_or_else(|| RelayError::missing(key));

        let discord_token = require("DISCORD_TOKEN")?;
        let calendar_id = require("CALENDAR_ID")?;
        let channel_id = parse_id("CHANNEL_ID", &require("CHANNEL_ID")?)?;
        let credentials_path = PathBuf::from(require("CREDENTIALS_PATH")?);
        let reminded_events_path = PathBuf::from(require("REMINDED_EVENTS_PATH")?);
        let server_id = parse_id("SERVER_ID", &require("SERVER_ID")?)?;

        let timezone_name = require("TIMEZONE")?;
        let timezone = timezone_name.parse::<Tz>().map_err(|e| {
            RelayError::Configuration(format!("TIMEZONE '{timezone_name}' is not a known zone: {e}"))
        })?;

        let cadence = Cadence::parse(&require("SCHEDULE")?, timezone)?;

        let policy = WindowPolicy::from_settings(
            get("REMINDER_POLICY").as_deref().unwrap_or("offsets"),
            get("REMINDER_OFFSETS").as_deref(),
            get("REMINDER_PERIODIC").as_deref(),
        )?;

        let max_results = match get("MAX_RESULTS") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    RelayError::Configuration(format!("MAX_RESULTS must be a positive integer, got '{raw}'"))
                })?,
            None => DEFAULT_MAX_RESULTS,
        };

        let run_on_start = match get("RUN_ON_START") {
            Some(raw) => parse_bool("RUN_ON_START", &raw)?,
            None => true,
        };

        Ok(Config {
            discord_token,
            calendar_id,
            channel_id,
            credentials_path,
            reminded_events_path,
            server_id,
            cadence,
            timezone,
            policy,
            max_results,
            run_on_start,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Values from the file named by `CONFIG_PATH`, or nothing if it doesn't exist
pub fn load_config_file() -> RelayResult<HashMap<String, Value>> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    read_config_file(Path::new(&path))
}

/// Marker file location, resolved with the same precedence as [`Config`]
pub fn marker_path_from_sources<F>(file: &HashMap<String, Value>, env: F) -> RelayResult<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(file, &env, "REMINDED_EVENTS_PATH")
        .map(PathBuf::from)
        .ok_or_else(|| RelayError::missing("REMINDED_EVENTS_PATH"))
}

/// Environment first, then the file. Blank values count as unset.
fn lookup<F>(file: &HashMap<String, Value>, env: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    env(key)
        .or_else(|| file.get(key).and_then(value_to_string))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_config_file(path: &Path) -> RelayResult<HashMap<String, Value>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| {
        RelayError::Configuration(format!("Failed to read {}: {e}", path.display()))
    })?;
    let values: HashMap<String, Value> = serde_json::from_str(&contents).map_err(|e| {
        RelayError::Configuration(format!("Invalid JSON in {}: {e}", path.display()))
    })?;
    info!("📄 Loaded config file {}", path.display());
    Ok(values)
}

/// Flatten a JSON value into the string form the environment would carry
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_to_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
        _ => None,
    }
}

fn parse_id(key: &str, raw: &str) -> RelayResult<u64> {
    raw.parse::<u64>()
        .map_err(|_| RelayError::Configuration(format!("{key} must be a numeric Discord id, got '{raw}'")))
}

fn parse_bool(key: &str, raw: &str) -> RelayResult<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RelayError::Configuration(format!("{key} must be a boolean, got '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_file() -> HashMap<String, Value> {
        serde_json::from_value(json!({
            "DISCORD_TOKEN": "token",
            "CALENDAR_ID": "team@group.calendar.google.com",
            "CHANNEL_ID": "123456789012345678",
            "CREDENTIALS_PATH": "./config/credentials.json",
            "REMINDED_EVENTS_PATH": "./data/reminded_events.json",
            "SERVER_ID": 987654321,
            "SCHEDULE": "0 0 * * *",
            "TIMEZONE": "UTC"
        }))
        .unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_from_minimal_file() {
        let config = Config::from_sources(&full_file(), no_env).unwrap();

        assert_eq!(config.channel_id, 123456789012345678);
        assert_eq!(config.server_id, 987654321);
        assert_eq!(config.timezone, Tz::UTC);
        assert_eq!(config.max_results, DEFAULT_MAX_RESULTS);
        assert!(config.run_on_start);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.policy, WindowPolicy::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let env = |key: &str| match key {
            "CHANNEL_ID" => Some("42".to_string()),
            "TIMEZONE" => Some("Asia/Taipei".to_string()),
            "REMINDER_POLICY" => Some("periodic".to_string()),
            _ => None,
        };
        let config = Config::from_sources(&full_file(), env).unwrap();

        assert_eq!(config.channel_id, 42);
        assert_eq!(config.timezone, chrono_tz::Asia::Taipei);
        assert!(matches!(config.policy, WindowPolicy::PeriodicDecay(_)));
    }

    #[test]
    fn test_missing_required_field_is_configuration_error() {
        let mut file = full_file();
        file.remove("SERVER_ID");

        let err = Config::from_sources(&file, no_env).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("SERVER_ID"));
    }

    #[test]
    fn test_schedule_and_timezone_are_required() {
        for key in ["SCHEDULE", "TIMEZONE"] {
            let mut file = full_file();
            file.remove(key);

            let err = Config::from_sources(&file, no_env).unwrap_err();
            assert!(err.is_fatal());
            assert!(err.to_string().contains(key), "{key}: {err}");
        }
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let env = |key: &str| (key == "CALENDAR_ID").then(|| "  ".to_string());
        let err = Config::from_sources(&full_file(), env).unwrap_err();
        assert!(err.to_string().contains("CALENDAR_ID"));
    }

    #[test]
    fn test_rejects_non_numeric_channel() {
        let env = |key: &str| (key == "CHANNEL_ID").then(|| "general".to_string());
        assert!(Config::from_sources(&full_file(), env).is_err());
    }

    #[test]
    fn test_rejects_unknown_timezone() {
        let env = |key: &str| (key == "TIMEZONE").then(|| "Mars/Olympus".to_string());
        assert!(Config::from_sources(&full_file(), env).is_err());
    }

    #[test]
    fn test_rejects_bad_schedule() {
        let env = |key: &str| (key == "SCHEDULE").then(|| "every day".to_string());
        assert!(Config::from_sources(&full_file(), env).is_err());
    }

    #[test]
    fn test_offsets_array_in_file() {
        let mut file = full_file();
        file.insert("REMINDER_OFFSETS".to_string(), json!([14, 7, 1]));

        let config = Config::from_sources(&file, no_env).unwrap();
        assert_eq!(config.policy, WindowPolicy::discrete([14, 7, 1]));
    }

    #[test]
    fn test_periodic_horizons_from_env() {
        let env = |key: &str| match key {
            "REMINDER_POLICY" => Some("periodic".to_string()),
            "REMINDER_PERIODIC" => Some("28/7,10/5".to_string()),
            _ => None,
        };
        let config = Config::from_sources(&full_file(), env).unwrap();
        assert_eq!(config.policy.offset_for(10), Some(10));
        assert_eq!(config.policy.offset_for(8), None);
        assert_eq!(config.policy.offset_for(28), Some(28));
    }

    #[test]
    fn test_marker_path_lookup() {
        let path = marker_path_from_sources(&full_file(), no_env).unwrap();
        assert_eq!(path, PathBuf::from("./data/reminded_events.json"));

        let env = |key: &str| (key == "REMINDED_EVENTS_PATH").then(|| "/var/lib/relay/m.json".to_string());
        let path = marker_path_from_sources(&full_file(), env).unwrap();
        assert_eq!(path, PathBuf::from("/var/lib/relay/m.json"));

        let err = marker_path_from_sources(&HashMap::new(), no_env).unwrap_err();
        assert!(err.to_string().contains("REMINDED_EVENTS_PATH"));
    }

    #[test]
    fn test_config_file_is_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"REMINDED_EVENTS_PATH": "./data/team.json", "SERVER_ID": 7}"#).unwrap();

        let file = read_config_file(&path).unwrap();
        assert_eq!(
            marker_path_from_sources(&file, no_env).unwrap(),
            PathBuf::from("./data/team.json")
        );
        assert!(read_config_file(&dir.path().join("absent.json")).unwrap().is_empty());
    }

    #[test]
    fn test_run_on_start_flag() {
        let env = |key: &str| (key == "RUN_ON_START").then(|| "off".to_string());
        let config = Config::from_sources(&full_file(), env).unwrap();
        assert!(!config.run_on_start);

        let env = |key: &str| (key == "RUN_ON_START").then(|| "maybe".to_string());
        assert!(Config::from_sources(&full_file(), env).is_err());
    }
}
