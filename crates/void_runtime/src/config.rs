//! Runtime Configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Command line: `void-world <world.json> --frames=120 --step-ms=16 --name=Demo --debug`
//! 2. Environment: `VOID_WORLD`, `VOID_FRAMES`, `VOID_STEP_MS`, `VOID_WORLD_NAME`, `VOID_DEBUG`
//! 3. Config file: `void_world.toml`, or the file named by `VOID_CONFIG`
//! 4. Defaults
//!
//! # Example Config File
//!
//! ```toml
//! world = "worlds/demo.json"
//! frames = 120
//! step_ms = 16
//! name = "Demo"
//! debug = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "void_world.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Everything the runner needs to know before loading a world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// World document to load
    pub world: Option<PathBuf>,
    /// Frames to run before exiting
    pub frames: u32,
    /// Game time added per frame, in milliseconds
    pub step_ms: u64,
    /// Name given to the world before the document is applied
    pub name: String,
    /// Log at debug level unless `RUST_LOG` says otherwise
    pub debug: bool,
    /// File the settings were read from
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
    /// Problems met while resolving, reported once logging is up
    #[serde(skip)]
    pub warnings: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            world: None,
            frames: 60,
            step_ms: 16,
            name: "World".to_string(),
            debug: false,
            config_path: None,
            warnings: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    /// Resolve from the process arguments, environment, and config file
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::resolve(&args, |key| std::env::var(key).ok())
    }

    /// Resolve from explicit sources. `env` looks up one variable.
    pub fn resolve(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let named = env("VOID_CONFIG").map(PathBuf::from);
        let path = named.clone().unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

        let mut config = if path.is_file() {
            match Self::load_from_file(&path) {
                Ok(mut loaded) => {
                    loaded.config_path = Some(path);
                    loaded
                }
                Err(err) => {
                    let mut config = Self::default();
                    config.warnings.push(err.to_string());
                    config
                }
            }
        } else {
            let mut config = Self::default();
            if let Some(named) = named {
                config.warnings.push(format!("config file {:?} not found", named));
            }
            config
        };

        config.apply_env(&env);
        config.apply_args(args);
        config
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) {
        if let Some(world) = env("VOID_WORLD").filter(|w| !w.is_empty()) {
            self.world = Some(PathBuf::from(world));
        }
        if let Some(frames) = env("VOID_FRAMES") {
            self.set_frames(&frames, "VOID_FRAMES");
        }
        if let Some(step) = env("VOID_STEP_MS") {
            self.set_step(&step, "VOID_STEP_MS");
        }
        if let Some(name) = env("VOID_WORLD_NAME").filter(|n| !n.is_empty()) {
            self.name = name;
        }
        if let Some(debug) = env("VOID_DEBUG") {
            self.debug = debug.is_empty() || debug == "1" || debug.eq_ignore_ascii_case("true");
        }
    }

    fn apply_args(&mut self, args: &[String]) {
        let mut positional = false;
        for arg in args {
            if let Some(frames) = arg.strip_prefix("--frames=") {
                self.set_frames(frames, "--frames");
            } else if let Some(step) = arg.strip_prefix("--step-ms=") {
                self.set_step(step, "--step-ms");
            } else if let Some(name) = arg.strip_prefix("--name=") {
                self.name = name.to_string();
            } else if arg == "--debug" {
                self.debug = true;
            } else if arg.starts_with("--") {
                self.warnings.push(format!("unknown option {}", arg));
            } else if !positional {
                self.world = Some(PathBuf::from(arg));
                positional = true;
            } else {
                self.warnings.push(format!("extra argument {} ignored", arg));
            }
        }
    }

    fn set_frames(&mut self, text: &str, source: &str) {
        match text.trim().parse() {
            Ok(frames) => self.frames = frames,
            Err(_) => self.warnings.push(format!("{}: '{}' is not a frame count", source, text)),
        }
    }

    fn set_step(&mut self, text: &str, source: &str) {
        match text.trim().parse() {
            Ok(step) => self.step_ms = step,
            Err(_) => self.warnings.push(format!("{}: '{}' is not a step in milliseconds", source, text)),
        }
    }

    pub fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }

    /// Default `env_logger` filter
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }

    pub fn print_summary(&self) {
        for warning in &self.warnings {
            log::warn!("{}", warning);
        }
        if let Some(path) = &self.config_path {
            log::info!("Config: {}", path.display());
        }
        match &self.world {
            Some(world) => log::info!("World document: {}", world.display()),
            None => log::info!("World document: none"),
        }
        log::info!(
            "Running '{}' for {} frames of {} ms",
            self.name,
            self.frames,
            self.step_ms
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::resolve(&[], env(&[("VOID_CONFIG", "/nonexistent/void.toml")]));
        assert_eq!(config.frames, 60);
        assert_eq!(config.step(), Duration::from_millis(16));
        assert_eq!(config.name, "World");
        assert!(config.world.is_none());
        assert_eq!(config.warnings.len(), 1);
    }

    #[test]
    fn test_args_override_env() {
        let config = RuntimeConfig::resolve(
            &args(&["level.json", "--frames=5", "--name=Arena"]),
            env(&[
                ("VOID_CONFIG", "/nonexistent/void.toml"),
                ("VOID_WORLD", "other.json"),
                ("VOID_FRAMES", "30"),
                ("VOID_STEP_MS", "8"),
            ]),
        );
        assert_eq!(config.world, Some(PathBuf::from("level.json")));
        assert_eq!(config.frames, 5);
        assert_eq!(config.step_ms, 8);
        assert_eq!(config.name, "Arena");
    }

    #[test]
    fn test_bad_values_warn_and_keep() {
        let config = RuntimeConfig::resolve(
            &args(&["--frames=lots", "--wat"]),
            env(&[("VOID_CONFIG", "/nonexistent/void.toml"), ("VOID_DEBUG", "1")]),
        );
        assert_eq!(config.frames, 60);
        assert!(config.debug);
        assert_eq!(config.log_filter(), "debug");
        assert_eq!(config.warnings.len(), 3);
    }

    #[test]
    fn test_toml_file() {
        let path = std::env::temp_dir().join(format!("void_world_{}.toml", std::process::id()));
        std::fs::write(&path, "world = \"demo.json\"\nframes = 3\n").unwrap();

        let config = RuntimeConfig::resolve(&[], env(&[("VOID_CONFIG", path.to_str().unwrap())]));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.world, Some(PathBuf::from("demo.json")));
        assert_eq!(config.frames, 3);
        assert_eq!(config.step_ms, 16);
        assert_eq!(config.config_path, Some(path));
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            RuntimeConfig::from_toml("frames = \"many\""),
            Err(ConfigError::Toml(_))
        ));
    }
}
