// src/config.rs
use crate::error::ConfigError;
use boa_engine::vm::RuntimeLimits;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Engine and loader settings. Every field has a default, so an empty TOML
/// document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum iterations of a single script loop. `None` keeps the engine default.
    pub loop_iteration_limit: Option<u64>,
    /// Maximum script call depth. `None` keeps the engine default.
    pub recursion_limit: Option<usize>,
    /// Maximum VM stack size. `None` keeps the engine default.
    pub stack_size_limit: Option<usize>,
    /// Stack size of the dedicated engine thread, in bytes.
    pub thread_stack_size: usize,
    /// Timeout applied when downloading a PAC script.
    pub download_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            loop_iteration_limit: None,
            recursion_limit: None,
            stack_size_limit: None,
            thread_stack_size: 8 * 1024 * 1024,
            download_timeout_secs: 15,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Engine limits with the configured overrides applied.
    pub fn runtime_limits(&self) -> RuntimeLimits {
        let mut limits = RuntimeLimits::default();
        if let Some(limit) = self.loop_iteration_limit {
            limits.set_loop_iteration_limit(limit);
        }
        if let Some(limit) = self.recursion_limit {
            limits.set_recursion_limit(limit);
        }
        if let Some(limit) = self.stack_size_limit {
            limits.set_stack_size_limit(limit);
        }
        limits
    }
}
