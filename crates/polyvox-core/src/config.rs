//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MODEL_ENDPOINT: &str = "http://127.0.0.1:8000";

/// Configuration for the model backend and generated output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the model worker
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-call model timeout
    #[serde(default = "default_request_timeout", with = "duration_secs")]
    pub request_timeout: Duration,

    /// Directory generated audio is written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_endpoint() -> String {
    DEFAULT_MODEL_ENDPOINT.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("polyvox")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout: default_request_timeout(),
            output_dir: default_output_dir(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `POLYVOX_MODEL_ENDPOINT`, `POLYVOX_MODEL_TIMEOUT_SECS`
    /// and `POLYVOX_OUTPUT_DIR`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("POLYVOX_MODEL_ENDPOINT") {
            let endpoint = raw.trim();
            if endpoint.is_empty() {
                warn!("Empty POLYVOX_MODEL_ENDPOINT, using {}", config.endpoint);
            } else {
                config.endpoint = endpoint.trim_end_matches('/').to_string();
            }
        }

        if let Ok(raw) = std::env::var("POLYVOX_MODEL_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => warn!(
                    "Invalid POLYVOX_MODEL_TIMEOUT_SECS='{}', using {}s",
                    raw,
                    config.request_timeout.as_secs()
                ),
            }
        }

        if let Some(dir) = std::env::var_os("POLYVOX_OUTPUT_DIR") {
            if !dir.is_empty() {
                config.output_dir = PathBuf::from(dir);
            }
        }

        config
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .expect("environment lock poisoned")
    }

    fn clear_env() {
        std::env::remove_var("POLYVOX_MODEL_ENDPOINT");
        std::env::remove_var("POLYVOX_MODEL_TIMEOUT_SECS");
        std::env::remove_var("POLYVOX_OUTPUT_DIR");
    }

    #[test]
    fn environment_overrides_defaults() {
        let _guard = env_lock();
        clear_env();
        std::env::set_var("POLYVOX_MODEL_ENDPOINT", "http://gpu-box:9000/");
        std::env::set_var("POLYVOX_MODEL_TIMEOUT_SECS", "42");
        std::env::set_var("POLYVOX_OUTPUT_DIR", "/tmp/polyvox-test-out");

        let config = EngineConfig::from_env();
        assert_eq!(config.endpoint, "http://gpu-box:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(42));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/polyvox-test-out"));
        clear_env();
    }

    #[test]
    fn invalid_values_fall_back() {
        let _guard = env_lock();
        clear_env();
        std::env::set_var("POLYVOX_MODEL_ENDPOINT", "   ");
        std::env::set_var("POLYVOX_MODEL_TIMEOUT_SECS", "soon");

        let config = EngineConfig::from_env();
        assert_eq!(config.endpoint, DEFAULT_MODEL_ENDPOINT);
        assert_eq!(config.request_timeout, Duration::from_secs(300));
        clear_env();
    }

    #[test]
    fn partial_config_uses_field_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"request_timeout": 10}"#).expect("config should parse");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.endpoint, DEFAULT_MODEL_ENDPOINT);
    }
}
