//! Worker configuration, read from the environment with code defaults.

use std::path::PathBuf;

const DEFAULT_EXPORT_DIR: &str = "./exports";
const DEFAULT_LEASE_TTL_SECS: i64 = 600;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Runtime configuration for the export worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root directory of the local archive store.
    pub export_dir: PathBuf,
    /// Processing-lease time to live in seconds.
    pub lease_ttl_secs: i64,
    /// Lease holder identity, unique per worker process.
    pub holder: String,
    /// Attempts per task before it is dropped.
    pub max_attempts: u32,
}

impl WorkerConfig {
    /// Builds the configuration from `TERMREG_*` environment variables,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let export_dir = std::env::var("TERMREG_EXPORT_DIR")
            .unwrap_or_else(|_| DEFAULT_EXPORT_DIR.to_string())
            .into();
        let lease_ttl_secs = std::env::var("TERMREG_LEASE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LEASE_TTL_SECS);
        let max_attempts = std::env::var("TERMREG_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let holder = format!("termreg-worker-{}", std::process::id());

        Self { export_dir, lease_ttl_secs, holder, max_attempts }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            export_dir: DEFAULT_EXPORT_DIR.into(),
            lease_ttl_secs: DEFAULT_LEASE_TTL_SECS,
            holder: "termreg-worker".to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}
