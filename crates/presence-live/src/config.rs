use crate::pipeline::PipelineSettings;
use presence_core::{Branching, Directory, LockoutPolicy, RosterError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("bad config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Runtime configuration. Every key is optional in TOML and in the
/// environment; unset keys keep the demo's stock timings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Period between detection ticks while the camera is on.
    pub tick_interval_ms: u64,
    /// Time spent "scanning" before the outcome is drawn.
    pub scan_delay_ms: u64,
    /// Liveness: blink prompt duration before the smile prompt.
    pub blink_hold_ms: u64,
    /// Liveness: smile prompt duration before the check passes.
    pub smile_hold_ms: u64,
    /// Delay from outcome to the return to idle.
    pub reset_delay_ms: u64,
    /// Samples below this are recognized students.
    pub detected_below: f64,
    /// Samples below this (and not detected) are unknown faces; the rest are spoofs.
    pub unknown_below: f64,
    /// Artificial latency of the mock login.
    pub login_delay_ms: u64,
    /// Failed logins before the form locks.
    pub max_login_attempts: u32,
    /// How long the login form stays locked.
    pub lockout_secs: u64,
    /// Artificial latency of a registration submit.
    pub registration_delay_ms: u64,
    /// How long the student registration success screen stays up.
    pub registration_hold_ms: u64,
    /// Abort in-flight cycle timers when the camera is switched off.
    pub cancel_pending_on_stop: bool,
    /// Roster TOML replacing the embedded demo roster.
    pub roster_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: 3000,
            scan_delay_ms: 2000,
            blink_hold_ms: 2000,
            smile_hold_ms: 1500,
            reset_delay_ms: 4000,
            detected_below: 0.6,
            unknown_below: 0.9,
            login_delay_ms: 1500,
            max_login_attempts: 3,
            lockout_secs: 300,
            registration_delay_ms: 2000,
            registration_hold_ms: 3000,
            cancel_pending_on_stop: false,
            roster_path: None,
        }
    }
}

impl Config {
    /// Load configuration from `PRESENCE_*` environment variables with defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides().validated()
    }

    /// Load configuration from a TOML file; missing keys take defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&src)?;
        tracing::info!(path = %path.display(), "config loaded");
        config.validated()
    }

    /// Reject settings the pipeline or login gate cannot run with.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be greater than zero".into(),
            ));
        }
        let cuts = 0.0 <= self.detected_below
            && self.detected_below <= self.unknown_below
            && self.unknown_below <= 1.0;
        if !cuts {
            return Err(ConfigError::Invalid(format!(
                "need 0 <= detected_below ({}) <= unknown_below ({}) <= 1",
                self.detected_below, self.unknown_below
            )));
        }
        if self.max_login_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_login_attempts must be at least 1".into(),
            ));
        }
        Ok(self)
    }

    /// Apply any `PRESENCE_*` environment variables on top of `self`.
    pub fn with_env_overrides(self) -> Self {
        Self {
            tick_interval_ms: env_or("PRESENCE_TICK_INTERVAL_MS", self.tick_interval_ms),
            scan_delay_ms: env_or("PRESENCE_SCAN_DELAY_MS", self.scan_delay_ms),
            blink_hold_ms: env_or("PRESENCE_BLINK_HOLD_MS", self.blink_hold_ms),
            smile_hold_ms: env_or("PRESENCE_SMILE_HOLD_MS", self.smile_hold_ms),
            reset_delay_ms: env_or("PRESENCE_RESET_DELAY_MS", self.reset_delay_ms),
            detected_below: env_or("PRESENCE_DETECTED_BELOW", self.detected_below),
            unknown_below: env_or("PRESENCE_UNKNOWN_BELOW", self.unknown_below),
            login_delay_ms: env_or("PRESENCE_LOGIN_DELAY_MS", self.login_delay_ms),
            max_login_attempts: env_or("PRESENCE_MAX_LOGIN_ATTEMPTS", self.max_login_attempts),
            lockout_secs: env_or("PRESENCE_LOCKOUT_SECS", self.lockout_secs),
            registration_delay_ms: env_or(
                "PRESENCE_REGISTRATION_DELAY_MS",
                self.registration_delay_ms,
            ),
            registration_hold_ms: env_or(
                "PRESENCE_REGISTRATION_HOLD_MS",
                self.registration_hold_ms,
            ),
            cancel_pending_on_stop: std::env::var("PRESENCE_CANCEL_PENDING_ON_STOP")
                .map(|v| v != "0")
                .unwrap_or(self.cancel_pending_on_stop),
            roster_path: std::env::var("PRESENCE_ROSTER")
                .map(PathBuf::from)
                .ok()
                .or(self.roster_path),
        }
    }

    /// Timings and branch cut points for the live pipeline.
    pub fn pipeline(&self) -> PipelineSettings {
        PipelineSettings {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            scan_delay: Duration::from_millis(self.scan_delay_ms),
            blink_hold: Duration::from_millis(self.blink_hold_ms),
            smile_hold: Duration::from_millis(self.smile_hold_ms),
            reset_delay: Duration::from_millis(self.reset_delay_ms),
            branching: Branching {
                detected_below: self.detected_below,
                unknown_below: self.unknown_below,
            },
            cancel_pending_on_stop: self.cancel_pending_on_stop,
        }
    }

    pub fn lockout(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_attempts: self.max_login_attempts,
            cooldown: Duration::from_secs(self.lockout_secs),
        }
    }

    pub fn login_delay(&self) -> Duration {
        Duration::from_millis(self.login_delay_ms)
    }

    pub fn registration_delay(&self) -> Duration {
        Duration::from_millis(self.registration_delay_ms)
    }

    pub fn registration_hold(&self) -> Duration {
        Duration::from_millis(self.registration_hold_ms)
    }

    /// The configured roster, or the embedded demo roster.
    pub fn directory(&self) -> Result<Directory, RosterError> {
        match &self.roster_path {
            Some(path) => Directory::load(path),
            None => Ok(Directory::demo().clone()),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
