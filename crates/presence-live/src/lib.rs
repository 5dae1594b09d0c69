//! presence-live: Async runtime for the attendance demo.
//!
//! Hosts the simulated detection pipeline as a tokio task, the mock login
//! and registration services, and configuration loading.

pub mod config;
pub mod pipeline;
pub mod services;

pub use config::{Config, ConfigError};
pub use pipeline::{
    spawn_pipeline, PipelineError, PipelineEvent, PipelineHandle, PipelineSettings, Snapshot,
};
pub use services::{LoginService, RegistrationService};
