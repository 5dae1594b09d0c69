//! presence-core: Session routing and mock attendance logic.
//!
//! Everything here is synchronous and deterministic given its inputs:
//! randomness comes in through [`detection::Draw`] and time through explicit
//! `Instant` arguments.

pub mod auth;
pub mod dashboard;
pub mod detection;
pub mod log;
pub mod navigation;
pub mod registration;
pub mod roster;
pub mod types;

pub use auth::{LoginError, LoginGate, LockoutPolicy};
pub use detection::{classify, Branching, DetectionOutcome, Draw, RngDraw};
pub use log::{AttendanceLog, StatusCounts, Subject};
pub use navigation::Session;
pub use roster::{Credential, Directory, IdentityStore, Roster, RosterError};
pub use types::{
    AttendanceRecord, DetectionState, LivenessState, Page, RecordStatus, Role, StudentProfile,
};
