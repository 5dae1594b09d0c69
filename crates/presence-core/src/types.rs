use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Role chosen on the user-selection screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Admin,
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Role::Admin => "admin",
            Role::Student => "student",
        })
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "student" => Ok(Role::Student),
            other => Err(ParseError::UnknownRole(other.to_string())),
        }
    }
}

/// Screen identifier. `Dashboard` and `Register` double as role-dependent intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    UserSelect,
    Home,
    Register,
    StudentRegister,
    AdminRegister,
    StudentLogin,
    Attendance,
    Dashboard,
    StudentDashboard,
}

impl Page {
    pub const ALL: [Page; 9] = [
        Page::UserSelect,
        Page::Home,
        Page::Register,
        Page::StudentRegister,
        Page::AdminRegister,
        Page::StudentLogin,
        Page::Attendance,
        Page::Dashboard,
        Page::StudentDashboard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::UserSelect => "user-select",
            Page::Home => "home",
            Page::Register => "register",
            Page::StudentRegister => "student-register",
            Page::AdminRegister => "admin-register",
            Page::StudentLogin => "student-login",
            Page::Attendance => "attendance",
            Page::Dashboard => "dashboard",
            Page::StudentDashboard => "student-dashboard",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Page {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Page::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or(ParseError::UnknownPage(wanted))
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown role: {0} (expected admin or student)")]
    UnknownRole(String),
    #[error("unknown page: {0}")]
    UnknownPage(String),
    #[error("unknown status filter: {0}")]
    UnknownStatus(String),
}

/// Profile of an enrolled student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub name: String,
    pub enrollment_id: String,
    pub branch: String,
    /// Photo reference (asset path or URL), rendered by the presentation layer.
    pub photo: String,
    pub year: String,
    pub department: String,
}

/// Outcome recorded for a single detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Present,
    Unknown,
    Spoof,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            RecordStatus::Present => "present",
            RecordStatus::Unknown => "unknown",
            RecordStatus::Spoof => "spoof",
        })
    }
}

/// One line of the live attendance log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub name: String,
    pub enrollment_id: String,
    /// Local capture time, e.g. `10:30:15 AM`.
    pub timestamp: String,
    pub status: RecordStatus,
}

/// Detection state shown over the camera feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DetectionState {
    Idle,
    Scanning,
    Detected {
        student: StudentProfile,
        confidence: u8,
    },
    Unknown,
    Spoof,
}

impl DetectionState {
    pub fn label(&self) -> &'static str {
        match self {
            DetectionState::Idle => "idle",
            DetectionState::Scanning => "scanning",
            DetectionState::Detected { .. } => "detected",
            DetectionState::Unknown => "unknown",
            DetectionState::Spoof => "spoof",
        }
    }
}

/// Progress of the scripted anti-spoofing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivenessState {
    Pending,
    Blink,
    Smile,
    Passed,
    Failed,
}

impl fmt::Display for LivenessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            LivenessState::Pending => "pending",
            LivenessState::Blink => "blink",
            LivenessState::Smile => "smile",
            LivenessState::Passed => "passed",
            LivenessState::Failed => "failed",
        })
    }
}
