//! Student directory: the roster sampled by the live feed and the
//! credential table consulted by login.
//!
//! The demo directory is embedded at compile time from
//! `contrib/roster.toml`. Any other TOML file with the same layout can be
//! loaded in its place.

use crate::types::StudentProfile;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

const DEMO_ROSTER: &str = include_str!("../../../contrib/roster.toml");

static DEMO_DIRECTORY: OnceLock<Directory> = OnceLock::new();

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("failed to read roster file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("bad roster TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("roster has no students")]
    Empty,
}

/// Population of students the detection pipeline samples from.
pub trait Roster {
    fn students(&self) -> &[StudentProfile];
}

/// Credential lookup by enrollment id.
pub trait IdentityStore {
    fn lookup(&self, enrollment_id: &str) -> Option<&Credential>;
}

/// A stored login credential and the profile it unlocks.
#[derive(Debug, Clone)]
pub struct Credential {
    pub password: String,
    pub profile: StudentProfile,
}

/// Top-level roster file structure.
#[derive(Debug, Deserialize)]
struct RosterFile {
    student: Vec<StudentEntry>,
}

/// One `[[student]]` table.
#[derive(Debug, Deserialize)]
struct StudentEntry {
    name: String,
    enrollment_id: String,
    password: String,
    branch: String,
    #[serde(default)]
    photo: String,
    year: String,
    department: String,
}

/// In-memory directory backing both [`Roster`] and [`IdentityStore`].
#[derive(Debug, Clone)]
pub struct Directory {
    profiles: Vec<StudentProfile>,
    credentials: Vec<Credential>,
}

impl Directory {
    /// Parse a directory from roster TOML.
    pub fn from_toml_str(src: &str) -> Result<Self, RosterError> {
        let file: RosterFile = toml::from_str(src)?;
        if file.student.is_empty() {
            return Err(RosterError::Empty);
        }

        let credentials: Vec<Credential> = file
            .student
            .into_iter()
            .map(|s| Credential {
                password: s.password,
                profile: StudentProfile {
                    name: s.name,
                    enrollment_id: s.enrollment_id,
                    branch: s.branch,
                    photo: s.photo,
                    year: s.year,
                    department: s.department,
                },
            })
            .collect();
        let profiles = credentials.iter().map(|c| c.profile.clone()).collect();

        Ok(Self {
            profiles,
            credentials,
        })
    }

    /// Read and parse a roster file from disk.
    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let src = std::fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let dir = Self::from_toml_str(&src)?;
        tracing::info!(path = %path.display(), students = dir.profiles.len(), "roster loaded");
        Ok(dir)
    }

    /// The embedded four-student demo directory.
    pub fn demo() -> &'static Directory {
        DEMO_DIRECTORY.get_or_init(|| match Self::from_toml_str(DEMO_ROSTER) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::error!(error = %e, "embedded roster is invalid");
                Self {
                    profiles: Vec::new(),
                    credentials: Vec::new(),
                }
            }
        })
    }

    /// Profile for an enrollment id, if enrolled.
    pub fn profile(&self, enrollment_id: &str) -> Option<&StudentProfile> {
        self.profiles
            .iter()
            .find(|p| p.enrollment_id == enrollment_id)
    }
}

impl Roster for Directory {
    fn students(&self) -> &[StudentProfile] {
        &self.profiles
    }
}

impl IdentityStore for Directory {
    fn lookup(&self, enrollment_id: &str) -> Option<&Credential> {
        self.credentials
            .iter()
            .find(|c| c.profile.enrollment_id == enrollment_id)
    }
}

impl Roster for Vec<StudentProfile> {
    fn students(&self) -> &[StudentProfile] {
        self
    }
}
