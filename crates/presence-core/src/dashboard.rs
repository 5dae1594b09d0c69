//! Admin and student dashboards over fixed demo figures.

use crate::types::{ParseError, StudentProfile};
use serde::Serialize;
use std::str::FromStr;

pub const EXPORT_ACK: &str = "Attendance data exported to Excel successfully!";

/// Headline cards of the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct HeadlineStats {
    pub total_students: u32,
    pub new_this_week: u32,
    pub today_rate: f32,
    pub today_present: u32,
    pub weekly_average: f32,
    pub weekly_delta: f32,
    pub security_alerts: u32,
}

pub const HEADLINE: HeadlineStats = HeadlineStats {
    total_students: 147,
    new_this_week: 5,
    today_rate: 92.5,
    today_present: 136,
    weekly_average: 90.8,
    weekly_delta: -1.2,
    security_alerts: 3,
};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DailyAttendance {
    pub day: &'static str,
    pub present: u32,
    pub absent: u32,
}

const fn daily(day: &'static str, present: u32, absent: u32) -> DailyAttendance {
    DailyAttendance {
        day,
        present,
        absent,
    }
}

pub const DAILY: [DailyAttendance; 5] = [
    daily("Mon", 45, 5),
    daily("Tue", 48, 2),
    daily("Wed", 42, 8),
    daily("Thu", 47, 3),
    daily("Fri", 44, 6),
];

/// Share of students per branch, in percent.
pub const BRANCH_SHARE: [(&str, u32); 4] = [("CSE", 35), ("ECE", 28), ("ME", 20), ("CE", 17)];

pub const ADMIN_WEEKLY_TREND: [(&str, u32); 4] = [
    ("Week 1", 92),
    ("Week 2", 89),
    ("Week 3", 94),
    ("Week 4", 88),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PresenceStatus {
    Present,
    Absent,
}

impl FromStr for PresenceStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            other => Err(ParseError::UnknownStatus(other.to_string())),
        }
    }
}

/// One row of the admin student table.
#[derive(Debug, Clone, Serialize)]
pub struct StudentRow {
    pub id: u32,
    pub name: &'static str,
    pub enrollment_id: &'static str,
    pub branch: &'static str,
    pub attendance: &'static str,
    pub last_seen: &'static str,
    pub status: PresenceStatus,
}

pub const STUDENT_TABLE: [StudentRow; 4] = [
    StudentRow {
        id: 1,
        name: "Yashvi Mashru",
        enrollment_id: "CS2021001",
        branch: "CSE",
        attendance: "95%",
        last_seen: "2025-01-15 10:30 AM",
        status: PresenceStatus::Present,
    },
    StudentRow {
        id: 2,
        name: "Drishti Butani",
        enrollment_id: "CS2021002",
        branch: "CSE",
        attendance: "92%",
        last_seen: "2025-01-15 10:25 AM",
        status: PresenceStatus::Present,
    },
    StudentRow {
        id: 3,
        name: "Hitakshi Boghani",
        enrollment_id: "CS2021003",
        branch: "CSE",
        attendance: "97%",
        last_seen: "2025-01-15 10:20 AM",
        status: PresenceStatus::Present,
    },
    StudentRow {
        id: 4,
        name: "Vranda Mehta",
        enrollment_id: "CS2021004",
        branch: "ECE",
        attendance: "88%",
        last_seen: "2025-01-14 02:15 PM",
        status: PresenceStatus::Absent,
    },
];

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Anomaly {
    pub id: u32,
    pub kind: &'static str,
    pub timestamp: &'static str,
    pub description: &'static str,
    pub severity: &'static str,
}

pub const ANOMALIES: [Anomaly; 3] = [
    Anomaly {
        id: 1,
        kind: "Spoof Attempt",
        timestamp: "2025-01-15 10:45 AM",
        description: "Photo spoofing detected",
        severity: "High",
    },
    Anomaly {
        id: 2,
        kind: "Multiple Faces",
        timestamp: "2025-01-15 09:30 AM",
        description: "Multiple faces in frame",
        severity: "Medium",
    },
    Anomaly {
        id: 3,
        kind: "Unknown Person",
        timestamp: "2025-01-15 08:15 AM",
        description: "Unregistered face detected",
        severity: "Low",
    },
];

/// Table filter. `None` means "all".
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub search: String,
    pub branch: Option<String>,
    pub status: Option<PresenceStatus>,
}

impl StudentFilter {
    pub fn matches(&self, row: &StudentRow) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = row.name.to_lowercase().contains(&needle)
            || row.enrollment_id.to_lowercase().contains(&needle);
        let matches_branch = self.branch.as_deref().map_or(true, |b| row.branch == b);
        let matches_status = self.status.map_or(true, |s| row.status == s);
        matches_search && matches_branch && matches_status
    }
}

pub fn filter_students(filter: &StudentFilter) -> Vec<&'static StudentRow> {
    STUDENT_TABLE.iter().filter(|r| filter.matches(r)).collect()
}

/// Color band of an attendance percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Standing {
    Good,
    Warning,
    Critical,
}

impl Standing {
    pub fn of(percentage: u32) -> Self {
        if percentage >= 90 {
            Standing::Good
        } else if percentage >= 75 {
            Standing::Warning
        } else {
            Standing::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HistoryEntry {
    pub date: &'static str,
    pub present: bool,
    pub time: &'static str,
}

const fn history(date: &'static str, present: bool, time: &'static str) -> HistoryEntry {
    HistoryEntry {
        date,
        present,
        time,
    }
}

pub const HISTORY: [HistoryEntry; 6] = [
    history("Jan 10", true, "10:30 AM"),
    history("Jan 11", true, "10:25 AM"),
    history("Jan 12", false, "-"),
    history("Jan 13", true, "10:35 AM"),
    history("Jan 14", true, "10:20 AM"),
    history("Jan 15", true, "10:30 AM"),
];

pub const STUDENT_WEEKLY: [(&str, u32); 4] = [
    ("Week 1", 95),
    ("Week 2", 89),
    ("Week 3", 92),
    ("Week 4", 96),
];

pub const SUBJECTS: [(&str, u32); 4] = [
    ("AI/ML", 95),
    ("Web Dev", 92),
    ("Database", 89),
    ("Networks", 87),
];

/// (month, present, absent)
pub const MONTHLY: [(&str, u32, u32); 5] = [
    ("Sep", 22, 1),
    ("Oct", 20, 3),
    ("Nov", 18, 2),
    ("Dec", 15, 1),
    ("Jan", 12, 1),
];

const TOTAL_CLASSES: u32 = 95;
const ATTENDED_CLASSES: u32 = 87;

/// Everything the student dashboard renders.
#[derive(Debug, Clone, Serialize)]
pub struct StudentSummary {
    pub student: StudentProfile,
    pub total_classes: u32,
    pub attended_classes: u32,
    pub percentage: u32,
    pub standing: Standing,
}

impl StudentSummary {
    /// Summary for `student`, or for `fallback` when nobody is logged in.
    pub fn for_student(student: Option<&StudentProfile>, fallback: &StudentProfile) -> Self {
        let percentage =
            ((ATTENDED_CLASSES as f64 / TOTAL_CLASSES as f64) * 100.0).round() as u32;
        Self {
            student: student.unwrap_or(fallback).clone(),
            total_classes: TOTAL_CLASSES,
            attended_classes: ATTENDED_CLASSES,
            percentage,
            standing: Standing::of(percentage),
        }
    }
}
