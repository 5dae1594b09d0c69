//! In-memory attendance log, newest first.

use crate::types::{AttendanceRecord, RecordStatus, StudentProfile};
use rand::Rng;
use serde::Serialize;
use std::collections::VecDeque;

pub const UNKNOWN_NAME: &str = "Unknown Person";
pub const SPOOF_NAME: &str = "Spoof Attempt";
pub const NO_ENROLLMENT: &str = "N/A";

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Who a record is about. The status is derived from this, so a `present`
/// record can only ever carry a real student's identity.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Student(&'a StudentProfile),
    Unknown,
    Spoof,
}

impl Subject<'_> {
    fn identity(&self) -> (&str, &str, RecordStatus) {
        match self {
            Subject::Student(p) => (&p.name, &p.enrollment_id, RecordStatus::Present),
            Subject::Unknown => (UNKNOWN_NAME, NO_ENROLLMENT, RecordStatus::Unknown),
            Subject::Spoof => (SPOOF_NAME, NO_ENROLLMENT, RecordStatus::Spoof),
        }
    }
}

/// Per-status totals, as shown on the live screen badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub present: usize,
    pub unknown: usize,
    pub spoof: usize,
}

/// Unbounded, insertion-ordered log. No dedup, no persistence.
#[derive(Debug, Default)]
pub struct AttendanceLog {
    records: VecDeque<AttendanceRecord>,
    counter: u64,
}

impl AttendanceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record for `subject` and put it at the front of the log.
    pub fn emit(&mut self, subject: Subject<'_>) -> &AttendanceRecord {
        let (name, enrollment_id, status) = subject.identity();
        let record = AttendanceRecord {
            id: self.next_id(),
            name: name.to_string(),
            enrollment_id: enrollment_id.to_string(),
            timestamp: chrono::Local::now().format("%-I:%M:%S %p").to_string(),
            status,
        };
        tracing::info!(
            id = %record.id,
            name = %record.name,
            enrollment_id = %record.enrollment_id,
            %status,
            "attendance recorded"
        );
        self.records.push_front(record);
        &self.records[0]
    }

    pub fn records(&self) -> impl Iterator<Item = &AttendanceRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for r in &self.records {
            match r.status {
                RecordStatus::Present => counts.present += 1,
                RecordStatus::Unknown => counts.unknown += 1,
                RecordStatus::Spoof => counts.spoof += 1,
            }
        }
        counts
    }

    /// `"{unix_millis}-{counter}-{suffix}"`; unique in practice, not guaranteed.
    fn next_id(&mut self) -> String {
        let counter = self.counter;
        self.counter += 1;
        let mut rng = rand::thread_rng();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        format!(
            "{}-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            counter,
            suffix
        )
    }
}
