//! Mock face classification.
//!
//! There is no model here: one uniform sample picks the branch, and for a
//! recognized face two more pick the student and the reported confidence.

use crate::roster::Roster;
use crate::types::{DetectionState, StudentProfile};
use rand::Rng;

// --- Named constants ---
const DETECTED_BELOW: f64 = 0.6;
const UNKNOWN_BELOW: f64 = 0.9;
const CONFIDENCE_MIN: f64 = 85.0;
const CONFIDENCE_SPAN: f64 = 10.0;

/// Source of uniform samples in `[0, 1)`.
pub trait Draw {
    fn unit(&mut self) -> f64;
}

/// [`Draw`] backed by any `rand` generator.
pub struct RngDraw<R>(pub R);

impl<R: Rng> Draw for RngDraw<R> {
    fn unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Branch probabilities as cumulative cut points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branching {
    /// Samples below this are recognized students.
    pub detected_below: f64,
    /// Samples in `[detected_below, unknown_below)` are unknown faces; the rest are spoofs.
    pub unknown_below: f64,
}

impl Default for Branching {
    fn default() -> Self {
        Self {
            detected_below: DETECTED_BELOW,
            unknown_below: UNKNOWN_BELOW,
        }
    }
}

/// Result of one simulated detection.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    Detected {
        student: StudentProfile,
        /// Whole percent in `[85, 95]`.
        confidence: u8,
    },
    Unknown,
    Spoof,
}

impl DetectionOutcome {
    /// Detection state displayed while this outcome is current.
    pub fn state(&self) -> DetectionState {
        match self {
            DetectionOutcome::Detected {
                student,
                confidence,
            } => DetectionState::Detected {
                student: student.clone(),
                confidence: *confidence,
            },
            DetectionOutcome::Unknown => DetectionState::Unknown,
            DetectionOutcome::Spoof => DetectionState::Spoof,
        }
    }
}

/// Classify one simulated face.
///
/// An empty roster cannot produce a recognized student, so that branch
/// degrades to [`DetectionOutcome::Unknown`].
pub fn classify<D, R>(draw: &mut D, roster: &R, branching: Branching) -> DetectionOutcome
where
    D: Draw + ?Sized,
    R: Roster + ?Sized,
{
    let x = draw.unit();

    if x < branching.detected_below {
        let students = roster.students();
        if students.is_empty() {
            tracing::warn!("roster is empty; reporting unknown face");
            return DetectionOutcome::Unknown;
        }
        let idx = ((draw.unit() * students.len() as f64) as usize).min(students.len() - 1);
        let confidence = (CONFIDENCE_MIN + draw.unit() * CONFIDENCE_SPAN)
            .round()
            .clamp(CONFIDENCE_MIN, CONFIDENCE_MIN + CONFIDENCE_SPAN) as u8;
        DetectionOutcome::Detected {
            student: students[idx].clone(),
            confidence,
        }
    } else if x < branching.unknown_below {
        DetectionOutcome::Unknown
    } else {
        DetectionOutcome::Spoof
    }
}
