// Invariant Framework
//
// Invariants are pure rules over the whole record set that must hold
// before and after every store operation.

use std::collections::HashSet;

use crate::transcript::{Grade, StudentId, Transcript};

/// Read-only view of the store handed to each invariant.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    /// Live transcripts in creation order.
    pub transcripts: &'a [&'a Transcript],

    /// Highest id ever issued, if any.
    pub last_issued: Option<StudentId>,
}

/// Result of invariant evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantResult {
    Pass,
    Fail(String),
}

/// Trait implemented by all invariants.
///
/// Invariants must be:
/// - Pure
/// - Deterministic
/// - Side-effect free
pub trait Invariant: Send + Sync {
    fn name(&self) -> &'static str;

    fn validate(&self, snapshot: &Snapshot<'_>) -> InvariantResult;
}

/// Invariant engine that evaluates a set of invariants.
#[derive(Default)]
pub struct InvariantEngine {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantEngine {
    /// Create an engine with no invariants registered.
    pub fn new() -> Self {
        Self {
            invariants: Vec::new(),
        }
    }

    /// Engine preloaded with the data-model invariants.
    pub fn standard() -> Self {
        let mut engine = Self::new();
        engine.register(UniqueStudentIds);
        engine.register(IdsNeverReissued);
        engine.register(UniqueCoursePerTranscript);
        engine.register(GradesInRange);
        engine
    }

    /// Register an invariant.
    pub fn register<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Evaluate all invariants.
    ///
    /// Stops at the first failure.
    pub fn evaluate(&self, snapshot: &Snapshot<'_>) -> Result<(), InvariantViolation> {
        for invariant in &self.invariants {
            match invariant.validate(snapshot) {
                InvariantResult::Pass => continue,
                InvariantResult::Fail(reason) => {
                    return Err(InvariantViolation {
                        invariant: invariant.name(),
                        reason,
                    })
                }
            }
        }
        Ok(())
    }
}

/// Returned when an invariant is violated.
#[derive(Debug, thiserror::Error)]
#[error("invariant `{invariant}` violated: {reason}")]
pub struct InvariantViolation {
    pub invariant: &'static str,
    pub reason: String,
}

/// No two live transcripts share an id.
pub struct UniqueStudentIds;

impl Invariant for UniqueStudentIds {
    fn name(&self) -> &'static str {
        "unique-student-ids"
    }

    fn validate(&self, snapshot: &Snapshot<'_>) -> InvariantResult {
        let mut seen = HashSet::new();
        for t in snapshot.transcripts {
            if !seen.insert(t.id()) {
                return InvariantResult::Fail(format!("student id {} appears twice", t.id()));
            }
        }
        InvariantResult::Pass
    }
}

/// Live ids are strictly increasing in creation order and never above the
/// highest id issued.
pub struct IdsNeverReissued;

impl Invariant for IdsNeverReissued {
    fn name(&self) -> &'static str {
        "ids-never-reissued"
    }

    fn validate(&self, snapshot: &Snapshot<'_>) -> InvariantResult {
        let mut previous: Option<StudentId> = None;
        for t in snapshot.transcripts {
            if previous.is_some_and(|p| p >= t.id()) {
                return InvariantResult::Fail(format!(
                    "student id {} is out of creation order",
                    t.id()
                ));
            }
            if snapshot.last_issued.map_or(true, |last| t.id() > last) {
                return InvariantResult::Fail(format!(
                    "student id {} was never issued",
                    t.id()
                ));
            }
            previous = Some(t.id());
        }
        InvariantResult::Pass
    }
}

/// A transcript holds at most one grade per course.
pub struct UniqueCoursePerTranscript;

impl Invariant for UniqueCoursePerTranscript {
    fn name(&self) -> &'static str {
        "unique-course-per-transcript"
    }

    fn validate(&self, snapshot: &Snapshot<'_>) -> InvariantResult {
        for t in snapshot.transcripts {
            let mut courses = HashSet::new();
            for g in &t.grades {
                if !courses.insert(g.course.as_str()) {
                    return InvariantResult::Fail(format!(
                        "student {} has two grades for `{}`",
                        t.id(),
                        g.course
                    ));
                }
            }
        }
        InvariantResult::Pass
    }
}

/// Every recorded grade is at most [`Grade::MAX`].
pub struct GradesInRange;

impl Invariant for GradesInRange {
    fn name(&self) -> &'static str {
        "grades-in-range"
    }

    fn validate(&self, snapshot: &Snapshot<'_>) -> InvariantResult {
        for t in snapshot.transcripts {
            if let Some(g) = t.grades.iter().find(|g| g.grade.value() > Grade::MAX) {
                return InvariantResult::Fail(format!(
                    "student {} has grade {} for `{}`",
                    t.id(),
                    g.grade,
                    g.course
                ));
            }
        }
        InvariantResult::Pass
    }
}
