// Transcript Store
//
// Authoritative in-memory set of transcripts. Every mutation is checked
// in full before any state changes, so a failed call leaves the store
// exactly as it was.

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::invariants::{InvariantEngine, InvariantViolation, Snapshot};
use crate::state::{StateError, StudentEvent, StudentState};
use crate::transcript::{CourseGrade, Grade, StudentId, Transcript};
use crate::validation::{self, ValidationError};

/// Demo roster loaded by [`TranscriptStore::initialize`].
pub const SEED_STUDENTS: [&str; 4] = ["Sardor", "Jasur", "Jasur", "Nigora"];

/// A mutation referenced state that does not exist or would break uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("no student with id = {0}")]
    UnknownStudent(StudentId),

    #[error("student with id = {0} has been deleted")]
    AlreadyDeleted(StudentId),

    #[error("student id {0} is already in use")]
    IdInUse(StudentId),

    #[error("student {student} has no grade for course `{course}`")]
    UnknownCourse { student: StudentId, course: String },

    #[error("student {student} already has a grade for course `{course}`")]
    DuplicateCourse { student: StudentId, course: String },
}

/// Hard failure of a store mutation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionError),
}

#[derive(Debug, Default)]
pub struct TranscriptStore {
    transcripts: IndexMap<StudentId, Transcript>,
    last_issued: Option<StudentId>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with [`SEED_STUDENTS`].
    pub fn seeded() -> Self {
        let mut store = Self::new();
        store.initialize();
        store
    }

    /// Wipe all state, including the id counter, and load the demo roster.
    pub fn initialize(&mut self) {
        self.transcripts.clear();
        self.last_issued = None;

        for name in SEED_STUDENTS {
            if let Err(err) = self.enroll(name) {
                warn!(%err, name, "failed to seed student");
            }
        }

        info!(students = self.transcripts.len(), "store initialized");
        for t in self.transcripts.values() {
            debug!(student_id = %t.id(), name = %t.student.name, "seeded transcript");
        }
    }

    /// Create an empty transcript and return the new student's id.
    pub fn add_student(&mut self, name: &str) -> Result<StudentId, StoreError> {
        validation::validate_name(name)?;
        self.enroll(name).map_err(StoreError::from)
    }

    /// All live transcripts in creation order.
    pub fn get_all(&self) -> impl ExactSizeIterator<Item = &Transcript> {
        self.transcripts.values()
    }

    pub fn get_transcript(&self, id: StudentId) -> Option<&Transcript> {
        self.transcripts.get(&id)
    }

    /// Ids of every live student with exactly this name, in creation order.
    pub fn get_student_ids(&self, name: &str) -> Vec<StudentId> {
        self.transcripts
            .values()
            .filter(|t| t.student.name == name)
            .map(Transcript::id)
            .collect()
    }

    /// Append a grade for a course the student has no grade for yet.
    pub fn add_grade(
        &mut self,
        id: StudentId,
        course: &str,
        score: impl Into<f64>,
    ) -> Result<Grade, StoreError> {
        validation::validate_course(course)?;
        let grade = Grade::new(score)?;
        self.transition(id, StudentEvent::GradeRecorded)?;

        let transcript = self.live_mut(id)?;
        if transcript.position_of(course).is_some() {
            return Err(PreconditionError::DuplicateCourse {
                student: id,
                course: course.to_owned(),
            }
            .into());
        }

        transcript.grades.push(CourseGrade {
            course: course.to_owned(),
            grade,
        });
        debug!(student_id = %id, course, grade = grade.value(), "grade added");
        Ok(grade)
    }

    /// Replace an existing grade in place.
    pub fn update_grade(
        &mut self,
        id: StudentId,
        course: &str,
        score: impl Into<f64>,
    ) -> Result<Grade, StoreError> {
        validation::validate_course(course)?;
        let grade = Grade::new(score)?;
        self.transition(id, StudentEvent::GradeRecorded)?;

        let transcript = self.live_mut(id)?;
        let Some(position) = transcript.position_of(course) else {
            return Err(PreconditionError::UnknownCourse {
                student: id,
                course: course.to_owned(),
            }
            .into());
        };

        let previous = std::mem::replace(&mut transcript.grades[position].grade, grade);
        debug!(
            student_id = %id,
            course,
            previous = previous.value(),
            grade = grade.value(),
            "grade updated"
        );
        Ok(grade)
    }

    pub fn get_grade(&self, id: StudentId, course: &str) -> Option<Grade> {
        self.transcripts.get(&id)?.grade_for(course)
    }

    /// Remove a student's transcript. The id is retired permanently.
    pub fn delete_student(&mut self, id: StudentId) -> Result<(), StoreError> {
        self.transition(id, StudentEvent::Withdrawn)?;
        self.transcripts
            .shift_remove(&id)
            .ok_or(PreconditionError::UnknownStudent(id))?;
        debug!(student_id = %id, "student deleted");
        Ok(())
    }

    /// Where `id` sits in its lifecycle.
    pub fn lifecycle(&self, id: StudentId) -> StudentState {
        if self.transcripts.contains_key(&id) {
            StudentState::Active
        } else if id.0 >= 1 && self.last_issued.is_some_and(|last| id <= last) {
            StudentState::Deleted
        } else {
            StudentState::Nonexistent
        }
    }

    pub fn len(&self) -> usize {
        self.transcripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }

    /// Evaluate the data-model invariants against the current contents.
    pub fn verify(&self) -> Result<(), InvariantViolation> {
        let view: Vec<&Transcript> = self.transcripts.values().collect();
        InvariantEngine::standard().evaluate(&Snapshot {
            transcripts: &view,
            last_issued: self.last_issued,
        })
    }

    fn enroll(&mut self, name: &str) -> Result<StudentId, PreconditionError> {
        let id = StudentId(self.last_issued.map_or(1, |last| last.0 + 1));
        self.transition(id, StudentEvent::Enrolled)?;
        self.last_issued = Some(id);
        self.transcripts.insert(id, Transcript::empty(id, name));
        debug!(student_id = %id, name, "student added");
        Ok(id)
    }

    fn transition(
        &self,
        id: StudentId,
        event: StudentEvent,
    ) -> Result<StudentState, PreconditionError> {
        self.lifecycle(id).apply(event).map_err(|err| match err {
            StateError::IllegalTransition {
                state: StudentState::Deleted,
                ..
            } => PreconditionError::AlreadyDeleted(id),
            StateError::IllegalTransition {
                state: StudentState::Active,
                event: StudentEvent::Enrolled,
            } => PreconditionError::IdInUse(id),
            StateError::IllegalTransition { .. } => PreconditionError::UnknownStudent(id),
        })
    }

    fn live_mut(&mut self, id: StudentId) -> Result<&mut Transcript, PreconditionError> {
        self.transcripts
            .get_mut(&id)
            .ok_or(PreconditionError::UnknownStudent(id))
    }
}
