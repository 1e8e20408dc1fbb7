// Transcripts Kernel
//
// In-memory transcript store, its validation rules and the request
// façade that fronts it.

pub mod config;
pub mod invariants;
pub mod service;
pub mod state;
pub mod store;
pub mod transcript;
pub mod validation;

pub use config::ServiceConfig;
pub use service::{Method, Request, Response, TranscriptService};
pub use store::{PreconditionError, StoreError, TranscriptStore};
pub use transcript::{CourseGrade, Grade, Student, StudentId, Transcript};
