//! Domain models shared across the engine.

pub mod context;
pub mod issue;
pub mod task;

pub use context::{ComponentInfo, EpicInfo, ProjectContext, SprintInfo, SprintState};
pub use issue::CandidateIssue;
pub use task::NewTaskInput;
