//! Candidate retrieval across concurrent search strategies.

pub mod coordinator;

pub use coordinator::{CandidateSet, SearchCoordinator};
