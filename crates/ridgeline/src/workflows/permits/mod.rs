//! Rider permit applications: intake, admin review, public status lookup
//! and signed access to the uploaded identity document.
//!
//! Records live in the shared key-value store under `permit:{id}`. Every
//! admin operation re-resolves the caller's session token and admin grant.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod transitions;
pub(crate) mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    DocumentLink, IdType, PermitApplication, PermitId, PermitStatus, PermitStatusView,
    PermitSubmission, PermitUpdate,
};
pub use repository::{PermitRepository, RepositoryError, PERMIT_PREFIX};
pub use router::permit_router;
pub use service::{PermitService, PermitServiceError, PermitSettings};
pub use transitions::{TransitionPolicy, UnknownTransitionPolicy};
pub use validation::SubmissionViolation;
