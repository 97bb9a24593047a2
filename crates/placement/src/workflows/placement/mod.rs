//! Internship postings and the application status workflow.
//!
//! Applications move `pending -> shortlisted -> accepted | rejected`. Staff
//! shortlist; only the employer that owns the posting may accept or reject.
//! Which re-transitions are allowed is decided by [`TransitionPolicy`].

pub mod domain;
pub mod router;
pub mod service;
pub mod transitions;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationId, ApplicationStatus, Internship, InternshipId, NewApplication,
    NewInternship,
};
pub use router::{placement_router, PlacementApi};
pub use service::PlacementService;
pub use transitions::{TransitionPolicy, WorkflowAction};
pub use views::{ApplicationView, InternshipView};
