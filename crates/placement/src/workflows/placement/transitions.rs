use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::domain::ApplicationStatus;
use crate::error::ValidationError;
use crate::identity::Role;

/// Status-changing actions available on an existing application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Shortlist,
    Accept,
    Reject,
}

impl WorkflowAction {
    pub const fn target(self) -> ApplicationStatus {
        match self {
            Self::Shortlist => ApplicationStatus::Shortlisted,
            Self::Accept => ApplicationStatus::Accepted,
            Self::Reject => ApplicationStatus::Rejected,
        }
    }

    pub const fn required_role(self) -> Role {
        match self {
            Self::Shortlist => Role::Staff,
            Self::Accept | Self::Reject => Role::Employer,
        }
    }

    /// Accept and reject are limited to the employer that owns the internship.
    pub const fn requires_ownership(self) -> bool {
        matches!(self, Self::Accept | Self::Reject)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Shortlist => "shortlist",
            Self::Accept => "accept",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which status changes a workflow action may perform.
///
/// `Permissive` lets any action overwrite any status, terminal ones included.
/// `Strict` only allows `pending -> shortlisted` and
/// `pending | shortlisted -> accepted | rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    #[default]
    Permissive,
    Strict,
}

impl TransitionPolicy {
    pub fn allows(self, from: ApplicationStatus, to: ApplicationStatus) -> bool {
        use ApplicationStatus::{Accepted, Pending, Rejected, Shortlisted};

        match self {
            Self::Permissive => to != Pending,
            Self::Strict => matches!(
                (from, to),
                (Pending, Shortlisted)
                    | (Pending | Shortlisted, Accepted)
                    | (Pending | Shortlisted, Rejected)
            ),
        }
    }

    pub fn check(
        self,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<(), ValidationError> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(ValidationError::InvalidTransition { from, to })
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Permissive => "permissive",
            Self::Strict => "strict",
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown transition policy '{other}'")),
        }
    }
}
