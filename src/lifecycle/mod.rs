//! # Post Lifecycle
//!
//! Legal status transitions for a post, expressed as a single function from
//! `(current status, requested transition)` to the next status.
//!
//! ```text
//! draft ──approve──▶ approved ──publish──▶ published
//!   │                   │
//!   └──reject──▶ rejected ◀──reject──┘
//! ```
//!
//! `published` and `rejected` are terminal. A draft may be published directly
//! only through the explicit immediate-publish path. Mark-as-published is an
//! administrative override available from any non-terminal status.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::PostStatus;

pub mod controller;

pub use controller::{PostError, PostLifecycleController};

/// Transitions an operator or the system can request on a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PostTransition {
    Approve,
    Reject,
    /// Set or change `scheduled_at`; never changes status
    Schedule,
    /// Publish through the platform client
    Publish { immediate: bool },
    /// Record a publication that happened out-of-band
    MarkPublished,
}

impl PostTransition {
    pub fn name(&self) -> &'static str {
        match self {
            PostTransition::Approve => "approve",
            PostTransition::Reject => "reject",
            PostTransition::Schedule => "schedule",
            PostTransition::Publish { immediate: false } => "publish",
            PostTransition::Publish { immediate: true } => "publish_immediately",
            PostTransition::MarkPublished => "mark_published",
        }
    }
}

impl fmt::Display for PostTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors produced by the lifecycle state machine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("cannot {requested} a post in status '{current}'")]
    InvalidTransition {
        current: PostStatus,
        requested: PostTransition,
    },
}

/// Resolve the status a post moves to when `requested` is applied in `current`.
///
/// For `Publish` the returned status is the status on success; a failed
/// publish attempt leaves the post in `current`.
pub fn transition(
    current: PostStatus,
    requested: PostTransition,
) -> Result<PostStatus, LifecycleError> {
    use PostStatus::*;
    use PostTransition::*;

    let next = match (current, requested) {
        (Draft, Approve) => Some(Approved),
        (Draft | Approved, Reject) => Some(Rejected),
        (Draft | Approved, Schedule) => Some(current),
        (Approved, Publish { .. }) => Some(Published),
        (Draft, Publish { immediate: true }) => Some(Published),
        (Draft | Approved, MarkPublished) => Some(Published),
        _ => None,
    };

    next.ok_or(LifecycleError::InvalidTransition { current, requested })
}
