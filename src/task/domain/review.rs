//! Reviewer verdict aggregation and rejection policy.

use super::{Actor, TaskStatus};
use serde::{Deserialize, Serialize};

/// Status a rejected task returns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionTarget {
    /// Back to the queue; any runner may pick the task up again.
    #[default]
    Pending,
    /// Straight back to the coder that produced the rejected work.
    InProgress,
}

impl RejectionTarget {
    /// Returns the task status this target maps to.
    #[must_use]
    pub const fn status(self) -> TaskStatus {
        match self {
            Self::Pending => TaskStatus::Pending,
            Self::InProgress => TaskStatus::InProgress,
        }
    }
}

/// How verdicts from several reviewers combine into one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewConsensus {
    /// Every reviewer must approve.
    #[default]
    All,
    /// Strictly more than half of the reviewers must approve.
    Majority,
}

impl ReviewConsensus {
    /// Returns `true` when `verdicts` approve the task under this rule.
    ///
    /// An empty verdict list never approves.
    #[must_use]
    pub fn is_reached(self, verdicts: &[ReviewVerdict]) -> bool {
        if verdicts.is_empty() {
            return false;
        }
        let approvals = verdicts.iter().filter(|v| v.is_approved()).count();
        match self {
            Self::All => approvals == verdicts.len(),
            Self::Majority => approvals.saturating_mul(2) > verdicts.len(),
        }
    }
}

/// Review policy applied by the task lifecycle service.
///
/// # Examples
///
/// ```
/// use gantry::task::domain::{ReviewConsensus, ReviewPolicy};
///
/// let policy = ReviewPolicy::default();
/// assert_eq!(policy.dispute_threshold, 3);
/// assert_eq!(policy.consensus, ReviewConsensus::All);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewPolicy {
    /// Rejections without resolution after which a dispute is opened.
    pub dispute_threshold: u32,
    /// Status a rejected task returns to while below the threshold.
    pub rejection_target: RejectionTarget,
    /// How multi-reviewer verdicts combine.
    pub consensus: ReviewConsensus,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            dispute_threshold: 3,
            rejection_target: RejectionTarget::Pending,
            consensus: ReviewConsensus::All,
        }
    }
}

impl ReviewPolicy {
    /// Majority voting with a higher dispute threshold.
    #[must_use]
    pub const fn lenient() -> Self {
        Self {
            dispute_threshold: 5,
            rejection_target: RejectionTarget::InProgress,
            consensus: ReviewConsensus::Majority,
        }
    }

    /// Returns `true` once `rejection_count` requires a dispute.
    #[must_use]
    pub const fn requires_dispute(&self, rejection_count: u32) -> bool {
        rejection_count >= self.dispute_threshold
    }
}

/// One reviewer's decision on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    reviewer: Actor,
    approved: bool,
    reason: Option<String>,
}

impl ReviewVerdict {
    /// Creates an approving verdict.
    #[must_use]
    pub const fn approve(reviewer: Actor) -> Self {
        Self {
            reviewer,
            approved: true,
            reason: None,
        }
    }

    /// Creates a rejecting verdict.
    #[must_use]
    pub fn reject(reviewer: Actor, reason: impl Into<String>) -> Self {
        Self {
            reviewer,
            approved: false,
            reason: Some(reason.into()),
        }
    }

    /// Returns the reviewer identity.
    #[must_use]
    pub const fn reviewer(&self) -> &Actor {
        &self.reviewer
    }

    /// Returns `true` for approvals.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        self.approved
    }

    /// Returns the rejection reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}
