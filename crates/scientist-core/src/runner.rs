//! Runner seam
//!
//! Runners execute an [`ExperimentSpec`] and publish what they observed.
//! Production engines (timing, sampling, publishing backends) live outside
//! this crate; they implement [`ExperimentRunner`] and report outcomes as
//! [`ExperimentOutcome`] values.

use crate::error::ExperimentError;
use crate::spec::ExperimentSpec;
use std::time::Duration;

/// Executes experiments
///
/// Implementations must follow the sequencing documented on
/// [`ExperimentSpec`] and must isolate candidate failures: a failing
/// candidate is reported, never returned to the caller.
#[async_trait::async_trait]
pub trait ExperimentRunner<T: Send + Sync + 'static>: Send + Sync {
    /// Run one execution, returning the control's result
    ///
    /// # Errors
    /// Hook failures and control failures
    async fn run(&self, spec: &ExperimentSpec<T>) -> Result<T, ExperimentError>;
}

/// Result of running one behavior
#[derive(Debug, Clone, PartialEq)]
pub enum Observation<T> {
    /// Behavior returned a value
    Value {
        /// Returned value
        value: T,
        /// Time spent
        duration: Duration,
    },
    /// Behavior panicked
    Failed {
        /// Panic message
        message: String,
        /// Time spent
        duration: Duration,
    },
}

impl<T> Observation<T> {
    /// Returned value, if any
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value { value, .. } => Some(value),
            Self::Failed { .. } => None,
        }
    }

    /// Time spent
    #[inline]
    #[must_use]
    pub fn duration(&self) -> Duration {
        match self {
            Self::Value { duration, .. } | Self::Failed { duration, .. } => *duration,
        }
    }

    /// Check if behavior failed
    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// What a runner publishes for one execution
#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentOutcome<T> {
    /// Gate kept the candidate from running
    Skipped {
        /// Control observation
        control: Observation<T>,
    },
    /// Results compared equal
    Matched {
        /// Control observation
        control: Observation<T>,
        /// Candidate observation
        candidate: Observation<T>,
    },
    /// Results differed, report
    Mismatched {
        /// Control observation
        control: Observation<T>,
        /// Candidate observation
        candidate: Observation<T>,
    },
    /// Results differed but an ignore predicate suppressed the report
    Ignored {
        /// Control observation
        control: Observation<T>,
        /// Candidate observation
        candidate: Observation<T>,
    },
    /// Candidate failed; the control result was still returned
    CandidateFailed {
        /// Control observation
        control: Observation<T>,
        /// Candidate failure
        candidate: Observation<T>,
    },
}

impl<T> ExperimentOutcome<T> {
    /// Check if this outcome must be reported as a mismatch
    #[inline]
    #[must_use]
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatched { .. })
    }

    /// Outcome name (for logging)
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Skipped { .. } => "skipped",
            Self::Matched { .. } => "matched",
            Self::Mismatched { .. } => "mismatched",
            Self::Ignored { .. } => "ignored",
            Self::CandidateFailed { .. } => "candidate_failed",
        }
    }

    /// Control observation
    #[must_use]
    pub fn control(&self) -> &Observation<T> {
        match self {
            Self::Skipped { control }
            | Self::Matched { control, .. }
            | Self::Mismatched { control, .. }
            | Self::Ignored { control, .. }
            | Self::CandidateFailed { control, .. } => control,
        }
    }
}
