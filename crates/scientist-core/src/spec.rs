//! Immutable experiment definitions
//!
//! An [`ExperimentSpec`] is the frozen output of
//! [`ExperimentBuilder::build`](crate::ExperimentBuilder::build). It has no
//! setters; every behavior inside is reference counted, so clones are cheap
//! and a single spec can serve any number of concurrent executions.
//!
//! # Execution contract
//!
//! Runners sequence an execution as:
//! 1. [`run_before_hook`](ExperimentSpec::run_before_hook), failures are fatal
//! 2. [`should_run_candidate`](ExperimentSpec::should_run_candidate)
//! 3. control, always; candidate only if the gate allowed it
//! 4. [`results_match`](ExperimentSpec::results_match) when both results exist
//! 5. on mismatch, [`should_ignore`](ExperimentSpec::should_ignore) decides
//!    whether to report

use crate::behavior::{Behavior, Hook};
use crate::comparison::Comparison;
use crate::error::ExperimentError;
use crate::ignore::{IgnorePredicate, IgnoreSet};
use std::collections::BTreeMap;
use std::fmt;

/// Frozen experiment definition handed to a runner
pub struct ExperimentSpec<T> {
    pub(crate) name: String,
    pub(crate) control: Behavior<T>,
    pub(crate) candidate: Behavior<T>,
    pub(crate) comparison: Comparison<T>,
    pub(crate) before_run: Option<Hook>,
    pub(crate) run_gate: Behavior<bool>,
    pub(crate) enabled: bool,
    pub(crate) ignores: IgnoreSet<T>,
    pub(crate) context: BTreeMap<String, serde_json::Value>,
}

impl<T> Clone for ExperimentSpec<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            control: self.control.clone(),
            candidate: self.candidate.clone(),
            comparison: self.comparison.clone(),
            before_run: self.before_run.clone(),
            run_gate: self.run_gate.clone(),
            enabled: self.enabled,
            ignores: self.ignores.clone(),
            context: self.context.clone(),
        }
    }
}

impl<T> fmt::Debug for ExperimentSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExperimentSpec")
            .field("name", &self.name)
            .field("comparison", &self.comparison)
            .field("before_run", &self.before_run.is_some())
            .field("enabled", &self.enabled)
            .field("ignores", &self.ignores)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> ExperimentSpec<T> {
    /// Experiment name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trusted behavior; its result is returned to the caller
    #[inline]
    #[must_use]
    pub fn control(&self) -> &Behavior<T> {
        &self.control
    }

    /// Behavior under validation
    #[inline]
    #[must_use]
    pub fn candidate(&self) -> &Behavior<T> {
        &self.candidate
    }

    /// Comparison rule (control first, candidate second)
    #[inline]
    #[must_use]
    pub fn comparison(&self) -> &Comparison<T> {
        &self.comparison
    }

    /// Pre-run hook, if one was declared
    #[inline]
    #[must_use]
    pub fn before_run(&self) -> Option<&Hook> {
        self.before_run.as_ref()
    }

    /// Run gate
    ///
    /// A disabled experiment's gate always answers `false` and never invokes
    /// the declared predicate.
    #[inline]
    #[must_use]
    pub fn run_gate(&self) -> &Behavior<bool> {
        &self.run_gate
    }

    /// Whether the configuration enabled this experiment
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Iterate over ignore predicates
    pub fn ignore_predicates(&self) -> impl Iterator<Item = &IgnorePredicate<T>> {
        self.ignores.iter()
    }

    /// Number of ignore predicates
    #[inline]
    #[must_use]
    pub fn ignore_count(&self) -> usize {
        self.ignores.len()
    }

    /// Context captured at build time
    #[inline]
    #[must_use]
    pub fn context(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.context
    }

    /// Await the pre-run hook
    ///
    /// An absent hook is a no-op.
    ///
    /// # Errors
    /// `ExperimentError::Hook` wrapping the hook's failure
    pub async fn run_before_hook(&self) -> Result<(), ExperimentError> {
        let Some(hook) = &self.before_run else {
            return Ok(());
        };

        hook.call().await.map_err(|source| {
            tracing::error!(experiment = %self.name, error = %source, "before-run hook failed");
            ExperimentError::hook(self.name.clone(), source)
        })
    }

    /// Whether the candidate should run for this execution
    ///
    /// A disabled experiment answers `false` without invoking the gate.
    pub async fn should_run_candidate(&self) -> bool {
        if !self.enabled {
            return false;
        }
        self.run_gate.call().await
    }

    /// Whether control and candidate results are considered equal
    #[inline]
    #[must_use]
    pub fn results_match(&self, control: &T, candidate: &T) -> bool {
        self.comparison.compare(control, candidate)
    }

    /// Whether any ignore predicate accepts the pair
    pub async fn should_ignore(&self, control: &T, candidate: &T) -> bool {
        self.ignores.any_matches(control, candidate).await
    }

    /// Whether a pair of results is a mismatch that must be reported
    ///
    /// Ignore predicates are only consulted when the comparison fails.
    pub async fn is_reportable_mismatch(&self, control: &T, candidate: &T) -> bool {
        if self.results_match(control, candidate) {
            return false;
        }
        !self.should_ignore(control, candidate).await
    }
}
