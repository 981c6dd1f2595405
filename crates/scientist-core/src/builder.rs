//! Experiment Builder
//!
//! The configuration-time interface for experiments. Declarations are pure
//! registrations: nothing runs until a runner executes the built
//! [`ExperimentSpec`].
//!
//! Usage:
//! ```rust,ignore
//! let mut builder = ExperimentBuilder::new("feature-x")?;
//! builder
//!     .control(|| legacy_lookup())
//!     .candidate_async(|| async { new_lookup().await })
//!     .ignore(|control, candidate| control.is_empty() && candidate.is_empty());
//! let spec = builder.build()?;
//! ```

use crate::behavior::{Behavior, Hook};
use crate::comparison::{Comparison, ComparisonChain, Equivalence};
use crate::config::ExperimentConfig;
use crate::error::ExperimentError;
use crate::ignore::{IgnorePredicate, IgnoreSet};
use crate::spec::ExperimentSpec;
use std::collections::BTreeMap;
use std::future::Future;

/// Accumulates experiment declarations
///
/// Single-valued declarations (control, candidate, comparison, hook, gate)
/// replace any earlier value. Ignore predicates accumulate in a set.
pub struct ExperimentBuilder<T> {
    name: String,
    control: Option<Behavior<T>>,
    candidate: Option<Behavior<T>>,
    comparison: Comparison<T>,
    before_run: Option<Hook>,
    run_gate: Behavior<bool>,
    ignores: IgnoreSet<T>,
    config: ExperimentConfig,
    context: BTreeMap<String, serde_json::Value>,
}

impl<T: PartialEq + Send + 'static> ExperimentBuilder<T> {
    /// Create builder comparing results with `PartialEq`
    ///
    /// Only `PartialEq` is consulted. For result types that also implement
    /// [`Equivalence`], use [`new_with_equivalence`](Self::new_with_equivalence)
    /// so a native mismatch falls through to the typed check.
    ///
    /// # Errors
    /// `ExperimentError::EmptyName` if `name` is empty
    pub fn new(name: impl Into<String>) -> Result<Self, ExperimentError> {
        Self::with_comparison_chain(name, ComparisonChain::native())
    }
}

impl<T: PartialEq + Equivalence + Send + 'static> ExperimentBuilder<T> {
    /// Create builder trying `PartialEq`, then [`Equivalence`]
    ///
    /// # Errors
    /// `ExperimentError::EmptyName` if `name` is empty
    pub fn new_with_equivalence(name: impl Into<String>) -> Result<Self, ExperimentError> {
        Self::with_comparison_chain(name, ComparisonChain::native_then_typed())
    }
}

impl<T: Send + 'static> ExperimentBuilder<T> {
    /// Create builder whose default comparison is `chain`
    ///
    /// Use this for result types without `PartialEq`, e.g. with
    /// [`ComparisonChain::typed`].
    ///
    /// # Errors
    /// `ExperimentError::EmptyName` if `name` is empty
    pub fn with_comparison_chain(
        name: impl Into<String>,
        chain: ComparisonChain<T>,
    ) -> Result<Self, ExperimentError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ExperimentError::EmptyName);
        }

        tracing::debug!(experiment = %name, strategies = ?chain.names(), "experiment declared");

        Ok(Self {
            name,
            control: None,
            candidate: None,
            comparison: Comparison::from_chain(chain),
            before_run: None,
            run_gate: Behavior::always(true),
            ignores: IgnoreSet::new(),
            config: ExperimentConfig::default(),
            context: BTreeMap::new(),
        })
    }

    /// Experiment name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gate the candidate on a synchronous predicate
    pub fn run_if<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.run_gate = Behavior::from_fn(predicate);
        self
    }

    /// Gate the candidate on an asynchronous predicate
    pub fn run_if_async<F, Fut>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.run_gate = Behavior::from_async(predicate);
        self
    }

    /// Declare the control (trusted) behavior
    pub fn control<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.control = Some(Behavior::from_fn(f));
        self
    }

    /// Declare an asynchronous control behavior
    pub fn control_async<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.control = Some(Behavior::from_async(f));
        self
    }

    /// Declare the candidate behavior
    pub fn candidate<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.candidate = Some(Behavior::from_fn(f));
        self
    }

    /// Declare an asynchronous candidate behavior
    pub fn candidate_async<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.candidate = Some(Behavior::from_async(f));
        self
    }

    /// Replace the comparison (control first, candidate second)
    pub fn compare<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.comparison = Comparison::from_fn(f);
        self
    }

    /// Add a synchronous ignore predicate
    ///
    /// Passing the same `fn` item or non-capturing closure again leaves the
    /// set unchanged. Capturing closures are always added; register a shared
    /// [`IgnorePredicate`] through [`ignore_predicate`](Self::ignore_predicate)
    /// to deduplicate those.
    pub fn ignore<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.ignore_predicate(IgnorePredicate::from_fn(f))
    }

    /// Add an asynchronous ignore predicate
    ///
    /// Deduplicated like [`ignore`](Self::ignore).
    pub fn ignore_async<F, Fut>(&mut self, f: F) -> &mut Self
    where
        T: Clone,
        F: Fn(T, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.ignore_predicate(IgnorePredicate::from_async(f))
    }

    /// Add a pre-built ignore predicate
    ///
    /// Registering a predicate that is already present (same handle or a
    /// clone of it) leaves the set unchanged.
    pub fn ignore_predicate(&mut self, predicate: IgnorePredicate<T>) -> &mut Self {
        let id = predicate.id();
        if !self.ignores.insert(predicate) {
            tracing::debug!(
                experiment = %self.name,
                predicate = %id,
                "ignore predicate already registered"
            );
        }
        self
    }

    /// Declare a synchronous pre-run hook
    pub fn before_run<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.before_run = Some(Behavior::from_fn(action));
        self
    }

    /// Declare an asynchronous pre-run hook
    pub fn before_run_async<F, Fut>(&mut self, action: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.before_run = Some(Behavior::from_async(action));
        self
    }

    /// Attach a context value, replacing any earlier value for `key`
    pub fn context(
        &mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> &mut Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Apply shared configuration
    pub fn config(&mut self, config: ExperimentConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Check if a control behavior is declared
    #[inline]
    #[must_use]
    pub fn has_control(&self) -> bool {
        self.control.is_some()
    }

    /// Check if a candidate behavior is declared
    #[inline]
    #[must_use]
    pub fn has_candidate(&self) -> bool {
        self.candidate.is_some()
    }

    /// Number of registered ignore predicates
    #[inline]
    #[must_use]
    pub fn ignore_count(&self) -> usize {
        self.ignores.len()
    }

    /// Snapshot the declarations into an immutable spec
    ///
    /// The builder is left untouched, so a failed build can be corrected and
    /// retried, and later declarations never reach specs built earlier.
    ///
    /// # Errors
    /// - `ExperimentError::MissingControl` if no control was declared
    /// - `ExperimentError::MissingCandidate` if no candidate was declared
    pub fn build(&self) -> Result<ExperimentSpec<T>, ExperimentError> {
        let Some(control) = self.control.clone() else {
            tracing::warn!(experiment = %self.name, "build rejected: no control behavior");
            return Err(ExperimentError::MissingControl {
                experiment: self.name.clone(),
            });
        };
        let Some(candidate) = self.candidate.clone() else {
            tracing::warn!(experiment = %self.name, "build rejected: no candidate behavior");
            return Err(ExperimentError::MissingCandidate {
                experiment: self.name.clone(),
            });
        };

        let run_gate = if self.config.enabled {
            self.run_gate.clone()
        } else {
            Behavior::always(false)
        };
        let mut context = self.config.context.clone();
        context.extend(self.context.clone());

        tracing::debug!(
            experiment = %self.name,
            ignores = self.ignores.len(),
            hook = self.before_run.is_some(),
            enabled = self.config.enabled,
            "experiment built"
        );

        Ok(ExperimentSpec {
            name: self.name.clone(),
            control,
            candidate,
            comparison: self.comparison.clone(),
            before_run: self.before_run.clone(),
            run_gate,
            enabled: self.config.enabled,
            ignores: self.ignores.clone(),
            context,
        })
    }
}

impl<T> std::fmt::Debug for ExperimentBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExperimentBuilder")
            .field("name", &self.name)
            .field("control", &self.control.is_some())
            .field("candidate", &self.candidate.is_some())
            .field("comparison", &self.comparison)
            .field("before_run", &self.before_run.is_some())
            .field("ignores", &self.ignores)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
