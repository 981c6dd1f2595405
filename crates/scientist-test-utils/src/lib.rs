//! Testing utilities for Scientist workspace
//!
//! Shared test helpers, fixtures, and a runner that follows the execution
//! contract of [`ExperimentSpec`].

#![allow(missing_docs)]

use futures::FutureExt;
use parking_lot::Mutex;
use scientist_core::{
    Behavior, Equivalence, ExperimentBuilder, ExperimentError, ExperimentOutcome,
    ExperimentRunner, ExperimentSpec, Observation,
};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Instant;

static TRACING: Once = Once::new();

/// Install a test subscriber honouring `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Result type comparable only through [`Equivalence`]
#[derive(Debug, Clone, Copy)]
pub struct Measurement {
    pub value: f64,
    pub tolerance: f64,
}

impl Measurement {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            tolerance: 1e-3,
        }
    }
}

impl Equivalence for Measurement {
    fn equivalent(&self, other: &Self) -> bool {
        (self.value - other.value).abs() <= self.tolerance
    }
}

/// Shared invocation counter for closures handed to a builder
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// `"feature-x"`: control returns `"A"`, candidate returns `"B"`
pub fn feature_x_builder() -> ExperimentBuilder<&'static str> {
    let mut builder = ExperimentBuilder::new("feature-x").unwrap();
    builder.control(|| "A").candidate(|| "B");
    builder
}

/// Runner that executes specs in-process and records every outcome
#[derive(Debug)]
pub struct SimulatedRunner<T> {
    outcomes: Mutex<Vec<ExperimentOutcome<T>>>,
}

impl<T: Clone + Send + Sync + 'static> SimulatedRunner<T> {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(Vec::new()),
        }
    }

    /// All recorded outcomes, oldest first
    pub fn outcomes(&self) -> Vec<ExperimentOutcome<T>> {
        self.outcomes.lock().clone()
    }

    pub fn last_outcome(&self) -> Option<ExperimentOutcome<T>> {
        self.outcomes.lock().last().cloned()
    }

    /// Number of recorded outcomes that must be reported
    pub fn mismatch_count(&self) -> usize {
        self.outcomes.lock().iter().filter(|o| o.is_mismatch()).count()
    }

    fn record(&self, spec: &ExperimentSpec<T>, outcome: ExperimentOutcome<T>) {
        if outcome.is_mismatch() {
            tracing::info!(experiment = spec.name(), "mismatch observed");
        } else {
            tracing::debug!(
                experiment = spec.name(),
                outcome = outcome.kind(),
                "experiment finished"
            );
        }
        self.outcomes.lock().push(outcome);
    }
}

impl<T: Clone + Send + Sync + 'static> Default for SimulatedRunner<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<T: Clone + Send + Sync + 'static> ExperimentRunner<T> for SimulatedRunner<T> {
    async fn run(&self, spec: &ExperimentSpec<T>) -> Result<T, ExperimentError> {
        spec.run_before_hook().await?;
        let run_candidate = spec.should_run_candidate().await;

        let control = observe(spec.control()).await;
        let value = match &control {
            Observation::Value { value, .. } => value.clone(),
            Observation::Failed { message, .. } => {
                return Err(ExperimentError::ControlFailed {
                    experiment: spec.name().to_string(),
                    message: message.clone(),
                });
            }
        };

        if !run_candidate {
            self.record(spec, ExperimentOutcome::Skipped { control });
            return Ok(value);
        }

        let candidate = observe(spec.candidate()).await;
        let outcome = match candidate.value() {
            None => ExperimentOutcome::CandidateFailed { control, candidate },
            Some(result) => {
                if spec.results_match(&value, result) {
                    ExperimentOutcome::Matched { control, candidate }
                } else if spec.should_ignore(&value, result).await {
                    ExperimentOutcome::Ignored { control, candidate }
                } else {
                    ExperimentOutcome::Mismatched { control, candidate }
                }
            }
        };
        self.record(spec, outcome);

        Ok(value)
    }
}

/// Run a behavior, turning a panic into [`Observation::Failed`]
pub async fn observe<T: Send + 'static>(behavior: &Behavior<T>) -> Observation<T> {
    let start = Instant::now();
    // Synchronous behaviors run inside `call`, so the call itself is wrapped
    let result = AssertUnwindSafe(async { behavior.call().await })
        .catch_unwind()
        .await;
    let duration = start.elapsed();

    match result {
        Ok(value) => Observation::Value { value, duration },
        Err(payload) => Observation::Failed {
            message: panic_message(payload.as_ref()),
            duration,
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "behavior panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measurement_tolerance() {
        assert!(Measurement::new(1.0).equivalent(&Measurement::new(1.0005)));
        assert!(!Measurement::new(1.0).equivalent(&Measurement::new(1.01)));
    }

    #[test]
    fn call_counter_counts() {
        let counter = CallCounter::new();
        let clone = counter.clone();
        assert_eq!(clone.hit(), 1);
        assert_eq!(counter.hit(), 2);
        assert_eq!(counter.count(), 2);
    }

    #[tokio::test]
    async fn observe_captures_panic() {
        let behavior: Behavior<i32> = Behavior::from_fn(|| panic!("kaboom"));
        let observation = observe(&behavior).await;
        assert!(matches!(
            observation,
            Observation::Failed { ref message, .. } if message == "kaboom"
        ));
    }
}
