//! Scientist Core
//!
//! Experiment definitions for validating a new code path (the candidate)
//! against a trusted one (the control):
//! - Declares control, candidate, comparison, run gate, ignore predicates
//!   and a pre-run hook on an [`ExperimentBuilder`]
//! - Normalizes synchronous and asynchronous declarations into one
//!   asynchronous [`Behavior`] contract
//! - Freezes declarations into an immutable, shareable [`ExperimentSpec`]
//! - Leaves execution to an [`ExperimentRunner`]
//!
//! # Example
//!
//! ```rust,ignore
//! use scientist_core::ExperimentBuilder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = ExperimentBuilder::new("feature-x")?;
//! builder
//!     .control(|| "A")
//!     .candidate(|| "B")
//!     .ignore(|control, candidate| *control == "A" && *candidate == "B");
//! let spec = builder.build()?;
//!
//! assert!(!spec.is_reportable_mismatch(&"A", &"B").await);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod behavior;
pub mod builder;
pub mod comparison;
pub mod config;
pub mod error;
pub mod ignore;
pub mod runner;
pub mod spec;

// Re-exports for convenience
pub use behavior::{Behavior, Hook};
pub use builder::ExperimentBuilder;
pub use comparison::{
    BothAbsent, Comparison, ComparisonChain, ComparisonStrategy, Equality, Equivalence,
    FnStrategy, NativeEquality, TypedEquality,
};
pub use config::ExperimentConfig;
pub use error::ExperimentError;
pub use ignore::{IgnorePredicate, IgnoreSet, PredicateId};
pub use runner::{ExperimentOutcome, ExperimentRunner, Observation};
pub use spec::ExperimentSpec;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for declaring experiments
    pub use crate::{
        ComparisonChain, Equivalence, ExperimentBuilder, ExperimentConfig, ExperimentError,
        ExperimentOutcome, ExperimentRunner, ExperimentSpec, IgnorePredicate,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
