//! Result comparison
//!
//! The default comparison is an ordered chain of [`ComparisonStrategy`]
//! values. Strategies are tried in order and the first one reporting
//! [`Equality::Equal`] wins; a strategy reporting [`Equality::NotEqual`] does
//! not end the search, so a later strategy may still accept the pair. If no
//! strategy accepts, the results are unequal.
//!
//! # Built-in strategies
//!
//! - [`BothAbsent`]: two `None` results are equal
//! - [`NativeEquality`]: `PartialEq`
//! - [`TypedEquality`]: the [`Equivalence`] capability
//! - [`FnStrategy`]: named closure, for extensions

use std::fmt;
use std::sync::Arc;

/// Outcome of a single comparison strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Equality {
    /// Strategy considers the results equal
    Equal,
    /// Strategy considers the results different
    NotEqual,
    /// Strategy has nothing to say about this pair
    Inapplicable,
}

impl From<bool> for Equality {
    #[inline]
    fn from(equal: bool) -> Self {
        if equal {
            Self::Equal
        } else {
            Self::NotEqual
        }
    }
}

/// Typed equality capability
///
/// For result types that cannot (or should not) implement `PartialEq`, e.g.
/// floating point measurements compared within a tolerance.
pub trait Equivalence {
    /// Whether `self` and `other` represent the same result
    fn equivalent(&self, other: &Self) -> bool;
}

impl<U: Equivalence> Equivalence for Option<U> {
    fn equivalent(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.equivalent(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<U: Equivalence> Equivalence for Vec<U> {
    fn equivalent(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.equivalent(b))
    }
}

/// One step of a comparison chain
pub trait ComparisonStrategy<T>: Send + Sync {
    /// Strategy name (for debugging)
    fn name(&self) -> &'static str;

    /// Compare control result against candidate result
    fn evaluate(&self, control: &T, candidate: &T) -> Equality;
}

/// Two absent results are equal
#[derive(Debug, Clone, Copy, Default)]
pub struct BothAbsent;

impl<U> ComparisonStrategy<Option<U>> for BothAbsent {
    fn name(&self) -> &'static str {
        "both_absent"
    }

    fn evaluate(&self, control: &Option<U>, candidate: &Option<U>) -> Equality {
        if control.is_none() && candidate.is_none() {
            Equality::Equal
        } else {
            Equality::Inapplicable
        }
    }
}

/// `PartialEq` equality
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEquality;

impl<T: PartialEq> ComparisonStrategy<T> for NativeEquality {
    fn name(&self) -> &'static str {
        "native"
    }

    fn evaluate(&self, control: &T, candidate: &T) -> Equality {
        Equality::from(control == candidate)
    }
}

/// [`Equivalence`] equality
#[derive(Debug, Clone, Copy, Default)]
pub struct TypedEquality;

impl<T: Equivalence> ComparisonStrategy<T> for TypedEquality {
    fn name(&self) -> &'static str {
        "typed"
    }

    fn evaluate(&self, control: &T, candidate: &T) -> Equality {
        Equality::from(control.equivalent(candidate))
    }
}

/// Closure-backed strategy
pub struct FnStrategy<F> {
    name: &'static str,
    f: F,
}

impl<F> FnStrategy<F> {
    /// Create named strategy from closure
    #[inline]
    #[must_use]
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<T, F> ComparisonStrategy<T> for FnStrategy<F>
where
    F: Fn(&T, &T) -> Equality + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn evaluate(&self, control: &T, candidate: &T) -> Equality {
        (self.f)(control, candidate)
    }
}

impl<F> fmt::Debug for FnStrategy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStrategy").field("name", &self.name).finish()
    }
}

/// Ordered list of comparison strategies
pub struct ComparisonChain<T> {
    strategies: Vec<Arc<dyn ComparisonStrategy<T>>>,
}

impl<T> ComparisonChain<T> {
    /// Create empty chain (every pair compares unequal)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy to the end of the chain
    #[must_use]
    pub fn then(mut self, strategy: impl ComparisonStrategy<T> + 'static) -> Self {
        self.strategies.push(Arc::new(strategy));
        self
    }

    /// Names of the strategies, in evaluation order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Number of strategies
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if chain is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Compare two results
    ///
    /// Returns `true` at the first strategy reporting [`Equality::Equal`],
    /// `false` once every strategy has been tried.
    #[must_use]
    pub fn evaluate(&self, control: &T, candidate: &T) -> bool {
        self.strategies
            .iter()
            .any(|s| s.evaluate(control, candidate) == Equality::Equal)
    }
}

impl<T: PartialEq> ComparisonChain<T> {
    /// `PartialEq` only
    #[must_use]
    pub fn native() -> Self {
        Self::new().then(NativeEquality)
    }
}

impl<T: Equivalence> ComparisonChain<T> {
    /// [`Equivalence`] only
    #[must_use]
    pub fn typed() -> Self {
        Self::new().then(TypedEquality)
    }
}

impl<T: PartialEq + Equivalence> ComparisonChain<T> {
    /// `PartialEq`, falling back to [`Equivalence`]
    #[must_use]
    pub fn native_then_typed() -> Self {
        Self::new().then(NativeEquality).then(TypedEquality)
    }
}

impl<U: PartialEq> ComparisonChain<Option<U>> {
    /// Both-absent check, then `PartialEq`
    #[must_use]
    pub fn optional() -> Self {
        Self::new().then(BothAbsent).then(NativeEquality)
    }
}

impl<T> Default for ComparisonChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ComparisonChain<T> {
    fn clone(&self) -> Self {
        Self {
            strategies: self.strategies.clone(),
        }
    }
}

impl<T> fmt::Debug for ComparisonChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

type CompareFn<T> = dyn Fn(&T, &T) -> bool + Send + Sync;

/// Where a comparison rule came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Chain,
    Custom,
}

/// Comparison rule stored in an experiment
pub struct Comparison<T> {
    inner: Arc<CompareFn<T>>,
    origin: Origin,
}

impl<T: 'static> Comparison<T> {
    /// Comparison backed by a strategy chain
    #[must_use]
    pub fn from_chain(chain: ComparisonChain<T>) -> Self {
        Self {
            inner: Arc::new(move |control: &T, candidate: &T| chain.evaluate(control, candidate)),
            origin: Origin::Chain,
        }
    }

    /// Comparison backed by a user closure
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(f),
            origin: Origin::Custom,
        }
    }

    /// Compare control result (first) against candidate result (second)
    #[inline]
    #[must_use]
    pub fn compare(&self, control: &T, candidate: &T) -> bool {
        (self.inner)(control, candidate)
    }

    /// Whether this is the default chain or a user closure
    #[inline]
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.origin == Origin::Chain
    }
}

impl<T> Clone for Comparison<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            origin: self.origin,
        }
    }
}

impl<T> fmt::Debug for Comparison<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Comparison").field(&self.origin).finish()
    }
}
