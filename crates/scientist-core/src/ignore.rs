//! Ignore predicates
//!
//! Provides [`IgnorePredicate`] and [`IgnoreSet`]. Predicates are identified
//! by a [`PredicateId`]:
//! - `fn` items and non-capturing closures are identified by their type, so
//!   passing the same function twice yields one member
//! - capturing closures get a fresh id each time they are wrapped
//! - clones of an [`IgnorePredicate`] share its id
//!
//! Two different closure expressions are distinct even if their logic is
//! identical.

use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::mem;
use std::sync::Arc;
use uuid::Uuid;

/// Identity of a registered ignore predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredicateId(pub Uuid);

impl PredicateId {
    /// Generate new predicate ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Identity of a zero-sized callable type
    ///
    /// A zero-sized type has exactly one value, so the type itself names the
    /// callable. Returns `None` for closures that capture state.
    #[must_use]
    pub fn of_callable<F: 'static>() -> Option<Self> {
        if mem::size_of::<F>() != 0 {
            return None;
        }
        let type_id = TypeId::of::<F>();
        let mut high = DefaultHasher::new();
        (0u8, type_id).hash(&mut high);
        let mut low = DefaultHasher::new();
        (1u8, type_id).hash(&mut low);
        let bits = (u128::from(high.finish()) << 64) | u128::from(low.finish());
        Some(Self(Uuid::from_u128(bits)))
    }

    fn for_callable<F: 'static>() -> Self {
        Self::of_callable::<F>().unwrap_or_default()
    }
}

impl Default for PredicateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PredicateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type PredicateFn<T> = dyn Fn(&T, &T) -> BoxFuture<'static, bool> + Send + Sync;

/// Predicate that suppresses a mismatch report for a pair of results
pub struct IgnorePredicate<T> {
    id: PredicateId,
    inner: Arc<PredicateFn<T>>,
}

impl<T: 'static> IgnorePredicate<T> {
    /// Wrap a synchronous predicate
    ///
    /// The predicate runs when evaluated; the returned future is already
    /// complete.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            id: PredicateId::for_callable::<F>(),
            inner: Arc::new(move |control: &T, candidate: &T| {
                future::ready(f(control, candidate)).boxed()
            }),
        }
    }

    /// Wrap an asynchronous predicate
    ///
    /// The future owns clones of both results.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        T: Clone,
        F: Fn(T, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self {
            id: PredicateId::for_callable::<F>(),
            inner: Arc::new(move |control: &T, candidate: &T| {
                f(control.clone(), candidate.clone()).boxed()
            }),
        }
    }

    /// Predicate identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> PredicateId {
        self.id
    }

    /// Evaluate against control (first) and candidate (second) results
    #[inline]
    #[must_use]
    pub fn evaluate(&self, control: &T, candidate: &T) -> BoxFuture<'static, bool> {
        (self.inner)(control, candidate)
    }
}

impl<T> Clone for IgnorePredicate<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for IgnorePredicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IgnorePredicate")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Set of ignore predicates keyed by identity
pub struct IgnoreSet<T> {
    predicates: IndexMap<PredicateId, IgnorePredicate<T>>,
}

impl<T: 'static> IgnoreSet<T> {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            predicates: IndexMap::new(),
        }
    }

    /// Insert predicate
    ///
    /// Returns `false` if a predicate with the same identity is already
    /// present (the set is left unchanged).
    pub fn insert(&mut self, predicate: IgnorePredicate<T>) -> bool {
        if self.predicates.contains_key(&predicate.id) {
            return false;
        }
        self.predicates.insert(predicate.id, predicate);
        true
    }

    /// Check membership
    #[inline]
    #[must_use]
    pub fn contains(&self, id: PredicateId) -> bool {
        self.predicates.contains_key(&id)
    }

    /// Number of predicates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Check if set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Iterate over predicates
    pub fn iter(&self) -> impl Iterator<Item = &IgnorePredicate<T>> {
        self.predicates.values()
    }

    /// Whether any predicate accepts the pair
    ///
    /// Predicates are awaited one at a time; evaluation stops at the first
    /// `true`. An empty set never matches.
    pub async fn any_matches(&self, control: &T, candidate: &T) -> bool {
        for predicate in self.predicates.values() {
            if predicate.evaluate(control, candidate).await {
                tracing::trace!(predicate = %predicate.id, "ignore predicate matched");
                return true;
            }
        }
        false
    }
}

impl<T: 'static> Default for IgnoreSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for IgnoreSet<T> {
    fn clone(&self) -> Self {
        Self {
            predicates: self.predicates.clone(),
        }
    }
}

impl<T> fmt::Debug for IgnoreSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.predicates.keys()).finish()
    }
}
