//! Equality and ordering capabilities.
//!
//! Every keyed combinator compares keys only through these traits. The
//! process-wide defaults ([`DefaultEquality`], [`DefaultOrder`]) are stateless
//! statics; [`DefaultEquality`] is also the only comparer that exposes a hash,
//! which is what lets grouping and set algebra switch to hash-keyed lookups.

use std::cmp::Ordering;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use hashbrown::DefaultHashBuilder;
use once_cell::sync::Lazy;

/// Hash state shared by every use of the default equality comparer.
static DEFAULT_HASH_STATE: Lazy<DefaultHashBuilder> = Lazy::new(DefaultHashBuilder::default);

static DEFAULT_EQUALITY: DefaultEquality = DefaultEquality;
static DEFAULT_ORDER: DefaultOrder = DefaultOrder;

/// Tests whether two values are equivalent.
///
/// Implementations must be pure: the same pair always yields the same answer.
pub trait EqualityComparer<T: ?Sized> {
    fn equals(&self, a: &T, b: &T) -> bool;

    /// True only for the canonical default instance.
    fn is_default(&self) -> bool {
        false
    }

    /// A hash consistent with [`EqualityComparer::equals`]. Only structural
    /// comparers can provide one.
    fn hash_key(&self, _value: &T) -> Option<u64> {
        None
    }
}

/// Three-way ordering; must be a total preorder over `T`.
pub trait OrderComparer<T: ?Sized> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// Value identity (`Eq`), hashable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultEquality;

/// Natural ordering (`Ord`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultOrder;

/// The process-wide default equality comparer.
pub fn default_equality() -> &'static DefaultEquality {
    &DEFAULT_EQUALITY
}

/// The process-wide default order comparer.
pub fn default_order() -> &'static DefaultOrder {
    &DEFAULT_ORDER
}

impl<T: Eq + Hash + ?Sized> EqualityComparer<T> for DefaultEquality {
    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }

    fn is_default(&self) -> bool {
        true
    }

    fn hash_key(&self, value: &T) -> Option<u64> {
        Some(DEFAULT_HASH_STATE.hash_one(value))
    }
}

impl<T: Ord + ?Sized> OrderComparer<T> for DefaultOrder {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Equality from a closure.
#[derive(Clone, Copy)]
pub struct EqualityFn<F>(pub F);

/// Order from a closure.
#[derive(Clone, Copy)]
pub struct OrderFn<F>(pub F);

pub fn equality_fn<T: ?Sized, F: Fn(&T, &T) -> bool>(f: F) -> EqualityFn<F> {
    EqualityFn(f)
}

pub fn order_fn<T: ?Sized, F: Fn(&T, &T) -> Ordering>(f: F) -> OrderFn<F> {
    OrderFn(f)
}

impl<F> std::fmt::Debug for EqualityFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EqualityFn")
    }
}

impl<F> std::fmt::Debug for OrderFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OrderFn")
    }
}

impl<T: ?Sized, F: Fn(&T, &T) -> bool> EqualityComparer<T> for EqualityFn<F> {
    fn equals(&self, a: &T, b: &T) -> bool {
        (self.0)(a, b)
    }
}

impl<T: ?Sized, F: Fn(&T, &T) -> Ordering> OrderComparer<T> for OrderFn<F> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.0)(a, b)
    }
}

/// Inverts another order comparer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseOrder<C>(pub C);

impl<T: ?Sized, C: OrderComparer<T>> OrderComparer<T> for ReverseOrder<C> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.0.compare(a, b).reverse()
    }
}

/// Compares values by a projection under the default equality.
///
/// Not the canonical default, so it never takes the hashed path even though
/// the projection itself is hashable.
#[derive(Clone, Copy)]
pub struct KeyEquality<F>(pub F);

impl<F> std::fmt::Debug for KeyEquality<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyEquality")
    }
}

impl<T: ?Sized, P: Eq, F: Fn(&T) -> P> EqualityComparer<T> for KeyEquality<F> {
    fn equals(&self, a: &T, b: &T) -> bool {
        (self.0)(a) == (self.0)(b)
    }
}

/// ASCII case-insensitive string comparison.
///
/// Deliberately not hashable, so keyed combinators using it take the
/// linear-scan path.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreAsciiCase;

impl EqualityComparer<str> for IgnoreAsciiCase {
    fn equals(&self, a: &str, b: &str) -> bool {
        a.eq_ignore_ascii_case(b)
    }
}

impl EqualityComparer<String> for IgnoreAsciiCase {
    fn equals(&self, a: &String, b: &String) -> bool {
        a.eq_ignore_ascii_case(b)
    }
}

impl EqualityComparer<&str> for IgnoreAsciiCase {
    fn equals(&self, a: &&str, b: &&str) -> bool {
        a.eq_ignore_ascii_case(b)
    }
}

impl OrderComparer<str> for IgnoreAsciiCase {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.bytes()
            .map(|c| c.to_ascii_lowercase())
            .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
    }
}

impl OrderComparer<String> for IgnoreAsciiCase {
    fn compare(&self, a: &String, b: &String) -> Ordering {
        OrderComparer::<str>::compare(self, a, b)
    }
}

impl<T: ?Sized, C: EqualityComparer<T> + ?Sized> EqualityComparer<T> for &C {
    fn equals(&self, a: &T, b: &T) -> bool {
        (**self).equals(a, b)
    }

    fn is_default(&self) -> bool {
        (**self).is_default()
    }

    fn hash_key(&self, value: &T) -> Option<u64> {
        (**self).hash_key(value)
    }
}

impl<T: ?Sized, C: EqualityComparer<T> + ?Sized> EqualityComparer<T> for Box<C> {
    fn equals(&self, a: &T, b: &T) -> bool {
        (**self).equals(a, b)
    }

    fn is_default(&self) -> bool {
        (**self).is_default()
    }

    fn hash_key(&self, value: &T) -> Option<u64> {
        (**self).hash_key(value)
    }
}

impl<T: ?Sized, C: EqualityComparer<T> + ?Sized> EqualityComparer<T> for Arc<C> {
    fn equals(&self, a: &T, b: &T) -> bool {
        (**self).equals(a, b)
    }

    fn is_default(&self) -> bool {
        (**self).is_default()
    }

    fn hash_key(&self, value: &T) -> Option<u64> {
        (**self).hash_key(value)
    }
}

impl<T: ?Sized, C: OrderComparer<T> + ?Sized> OrderComparer<T> for &C {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (**self).compare(a, b)
    }
}

impl<T: ?Sized, C: OrderComparer<T> + ?Sized> OrderComparer<T> for Box<C> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (**self).compare(a, b)
    }
}

impl<T: ?Sized, C: OrderComparer<T> + ?Sized> OrderComparer<T> for Arc<C> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (**self).compare(a, b)
    }
}
