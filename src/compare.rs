//! Comparison rules for the tree engine.
//!
//! A `TreeMap` is configured with one `Comparator`. Two keys are the same
//! key iff the comparator reports `Ordering::Equal`.

use core::cmp::Ordering;

/// A total order over `T`.
pub trait Comparator<T: ?Sized> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// The key type's own `Ord` implementation.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct NaturalOrder;

impl<T: Ord + ?Sized> Comparator<T> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// `Ord`, descending.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ReverseOrder;

impl<T: Ord + ?Sized> Comparator<T> for ReverseOrder {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        b.cmp(a)
    }
}

/// Adapts a closure. Not persistable: closures carry no serializable state.
#[derive(Copy, Clone)]
pub struct OrderBy<F>(pub F);

impl<T: ?Sized, F> Comparator<T> for OrderBy<F>
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.0)(a, b)
    }
}

impl<F> core::fmt::Debug for OrderBy<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("OrderBy(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_and_reverse_disagree() {
        assert_eq!(NaturalOrder.compare(&1, &2), Ordering::Less);
        assert_eq!(ReverseOrder.compare(&1, &2), Ordering::Greater);
        assert_eq!(NaturalOrder.compare("b", "a"), Ordering::Greater);
    }

    #[test]
    fn closure_comparator() {
        let by_len = OrderBy(|a: &String, b: &String| a.len().cmp(&b.len()));
        assert_eq!(
            by_len.compare(&"aaa".to_string(), &"b".to_string()),
            Ordering::Greater
        );
        assert_eq!(
            by_len.compare(&"ab".to_string(), &"cd".to_string()),
            Ordering::Equal
        );
    }
}
