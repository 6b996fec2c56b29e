//! Cardinality-aware result shape for lookups.

use serde::Serialize;

/// Result of a lookup that may cover one or many identifiers.
///
/// A single identifier yields the bare value; two or more yield the values in
/// the order the identifiers were given. Serializes untagged, so JSON output is
/// an object for `One` and an array for `Many`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Delivery<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Delivery<T> {
    /// Number of values carried.
    pub fn len(&self) -> usize {
        match self {
            Delivery::One(_) => 1,
            Delivery::Many(values) => values.len(),
        }
    }

    /// Returns true if no values are carried.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true for the single-identifier shape.
    pub fn is_one(&self) -> bool {
        matches!(self, Delivery::One(_))
    }

    /// Returns the bare value of a single-identifier delivery.
    pub fn as_one(&self) -> Option<&T> {
        match self {
            Delivery::One(value) => Some(value),
            Delivery::Many(_) => None,
        }
    }

    /// Returns the ordered values of a multi-identifier delivery.
    pub fn as_many(&self) -> Option<&[T]> {
        match self {
            Delivery::One(_) => None,
            Delivery::Many(values) => Some(values),
        }
    }

    /// Flattens into a vector, losing the shape distinction.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Delivery::One(value) => vec![value],
            Delivery::Many(values) => values,
        }
    }

    /// Iterates over the carried values in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            Delivery::One(value) => std::slice::from_ref(value).iter(),
            Delivery::Many(values) => values.iter(),
        }
    }

    /// Applies `f` to every value, keeping the shape.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Delivery<U> {
        match self {
            Delivery::One(value) => Delivery::One(f(value)),
            Delivery::Many(values) => Delivery::Many(values.into_iter().map(f).collect()),
        }
    }
}
