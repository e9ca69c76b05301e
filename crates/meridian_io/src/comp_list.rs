//! A list optimized for the common zero- and one-element cases.
//!
//! Most effect nodes have exactly one subscriber, so subscriber lists only
//! allocate once a second entry arrives.

use core::mem;
use core::slice;

/// Compact list: empty, a single element, or a vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompList<T> {
    /// No elements.
    Empty,
    /// Exactly one element.
    One(T),
    /// Two or more elements, in insertion order.
    Many(Vec<T>),
}

impl<T> Default for CompList<T> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<T> CompList<T> {
    /// Appends `item`, keeping insertion order.
    pub fn push(&mut self, item: T) {
        *self = match mem::take(self) {
            Self::Empty => Self::One(item),
            Self::One(first) => Self::Many(vec![first, item]),
            Self::Many(mut items) => {
                items.push(item);
                Self::Many(items)
            }
        };
    }

    /// Returns the elements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::Empty => &[],
            Self::One(item) => slice::from_ref(item),
            Self::Many(items) => items,
        }
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns true if the list holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl<T> IntoIterator for CompList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            Self::Empty => Vec::new().into_iter(),
            Self::One(item) => vec![item].into_iter(),
            Self::Many(items) => items.into_iter(),
        }
    }
}

impl<'a, T> IntoIterator for &'a CompList<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
