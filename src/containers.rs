//! The SEQUENCE OF and SET OF containers.
//!
//! Both containers own their elements. They differ only in how an element
//! is removed: a SEQUENCE OF keeps the order of the remaining elements
//! while a SET OF, whose order carries no meaning, moves the last element
//! into the gap.

use std::{ops, slice, vec};


//------------ SequenceOf ----------------------------------------------------

/// The elements of a SEQUENCE OF value.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SequenceOf<T>(Vec<T>);

//------------ SetOf ---------------------------------------------------------

/// The elements of a SET OF value.
///
/// Although the order of elements carries no meaning, comparison is by
/// position. DER sorts the elements when encoding, so decoding a DER
/// encoded value always produces the same order.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SetOf<T>(Vec<T>);


//------------ Common Methods ------------------------------------------------

macro_rules! container_impl {
    ( $name:ident ) => {
        impl<T> $name<T> {
            /// Creates a new, empty container.
            pub fn new() -> Self {
                $name(Vec::new())
            }

            /// Creates a new, empty container with room for `capacity`
            /// elements.
            pub fn with_capacity(capacity: usize) -> Self {
                $name(Vec::with_capacity(capacity))
            }

            /// Appends an element.
            pub fn push(&mut self, element: T) {
                self.0.push(element)
            }

            /// Removes all elements.
            pub fn clear(&mut self) {
                self.0.clear()
            }

            /// Returns the elements as a slice.
            pub fn as_slice(&self) -> &[T] {
                self.0.as_slice()
            }

            /// Returns an iterator over the elements.
            pub fn iter(&self) -> slice::Iter<T> {
                self.0.iter()
            }

            /// Converts the container into a vec of its elements.
            pub fn into_vec(self) -> Vec<T> {
                self.0
            }
        }

        impl<T> Default for $name<T> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<T> From<Vec<T>> for $name<T> {
            fn from(vec: Vec<T>) -> Self {
                $name(vec)
            }
        }

        impl<T> FromIterator<T> for $name<T> {
            fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
                $name(iter.into_iter().collect())
            }
        }

        impl<T> ops::Deref for $name<T> {
            type Target = [T];

            fn deref(&self) -> &[T] {
                self.0.as_slice()
            }
        }

        impl<T> ops::DerefMut for $name<T> {
            fn deref_mut(&mut self) -> &mut [T] {
                self.0.as_mut_slice()
            }
        }

        impl<T> IntoIterator for $name<T> {
            type Item = T;
            type IntoIter = vec::IntoIter<T>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.into_iter()
            }
        }

        impl<'a, T> IntoIterator for &'a $name<T> {
            type Item = &'a T;
            type IntoIter = slice::Iter<'a, T>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.iter()
            }
        }
    }
}

container_impl!(SequenceOf);
container_impl!(SetOf);

impl<T> SequenceOf<T> {
    /// Removes the element at `index`, keeping the order of the others.
    ///
    /// Returns `None` if there is no such element.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index < self.0.len() {
            Some(self.0.remove(index))
        }
        else {
            None
        }
    }
}

impl<T> SetOf<T> {
    /// Removes the element at `index`, replacing it with the last one.
    ///
    /// Returns `None` if there is no such element.
    pub fn swap_remove(&mut self, index: usize) -> Option<T> {
        if index < self.0.len() {
            Some(self.0.swap_remove(index))
        }
        else {
            None
        }
    }
}


//============ Tests =========================================================
