//! Compact representation of multiple forward linked lists.
//!
//! This module defines [``NestedForwardList``]. The reduction
//! algorithm keeps one list of ancestral segments per input node,
//! keyed by [``NodeId``].
//!
//! Most of API for this type is used internally, but
//! it is public in case anyone finds other uses for
//! this data structure.

use crate::newtypes::NodeId;
use thiserror::Error;

/// Errror type for [``NestedForwardList``] operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NestedForwardListError {
    /// Tail of a list is unexpectedly null.
    #[error("Tail is null")]
    NullTail,
    /// Used for invalid index values.
    #[error("Invalid index")]
    InvalidIndex,
}

type IndexType = i32;

/// Result type for [``NestedForwardList``] operations.
pub type Result<T> = std::result::Result<T, NestedForwardListError>;

/// The null value for an index
pub const NULL_INDEX: IndexType = -1;

struct ValueIterator<'list, Value> {
    list: &'list NestedForwardList<Value>,
    current: IndexType,
}

impl<'list, Value> Iterator for ValueIterator<'list, Value> {
    type Item = &'list Value;
    fn next(&mut self) -> Option<Self::Item> {
        if self.current != NULL_INDEX {
            let rv = self.list.data_.get(self.current as usize);
            self.current = self.list.next_[self.current as usize];
            rv
        } else {
            None
        }
    }
}

/// Representation of multiple forward linked
/// lists flattend into vectors.
///
/// # Overview
///
/// A typical representation of a forward list
/// involves `head`, `next`, and `tail` pointers
/// to allow iteration in one direction over
/// a `Value`.
///
/// This type holds many such lists in a single set of
/// flat arrays. The `head` and `tail` arrays are indexed by
/// the list key (a [`NodeId`]); `next` and the values are
/// indexed by insertion order.
///
/// ```
/// use fwdarg_core::NestedForwardList;
/// let mut list = NestedForwardList::<i32>::new();
/// list.reset(2);
/// list.extend(1.into(), 10).unwrap();
/// list.extend(1.into(), 11).unwrap();
/// let values = list.values_iter(1.into()).copied().collect::<Vec<_>>();
/// assert_eq!(values, vec![10, 11]);
/// assert_eq!(list.values_iter(0.into()).count(), 0);
/// ```
#[derive(Debug)]
pub struct NestedForwardList<Value> {
    head_: Vec<IndexType>,
    tail_: Vec<IndexType>,
    next_: Vec<IndexType>,
    data_: Vec<Value>,
}

impl<Value> NestedForwardList<Value> {
    fn key_to_index(&self, k: NodeId) -> Result<usize> {
        let idx = usize::try_from(k).map_err(|_| NestedForwardListError::InvalidIndex)?;
        if idx >= self.head_.len() {
            Err(NestedForwardListError::InvalidIndex)
        } else {
            Ok(idx)
        }
    }

    fn check_data_index(&self, at: IndexType) -> Result<usize> {
        if at < 0 || at as usize >= self.data_.len() {
            Err(NestedForwardListError::InvalidIndex)
        } else {
            Ok(at as usize)
        }
    }

    fn push_value(&mut self, v: Value) -> Result<IndexType> {
        let x = IndexType::try_from(self.data_.len())
            .map_err(|_| NestedForwardListError::InvalidIndex)?;
        self.data_.push(v);
        self.next_.push(NULL_INDEX);
        Ok(x)
    }

    /// Create a new instance
    pub const fn new() -> NestedForwardList<Value> {
        NestedForwardList {
            head_: Vec::<IndexType>::new(),
            tail_: Vec::<IndexType>::new(),
            next_: Vec::<IndexType>::new(),
            data_: Vec::<Value>::new(),
        }
    }

    /// Add an element to the end of list `k`.
    ///
    /// The number of lists grows as needed.
    pub fn extend(&mut self, k: NodeId, v: Value) -> Result<()> {
        let idx = usize::try_from(k).map_err(|_| NestedForwardListError::InvalidIndex)?;
        if idx >= self.head_.len() {
            self.head_.resize(idx + 1, NULL_INDEX);
            self.tail_.resize(idx + 1, NULL_INDEX);
        }

        if self.head_[idx] == NULL_INDEX {
            let x = self.push_value(v)?;
            self.head_[idx] = x;
            self.tail_[idx] = x;
            return Ok(());
        }
        let t = self.tail_[idx];
        if t == NULL_INDEX {
            return Err(NestedForwardListError::NullTail);
        }
        let x = self.push_value(v)?;
        self.next_[t as usize] = x;
        self.tail_[idx] = x;
        Ok(())
    }

    /// Get an immutable reference to a `Value`.
    #[inline]
    pub fn fetch(&self, at: IndexType) -> Result<&Value> {
        let i = self.check_data_index(at)?;
        Ok(&self.data_[i])
    }

    /// Get a mutable reference to a `Value`.
    ///
    /// See [``NestedForwardList::fetch``]
    /// to get an immutable reference.
    #[inline]
    pub fn fetch_mut(&mut self, at: IndexType) -> Result<&mut Value> {
        let i = self.check_data_index(at)?;
        Ok(&mut self.data_[i])
    }

    /// Get the index of the head entry of list `k`.
    #[inline]
    pub fn head(&self, k: NodeId) -> Result<IndexType> {
        let idx = self.key_to_index(k)?;
        Ok(self.head_[idx])
    }

    /// Get the index of the tail entry of list `k`.
    #[inline]
    pub fn tail(&self, k: NodeId) -> Result<IndexType> {
        let idx = self.key_to_index(k)?;
        Ok(self.tail_[idx])
    }

    /// Get the index of the next data element in a list
    #[inline]
    pub fn next(&self, at: IndexType) -> Result<IndexType> {
        let i = self.check_data_index(at)?;
        Ok(self.next_[i])
    }

    /// Clears all data.
    /// Memory is not released.
    pub fn clear(&mut self) {
        self.data_.clear();
        self.head_.clear();
        self.tail_.clear();
        self.next_.clear();
    }

    /// Set the head/tail elements of list `k` to [``NULL_INDEX``].
    ///
    /// # Notes
    ///
    /// This effectively "kills off" the list, preventing traversal.
    /// However, the internal data are unaffected and there is
    /// no attempt to reclaim memory.
    pub fn nullify_list(&mut self, k: NodeId) -> Result<()> {
        let idx = self.key_to_index(k)?;
        self.head_[idx] = NULL_INDEX;
        self.tail_[idx] = NULL_INDEX;
        Ok(())
    }

    /// Clear all data and then hold `newsize` empty lists.
    pub fn reset(&mut self, newsize: usize) {
        self.clear();
        self.head_.resize(newsize, NULL_INDEX);
        self.tail_.resize(newsize, NULL_INDEX);
    }

    /// Return an [`Iterator`] over the values in list `k`.
    ///
    /// # Panics
    ///
    /// If `k` is out of range.
    pub fn values_iter(&self, k: NodeId) -> impl Iterator<Item = &Value> + '_ {
        let current = match self.head(k) {
            Ok(h) => h,
            Err(e) => panic!("{}", e),
        };
        ValueIterator {
            list: self,
            current,
        }
    }

    /// Apply `f` to each value in list `k`.
    ///
    /// Iteration stops early if `f` returns `false`.
    ///
    /// # Errors
    ///
    /// [`NestedForwardListError::InvalidIndex`] if `k` is out of range.
    pub fn for_each(&self, k: NodeId, mut f: impl FnMut(&Value) -> bool) -> Result<()> {
        let mut itr = self.head(k)?;
        while itr != NULL_INDEX {
            let i = itr as usize;
            if !f(&self.data_[i]) {
                break;
            }
            itr = self.next_[i];
        }
        Ok(())
    }

    /// Return number of lists.
    pub fn len(&self) -> usize {
        self.head_.len()
    }

    /// `true` if there are no lists.
    pub fn is_empty(&self) -> bool {
        self.head_.is_empty()
    }
}

impl<Value> Default for NestedForwardList<Value> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    type ListType = NestedForwardList<i32>;

    fn make_data_for_testing() -> ListType {
        let mut list = ListType::new();
        list.reset(2);
        for i in 0..3 {
            list.extend(0.into(), 2 * i).unwrap();
        }
        for i in 0..5 {
            list.extend(1.into(), 3 * i).unwrap();
        }
        assert_eq!(list.head_.len(), 2);
        assert_eq!(list.data_.len(), 8);
        assert_eq!(list.tail_.len(), 2);
        list
    }

    #[test]
    fn test_head_tail() {
        let list = make_data_for_testing();
        assert_eq!(*list.fetch(list.head(0.into()).unwrap()).unwrap(), 0);
        assert_eq!(*list.fetch(list.tail(0.into()).unwrap()).unwrap(), 4);
        assert_eq!(*list.fetch(list.head(1.into()).unwrap()).unwrap(), 0);
        assert_eq!(*list.fetch(list.tail(1.into()).unwrap()).unwrap(), 12);
    }

    #[test]
    fn test_fetch_mut() {
        let mut list = make_data_for_testing();
        let x = list.tail(1.into()).unwrap();
        *list.fetch_mut(x).unwrap() += 1;
        assert_eq!(*list.fetch(list.tail(1.into()).unwrap()).unwrap(), 13);
    }

    #[test]
    fn test_explicit_traversal() {
        let list = make_data_for_testing();

        let mut output = Vec::<i32>::new();
        let mut itr = list.head(1.into()).unwrap();
        while itr != NULL_INDEX {
            output.push(*list.fetch(itr).unwrap());
            itr = list.next(itr).unwrap();
        }
        assert_eq!(output, vec![0, 3, 6, 9, 12]);
    }

    #[test]
    fn test_nullify() {
        let mut list = make_data_for_testing();
        list.nullify_list(0.into()).unwrap();
        assert_eq!(list.values_iter(0.into()).count(), 0);
        // a nullified list can be refilled
        list.extend(0.into(), 100).unwrap();
        assert_eq!(list.values_iter(0.into()).copied().collect::<Vec<_>>(), vec![100]);
    }

    #[test]
    fn test_invalid_keys() {
        let mut list = make_data_for_testing();
        assert_eq!(
            list.extend(NodeId::NULL, 2),
            Err(NestedForwardListError::InvalidIndex)
        );
        assert_eq!(list.head(5.into()), Err(NestedForwardListError::InvalidIndex));
        assert!(list.for_each(NodeId::NULL, |_| true).is_err());
    }

    #[test]
    fn test_for_each_stops_early() {
        let list = make_data_for_testing();
        let mut seen = vec![];
        list.for_each(1.into(), |x| {
            seen.push(*x);
            *x < 6
        })
        .unwrap();
        assert_eq!(seen, vec![0, 3, 6]);
    }

    #[test]
    fn test_reset() {
        let mut list = make_data_for_testing();
        list.reset(4);
        assert_eq!(list.len(), 4);
        for i in 0..4 {
            assert_eq!(list.head(i.into()).unwrap(), NULL_INDEX);
        }
    }
}
