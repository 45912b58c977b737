use fwdarg_core::NodeId;
use std::cmp::Ordering;

/// Order in which samples are handed to the reduction.
///
/// Ids are sorted from largest to smallest. The reduction gives
/// the i-th sample output id `i`, and the current generation
/// always holds the largest ids, so after a compaction the
/// current generation occupies rows `[0, 2N)` and ancestral
/// samples follow.
///
/// ```
/// use std::cmp::Ordering;
/// use fwdarg_core::NodeId;
/// assert_eq!(fwdarg::descending(&NodeId::from(3), &NodeId::from(1)), Ordering::Less);
/// ```
pub fn descending(a: &NodeId, b: &NodeId) -> Ordering {
    b.cmp(a)
}

/// A set of sample ids kept in [`descending`] order.
///
/// Duplicates collapse. They occur when an ancestral
/// retention lands on a cohort that is also the current
/// generation at compaction time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SampleSet {
    ids: Vec<NodeId>,
}

impl SampleSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with the union of `ancestral` and `current`.
    ///
    /// The allocation is reused.
    pub fn rebuild_from_union<A, C>(&mut self, ancestral: A, current: C)
    where
        A: IntoIterator<Item = NodeId>,
        C: IntoIterator<Item = NodeId>,
    {
        self.ids.clear();
        self.ids.extend(ancestral);
        self.ids.extend(current);
        self.ids.sort_unstable_by(descending);
        self.ids.dedup();
    }

    /// Build the union of `ancestral` and `current`.
    ///
    /// ```
    /// use fwdarg::SampleSet;
    /// use fwdarg_core::NodeId;
    /// let s = SampleSet::from_union(
    ///     [2, 7].map(NodeId::from),
    ///     [7, 8, 9].map(NodeId::from),
    /// );
    /// assert_eq!(s.as_slice(), &[9, 8, 7, 2].map(NodeId::from));
    /// ```
    pub fn from_union<A, C>(ancestral: A, current: C) -> Self
    where
        A: IntoIterator<Item = NodeId>,
        C: IntoIterator<Item = NodeId>,
    {
        let mut rv = Self::new();
        rv.rebuild_from_union(ancestral, current);
        rv
    }

    /// `true` if `id` is in the set.
    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.binary_search_by(|x| descending(x, &id)).is_ok()
    }

    /// The ids, in order.
    pub fn as_slice(&self) -> &[NodeId] {
        &self.ids
    }

    /// Number of ids
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
