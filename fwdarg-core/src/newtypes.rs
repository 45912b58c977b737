type LowLevelIdType = i32;
type LowLevelTimeType = f64;
type LowLevelPositionType = f64;

/// A row id in a [`NodeTable`](crate::NodeTable).
///
/// ```
/// # use fwdarg_core::NodeId;
/// let n = NodeId::from(-1);
/// assert_eq!(n, NodeId::NULL);
/// assert!(n.is_null());
/// let n = NodeId::from(3);
/// assert_eq!(n, 3);
/// assert_eq!(usize::try_from(n).unwrap(), 3);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, std::hash::Hash)]
pub struct NodeId(pub(crate) LowLevelIdType);

/// A row id in an [`EdgeTable`](crate::EdgeTable).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, std::hash::Hash)]
#[repr(transparent)]
pub struct EdgeId(pub(crate) LowLevelIdType);

/// The population (deme) a node belongs to.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, std::hash::Hash)]
pub struct PopulationId(pub(crate) LowLevelIdType);

impl_table_id!(NodeId, LowLevelIdType);
impl_table_id!(EdgeId, LowLevelIdType);
impl_table_id!(PopulationId, LowLevelIdType);

impl NodeId {
    /// Largest representable node id.
    pub const MAX: NodeId = NodeId(LowLevelIdType::MAX);

    /// Add `delta` to a non-null id.
    ///
    /// # Returns
    ///
    /// * `None` if `self` is NULL or the result overflows.
    ///
    /// ```
    /// # use fwdarg_core::NodeId;
    /// assert_eq!(NodeId::from(1).checked_add(2), Some(NodeId::from(3)));
    /// assert_eq!(NodeId::MAX.checked_add(1), None);
    /// assert_eq!(NodeId::NULL.checked_add(1), None);
    /// ```
    pub fn checked_add(self, delta: usize) -> Option<NodeId> {
        if self.is_null() {
            return None;
        }
        let delta = LowLevelIdType::try_from(delta).ok()?;
        self.0.checked_add(delta).map(NodeId)
    }
}

/// A time value.
///
/// Inside the buffer of newly-born nodes, time counts
/// generations forwards. Inside a [`TableCollection`](crate::TableCollection)
/// time counts generations backwards: parents are older than,
/// and therefore have larger time values than, their children.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Time(pub(crate) LowLevelTimeType);

impl Time {
    /// Minimum value
    pub const MIN: Time = Time(LowLevelTimeType::MIN);
    /// Maximum value
    pub const MAX: Time = Time(LowLevelTimeType::MAX);

    /// Return the underlying value
    pub fn raw(self) -> LowLevelTimeType {
        self.0
    }

    /// `true` if the value is neither NaN nor infinite.
    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
}

impl PartialOrd<Time> for Time {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match self.0.partial_cmp(&other.0) {
            None => panic!("fatal: partial_cmp for Time received non-finite values"),
            Some(x) => Some(x),
        }
    }
}

impl From<i64> for Time {
    fn from(value: i64) -> Self {
        Self(value as LowLevelTimeType)
    }
}

impl From<i32> for Time {
    fn from(value: i32) -> Self {
        Self(value as LowLevelTimeType)
    }
}

impl std::ops::Add for Time {
    type Output = Time;
    fn add(self, rhs: Time) -> Time {
        Time(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Time {
    type Output = Time;
    fn sub(self, rhs: Time) -> Time {
        Time(self.0 - rhs.0)
    }
}

impl_float_comparisons!(Time);

/// A position/coordinate within a genome.
///
/// Positions are totally ordered; NaN is rejected
/// by [`Position::new`] and by table validation.
#[repr(transparent)]
#[derive(Copy, Clone, Debug)]
pub struct Position(pub(crate) LowLevelPositionType);

impl Position {
    /// Minimum value
    pub const MIN: Position = Position(0.0);
    /// Maximum value
    pub const MAX: Position = Position(LowLevelPositionType::MAX);

    /// Create a new Position
    ///
    /// # Returns
    ///
    /// * `Some` if `position` is finite and non-negative
    /// * `None` otherwise
    ///
    /// ```
    /// let p = fwdarg_core::Position::new(0.5).unwrap();
    /// assert_eq!(p, 0.5);
    /// assert!(fwdarg_core::Position::new(-0.5).is_none());
    /// assert!(fwdarg_core::Position::new(f64::NAN).is_none());
    /// ```
    pub fn new(position: LowLevelPositionType) -> Option<Self> {
        if position.is_finite() && position >= 0.0 {
            Some(Self(position))
        } else {
            None
        }
    }

    /// Return the underlying value
    pub fn raw(self) -> LowLevelPositionType {
        self.0
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Position {}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl_float_comparisons!(Position);
