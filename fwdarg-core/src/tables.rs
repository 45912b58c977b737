use crate::newtypes::{EdgeId, NodeId, PopulationId, Position, Time};
use bitflags::bitflags;
use std::cmp::Ordering;
use thiserror::Error;

/// Error type related to [``TableCollection``]
#[derive(Error, Debug, PartialEq)]
pub enum TablesError {
    /// Returned by [``TableCollection::new``].
    #[error("Invalid genome length")]
    InvalidGenomeLength,
    /// Returned when invalid node `ID`s are encountered.
    #[error("Invalid node: {found:?}")]
    InvalidNodeValue {
        /// The invalid `ID`
        found: NodeId,
    },
    /// Returned when invalid positions are encountered.
    #[error("Invalid value for position: {found:?}")]
    InvalidPosition {
        /// The invalid position
        found: Position,
    },
    /// Returned when an [``Edge``]'s left/right
    /// values are invalid.
    #[error("Invalid position range: {found:?}")]
    InvalidLeftRight {
        /// The invalid `(left, right)`.
        found: (Position, Position),
    },
    /// Returned when non-finite times are encountered.
    #[error("Invalid value for time: {found:?}")]
    InvalidTime {
        /// The invalid time
        found: Time,
    },
    #[error("Invalid value for population: {found:?}")]
    /// Returned when a population `ID` is invalid.
    InvalidPopulation {
        /// The invalid population `ID`
        found: PopulationId,
    },
    /// A row count no longer fits in the id type.
    #[error("Table row {value} overflows the id type")]
    IdOverflow {
        /// The row index that could not be represented
        value: usize,
    },
    /// A NULL id was converted to an index.
    #[error("NULL id used as an index")]
    NullId,
    #[error("Parent is NULL")]
    /// Can be returned by [``validate_edge_table``]
    NullParent,
    #[error("Child is NULL")]
    /// Can be returned by [``validate_edge_table``]
    NullChild,
    #[error("Node is out of bounds")]
    /// Can be returned by [``validate_edge_table``]
    NodeOutOfBounds,
    #[error("Node time order violation")]
    /// Can be returned by [``validate_edge_table``]
    NodeTimesUnordered,
    #[error("Parents not sorted by time")]
    /// Can be returned by [``validate_edge_table``]
    ParentTimesUnsorted,
    #[error("Parents not contiguous")]
    /// Can be returned by [``validate_edge_table``]
    ParentsNotContiguous,
    #[error("Edges not sorted by child")]
    /// Can be returned by [``validate_edge_table``]
    EdgesNotSortedByChild,
    #[error("Edges not sorted by left")]
    /// Can be returned by [``validate_edge_table``]
    EdgesNotSortedByLeft,
    #[error("Duplicate edges")]
    /// Can be returned by [``validate_edge_table``]
    DuplicateEdges,
}

/// Result type for operations on tables
pub type TablesResult<T> = std::result::Result<T, TablesError>;

/// A Node of an ancestry graph
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Node {
    /// Birth time
    pub time: Time,
    /// Population of node
    pub population: PopulationId,
    /// Bit flags. See [`NodeFlags`].
    pub flags: u32,
}

/// An Edge is a transmission event
///
/// An edge is a record of transmission of
/// a half-open chunk of genome `[left, right)`
/// from `parent` to `child`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Edge {
    /// Left end
    pub left: Position,
    /// Right end
    pub right: Position,
    /// Index of parent in a [NodeTable](type.NodeTable.html)
    pub parent: NodeId,
    /// Index of child in a [NodeTable](type.NodeTable.html)
    pub child: NodeId,
}

/// A node table
pub type NodeTable = Vec<Node>;
/// An edge table
pub type EdgeTable = Vec<Edge>;

bitflags! {
    /// Set properties of a [`Node`].
    ///
    /// The first 16 bits are reserved for internal use.
    /// Client code is free to use the remaining bits
    /// as needed.
    #[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
    pub struct NodeFlags: u32 {
        /// Default
        const NONE = 0;
        /// The node is a sample node.
        const IS_SAMPLE = 1 << 0;
    }
}

fn position_valid(x: Position) -> TablesResult<()> {
    if x.is_valid() {
        Ok(())
    } else {
        Err(TablesError::InvalidPosition { found: x })
    }
}

fn node_non_negative(x: NodeId) -> TablesResult<()> {
    if x < 0 {
        Err(TablesError::InvalidNodeValue { found: x })
    } else {
        Ok(())
    }
}

fn time_finite(x: Time) -> TablesResult<()> {
    if x.is_finite() {
        Ok(())
    } else {
        Err(TablesError::InvalidTime { found: x })
    }
}

fn edge_table_add_row(
    edges: &mut EdgeTable,
    left: Position,
    right: Position,
    parent: NodeId,
    child: NodeId,
) -> TablesResult<EdgeId> {
    position_valid(left)?;
    position_valid(right)?;
    if right <= left {
        return Err(TablesError::InvalidLeftRight {
            found: (left, right),
        });
    }
    node_non_negative(parent)?;
    node_non_negative(child)?;

    edges.push(Edge {
        left,
        right,
        parent,
        child,
    });

    EdgeId::try_from(edges.len() - 1)
}

fn node_table_add_row(
    nodes: &mut NodeTable,
    time: Time,
    population: PopulationId,
    flags: u32,
) -> TablesResult<NodeId> {
    time_finite(time)?;
    if population.is_null() {
        return Err(TablesError::InvalidPopulation { found: population });
    }
    nodes.push(Node {
        time,
        population,
        flags,
    });

    NodeId::try_from(nodes.len() - 1)
}

fn sort_edges(nodes: &[Node], edges: &mut [Edge]) {
    edges.sort_by(|a, b| {
        let ta = nodes[a.parent.0 as usize].time;
        let tb = nodes[b.parent.0 as usize].time;
        match ta.partial_cmp(&tb) {
            Some(Ordering::Equal) => {
                if a.parent == b.parent {
                    if a.child == b.child {
                        return a.left.cmp(&b.left);
                    }
                    a.child.cmp(&b.child)
                } else {
                    a.parent.cmp(&b.parent)
                }
            }
            Some(x) => x,
            None => panic!("invalid parent times"),
        }
    });
}

/// Perform a data integrity check on an [``EdgeTable``].
///
/// This checks, amongst other things, the sorting order
/// of the edges.
///
/// # Parameters
///
/// * `len`, the genome length of the tables.
///          Best obtained via [``TableCollection::genome_length``].
/// * `edges`, the [``EdgeTable``]
/// * `nodes`, the [``NodeTable``]
///
/// # Return
///
/// Returns ``Ok(true)`` if the tables pass all tests.
/// This return value allows this function to be used in
/// things like [``debug_assert``].
///
/// # Errors
///
/// Will return [``TablesError``] if the tables are not valid.
///
/// # Example
///
/// ```
/// let mut tables = fwdarg_core::TableCollection::new(1.0).unwrap();
/// let parent = tables.add_node(1.0, 0).unwrap();
/// let child = tables.add_node(0.0, 0).unwrap();
/// tables.add_edge(0.0, 1.0, parent, child).unwrap();
/// let rv = fwdarg_core::validate_edge_table(tables.genome_length(),
///                                          tables.edges(),
///                                          tables.nodes()).unwrap();
/// assert!(rv);
/// ```
pub fn validate_edge_table(len: Position, edges: &[Edge], nodes: &[Node]) -> TablesResult<bool> {
    if edges.is_empty() {
        return Ok(true);
    }
    let mut parent_seen = vec![false; nodes.len()];
    let mut last_parent: usize = edges[0].parent.0 as usize;
    let mut last_child: usize = edges[0].child.0 as usize;
    let mut last_left: Position = edges[0].left;

    for (i, edge) in edges.iter().enumerate() {
        if edge.parent.is_null() {
            return Err(TablesError::NullParent);
        }
        if edge.child.is_null() {
            return Err(TablesError::NullChild);
        }
        if edge.parent < 0 || edge.parent.0 as usize >= nodes.len() {
            return Err(TablesError::NodeOutOfBounds);
        }
        if edge.child < 0 || edge.child.0 as usize >= nodes.len() {
            return Err(TablesError::NodeOutOfBounds);
        }
        if !edge.left.is_valid() || edge.left > len {
            return Err(TablesError::InvalidPosition { found: edge.left });
        }
        if !edge.right.is_valid() || edge.right > len {
            return Err(TablesError::InvalidPosition { found: edge.right });
        }
        if edge.left >= edge.right {
            return Err(TablesError::InvalidLeftRight {
                found: (edge.left, edge.right),
            });
        }

        // time runs backwards: parents are strictly older
        if nodes[edge.child.0 as usize].time >= nodes[edge.parent.0 as usize].time {
            return Err(TablesError::NodeTimesUnordered);
        }

        if parent_seen[edge.parent.0 as usize] {
            return Err(TablesError::ParentsNotContiguous);
        }

        if i > 0 {
            match nodes[edge.parent.0 as usize]
                .time
                .partial_cmp(&nodes[last_parent].time)
            {
                Some(Ordering::Less) => {
                    return Err(TablesError::ParentTimesUnsorted);
                }
                Some(Ordering::Equal) => {
                    if edge.parent.0 as usize == last_parent {
                        if (edge.child.0 as usize) < last_child {
                            return Err(TablesError::EdgesNotSortedByChild);
                        }
                        if edge.child.0 as usize == last_child {
                            match edge.left.cmp(&last_left) {
                                Ordering::Greater => (),
                                Ordering::Equal => return Err(TablesError::DuplicateEdges),
                                Ordering::Less => return Err(TablesError::EdgesNotSortedByLeft),
                            }
                        }
                    } else {
                        parent_seen[last_parent] = true;
                    }
                }
                Some(_) => parent_seen[last_parent] = true,
                None => panic!("invalid node times"),
            }
        }
        last_parent = edge.parent.0 as usize;
        last_child = edge.child.0 as usize;
        last_left = edge.left;
    }

    Ok(true)
}

/// Check that every node time is finite.
pub fn validate_node_table(nodes: &[Node]) -> TablesResult<()> {
    for n in nodes {
        time_finite(n.time)?;
    }
    Ok(())
}

/// A collection of node and edge tables.
///
/// Row indexes are node ids.  Rows are only ever appended,
/// except when a simplification replaces the tables
/// wholesale (see [`crate::simplify_tables`]).
#[derive(Clone, Debug)]
pub struct TableCollection {
    length_: Position, // Not visible outside of this module

    pub(crate) nodes_: NodeTable,
    pub(crate) edges_: EdgeTable,
}

impl TableCollection {
    /// Create a new instance.
    ///
    /// # Parameters
    ///
    /// * `genome_length`: the total genome length for the tables.
    ///
    /// # Errors
    ///
    /// Will return [``TablesError``] if `genome_length` is not
    /// finite and positive.
    pub fn new<P: Into<Position>>(genome_length: P) -> TablesResult<TableCollection> {
        let p = genome_length.into();
        if !p.is_valid() || p.0 <= 0.0 {
            return Err(TablesError::InvalidGenomeLength);
        }

        Ok(TableCollection {
            length_: p,
            nodes_: NodeTable::new(),
            edges_: EdgeTable::new(),
        })
    }

    /// Add a [``Node``] to the [``NodeTable``]
    ///
    /// # Errors
    ///
    /// Will return [``TablesError``] if `time` is not finite,
    /// `population` is NULL, or the new row overflows [`NodeId`].
    ///
    /// # Example
    ///
    /// ```
    /// let mut tables = fwdarg_core::TableCollection::new(1.0).unwrap();
    /// let id = tables.add_node(1. , 0).unwrap();
    /// assert_eq!(id, 0);
    /// ```
    pub fn add_node<T: Into<Time>, D: Into<PopulationId>>(
        &mut self,
        time: T,
        population: D,
    ) -> TablesResult<NodeId> {
        self.add_node_with_flags(time, population, NodeFlags::default().bits())
    }

    /// Add a [``Node``] to the [``NodeTable``] with flags set.
    ///
    /// ```
    /// use fwdarg_core::NodeFlags;
    /// let mut tables = fwdarg_core::TableCollection::new(1.0).unwrap();
    /// let id = tables.add_node_with_flags(0., 0, NodeFlags::IS_SAMPLE.bits()).unwrap();
    /// assert!(tables.node(id).flags & NodeFlags::IS_SAMPLE.bits() > 0);
    /// ```
    pub fn add_node_with_flags<T: Into<Time>, D: Into<PopulationId>>(
        &mut self,
        time: T,
        population: D,
        flags: u32,
    ) -> TablesResult<NodeId> {
        node_table_add_row(&mut self.nodes_, time.into(), population.into(), flags)
    }

    /// Add an [``Edge``] to the [``EdgeTable``].
    ///
    /// # Errors
    ///
    /// Will return [``TablesError``] if any of the input
    /// are invalid.
    ///
    /// # Example
    ///
    /// ```
    /// let mut tables = fwdarg_core::TableCollection::new(1.0).unwrap();
    /// let id = tables.add_edge(0.0, 0.5, 5, 9).unwrap();
    /// assert_eq!(id, 0);
    /// ```
    pub fn add_edge<L: Into<Position>, R: Into<Position>, P: Into<NodeId>, C: Into<NodeId>>(
        &mut self,
        left: L,
        right: R,
        parent: P,
        child: C,
    ) -> TablesResult<EdgeId> {
        let left = left.into();
        let right = right.into();
        if right > self.length_ {
            return Err(TablesError::InvalidPosition { found: right });
        }
        edge_table_add_row(&mut self.edges_, left, right, parent.into(), child.into())
    }

    /// Append rows to the node table.
    ///
    /// # Errors
    ///
    /// Validation is the same as for [`TableCollection::add_node`].
    /// On error, the node table is unchanged.
    pub fn append_nodes(&mut self, nodes: &[Node]) -> TablesResult<()> {
        validate_node_table(nodes)?;
        if let Some(n) = nodes.iter().find(|n| n.population.is_null()) {
            return Err(TablesError::InvalidPopulation {
                found: n.population,
            });
        }
        let total = self.nodes_.len() + nodes.len();
        if total > 0 {
            NodeId::try_from(total - 1)?;
        }
        self.nodes_.extend_from_slice(nodes);
        Ok(())
    }

    /// Append rows to the edge table.
    ///
    /// # Errors
    ///
    /// Validation is the same as for [`TableCollection::add_edge`].
    /// On error, the edge table is unchanged.
    pub fn append_edges(&mut self, edges: &[Edge]) -> TablesResult<()> {
        for e in edges {
            position_valid(e.left)?;
            position_valid(e.right)?;
            if e.right <= e.left || e.right > self.length_ {
                return Err(TablesError::InvalidLeftRight {
                    found: (e.left, e.right),
                });
            }
            node_non_negative(e.parent)?;
            node_non_negative(e.child)?;
        }
        self.edges_.extend_from_slice(edges);
        Ok(())
    }

    /// Add `dt` to the time of every node.
    ///
    /// Used to age existing nodes when time is measured
    /// backwards from the present.
    pub fn shift_node_times<T: Into<Time>>(&mut self, dt: T) -> TablesResult<()> {
        let dt = dt.into();
        time_finite(dt)?;
        for n in self.nodes_.iter_mut() {
            n.time = n.time + dt;
        }
        Ok(())
    }

    /// Get genome length
    pub fn genome_length(&self) -> Position {
        self.length_
    }

    /// Return immutable reference to the [edge table](type.EdgeTable.html)
    pub fn edges(&self) -> &[Edge] {
        &self.edges_
    }

    /// Return number of edges
    pub fn num_edges(&self) -> usize {
        self.edges_.len()
    }

    /// Return number of nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes_.len()
    }

    /// Return immutable reference to [node table](type.NodeTable.html)
    pub fn nodes(&self) -> &[Node] {
        &self.nodes_
    }

    /// Return the i-th [``Node``].
    ///
    /// # Panics
    ///
    /// If `i` is NULL or out of range.
    pub fn node<N: Into<NodeId>>(&self, i: N) -> &Node {
        &self.nodes_[i.into().0 as usize]
    }

    /// Get a node by id.
    ///
    /// Returns `None` if the id is NULL or out of range.
    ///
    /// ```
    /// let mut tables = fwdarg_core::TableCollection::new(1.0).unwrap();
    /// tables.add_node(0., 0).unwrap();
    /// assert!(tables.get_node(0).is_some());
    /// assert!(tables.get_node(1).is_none());
    /// assert!(tables.get_node(-1).is_none());
    /// ```
    pub fn get_node<N: Into<NodeId>>(&self, i: N) -> Option<&Node> {
        let i = usize::try_from(i.into()).ok()?;
        self.nodes_.get(i)
    }

    /// Remove all rows.
    pub fn clear(&mut self) {
        self.nodes_.clear();
        self.edges_.clear();
    }

    /// Sort the edge table into the order required by
    /// [`crate::simplify_tables`]:
    /// parent time (youngest first), then parent id, child id,
    /// and left coordinate.
    ///
    /// Node rows are never reordered, so node ids remain valid.
    ///
    /// # Panics
    ///
    /// If any edge refers to a node outside the node table.
    /// Use [`TableCollection::validate_edge_references`] first
    /// when the edges come from an untrusted source.
    pub fn sort_edges(&mut self) {
        sort_edges(&self.nodes_, &mut self.edges_);
    }

    /// Check that every edge refers to an existing node.
    pub fn validate_edge_references(&self) -> TablesResult<()> {
        let n = self.nodes_.len();
        for e in &self.edges_ {
            if e.parent.is_null() {
                return Err(TablesError::NullParent);
            }
            if e.child.is_null() {
                return Err(TablesError::NullChild);
            }
            if e.parent.0 as usize >= n || e.child.0 as usize >= n {
                return Err(TablesError::NodeOutOfBounds);
            }
        }
        Ok(())
    }

    /// Validate node times and the sorted edge table.
    ///
    /// See [`validate_edge_table`].
    pub fn validate_edges(&self) -> TablesResult<bool> {
        validate_node_table(&self.nodes_)?;
        validate_edge_table(self.length_, &self.edges_, &self.nodes_)
    }
}
