use crate::nested_forward_list::{NestedForwardList, NestedForwardListError, NULL_INDEX};
use crate::newtypes::{NodeId, Position};
use crate::segment::Segment;
use crate::tables::*;
use bitflags::bitflags;
use thiserror::Error;

/// Error type returned by [`simplify_tables`].
///
/// Some members of this enum implement ``From``
/// in order to redirect other error types.
#[derive(Error, Debug, PartialEq)]
pub enum SimplificationError {
    /// A sample id is NULL.
    #[error("sample node is NULL")]
    NullSample,
    /// A sample id does not index a row of the node table.
    #[error("sample {sample} out of range for {num_nodes} nodes")]
    SampleOutOfRange {
        /// The sample id
        sample: NodeId,
        /// Number of rows in the node table
        num_nodes: usize,
    },
    /// Internal bookkeeping went wrong.
    #[error("{value:?}")]
    Internal {
        /// The error message
        value: String,
    },
    /// A redirection of a [``NestedForwardListError``].
    #[error("{value:?}")]
    ListError {
        /// The redirected error
        #[from]
        value: NestedForwardListError,
    },
    /// A redirection of a [``TablesError``]
    #[error("{value:?}")]
    TablesError {
        /// The redirected error
        #[from]
        value: TablesError,
    },
}

type AncestryList = NestedForwardList<Segment>;

#[derive(Debug)]
struct SegmentOverlapper {
    segment_queue: Vec<Segment>,
    overlapping: Vec<Segment>,
    left: Position,
    right: Position,
    qbeg: usize,
    qend: usize,
}

impl SegmentOverlapper {
    // Drop overlapping segments ending at or before left
    // and return the minimum right end of those remaining.
    fn set_partition(&mut self) -> Position {
        let left = self.left;
        self.overlapping.retain(|seg| seg.right > left);
        self.overlapping
            .iter()
            .map(|seg| seg.right)
            .min()
            .unwrap_or(Position::MAX)
    }

    const fn new() -> SegmentOverlapper {
        SegmentOverlapper {
            segment_queue: vec![],
            overlapping: vec![],
            left: Position::MIN,
            right: Position::MAX,
            qbeg: usize::MAX,
            qend: usize::MAX,
        }
    }

    // Must follow finalize_queue
    fn init(&mut self) {
        self.qbeg = 0;
        self.qend = self.segment_queue.len() - 1;
        self.left = Position::MIN;
        self.right = Position::MAX;
        self.overlapping.clear();
    }

    fn enqueue(&mut self, left: Position, right: Position, node: NodeId) {
        self.segment_queue.push(Segment { left, right, node });
    }

    fn finalize_queue(&mut self, maxlen: Position) {
        self.segment_queue.sort_by(|a, b| a.left.cmp(&b.left));
        self.segment_queue.push(Segment {
            left: maxlen,
            right: Position::MAX,
            node: NodeId::NULL,
        });
    }

    fn advance(&mut self) -> bool {
        let mut rv = false;

        if self.qbeg < self.qend {
            self.left = self.right;
            let mut tright = self.set_partition();
            if self.overlapping.is_empty() {
                self.left = self.segment_queue[self.qbeg].left;
            }
            while self.qbeg < self.qend && self.segment_queue[self.qbeg].left == self.left {
                let seg = self.segment_queue[self.qbeg];
                tright = std::cmp::min(tright, seg.right);
                self.overlapping.push(seg);
                self.qbeg += 1;
            }
            self.right = std::cmp::min(self.segment_queue[self.qbeg].left, tright);
            rv = true;
        } else {
            self.left = self.right;
            self.right = Position::MAX;
            let tright = self.set_partition();
            if !self.overlapping.is_empty() {
                self.right = tright;
                rv = true
            }
        }

        rv
    }

    fn num_overlaps(&self) -> usize {
        self.overlapping.len()
    }

    fn get_left(&self) -> Position {
        self.left
    }

    fn get_right(&self) -> Position {
        self.right
    }

    fn clear_queue(&mut self) {
        self.segment_queue.clear();
    }
}

bitflags! {
    /// Boolean flags affecting simplification
    /// behavior.
    ///
    /// # Example
    ///
    /// ```
    /// let e = fwdarg_core::SimplificationFlags::empty();
    /// assert_eq!(e.bits(), 0);
    /// ```
    #[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
    pub struct SimplificationFlags: u32 {
        /// Validate that input edges are sorted
        const VALIDATE_EDGES = 1 << 0;
    }
}

/// Useful information output by table
/// simplification.
#[derive(Debug, Default, Clone)]
pub struct SimplificationOutput {
    /// Maps input node ID to output ID.
    /// Values are set to [``NodeId::NULL``]
    /// for input nodes that "simplify out".
    pub idmap: Vec<NodeId>,
}

impl SimplificationOutput {
    /// Create a new instance.
    pub fn new() -> Self {
        SimplificationOutput { idmap: vec![] }
    }

    /// Output id of input node `id`.
    ///
    /// Returns `None` if `id` was removed by simplification
    /// or is not an input id.
    pub fn remap(&self, id: NodeId) -> Option<NodeId> {
        let i = usize::try_from(id).ok()?;
        match self.idmap.get(i) {
            Some(x) if !x.is_null() => Some(*x),
            _ => None,
        }
    }
}

/// Holds internal memory used by
/// simplification machinery.
///
/// During simplification, several large
/// memory blocks are required. This type
/// allows those allocations to be re-used
/// in subsequent calls to [``simplify_tables``].
/// Doing so typically improves run times at
/// the cost of higher peak memory consumption.
#[derive(Debug)]
pub struct SimplificationBuffers {
    new_edges: EdgeTable,
    temp_edge_buffer: EdgeTable,
    new_nodes: NodeTable,
    overlapper: SegmentOverlapper,
    ancestry: AncestryList,
}

impl SimplificationBuffers {
    /// Create a new instance.
    pub const fn new() -> SimplificationBuffers {
        SimplificationBuffers {
            new_edges: EdgeTable::new(),
            temp_edge_buffer: EdgeTable::new(),
            new_nodes: NodeTable::new(),
            overlapper: SegmentOverlapper::new(),
            ancestry: AncestryList::new(),
        }
    }

    fn clear(&mut self) {
        self.new_edges.clear();
        self.temp_edge_buffer.clear();
        self.new_nodes.clear();
    }
}

impl Default for SimplificationBuffers {
    fn default() -> Self {
        Self::new()
    }
}

fn find_parent_child_segment_overlap(
    edges: &[Edge],
    edge_index: usize,
    maxlen: Position,
    u: NodeId,
    ancestry: &AncestryList,
    overlapper: &mut SegmentOverlapper,
) -> Result<usize, SimplificationError> {
    overlapper.clear_queue();

    let mut i = edge_index;

    while i < edges.len() && edges[i].parent == u {
        let edge = &edges[i];

        ancestry.for_each(edge.child, |seg: &Segment| {
            if seg.overlaps(edge.left, edge.right) {
                overlapper.enqueue(
                    std::cmp::max(seg.left, edge.left),
                    std::cmp::min(seg.right, edge.right),
                    seg.node,
                );
            }
            true
        })?;

        i += 1;
    }
    overlapper.finalize_queue(maxlen);
    Ok(i)
}

fn add_ancestry(
    input_id: NodeId,
    left: Position,
    right: Position,
    node: NodeId,
    ancestry: &mut AncestryList,
) -> Result<(), SimplificationError> {
    let head = ancestry.head(input_id)?;
    if head == NULL_INDEX {
        ancestry.extend(input_id, Segment { left, right, node })?;
    } else {
        let last_idx = ancestry.tail(input_id)?;
        if last_idx == NULL_INDEX {
            return Err(SimplificationError::Internal {
                value: "last_idx is NULL".to_string(),
            });
        }
        let last = ancestry.fetch_mut(last_idx)?;
        if last.right == left && last.node == node {
            last.right = right;
        } else {
            ancestry.extend(input_id, Segment { left, right, node })?;
        }
    }
    Ok(())
}

fn buffer_edge(
    left: Position,
    right: Position,
    parent: NodeId,
    child: NodeId,
    temp_edge_buffer: &mut EdgeTable,
) {
    let i = temp_edge_buffer
        .iter()
        .rposition(|e: &Edge| e.child == child);

    match i {
        Some(x) if temp_edge_buffer[x].right == left => {
            temp_edge_buffer[x].right = right;
        }
        _ => temp_edge_buffer.push(Edge {
            left,
            right,
            parent,
            child,
        }),
    }
}

fn output_buffered_edges(temp_edge_buffer: &mut EdgeTable, new_edges: &mut EdgeTable) -> usize {
    // stable: keeps each child's segments in left order
    temp_edge_buffer.sort_by(|a, b| a.child.cmp(&b.child));

    let rv = temp_edge_buffer.len();
    new_edges.append(temp_edge_buffer);

    rv
}

fn record_node(
    input_nodes: &[Node],
    id: NodeId,
    is_sample: bool,
    output_nodes: &mut NodeTable,
) -> Result<NodeId, SimplificationError> {
    let input = &input_nodes[id.0 as usize];
    let mut flags = input.flags;
    flags &= !NodeFlags::IS_SAMPLE.bits();
    if is_sample {
        flags |= NodeFlags::IS_SAMPLE.bits();
    }
    output_nodes.push(Node {
        time: input.time,
        population: input.population,
        flags,
    });
    Ok(NodeId::try_from(output_nodes.len() - 1)?)
}

fn merge_ancestors(
    input_nodes: &[Node],
    maxlen: Position,
    parent_input_id: NodeId,
    state: &mut SimplificationBuffers,
    idmap: &mut [NodeId],
) -> Result<(), SimplificationError> {
    let mut output_id = idmap[parent_input_id.0 as usize];
    let is_sample = !output_id.is_null();

    if is_sample {
        state.ancestry.nullify_list(parent_input_id)?;
    }

    let mut previous_right = Position::MIN;
    let mut ancestry_node: NodeId;
    state.overlapper.init();
    state.temp_edge_buffer.clear();

    while state.overlapper.advance() {
        if state.overlapper.num_overlaps() == 1 {
            ancestry_node = state.overlapper.overlapping[0].node;
            if is_sample {
                buffer_edge(
                    state.overlapper.get_left(),
                    state.overlapper.get_right(),
                    output_id,
                    ancestry_node,
                    &mut state.temp_edge_buffer,
                );
                ancestry_node = output_id;
            }
        } else {
            if output_id.is_null() {
                output_id = record_node(input_nodes, parent_input_id, false, &mut state.new_nodes)?;
                idmap[parent_input_id.0 as usize] = output_id;
            }
            ancestry_node = output_id;
            for o in state.overlapper.overlapping.iter() {
                buffer_edge(
                    state.overlapper.get_left(),
                    state.overlapper.get_right(),
                    output_id,
                    o.node,
                    &mut state.temp_edge_buffer,
                );
            }
        }
        if is_sample && state.overlapper.get_left() != previous_right {
            add_ancestry(
                parent_input_id,
                previous_right,
                state.overlapper.get_left(),
                output_id,
                &mut state.ancestry,
            )?;
        }
        add_ancestry(
            parent_input_id,
            state.overlapper.get_left(),
            state.overlapper.get_right(),
            ancestry_node,
            &mut state.ancestry,
        )?;
        previous_right = state.overlapper.get_right();
    }
    if is_sample && previous_right != maxlen {
        add_ancestry(
            parent_input_id,
            previous_right,
            maxlen,
            output_id,
            &mut state.ancestry,
        )?;
    }

    if !output_id.is_null() {
        let n = output_buffered_edges(&mut state.temp_edge_buffer, &mut state.new_edges);

        if n == 0 && !is_sample {
            debug_assert!((output_id.0 as usize) < state.new_nodes.len());
            state.new_nodes.truncate(output_id.0 as usize);
            idmap[parent_input_id.0 as usize] = NodeId::NULL;
        }
    }
    Ok(())
}

fn record_sample_nodes(
    samples: &[NodeId],
    tables: &TableCollection,
    new_nodes: &mut NodeTable,
    ancestry: &mut AncestryList,
    idmap: &mut [NodeId],
) -> Result<(), SimplificationError> {
    for &sample in samples {
        if sample.is_null() {
            return Err(SimplificationError::NullSample);
        }
        if sample.0 as usize >= tables.num_nodes() {
            return Err(SimplificationError::SampleOutOfRange {
                sample,
                num_nodes: tables.num_nodes(),
            });
        }
        // repeated ids are one sample
        if !idmap[sample.0 as usize].is_null() {
            continue;
        }
        let output_id = record_node(&tables.nodes_, sample, true, new_nodes)?;

        add_ancestry(
            sample,
            Position::MIN,
            tables.genome_length(),
            output_id,
            ancestry,
        )?;

        idmap[sample.0 as usize] = output_id;
    }
    Ok(())
}

fn setup_simplification(
    samples: &[NodeId],
    tables: &TableCollection,
    flags: SimplificationFlags,
    state: &mut SimplificationBuffers,
    output: &mut SimplificationOutput,
) -> Result<(), SimplificationError> {
    if flags.contains(SimplificationFlags::VALIDATE_EDGES) {
        tables.validate_edges()?;
    } else {
        tables.validate_edge_references()?;
    }
    output.idmap.clear();
    output.idmap.resize(tables.num_nodes(), NodeId::NULL);

    state.clear();
    state.ancestry.reset(tables.num_nodes());

    record_sample_nodes(
        samples,
        tables,
        &mut state.new_nodes,
        &mut state.ancestry,
        &mut output.idmap,
    )
}

fn process_parent(
    u: NodeId,
    edge_index: usize,
    tables: &TableCollection,
    state: &mut SimplificationBuffers,
    output: &mut SimplificationOutput,
) -> Result<usize, SimplificationError> {
    let edge_i = find_parent_child_segment_overlap(
        &tables.edges_,
        edge_index,
        tables.genome_length(),
        u,
        &state.ancestry,
        &mut state.overlapper,
    )?;

    merge_ancestors(
        &tables.nodes_,
        tables.genome_length(),
        u,
        state,
        &mut output.idmap,
    )?;
    Ok(edge_i)
}

/// Simplify a [``TableCollection``].
///
/// # Parameters
///
/// * `samples`: the sample nodes.  The i-th distinct id becomes
///              output node `i`. Repeated ids are ignored.
/// * `flags`: modify the behavior of the simplification algorithm.
/// * `state`: These are the internal data structures used
///            by the simpilfication algorithm.
/// * `tables`: a [``TableCollection``] to simplify.
/// * `output`: Where simplification output gets written.
///             See [``SimplificationOutput``].
///
/// # Notes
///
/// The input edges must be sorted.
/// See [``TableCollection::sort_edges``].
///
/// Output nodes are the samples, followed by retained
/// ancestors in order of increasing time.
///
/// # Errors
///
/// [`SimplificationError`] if a sample id is invalid,
/// if validation is requested and fails, or if an edge
/// refers to a node that does not exist.
///
/// # Example
///
/// ```
/// use fwdarg_core::*;
/// let mut tables = TableCollection::new(1.0).unwrap();
/// tables.add_node(2.0, 0).unwrap(); // grandparent
/// tables.add_node(1.0, 0).unwrap(); // parent, unary
/// tables.add_node(0.0, 0).unwrap(); // child
/// tables.add_node(0.0, 0).unwrap(); // child
/// tables.add_edge(0.0, 1.0, 1, 2).unwrap();
/// tables.add_edge(0.0, 1.0, 0, 1).unwrap();
/// tables.add_edge(0.0, 1.0, 0, 3).unwrap();
/// tables.sort_edges();
/// let samples = vec![NodeId::from(3), NodeId::from(2)];
/// let mut state = SimplificationBuffers::new();
/// let mut output = SimplificationOutput::new();
/// simplify_tables(&samples, SimplificationFlags::VALIDATE_EDGES,
///                 &mut state, &mut tables, &mut output).unwrap();
/// assert_eq!(tables.num_nodes(), 3);
/// assert_eq!(output.remap(3.into()), Some(0.into()));
/// assert_eq!(output.remap(2.into()), Some(1.into()));
/// assert_eq!(output.remap(1.into()), None);
/// assert_eq!(output.remap(0.into()), Some(2.into()));
/// ```
pub fn simplify_tables(
    samples: &[NodeId],
    flags: SimplificationFlags,
    state: &mut SimplificationBuffers,
    tables: &mut TableCollection,
    output: &mut SimplificationOutput,
) -> Result<(), SimplificationError> {
    setup_simplification(samples, tables, flags, state, output)?;

    let mut edge_i = 0;
    let num_edges = tables.num_edges();
    let mut new_edges_inserted: usize = 0;
    while edge_i < num_edges {
        edge_i = process_parent(tables.edges_[edge_i].parent, edge_i, tables, state, output)?;

        // Input edges before edge_i are never read again,
        // so output can overwrite them in place.
        if state.new_edges.len() >= 1024 && new_edges_inserted + state.new_edges.len() < edge_i {
            for e in state.new_edges.drain(..) {
                tables.edges_[new_edges_inserted] = e;
                new_edges_inserted += 1;
            }
        }
    }

    tables.edges_.truncate(new_edges_inserted);
    tables.edges_.append(&mut state.new_edges);
    std::mem::swap(&mut tables.nodes_, &mut state.new_nodes);

    Ok(())
}

/// Simplify a [``TableCollection``] without keeping
/// the internal buffers.
///
/// See [``simplify_tables``] for details.
pub fn simplify_tables_without_state(
    samples: &[NodeId],
    flags: SimplificationFlags,
    tables: &mut TableCollection,
    output: &mut SimplificationOutput,
) -> Result<(), SimplificationError> {
    let mut state = SimplificationBuffers::new();
    simplify_tables(samples, flags, &mut state, tables, output)
}
