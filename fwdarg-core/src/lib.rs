//! Node and edge tables plus ancestry simplification,
//! implemented from the ground up in rust.
//!
//! The tables model has a few conventions worth knowing:
//!
//! 1. Time moves from the present into the past.
//!    Parent nodes have time values *greater than*
//!    those of their children.
//! 2. The data layout is "array of structures".
//! 3. Genomic locations are [``f64``] values wrapped in
//!    [``Position``].
//! 4. Node rows are never reordered except by
//!    [``simplify_tables``], which reports the mapping
//!    from input to output ids.

// NOTE: uncomment the next line in order to find
// stuff that needs documenting:
// #![warn(missing_docs)]

mod macros;

pub mod nested_forward_list;
mod newtypes;
mod segment;
mod simplification;
mod tables;

pub use nested_forward_list::NestedForwardList;
pub use nested_forward_list::NestedForwardListError;
pub use newtypes::{EdgeId, NodeId, PopulationId, Position, Time};
pub use segment::Segment;
pub use simplification::SimplificationBuffers;
pub use simplification::SimplificationError;
pub use simplification::SimplificationFlags;
pub use simplification::SimplificationOutput;
pub use simplification::{simplify_tables, simplify_tables_without_state};
pub use tables::*;
pub mod prelude;

/// Get the fwdarg-core version number.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
