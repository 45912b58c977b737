//! The crate prelude
//!
//! # Example
//! ```
//! use fwdarg_core::prelude::*;
//! let tables = TableCollection::new(1.0).unwrap();
//! assert_eq!(tables.num_nodes(), 0);
//! ```

pub use crate::newtypes::{EdgeId, NodeId, PopulationId, Position, Time};
pub use crate::simplification::{
    simplify_tables, SimplificationBuffers, SimplificationFlags, SimplificationOutput,
};
pub use crate::tables::{Edge, Node, NodeFlags, TableCollection};
