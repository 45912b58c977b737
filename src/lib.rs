#![warn(missing_docs)]

//! Forward time Wright-Fisher simulation with ancestry
//! recording and periodic compaction.
//!
//! # Overview
//!
//! A [`SimulationDriver`] evolves a constant population of diploids.
//! Every transmitted chromosome becomes a node, and every transmission
//! an edge, in an [`AncestryBuffer`].
//! Every so often the [`Compactor`] merges the buffer into its
//! [`TableCollection`](fwdarg_core::TableCollection) and reduces the
//! tables to the ancestry of the current population plus any
//! retained ancestral samples.
//!
//! The founder generation is seeded from a coalescent
//! (see [`fwdarg_prior`]) at the first compaction.
//!
//! After any compaction, node ids `[0, 2N)` are the current
//! population's chromosomes.
//! See [`descending`] for why.
//!
//! # Example
//!
//! ```
//! let params = fwdarg::SimulationParams {
//!     compaction_interval: 25,
//!     ..fwdarg::SimulationParams::for_popsize(20).with_generations(100)
//! };
//! let output = fwdarg::SimulationDriver::new(params).unwrap().run().unwrap();
//! assert!(output.tables().num_nodes() >= 40);
//! let (reduced, _) = output.reduce_to_samples().unwrap();
//! assert!(reduced.num_nodes() >= output.samples().len());
//! ```

mod buffer;
mod compactor;
mod driver;
mod error;
mod output;
mod params;
mod samples;
mod schedule;

pub use buffer::AncestryBuffer;
pub use compactor::{CompactionRecord, Compactor};
pub use driver::SimulationDriver;
pub use error::{FwdargError, Result};
pub use output::SimulationOutput;
pub use params::{ParameterError, SimulationParams, DEFAULT_RETENTION_ROUNDS};
pub use samples::{descending, SampleSet};
pub use schedule::{AncestralSampleSchedule, RetentionEvent};

/// Get the fwdarg version number.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
