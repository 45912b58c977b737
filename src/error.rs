//! Error handling
use crate::params::ParameterError;
use fwdarg_core::{NodeId, SimplificationError, TablesError};
use fwdarg_prior::PriorError;
use thiserror::Error;

/// Primary error type.
///
/// Some members of this enum implement ``From``
/// in order to redirect other error types.
#[derive(Error, Debug, PartialEq)]
pub enum FwdargError {
    /// Node ids ran past the range of [`NodeId`].
    #[error("node id overflow: {id} + {delta}")]
    IdOverflow {
        /// The id being advanced
        id: NodeId,
        /// The requested increment
        delta: usize,
    },
    /// An ancestral sample did not survive a compaction.
    #[error("ancestral sample {id} was removed by compaction")]
    AncestralSampleLost {
        /// The id of the sample before compaction
        id: NodeId,
    },
    /// A buffered edge has a child that is not a buffered node.
    #[error("buffered child {child} is not in the buffered id range [{first}, {last})")]
    BufferedChildOutOfRange {
        /// The child id
        child: NodeId,
        /// First buffered id
        first: NodeId,
        /// One past the last buffered id
        last: NodeId,
    },
    /// A buffered edge has a parent that does not exist.
    #[error("buffered parent {parent} does not exist; next id is {last}")]
    BufferedParentOutOfRange {
        /// The parent id
        parent: NodeId,
        /// One past the last valid id
        last: NodeId,
    },
    /// A redirection of a [``ParameterError``]
    #[error("{value:?}")]
    ParameterError {
        /// The redirected error
        #[from]
        value: ParameterError,
    },
    /// A redirection of a [``TablesError``]
    #[error("{value:?}")]
    TablesError {
        /// The redirected error
        #[from]
        value: TablesError,
    },
    /// A redirection of a [``SimplificationError``]
    #[error("{value:?}")]
    SimplificationError {
        /// The redirected error
        #[from]
        value: SimplificationError,
    },
    /// A redirection of a [``PriorError``]
    #[error("{value:?}")]
    PriorError {
        /// The redirected error
        #[from]
        value: PriorError,
    },
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, FwdargError>;
