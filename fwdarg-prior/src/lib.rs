//! Founder ancestry for forward simulations.
//!
//! A forward simulation starts from a population whose members
//! already share a history. This crate generates that history as
//! a [`TableCollection`] so it can be joined to the ancestry
//! recorded during the simulation.
//!
//! Node times are on the backward scale used by
//! [`fwdarg_core`]: founders are at time zero and their
//! ancestors are older.

use fwdarg_core::{NodeFlags, NodeId, TableCollection, TablesError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp};
use thiserror::Error;

/// Error type for founder ancestry generation.
#[derive(Error, Debug, PartialEq)]
pub enum PriorError {
    /// The effective size must be finite and positive.
    #[error("invalid effective size: {0}")]
    InvalidEffectiveSize(f64),
    /// At least one founder is required.
    #[error("number of founders must be > 0")]
    NoFounders,
    /// A redirection of a [``TablesError``]
    #[error("{value:?}")]
    TablesError {
        /// The redirected error
        #[from]
        value: TablesError,
    },
}

/// Generates the shared ancestry of a set of founder lineages.
///
/// # Contract
///
/// * Rows `[0, num_founders)` of the returned tables are the
///   founders, at time zero, flagged with
///   [`NodeFlags::IS_SAMPLE`].
/// * Every other row is an ancestor with time greater than zero.
/// * Edges are sorted as required by [`fwdarg_core::simplify_tables`].
pub trait FounderAncestry {
    /// Generate ancestry for `num_founders` lineages.
    fn generate(&mut self, num_founders: usize) -> Result<TableCollection, PriorError>;
}

/// The Kingman coalescent without recombination.
///
/// While `k` lineages remain, the waiting time to the next
/// merger is exponential with rate
/// `k * (k - 1) / 2 / (2 * effective_size)` per generation and
/// two distinct lineages, chosen uniformly, merge into a new
/// ancestor. The result is a single tree spanning `[0, 1)`
/// with `2n - 1` nodes.
///
/// # Example
///
/// ```
/// use fwdarg_prior::{FounderAncestry, KingmanCoalescent};
/// let mut prior = KingmanCoalescent::new(100.0, 42).unwrap();
/// let tables = prior.generate(10).unwrap();
/// assert_eq!(tables.num_nodes(), 19);
/// assert_eq!(tables.num_edges(), 18);
/// ```
#[derive(Debug)]
pub struct KingmanCoalescent {
    effective_size: f64,
    rng: StdRng,
}

impl KingmanCoalescent {
    /// Create a new instance.
    ///
    /// # Errors
    ///
    /// [`PriorError::InvalidEffectiveSize`] if `effective_size`
    /// is not finite and positive.
    pub fn new(effective_size: f64, seed: u64) -> Result<Self, PriorError> {
        if !effective_size.is_finite() || effective_size <= 0.0 {
            return Err(PriorError::InvalidEffectiveSize(effective_size));
        }
        Ok(Self {
            effective_size,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// The effective size used to scale time.
    pub fn effective_size(&self) -> f64 {
        self.effective_size
    }
}

impl FounderAncestry for KingmanCoalescent {
    fn generate(&mut self, num_founders: usize) -> Result<TableCollection, PriorError> {
        if num_founders == 0 {
            return Err(PriorError::NoFounders);
        }
        let mut tables = TableCollection::new(1.0)?;
        let mut lineages: Vec<NodeId> = Vec::with_capacity(num_founders);
        for _ in 0..num_founders {
            lineages.push(tables.add_node_with_flags(0.0, 0, NodeFlags::IS_SAMPLE.bits())?);
        }

        let mut time = 0.0;
        while lineages.len() > 1 {
            let k = lineages.len() as f64;
            let rate = k * (k - 1.0) / 2.0 / (2.0 * self.effective_size);
            let exp =
                Exp::new(rate).map_err(|_| PriorError::InvalidEffectiveSize(self.effective_size))?;
            time += exp.sample(&mut self.rng);

            let chosen = rand::seq::index::sample(&mut self.rng, lineages.len(), 2);
            let (i, j) = (chosen.index(0), chosen.index(1));
            let (hi, lo) = if i > j { (i, j) } else { (j, i) };
            // remove the larger index first so the smaller stays valid
            let a = lineages.swap_remove(hi);
            let b = lineages.swap_remove(lo);

            let parent = tables.add_node(time, 0)?;
            let (first, second) = if a < b { (a, b) } else { (b, a) };
            tables.add_edge(0.0, 1.0, parent, first)?;
            tables.add_edge(0.0, 1.0, parent, second)?;
            lineages.push(parent);
        }

        Ok(tables)
    }
}
