use crate::compactor::CompactionRecord;
use crate::error::Result;
use fwdarg_core::{
    simplify_tables_without_state, NodeId, SimplificationFlags, SimplificationOutput,
    TableCollection,
};

/// The result of a simulation run.
#[derive(Clone, Debug)]
pub struct SimulationOutput {
    tables: TableCollection,
    current_population: Vec<NodeId>,
    ancestral_samples: Vec<NodeId>,
    samples: Vec<NodeId>,
    compaction_records: Vec<CompactionRecord>,
}

impl SimulationOutput {
    pub(crate) fn new(
        tables: TableCollection,
        current_population: Vec<NodeId>,
        ancestral_samples: Vec<NodeId>,
        samples: Vec<NodeId>,
        compaction_records: Vec<CompactionRecord>,
    ) -> Self {
        Self {
            tables,
            current_population,
            ancestral_samples,
            samples,
            compaction_records,
        }
    }

    /// The compacted ancestry after the final flush.
    pub fn tables(&self) -> &TableCollection {
        &self.tables
    }

    /// Consume `self` and return the tables.
    pub fn into_tables(self) -> TableCollection {
        self.tables
    }

    /// Node ids of the final population's chromosomes.
    pub fn current_population(&self) -> &[NodeId] {
        &self.current_population
    }

    /// Every retained ancestral sample.
    pub fn ancestral_samples(&self) -> &[NodeId] {
        &self.ancestral_samples
    }

    /// The final sample: chromosomes of the sampled diploids
    /// followed by the ancestral samples.
    ///
    /// No id appears twice.
    pub fn samples(&self) -> &[NodeId] {
        &self.samples
    }

    /// One record per compaction, in order.
    pub fn compaction_records(&self) -> &[CompactionRecord] {
        &self.compaction_records
    }

    /// Reduce a copy of the tables to the ancestry of [`SimulationOutput::samples`].
    ///
    /// Sample `i` becomes node `i` of the returned tables.
    pub fn reduce_to_samples(&self) -> Result<(TableCollection, SimplificationOutput)> {
        let mut tables = self.tables.clone();
        let mut output = SimplificationOutput::new();
        let flags = if cfg!(debug_assertions) {
            SimplificationFlags::VALIDATE_EDGES
        } else {
            SimplificationFlags::empty()
        };
        simplify_tables_without_state(&self.samples, flags, &mut tables, &mut output)?;
        Ok((tables, output))
    }
}
