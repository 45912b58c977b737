use crate::buffer::AncestryBuffer;
use crate::compactor::Compactor;
use crate::error::{FwdargError, Result};
use crate::output::SimulationOutput;
use crate::params::SimulationParams;
use fwdarg_core::{Edge, Node, NodeId, PopulationId, Position, Time};
use fwdarg_prior::{FounderAncestry, KingmanCoalescent};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use tracing::{info, trace};

/// Decide which chromosome a parent passes on.
///
/// The pair is swapped with probability one half; the first
/// element of the returned pair is transmitted.
fn mendel(rng: &mut StdRng, n0: NodeId, n1: NodeId) -> (NodeId, NodeId) {
    if rng.random::<f64>() < 0.5 {
        (n1, n0)
    } else {
        (n0, n1)
    }
}

fn advance(id: NodeId, delta: usize) -> Result<NodeId> {
    id.checked_add(delta)
        .ok_or(FwdargError::IdOverflow { id, delta })
}

/// Runs a constant-size Wright-Fisher population of diploids,
/// recording ancestry and compacting it periodically.
///
/// Chromosome `2 * i` and `2 * i + 1` belong to diploid `i`.
/// Every offspring chooses two parents uniformly with replacement
/// and inherits one whole chromosome from each.
///
/// # Example
///
/// ```
/// let params = fwdarg::SimulationParams {
///     generations: 50,
///     compaction_interval: 10,
///     sample_size: 2,
///     schedule: fwdarg::AncestralSampleSchedule::empty(),
///     ..fwdarg::SimulationParams::for_popsize(10)
/// };
/// let output = fwdarg::SimulationDriver::new(params).unwrap().run().unwrap();
/// assert_eq!(output.samples().len(), 4);
/// ```
pub struct SimulationDriver<P: FounderAncestry> {
    params: SimulationParams,
    rng: StdRng,
    compactor: Compactor<P>,
    buffer: AncestryBuffer,
    chromosomes: Vec<NodeId>,
    next_id: NodeId,
    schedule_index: usize,
    generation: u64,
    // per-generation scratch
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    offspring: Vec<NodeId>,
    retained: Vec<NodeId>,
}

impl SimulationDriver<KingmanCoalescent> {
    /// Create a driver whose founder ancestry is a
    /// [`KingmanCoalescent`] with effective size
    /// [`SimulationParams::prior_effective_size`], seeded with
    /// [`SimulationParams::seed`].
    ///
    /// # Errors
    ///
    /// [`FwdargError::ParameterError`] if the parameters are invalid.
    pub fn new(params: SimulationParams) -> Result<Self> {
        params.validate()?;
        let prior = KingmanCoalescent::new(params.prior_effective_size, params.seed)?;
        Self::with_prior(params, prior)
    }
}

impl<P: FounderAncestry> SimulationDriver<P> {
    /// Create a driver with a custom founder ancestry.
    ///
    /// # Errors
    ///
    /// [`FwdargError::ParameterError`] if the parameters are invalid.
    pub fn with_prior(params: SimulationParams, prior: P) -> Result<Self> {
        params.validate()?;
        let num_chromosomes = 2 * params.popsize;
        let compactor = Compactor::new(num_chromosomes, params.compaction_interval, prior)?;
        let chromosomes = identity_chromosomes(num_chromosomes)?;
        let next_id = NodeId::try_from(num_chromosomes)?;
        Ok(Self {
            rng: StdRng::seed_from_u64(params.seed),
            params,
            compactor,
            buffer: AncestryBuffer::new(),
            chromosomes,
            next_id,
            schedule_index: 0,
            generation: 0,
            nodes: vec![],
            edges: vec![],
            offspring: vec![],
            retained: vec![],
        })
    }

    /// Simulate one generation.
    ///
    /// Compaction is attempted first, then the next cohort
    /// is born.
    ///
    /// # Returns
    ///
    /// The result of [`Compactor::maybe_compact`]
    /// for this generation.
    pub fn step(&mut self) -> Result<Option<NodeId>> {
        let generation = self.generation;
        let compacted = self.compactor.maybe_compact(generation, &mut self.buffer)?;
        self.buffer.post_compaction_cleanup(compacted.is_some());
        if let Some(next_id) = compacted {
            self.reset_chromosomes(next_id)?;
        }

        self.retain_ancestral_samples(generation)?;
        self.generate_births(generation)?;

        self.buffer
            .append(&self.nodes, &self.edges, &self.offspring, &self.retained);
        std::mem::swap(&mut self.chromosomes, &mut self.offspring);
        self.next_id = advance(self.next_id, self.chromosomes.len())?;
        self.generation += 1;
        trace!(
            generation = self.generation,
            next_id = %self.next_id,
            buffered = self.buffer.nodes().len(),
            "generation complete"
        );

        Ok(compacted)
    }

    /// Run all remaining generations and finish.
    pub fn run(mut self) -> Result<SimulationOutput> {
        info!(
            popsize = self.params.popsize,
            generations = self.params.generations,
            compaction_interval = self.params.compaction_interval,
            seed = self.params.seed,
            "starting simulation"
        );
        while self.generation < self.params.generations {
            self.step()?;
        }
        self.finish()
    }

    /// Flush any buffered ancestry and draw the final sample.
    ///
    /// The final sample is `sample_size` diploids chosen without
    /// replacement from the current population, both chromosomes
    /// each in ascending order, followed by every ancestral sample
    /// not already listed.
    pub fn finish(mut self) -> Result<SimulationOutput> {
        if !self.buffer.is_empty() {
            let next_id = self
                .compactor
                .compact(self.generation, &mut self.buffer)?;
            self.buffer.post_compaction_cleanup(true);
            self.reset_chromosomes(next_id)?;
        }

        let mut chosen = rand::seq::index::sample(
            &mut self.rng,
            self.params.popsize,
            self.params.sample_size,
        )
        .into_vec();
        chosen.sort_unstable();
        let mut samples = Vec::with_capacity(2 * chosen.len() + self.buffer.ancestral_samples().len());
        for i in chosen {
            samples.push(NodeId::try_from(2 * i)?);
            samples.push(NodeId::try_from(2 * i + 1)?);
        }
        // a cohort retained in the last generation is also current
        for &a in self.buffer.ancestral_samples() {
            if !samples.contains(&a) {
                samples.push(a);
            }
        }

        let records = self.compactor.compaction_records().to_vec();
        info!(
            generations = self.generation,
            nodes = self.compactor.tables().num_nodes(),
            edges = self.compactor.tables().num_edges(),
            compactions = records.len(),
            "simulation complete"
        );

        Ok(SimulationOutput::new(
            self.compactor.into_tables(),
            self.chromosomes,
            self.buffer.ancestral_samples().to_vec(),
            samples,
            records,
        ))
    }

    fn reset_chromosomes(&mut self, next_id: NodeId) -> Result<()> {
        self.chromosomes = identity_chromosomes(self.chromosomes.len())?;
        self.next_id = next_id;
        Ok(())
    }

    fn retain_ancestral_samples(&mut self, generation: u64) -> Result<()> {
        self.retained.clear();
        let event = match self.params.schedule.events().get(self.schedule_index) {
            Some(e) if e.generation == generation + 1 => *e,
            _ => return Ok(()),
        };
        let chosen = rand::seq::index::sample(&mut self.rng, self.params.popsize, event.count);
        for i in chosen.iter() {
            self.retained.push(advance(self.next_id, 2 * i)?);
            self.retained.push(advance(self.next_id, 2 * i + 1)?);
        }
        self.schedule_index += 1;
        info!(
            generation = event.generation,
            count = event.count,
            "retaining ancestral samples"
        );
        Ok(())
    }

    fn generate_births(&mut self, generation: u64) -> Result<()> {
        let popsize = self.params.popsize;
        // the whole cohort must fit before any id is handed out
        advance(self.next_id, 2 * popsize)?;

        let birth_time = Time::from((generation + 1) as f64);
        self.nodes.clear();
        self.edges.clear();
        self.offspring.clear();
        let mut next_id = self.next_id;
        for _ in 0..popsize {
            let p1 = self.rng.random_range(0..popsize);
            let p2 = self.rng.random_range(0..popsize);
            let (p1g1, _) = mendel(
                &mut self.rng,
                self.chromosomes[2 * p1],
                self.chromosomes[2 * p1 + 1],
            );
            let (p2g1, _) = mendel(
                &mut self.rng,
                self.chromosomes[2 * p2],
                self.chromosomes[2 * p2 + 1],
            );
            for parent in [p1g1, p2g1] {
                self.nodes.push(Node {
                    time: birth_time,
                    population: PopulationId::from(0),
                    flags: 0,
                });
                self.edges.push(Edge {
                    left: Position::from(0.0),
                    right: Position::from(1.0),
                    parent,
                    child: next_id,
                });
                self.offspring.push(next_id);
                next_id = advance(next_id, 1)?;
            }
        }
        Ok(())
    }

    /// Generations simulated so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The id the next new node will get.
    pub fn next_id(&self) -> NodeId {
        self.next_id
    }

    /// Ids of the current population's chromosomes.
    pub fn chromosomes(&self) -> &[NodeId] {
        &self.chromosomes
    }

    /// The compactor and its tables.
    pub fn compactor(&self) -> &Compactor<P> {
        &self.compactor
    }

    /// Ancestry recorded since the last compaction.
    pub fn buffer(&self) -> &AncestryBuffer {
        &self.buffer
    }

    /// The run parameters.
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }
}

fn identity_chromosomes(n: usize) -> Result<Vec<NodeId>> {
    (0..n)
        .map(|i| Ok(NodeId::try_from(i)?))
        .collect::<Result<Vec<_>>>()
}
