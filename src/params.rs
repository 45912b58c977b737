use crate::schedule::AncestralSampleSchedule;
use thiserror::Error;

/// Number of retention rounds used by the default schedule.
pub const DEFAULT_RETENTION_ROUNDS: u64 = 20;

/// Invalid run parameters.
///
/// Returned by [`SimulationParams::validate`] before any
/// simulation happens.
#[derive(Error, Debug, PartialEq)]
pub enum ParameterError {
    /// The population must contain at least one diploid.
    #[error("popsize must be > 0")]
    ZeroPopulation,
    /// At least one generation must be simulated.
    #[error("generations must be > 0")]
    ZeroGenerations,
    /// The final sample cannot exceed the population.
    #[error("sample size {sample_size} exceeds popsize {popsize}")]
    SampleSizeTooLarge {
        /// The requested sample size
        sample_size: usize,
        /// The population size
        popsize: usize,
    },
    /// A retention event asks for more diploids than exist.
    #[error("retention at generation {generation} asks for {count} of {popsize} diploids")]
    ScheduleCountTooLarge {
        /// Generation of the event
        generation: u64,
        /// Requested count
        count: usize,
        /// The population size
        popsize: usize,
    },
    /// A retention event retains nobody.
    #[error("retention at generation {generation} has a count of zero")]
    ScheduleCountZero {
        /// Generation of the event
        generation: u64,
    },
    /// Retention generations must strictly increase.
    #[error("retention generations are not increasing at {generation}")]
    ScheduleNotIncreasing {
        /// Generation of the offending event
        generation: u64,
    },
    /// A retention event falls outside the run.
    #[error("retention generation {generation} is not in 1..={generations}")]
    ScheduleGenerationOutOfRange {
        /// Generation of the event
        generation: u64,
        /// Length of the run
        generations: u64,
    },
    /// The effective size of the founder ancestry is invalid.
    #[error("prior effective size must be finite and > 0, got {0}")]
    InvalidPriorEffectiveSize(f64),
}

/// Parameters of a simulation run.
///
/// Use [`SimulationParams::for_popsize`] to get the
/// values that depend on the population size filled in.
///
/// # Example
///
/// ```
/// let params = fwdarg::SimulationParams {
///     sample_size: 2,
///     compaction_interval: 10,
///     ..fwdarg::SimulationParams::for_popsize(50)
/// };
/// assert_eq!(params.generations, 1000);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParams {
    /// Number of diploids.
    pub popsize: usize,
    /// Number of diploids in the final sample.
    pub sample_size: usize,
    /// Random number seed.
    pub seed: u64,
    /// Generations between compactions. Zero disables periodic
    /// compaction; the ancestry is then compacted once at the end.
    pub compaction_interval: u64,
    /// Number of generations to simulate.
    pub generations: u64,
    /// Effective size of the coalescent founder ancestry.
    pub prior_effective_size: f64,
    /// Ancestral sample retention.
    pub schedule: AncestralSampleSchedule,
}

impl SimulationParams {
    /// Defaults for a population of `popsize` diploids:
    /// `20 * popsize` generations, a prior effective size of
    /// `2 * popsize`, and the evenly spaced retention schedule.
    pub fn for_popsize(popsize: usize) -> Self {
        let generations = 20 * popsize as u64;
        Self {
            popsize,
            sample_size: 5,
            seed: 42,
            compaction_interval: 100,
            generations,
            prior_effective_size: 2.0 * popsize as f64,
            schedule: AncestralSampleSchedule::evenly_spaced(
                generations,
                popsize,
                DEFAULT_RETENTION_ROUNDS,
            ),
        }
    }

    /// Change the number of generations.
    ///
    /// The schedule is replaced by the evenly spaced default
    /// for the new run length, since events are tied to the
    /// generations of the run.
    ///
    /// ```
    /// let params = fwdarg::SimulationParams::for_popsize(20).with_generations(100);
    /// assert_eq!(params.generations, 100);
    /// assert!(params.validate().is_ok());
    /// ```
    pub fn with_generations(self, generations: u64) -> Self {
        Self {
            generations,
            schedule: AncestralSampleSchedule::evenly_spaced(
                generations,
                self.popsize,
                DEFAULT_RETENTION_ROUNDS,
            ),
            ..self
        }
    }

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// [`ParameterError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.popsize == 0 {
            return Err(ParameterError::ZeroPopulation);
        }
        if self.generations == 0 {
            return Err(ParameterError::ZeroGenerations);
        }
        if self.sample_size > self.popsize {
            return Err(ParameterError::SampleSizeTooLarge {
                sample_size: self.sample_size,
                popsize: self.popsize,
            });
        }
        if !self.prior_effective_size.is_finite() || self.prior_effective_size <= 0.0 {
            return Err(ParameterError::InvalidPriorEffectiveSize(
                self.prior_effective_size,
            ));
        }
        self.schedule.validate(self.generations, self.popsize)
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self::for_popsize(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::RetentionEvent;

    #[test]
    fn test_default() {
        let p = SimulationParams::default();
        assert_eq!(p.popsize, 500);
        assert_eq!(p.sample_size, 5);
        assert_eq!(p.seed, 42);
        assert_eq!(p.compaction_interval, 100);
        assert_eq!(p.generations, 10000);
        assert_eq!(p.prior_effective_size, 1000.0);
        assert_eq!(p.schedule.len(), 18);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_invalid_params() {
        let p = SimulationParams {
            popsize: 0,
            ..SimulationParams::default()
        };
        assert_eq!(p.validate(), Err(ParameterError::ZeroPopulation));

        let p = SimulationParams {
            sample_size: 501,
            ..SimulationParams::default()
        };
        assert_eq!(
            p.validate(),
            Err(ParameterError::SampleSizeTooLarge {
                sample_size: 501,
                popsize: 500
            })
        );

        let p = SimulationParams {
            generations: 0,
            ..SimulationParams::default()
        };
        assert_eq!(p.validate(), Err(ParameterError::ZeroGenerations));

        let p = SimulationParams {
            prior_effective_size: f64::NAN,
            ..SimulationParams::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ParameterError::InvalidPriorEffectiveSize(_))
        ));
    }

    #[test]
    fn test_schedule_errors_surface() {
        let p = SimulationParams {
            schedule: AncestralSampleSchedule::new(vec![RetentionEvent::new(10, 11)]),
            ..SimulationParams::for_popsize(10)
        };
        assert_eq!(
            p.validate(),
            Err(ParameterError::ScheduleCountTooLarge {
                generation: 10,
                count: 11,
                popsize: 10
            })
        );
    }

    #[test]
    fn test_shorter_run_keeps_a_valid_schedule() {
        let long = SimulationParams::for_popsize(20);
        assert_eq!(long.generations, 400);
        let short = long.clone().with_generations(100);
        assert!(short.validate().is_ok());
        assert_eq!(
            short.schedule,
            AncestralSampleSchedule::evenly_spaced(100, 20, DEFAULT_RETENTION_ROUNDS)
        );
        assert!(short
            .schedule
            .events()
            .iter()
            .all(|e| e.generation >= 1 && e.generation <= 100));

        // overriding only the field leaves the old schedule behind
        let stale = SimulationParams {
            generations: 100,
            ..long
        };
        assert!(matches!(
            stale.validate(),
            Err(ParameterError::ScheduleGenerationOutOfRange {
                generations: 100,
                ..
            })
        ));
    }

    #[test]
    fn test_zero_interval_is_valid() {
        let p = SimulationParams {
            compaction_interval: 0,
            ..SimulationParams::for_popsize(10)
        };
        assert!(p.validate().is_ok());
    }
}
