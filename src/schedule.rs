use crate::params::ParameterError;

/// Retain `count` diploids from the cohort born in `generation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetentionEvent {
    /// Birth generation of the cohort.
    ///
    /// The cohort born in `generation` is created during the
    /// loop iteration for `generation - 1`.
    pub generation: u64,
    /// Number of diploids to retain.
    pub count: usize,
}

impl RetentionEvent {
    /// Create a new instance.
    pub fn new(generation: u64, count: usize) -> Self {
        Self { generation, count }
    }
}

/// When, and how many, ancestral samples to retain.
///
/// Retained individuals stay in the ancestry through every
/// later compaction and are part of the final sample list.
///
/// # Example
///
/// ```
/// use fwdarg::{AncestralSampleSchedule, RetentionEvent};
/// let s = AncestralSampleSchedule::evenly_spaced(100, 10, 20);
/// assert_eq!(s.len(), 18);
/// assert_eq!(s.events()[0], RetentionEvent::new(5, 1));
/// assert_eq!(s.events()[17], RetentionEvent::new(90, 1));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AncestralSampleSchedule {
    events: Vec<RetentionEvent>,
}

impl AncestralSampleSchedule {
    /// Create a schedule from explicit events.
    ///
    /// The events are not checked here.
    /// See [`AncestralSampleSchedule::validate`].
    pub fn new(events: Vec<RetentionEvent>) -> Self {
        Self { events }
    }

    /// An empty schedule.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `rounds - 2` events at generations
    /// `generations * (i + 1) / rounds`, each retaining
    /// `max(round(popsize / 200), 1)` diploids, rounding
    /// halves to even.
    ///
    /// Fewer than three rounds gives an empty schedule.
    /// Events whose generation would be zero are skipped.
    pub fn evenly_spaced(generations: u64, popsize: usize, rounds: u64) -> Self {
        let count = std::cmp::max((popsize as f64 / 200.0).round_ties_even() as usize, 1);
        let events = (0..rounds.saturating_sub(2))
            .map(|i| RetentionEvent::new(generations * (i + 1) / rounds, count))
            .filter(|e| e.generation > 0)
            .collect::<Vec<_>>();
        let mut rv = Self { events };
        rv.events.dedup_by_key(|e| e.generation);
        rv
    }

    /// The events, in order.
    pub fn events(&self) -> &[RetentionEvent] {
        &self.events
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// `true` if there are no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Check the schedule against the run parameters.
    ///
    /// # Errors
    ///
    /// * [`ParameterError::ScheduleCountZero`] for an event retaining nobody.
    /// * [`ParameterError::ScheduleCountTooLarge`] if an event
    ///   retains more than `popsize` diploids.
    /// * [`ParameterError::ScheduleGenerationOutOfRange`] unless
    ///   `1 <= generation <= generations`.
    /// * [`ParameterError::ScheduleNotIncreasing`] unless event
    ///   generations strictly increase.
    pub fn validate(&self, generations: u64, popsize: usize) -> Result<(), ParameterError> {
        let mut last = 0_u64;
        for e in &self.events {
            if e.count == 0 {
                return Err(ParameterError::ScheduleCountZero {
                    generation: e.generation,
                });
            }
            if e.count > popsize {
                return Err(ParameterError::ScheduleCountTooLarge {
                    generation: e.generation,
                    count: e.count,
                    popsize,
                });
            }
            if e.generation == 0 || e.generation > generations {
                return Err(ParameterError::ScheduleGenerationOutOfRange {
                    generation: e.generation,
                    generations,
                });
            }
            if e.generation <= last {
                return Err(ParameterError::ScheduleNotIncreasing {
                    generation: e.generation,
                });
            }
            last = e.generation;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prototype_schedule() {
        // N = 500: 20N generations, retention every N generations
        let s = AncestralSampleSchedule::evenly_spaced(10000, 500, 20);
        assert_eq!(s.len(), 18);
        for (i, e) in s.events().iter().enumerate() {
            assert_eq!(e.generation, 500 * (i as u64 + 1));
            assert_eq!(e.count, 2);
        }
        assert!(s.validate(10000, 500).is_ok());
    }

    #[test]
    fn test_small_populations_retain_one() {
        let s = AncestralSampleSchedule::evenly_spaced(80, 4, 20);
        assert!(s.events().iter().all(|e| e.count == 1));
    }

    #[test]
    fn test_short_runs_skip_generation_zero() {
        let s = AncestralSampleSchedule::evenly_spaced(5, 4, 20);
        assert!(s.events().iter().all(|e| e.generation > 0));
        assert!(s.validate(5, 4).is_ok());
    }

    #[test]
    fn test_validate_errors() {
        let s = AncestralSampleSchedule::new(vec![RetentionEvent::new(3, 5)]);
        assert_eq!(
            s.validate(10, 4),
            Err(ParameterError::ScheduleCountTooLarge {
                generation: 3,
                count: 5,
                popsize: 4
            })
        );
        let s = AncestralSampleSchedule::new(vec![RetentionEvent::new(3, 0)]);
        assert_eq!(
            s.validate(10, 4),
            Err(ParameterError::ScheduleCountZero { generation: 3 })
        );
        let s = AncestralSampleSchedule::new(vec![RetentionEvent::new(0, 1)]);
        assert!(matches!(
            s.validate(10, 4),
            Err(ParameterError::ScheduleGenerationOutOfRange { .. })
        ));
        let s = AncestralSampleSchedule::new(vec![RetentionEvent::new(11, 1)]);
        assert!(matches!(
            s.validate(10, 4),
            Err(ParameterError::ScheduleGenerationOutOfRange { .. })
        ));
        let s = AncestralSampleSchedule::new(vec![
            RetentionEvent::new(4, 1),
            RetentionEvent::new(4, 1),
        ]);
        assert_eq!(
            s.validate(10, 4),
            Err(ParameterError::ScheduleNotIncreasing { generation: 4 })
        );
    }
}
