use fwdarg::{
    AncestralSampleSchedule, FwdargError, ParameterError, RetentionEvent, SimulationDriver,
    SimulationParams, DEFAULT_RETENTION_ROUNDS,
};
use fwdarg_core::{NodeFlags, NodeId, TableCollection};
use fwdarg_prior::KingmanCoalescent;
use proptest::prelude::*;

fn params(popsize: usize, generations: u64, interval: u64, seed: u64) -> SimulationParams {
    SimulationParams {
        generations,
        compaction_interval: interval,
        seed,
        sample_size: popsize.min(2),
        schedule: AncestralSampleSchedule::evenly_spaced(
            generations,
            popsize,
            DEFAULT_RETENTION_ROUNDS,
        ),
        ..SimulationParams::for_popsize(popsize)
    }
}

// The current population must be rows [0, 2N), all samples at time zero.
fn check_current_population(tables: &TableCollection, popsize: usize) {
    assert!(tables.num_nodes() >= 2 * popsize);
    for n in &tables.nodes()[..2 * popsize] {
        assert_eq!(n.time, 0.0);
        assert!(n.flags & NodeFlags::IS_SAMPLE.bits() != 0);
    }
}

#[test]
fn test_small_population_compaction_sequence() {
    let mut d = SimulationDriver::new(params(4, 4, 2, 101)).unwrap();
    assert_eq!(d.step().unwrap(), None);
    assert_eq!(d.next_id(), 16);

    let k1 = d.step().unwrap().unwrap();
    let first = *d.compactor().last_compaction().unwrap();
    assert_eq!(first.generation, 1);
    // 2 * 8 - 1 prior rows plus 8 buffered nodes
    assert_eq!(first.nodes_before, 23);
    assert_eq!(first.nodes_after, usize::try_from(k1).unwrap());
    assert!(first.nodes_after >= 8);
    assert!(first.nodes_after <= first.nodes_before);
    check_current_population(d.compactor().tables(), 4);

    let k2 = d.step().unwrap().unwrap();
    assert_eq!(d.compactor().last_compaction_generation(), Some(2));
    assert_eq!(
        d.compactor().tables().num_nodes(),
        usize::try_from(k2).unwrap()
    );
    check_current_population(d.compactor().tables(), 4);

    assert_eq!(d.step().unwrap(), None);
    assert_eq!(d.generation(), 4);
    assert!(!d.buffer().is_empty());

    let output = d.finish().unwrap();
    assert_eq!(output.compaction_records().len(), 3);
    assert_eq!(output.compaction_records()[2].generation, 4);
    check_current_population(output.tables(), 4);
    assert_eq!(
        output.current_population(),
        (0..8).map(NodeId::from).collect::<Vec<_>>().as_slice()
    );
    assert!(output.tables().validate_edge_references().is_ok());
}

#[test]
fn test_same_seed_same_tables() {
    let a = SimulationDriver::new(params(10, 60, 7, 1234))
        .unwrap()
        .run()
        .unwrap();
    let b = SimulationDriver::new(params(10, 60, 7, 1234))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(a.tables().nodes(), b.tables().nodes());
    assert_eq!(a.tables().edges(), b.tables().edges());
    assert_eq!(a.samples(), b.samples());
    assert_eq!(a.ancestral_samples(), b.ancestral_samples());
}

#[test]
fn test_different_seeds_differ() {
    let a = SimulationDriver::new(params(10, 60, 7, 1))
        .unwrap()
        .run()
        .unwrap();
    let b = SimulationDriver::new(params(10, 60, 7, 2))
        .unwrap()
        .run()
        .unwrap();
    assert!(a.tables().nodes() != b.tables().nodes() || a.tables().edges() != b.tables().edges());
}

#[test]
fn test_zero_interval_flushes_at_end() {
    let mut d = SimulationDriver::new(params(5, 30, 0, 9)).unwrap();
    for _ in 0..30 {
        assert_eq!(d.step().unwrap(), None);
    }
    assert_eq!(d.compactor().tables().num_nodes(), 0);
    assert_eq!(d.buffer().nodes().len(), 300);
    let output = d.finish().unwrap();
    assert_eq!(output.compaction_records().len(), 1);
    check_current_population(output.tables(), 5);
    for a in output.ancestral_samples() {
        assert!(usize::try_from(*a).unwrap() < output.tables().num_nodes());
    }
}

#[test]
fn test_final_samples() {
    let p = SimulationParams {
        sample_size: 3,
        schedule: AncestralSampleSchedule::new(vec![
            RetentionEvent::new(5, 2),
            RetentionEvent::new(12, 1),
        ]),
        ..params(8, 20, 4, 77)
    };
    let output = SimulationDriver::new(p).unwrap().run().unwrap();
    assert_eq!(output.ancestral_samples().len(), 6);
    assert_eq!(output.samples().len(), 12);
    let (current, ancestral) = output.samples().split_at(6);
    assert_eq!(ancestral, output.ancestral_samples());
    for pair in current.chunks(2) {
        assert_eq!(pair[0].raw() % 2, 0);
        assert_eq!(pair[1], pair[0].checked_add(1).unwrap());
        assert!(pair[1] < 16);
    }
    for w in current.windows(2) {
        assert!(w[0] < w[1]);
    }
    // retained cohorts are older than the final generation
    for a in output.ancestral_samples() {
        let t = output.tables().node(*a).time;
        assert!(t == 15.0 || t == 8.0);
    }

    let (reduced, idmap) = output.reduce_to_samples().unwrap();
    for (i, s) in output.samples().iter().enumerate() {
        assert_eq!(idmap.remap(*s), Some(NodeId::try_from(i).unwrap()));
    }
    assert!(reduced.num_nodes() >= 12);
    assert!(reduced.num_nodes() <= output.tables().num_nodes());
}

#[test]
fn test_retention_in_last_generation_gives_unique_samples() {
    for (seed, sample_size) in [(5, 1), (6, 2), (7, 3)] {
        let p = SimulationParams {
            sample_size,
            schedule: AncestralSampleSchedule::new(vec![RetentionEvent::new(6, 2)]),
            ..params(3, 6, 2, seed)
        };
        let output = SimulationDriver::new(p).unwrap().run().unwrap();
        // the retained cohort is the final population
        assert_eq!(output.ancestral_samples().len(), 4);
        for a in output.ancestral_samples() {
            assert!(*a < 6);
        }
        let mut unique = output.samples().to_vec();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), output.samples().len());
        assert!(output.samples().len() >= 4);
        assert!(output.samples().len() <= 6);
        if sample_size == 3 {
            assert_eq!(output.samples().len(), 6);
        }

        let (_, idmap) = output.reduce_to_samples().unwrap();
        for (i, s) in output.samples().iter().enumerate() {
            assert_eq!(idmap.remap(*s), Some(NodeId::try_from(i).unwrap()));
        }
    }
}

#[test]
fn test_schedule_larger_than_population_is_rejected() {
    let p = SimulationParams {
        schedule: AncestralSampleSchedule::new(vec![RetentionEvent::new(3, 6)]),
        ..params(5, 10, 2, 1)
    };
    match SimulationDriver::new(p) {
        Err(FwdargError::ParameterError { value }) => assert_eq!(
            value,
            ParameterError::ScheduleCountTooLarge {
                generation: 3,
                count: 6,
                popsize: 5
            }
        ),
        _ => panic!("expected a parameter error"),
    }
}

#[test]
fn test_custom_prior() {
    let p = params(6, 25, 5, 3);
    let prior = KingmanCoalescent::new(1.0, 3).unwrap();
    let output = SimulationDriver::with_prior(p, prior)
        .unwrap()
        .run()
        .unwrap();
    check_current_population(output.tables(), 6);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_compaction_invariants(seed in any::<u64>(),
                                  popsize in 1_usize..12,
                                  interval in 0_u64..9,
                                  generations in 1_u64..40) {
        let mut d = SimulationDriver::new(params(popsize, generations, interval, seed)).unwrap();
        for _ in 0..generations {
            let before = d.next_id();
            let retained_before = d.buffer().ancestral_samples().len();
            let compacted = d.step().unwrap();
            let start = compacted.unwrap_or(before);
            // 2N contiguous new ids per generation
            for (i, c) in d.chromosomes().iter().enumerate() {
                prop_assert_eq!(*c, start.checked_add(i).unwrap());
            }
            prop_assert_eq!(d.chromosomes().len(), 2 * popsize);
            if let Some(next_id) = compacted {
                let record = *d.compactor().last_compaction().unwrap();
                let tables = d.compactor().tables();
                prop_assert!(record.nodes_after <= record.nodes_before);
                prop_assert!(record.edges_after <= record.edges_before);
                prop_assert_eq!(usize::try_from(next_id).unwrap(), tables.num_nodes());
                for n in &tables.nodes()[..2 * popsize] {
                    prop_assert_eq!(n.time, 0.0);
                }
                // ids retained during this step are not in the tables yet
                for a in &d.buffer().ancestral_samples()[..retained_before] {
                    prop_assert!(!a.is_null());
                    prop_assert!(usize::try_from(*a).unwrap() < tables.num_nodes());
                }
            }
        }
        let output = d.finish().unwrap();
        let tables = output.tables();
        prop_assert!(tables.validate_edge_references().is_ok());
        for a in output.ancestral_samples() {
            prop_assert!(usize::try_from(*a).unwrap() < tables.num_nodes());
            prop_assert!(tables.node(*a).flags & NodeFlags::IS_SAMPLE.bits() != 0);
        }
    }
}
