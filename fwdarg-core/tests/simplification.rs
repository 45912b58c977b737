use fwdarg_core::*;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

// Haploid Wright-Fisher pedigree with at most one crossover
// per birth. Returns the tables and the final generation's ids.
fn random_pedigree(seed: u64, popsize: usize, ngens: usize) -> (TableCollection, Vec<NodeId>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tables = TableCollection::new(1.0).unwrap();
    let mut parents = vec![];
    for _ in 0..popsize {
        parents.push(tables.add_node(ngens as f64, 0).unwrap());
    }
    for gen in 1..=ngens {
        let mut children = vec![];
        for _ in 0..popsize {
            let child = tables.add_node((ngens - gen) as f64, 0).unwrap();
            let p1 = parents[rng.random_range(0..popsize)];
            let p2 = parents[rng.random_range(0..popsize)];
            let x: f64 = rng.random();
            if p1 == p2 || x <= 0.0 {
                tables.add_edge(0.0, 1.0, p1, child).unwrap();
            } else {
                tables.add_edge(0.0, x, p1, child).unwrap();
                tables.add_edge(x, 1.0, p2, child).unwrap();
            }
            children.push(child);
        }
        parents = children;
    }
    (tables, parents)
}

fn simplify(samples: &[NodeId], tables: &mut TableCollection) -> SimplificationOutput {
    let mut output = SimplificationOutput::new();
    simplify_tables_without_state(
        samples,
        SimplificationFlags::VALIDATE_EDGES,
        tables,
        &mut output,
    )
    .unwrap();
    output
}

#[test]
fn test_single_generation_is_unchanged_in_shape() {
    let mut tables = TableCollection::new(1.0).unwrap();
    let p = tables.add_node(1.0, 0).unwrap();
    let c0 = tables.add_node(0.0, 0).unwrap();
    let c1 = tables.add_node(0.0, 0).unwrap();
    tables.add_edge(0.0, 1.0, p, c0).unwrap();
    tables.add_edge(0.0, 1.0, p, c1).unwrap();
    tables.sort_edges();
    let output = simplify(&[c1, c0], &mut tables);
    assert_eq!(tables.num_nodes(), 3);
    assert_eq!(tables.num_edges(), 2);
    assert_eq!(output.remap(c1), Some(0.into()));
    assert_eq!(output.remap(c0), Some(1.into()));
    assert_eq!(output.remap(p), Some(2.into()));
    assert_eq!(tables.node(2).time, 1.0);
}

#[test]
fn test_reusing_buffers_matches_fresh_buffers() {
    let mut state = SimplificationBuffers::new();
    for seed in [1_u64, 2, 3] {
        let (mut a, samples) = random_pedigree(seed, 10, 20);
        a.sort_edges();
        let mut b = a.clone();
        let oa = simplify(&samples, &mut a);
        let mut ob = SimplificationOutput::new();
        simplify_tables(
            &samples,
            SimplificationFlags::empty(),
            &mut state,
            &mut b,
            &mut ob,
        )
        .unwrap();
        assert_eq!(a.nodes(), b.nodes());
        assert_eq!(a.edges(), b.edges());
        assert_eq!(oa.idmap, ob.idmap);
    }
}

proptest! {
    #[test]
    fn test_simplified_tables_are_valid(seed in any::<u64>(),
                                        popsize in 2_usize..20,
                                        ngens in 1_usize..30) {
        let (mut tables, samples) = random_pedigree(seed, popsize, ngens);
        let input_nodes = tables.nodes().to_vec();
        let input_num_nodes = tables.num_nodes();
        tables.sort_edges();
        prop_assert!(tables.validate_edges().unwrap());

        let output = simplify(&samples, &mut tables);
        prop_assert!(tables.num_nodes() <= input_num_nodes);
        prop_assert!(tables.validate_edges().unwrap());

        for (i, s) in samples.iter().enumerate() {
            prop_assert_eq!(output.remap(*s), Some(NodeId::try_from(i).unwrap()));
            prop_assert_eq!(tables.nodes()[i].time, 0.0);
            prop_assert!(tables.nodes()[i].flags & NodeFlags::IS_SAMPLE.bits() != 0);
        }
        for n in tables.nodes().iter().skip(samples.len()) {
            prop_assert_eq!(n.flags & NodeFlags::IS_SAMPLE.bits(), 0);
        }

        // surviving nodes keep their times
        for (input, output_id) in output.idmap.iter().enumerate() {
            if !output_id.is_null() {
                prop_assert_eq!(tables.node(*output_id).time, input_nodes[input].time);
            }
        }
    }

    #[test]
    fn test_simplification_is_idempotent(seed in any::<u64>(),
                                         popsize in 2_usize..15,
                                         ngens in 1_usize..25) {
        let (mut tables, samples) = random_pedigree(seed, popsize, ngens);
        tables.sort_edges();
        let _ = simplify(&samples, &mut tables);
        let once = tables.clone();

        let resampled = (0..samples.len())
            .map(|i| NodeId::try_from(i).unwrap())
            .collect::<Vec<_>>();
        tables.sort_edges();
        let output = simplify(&resampled, &mut tables);

        prop_assert_eq!(once.nodes(), tables.nodes());
        prop_assert_eq!(once.edges(), tables.edges());
        for (i, o) in output.idmap.iter().enumerate() {
            prop_assert_eq!(*o, NodeId::try_from(i).unwrap());
        }
    }
}
