use fwdarg_core::*;
use fwdarg_prior::{FounderAncestry, KingmanCoalescent};
use proptest::prelude::*;

#[test]
fn test_same_seed_same_tables() {
    let a = KingmanCoalescent::new(200.0, 666)
        .unwrap()
        .generate(20)
        .unwrap();
    let b = KingmanCoalescent::new(200.0, 666)
        .unwrap()
        .generate(20)
        .unwrap();
    assert_eq!(a.nodes(), b.nodes());
    assert_eq!(a.edges(), b.edges());
}

#[test]
fn test_different_seeds_differ() {
    let a = KingmanCoalescent::new(200.0, 1)
        .unwrap()
        .generate(20)
        .unwrap();
    let b = KingmanCoalescent::new(200.0, 2)
        .unwrap()
        .generate(20)
        .unwrap();
    assert_ne!(a.nodes(), b.nodes());
}

proptest! {
    #[test]
    fn test_prior_is_a_single_binary_tree(n in 1_usize..50, seed in any::<u64>()) {
        let tables = KingmanCoalescent::new(2.0 * n as f64, seed)
            .unwrap()
            .generate(n)
            .unwrap();
        prop_assert_eq!(tables.num_nodes(), 2 * n - 1);
        prop_assert_eq!(tables.num_edges(), 2 * (n - 1));
        prop_assert!(tables.validate_edges().unwrap());

        // every node but the root is a child exactly once
        let mut is_child = vec![0; tables.num_nodes()];
        for e in tables.edges() {
            is_child[usize::try_from(e.child).unwrap()] += 1;
            prop_assert_eq!(e.left, 0.0);
            prop_assert_eq!(e.right, 1.0);
        }
        let roots = is_child.iter().filter(|&&c| c == 0).count();
        prop_assert_eq!(roots, 1);
        prop_assert!(is_child.iter().all(|&c| c <= 1));
    }

    #[test]
    fn test_prior_is_already_simplified(n in 2_usize..40, seed in any::<u64>()) {
        let mut tables = KingmanCoalescent::new(100.0, seed)
            .unwrap()
            .generate(n)
            .unwrap();
        let before = tables.clone();
        let samples = (0..n).map(|i| NodeId::try_from(i).unwrap()).collect::<Vec<_>>();
        let mut output = SimplificationOutput::new();
        simplify_tables_without_state(
            &samples,
            SimplificationFlags::VALIDATE_EDGES,
            &mut tables,
            &mut output,
        )
        .unwrap();
        prop_assert_eq!(before.nodes(), tables.nodes());
        prop_assert_eq!(before.edges(), tables.edges());
    }
}
