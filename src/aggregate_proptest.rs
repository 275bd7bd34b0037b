//! Property-based tests for fragment ordering and aggregation.
//!
//! These tests use proptest to generate random fragment sets and verify that
//! the aggregation invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::aggregate::{compare_keys, sort_key, Aggregator};
    use crate::filesystem::MemoryFS;
    use crate::fragment::Fragment;
    use crate::target::OrderMode;
    use proptest::prelude::*;
    use std::cmp::Ordering;

    fn mode() -> impl Strategy<Value = OrderMode> {
        prop_oneof![Just(OrderMode::Numeric), Just(OrderMode::Alpha)]
    }

    /// Distinct names with orders drawn from digits, letters and underscores.
    fn fragments() -> impl Strategy<Value = Vec<Fragment>> {
        prop::collection::btree_map("[a-z0-9]{1,6}", ("[0-9a-z_]{0,4}", "[a-z\n]{0,5}"), 0..12)
            .prop_map(|entries| {
                entries
                    .into_iter()
                    .map(|(name, (order, content))| {
                        Fragment::with_content(name, "/etc/motd", content)
                            .and_then(|f| f.with_order(order))
                            .expect("generated fragment is valid")
                    })
                    .collect()
            })
    }

    fn aggregate(fragments: &[Fragment], mode: OrderMode, ensure_newline: bool) -> Vec<u8> {
        let fs = MemoryFS::new();
        let refs: Vec<&Fragment> = fragments.iter().collect();
        Aggregator::new(&fs)
            .aggregate(&refs, mode, ensure_newline)
            .expect("literal content always resolves")
    }

    // ============================================================================
    // determinism
    // ============================================================================

    proptest! {
        /// Property: repeated aggregation yields identical bytes
        #[test]
        fn aggregation_is_deterministic(fragments in fragments(), mode in mode(), nl in any::<bool>()) {
            prop_assert_eq!(aggregate(&fragments, mode, nl), aggregate(&fragments, mode, nl));
        }

        /// Property: registration order does not affect the output
        #[test]
        fn aggregation_ignores_registration_order(fragments in fragments(), mode in mode(), nl in any::<bool>()) {
            let mut reversed = fragments.clone();
            reversed.reverse();
            prop_assert_eq!(aggregate(&fragments, mode, nl), aggregate(&reversed, mode, nl));
        }

        /// Property: with ensure_newline every fragment adds exactly its content
        /// plus at most one newline
        #[test]
        fn ensure_newline_adds_at_most_one_byte_per_fragment(fragments in fragments(), mode in mode()) {
            let plain = aggregate(&fragments, mode, false);
            let terminated = aggregate(&fragments, mode, true);
            prop_assert!(terminated.len() >= plain.len());
            prop_assert!(terminated.len() <= plain.len() + fragments.len());
            if !fragments.is_empty() {
                prop_assert!(terminated.ends_with(b"\n"));
            }
        }
    }

    // ============================================================================
    // key comparison
    // ============================================================================

    proptest! {
        /// Property: pure integer orders sort by value regardless of digit count
        #[test]
        fn integer_orders_sort_by_value(a in 0u64..1_000_000, b in 0u64..1_000_000) {
            let ka = sort_key(&a.to_string(), "n", OrderMode::Numeric);
            let kb = sort_key(&b.to_string(), "n", OrderMode::Numeric);
            prop_assert_eq!(compare_keys(&ka, &kb, OrderMode::Numeric), a.cmp(&b));
        }

        /// Property: alpha mode agrees with plain string order on the order part
        #[test]
        fn alpha_orders_sort_lexically(a in "[a-z0-9]{1,5}", b in "[a-z0-9]{1,5}") {
            prop_assume!(a != b);
            let ka = sort_key(&a, "n", OrderMode::Alpha);
            let kb = sort_key(&b, "n", OrderMode::Alpha);
            prop_assert_eq!(compare_keys(&ka, &kb, OrderMode::Alpha), a.cmp(&b));
        }

        /// Property: comparison is antisymmetric and only equal for equal keys
        #[test]
        fn comparison_is_a_total_order(a in "[0-9a-z_]{0,8}", b in "[0-9a-z_]{0,8}", mode in mode()) {
            let forward = compare_keys(&a, &b, mode);
            let backward = compare_keys(&b, &a, mode);
            prop_assert_eq!(forward, backward.reverse());
            prop_assert_eq!(forward == Ordering::Equal, a == b);
        }
    }
}
