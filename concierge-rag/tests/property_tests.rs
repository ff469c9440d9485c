//! Property tests for normalization, gating, search ordering, and context assembly.

use std::collections::HashMap;

use concierge_rag::{
    BULLET, Candidate, ConfidenceGate, InMemoryVectorStore, KnowledgeEntry, RagError, VectorStore,
    assemble, gate, l2_norm, normalize,
};
use proptest::prelude::*;

/// Generate a vector with at least one component well away from zero.
fn arb_nonzero_vector(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-100.0f32..100.0f32, dim)
        .prop_filter("non-zero vector", |v| v.iter().any(|x| x.abs() > 1e-3))
}

/// Generate candidates already sorted ascending by distance.
fn arb_sorted_candidates() -> impl Strategy<Value = Vec<Candidate>> {
    proptest::collection::vec(0.0f32..2.0f32, 0..10).prop_map(|mut distances| {
        distances.sort_by(f32::total_cmp);
        distances
            .into_iter()
            .enumerate()
            .map(|(i, d)| Candidate::new(format!("chunk_{i}"), format!("fact number {i}"), d))
            .collect()
    })
}

/// Normalizing any non-degenerate vector yields unit length.
mod prop_normalize_unit_length {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn normalized_vectors_have_unit_norm(v in (1usize..64).prop_flat_map(arb_nonzero_vector)) {
            let unit = normalize(&v).unwrap();
            prop_assert_eq!(unit.len(), v.len());
            prop_assert!((l2_norm(&unit) - 1.0).abs() < 1e-6);
        }

        #[test]
        fn zero_vectors_are_rejected(dim in 0usize..64) {
            let zeros = vec![0.0f32; dim];
            let rejected = matches!(normalize(&zeros), Err(RagError::DegenerateVector { .. }));
            prop_assert!(rejected);
        }
    }
}

/// The gate accepts exactly when the top distance is at or under the threshold.
mod prop_gate_single_threshold {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn accept_iff_top_distance_within_threshold(
            candidates in arb_sorted_candidates(),
            threshold in 0.0f32..2.0f32,
        ) {
            let decision = gate(&candidates, threshold);
            match candidates.first() {
                None => {
                    prop_assert!(!decision.accept);
                    prop_assert_eq!(decision.top_distance, None);
                }
                Some(top) => {
                    prop_assert_eq!(decision.accept, top.distance <= threshold);
                    prop_assert_eq!(decision.top_distance, Some(top.distance));
                }
            }
        }

        #[test]
        fn margin_check_never_widens_acceptance(
            candidates in arb_sorted_candidates(),
            threshold in 0.0f32..2.0f32,
            margin in 0.0f32..0.5f32,
        ) {
            let plain = ConfidenceGate::new(threshold).evaluate(&candidates);
            let strict = ConfidenceGate::new(threshold).with_min_margin(Some(margin)).evaluate(&candidates);
            prop_assert!(!strict.accept || plain.accept);
            prop_assert_eq!(strict.top_distance, plain.top_distance);
        }
    }
}

/// Assembled context has one bulleted line per candidate, in input order.
mod prop_context_assembly {
    use super::*;

    proptest! {
        #[test]
        fn one_line_per_candidate_in_order(candidates in arb_sorted_candidates()) {
            prop_assume!(!candidates.is_empty());
            let context = assemble(&candidates);
            let lines: Vec<&str> = context.split('\n').collect();
            prop_assert_eq!(lines.len(), candidates.len());
            for (line, candidate) in lines.iter().zip(&candidates) {
                prop_assert!(line.starts_with(BULLET));
                prop_assert_eq!(&line[BULLET.len()..], candidate.content.as_str());
            }
        }
    }
}

/// In-memory search returns candidates ascending by distance, bounded by `top_k`.
mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 8;

    fn arb_entry() -> impl Strategy<Value = KnowledgeEntry> {
        ("[a-z]{3,8}", "[a-z ]{5,30}", arb_nonzero_vector(DIM)).prop_map(|(id, content, raw)| {
            let embedding_norm = normalize(&raw).unwrap();
            KnowledgeEntry { chunk_id: id, category: None, content, embedding: raw, embedding_norm }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ascending_and_bounded(
            entries in proptest::collection::vec(arb_entry(), 1..20),
            query in arb_nonzero_vector(DIM),
            top_k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (results, unique_count) = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                let mut deduped: HashMap<String, KnowledgeEntry> = HashMap::new();
                for entry in &entries {
                    deduped.entry(entry.chunk_id.clone()).or_insert_with(|| entry.clone());
                }
                for entry in deduped.values() {
                    store.upsert(entry).await.unwrap();
                }
                let query = normalize(&query).unwrap();
                (store.search(&query, top_k, None).await.unwrap(), deduped.len())
            });

            prop_assert!(results.len() <= top_k);
            prop_assert_eq!(results.len(), top_k.min(unique_count));
            for pair in results.windows(2) {
                prop_assert!(pair[0].distance <= pair[1].distance);
            }
            for candidate in &results {
                prop_assert!((-1e-5..=2.0 + 1e-5).contains(&candidate.distance));
            }
        }
    }
}
