//! Property and scenario tests for the distribution planner

use proptest::prelude::*;
use qmaker::error::PlanError;
use qmaker::generation::{plan, PlanStrategy};

use crate::integration::test_utils::topics;

fn weights() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        prop_oneof![
            1 => Just(0.0),
            4 => 0.5f64..60.0,
        ],
        1..12,
    )
}

proptest! {
    #[test]
    fn weighted_plans_sum_to_total_when_every_topic_fits(
        weights in weights(),
        extra in 0u32..200,
    ) {
        let weighted = weights.iter().filter(|w| **w > 0.0).count() as u32;
        prop_assume!(weighted > 0);
        let total = weighted + extra;
        let result = plan(&topics(&weights), total).unwrap();

        prop_assert_eq!(result.strategy, PlanStrategy::Weighted);
        prop_assert_eq!(result.total_allocated, total);
        prop_assert!(result.exact_sum);
        prop_assert_eq!(result.counts().iter().sum::<u32>(), total);
    }

    #[test]
    fn weighted_topics_get_at_least_one_and_zero_topics_none(
        weights in weights(),
        total in 0u32..300,
    ) {
        prop_assume!(weights.iter().any(|w| *w > 0.0));
        let result = plan(&topics(&weights), total).unwrap();

        prop_assert_eq!(result.allocations.len(), weights.len());
        for (allocation, weight) in result.allocations.iter().zip(&weights) {
            if *weight > 0.0 {
                prop_assert!(allocation.estimated_questions >= 1);
            } else {
                prop_assert_eq!(allocation.estimated_questions, 0);
            }
        }
    }

    #[test]
    fn plans_keep_input_order_and_are_deterministic(
        weights in weights(),
        total in 0u32..300,
    ) {
        let input = topics(&weights);
        let first = plan(&input, total).unwrap();
        let second = plan(&input, total).unwrap();
        prop_assert_eq!(&first, &second);

        let ids: Vec<_> = first.allocations.iter().map(|a| a.topic.id.clone()).collect();
        let expected: Vec<_> = input.iter().map(|t| t.id.clone()).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn untouched_topics_stay_ordered_by_weightage(
        weights in weights(),
        total in 1u32..300,
    ) {
        prop_assume!(weights.iter().any(|w| *w > 0.0));
        let result = plan(&topics(&weights), total).unwrap();
        let untouched: Vec<_> = result
            .allocations
            .iter()
            .filter(|a| a.topic.weightage > 0.0 && a.estimated_questions == a.rounded_share)
            .collect();
        for a in &untouched {
            for b in &untouched {
                if a.topic.weightage >= b.topic.weightage {
                    prop_assert!(a.estimated_questions >= b.estimated_questions);
                }
            }
        }
    }

    #[test]
    fn unweighted_topics_share_evenly(n in 1usize..20, total in 0u32..200) {
        let result = plan(&topics(&vec![0.0; n]), total).unwrap();
        let per_topic = (total / n as u32).max(1);

        prop_assert_eq!(result.strategy, PlanStrategy::Even);
        prop_assert!(result.counts().iter().all(|c| *c == per_topic));
    }
}

#[test]
fn syllabus_scenario_reconciles_onto_the_heaviest_topic() {
    // 15 + 7.5 + 3.75 + 3.75 rounds to 31; the heaviest topic gives one back.
    let result = plan(&topics(&[50.0, 25.0, 12.5, 12.5]), 30).unwrap();
    assert_eq!(result.counts(), vec![14, 8, 4, 4]);
    assert!(result.exact_sum);
}

#[test]
fn uneven_weightage_total_still_meets_the_requested_count() {
    let result = plan(&topics(&[30.0, 30.0, 30.0]), 10).unwrap();
    assert_eq!(result.counts().iter().sum::<u32>(), 10);
    assert_eq!(result.counts()[0], 4);
}

#[test]
fn invalid_weightage_is_rejected_before_planning() {
    let err = plan(&topics(&[10.0, -1.0]), 10).unwrap_err();
    assert!(matches!(err, PlanError::NegativeWeightage { .. }));

    let err = plan(&topics(&[f64::INFINITY]), 10).unwrap_err();
    assert!(matches!(err, PlanError::NonFiniteWeightage { .. }));
}
