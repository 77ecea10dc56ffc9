//! Distribution planner: turns topic weightages and a target total into per-topic
//! question quotas.

use crate::error::PlanError;
use crate::types::Topic;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStrategy {
    /// Shares proportional to weightage.
    Weighted,
    /// No topic carries weightage; every topic gets the same quota.
    Even,
}

impl PlanStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanStrategy::Weighted => "weighted",
            PlanStrategy::Even => "even",
        }
    }
}

/// Quota for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub topic: Topic,
    /// Unrounded proportional share (`weightage / 100 * total`).
    pub exact_share: f64,
    /// Share after rounding and the one-question floor, before reconciliation.
    pub rounded_share: u32,
    pub estimated_questions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub allocations: Vec<Allocation>,
    pub total_requested: u32,
    pub total_allocated: u32,
    pub total_weightage: f64,
    pub strategy: PlanStrategy,
    /// Whether `total_allocated == total_requested`.
    pub exact_sum: bool,
}

impl AllocationPlan {
    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    pub fn total_topics(&self) -> usize {
        self.allocations.len()
    }

    pub fn counts(&self) -> Vec<u32> {
        self.allocations
            .iter()
            .map(|a| a.estimated_questions)
            .collect()
    }
}

/// Plan question quotas for `topics` so that they sum to `total_questions`.
///
/// Weighted topics get `round(weightage / 100 * total)` (half away from zero), never
/// less than one. The rounding drift is absorbed by the heaviest topic; drift that
/// would push it below one question spills over to the next heaviest topics. Only a
/// total smaller than the number of weighted topics leaves the sum short of exact,
/// which `exact_sum` reports.
///
/// When no topic carries weightage every topic receives `max(1, total / n)`.
pub fn plan(topics: &[Topic], total_questions: u32) -> Result<AllocationPlan, PlanError> {
    validate_topics(topics)?;

    if topics.is_empty() {
        return Ok(AllocationPlan {
            allocations: Vec::new(),
            total_requested: total_questions,
            total_allocated: 0,
            total_weightage: 0.0,
            strategy: PlanStrategy::Even,
            exact_sum: total_questions == 0,
        });
    }

    let total_weightage: f64 = topics.iter().map(|t| t.weightage).sum();
    let (allocations, strategy) = if total_weightage == 0.0 {
        (plan_even(topics, total_questions), PlanStrategy::Even)
    } else {
        (
            plan_weighted(topics, total_questions),
            PlanStrategy::Weighted,
        )
    };

    let total_allocated: u32 = allocations.iter().map(|a| a.estimated_questions).sum();
    let exact_sum = total_allocated == total_questions;
    if !exact_sum {
        warn!(
            total_requested = total_questions,
            total_allocated,
            topics = topics.len(),
            "Allocation does not match the requested total"
        );
    }
    debug!(
        total_requested = total_questions,
        total_allocated,
        total_weightage,
        strategy = ?strategy,
        "Question distribution planned"
    );

    Ok(AllocationPlan {
        allocations,
        total_requested: total_questions,
        total_allocated,
        total_weightage,
        strategy,
        exact_sum,
    })
}

fn validate_topics(topics: &[Topic]) -> Result<(), PlanError> {
    let mut seen = HashSet::with_capacity(topics.len());
    for topic in topics {
        if !topic.weightage.is_finite() {
            return Err(PlanError::NonFiniteWeightage {
                topic_id: topic.id.clone(),
            });
        }
        if topic.weightage < 0.0 {
            return Err(PlanError::NegativeWeightage {
                topic_id: topic.id.clone(),
                weightage: topic.weightage,
            });
        }
        if !seen.insert(&topic.id) {
            return Err(PlanError::DuplicateTopic(topic.id.clone()));
        }
    }
    Ok(())
}

fn plan_even(topics: &[Topic], total_questions: u32) -> Vec<Allocation> {
    let per_topic = (total_questions / topics.len() as u32).max(1);
    let exact = total_questions as f64 / topics.len() as f64;
    topics
        .iter()
        .map(|topic| Allocation {
            topic: topic.clone(),
            exact_share: exact,
            rounded_share: per_topic,
            estimated_questions: per_topic,
        })
        .collect()
}

fn plan_weighted(topics: &[Topic], total_questions: u32) -> Vec<Allocation> {
    let mut allocations: Vec<Allocation> = topics
        .iter()
        .map(|topic| {
            let exact_share = topic.weightage / 100.0 * total_questions as f64;
            let rounded_share = if topic.weightage > 0.0 {
                // f64::round rounds half away from zero.
                (exact_share.round() as u32).max(1)
            } else {
                0
            };
            Allocation {
                topic: topic.clone(),
                exact_share,
                rounded_share,
                estimated_questions: rounded_share,
            }
        })
        .collect();

    let allocated: i64 = allocations.iter().map(|a| a.rounded_share as i64).sum();
    let difference = total_questions as i64 - allocated;
    if difference != 0 {
        reconcile(&mut allocations, difference);
    }
    allocations
}

/// Indices ordered by weightage, heaviest first; ties keep input order.
fn by_weightage_desc(allocations: &[Allocation]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..allocations.len()).collect();
    order.sort_by(|&a, &b| {
        allocations[b]
            .topic
            .weightage
            .total_cmp(&allocations[a].topic.weightage)
    });
    order
}

fn reconcile(allocations: &mut [Allocation], difference: i64) {
    let order = by_weightage_desc(allocations);
    let dominant = order[0];

    if difference > 0 {
        allocations[dominant].estimated_questions += difference as u32;
        return;
    }

    let mut remaining = -difference;
    for index in order {
        if remaining == 0 {
            break;
        }
        let allocation = &mut allocations[index];
        if allocation.topic.weightage <= 0.0 {
            continue;
        }
        let removable = (allocation.estimated_questions as i64 - 1).max(0);
        let taken = removable.min(remaining);
        allocation.estimated_questions -= taken as u32;
        remaining -= taken;
        if taken > 0 && index != dominant {
            debug!(
                topic_id = %allocation.topic.id,
                taken,
                "Rounding surplus spilled past the heaviest topic"
            );
        }
    }
}
