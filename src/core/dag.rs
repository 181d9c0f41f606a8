//! Dependency checks over a step list.
//!
//! Verifies that every dependency names an earlier step and groups steps
//! into waves with Kahn's algorithm. Within a wave, steps are ordered by
//! their `order` so the output is deterministic.

use super::error::PlanningError;
use super::types::ExecutionStep;
use std::collections::HashMap;

/// Every dependency must exist and have a strictly smaller order.
pub fn check_dependencies(steps: &[ExecutionStep]) -> Result<(), PlanningError> {
    let orders: HashMap<&str, usize> = steps.iter().map(|s| (s.id.as_str(), s.order)).collect();
    for step in steps {
        for dep in &step.dependencies {
            match orders.get(dep.as_str()) {
                None => {
                    return Err(PlanningError::UnknownDependency {
                        step: step.id.clone(),
                        dependency: dep.clone(),
                    })
                }
                Some(&order) if order >= step.order => {
                    return Err(PlanningError::ForwardDependency {
                        step: step.id.clone(),
                        dependency: dep.clone(),
                    })
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}

/// Group step ids into waves: every step's dependencies live in earlier
/// waves, and steps in one wave are independent of each other.
pub fn execution_waves(steps: &[ExecutionStep]) -> Result<Vec<Vec<String>>, PlanningError> {
    let by_id: HashMap<&str, &ExecutionStep> = steps.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for step in steps {
        in_degree.entry(step.id.as_str()).or_insert(0);
        for dep in &step.dependencies {
            if !by_id.contains_key(dep.as_str()) {
                return Err(PlanningError::UnknownDependency {
                    step: step.id.clone(),
                    dependency: dep.clone(),
                });
            }
            dependents
                .entry(dep.as_str())
                .or_default()
                .push(step.id.as_str());
            *in_degree.entry(step.id.as_str()).or_insert(0) += 1;
        }
    }

    let sort_by_order = |ids: &mut Vec<&str>| {
        ids.sort_by_key(|id| by_id.get(*id).map(|s| s.order).unwrap_or(usize::MAX));
    };

    let mut current: Vec<&str> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(&id, _)| id)
        .collect();
    sort_by_order(&mut current);

    let mut waves = Vec::new();
    let mut placed = 0;
    while !current.is_empty() {
        let mut next = Vec::new();
        for id in &current {
            for dependent in dependents.get(*id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(*dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        next.push(*dependent);
                    }
                }
            }
        }
        placed += current.len();
        waves.push(current.iter().map(|id| id.to_string()).collect());
        sort_by_order(&mut next);
        current = next;
    }

    if placed != in_degree.len() {
        let mut stuck: Vec<&str> = in_degree
            .iter()
            .filter(|(_, &d)| d > 0)
            .map(|(&id, _)| id)
            .collect();
        sort_by_order(&mut stuck);
        return Err(PlanningError::Cycle(stuck.join(", ")));
    }

    Ok(waves)
}
