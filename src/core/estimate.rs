//! Resource, cost and duration estimates derived from a step list.
//!
//! Estimates are deterministic linear models, not predictions: duration is
//! the sum of every step's timeout (worst case).

use super::config::{CostTable, ResourceModel};
use super::types::{resource_amount, ExecutionStep, ResourceKind, ResourceRequirement};

/// Estimate resources with the default model.
pub fn estimate_resources(steps: &[ExecutionStep]) -> Vec<ResourceRequirement> {
    estimate_resources_with(steps, &ResourceModel::default())
}

/// Compute and memory scale with step count; storage and network are fixed.
pub fn estimate_resources_with(
    steps: &[ExecutionStep],
    model: &ResourceModel,
) -> Vec<ResourceRequirement> {
    let count = steps.len() as f64;
    vec![
        ResourceRequirement {
            kind: ResourceKind::Compute,
            amount: model.compute_ms_per_step * count,
            unit: "ms".to_string(),
        },
        ResourceRequirement {
            kind: ResourceKind::Memory,
            amount: model.memory_mb_per_step * count,
            unit: "MB".to_string(),
        },
        ResourceRequirement {
            kind: ResourceKind::Storage,
            amount: model.storage_mb,
            unit: "MB".to_string(),
        },
        ResourceRequirement {
            kind: ResourceKind::Network,
            amount: model.network_mb,
            unit: "MB".to_string(),
        },
    ]
}

/// Cost with the default cost table and rates.
pub fn calculate_cost(steps: &[ExecutionStep], resources: &[ResourceRequirement]) -> f64 {
    calculate_cost_with(
        steps,
        resources,
        &CostTable::default(),
        &ResourceModel::default(),
    )
}

/// Sum of unit costs plus `compute × compute_rate + memory × memory_rate`,
/// rounded to two decimal places.
pub fn calculate_cost_with(
    steps: &[ExecutionStep],
    resources: &[ResourceRequirement],
    costs: &CostTable,
    model: &ResourceModel,
) -> f64 {
    let step_cost: f64 = steps.iter().map(|s| costs.unit_cost(s.step_type)).sum();
    let compute = resource_amount(resources, ResourceKind::Compute);
    let memory = resource_amount(resources, ResourceKind::Memory);
    round_cents(step_cost + compute * model.compute_rate + memory * model.memory_rate)
}

/// Worst-case duration: the sum of step timeouts.
pub fn estimate_duration_ms(steps: &[ExecutionStep]) -> u64 {
    steps.iter().map(|s| s.timeout).fold(0u64, u64::saturating_add)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
