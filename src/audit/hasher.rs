//! BLAKE3 hashing for ids and plan fingerprints.

use crate::core::types::{ExecutionStep, Strategy};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// NUL-separated BLAKE3 over `components`. Returns `"blake3:{hex}"`.
fn composite_hash(components: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for c in components {
        hasher.update(c.as_bytes());
        hasher.update(b"\0");
    }
    format!("blake3:{}", hasher.finalize().to_hex())
}

/// Generate an id of the form `{prefix}-{16 hex}`.
///
/// Mixes the seed with the wall clock and a process-wide counter, so two
/// calls never collide within one process even with the same seed.
pub fn generate_id(prefix: &str, seed: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let count = ID_COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut hasher = blake3::Hasher::new();
    hasher.update(seed.as_bytes());
    hasher.update(b"\0");
    hasher.update(&nanos.to_le_bytes());
    hasher.update(&count.to_le_bytes());
    let hex = hasher.finalize().to_hex();
    format!("{}-{}", prefix, &hex.as_str()[..16])
}

/// Fingerprint the deterministic part of a plan: strategy, steps, cost.
/// Ids of the intent and plan and all timestamps are excluded.
pub fn plan_fingerprint(strategy: Strategy, steps: &[ExecutionStep], cost: f64) -> String {
    let mut components = vec![strategy.to_string(), format!("{:.2}", cost)];
    for step in steps {
        let params: Vec<String> = step
            .parameters
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        components.push(format!(
            "{}|{}|{}|{}|{}|{}|{}",
            step.id,
            step.order,
            step.step_type,
            step.action,
            step.dependencies.join(","),
            step.timeout,
            params.join(";")
        ));
    }
    let refs: Vec<&str> = components.iter().map(String::as_str).collect();
    composite_hash(&refs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{step_id, RetryPolicy, StepType};
    use indexmap::IndexMap;
    use std::collections::HashSet;

    fn step(order: usize, action: &str) -> ExecutionStep {
        ExecutionStep {
            id: step_id(order),
            order,
            step_type: StepType::Validate,
            action: action.to_string(),
            parameters: IndexMap::new(),
            dependencies: vec![],
            timeout: 30000,
            retry_policy: RetryPolicy::default(),
        }
    }

    #[test]
    fn test_hasher_composite_order_sensitive() {
        let h = composite_hash(&["a", "b"]);
        let h2 = composite_hash(&["b", "a"]);
        assert_ne!(h, h2);
        assert_ne!(composite_hash(&["ab"]), composite_hash(&["a", "b"]));
        assert!(h.starts_with("blake3:"));
        assert_eq!(h.len(), 7 + 64);
    }

    #[test]
    fn test_hasher_generate_id_unique() {
        let ids: HashSet<String> = (0..500).map(|_| generate_id("intent", "same")).collect();
        assert_eq!(ids.len(), 500);
        let id = generate_id("plan", "x");
        assert!(id.starts_with("plan-"));
        assert_eq!(id.len(), "plan-".len() + 16);
    }

    #[test]
    fn test_hasher_fingerprint_deterministic() {
        let steps = vec![step(0, "validate_intent")];
        let a = plan_fingerprint(Strategy::CustomExecution, &steps, 1.5);
        let b = plan_fingerprint(Strategy::CustomExecution, &steps, 1.5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_hasher_fingerprint_sensitive_to_content() {
        let steps = vec![step(0, "validate_intent")];
        let base = plan_fingerprint(Strategy::CustomExecution, &steps, 1.5);
        assert_ne!(base, plan_fingerprint(Strategy::MlWorkflow, &steps, 1.5));
        assert_ne!(base, plan_fingerprint(Strategy::CustomExecution, &steps, 2.5));
        let other = vec![step(0, "something_else")];
        assert_ne!(base, plan_fingerprint(Strategy::CustomExecution, &other, 1.5));
    }
}
