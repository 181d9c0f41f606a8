//! Plan generation: strategy selection, step expansion, estimates, audit.
//!
//! A [`Planner`] owns its configuration and rule registry and never mutates
//! them, so one instance can serve concurrent callers.

use super::config::PlannerConfig;
use super::dag;
use super::error::{PlanningError, ValidationError};
use super::estimate;
use super::ir::validate_ir_with;
use super::rules::RuleRegistry;
use super::steps::{describe_template, generate_steps_with};
use super::types::*;
use crate::audit::hasher;
use crate::audit::log::{now_iso8601, AuditLog};

/// Deterministic planner over an immutable configuration.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlannerConfig,
    registry: RuleRegistry,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        let registry = RuleRegistry::new(config.rules.clone());
        Self { config, registry }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Validate an IR with this planner's complexity threshold.
    pub fn validate(&self, ir: &IntentIR) -> Vec<ValidationError> {
        validate_ir_with(ir, self.config.max_complexity)
    }

    /// Build an execution plan for one IR. Does not validate the IR.
    pub fn create_plan(&self, ir: &IntentIR) -> Result<ExecutionPlan, PlanningError> {
        let mut audit = AuditLog::new();

        let (strategy, selection) = self.registry.select_strategy(ir);
        audit.push(selection);

        let steps = generate_steps_with(
            ir,
            strategy,
            self.config.step_timeout_ms,
            &self.config.retry,
        );
        if steps.is_empty() {
            return Err(PlanningError::EmptyPlan(strategy));
        }
        dag::check_dependencies(&steps)?;
        let waves = dag::execution_waves(&steps)?;
        audit.record(
            AuditStage::StepGeneration,
            format!("{} steps", steps.len()),
            format!("{} template: {}", strategy, describe_template(strategy)),
            Vec::new(),
        );

        let resources = estimate::estimate_resources_with(&steps, &self.config.resources);
        let summary: Vec<String> = resources
            .iter()
            .map(|r| format!("{} {}{}", r.kind, r.amount, r.unit))
            .collect();
        audit.record(
            AuditStage::ResourceEstimation,
            format!("{} resource requirements", resources.len()),
            summary.join(", "),
            Vec::new(),
        );

        let cost = estimate::calculate_cost_with(
            &steps,
            &resources,
            &self.config.costs,
            &self.config.resources,
        );
        let duration = estimate::estimate_duration_ms(&steps);
        audit.record(
            AuditStage::PlanComplete,
            format!(
                "{} plan with {} steps in {} waves",
                strategy,
                steps.len(),
                waves.len()
            ),
            format!(
                "estimated duration {}ms (sum of step timeouts), estimated cost {:.2}",
                duration, cost
            ),
            Vec::new(),
        );

        let fingerprint = hasher::plan_fingerprint(strategy, &steps, cost);
        tracing::info!(
            intent = %ir.name,
            strategy = %strategy,
            steps = steps.len(),
            cost,
            duration_ms = duration,
            "plan created"
        );

        Ok(ExecutionPlan {
            id: hasher::generate_id("plan", &ir.id),
            intent_id: ir.id.clone(),
            strategy,
            steps,
            estimated_duration_ms: duration,
            estimated_cost: cost,
            resources,
            audit_log: audit.into_entries(),
            execution_waves: waves,
            fingerprint,
            generated_at: now_iso8601(),
        })
    }
}

/// Plan with the built-in configuration.
pub fn create_plan(ir: &IntentIR) -> Result<ExecutionPlan, PlanningError> {
    Planner::default().create_plan(ir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::parse_config;
    use crate::core::ir::parse_intent;

    const CANONICAL: &str = r#"
intent build_crud {
  goal: "Create a simple product catalog API",
  capabilities: ["create products", "read products", "update products", "delete products"],
  constraints: ["validate input data", "require authentication"]
}
"#;

    fn plan_for(src: &str) -> ExecutionPlan {
        create_plan(&parse_intent(src).unwrap()).unwrap()
    }

    fn assert_dependencies_valid(plan: &ExecutionPlan) {
        for step in &plan.steps {
            for dep in &step.dependencies {
                let target = plan.step(dep).expect("dependency exists in plan");
                assert!(target.order < step.order, "{} -> {}", step.id, dep);
            }
        }
    }

    #[test]
    fn test_planner_canonical_end_to_end() {
        let ir = parse_intent(CANONICAL).unwrap();
        let plan = create_plan(&ir).unwrap();

        assert_eq!(plan.strategy, Strategy::CrudGeneration);
        assert_eq!(plan.intent_id, ir.id);
        let actions: Vec<&str> = plan.steps.iter().map(|s| s.action.as_str()).collect();
        assert_eq!(
            actions,
            vec![
                "validate_intent",
                "generate_schema",
                "create_database",
                "generate_endpoints",
                "deploy_api"
            ]
        );
        for (i, step) in plan.steps.iter().enumerate() {
            assert_eq!(step.order, i);
            if i > 0 {
                assert_eq!(step.dependencies, vec![format!("step_{}", i - 1)]);
            }
        }
        assert_eq!(plan.estimated_duration_ms, 150_000);
        assert_eq!(plan.estimated_cost, 61.64);
        assert_eq!(plan.resource_amount(ResourceKind::Compute), 500.0);
        assert_eq!(plan.resource_amount(ResourceKind::Memory), 640.0);
        assert_eq!(plan.execution_waves.len(), 5);
        assert!(plan.fingerprint.starts_with("blake3:"));
        assert_dependencies_valid(&plan);
    }

    #[test]
    fn test_planner_audit_stages_in_order() {
        let plan = plan_for(CANONICAL);
        let stages: Vec<AuditStage> = plan.audit_log.iter().map(|e| e.stage).collect();
        assert_eq!(
            stages,
            vec![
                AuditStage::StrategySelection,
                AuditStage::StepGeneration,
                AuditStage::ResourceEstimation,
                AuditStage::PlanComplete
            ]
        );
        assert_eq!(plan.audit_log[0].decision, "crud_generation");
        assert!(plan.audit_log[0].reasoning.contains("crud_detection"));
        assert_eq!(plan.audit_log[1].decision, "5 steps");
        assert!(plan.audit_log[3].reasoning.contains("150000ms"));
        assert!(plan.audit_log[3].reasoning.contains("61.64"));
    }

    #[test]
    fn test_planner_deterministic() {
        let ir = parse_intent(CANONICAL).unwrap();
        let planner = Planner::default();
        let a = planner.create_plan(&ir).unwrap();
        let b = planner.create_plan(&ir).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.strategy, b.strategy);
        assert_eq!(a.steps, b.steps);
        assert_eq!(a.estimated_cost, b.estimated_cost);
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn test_planner_fallback_has_audit() {
        let plan = plan_for(r#"intent hello { goal: "say hello", capabilities: ["greet users"] }"#);
        assert_eq!(plan.strategy, Strategy::CustomExecution);
        assert!(!plan.audit_log.is_empty());
        let selection = &plan.audit_log[0];
        assert_eq!(selection.stage, AuditStage::StrategySelection);
        assert_eq!(selection.decision, "custom_execution");
        assert!(selection.alternatives.is_empty());
        for rule in Planner::default().registry().rules() {
            assert!(!selection.reasoning.contains(&rule.name));
        }
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[1].step_type, StepType::ExecuteQuery);
        // 1 + 5 + 200 * 0.01 + 256 * 0.001
        assert_eq!(plan.estimated_cost, 8.26);
    }

    #[test]
    fn test_planner_priority_crud_over_ml() {
        let plan = plan_for(
            r#"intent mixed { goal: "crud admin", capabilities: ["train a churn model"] }"#,
        );
        assert_eq!(plan.strategy, Strategy::CrudGeneration);
        assert_eq!(plan.audit_log[0].alternatives, vec!["ml_workflow"]);
    }

    #[test]
    fn test_planner_does_not_validate() {
        let ir = parse_intent("intent empty {}").unwrap();
        let planner = Planner::default();
        assert!(!planner.validate(&ir).is_empty());
        let plan = planner.create_plan(&ir).unwrap();
        assert_eq!(plan.strategy, Strategy::CustomExecution);
    }

    #[test]
    fn test_planner_custom_config() {
        let config = parse_config(
            r#"
step_timeout_ms: 1000
costs:
  execute_query: 100
rules:
  - name: everything
    strategy: data_pipeline
    priority: 1
    condition:
      kind: min_capabilities
      count: 0
"#,
        )
        .unwrap();
        let planner = Planner::new(config);
        let plan = planner
            .create_plan(&parse_intent("intent x { goal: \"g\" }").unwrap())
            .unwrap();
        assert_eq!(plan.strategy, Strategy::DataPipeline);
        assert_eq!(plan.estimated_duration_ms, 2000);
        assert!(plan.steps.iter().all(|s| s.timeout == 1000));
        assert!(plan.audit_log[0].reasoning.contains("'everything'"));
    }

    #[test]
    fn test_planner_empty_registry_falls_back() {
        let config = PlannerConfig {
            rules: Vec::new(),
            ..PlannerConfig::default()
        };
        let plan = Planner::new(config)
            .create_plan(&parse_intent(CANONICAL).unwrap())
            .unwrap();
        assert_eq!(plan.strategy, Strategy::CustomExecution);
        assert!(plan.audit_log[0].reasoning.contains("0 evaluated"));
    }

    #[test]
    fn test_planner_concurrent_callers() {
        let planner = Planner::default();
        let ir = parse_intent(CANONICAL).unwrap();
        let expected = planner.create_plan(&ir).unwrap().fingerprint;
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| planner.create_plan(&ir).unwrap().fingerprint))
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_planner_serializes_executor_schema() {
        let plan = plan_for(CANONICAL);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["strategy"], "crud_generation");
        assert_eq!(json["estimatedDurationMs"], 150_000);
        assert_eq!(json["steps"][1]["type"], "generate_code");
        assert_eq!(json["steps"][1]["retryPolicy"]["backoffMs"], 1000);
        assert_eq!(json["auditLog"][0]["stage"], "strategy_selection");
        assert_eq!(json["resources"][0]["type"], "compute");
        let back: ExecutionPlan = serde_json::from_value(json).unwrap();
        assert_eq!(back, plan);
    }
}
