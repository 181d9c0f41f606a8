//! Step generation: expand a strategy into its fixed step template.
//!
//! Every plan starts with `validate_intent` at order 0. Each strategy then
//! appends a static template whose dependencies name earlier positions only,
//! so plans are acyclic by construction.

use super::types::{step_id, ExecutionStep, IntentIR, RetryPolicy, StepType, Strategy, Value};
use indexmap::IndexMap;

/// Default per-step timeout in milliseconds.
pub const DEFAULT_STEP_TIMEOUT_MS: u64 = 30_000;

/// IR field copied into a step's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    IntentId,
    IntentName,
    Goal,
    Capabilities,
    Constraints,
    SuccessCriteria,
    Architecture,
}

/// One entry of a strategy template.
#[derive(Debug, Clone, Copy)]
pub struct StepTemplate {
    pub step_type: StepType,
    pub action: &'static str,
    /// Orders of the steps this one waits for
    pub depends_on: &'static [usize],
    pub params: &'static [Param],
}

const VALIDATE: StepTemplate = StepTemplate {
    step_type: StepType::Validate,
    action: "validate_intent",
    depends_on: &[],
    params: &[Param::IntentId, Param::IntentName, Param::Constraints],
};

const CRUD: &[StepTemplate] = &[
    StepTemplate {
        step_type: StepType::GenerateCode,
        action: "generate_schema",
        depends_on: &[0],
        params: &[Param::Capabilities, Param::Architecture],
    },
    StepTemplate {
        step_type: StepType::CreateResource,
        action: "create_database",
        depends_on: &[1],
        params: &[Param::IntentName, Param::Architecture],
    },
    StepTemplate {
        step_type: StepType::GenerateCode,
        action: "generate_endpoints",
        depends_on: &[2],
        params: &[Param::Capabilities, Param::Constraints],
    },
    StepTemplate {
        step_type: StepType::Deploy,
        action: "deploy_api",
        depends_on: &[3],
        params: &[Param::IntentName, Param::SuccessCriteria],
    },
];

const API_ORCHESTRATION: &[StepTemplate] = &[StepTemplate {
    step_type: StepType::ApiCall,
    action: "orchestrate_apis",
    depends_on: &[0],
    params: &[Param::Goal, Param::Capabilities],
}];

const DATA_PIPELINE: &[StepTemplate] = &[StepTemplate {
    step_type: StepType::TransformData,
    action: "run_pipeline",
    depends_on: &[0],
    params: &[Param::Goal, Param::Capabilities, Param::Constraints],
}];

const ML_WORKFLOW: &[StepTemplate] = &[StepTemplate {
    step_type: StepType::TrainModel,
    action: "train_model",
    depends_on: &[0],
    params: &[Param::Goal, Param::Capabilities, Param::SuccessCriteria],
}];

const CUSTOM_EXECUTION: &[StepTemplate] = &[StepTemplate {
    step_type: StepType::ExecuteQuery,
    action: "execute_custom",
    depends_on: &[0],
    params: &[Param::Goal, Param::Capabilities, Param::Constraints],
}];

/// Template appended after the validation step for `strategy`.
pub fn template(strategy: Strategy) -> &'static [StepTemplate] {
    match strategy {
        Strategy::CrudGeneration => CRUD,
        Strategy::ApiOrchestration => API_ORCHESTRATION,
        Strategy::DataPipeline => DATA_PIPELINE,
        Strategy::MlWorkflow => ML_WORKFLOW,
        Strategy::CustomExecution => CUSTOM_EXECUTION,
    }
}

/// Human-readable template outline, e.g. `validate_intent -> train_model`.
pub fn describe_template(strategy: Strategy) -> String {
    std::iter::once(VALIDATE.action)
        .chain(template(strategy).iter().map(|t| t.action))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Generate steps with the default timeout and retry policy.
pub fn generate_steps(ir: &IntentIR, strategy: Strategy) -> Vec<ExecutionStep> {
    generate_steps_with(ir, strategy, DEFAULT_STEP_TIMEOUT_MS, &RetryPolicy::default())
}

/// Generate steps with an explicit timeout and retry policy.
pub fn generate_steps_with(
    ir: &IntentIR,
    strategy: Strategy,
    timeout_ms: u64,
    retry: &RetryPolicy,
) -> Vec<ExecutionStep> {
    std::iter::once(&VALIDATE)
        .chain(template(strategy))
        .enumerate()
        .map(|(order, t)| ExecutionStep {
            id: step_id(order),
            order,
            step_type: t.step_type,
            action: t.action.to_string(),
            parameters: parameters(ir, t.params),
            dependencies: t.depends_on.iter().map(|&d| step_id(d)).collect(),
            timeout: timeout_ms,
            retry_policy: retry.clone(),
        })
        .collect()
}

fn parameters(ir: &IntentIR, params: &[Param]) -> IndexMap<String, Value> {
    let mut map = IndexMap::new();
    for param in params {
        match param {
            Param::IntentId => {
                map.insert("intent_id".to_string(), Value::Str(ir.id.clone()));
            }
            Param::IntentName => {
                map.insert("intent_name".to_string(), Value::Str(ir.name.clone()));
            }
            Param::Goal => {
                if let Some(goal) = &ir.goal {
                    map.insert("goal".to_string(), Value::Str(goal.clone()));
                }
            }
            Param::Capabilities => {
                map.insert(
                    "capabilities".to_string(),
                    Value::List(ir.capabilities.clone()),
                );
            }
            Param::Constraints => {
                map.insert(
                    "constraints".to_string(),
                    Value::List(ir.constraints.clone()),
                );
            }
            Param::SuccessCriteria => {
                if let Some(criteria) = &ir.success_criteria {
                    map.insert("success_criteria".to_string(), Value::Str(criteria.clone()));
                }
            }
            Param::Architecture => {
                if let Some(arch) = &ir.architecture {
                    map.insert("architecture".to_string(), Value::Map(arch.clone()));
                }
            }
        }
    }
    map
}
