//! Data model for the intent pipeline.
//!
//! Defines the IR, the execution plan handed to the executor, and the audit
//! records. Plan and IR types serialize with camelCase field names, which is
//! the schema the downstream executor consumes.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Values
// ============================================================================

/// A value from an object body: scalar, list of strings, or nested object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    List(Vec<String>),
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::List(_) => "array",
            Self::Map(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{}", s),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
            Self::Map(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

// ============================================================================
// Intent IR
// ============================================================================

/// Lowered, strongly-typed form of one intent declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntentIR {
    /// Unique id (`intent-<hex>`)
    pub id: String,

    /// Declared intent identifier
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,

    #[serde(default)]
    pub capabilities: Vec<String>,

    #[serde(default)]
    pub constraints: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_criteria: Option<String>,

    /// Free-form architecture block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<IndexMap<String, Value>>,

    pub metadata: IntentMetadata,
}

/// Bookkeeping attached to an IR at lowering time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntentMetadata {
    /// ISO 8601 UTC
    pub parsed_at: String,

    /// Filled by `parse_intent`, zero when lowered directly
    pub source_line_count: usize,

    pub complexity_score: u32,
}

// ============================================================================
// Strategies and steps
// ============================================================================

/// Execution approach chosen for an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CrudGeneration,
    ApiOrchestration,
    DataPipeline,
    MlWorkflow,
    CustomExecution,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CrudGeneration => write!(f, "crud_generation"),
            Self::ApiOrchestration => write!(f, "api_orchestration"),
            Self::DataPipeline => write!(f, "data_pipeline"),
            Self::MlWorkflow => write!(f, "ml_workflow"),
            Self::CustomExecution => write!(f, "custom_execution"),
        }
    }
}

/// Kind of work a step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Validate,
    GenerateCode,
    CreateResource,
    ExecuteQuery,
    ApiCall,
    TransformData,
    TrainModel,
    Deploy,
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validate => write!(f, "validate"),
            Self::GenerateCode => write!(f, "generate_code"),
            Self::CreateResource => write!(f, "create_resource"),
            Self::ExecuteQuery => write!(f, "execute_query"),
            Self::ApiCall => write!(f, "api_call"),
            Self::TransformData => write!(f, "transform_data"),
            Self::TrainModel => write!(f, "train_model"),
            Self::Deploy => write!(f, "deploy"),
        }
    }
}

/// Retry parameters handed to the executor. Data only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts", alias = "max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_ms", alias = "backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default = "default_backoff_multiplier", alias = "backoff_multiplier")]
    pub backoff_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> u32 {
    2
}

/// One concrete unit of work in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStep {
    /// Positional id, `step_<order>`
    pub id: String,

    pub order: usize,

    #[serde(rename = "type")]
    pub step_type: StepType,

    pub action: String,

    #[serde(default)]
    pub parameters: IndexMap<String, Value>,

    /// Ids of steps that must finish first (always lower order)
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Milliseconds
    pub timeout: u64,

    pub retry_policy: RetryPolicy,
}

/// Step id for a given position.
pub fn step_id(order: usize) -> String {
    format!("step_{}", order)
}

// ============================================================================
// Resources
// ============================================================================

/// Resource dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Compute,
    Memory,
    Storage,
    Network,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compute => write!(f, "compute"),
            Self::Memory => write!(f, "memory"),
            Self::Storage => write!(f, "storage"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// Derived resource estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResourceRequirement {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub amount: f64,
    pub unit: String,
}

// ============================================================================
// Audit
// ============================================================================

/// Pipeline stage that produced an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditStage {
    StrategySelection,
    StepGeneration,
    ResourceEstimation,
    PlanComplete,
}

impl fmt::Display for AuditStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrategySelection => write!(f, "strategy_selection"),
            Self::StepGeneration => write!(f, "step_generation"),
            Self::ResourceEstimation => write!(f, "resource_estimation"),
            Self::PlanComplete => write!(f, "plan_complete"),
        }
    }
}

/// One explainability record. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AuditEntry {
    pub timestamp: String,
    pub stage: AuditStage,
    pub decision: String,
    pub reasoning: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

// ============================================================================
// Plan
// ============================================================================

/// Full execution plan for one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    pub id: String,
    pub intent_id: String,
    pub strategy: Strategy,
    pub steps: Vec<ExecutionStep>,

    /// Sum of step timeouts (worst case)
    pub estimated_duration_ms: u64,

    pub estimated_cost: f64,
    pub resources: Vec<ResourceRequirement>,
    pub audit_log: Vec<AuditEntry>,

    /// Step ids grouped into waves that may run concurrently
    pub execution_waves: Vec<Vec<String>>,

    /// BLAKE3 over strategy, steps and cost; stable across runs
    pub fingerprint: String,

    pub generated_at: String,
}

impl ExecutionPlan {
    /// Look up a step by id.
    pub fn step(&self, id: &str) -> Option<&ExecutionStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Amount of a resource dimension, zero if absent.
    pub fn resource_amount(&self, kind: ResourceKind) -> f64 {
        resource_amount(&self.resources, kind)
    }
}

/// Amount of `kind` in a resource list, zero if absent.
pub fn resource_amount(resources: &[ResourceRequirement], kind: ResourceKind) -> f64 {
    resources
        .iter()
        .find(|r| r.kind == kind)
        .map(|r| r.amount)
        .unwrap_or(0.0)
}

// ============================================================================
// Tests
// ============================================================================
