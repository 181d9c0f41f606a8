//! Planner configuration: step defaults, cost table, resource model and the
//! rule list. Loaded from YAML; every field falls back to the built-in
//! defaults so an empty document is a valid config.

use super::error::ValidationError;
use super::rules::{builtin_rules, PlanningRule};
use super::types::{RetryPolicy, StepType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Complexity score above which `validate_ir` flags an intent.
pub const DEFAULT_MAX_COMPLEXITY: u32 = 50;

/// Root planner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Per-step timeout in milliseconds
    pub step_timeout_ms: u64,

    /// Retry policy attached to every step
    pub retry: RetryPolicy,

    /// Unit cost per step type
    pub costs: CostTable,

    /// Resource model
    pub resources: ResourceModel,

    /// Threshold used by `validate_ir`
    pub max_complexity: u32,

    /// Planning rules, in registration order
    pub rules: Vec<PlanningRule>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            step_timeout_ms: 30_000,
            retry: RetryPolicy::default(),
            costs: CostTable::default(),
            resources: ResourceModel::default(),
            max_complexity: DEFAULT_MAX_COMPLEXITY,
            rules: builtin_rules(),
        }
    }
}

/// Fixed unit cost per step type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostTable {
    pub validate: f64,
    pub generate_code: f64,
    pub create_resource: f64,
    pub execute_query: f64,
    pub api_call: f64,
    pub transform_data: f64,
    pub train_model: f64,
    pub deploy: f64,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            validate: 1.0,
            generate_code: 10.0,
            create_resource: 15.0,
            execute_query: 5.0,
            api_call: 8.0,
            transform_data: 12.0,
            train_model: 50.0,
            deploy: 20.0,
        }
    }
}

impl CostTable {
    pub fn unit_cost(&self, step_type: StepType) -> f64 {
        match step_type {
            StepType::Validate => self.validate,
            StepType::GenerateCode => self.generate_code,
            StepType::CreateResource => self.create_resource,
            StepType::ExecuteQuery => self.execute_query,
            StepType::ApiCall => self.api_call,
            StepType::TransformData => self.transform_data,
            StepType::TrainModel => self.train_model,
            StepType::Deploy => self.deploy,
        }
    }

    fn entries(&self) -> [(&'static str, f64); 8] {
        [
            ("validate", self.validate),
            ("generate_code", self.generate_code),
            ("create_resource", self.create_resource),
            ("execute_query", self.execute_query),
            ("api_call", self.api_call),
            ("transform_data", self.transform_data),
            ("train_model", self.train_model),
            ("deploy", self.deploy),
        ]
    }
}

/// Linear resource model: per-step compute/memory, fixed storage/network,
/// and the rates that turn compute/memory into cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceModel {
    pub compute_ms_per_step: f64,
    pub memory_mb_per_step: f64,
    pub storage_mb: f64,
    pub network_mb: f64,
    pub compute_rate: f64,
    pub memory_rate: f64,
}

impl Default for ResourceModel {
    fn default() -> Self {
        Self {
            compute_ms_per_step: 100.0,
            memory_mb_per_step: 128.0,
            storage_mb: 10.0,
            network_mb: 5.0,
            compute_rate: 0.01,
            memory_rate: 0.001,
        }
    }
}

impl ResourceModel {
    fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("compute_ms_per_step", self.compute_ms_per_step),
            ("memory_mb_per_step", self.memory_mb_per_step),
            ("storage_mb", self.storage_mb),
            ("network_mb", self.network_mb),
            ("compute_rate", self.compute_rate),
            ("memory_rate", self.memory_rate),
        ]
    }
}

/// Parse a planner config file from disk.
pub fn parse_config_file(path: &Path) -> Result<PlannerConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_config(&content)
}

/// Parse a planner config from a YAML string.
pub fn parse_config(yaml: &str) -> Result<PlannerConfig, String> {
    if yaml.trim().is_empty() {
        return Ok(PlannerConfig::default());
    }
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
}

/// Serialize a config to YAML.
pub fn to_yaml(config: &PlannerConfig) -> Result<String, String> {
    serde_yaml_ng::to_string(config).map_err(|e| format!("YAML serialize error: {}", e))
}

/// Validate a config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &PlannerConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.step_timeout_ms == 0 {
        errors.push(ValidationError::new("step_timeout_ms must be greater than 0"));
    }
    if config.retry.max_attempts == 0 {
        errors.push(ValidationError::new("retry.max_attempts must be at least 1"));
    }
    if config.retry.backoff_multiplier == 0 {
        errors.push(ValidationError::new(
            "retry.backoff_multiplier must be at least 1",
        ));
    }

    for (name, value) in config.costs.entries() {
        if !value.is_finite() || value < 0.0 {
            errors.push(ValidationError::new(format!(
                "costs.{} must be a non-negative number, got {}",
                name, value
            )));
        }
    }
    for (name, value) in config.resources.entries() {
        if !value.is_finite() || value < 0.0 {
            errors.push(ValidationError::new(format!(
                "resources.{} must be a non-negative number, got {}",
                name, value
            )));
        }
    }

    let mut seen = HashSet::new();
    for rule in &config.rules {
        if rule.name.trim().is_empty() {
            errors.push(ValidationError::new("rule name must not be empty"));
        } else if !seen.insert(rule.name.as_str()) {
            errors.push(ValidationError::new(format!(
                "duplicate rule name '{}'",
                rule.name
            )));
        }
        for problem in rule.condition.structural_problems() {
            errors.push(ValidationError::new(format!(
                "rule '{}': {}",
                rule.name, problem
            )));
        }
    }

    errors
}
