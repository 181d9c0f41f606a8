//! Rule registry and strategy selection.
//!
//! Rules are `(condition, strategy, priority)` triples held in registration
//! order. Conditions are a closed set of tagged variants so they can be
//! loaded from YAML and evaluated without side effects.
//!
//! Selection ranks matching rules by priority descending, then by
//! registration index ascending. No match falls back to `custom_execution`.

use super::types::{AuditEntry, AuditStage, IntentIR, Strategy};
use crate::audit::log::now_iso8601;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Predicate over an [`IntentIR`]. Text matching is case-insensitive
/// substring matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Goal text contains at least one term
    GoalContainsAny { terms: Vec<String> },

    /// Some capability contains at least one term
    CapabilityContainsAny { terms: Vec<String> },

    /// Every term is contained in some capability
    CapabilitiesContainAll { terms: Vec<String> },

    /// Some constraint contains at least one term
    ConstraintContainsAny { terms: Vec<String> },

    HasArchitecture,

    MinCapabilities { count: usize },

    All { of: Vec<Condition> },

    Any { of: Vec<Condition> },

    Not { of: Box<Condition> },
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn any_contains(items: &[String], term: &str) -> bool {
    items.iter().any(|item| contains_ci(item, term))
}

impl Condition {
    /// Evaluate against an IR.
    pub fn matches(&self, ir: &IntentIR) -> bool {
        match self {
            Self::GoalContainsAny { terms } => ir
                .goal
                .as_deref()
                .is_some_and(|goal| terms.iter().any(|t| contains_ci(goal, t))),
            Self::CapabilityContainsAny { terms } => {
                terms.iter().any(|t| any_contains(&ir.capabilities, t))
            }
            Self::CapabilitiesContainAll { terms } => {
                !terms.is_empty() && terms.iter().all(|t| any_contains(&ir.capabilities, t))
            }
            Self::ConstraintContainsAny { terms } => {
                terms.iter().any(|t| any_contains(&ir.constraints, t))
            }
            Self::HasArchitecture => ir.architecture.is_some(),
            Self::MinCapabilities { count } => ir.capabilities.len() >= *count,
            Self::All { of } => of.iter().all(|c| c.matches(ir)),
            Self::Any { of } => of.iter().any(|c| c.matches(ir)),
            Self::Not { of } => !of.matches(ir),
        }
    }

    /// Term lists and groups that can never contribute to a match.
    pub(crate) fn structural_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        match self {
            Self::GoalContainsAny { terms }
            | Self::CapabilityContainsAny { terms }
            | Self::CapabilitiesContainAll { terms }
            | Self::ConstraintContainsAny { terms } => {
                if terms.is_empty() {
                    problems.push(format!("condition '{}' has no terms", self.kind()));
                }
                if terms.iter().any(|t| t.trim().is_empty()) {
                    problems.push(format!("condition '{}' has a blank term", self.kind()));
                }
            }
            Self::All { of } | Self::Any { of } => {
                if of.is_empty() {
                    problems.push(format!("condition '{}' has no sub-conditions", self.kind()));
                }
                for c in of {
                    problems.extend(c.structural_problems());
                }
            }
            Self::Not { of } => problems.extend(of.structural_problems()),
            Self::HasArchitecture | Self::MinCapabilities { .. } => {}
        }
        problems
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::GoalContainsAny { .. } => "goal_contains_any",
            Self::CapabilityContainsAny { .. } => "capability_contains_any",
            Self::CapabilitiesContainAll { .. } => "capabilities_contain_all",
            Self::ConstraintContainsAny { .. } => "constraint_contains_any",
            Self::HasArchitecture => "has_architecture",
            Self::MinCapabilities { .. } => "min_capabilities",
            Self::All { .. } => "all",
            Self::Any { .. } => "any",
            Self::Not { .. } => "not",
        }
    }
}

fn join_group(f: &mut fmt::Formatter<'_>, of: &[Condition], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, c) in of.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        write!(f, "{}", c)?;
    }
    write!(f, ")")
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoalContainsAny { terms } => {
                write!(f, "goal contains any of [{}]", terms.join(", "))
            }
            Self::CapabilityContainsAny { terms } => {
                write!(f, "a capability contains any of [{}]", terms.join(", "))
            }
            Self::CapabilitiesContainAll { terms } => {
                write!(f, "capabilities cover all of [{}]", terms.join(", "))
            }
            Self::ConstraintContainsAny { terms } => {
                write!(f, "a constraint contains any of [{}]", terms.join(", "))
            }
            Self::HasArchitecture => write!(f, "architecture is declared"),
            Self::MinCapabilities { count } => write!(f, "at least {} capabilities", count),
            Self::All { of } => join_group(f, of, "and"),
            Self::Any { of } => join_group(f, of, "or"),
            Self::Not { of } => write!(f, "not {}", of),
        }
    }
}

/// A registered planning rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningRule {
    pub name: String,
    pub strategy: Strategy,
    pub priority: i32,
    pub condition: Condition,
}

fn terms(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The built-in rule set, in registration order.
pub fn builtin_rules() -> Vec<PlanningRule> {
    vec![
        PlanningRule {
            name: "crud_detection".to_string(),
            strategy: Strategy::CrudGeneration,
            priority: 10,
            condition: Condition::Any {
                of: vec![
                    Condition::GoalContainsAny {
                        terms: terms(&["crud", "product catalog", "data management"]),
                    },
                    Condition::CapabilitiesContainAll {
                        terms: terms(&["create", "read"]),
                    },
                ],
            },
        },
        PlanningRule {
            name: "ml_workflow".to_string(),
            strategy: Strategy::MlWorkflow,
            priority: 9,
            condition: Condition::CapabilityContainsAny {
                terms: terms(&["machine learning", "train", "model", "predict"]),
            },
        },
        PlanningRule {
            name: "api_orchestration".to_string(),
            strategy: Strategy::ApiOrchestration,
            priority: 8,
            condition: Condition::Any {
                of: vec![
                    Condition::GoalContainsAny {
                        terms: terms(&["api integration", "orchestrat", "integrate"]),
                    },
                    Condition::CapabilityContainsAny {
                        terms: terms(&["api call", "call api", "webhook", "integrate", "orchestrat"]),
                    },
                ],
            },
        },
        PlanningRule {
            name: "data_pipeline".to_string(),
            strategy: Strategy::DataPipeline,
            priority: 7,
            condition: Condition::Any {
                of: vec![
                    Condition::GoalContainsAny {
                        terms: terms(&["pipeline", "etl", "data processing"]),
                    },
                    Condition::CapabilityContainsAny {
                        terms: terms(&["etl", "transform", "pipeline", "ingest", "aggregate"]),
                    },
                ],
            },
        },
    ]
}

/// Ordered rule list. Read-only once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleRegistry {
    rules: Vec<PlanningRule>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new(builtin_rules())
    }
}

impl RuleRegistry {
    pub fn new(rules: Vec<PlanningRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[PlanningRule] {
        &self.rules
    }

    /// All rules in evaluation order: priority descending, then
    /// registration order ascending.
    pub fn ranked(&self) -> Vec<&PlanningRule> {
        let mut ranked: Vec<(usize, &PlanningRule)> = self.rules.iter().enumerate().collect();
        ranked.sort_by(|(ia, a), (ib, b)| b.priority.cmp(&a.priority).then(ia.cmp(ib)));
        ranked.into_iter().map(|(_, rule)| rule).collect()
    }

    /// Matching rules in [`ranked`](Self::ranked) order.
    pub fn ranked_matches(&self, ir: &IntentIR) -> Vec<&PlanningRule> {
        self.ranked()
            .into_iter()
            .filter(|rule| {
                let hit = rule.condition.matches(ir);
                tracing::debug!(rule = %rule.name, matched = hit, "evaluated rule");
                hit
            })
            .collect()
    }

    /// Select a strategy and describe the decision.
    pub fn select_strategy(&self, ir: &IntentIR) -> (Strategy, AuditEntry) {
        let ranked = self.ranked_matches(ir);

        let Some((winner, others)) = ranked.split_first() else {
            let entry = AuditEntry {
                timestamp: now_iso8601(),
                stage: AuditStage::StrategySelection,
                decision: Strategy::CustomExecution.to_string(),
                reasoning: format!(
                    "no planning rule matched intent '{}' ({} evaluated); falling back to {}",
                    ir.name,
                    self.rules.len(),
                    Strategy::CustomExecution
                ),
                alternatives: Vec::new(),
            };
            return (Strategy::CustomExecution, entry);
        };

        let entry = AuditEntry {
            timestamp: now_iso8601(),
            stage: AuditStage::StrategySelection,
            decision: winner.strategy.to_string(),
            reasoning: format!(
                "rule '{}' (priority {}) matched: {}",
                winner.name, winner.priority, winner.condition
            ),
            alternatives: others.iter().map(|r| r.name.clone()).collect(),
        };
        (winner.strategy, entry)
    }
}
