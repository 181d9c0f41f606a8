//! intentc: deterministic intent compiler.
//!
//! Turns a small declarative intent language into a validated IR and an
//! explainable execution plan: ordered, dependency-linked steps with
//! resource and cost estimates and an audit trail of every decision.
//!
//! ```
//! let ir = intentc::parse_intent(r#"intent hello { goal: "say hello", capabilities: ["greet"] }"#)?;
//! let plan = intentc::create_plan(&ir)?;
//! assert_eq!(plan.steps[0].action, "validate_intent");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod audit;
pub mod cli;
pub mod core;

pub use crate::core::ir::{parse_intent, validate_ir};
pub use crate::core::planner::{create_plan, Planner};
