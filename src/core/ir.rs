//! AST lowering and IR validation.
//!
//! `parse_intent` composes the pipeline: tokenize → parse → lower → record
//! the source line count. Any failure surfaces as one [`IntentError`].

use super::config::DEFAULT_MAX_COMPLEXITY;
use super::error::{IntentError, LoweringError, ValidationError};
use super::lexer::{self, KEYWORDS};
use super::parser::{self, AstNode, NodeKind};
use super::types::{IntentIR, IntentMetadata, Value};
use crate::audit::{hasher, log::now_iso8601};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Parse and lower a single intent declaration.
pub fn parse_intent(source: &str) -> Result<IntentIR, IntentError> {
    let tokens = lexer::tokenize(source)?;
    let ast = parser::parse(&tokens)?;
    let mut ir = generate_ir(&ast)?;
    ir.metadata.source_line_count = source.lines().count();
    tracing::debug!(
        intent = %ir.name,
        complexity = ir.metadata.complexity_score,
        tokens = tokens.len(),
        "parsed intent"
    );
    Ok(ir)
}

/// Parse and lower every intent declaration in `source`. Each IR records
/// the line count of the whole source.
pub fn parse_intents(source: &str) -> Result<Vec<IntentIR>, IntentError> {
    let tokens = lexer::tokenize(source)?;
    lower_program(source, &tokens)
}

/// Like [`parse_intents`], but stray characters are dropped and an
/// unterminated string runs to end of input instead of failing the lex.
/// Parse and lowering errors still fail.
pub fn parse_intents_lenient(source: &str) -> Result<Vec<IntentIR>, IntentError> {
    let tokens = lexer::tokenize_lenient(source);
    lower_program(source, &tokens)
}

fn lower_program(source: &str, tokens: &[lexer::Token]) -> Result<Vec<IntentIR>, IntentError> {
    let line_count = source.lines().count();
    parser::parse_program(tokens)?
        .iter()
        .map(|ast| {
            let mut ir = generate_ir(ast)?;
            ir.metadata.source_line_count = line_count;
            Ok(ir)
        })
        .collect()
}

/// `2·capabilities + 1·constraints + 10 if architecture is present`.
pub fn complexity_score(capabilities: usize, constraints: usize, has_architecture: bool) -> u32 {
    let caps = u32::try_from(capabilities).unwrap_or(u32::MAX);
    let cons = u32::try_from(constraints).unwrap_or(u32::MAX);
    caps.saturating_mul(2)
        .saturating_add(cons)
        .saturating_add(if has_architecture { 10 } else { 0 })
}

/// Lower an `IntentDeclaration` AST into an IR with a fresh id.
/// `metadata.source_line_count` is left at zero for the caller.
pub fn generate_ir(ast: &AstNode) -> Result<IntentIR, LoweringError> {
    if ast.kind != NodeKind::IntentDeclaration {
        return Err(LoweringError::NotAnIntent(ast.kind.to_string()));
    }
    let name = match &ast.value {
        Value::Str(name) => name.clone(),
        other => return Err(mismatch("name", "a string", other)),
    };

    let empty = IndexMap::new();
    let body = ast.body().unwrap_or(&empty);

    for key in body.keys() {
        if !KEYWORDS.contains(&key.as_str()) {
            tracing::debug!(intent = %name, key = %key, "ignoring unknown field");
        }
    }

    let goal = scalar(body, "goal")?;
    let capabilities = list(body, "capabilities")?;
    let constraints = list(body, "constraints")?;
    let success_criteria = scalar(body, "success_criteria")?;
    let architecture = object(body, "architecture")?;

    let complexity = complexity_score(
        capabilities.len(),
        constraints.len(),
        architecture.is_some(),
    );

    Ok(IntentIR {
        id: hasher::generate_id("intent", &name),
        name,
        goal,
        capabilities,
        constraints,
        success_criteria,
        architecture,
        metadata: IntentMetadata {
            parsed_at: now_iso8601(),
            source_line_count: 0,
            complexity_score: complexity,
        },
    })
}

fn mismatch(field: &str, expected: &'static str, found: &Value) -> LoweringError {
    LoweringError::TypeMismatch {
        field: field.to_string(),
        expected,
        found: found.type_name(),
    }
}

fn scalar(body: &IndexMap<String, Value>, field: &str) -> Result<Option<String>, LoweringError> {
    match body.get(field) {
        None => Ok(None),
        Some(Value::Str(s)) => Ok(Some(s.clone())),
        Some(other) => Err(mismatch(field, "a string", other)),
    }
}

fn list(body: &IndexMap<String, Value>, field: &str) -> Result<Vec<String>, LoweringError> {
    match body.get(field) {
        None => Ok(Vec::new()),
        Some(Value::List(items)) => Ok(items.clone()),
        Some(other) => Err(mismatch(field, "an array", other)),
    }
}

fn object(
    body: &IndexMap<String, Value>,
    field: &str,
) -> Result<Option<IndexMap<String, Value>>, LoweringError> {
    match body.get(field) {
        None => Ok(None),
        Some(Value::Map(map)) => Ok(Some(map.clone())),
        Some(other) => Err(mismatch(field, "an object", other)),
    }
}

/// Validate an IR against the default complexity threshold.
pub fn validate_ir(ir: &IntentIR) -> Vec<ValidationError> {
    validate_ir_with(ir, DEFAULT_MAX_COMPLEXITY)
}

/// Validate an IR. Returns a list of errors (empty = valid). Advisory only.
pub fn validate_ir_with(ir: &IntentIR, max_complexity: u32) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if ir.name.trim().is_empty() {
        errors.push(ValidationError::new("intent name must not be empty"));
    }

    if ir.goal.as_deref().is_none_or(|g| g.trim().is_empty()) {
        errors.push(ValidationError::new("intent goal must not be empty"));
    }

    if ir.capabilities.is_empty() {
        errors.push(ValidationError::new(
            "intent must declare at least one capability",
        ));
    }

    let mut seen = HashSet::new();
    for cap in &ir.capabilities {
        if !seen.insert(cap.to_lowercase()) {
            errors.push(ValidationError::new(format!(
                "duplicate capability '{}'",
                cap
            )));
        }
    }

    if ir.metadata.complexity_score > max_complexity {
        errors.push(ValidationError::new(format!(
            "intent too complex (score {} exceeds {}), consider decomposing",
            ir.metadata.complexity_score, max_complexity
        )));
    }

    errors
}
