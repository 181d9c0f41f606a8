//! Append-only audit log of planning decisions, with JSONL export.

use crate::core::types::{AuditEntry, AuditStage, ExecutionPlan};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Generate an ISO 8601 timestamp.
pub fn now_iso8601() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let dur = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format_iso8601(dur.as_secs(), dur.subsec_millis())
}

/// Format seconds since the epoch as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
fn format_iso8601(secs: u64, millis: u32) -> String {
    let (year, month, day) = civil_date(secs / 86_400);
    let time = secs % 86_400;
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year,
        month,
        day,
        time / 3600,
        time % 3600 / 60,
        time % 60,
        millis
    )
}

/// Proleptic Gregorian date for a day count since 1970-01-01, computed in
/// 400-year eras with March as the first month of the internal year.
fn civil_date(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z % 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);
    (year, month, day)
}

/// Ordered decision records for one planning run.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry stamped with the current time.
    pub fn record(
        &mut self,
        stage: AuditStage,
        decision: impl Into<String>,
        reasoning: impl Into<String>,
        alternatives: Vec<String>,
    ) {
        self.push(AuditEntry {
            timestamp: now_iso8601(),
            stage,
            decision: decision.into(),
            reasoning: reasoning.into(),
            alternatives,
        });
    }

    /// Append a pre-built entry.
    pub fn push(&mut self, entry: AuditEntry) {
        tracing::debug!(
            stage = %entry.stage,
            decision = %entry.decision,
            "audit"
        );
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<AuditEntry> {
        self.entries
    }
}

/// Render entries for a terminal.
pub fn render(entries: &[AuditEntry]) -> String {
    let mut out = String::new();
    for e in entries {
        out.push_str(&format!("[{}] {}: {}\n", e.timestamp, e.stage, e.decision));
        out.push_str(&format!("    {}\n", e.reasoning));
        if !e.alternatives.is_empty() {
            out.push_str(&format!("    alternatives: {}\n", e.alternatives.join(", ")));
        }
    }
    out
}

#[derive(Serialize)]
struct AuditRecord<'a> {
    plan_id: &'a str,
    intent_id: &'a str,
    #[serde(flatten)]
    entry: &'a AuditEntry,
}

/// Append a plan's audit entries to a JSONL file, one entry per line.
pub fn append_audit_log(path: &Path, plan: &ExecutionPlan) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
        }
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("cannot open audit log {}: {}", path.display(), e))?;

    for entry in &plan.audit_log {
        let record = AuditRecord {
            plan_id: &plan.id,
            intent_id: &plan.intent_id,
            entry,
        };
        let json =
            serde_json::to_string(&record).map_err(|e| format!("JSON serialize error: {}", e))?;
        writeln!(file, "{}", json).map_err(|e| format!("write error: {}", e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_now_iso8601() {
        let ts = now_iso8601();
        assert!(ts.starts_with("20"));
        assert!(ts.ends_with('Z'));
        assert!(ts.contains('T'));
    }

    #[test]
    fn test_audit_format_known_dates() {
        assert_eq!(format_iso8601(0, 0), "1970-01-01T00:00:00.000Z");
        // 2000-02-29 12:34:56 UTC
        assert_eq!(format_iso8601(951_827_696, 7), "2000-02-29T12:34:56.007Z");
        // 2024-12-31 23:59:59 UTC
        assert_eq!(format_iso8601(1_735_689_599, 999), "2024-12-31T23:59:59.999Z");
    }

    #[test]
    fn test_audit_civil_date_century_rules() {
        // 2100 is not a leap year, 2000 is
        assert_eq!(format_iso8601(4_107_542_400, 0), "2100-03-01T00:00:00.000Z");
        assert_eq!(format_iso8601(946_684_799, 0), "1999-12-31T23:59:59.000Z");
        assert_eq!(civil_date(0), (1970, 1, 1));
        assert_eq!(civil_date(59), (1970, 3, 1));
    }

    #[test]
    fn test_audit_log_preserves_order() {
        let mut log = AuditLog::new();
        assert!(log.is_empty());
        log.record(AuditStage::StrategySelection, "crud_generation", "r", vec![]);
        log.record(AuditStage::StepGeneration, "5 steps", "t", vec![]);
        log.record(AuditStage::PlanComplete, "done", "d", vec![]);
        let stages: Vec<AuditStage> = log.entries().iter().map(|e| e.stage).collect();
        assert_eq!(
            stages,
            vec![
                AuditStage::StrategySelection,
                AuditStage::StepGeneration,
                AuditStage::PlanComplete
            ]
        );
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_audit_render() {
        let mut log = AuditLog::new();
        log.record(
            AuditStage::StrategySelection,
            "crud_generation",
            "rule 'crud_detection' matched",
            vec!["ml_workflow".to_string()],
        );
        let text = render(log.entries());
        assert!(text.contains("strategy_selection: crud_generation"));
        assert!(text.contains("alternatives: ml_workflow"));
    }

    #[test]
    fn test_audit_append_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit").join("plans.jsonl");
        let plan = crate::create_plan(&crate::parse_intent("intent x { goal: \"g\" }").unwrap())
            .unwrap();

        append_audit_log(&path, &plan).unwrap();
        append_audit_log(&path, &plan).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), plan.audit_log.len() * 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["plan_id"], plan.id.as_str());
        assert_eq!(first["stage"], "strategy_selection");
    }
}
