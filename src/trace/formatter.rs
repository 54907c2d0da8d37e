use crate::runtime::{RunResult, RunStatus, StepOutcome};
use crate::workflow::Value;
use std::fmt::Write;

/// Formats run results into human-readable reports
pub struct TraceFormatter;

impl TraceFormatter {
    /// Format a whole run: status line, one line per attempted step, then the
    /// collected outputs.
    pub fn format_run(result: &RunResult) -> String {
        let mut out = String::new();
        let status = match result.status {
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "FAILED",
        };
        let _ = writeln!(
            out,
            "Run {} ({} step(s), {} ms)",
            status,
            result.log.len(),
            result.total_elapsed_ms
        );

        for entry in &result.log {
            let (mark, detail) = match &entry.outcome {
                StepOutcome::Completed(summary) => ("ok", summary.as_str()),
                StepOutcome::Failed(message) => ("!!", message.as_str()),
            };
            let _ = writeln!(
                out,
                "  [{}] {:>3}. {} ({}) {} ms: {}",
                mark,
                entry.index + 1,
                entry.node_id,
                entry.kind,
                entry.elapsed_ms,
                detail
            );
        }

        if let Some(failure) = &result.error {
            let _ = writeln!(
                out,
                "Stopped at '{}' ({}): {}",
                failure.node_id, failure.kind, failure.cause
            );
        }

        if !result.collected_output.is_empty() {
            out.push_str("Output:\n");
            for (node_id, value) in &result.collected_output {
                let _ = writeln!(out, "  {} => {}", node_id, Self::format_value(value));
            }
        }
        out
    }

    /// Format a value for display. Multi-line text is indented under its key.
    pub fn format_value(value: &Value) -> String {
        match value {
            Value::Text(s) if s.contains('\n') => {
                let mut block = String::from("|");
                for line in s.lines() {
                    block.push_str("\n      ");
                    block.push_str(line);
                }
                block
            }
            Value::Text(s) => format!("{:?}", s),
            Value::Null => "null".to_string(),
            other => other.to_string(),
        }
    }
}
