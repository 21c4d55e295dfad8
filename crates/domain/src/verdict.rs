// Rust guideline compliant 2026-08-01

//! Tool calls, tool results, and the reasoner's final verdict (§3, §4.5, §4.6).

use serde_json::{Map, Value, json};

/// A tool invocation planned by the LLM (or the deterministic fallback plan).
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub tool: String,
    pub args: Map<String, Value>,
    pub rationale: String,
}

/// Uniform result shape returned by every tool (§4.6).
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool: String,
    pub success: bool,
    pub query: Option<Value>,
    pub summary: String,
    pub data: Map<String, Value>,
    pub error: Option<String>,
}

impl ToolResult {
    #[must_use]
    pub fn ok(tool: impl Into<String>, query: Option<Value>, summary: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            success: true,
            query,
            summary: summary.into(),
            data,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(tool: impl Into<String>, query: Option<Value>, summary: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            success: false,
            query,
            summary: summary.into(),
            data: Map::new(),
            error: Some(error.into()),
        }
    }

    /// Compact representation fed back to the LLM and stored in the tool trace.
    #[must_use]
    pub fn compact(&self) -> Value {
        json!({
            "tool": self.tool,
            "success": self.success,
            "query": self.query,
            "summary": self.summary,
            "error": self.error,
            "data": Value::Object(self.data.clone()),
        })
    }
}

/// The final classification of Module 3's investigation (§3 `InvestigationVerdict`).
#[derive(Debug, Clone, PartialEq)]
pub struct InvestigationVerdict {
    pub verdict: String,
    pub severity: String,
    pub confidence: f64,
    pub reasoning_summary: String,
    pub evidence: Vec<Value>,
    pub tool_trace: Vec<Value>,
    pub recommended_action: String,
    pub started_at: String,
    pub finished_at: String,
    pub duration_ms: i64,
}

impl InvestigationVerdict {
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "verdict": self.verdict,
            "severity": self.severity,
            "confidence": (self.confidence * 10_000.0).round() / 10_000.0,
            "reasoning_summary": self.reasoning_summary,
            "evidence": self.evidence,
            "tool_trace": self.tool_trace,
            "recommended_action": self.recommended_action,
            "timestamps": {
                "started_at": self.started_at,
                "finished_at": self.finished_at,
                "duration_ms": self.duration_ms,
            },
        })
    }
}

pub const VERDICTS: &[&str] = &["MALICIOUS", "BENIGN", "SUSPICIOUS", "INCONCLUSIVE"];
pub const SEVERITIES: &[&str] = &["LOW", "MEDIUM", "HIGH", "CRITICAL"];
