//! Dispatches a planned [`ToolCall`] to the right port and applies a
//! uniform row-count cap to whatever comes back (`RetrievalOrchestrator` in
//! the Python original).

use serde_json::{Value, json};

use domain::{ExternalTools, INTERNAL_QUERY_TOOLS, InternalTools, ToolCall, ToolResult};

/// Validates and dispatches tool calls against the internal/external tool
/// ports, trimming oversized row sets before they reach the LLM.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalOrchestrator {
    tool_result_max_items: usize,
}

impl RetrievalOrchestrator {
    #[must_use]
    pub fn new(tool_result_max_items: usize) -> Self {
        Self { tool_result_max_items }
    }

    /// Execute one planned tool call.
    pub async fn execute<I, E>(&self, internal: &I, external: &E, call: &ToolCall) -> ToolResult
    where
        I: InternalTools,
        E: ExternalTools,
    {
        let mut result = if INTERNAL_QUERY_TOOLS.contains(&call.tool.as_str()) {
            let query = call.args.get("query").cloned().unwrap_or_else(|| json!({"match_all": {}}));
            let size = call.args.get("size").and_then(Value::as_u64).map(|n| n as u32);
            internal.search_logs(&call.tool, query, size).await
        } else if call.tool == "get_cmdb_asset" {
            match required_str(call, "ip") {
                Some(ip) => internal.get_cmdb_asset(&ip).await,
                None => ToolResult::failed(&call.tool, None, "", "missing_ip"),
            }
        } else if call.tool == "virustotal_ip_reputation" {
            match required_str(call, "ip") {
                Some(ip) => external.virustotal_ip_reputation(&ip).await,
                None => ToolResult::failed(&call.tool, None, "", "missing_ip"),
            }
        } else if call.tool == "cve_search" {
            match required_str(call, "query") {
                Some(query) => external.cve_search(&query).await,
                None => ToolResult::failed(&call.tool, None, "", "missing_query"),
            }
        } else {
            ToolResult::failed(&call.tool, None, "", "unknown_tool")
        };

        self.trim_rows(&mut result);
        result
    }

    /// Cap `result.data["rows"]` at `tool_result_max_items`, recording how
    /// many rows were dropped (`_trim_rows` in the Python original).
    fn trim_rows(&self, result: &mut ToolResult) {
        let Some(Value::Array(rows)) = result.data.get("rows") else { return };
        if rows.len() <= self.tool_result_max_items {
            return;
        }
        let original_len = rows.len();
        let trimmed: Vec<Value> = rows[..self.tool_result_max_items].to_vec();
        result.data.insert("rows".to_owned(), Value::Array(trimmed));
        result.data.insert("trimmed".to_owned(), Value::Bool(true));
        result.data.insert("trimmed_from".to_owned(), json!(original_len));
    }
}

fn required_str(call: &ToolCall, key: &str) -> Option<String> {
    let s = call.args.get(key)?.as_str()?.trim();
    if s.is_empty() { None } else { Some(s.to_owned()) }
}
