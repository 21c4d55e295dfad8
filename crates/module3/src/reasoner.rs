//! Drives one investigation end to end: plan which tools to call, run them,
//! summarize each result, then reach a final verdict (`InvestigationReasoner`
//! in the Python original).

use std::collections::HashSet;
use std::time::Instant;

use chrono::Utc;
use serde_json::{Map, Value, json};

use domain::{AlertEnvelope, ExternalTools, InternalTools, InvestigationVerdict, LlmClient, SEVERITIES, ToolCall, ToolResult, VERDICTS};

use crate::config::Module3Config;
use crate::orchestrator::RetrievalOrchestrator;
use crate::prompts::PromptBundle;
use crate::tool_registry::{build_tool_specs, tool_specs_json};

const BRIEF_FIELDS: &[&str] =
    &["sip", "dip", "proto", "rule_name", "log_type", "uri_template", "reference_uuids", "risk_scores", "module2_business_match"];

/// Project an alert envelope down to the whitelisted fields shown to the LLM
/// (`InvestigationAlert.brief` in the Python original). Keys absent from the
/// envelope are omitted rather than included as `null`.
#[must_use]
pub fn alert_brief(envelope: &AlertEnvelope) -> Value {
    let mut brief = Map::new();
    for field in BRIEF_FIELDS {
        if let Some(value) = envelope.get(field) {
            brief.insert((*field).to_owned(), value.clone());
        }
    }
    Value::Object(brief)
}

/// Runs the plan/execute/summarize/conclude loop for a single alert.
#[derive(Debug, Clone)]
pub struct InvestigationReasoner {
    config: Module3Config,
    prompts: PromptBundle,
    allowed_tool_names: HashSet<String>,
}

impl InvestigationReasoner {
    #[must_use]
    pub fn new(config: Module3Config, prompts: PromptBundle) -> Self {
        let allowed_tool_names = build_tool_specs().into_iter().map(|spec| spec.name).collect();
        Self { config, prompts, allowed_tool_names }
    }

    /// Investigate one alert, producing a final verdict and its tool trace.
    pub async fn investigate<L, I, E>(&self, llm: &L, internal: &I, external: &E, alert: &AlertEnvelope) -> InvestigationVerdict
    where
        L: LlmClient,
        I: InternalTools,
        E: ExternalTools,
    {
        let started_at = Utc::now();
        let clock = Instant::now();
        let brief = alert_brief(alert);

        let mut plan = self.plan_tool_calls(llm, &brief).await;
        if plan.is_empty() {
            plan = fallback_tool_calls(alert);
        }

        let orchestrator = RetrievalOrchestrator::new(self.config.tool_result_max_items);
        let mut tool_results = Vec::with_capacity(plan.len());
        for call in plan.iter().take(self.config.max_tool_iterations) {
            let mut result = orchestrator.execute(internal, external, call).await;
            self.summarize_tool_result(llm, &brief, &mut result).await;
            tool_results.push(result);
        }

        let final_response = self.final_reasoning(llm, &brief, &tool_results).await;
        let (verdict, severity, confidence, reasoning_summary, evidence, recommended_action) = normalize_verdict(&final_response);

        let finished_at = Utc::now();
        InvestigationVerdict {
            verdict,
            severity,
            confidence,
            reasoning_summary,
            evidence,
            tool_trace: tool_results.iter().map(ToolResult::compact).collect(),
            recommended_action,
            started_at: started_at.to_rfc3339(),
            finished_at: finished_at.to_rfc3339(),
            #[expect(clippy::cast_possible_wrap, reason = "an investigation never runs anywhere near i64::MAX milliseconds")]
            duration_ms: clock.elapsed().as_millis() as i64,
        }
    }

    async fn plan_tool_calls<L: LlmClient>(&self, llm: &L, brief: &Value) -> Vec<ToolCall> {
        let prompt = format!(
            "{}\n\n{}\n\nAlert:\n{}\n\nAvailable tools:\n{}",
            self.prompts.system_prompt,
            self.prompts.planning_prompt,
            brief,
            tool_specs_json()
        );
        let response = llm.generate_json(&prompt, json!({"tool_calls": []})).await;

        let Some(raw_calls) = response.get("tool_calls").and_then(Value::as_array) else { return Vec::new() };
        raw_calls
            .iter()
            .filter_map(|raw| {
                let tool = raw.get("tool")?.as_str()?;
                if !self.allowed_tool_names.contains(tool) {
                    return None;
                }
                let args = raw.get("args").and_then(Value::as_object).cloned().unwrap_or_default();
                let rationale = raw.get("rationale").and_then(Value::as_str).unwrap_or_default().to_owned();
                Some(ToolCall { tool: tool.to_owned(), args, rationale })
            })
            .collect()
    }

    async fn summarize_tool_result<L: LlmClient>(&self, llm: &L, brief: &Value, result: &mut ToolResult) {
        let prompt =
            format!("{}\n\n{}\n\nAlert:\n{}\n\nTool result:\n{}", self.prompts.system_prompt, self.prompts.tool_summary_prompt, brief, result.compact());
        let fallback = json!({"summary": result.summary, "signals": []});
        let response = llm.generate_json(&prompt, fallback).await;

        if let Some(summary) = response.get("summary").and_then(Value::as_str) {
            if !summary.trim().is_empty() {
                result.summary = summary.to_owned();
            }
        }
        if let Some(signals) = response.get("signals").and_then(Value::as_array) {
            let capped: Vec<Value> = signals.iter().take(20).cloned().collect();
            result.data.insert("signals".to_owned(), Value::Array(capped));
        }
    }

    async fn final_reasoning<L: LlmClient>(&self, llm: &L, brief: &Value, tool_results: &[ToolResult]) -> Value {
        let compacted: Vec<Value> = tool_results.iter().map(ToolResult::compact).collect();
        let prompt = format!(
            "{}\n\n{}\n\nAlert:\n{}\n\nTool results:\n{}",
            self.prompts.system_prompt,
            self.prompts.final_prompt,
            brief,
            Value::Array(compacted)
        );
        let fallback = json!({
            "verdict": "INCONCLUSIVE",
            "severity": "MEDIUM",
            "confidence": 0.4,
            "reasoning_summary": "Insufficient evidence for a definitive decision.",
            "evidence": [],
            "recommended_action": "manual_review",
        });
        llm.generate_json(&prompt, fallback).await
    }
}

/// The deterministic plan used whenever the LLM's plan is empty or
/// unparseable (`_fallback_tool_calls` in the Python original).
fn fallback_tool_calls(alert: &AlertEnvelope) -> Vec<ToolCall> {
    let sip = alert.get("sip").and_then(Value::as_str).filter(|s| !s.is_empty());
    let dip = alert.get("dip").and_then(Value::as_str).filter(|s| !s.is_empty());
    let rule_name = alert.get("rule_name").and_then(Value::as_str).unwrap_or_default();

    let mut calls = Vec::new();
    if let Some(dip) = dip {
        let mut args = Map::new();
        args.insert("ip".to_owned(), Value::String(dip.to_owned()));
        calls.push(ToolCall { tool: "get_cmdb_asset".to_owned(), args, rationale: "fallback plan".to_owned() });
    }
    if let Some(sip) = sip {
        let mut args = Map::new();
        args.insert("ip".to_owned(), Value::String(sip.to_owned()));
        calls.push(ToolCall { tool: "virustotal_ip_reputation".to_owned(), args, rationale: "fallback plan".to_owned() });
    }

    let query = if rule_name.is_empty() {
        json!({"match_all": {}})
    } else {
        json!({"bool": {"must": [{"match": {"rule_name": rule_name}}]}})
    };
    let mut waf_args = Map::new();
    waf_args.insert("query".to_owned(), query);
    waf_args.insert("size".to_owned(), json!(30));
    calls.push(ToolCall { tool: "search_waf_logs".to_owned(), args: waf_args, rationale: "fallback plan".to_owned() });

    if rule_name.to_uppercase().contains("CVE-") {
        let mut args = Map::new();
        args.insert("query".to_owned(), Value::String(rule_name.to_owned()));
        calls.push(ToolCall { tool: "cve_search".to_owned(), args, rationale: "fallback plan".to_owned() });
    }

    calls
}

/// Coerce the LLM's final-reasoning response into well-formed verdict
/// fields, falling back to documented defaults for anything missing or out
/// of range (`_normalize_verdict` in the Python original).
fn normalize_verdict(value: &Value) -> (String, String, f64, String, Vec<Value>, String) {
    let verdict = value
        .get("verdict")
        .and_then(Value::as_str)
        .map(str::to_uppercase)
        .filter(|v| VERDICTS.contains(&v.as_str()))
        .unwrap_or_else(|| "INCONCLUSIVE".to_owned());

    let severity = value
        .get("severity")
        .and_then(Value::as_str)
        .map(str::to_uppercase)
        .filter(|s| SEVERITIES.contains(&s.as_str()))
        .unwrap_or_else(|| "MEDIUM".to_owned());

    let confidence = value.get("confidence").and_then(Value::as_f64).map_or(0.4, |c| c.clamp(0.0, 1.0));

    let evidence = value.get("evidence").and_then(Value::as_array).map(|items| items.iter().take(20).cloned().collect()).unwrap_or_default();

    let reasoning_summary = value
        .get("reasoning_summary")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| "No reasoning summary provided.".to_owned());

    let recommended_action = value
        .get("recommended_action")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| "manual_review".to_owned());

    (verdict, severity, confidence, reasoning_summary, evidence, recommended_action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn alert_with(sip: Option<&str>, dip: Option<&str>, rule_name: &str) -> AlertEnvelope {
        let mut map = Map::new();
        if let Some(sip) = sip {
            map.insert("sip".to_owned(), Value::String(sip.to_owned()));
        }
        if let Some(dip) = dip {
            map.insert("dip".to_owned(), Value::String(dip.to_owned()));
        }
        map.insert("rule_name".to_owned(), Value::String(rule_name.to_owned()));
        AlertEnvelope::new(map)
    }

    #[test]
    fn brief_omits_absent_keys() {
        let envelope = alert_with(Some("1.1.1.1"), None, "SQLi");
        let brief = alert_brief(&envelope);
        assert_eq!(brief["sip"], "1.1.1.1");
        assert!(brief.get("dip").is_none());
        assert!(brief.get("module2_business_match").is_none());
    }

    #[test]
    fn fallback_plan_includes_cve_lookup_only_when_rule_names_a_cve() {
        let with_cve = alert_with(Some("1.1.1.1"), Some("10.0.0.1"), "Apache Struts CVE-2017-5638");
        let calls = fallback_tool_calls(&with_cve);
        assert!(calls.iter().any(|c| c.tool == "cve_search"));

        let without_cve = alert_with(Some("1.1.1.1"), Some("10.0.0.1"), "Generic SQLi");
        let calls = fallback_tool_calls(&without_cve);
        assert!(!calls.iter().any(|c| c.tool == "cve_search"));
    }

    #[test]
    fn fallback_plan_always_searches_waf_logs() {
        let alert = alert_with(None, None, "");
        let calls = fallback_tool_calls(&alert);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool, "search_waf_logs");
    }

    #[test]
    fn normalize_verdict_falls_back_on_unknown_values() {
        let (verdict, severity, confidence, _, _, _) = normalize_verdict(&json!({"verdict": "UNKNOWN", "severity": "CATASTROPHIC", "confidence": 5.0}));
        assert_eq!(verdict, "INCONCLUSIVE");
        assert_eq!(severity, "MEDIUM");
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn normalize_verdict_accepts_well_formed_input() {
        let (verdict, severity, confidence, summary, evidence, action) = normalize_verdict(&json!({
            "verdict": "malicious",
            "severity": "high",
            "confidence": 0.83,
            "reasoning_summary": "clear SQLi pattern",
            "evidence": ["row 1", "row 2"],
            "recommended_action": "block_source_ip",
        }));
        assert_eq!(verdict, "MALICIOUS");
        assert_eq!(severity, "HIGH");
        assert_eq!(confidence, 0.83);
        assert_eq!(summary, "clear SQLi pattern");
        assert_eq!(evidence.len(), 2);
        assert_eq!(action, "block_source_ip");
    }

    #[test]
    fn normalize_verdict_defaults_missing_reasoning_summary_distinctly_from_parse_failure() {
        let (_, _, _, summary, _, _) = normalize_verdict(&json!({"verdict": "MALICIOUS"}));
        assert_eq!(summary, "No reasoning summary provided.");
    }

    struct ScriptedLlm(RefCell<Vec<Value>>);
    impl LlmClient for ScriptedLlm {
        async fn generate_text(&self, _prompt: &str) -> String {
            String::new()
        }

        async fn generate_json(&self, _prompt: &str, fallback: Value) -> Value {
            let mut queue = self.0.borrow_mut();
            if queue.is_empty() { fallback } else { queue.remove(0) }
        }
    }

    struct NoOpInternal;
    impl InternalTools for NoOpInternal {
        async fn search_logs(&self, tool: &str, query: Value, _size: Option<u32>) -> ToolResult {
            ToolResult::ok(tool, Some(query), "no rows", Map::new())
        }

        async fn get_cmdb_asset(&self, _ip: &str) -> ToolResult {
            ToolResult::ok("get_cmdb_asset", None, "no asset", Map::new())
        }
    }

    struct NoOpExternal;
    impl ExternalTools for NoOpExternal {
        async fn virustotal_ip_reputation(&self, _ip: &str) -> ToolResult {
            ToolResult::ok("virustotal_ip_reputation", None, "clean", Map::new())
        }

        async fn cve_search(&self, _query: &str) -> ToolResult {
            ToolResult::ok("cve_search", None, "no match", Map::new())
        }
    }

    #[tokio::test]
    async fn investigate_falls_back_to_deterministic_plan_when_llm_plans_nothing() {
        let reasoner = InvestigationReasoner::new(Module3Config::builder().build().unwrap(), PromptBundle::default());
        let llm = ScriptedLlm(RefCell::new(vec![
            json!({"tool_calls": []}),
            json!({
                "verdict": "SUSPICIOUS",
                "severity": "MEDIUM",
                "confidence": 0.6,
                "reasoning_summary": "waf logs show repeated probing",
                "evidence": [],
                "recommended_action": "monitor",
            }),
        ]));
        let alert = alert_with(Some("1.1.1.1"), Some("10.0.0.1"), "Generic Probe");

        let verdict = reasoner.investigate(&llm, &NoOpInternal, &NoOpExternal, &alert).await;
        assert_eq!(verdict.verdict, "SUSPICIOUS");
        assert!(!verdict.tool_trace.is_empty());
    }
}
