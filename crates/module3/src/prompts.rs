//! The four prompt templates driving the reasoning loop, with hardcoded
//! fallback text for any file the deployment doesn't override
//! (`PromptLoader`/`PromptBundle` in the Python original).

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a security operations analyst investigating a pre-aggregated \
alert. Use the available tools to gather evidence before forming a \
conclusion. Be precise, cite the evidence you gathered, and never invent \
facts the tools did not return.";

pub const DEFAULT_PLANNING_PROMPT: &str = "Given the alert below and the tool catalog, decide which tools to call \
to investigate it. Respond with JSON only, shaped as: \
{\"tool_calls\":[{\"tool\":\"tool_name\",\"args\":{},\"rationale\":\"...\"}]}";

pub const DEFAULT_TOOL_SUMMARY_PROMPT: &str = "Summarize what this tool result tells you about the alert. Respond with \
JSON only, shaped as: {\"summary\":\"...\",\"signals\":[{\"type\":\"...\",\
\"value\":\"...\",\"confidence\":0.0}]}";

pub const DEFAULT_FINAL_PROMPT: &str = "Given the alert and everything gathered from tools, issue a final \
verdict. Respond with JSON only, shaped as: {\"verdict\":\"MALICIOUS|BENIGN|\
SUSPICIOUS|INCONCLUSIVE\",\"severity\":\"LOW|MEDIUM|HIGH|CRITICAL\",\
\"confidence\":0.0,\"reasoning_summary\":\"...\",\"evidence\":[...],\
\"recommended_action\":\"...\"}";

/// The four prompts driving a single investigation: system framing, tool
/// planning, per-tool-result summarization, and final reasoning.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptBundle {
    pub system_prompt: String,
    pub planning_prompt: String,
    pub tool_summary_prompt: String,
    pub final_prompt: String,
}

impl Default for PromptBundle {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            planning_prompt: DEFAULT_PLANNING_PROMPT.to_owned(),
            tool_summary_prompt: DEFAULT_TOOL_SUMMARY_PROMPT.to_owned(),
            final_prompt: DEFAULT_FINAL_PROMPT.to_owned(),
        }
    }
}

impl PromptBundle {
    /// Build a bundle from already-loaded text, falling back to the
    /// documented defaults for any prompt the caller passes as `None`
    /// (e.g. because the deployment has no override file for it). Reading
    /// override files from disk is the `socrates` binary's concern; this
    /// crate owns only the bundle shape and the default text.
    #[must_use]
    pub fn with_overrides(
        system_prompt: Option<String>,
        planning_prompt: Option<String>,
        tool_summary_prompt: Option<String>,
        final_prompt: Option<String>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            system_prompt: system_prompt.unwrap_or(defaults.system_prompt),
            planning_prompt: planning_prompt.unwrap_or(defaults.planning_prompt),
            tool_summary_prompt: tool_summary_prompt.unwrap_or(defaults.tool_summary_prompt),
            final_prompt: final_prompt.unwrap_or(defaults.final_prompt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bundle_uses_documented_text() {
        let bundle = PromptBundle::default();
        assert_eq!(bundle.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(bundle.final_prompt, DEFAULT_FINAL_PROMPT);
    }

    #[test]
    fn override_replaces_only_the_given_prompt() {
        let bundle = PromptBundle::with_overrides(Some("custom system".to_owned()), None, None, None);
        assert_eq!(bundle.system_prompt, "custom system");
        assert_eq!(bundle.planning_prompt, DEFAULT_PLANNING_PROMPT);
    }
}
