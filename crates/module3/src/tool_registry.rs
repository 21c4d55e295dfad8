//! The fixed catalog of tools the planning prompt is allowed to call
//! (`build_tool_specs` in the Python original).

use serde_json::{Value, json};

use domain::INTERNAL_QUERY_TOOLS;

/// One entry in the tool catalog handed to the LLM's planning prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub args_schema: Value,
}

impl ToolSpec {
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "tool": self.name,
            "description": self.description,
            "args_schema": self.args_schema,
        })
    }
}

fn query_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": {"type": "object"},
            "size": {"type": "integer", "minimum": 1, "maximum": 200},
        },
        "required": ["query"],
    })
}

/// The names of every tool in [`build_tool_specs`], used to validate the
/// LLM's planned calls before they reach the orchestrator.
#[must_use]
pub fn build_tool_specs() -> Vec<ToolSpec> {
    let mut specs: Vec<ToolSpec> = INTERNAL_QUERY_TOOLS
        .iter()
        .map(|name| ToolSpec {
            name: (*name).to_owned(),
            description: format!("Run an Elasticsearch query against the {name} index and return matching rows."),
            args_schema: query_schema(),
        })
        .collect();

    specs.push(ToolSpec {
        name: "get_cmdb_asset".to_owned(),
        description: "Look up asset ownership and criticality metadata for an IP in the CMDB.".to_owned(),
        args_schema: json!({
            "type": "object",
            "properties": {"ip": {"type": "string"}},
            "required": ["ip"],
        }),
    });

    specs.push(ToolSpec {
        name: "virustotal_ip_reputation".to_owned(),
        description: "Look up VirusTotal's reputation report for an IP address.".to_owned(),
        args_schema: json!({
            "type": "object",
            "properties": {"ip": {"type": "string"}},
            "required": ["ip"],
        }),
    });

    specs.push(ToolSpec {
        name: "cve_search".to_owned(),
        description: "Search public CVE records for a rule name or keyword.".to_owned(),
        args_schema: json!({
            "type": "object",
            "properties": {"query": {"type": "string"}},
            "required": ["query"],
        }),
    });

    specs
}

/// Serialize the catalog for the planning prompt, in registry order.
#[must_use]
pub fn tool_specs_json() -> Value {
    Value::Array(build_tool_specs().iter().map(ToolSpec::to_json).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_the_eight_documented_tools() {
        let specs = build_tool_specs();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "search_waf_logs",
                "search_tianyan_alarm_logs",
                "search_zhongzi_logs",
                "search_nginx_logs",
                "search_huorong_logs",
                "get_cmdb_asset",
                "virustotal_ip_reputation",
                "cve_search",
            ]
        );
    }

    #[test]
    fn query_tools_share_one_schema_shape() {
        let specs = build_tool_specs();
        let waf = &specs[0];
        let nginx = &specs[3];
        assert_eq!(waf.args_schema, nginx.args_schema);
    }
}
