/// Tool catalog shown to Gemini on every turn.
///
/// The contract for these five tools is owned by the KCC MCP server; this
/// text only has to teach the model their names and argument shapes.
pub const TOOL_CATALOG: &str = r#"
Available KCC MCP Tools:

1. kcc_find_resource - Find resource files (types, controller, mapper)
   Example: {"resource": "EdgeCacheService"}

2. kcc_detect_controller_type - Check if resource is Terraform or direct
   Example: {"resource": "ComputeURLMap"}

3. kcc_migration_status - Get migration progress (7 phases)
   Example: {"resource": "ComputeURLMap"}

4. kcc_plan_migration - Create detailed migration plan
   Example: {"resource": "ComputeURLMap"}

5. kcc_git_status - Show git status
   Example: {}

Example prompts:
- "Check if ComputeURLMap needs migration"
- "Find the EdgeCacheService files"
- "What's the migration status for ComputeURLMap?"
"#;

/// Build the per-turn prompt. Deterministic: same catalog and utterance
/// always yield byte-identical output.
pub fn compose_prompt(catalog: &str, utterance: &str) -> String {
    format!(
        "{catalog}\n\nUser request: {utterance}\n\n\
         If this request needs a tool, respond ONLY with:\n\
         TOOL: <tool_name>\n\
         PARAMS: <json_params>\n\n\
         Otherwise, provide helpful guidance about what tool to use."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_all_five_tools() {
        for name in [
            "kcc_find_resource",
            "kcc_detect_controller_type",
            "kcc_migration_status",
            "kcc_plan_migration",
            "kcc_git_status",
        ] {
            assert!(TOOL_CATALOG.contains(name), "catalog missing {name}");
        }
    }

    #[test]
    fn prompt_embeds_utterance_and_reply_contract() {
        let p = compose_prompt(TOOL_CATALOG, "check git status");
        assert!(p.contains("User request: check git status"));
        assert!(p.contains("TOOL: <tool_name>"));
        assert!(p.contains("PARAMS: <json_params>"));
        assert!(p.starts_with(TOOL_CATALOG));
    }

    #[test]
    fn composition_is_deterministic() {
        let a = compose_prompt(TOOL_CATALOG, "plan a migration");
        let b = compose_prompt(TOOL_CATALOG, "plan a migration");
        assert_eq!(a, b);
    }
}
