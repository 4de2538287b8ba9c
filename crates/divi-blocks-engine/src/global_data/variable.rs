use std::collections::HashSet;

use log::trace;
use serde_json::Value;

use super::{GlobalData, css_var_id};
use crate::parsing::preprocess::parse_variable;

impl GlobalData {
    /// Resolve a global variable reference to its stored value.
    ///
    /// Accepts `var(--gvid-*)` and `$variable({"type":"content",...})$`
    /// naming a `gvid-*` id. Anything else, and unknown ids, come back as
    /// given.
    pub fn resolve_variable(&self, input: &str) -> String {
        let mut processed = HashSet::new();
        self.variable_value(input, 0, &mut processed)
    }

    fn variable_value(&self, input: &str, depth: usize, processed: &mut HashSet<String>) -> String {
        let Some(id) = variable_id(input) else {
            return input.to_string();
        };
        if depth >= self.max_depth || !processed.insert(id.clone()) {
            trace!("Stopping variable resolution at {id}");
            return input.to_string();
        }

        match self.variables.get(&id).map(|variable| &variable.value) {
            Some(Value::String(value)) => self.variable_value(value, depth + 1, processed),
            Some(Value::Null) | None => input.to_string(),
            Some(other) => other.to_string(),
        }
    }
}

fn variable_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if let Some(payload) = trimmed
        .strip_prefix("$variable(")
        .and_then(|rest| rest.strip_suffix(")$"))
    {
        let variable = parse_variable(payload)?;
        return (variable.kind == "content" && variable.value.name.starts_with("gvid-"))
            .then_some(variable.value.name);
    }
    css_var_id(trimmed)
        .filter(|id| id.starts_with("gvid-"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn resolves_both_reference_forms() {
        let data = GlobalData::default().with_variable("gvid-gap", json!("24px"));
        assert_eq!(data.resolve_variable("var(--gvid-gap)"), "24px");
        assert_eq!(
            data.resolve_variable(r#"$variable({"type":"content","value":{"name":"gvid-gap"}})$"#),
            "24px"
        );
    }

    #[test]
    fn follows_chains_and_numbers() {
        let data = GlobalData::default()
            .with_variable("gvid-a", json!("var(--gvid-b)"))
            .with_variable("gvid-b", json!(12));
        assert_eq!(data.resolve_variable("var(--gvid-a)"), "12");
    }

    #[test]
    fn unknown_and_cyclic_references_stop() {
        let data = GlobalData::default()
            .with_variable("gvid-a", json!("var(--gvid-b)"))
            .with_variable("gvid-b", json!("var(--gvid-a)"));
        assert_eq!(data.resolve_variable("var(--gvid-a)"), "var(--gvid-a)");
        assert_eq!(data.resolve_variable("var(--gvid-zz)"), "var(--gvid-zz)");
        assert_eq!(data.resolve_variable("12px"), "12px");
    }
}
