//! Small pure helpers shared by the preset types.

use serde_json::Value;

/// Ids that mean "no explicit selection, use the default".
const DEFAULT_ALIASES: [&str; 3] = ["", "default", "_initial"];

/// Normalize a stored preset selection into a stack of ids.
///
/// A single string becomes a one element stack, default aliases and
/// non-string entries are dropped.
pub fn normalize_preset_stack(value: &Value) -> Vec<String> {
    match value {
        Value::String(id) if !is_default_alias(id) => vec![id.clone()],
        Value::Array(ids) => ids
            .iter()
            .filter_map(Value::as_str)
            .filter(|id| !is_default_alias(id))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Whether `id` selects the default preset whose id is `default_id`.
pub fn is_preset_id_as_default(id: &str, default_id: &str) -> bool {
    is_default_alias(id) || id == default_id
}

fn is_default_alias(id: &str) -> bool {
    DEFAULT_ALIASES.contains(&id)
}

/// Canonical group name for a `decoration`/`advanced` attribute key.
pub fn group_name_for(key: &str) -> Option<&'static str> {
    let name = match key {
        "animation" => "divi/animation",
        "background" => "divi/background",
        "bodyFont" => "divi/font-body",
        "border" => "divi/border",
        "boxShadow" => "divi/box-shadow",
        "button" => "divi/button",
        "conditions" => "divi/conditions",
        "disabledOn" => "divi/disabled-on",
        "dividers" => "divi/dividers",
        "filters" => "divi/filters",
        "font" => "divi/font",
        "headingFont" => "divi/font-header",
        "htmlAttributes" => "divi/id-classes",
        "layout" => "divi/layout",
        "link" => "divi/link",
        "order" => "divi/order",
        "overflow" => "divi/overflow",
        "position" => "divi/position",
        "scroll" => "divi/scroll",
        "sizing" => "divi/sizing",
        "spacing" => "divi/spacing",
        "sticky" => "divi/sticky",
        "text" => "divi/text",
        "textShadow" => "divi/text-shadow",
        "transform" => "divi/transform",
        "transition" => "divi/transition",
        "visibility" => "divi/visibility",
        "zIndex" => "divi/z-index",
        _ => return None,
    };
    Some(name)
}

/// `divi/text` becomes `divi-text`, for use in class names.
pub fn slug(name: &str) -> String {
    name.replace('/', "-")
}

/// Class name for a preset, with `default` standing in for the default id.
pub fn selector_class_name(kind: &str, name: &str, id: &str, default_id: &str) -> String {
    let id = if is_preset_id_as_default(id, default_id) {
        "default"
    } else {
        id
    };
    format!("preset--{kind}--{}--{id}", slug(name))
}
