//! Dot-path access and deep merging over attribute trees.
//!
//! Block attributes are plain [`serde_json::Value`] trees. A path such as
//! `"title.decoration.font"` walks object keys; a missing intermediate key
//! means the path is absent, never a zero value.

use serde_json::{Map, Value};

/// Look up `path` in `value`. An empty path returns `value` itself.
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))
}

pub fn has_path(value: &Value, path: &str) -> bool {
    get_path(value, path).is_some()
}

/// Set `path` in `value`, creating intermediate objects as needed.
///
/// Non-object values found on the way are replaced by objects.
pub fn set_path(value: &mut Value, path: &str, new_value: Value) {
    if path.is_empty() {
        *value = new_value;
        return;
    }

    let mut current = value;
    let mut keys = path.split('.').peekable();
    while let Some(key) = keys.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            unreachable!("replaced with an object above");
        };
        if keys.peek().is_none() {
            map.insert(key.to_string(), new_value);
            return;
        }
        current = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Remove `path` from `value`, returning the removed subtree.
pub fn remove_path(value: &mut Value, path: &str) -> Option<Value> {
    let (parent, key) = match path.rsplit_once('.') {
        Some((parent, key)) => (parent, key),
        None => ("", path),
    };
    let mut current = value;
    if !parent.is_empty() {
        for segment in parent.split('.') {
            current = current.as_object_mut()?.get_mut(segment)?;
        }
    }
    current.as_object_mut()?.shift_remove(key)
}

/// Deep-merge `overlay` onto `base`.
///
/// Objects merge key by key at every level; any other overlay value replaces
/// the base value outright. Neither input is modified.
pub fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, overlay_value) in overlay_map {
                let value = match base_map.get(key) {
                    Some(base_value) => merge(base_value, overlay_value),
                    None => overlay_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }
        // Null overlays (missing attrs on a preset record) leave the base alone.
        (_, Value::Null) => base.clone(),
        _ => overlay.clone(),
    }
}

/// Merge every value in order; later values win.
pub fn merge_all<'a>(values: impl IntoIterator<Item = &'a Value>) -> Value {
    values
        .into_iter()
        .fold(Value::Object(Map::new()), |acc, value| merge(&acc, value))
}

/// `true` for null, empty objects and empty arrays.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Collect `(path, subtree)` pairs at exactly `depth` object levels.
///
/// Leaves that end before `depth` are returned at their own path.
pub fn collect_paths(value: &Value, depth: usize) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    collect_into(value, depth, String::new(), &mut out);
    out
}

fn collect_into(value: &Value, depth: usize, prefix: String, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) if depth > 0 => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect_into(child, depth - 1, path, out);
            }
        }
        _ if !prefix.is_empty() => out.push((prefix, value.clone())),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn get_path_walks_objects() {
        let value = json!({"a": {"b": {"c": 1}}});
        assert_eq!(get_path(&value, "a.b.c"), Some(&json!(1)));
        assert_eq!(get_path(&value, "a.x.c"), None);
        assert_eq!(get_path(&value, ""), Some(&value));
    }

    #[test]
    fn get_path_does_not_index_arrays() {
        let value = json!({"a": [1, 2]});
        assert_eq!(get_path(&value, "a.0"), None);
    }

    #[test]
    fn set_path_creates_intermediates() {
        let mut value = json!({"a": 1});
        set_path(&mut value, "b.c.d", json!("x"));
        set_path(&mut value, "a.e", json!(true));
        assert_eq!(value, json!({"a": {"e": true}, "b": {"c": {"d": "x"}}}));
    }

    #[test]
    fn remove_path_returns_subtree() {
        let mut value = json!({"a": {"b": 1, "c": 2}});
        assert_eq!(remove_path(&mut value, "a.b"), Some(json!(1)));
        assert_eq!(remove_path(&mut value, "a.zz"), None);
        assert_eq!(value, json!({"a": {"c": 2}}));
    }

    #[test]
    fn merge_is_deep_and_pure() {
        let base = json!({"font": {"color": "red", "size": "12px"}, "keep": 1});
        let overlay = json!({"font": {"color": "blue"}, "new": [1]});

        let merged = merge(&base, &overlay);

        assert_eq!(
            merged,
            json!({"font": {"color": "blue", "size": "12px"}, "keep": 1, "new": [1]})
        );
        assert_eq!(base["font"]["color"], "red");
    }

    #[test]
    fn merge_replaces_arrays_and_scalars() {
        let merged = merge(&json!({"a": [1, 2, 3], "b": {"c": 1}}), &json!({"a": [9], "b": 5}));
        assert_eq!(merged, json!({"a": [9], "b": 5}));
    }

    #[test]
    fn merge_all_applies_in_order() {
        let values = [json!({"a": 1}), json!({"a": 2, "b": 1}), json!(null)];
        assert_eq!(merge_all(&values), json!({"a": 2, "b": 1}));
    }

    #[test]
    fn collect_paths_at_depth() {
        let value = json!({"title": {"decoration": {"font": {"x": 1}, "border": {}}}, "flat": 3});
        let paths: Vec<String> = collect_paths(&value, 3).into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            paths,
            vec!["title.decoration.font", "title.decoration.border", "flat"]
        );
    }
}
