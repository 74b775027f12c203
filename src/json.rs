use serde_json::Value;

pub type Path = &'static [&'static str];

/// Follow `path` through nested objects.
pub fn get<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(*key))
}

pub fn get_mut<'a>(value: &'a mut Value, path: &[&str]) -> Option<&'a mut Value> {
    path.iter().try_fold(value, |v, key| v.get_mut(*key))
}

pub fn get_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    get(value, path).and_then(Value::as_str)
}

pub fn get_array<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Vec<Value>> {
    get(value, path).and_then(Value::as_array)
}

pub fn get_array_mut<'a>(value: &'a mut Value, path: &[&str]) -> Option<&'a mut Vec<Value>> {
    get_mut(value, path).and_then(Value::as_array_mut)
}

/// True when the object has `key` set to anything but `null`.
pub fn has(value: &Value, key: &str) -> bool {
    value.get(key).is_some_and(|v| !v.is_null())
}

/// JS-style truthiness, used where the service encodes flags loosely.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Text of a `{simpleText}` or `{runs: [{text}]}` node.
pub fn text(value: &Value) -> Option<String> {
    if let Some(s) = value.get("simpleText").and_then(Value::as_str) {
        return Some(s.to_string());
    }
    let runs = value.get("runs")?.as_array()?;
    let joined: String = runs.iter().filter_map(|r| r.get("text").and_then(Value::as_str)).collect();
    Some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_nested_paths() {
        let v = json!({"a": {"b": {"c": [1, 2]}}});
        assert_eq!(get_array(&v, &["a", "b", "c"]).map(Vec::len), Some(2));
        assert!(get(&v, &["a", "x"]).is_none());
        assert!(get(&v, &["a", "b", "c", "d"]).is_none());
    }

    #[test]
    fn text_reads_both_shapes() {
        assert_eq!(text(&json!({"simpleText": "hi"})).as_deref(), Some("hi"));
        assert_eq!(text(&json!({"runs": [{"text": "a"}, {"text": "b"}]})).as_deref(), Some("ab"));
        assert_eq!(text(&json!({})), None);
    }

    #[test]
    fn truthiness_matches_loose_flags() {
        assert!(truthy(Some(&json!(true))));
        assert!(truthy(Some(&json!(1))));
        assert!(truthy(Some(&json!("x"))));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(Some(&json!(""))));
        assert!(!truthy(None));
        assert!(!truthy(Some(&Value::Null)));
    }
}
