use serde_json::Value;

/// Keys printed by `--output minimal`, in order of preference.
const PRIORITY_KEYS: [&str; 3] = ["VaR", "loss_amount", "var_estimate"];

/// Print just the key answer from the output.
///
/// For a VaR run this is the narrative statement; otherwise the first
/// field of the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in &PRIORITY_KEYS {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    return format_minimal(val);
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(result_obj)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_var_statement_preferred() {
        let v = json!({
            "result": {"ChangeSeries": [1.0], "VaR": "The 95% VaR is £12.5", "var_estimate": -12.5}
        });
        assert_eq!(minimal_line(&v), "The 95% VaR is £12.5");
    }

    #[test]
    fn test_falls_back_to_first_field() {
        let v = json!({"time_to_maturity": 0.5});
        assert_eq!(minimal_line(&v), "time_to_maturity: 0.5");
    }
}
