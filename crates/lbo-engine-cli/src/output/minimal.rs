use serde_json::Value;

/// Key figures, most specific first, as JSON pointers into the output.
const PRIORITY_POINTERS: [&str; 8] = [
    "/result/exit_analysis/irr",
    "/result/exit_analysis/moic",
    "/result/irr",
    "/result/moic",
    "/result/sources_uses/sponsor_equity",
    "/result/enterprise_value",
    "/result/entry_multiple",
    "/base_case_position",
];

/// Print just the headline figure from the output.
///
/// Walks the priority pointers and prints the first non-null hit, then falls
/// back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    for pointer in PRIORITY_POINTERS {
        if let Some(val) = value.pointer(pointer) {
            if !val.is_null() {
                return format_minimal(val);
            }
        }
    }

    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);
    if let Value::Object(map) = result_obj {
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
        Value::Null => "n/m".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefers_exit_irr() {
        let v = json!({"result": {"exit_analysis": {"irr": "0.21", "moic": "2.6"}}});
        assert_eq!(minimal_line(&v), "0.21");
    }

    #[test]
    fn test_skips_not_meaningful_irr() {
        let v = json!({"result": {"exit_analysis": {"irr": null, "moic": "-0.4"}}});
        assert_eq!(minimal_line(&v), "-0.4");
    }

    #[test]
    fn test_entry_output_reports_sponsor_equity() {
        let v = json!({"result": {"enterprise_value": "1200", "sources_uses": {"sponsor_equity": "771"}}});
        assert_eq!(minimal_line(&v), "771");
    }

    #[test]
    fn test_falls_back_to_first_field() {
        let v = json!({"result": {"holding_period": 5}});
        assert_eq!(minimal_line(&v), "holding_period: 5");
    }
}
