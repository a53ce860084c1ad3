use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    print!("{}", render(value));
}

fn render(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                render_result(result, &mut out);
            } else if let Some(Value::Array(rows)) = map.get("results") {
                out.push_str(&array_table(rows));
            } else {
                out.push_str(&field_value_table(map));
            }
            render_envelope(map, &mut out);
        }
        Value::Array(arr) => out.push_str(&array_table(arr)),
        _ => out.push_str(&format!("{}\n", value)),
    }
    out
}

/// Scalars go in one Field/Value table; each nested section gets its own.
fn render_result(result: &Value, out: &mut String) {
    let Value::Object(res_map) = result else {
        out.push_str(&format!("{}\n", format_value(result)));
        return;
    };

    let scalars: Map<String, Value> = res_map
        .iter()
        .filter(|(_, v)| !v.is_object() && table_rows(v).is_none())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if !scalars.is_empty() {
        out.push_str(&field_value_table(&scalars));
    }

    for (key, val) in res_map {
        if val.is_object() {
            out.push_str(&format!("\n{}\n", heading(key)));
            render_result(val, out);
        } else if let Some(rows) = table_rows(val) {
            out.push_str(&format!("\n{}\n", heading(key)));
            if rows.iter().all(|r| r.get("year").is_some()) {
                out.push_str(&by_year_table(&rows));
            } else {
                out.push_str(&array_table(&rows));
            }
        }
    }
}

/// Rows of objects for tabular display; a grid (array of rows) is flattened.
fn table_rows(value: &Value) -> Option<Vec<Value>> {
    let Value::Array(arr) = value else {
        return None;
    };
    match arr.first() {
        Some(Value::Object(_)) => Some(arr.clone()),
        Some(Value::Array(inner)) if inner.first().map_or(false, Value::is_object) => Some(
            arr.iter()
                .filter_map(Value::as_array)
                .flatten()
                .cloned()
                .collect(),
        ),
        _ => None,
    }
}

fn render_envelope(envelope: &Map<String, Value>, out: &mut String) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            out.push_str("\nWarnings:\n");
            for w in warnings {
                if let Value::String(s) = w {
                    out.push_str(&format!("  - {}\n", s));
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        out.push_str(&format!("\nMethodology: {}\n", meth));
    }
}

fn heading(key: &str) -> String {
    key.split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn field_value_table(map: &Map<String, Value>) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    format!("{}\n", Table::from(builder))
}

/// Financial-statement layout: one row per line item, one column per year.
fn by_year_table(rows: &[Value]) -> String {
    let Some(Value::Object(first)) = rows.first() else {
        return String::new();
    };

    let mut builder = Builder::default();
    let mut header = vec!["".to_string()];
    header.extend(rows.iter().map(|r| format!("Year {}", format_value(&r["year"]))));
    builder.push_record(header);

    for key in first.keys().filter(|k| k.as_str() != "year") {
        let mut record = vec![key.clone()];
        record.extend(
            rows.iter()
                .map(|r| r.get(key).map(format_value).unwrap_or_default()),
        );
        builder.push_record(record);
    }
    format!("{}\n", Table::from(builder))
}

fn array_table(arr: &[Value]) -> String {
    if arr.is_empty() {
        return "(empty)\n".to_string();
    }

    // Collect all keys from first object for headers
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        format!("{}\n", Table::from(builder))
    } else {
        arr.iter().map(|item| format!("{}\n", format_value(item))).collect()
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "n/m".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
