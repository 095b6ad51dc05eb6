use serde_json::Value;
use std::io::{self, Write};

/// Write output as CSV to stdout.
///
/// A VaR result is written as one `day,change` row per portfolio change so
/// the series can be fed straight into a plotting tool.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    write_csv(stdout.lock(), value);
}

fn write_csv<W: Write>(out: W, value: &Value) {
    let mut wtr = csv::Writer::from_writer(out);

    match value {
        Value::Object(map) => {
            if let Some(Value::Object(result)) = map.get("result") {
                if let Some(Value::Array(changes)) = result.get("ChangeSeries") {
                    write_change_series(&mut wtr, changes);
                } else {
                    write_fields(&mut wtr, result);
                }
            } else if let Some(Value::Array(results)) = map.get("results") {
                write_array_csv(&mut wtr, results);
            } else {
                write_fields(&mut wtr, map);
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_change_series<W: Write>(wtr: &mut csv::Writer<W>, changes: &[Value]) {
    let _ = wtr.write_record(["day", "change"]);
    // Changes are aligned to days 1..n of the price path
    for (i, change) in changes.iter().enumerate() {
        let _ = wtr.write_record([(i + 1).to_string(), format_csv_value(change)]);
    }
}

fn write_fields<W: Write>(wtr: &mut csv::Writer<W>, map: &serde_json::Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_array_csv<W: Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    // Extract headers from first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
