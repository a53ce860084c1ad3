use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print JSON to stdout.
pub fn print_json(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_json(&mut stdout.lock(), value) {
        eprintln!("JSON serialization error: {}", e);
    }
}

fn write_json<W: Write>(out: &mut W, value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_strings_preserved() {
        let mut buf = Vec::new();
        write_json(&mut buf, &serde_json::json!({"irr": "0.1487", "moic": null})).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\"irr\": \"0.1487\""));
        assert!(text.contains("\"moic\": null"));
        assert!(text.ends_with('\n'));
    }
}
