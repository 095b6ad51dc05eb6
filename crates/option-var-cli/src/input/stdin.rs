use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Parameters piped on stdin, parsed as JSON when the payload opens with `{`
/// and as YAML otherwise.
///
/// `None` when stdin is an interactive terminal or the pipe is empty.
pub fn read_stdin_config<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped<T: DeserializeOwned>(raw: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let parsed = if trimmed.starts_with('{') {
        serde_json::from_str(trimmed).map_err(|e| format!("Invalid JSON on stdin: {}", e))?
    } else {
        serde_yaml::from_str(trimmed).map_err(|e| format!("Invalid YAML on stdin: {}", e))?
    };
    Ok(Some(parsed))
}
