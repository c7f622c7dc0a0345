pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;
use std::error::Error;

/// Document formats accepted for deal inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
}

impl InputFormat {
    /// JSON when the text opens an object or array, YAML otherwise.
    pub fn sniff(text: &str) -> InputFormat {
        match text.trim_start().chars().next() {
            Some('{') | Some('[') => InputFormat::Json,
            _ => InputFormat::Yaml,
        }
    }
}

/// Deserialise `text` in the given format; `origin` names the source in errors.
pub fn parse<T: DeserializeOwned>(
    text: &str,
    format: InputFormat,
    origin: &str,
) -> Result<T, Box<dyn Error>> {
    let parsed = match format {
        InputFormat::Json => {
            serde_json::from_str(text).map_err(|e| format!("Failed to parse {origin}: {e}"))?
        }
        InputFormat::Yaml => {
            serde_yaml::from_str(text).map_err(|e| format!("Failed to parse {origin}: {e}"))?
        }
    };
    Ok(parsed)
}

/// Read `T` from `--input`, falling back to piped stdin.
///
/// `Ok(None)` when no file was named and nothing was piped.
pub fn load<T: DeserializeOwned>(path: Option<&str>) -> Result<Option<T>, Box<dyn Error>> {
    if let Some(path) = path {
        return file::read_input(path).map(Some);
    }
    match stdin::read_stdin()? {
        Some(text) => parse(&text, InputFormat::sniff(&text), "stdin").map(Some),
        None => Ok(None),
    }
}

/// [`load`], or an error telling the user how to supply `what`.
pub fn require<T: DeserializeOwned>(path: Option<&str>, what: &str) -> Result<T, Box<dyn Error>> {
    load(path)?.ok_or_else(|| format!("--input <file.json|file.yaml> or stdin required for {what}").into())
}
