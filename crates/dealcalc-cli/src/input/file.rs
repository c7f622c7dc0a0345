use serde::de::DeserializeOwned;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use super::{parse, InputFormat};

/// Read a deal input file. `.yaml` and `.yml` files are parsed as YAML,
/// everything else as JSON.
pub fn read_input<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn Error>> {
    let resolved = resolve_path(path)?;
    let contents = fs::read_to_string(&resolved)
        .map_err(|e| format!("Failed to read '{}': {}", resolved.display(), e))?;
    let format = match resolved.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => InputFormat::Yaml,
        _ => InputFormat::Json,
    };
    log::debug!("reading {:?} input from {}", format, resolved.display());
    parse(&contents, format, &format!("'{}'", resolved.display()))
}

/// Resolve relative paths against the working directory and require a regular file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn Error>> {
    let p = Path::new(path);
    let resolved = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !resolved.exists() {
        return Err(format!("File not found: {}", resolved.display()).into());
    }
    if !resolved.is_file() {
        return Err(format!("Not a file: {}", resolved.display()).into());
    }
    Ok(resolved)
}
