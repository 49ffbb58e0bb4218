use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

/// Read a transcript from a file, or from stdin when the path is `-`
pub fn read_transcript(path: &Path) -> Result<String> {
    if is_stdio(path) {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read transcript from stdin")?;
        return Ok(content);
    }

    std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))
}

/// `-` stands for stdin/stdout
pub fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}
