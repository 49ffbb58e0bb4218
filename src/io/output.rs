use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::io::is_stdio;
use crate::models::ClassificationLog;

/// Write the transcript to a file, or to stdout when the path is `-`
pub fn write_transcript(path: &Path, transcript: &str) -> Result<()> {
    if is_stdio(path) {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(transcript.as_bytes())
            .context("Failed to write transcript to stdout")?;
        stdout.flush()?;
        return Ok(());
    }

    std::fs::write(path, transcript).with_context(|| format!("Failed to create file: {:?}", path))
}

/// Write the classification log as pretty JSON
pub fn write_log_json(path: &Path, log: &ClassificationLog) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    serde_json::to_writer_pretty(file, log).context("Failed to write JSON")?;
    Ok(())
}
