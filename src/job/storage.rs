use super::types::JobSnapshot;
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::Write;
use std::path::Path;

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Load a job snapshot from a YAML or JSON file (chosen by extension)
pub fn load_snapshot(path: &Path) -> Result<JobSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read job snapshot at {}", path.display()))?;

    let snapshot: JobSnapshot = if is_json(path) {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse job snapshot: invalid JSON in {}", path.display()))?
    } else {
        serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse job snapshot: invalid YAML in {}", path.display()))?
    };

    Ok(snapshot)
}

/// Save a job snapshot atomically
///
/// Uses atomic-write-file so a reader never sees a half-written snapshot.
pub fn save_snapshot(path: &Path, snapshot: &JobSnapshot) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    if is_json(path) {
        serde_json::to_writer_pretty(&mut file, snapshot)
            .context("Failed to serialize job snapshot")?;
    } else {
        let yaml = serde_saphyr::to_string(snapshot)
            .map_err(|e| anyhow::anyhow!("Failed to serialize job snapshot: {}", e))?;
        file.write_all(yaml.as_bytes())
            .context("Failed to write job snapshot")?;
    }

    file.commit().context("Failed to save job snapshot")?;

    Ok(())
}
