use {
    crate::error::MonitorError,
    chrono::{DateTime, Local},
    serde::{Deserialize, Serialize},
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// Snapshot of the ingestion cursor for resuming after a restart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorSnapshot {
    pub source_path: PathBuf,
    pub offset: u64,
    /// Identity of the file `offset` belongs to (unix only)
    #[serde(default)]
    pub inode: Option<u64>,
    pub saved_at: DateTime<Local>,
}

/// Save cursor snapshot to JSON file
///
/// Written to a temp file first and renamed so a crash never leaves a torn snapshot.
pub fn save_cursor(snapshot: &CursorSnapshot, file_path: &Path) -> Result<(), MonitorError> {
    let write_failure = |source| MonitorError::WriteFailure {
        path: file_path.to_path_buf(),
        source,
    };

    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| write_failure(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    let tmp_path = file_path.with_extension("json.tmp");
    fs::write(&tmp_path, json).map_err(write_failure)?;
    fs::rename(&tmp_path, file_path).map_err(write_failure)?;

    log::debug!("Saved cursor {} to {}", snapshot.offset, file_path.display());
    Ok(())
}

/// Load cursor snapshot from JSON file
///
/// A missing file means a fresh start. A snapshot taken for a different source
/// is ignored. A corrupt snapshot is a setup error.
pub fn load_cursor(
    file_path: &Path,
    source_path: &Path,
) -> Result<Option<CursorSnapshot>, MonitorError> {
    if !file_path.exists() {
        log::info!("No existing cursor state found: {}", file_path.display());
        return Ok(None);
    }

    let json = fs::read_to_string(file_path).map_err(|e| {
        MonitorError::Setup(format!("cannot read cursor state {}: {}", file_path.display(), e))
    })?;
    let snapshot: CursorSnapshot = serde_json::from_str(&json).map_err(|e| {
        MonitorError::Setup(format!("corrupt cursor state {}: {}", file_path.display(), e))
    })?;

    if snapshot.source_path != source_path {
        log::warn!(
            "Cursor state belongs to {}, not {}; starting from offset 0",
            snapshot.source_path.display(),
            source_path.display()
        );
        return Ok(None);
    }

    log::info!(
        "Loaded cursor {} from {} (saved {})",
        snapshot.offset,
        file_path.display(),
        snapshot.saved_at
    );
    Ok(Some(snapshot))
}
