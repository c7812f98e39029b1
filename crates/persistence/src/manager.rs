use std::path::{Path, PathBuf};

use crate::error::PersistenceError;
use crate::snapshot::WorldSnapshot;

/// Writes snapshots to a save directory and reads the most recent one back.
/// Best effort: callers report failures and carry on.
pub struct SnapshotManager {
    save_dir: PathBuf,
}

impl SnapshotManager {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    /// Save a snapshot. Written to a temp file and renamed so a crash never
    /// leaves a truncated snapshot behind.
    pub fn save_to_disk(&self, snapshot: &WorldSnapshot) -> Result<PathBuf, PersistenceError> {
        std::fs::create_dir_all(&self.save_dir)?;

        let filename = format!("snapshot_turn_{}.bin", snapshot.turn);
        let path = self.save_dir.join(&filename);
        let bytes = bincode::serialize(snapshot)?;

        let tmp_path = self.save_dir.join(format!("{filename}.tmp"));
        std::fs::write(&tmp_path, &bytes)?;
        std::fs::rename(&tmp_path, &path)?;

        let latest_path = self.save_dir.join("latest.bin");
        let latest_tmp = self.save_dir.join("latest.bin.tmp");
        std::fs::write(&latest_tmp, &bytes)?;
        std::fs::rename(&latest_tmp, &latest_path)?;

        tracing::info!(
            turn = snapshot.turn,
            bytes = bytes.len(),
            path = %path.display(),
            "snapshot saved"
        );
        Ok(path)
    }

    /// Load the most recent snapshot.
    pub fn load_latest(&self) -> Result<WorldSnapshot, PersistenceError> {
        self.load_from_path(&self.save_dir.join("latest.bin"))
    }

    pub fn load_from_path(&self, path: &Path) -> Result<WorldSnapshot, PersistenceError> {
        let bytes = std::fs::read(path)?;
        let snapshot: WorldSnapshot = bincode::deserialize(&bytes)?;
        tracing::info!(
            turn = snapshot.turn,
            version = snapshot.version,
            path = %path.display(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn has_latest(&self) -> bool {
        self.save_dir.join("latest.bin").exists()
    }
}
