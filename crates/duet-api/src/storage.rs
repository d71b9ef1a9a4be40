use std::path::PathBuf;

use anyhow::Result;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// On-disk home for uploaded blobs (photos and voice clips). One flat file
/// per media id; the content type lives in the `media_objects` row.
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Media storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn file_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(id.to_string())
    }

    pub async fn save(&self, id: Uuid, bytes: &[u8]) -> std::io::Result<()> {
        fs::write(self.file_path(id), bytes).await
    }

    pub async fn read(&self, id: Uuid) -> std::io::Result<Vec<u8>> {
        fs::read(self.file_path(id)).await
    }

    /// Best-effort removal; a leftover blob is not worth failing a request.
    pub async fn remove(&self, id: Uuid) {
        match fs::remove_file(self.file_path(id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove media blob {}: {}", id, e),
        }
    }
}
