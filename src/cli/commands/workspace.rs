use anyhow::{Context, Result, anyhow};
use client::{AppContext, ClientSettings, MemoryStore, Session, SessionToken, StoreSnapshot};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// On-disk layout of a snapshot: the records plus, optionally, the only token
/// the store accepts.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(flatten)]
    pub records: StoreSnapshot,
}

/// An application context over a snapshot file.
pub struct Workspace {
    pub ctx: AppContext<MemoryStore>,
    path: PathBuf,
    access_token: Option<String>,
}

impl Workspace {
    pub fn open(settings: ClientSettings) -> Result<Self> {
        let path = settings
            .snapshot_path
            .clone()
            .ok_or_else(|| anyhow!("No snapshot configured, set snapshot_path or pass --snapshot"))?;
        let token = settings
            .session_token
            .clone()
            .ok_or_else(|| anyhow!("No session token configured, sign in and set session_token"))?;

        let file: SnapshotFile = if path.exists() {
            let json = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse snapshot {}", path.display()))?
        } else {
            info!(path = %path.display(), "Snapshot not found, starting empty");
            SnapshotFile::default()
        };

        let accepted = file.access_token.clone().unwrap_or_else(|| token.clone());
        let store = MemoryStore::with_snapshot(SessionToken::new(accepted), file.records);
        let session = Session::new(SessionToken::new(token));
        debug!(path = %path.display(), "Workspace opened");

        Ok(Self {
            ctx: AppContext::new(store, session, settings),
            path,
            access_token: file.access_token,
        })
    }

    /// Writes the store's records back to the snapshot file.
    pub async fn persist(&self) -> Result<()> {
        let file = SnapshotFile {
            access_token: self.access_token.clone(),
            records: self.ctx.store.snapshot().await,
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write snapshot {}", self.path.display()))?;
        info!(path = %self.path.display(), "Snapshot saved");
        Ok(())
    }
}
