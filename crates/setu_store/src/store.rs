use crate::lock::{DirLocks, Lease, NameLocks};
use anyhow::{Context, Result};
use futures::StreamExt;
use setu_core::config::StoreConfig;
use setu_core::LockScope;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Directory of transient image files.
///
/// Files live only between download and send. Errors never escape: every
/// operation logs and reports plain success/failure.
pub struct ImageStore {
    dir: PathBuf,
    extensions: HashSet<String>,
    locks: DirLocks,
    leases: NameLocks,
    client: reqwest::Client,
}

impl ImageStore {
    /// Open the store, creating the directory if it is missing.
    pub fn new(
        dir: impl Into<PathBuf>,
        extensions: &[String],
        scope: LockScope,
        download_timeout: Duration,
    ) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create image directory {}", dir.display()))?;
            tracing::info!("Created images folder {}", dir.display());
        }

        let client = reqwest::Client::builder()
            .timeout(download_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            dir,
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            locks: DirLocks::new(scope),
            leases: NameLocks::default(),
            client,
        })
    }

    pub fn from_config(cfg: &StoreConfig) -> Result<Self> {
        Self::new(
            &cfg.image_dir,
            &cfg.extensions,
            cfg.lock_scope,
            Duration::from_secs(cfg.download_timeout_secs),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Claim `name` for a whole save, send and delete cycle. A second claim
    /// on the same name waits until the first is dropped.
    pub async fn lease(&self, name: &str) -> Lease {
        self.leases.lease(name).await
    }

    /// Where `name` lives (or would live) inside the store.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn has_image_extension(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }

    /// Names of the image files currently in the directory, sorted.
    pub async fn list_images(&self) -> Vec<String> {
        let _guard = self.locks.lock_dir().await;
        match self.scan().await {
            Ok(names) => names
                .into_iter()
                .filter(|n| self.has_image_extension(n))
                .collect(),
            Err(e) => {
                tracing::error!("Error getting image list: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Download `url` into `name`. Returns false on any failure, leaving no
    /// partial file behind.
    pub async fn save(&self, url: &str, name: &str) -> bool {
        if !is_plain_name(name) {
            tracing::error!("Refusing to save outside the image directory: {:?}", name);
            return false;
        }

        let _guard = self.locks.lock_file(name).await;
        let path = self.path_of(name);
        match self.download(url, &path).await {
            Ok(bytes) => {
                tracing::info!("Successfully saved image: {} ({} bytes)", name, bytes);
                true
            }
            Err(e) => {
                tracing::error!("Error saving {}: {:#}", name, e);
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!("Could not remove partial file {}: {}", name, e);
                    }
                }
                false
            }
        }
    }

    async fn download(&self, url: &str, path: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Request failed")?
            .error_for_status()
            .context("Image host returned an error status")?;

        let mut file = tokio::fs::File::create(path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;

        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Download interrupted")?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    /// Remove `name` if present. Returns false when it was absent or could
    /// not be removed.
    pub async fn delete(&self, name: &str) -> bool {
        if !is_plain_name(name) {
            tracing::error!("Refusing to delete outside the image directory: {:?}", name);
            return false;
        }

        let _guard = self.locks.lock_file(name).await;
        let path = self.path_of(name);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::info!("Deleted image: {}", name);
                    true
                }
                Err(e) => {
                    tracing::error!("Error deleting image {}: {}", name, e);
                    false
                }
            },
            Ok(false) => {
                tracing::warn!("Attempted to delete non-existent file: {}", name);
                false
            }
            Err(e) => {
                tracing::error!("Error checking image {}: {}", name, e);
                false
            }
        }
    }

    /// Remove every regular file in the directory, whatever put it there.
    /// Returns how many were removed.
    pub async fn purge(&self) -> usize {
        let _guard = self.locks.lock_dir().await;
        let names = match self.scan().await {
            Ok(names) => names,
            Err(e) => {
                tracing::error!("Cleanup failed: {:#}", e);
                return 0;
            }
        };

        let removals = names.iter().map(|name| {
            let path = self.path_of(name);
            async move {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::error!("Error deleting image {}: {}", name, e);
                        false
                    }
                }
            }
        });
        futures::future::join_all(removals)
            .await
            .into_iter()
            .filter(|ok| *ok)
            .count()
    }

    /// Regular files in the directory. Caller holds the directory lock.
    async fn scan(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("Failed to read {}", self.dir.display()))?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// A bare file name: no separators, no parent references.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(&['/', '\\'][..])
}
