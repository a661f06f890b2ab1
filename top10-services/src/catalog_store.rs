//! Catalog artifact persistence
//!
//! The artifact is replaced with write-then-rename so readers only ever see
//! the previous document or the new one, never a partial write.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use top10_core::{CatalogDocument, CatalogRecord, CatalogResult};

use crate::config::CatalogSettings;

/// JSON artifact on disk
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically replace the artifact with `document`
    pub fn write(&self, document: &CatalogDocument) -> CatalogResult<()> {
        let mut json = serde_json::to_vec_pretty(document)?;
        json.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.temp_path();
        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(&json)?;
            file.sync_all()
        });

        if let Err(e) = written.and_then(|_| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        info!(
            "Wrote {} catalog records to {}",
            document.metas.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Read the artifact; `None` when it has not been written yet
    pub fn load(&self) -> CatalogResult<Option<CatalogDocument>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "catalog.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// A loaded catalog document with its load time and time-to-live
#[derive(Debug, Clone)]
pub struct CachedCatalog {
    pub document: CatalogDocument,
    pub loaded_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CachedCatalog {
    pub fn new(document: CatalogDocument, loaded_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            document,
            loaded_at,
            ttl,
        }
    }

    /// Load from the store, falling back to the cache-missing document
    pub fn load(
        store: &CatalogStore,
        settings: &CatalogSettings,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let document = match store.load() {
            Ok(Some(document)) => {
                debug!(
                    "Loaded {} catalog records from {}",
                    document.metas.len(),
                    store.path().display()
                );
                document
            }
            Ok(None) => {
                info!("No catalog artifact at {} yet", store.path().display());
                missing_catalog(settings)
            }
            Err(e) => {
                warn!("Failed to read catalog artifact {}: {}", store.path().display(), e);
                missing_catalog(settings)
            }
        };

        Self::new(document, now, ttl)
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.loaded_at) < self.ttl
    }
}

/// Single-record document served while no artifact exists
pub fn missing_catalog(settings: &CatalogSettings) -> CatalogDocument {
    CatalogDocument::new(vec![CatalogRecord {
        id: format!("{}-cache-missing", settings.id),
        content_type: settings.content_type,
        name: "No data (cache missing)".to_string(),
        poster: None,
        description: "The catalog cache has not been built yet. Run the refresh job or wait for the scheduled update."
            .to_string(),
    }])
}
