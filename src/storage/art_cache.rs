use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use anyhow::{Context, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;

use crate::domain::models::ItemRef;

const FILE_NAME_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

// file names are already encoded, so their '%' must be escaped again
const URI_PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

pub trait ArtworkSource: Send + Sync {
    fn fetch_artwork(&self, item: &ItemRef) -> Result<Vec<u8>>;
}

#[derive(Clone)]
pub struct ArtCache {
    dir: PathBuf,
    source: Arc<dyn ArtworkSource>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ArtCache {
    pub fn new(dir: impl AsRef<Path>, source: Arc<dyn ArtworkSource>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            source,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn art_path(&self, album: &str) -> PathBuf {
        self.dir.join(file_name_for(album))
    }

    pub fn art_uri(&self, album: &str) -> String {
        let path = self.art_path(album);
        format!(
            "file://{}",
            utf8_percent_encode(&path.to_string_lossy(), URI_PATH_SET)
        )
    }

    pub fn request(&self, album: &str, item: &ItemRef) {
        if album.is_empty() {
            return;
        }
        let path = self.art_path(album);
        if path.exists() {
            return;
        }

        let key = file_name_for(album);
        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if !in_flight.insert(key.clone()) {
                return;
            }
        }

        let cache = self.clone();
        let item = item.clone();
        let spawned = thread::Builder::new()
            .name("art-download".to_string())
            .spawn(move || {
                if let Err(err) = cache.download(&item, &path) {
                    debug!(error = ?err, path = %path.display(), "album art download failed");
                }
                cache
                    .in_flight
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&key);
            });

        if let Err(err) = spawned {
            debug!(error = ?err, "could not start album art download");
            self.in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&file_name_for(album));
        }
    }

    pub fn download(&self, item: &ItemRef, path: &Path) -> Result<()> {
        let bytes = self.source.fetch_artwork(item)?;

        fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create art cache directory: {}", self.dir.display())
        })?;

        let mut partial = path.as_os_str().to_owned();
        partial.push(".part");
        let partial = PathBuf::from(partial);
        fs::write(&partial, &bytes)
            .with_context(|| format!("failed to write album art: {}", partial.display()))?;
        fs::rename(&partial, path)
            .with_context(|| format!("failed to store album art: {}", path.display()))?;

        Ok(())
    }
}

fn file_name_for(album: &str) -> String {
    utf8_percent_encode(album, FILE_NAME_SET).to_string()
}
