use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use tracing::{debug, warn};

use crate::domain::models::Snapshot;
use crate::domain::playback_mode::{LoopStatus, PlaybackMode};
use crate::domain::translator::{self, Metadata, PlayState};
use crate::integrations::playback::{PlayerBackend, PlayerStateUpdate};
use crate::integrations::snapshot::SnapshotStore;
use crate::storage::art_cache::ArtCache;

pub const DEFAULT_RATE: f64 = 1.0;

pub struct Bridge {
    store: SnapshotStore,
    art: Option<ArtCache>,
    backend: Mutex<Box<dyn PlayerBackend>>,
}

impl Bridge {
    pub fn new(store: SnapshotStore, backend: Box<dyn PlayerBackend>) -> Self {
        Self {
            store,
            art: None,
            backend: Mutex::new(backend),
        }
    }

    pub fn with_art_cache(mut self, art: ArtCache) -> Self {
        self.art = Some(art);
        self
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.current()
    }

    pub fn metadata(&self) -> Metadata {
        self.metadata_for(&self.snapshot())
    }

    pub fn metadata_for(&self, snapshot: &Snapshot) -> Metadata {
        translator::to_metadata(snapshot, |album| {
            // untagged tracks have no album to key the cache on
            if album.is_empty() {
                return None;
            }
            let art = self.art.as_ref()?;
            if let Some(item) = snapshot.active_item.as_ref() {
                art.request(album, &item.item_ref);
            }
            Some(art.art_uri(album))
        })
    }

    pub fn play_state(&self) -> PlayState {
        translator::to_play_state(&self.snapshot())
    }

    pub fn position(&self) -> i64 {
        translator::to_position_us(&self.snapshot())
    }

    pub fn volume(&self) -> f64 {
        translator::to_volume(&self.snapshot())
    }

    pub fn is_muted(&self) -> bool {
        translator::is_muted(&self.snapshot())
    }

    pub fn is_repeating(&self) -> bool {
        translator::is_repeating(&self.snapshot())
    }

    pub fn loop_status(&self) -> LoopStatus {
        translator::to_loop_status(&self.snapshot())
    }

    pub fn shuffle(&self) -> bool {
        translator::is_shuffle(&self.snapshot())
    }

    pub fn rate(&self) -> f64 {
        DEFAULT_RATE
    }

    pub fn set_rate(&self, rate: f64) {
        debug!(rate, "ignoring playback rate change");
    }

    pub fn can_go_next(&self) -> bool {
        true
    }

    pub fn can_go_previous(&self) -> bool {
        true
    }

    pub fn can_play(&self) -> bool {
        true
    }

    pub fn can_pause(&self) -> bool {
        true
    }

    pub fn can_seek(&self) -> bool {
        true
    }

    pub fn can_control(&self) -> bool {
        true
    }

    pub fn next(&self) -> Result<()> {
        self.with_backend(|backend| backend.play_next())
    }

    pub fn previous(&self) -> Result<()> {
        self.with_backend(|backend| backend.play_previous())
    }

    pub fn pause(&self) -> Result<()> {
        self.with_backend(|backend| backend.pause())
    }

    pub fn resume(&self) -> Result<()> {
        self.with_backend(|backend| backend.toggle_pause())
    }

    pub fn stop(&self) -> Result<()> {
        self.with_backend(|backend| backend.stop())
    }

    pub fn play(&self) -> Result<()> {
        self.with_backend(|backend| backend.play())
    }

    pub fn seek(&self, position_us: i64) -> Result<()> {
        let update = PlayerStateUpdate::position(translator::seek_seconds(position_us));
        self.with_backend(|backend| backend.set_player_state(update))
    }

    pub fn open_uri(&self, uri: &str) -> Result<()> {
        debug!(uri, mime = ?guess_mime_type(uri), "open uri requested");
        self.play()
    }

    pub fn set_volume(&self, fraction: f64) -> Result<bool> {
        let Some(raw) = translator::volume_command(&self.snapshot(), fraction) else {
            warn!(fraction, "volume range unknown; ignoring volume change");
            return Ok(false);
        };
        self.with_backend(|backend| backend.set_player_state(PlayerStateUpdate::volume(raw)))?;
        Ok(true)
    }

    pub fn set_mute(&self, muted: bool) -> Result<()> {
        self.with_backend(|backend| backend.set_player_state(PlayerStateUpdate::mute(muted)))
    }

    pub fn set_repeating(&self, enabled: bool) -> Result<()> {
        self.set_mode(PlaybackMode::for_repeating(enabled))
    }

    pub fn set_loop_status(&self, status: LoopStatus) -> Result<()> {
        self.set_mode(PlaybackMode::for_loop_status(status))
    }

    pub fn set_shuffle(&self, enabled: bool) -> Result<()> {
        self.set_mode(PlaybackMode::for_shuffle(enabled))
    }

    fn set_mode(&self, mode: PlaybackMode) -> Result<()> {
        let update = PlayerStateUpdate::playback_mode(mode.code());
        self.with_backend(|backend| backend.set_player_state(update))
    }

    fn with_backend<T>(&self, f: impl FnOnce(&mut dyn PlayerBackend) -> Result<T>) -> Result<T> {
        let mut backend = self.backend.lock().unwrap_or_else(PoisonError::into_inner);
        f(backend.as_mut())
    }
}

pub fn guess_mime_type(uri: &str) -> Option<&'static str> {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (_, extension) = file_name.rsplit_once('.')?;

    match extension.to_ascii_lowercase().as_str() {
        "mp3" => Some("audio/mpeg"),
        "flac" => Some("audio/flac"),
        "ogg" | "oga" => Some("audio/ogg"),
        "opus" => Some("audio/opus"),
        "m4a" | "aac" => Some("audio/aac"),
        "wav" => Some("audio/wav"),
        "wv" => Some("audio/x-wavpack"),
        "ape" => Some("audio/x-ape"),
        "m3u" | "m3u8" => Some("audio/x-mpegurl"),
        "pls" => Some("audio/x-scpls"),
        "cue" => Some("application/x-cue"),
        _ => None,
    }
}
