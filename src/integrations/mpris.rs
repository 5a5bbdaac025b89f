use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use zbus::blocking::connection::Builder;
use zbus::blocking::Connection;
use zbus::fdo;
use zbus::interface;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::bridge::{Bridge, DEFAULT_RATE};
use crate::domain::models::Snapshot;
use crate::domain::playback_mode::LoopStatus;
use crate::domain::translator::{self, Metadata};

pub const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";
pub const BUS_NAME_PREFIX: &str = "org.mpris.MediaPlayer2";

const SUPPORTED_URI_SCHEMES: [&str; 3] = ["file", "http", "https"];
const SUPPORTED_MIME_TYPES: [&str; 6] = [
    "audio/mpeg",
    "audio/flac",
    "audio/ogg",
    "audio/opus",
    "audio/aac",
    "audio/wav",
];

pub struct RootInterface {
    identity: String,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootInterface {
    fn raise(&self) {}

    fn quit(&self) {}

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> String {
        self.identity.clone()
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        SUPPORTED_URI_SCHEMES.iter().map(ToString::to_string).collect()
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        SUPPORTED_MIME_TYPES.iter().map(ToString::to_string).collect()
    }
}

pub struct PlayerInterface {
    bridge: Arc<Bridge>,
}

impl PlayerInterface {
    fn run(&self, action: &str, result: Result<()>) {
        if let Err(err) = result {
            warn!(action, error = ?err, "player command failed");
        }
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerInterface {
    fn next(&self) {
        self.run("next", self.bridge.next());
    }

    fn previous(&self) {
        self.run("previous", self.bridge.previous());
    }

    fn pause(&self) {
        self.run("pause", self.bridge.pause());
    }

    fn play_pause(&self) {
        self.run("play-pause", self.bridge.resume());
    }

    fn stop(&self) {
        self.run("stop", self.bridge.stop());
    }

    fn play(&self) {
        self.run("play", self.bridge.play());
    }

    fn seek(&self, offset: i64) {
        let target = self.bridge.position().saturating_add(offset).max(0);
        self.run("seek", self.bridge.seek(target));
    }

    fn set_position(&self, track_id: OwnedObjectPath, position: i64) {
        let current = self.bridge.metadata();
        if track_id.as_str() != current.track_id {
            debug!(
                requested = track_id.as_str(),
                current = %current.track_id,
                "ignoring set-position for another track"
            );
            return;
        }
        if position < 0 {
            return;
        }
        self.run("set-position", self.bridge.seek(position));
    }

    fn open_uri(&self, uri: String) {
        self.run("open-uri", self.bridge.open_uri(&uri));
    }

    #[zbus(property)]
    fn playback_status(&self) -> String {
        self.bridge.play_state().as_str().to_string()
    }

    #[zbus(property)]
    fn loop_status(&self) -> String {
        self.bridge.loop_status().as_str().to_string()
    }

    #[zbus(property)]
    fn set_loop_status(&mut self, value: String) -> fdo::Result<()> {
        let status = LoopStatus::parse(&value)
            .ok_or_else(|| fdo::Error::InvalidArgs(format!("unknown loop status '{value}'")))?;
        self.run("set-loop-status", self.bridge.set_loop_status(status));
        Ok(())
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        self.bridge.rate()
    }

    #[zbus(property)]
    fn set_rate(&mut self, value: f64) {
        self.bridge.set_rate(value);
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        DEFAULT_RATE
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        DEFAULT_RATE
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.bridge.shuffle()
    }

    #[zbus(property)]
    fn set_shuffle(&mut self, value: bool) {
        self.run("set-shuffle", self.bridge.set_shuffle(value));
    }

    #[zbus(property)]
    fn metadata(&self) -> fdo::Result<HashMap<String, OwnedValue>> {
        metadata_map(&self.bridge.metadata())
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.bridge.volume()
    }

    #[zbus(property)]
    fn set_volume(&mut self, value: f64) {
        self.run("set-volume", self.bridge.set_volume(value).map(|_| ()));
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        self.bridge.position()
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        self.bridge.can_go_next()
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        self.bridge.can_go_previous()
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        self.bridge.can_play()
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        self.bridge.can_pause()
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        self.bridge.can_seek()
    }

    #[zbus(property(emits_changed_signal = "const"))]
    fn can_control(&self) -> bool {
        self.bridge.can_control()
    }
}

pub fn metadata_map(metadata: &Metadata) -> fdo::Result<HashMap<String, OwnedValue>> {
    let mut map = HashMap::new();
    let track_id = ObjectPath::try_from(metadata.track_id.as_str())
        .map_err(|err| fdo::Error::Failed(format!("invalid track id: {err}")))?;
    insert(&mut map, "mpris:trackid", track_id)?;

    if !metadata.has_track() {
        return Ok(map);
    }

    insert(&mut map, "mpris:length", metadata.length_us)?;
    if let Some(art_url) = &metadata.art_url {
        insert(&mut map, "mpris:artUrl", art_url.as_str())?;
    }
    insert(&mut map, "xesam:title", metadata.title.as_str())?;
    insert(&mut map, "xesam:artist", metadata.artists.clone())?;
    insert(&mut map, "xesam:album", metadata.album.as_str())?;
    insert(&mut map, "xesam:albumArtist", metadata.album_artists.clone())?;
    insert(&mut map, "xesam:discNumber", metadata.disc_number)?;
    insert(&mut map, "xesam:trackNumber", metadata.track_number)?;
    Ok(map)
}

fn insert<'a>(
    map: &mut HashMap<String, OwnedValue>,
    key: &str,
    value: impl Into<Value<'a>>,
) -> fdo::Result<()> {
    let owned = OwnedValue::try_from(value.into())
        .map_err(|err| fdo::Error::Failed(format!("cannot encode {key}: {err}")))?;
    map.insert(key.to_string(), owned);
    Ok(())
}

pub struct MprisService {
    connection: Connection,
}

impl MprisService {
    pub fn start(bridge: Arc<Bridge>, bus_suffix: &str, identity: &str) -> Result<Self> {
        let bus_name = format!("{BUS_NAME_PREFIX}.{bus_suffix}");
        let connection = Builder::session()
            .context("failed to connect to the D-Bus session bus")?
            .name(bus_name.clone())
            .with_context(|| format!("invalid bus name: {bus_name}"))?
            .serve_at(
                MPRIS_PATH,
                RootInterface {
                    identity: identity.to_string(),
                },
            )
            .context("failed to export org.mpris.MediaPlayer2")?
            .serve_at(MPRIS_PATH, PlayerInterface { bridge })
            .context("failed to export org.mpris.MediaPlayer2.Player")?
            .build()
            .with_context(|| format!("failed to register {bus_name} on the session bus"))?;

        Ok(Self { connection })
    }

    pub fn notify_changes(&self, previous: &Snapshot, current: &Snapshot) -> Result<()> {
        let changes = PlayerChanges::between(previous, current);
        if changes.is_empty() {
            return Ok(());
        }

        let iface_ref = self
            .connection
            .object_server()
            .interface::<_, PlayerInterface>(MPRIS_PATH)
            .context("player interface is not registered")?;
        let emitter = iface_ref.signal_emitter();
        let iface = iface_ref.get();

        zbus::block_on(async {
            if changes.playback_status {
                iface.playback_status_changed(emitter).await?;
            }
            if changes.metadata {
                iface.metadata_changed(emitter).await?;
            }
            if changes.mode {
                iface.loop_status_changed(emitter).await?;
                iface.shuffle_changed(emitter).await?;
            }
            if changes.volume {
                iface.volume_changed(emitter).await?;
            }
            Ok::<(), zbus::Error>(())
        })
        .context("failed to emit PropertiesChanged")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerChanges {
    pub playback_status: bool,
    pub metadata: bool,
    pub mode: bool,
    pub volume: bool,
}

impl PlayerChanges {
    pub fn between(previous: &Snapshot, current: &Snapshot) -> Self {
        let track = |snapshot: &Snapshot| translator::to_metadata(snapshot, |_| None);

        Self {
            playback_status: translator::to_play_state(previous)
                != translator::to_play_state(current),
            metadata: track(previous) != track(current),
            mode: translator::playback_mode(previous) != translator::playback_mode(current),
            volume: translator::to_volume(previous) != translator::to_volume(current),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
