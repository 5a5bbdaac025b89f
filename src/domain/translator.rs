use super::models::{PlaybackStatus, Snapshot};
use super::playback_mode::{LoopStatus, PlaybackMode};
use super::volume;

pub const NO_TRACK_ID: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";

const TRACK_ID_PREFIX: &str = "/org/beefweb_mpris/track/";
const MICROS_PER_SECOND: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Playing,
    Paused,
    Stopped,
}

impl PlayState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Stopped => "Stopped",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub track_id: String,
    pub length_us: i64,
    pub art_url: Option<String>,
    pub title: String,
    pub artists: Vec<String>,
    pub album: String,
    pub album_artists: Vec<String>,
    pub disc_number: i32,
    pub track_number: i32,
}

impl Metadata {
    pub fn empty() -> Self {
        Self {
            track_id: NO_TRACK_ID.to_string(),
            length_us: 0,
            art_url: None,
            title: String::new(),
            artists: Vec::new(),
            album: String::new(),
            album_artists: Vec::new(),
            disc_number: 0,
            track_number: 0,
        }
    }

    pub fn has_track(&self) -> bool {
        self.track_id != NO_TRACK_ID
    }
}

pub fn to_metadata<F>(snapshot: &Snapshot, art_uri: F) -> Metadata
where
    F: FnOnce(&str) -> Option<String>,
{
    let Some(item) = snapshot.active_item.as_ref() else {
        return Metadata::empty();
    };

    Metadata {
        track_id: track_id_for(&item.title),
        length_us: seconds_to_micros(item.duration_seconds),
        art_url: art_uri(&item.album),
        title: item.title.clone(),
        artists: vec![item.artists.clone()],
        album: item.album.clone(),
        album_artists: vec![item.album_artist.clone()],
        disc_number: parse_ordinal(&item.disc_number),
        track_number: parse_ordinal(&item.track_number),
    }
}

pub fn track_id_for(title: &str) -> String {
    if title.is_empty() {
        return format!("{TRACK_ID_PREFIX}untitled");
    }

    let mut id = String::with_capacity(TRACK_ID_PREFIX.len() + title.len() * 2 + 1);
    id.push_str(TRACK_ID_PREFIX);
    id.push('t');
    for byte in title.as_bytes() {
        id.push_str(&format!("{byte:02x}"));
    }
    id
}

/// Disc/track numbers arrive as free text ("3", "3/12", "II", "").
/// Anything but a plain non-negative integer becomes 1.
fn parse_ordinal(value: &str) -> i32 {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return 1;
    }
    trimmed.parse::<i32>().unwrap_or(1)
}

pub fn to_play_state(snapshot: &Snapshot) -> PlayState {
    match snapshot.playback_status {
        PlaybackStatus::Playing => PlayState::Playing,
        PlaybackStatus::Paused => PlayState::Paused,
        PlaybackStatus::Stopped | PlaybackStatus::Unknown => PlayState::Stopped,
    }
}

pub fn to_position_us(snapshot: &Snapshot) -> i64 {
    seconds_to_micros(snapshot.estimated_position())
}

pub fn seek_seconds(position_us: i64) -> f64 {
    position_us as f64 / MICROS_PER_SECOND
}

pub fn seconds_to_micros(seconds: f64) -> i64 {
    if !seconds.is_finite() {
        return 0;
    }
    (seconds * MICROS_PER_SECOND).round() as i64
}

pub fn playback_mode(snapshot: &Snapshot) -> PlaybackMode {
    PlaybackMode::from_code(snapshot.playback_mode)
}

pub fn to_loop_status(snapshot: &Snapshot) -> LoopStatus {
    playback_mode(snapshot).loop_status()
}

pub fn is_repeating(snapshot: &Snapshot) -> bool {
    playback_mode(snapshot).is_repeating()
}

pub fn is_shuffle(snapshot: &Snapshot) -> bool {
    playback_mode(snapshot).is_shuffle()
}

pub fn to_volume(snapshot: &Snapshot) -> f64 {
    snapshot
        .volume
        .as_ref()
        .map(volume::to_fraction)
        .unwrap_or(volume::UNKNOWN_VOLUME)
}

pub fn volume_command(snapshot: &Snapshot, fraction: f64) -> Option<f64> {
    snapshot
        .volume
        .as_ref()
        .map(|current| volume::to_raw(current, fraction))
}

pub fn is_muted(snapshot: &Snapshot) -> bool {
    snapshot.volume.is_some_and(|v| v.is_muted)
}
