use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
    #[default]
    Unknown,
}

impl PlaybackStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "playing" => Self::Playing,
            "paused" => Self::Paused,
            "stopped" => Self::Stopped,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolumeType {
    Db,
    #[default]
    Linear,
}

impl VolumeType {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("db") {
            Self::Db
        } else {
            Self::Linear
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendVolume {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub kind: VolumeType,
    pub is_muted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub playlist_id: String,
    pub index: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveItem {
    pub item_ref: ItemRef,
    pub title: String,
    pub artists: String,
    pub album: String,
    pub album_artist: String,
    pub disc_number: String,
    pub track_number: String,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub active_item: Option<ActiveItem>,
    pub playback_status: PlaybackStatus,
    pub position_seconds: f64,
    pub playback_mode: i64,
    pub volume: Option<BackendVolume>,
    pub fetched_at: Instant,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            active_item: None,
            playback_status: PlaybackStatus::Unknown,
            position_seconds: 0.0,
            playback_mode: 0,
            volume: None,
            fetched_at: Instant::now(),
        }
    }
}

impl Snapshot {
    /// Elapsed time is only added while playing, and never past the end of
    /// a track with a known duration.
    pub fn estimated_position_at(&self, now: Instant) -> f64 {
        if self.playback_status != PlaybackStatus::Playing {
            return self.position_seconds;
        }

        let elapsed = now.saturating_duration_since(self.fetched_at).as_secs_f64();
        let estimate = self.position_seconds + elapsed;
        match self.active_item.as_ref().map(|item| item.duration_seconds) {
            Some(duration) if duration > 0.0 => estimate.min(duration),
            _ => estimate,
        }
    }

    pub fn estimated_position(&self) -> f64 {
        self.estimated_position_at(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn item(duration_seconds: f64) -> ActiveItem {
        ActiveItem {
            item_ref: ItemRef {
                playlist_id: "p1".to_string(),
                index: 0,
            },
            title: "Song".to_string(),
            artists: "Artist".to_string(),
            album: "Album".to_string(),
            album_artist: "Artist".to_string(),
            disc_number: "1".to_string(),
            track_number: "1".to_string(),
            duration_seconds,
        }
    }

    #[test]
    fn status_parsing_is_case_insensitive_and_total() {
        assert_eq!(PlaybackStatus::parse("playing"), PlaybackStatus::Playing);
        assert_eq!(PlaybackStatus::parse("Paused"), PlaybackStatus::Paused);
        assert_eq!(PlaybackStatus::parse("stopped"), PlaybackStatus::Stopped);
        assert_eq!(PlaybackStatus::parse("buffering"), PlaybackStatus::Unknown);
        assert_eq!(PlaybackStatus::parse(""), PlaybackStatus::Unknown);
    }

    #[test]
    fn position_is_extrapolated_only_while_playing() {
        let fetched_at = Instant::now();
        let mut snapshot = Snapshot {
            active_item: Some(item(300.0)),
            playback_status: PlaybackStatus::Paused,
            position_seconds: 10.0,
            fetched_at,
            ..Snapshot::default()
        };
        let later = fetched_at + Duration::from_secs(2);
        assert_eq!(snapshot.estimated_position_at(later), 10.0);

        snapshot.playback_status = PlaybackStatus::Playing;
        assert!((snapshot.estimated_position_at(later) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn extrapolation_stops_at_track_end() {
        let fetched_at = Instant::now();
        let snapshot = Snapshot {
            active_item: Some(item(11.0)),
            playback_status: PlaybackStatus::Playing,
            position_seconds: 10.0,
            fetched_at,
            ..Snapshot::default()
        };
        let later = fetched_at + Duration::from_secs(5);
        assert_eq!(snapshot.estimated_position_at(later), 11.0);
    }
}
