pub const MODE_DEFAULT: i64 = 0;
pub const MODE_REPEAT_PLAYLIST: i64 = 1;
pub const MODE_REPEAT_TRACK: i64 = 2;
pub const MODE_SHUFFLE: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    None,
    Track,
    Playlist,
}

impl LoopStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Track => "Track",
            Self::Playlist => "Playlist",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "None" => Some(Self::None),
            "Track" => Some(Self::Track),
            "Playlist" => Some(Self::Playlist),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Default,
    RepeatPlaylist,
    RepeatTrack,
    Shuffle,
}

impl PlaybackMode {
    /// Classifies a backend code. Codes outside the known set (the backend
    /// also has random and album/folder shuffle) read as `Default`.
    pub fn from_code(code: i64) -> Self {
        match code {
            MODE_REPEAT_PLAYLIST => Self::RepeatPlaylist,
            MODE_REPEAT_TRACK => Self::RepeatTrack,
            MODE_SHUFFLE => Self::Shuffle,
            _ => Self::Default,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Default => MODE_DEFAULT,
            Self::RepeatPlaylist => MODE_REPEAT_PLAYLIST,
            Self::RepeatTrack => MODE_REPEAT_TRACK,
            Self::Shuffle => MODE_SHUFFLE,
        }
    }

    pub fn loop_status(self) -> LoopStatus {
        match self {
            Self::RepeatPlaylist => LoopStatus::Playlist,
            Self::RepeatTrack => LoopStatus::Track,
            Self::Default | Self::Shuffle => LoopStatus::None,
        }
    }

    pub fn is_repeat_track(self) -> bool {
        self == Self::RepeatTrack
    }

    pub fn is_repeating(self) -> bool {
        matches!(self, Self::RepeatPlaylist | Self::RepeatTrack)
    }

    pub fn is_shuffle(self) -> bool {
        self == Self::Shuffle
    }

    pub fn for_loop_status(status: LoopStatus) -> Self {
        match status {
            LoopStatus::None => Self::Default,
            LoopStatus::Track => Self::RepeatTrack,
            LoopStatus::Playlist => Self::RepeatPlaylist,
        }
    }

    pub fn for_repeating(enabled: bool) -> Self {
        if enabled {
            Self::RepeatTrack
        } else {
            Self::Default
        }
    }

    /// Turning shuffle off does not restore a previous repeat mode.
    pub fn for_shuffle(enabled: bool) -> Self {
        if enabled {
            Self::Shuffle
        } else {
            Self::Default
        }
    }
}
