use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_mode: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
}

impl PlayerStateUpdate {
    pub fn position(seconds: f64) -> Self {
        Self {
            position: Some(seconds),
            ..Self::default()
        }
    }

    pub fn playback_mode(code: i64) -> Self {
        Self {
            playback_mode: Some(code),
            ..Self::default()
        }
    }

    pub fn volume(raw: f64) -> Self {
        Self {
            volume: Some(raw),
            ..Self::default()
        }
    }

    pub fn mute(muted: bool) -> Self {
        Self {
            is_muted: Some(muted),
            ..Self::default()
        }
    }
}

pub trait PlayerBackend: Send {
    fn play_next(&mut self) -> Result<()>;
    fn play_previous(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn toggle_pause(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn set_player_state(&mut self, update: PlayerStateUpdate) -> Result<()>;
}
