use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;

use super::playback::{PlayerBackend, PlayerStateUpdate};
use super::snapshot::SnapshotSource;
use crate::domain::models::{
    ActiveItem, BackendVolume, ItemRef, PlaybackStatus, Snapshot, VolumeType,
};
use crate::storage::art_cache::ArtworkSource;

const COLUMNS: [&str; 6] = [
    "%title%",
    "%artist%",
    "%album%",
    "%album artist%",
    "%discnumber%",
    "%tracknumber%",
];

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone)]
pub struct BeefwebClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl BeefwebClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::new_with_config(base_url, Duration::from_secs(2), None)
    }

    pub fn new_with_config(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Option<Credentials>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build beefweb client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(credentials) => {
                request.basic_auth(&credentials.username, Some(&credentials.password))
            }
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self.authorize(request).send().with_context(|| {
            format!(
                "failed sending {what} to beefweb at {}; verify the player is running with the beefweb plugin enabled",
                self.base_url
            )
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(anyhow!(
                "beefweb authentication failed (401); check the configured username and password"
            ));
        }
        response
            .error_for_status()
            .with_context(|| format!("beefweb {what} returned HTTP {status}"))
    }

    fn post_command(&self, path: &str) -> Result<()> {
        let url = format!("{}/api/player/{path}", self.base_url);
        self.send(self.client.post(url), &format!("command '{path}'"))?;
        Ok(())
    }
}

impl PlayerBackend for BeefwebClient {
    fn play_next(&mut self) -> Result<()> {
        self.post_command("next")
    }

    fn play_previous(&mut self) -> Result<()> {
        self.post_command("previous")
    }

    fn pause(&mut self) -> Result<()> {
        self.post_command("pause")
    }

    fn toggle_pause(&mut self) -> Result<()> {
        self.post_command("pause/toggle")
    }

    fn stop(&mut self) -> Result<()> {
        self.post_command("stop")
    }

    fn play(&mut self) -> Result<()> {
        self.post_command("play")
    }

    fn set_player_state(&mut self, update: PlayerStateUpdate) -> Result<()> {
        let url = format!("{}/api/player", self.base_url);
        self.send(self.client.post(url).json(&update), "player state update")?;
        Ok(())
    }
}

impl SnapshotSource for BeefwebClient {
    fn fetch_snapshot(&self) -> Result<Snapshot> {
        let url = format!("{}/api/player", self.base_url);
        let request = self
            .client
            .get(url)
            .query(&[("columns", COLUMNS.join(","))]);
        let fetched_at = Instant::now();
        let body: PlayerResponse = self
            .send(request, "player state request")?
            .json()
            .context("failed to deserialize beefweb player state")?;

        Ok(snapshot_from_player(body.player, fetched_at))
    }
}

impl ArtworkSource for BeefwebClient {
    fn fetch_artwork(&self, item: &ItemRef) -> Result<Vec<u8>> {
        let url = format!(
            "{}/api/artwork/{}/{}",
            self.base_url, item.playlist_id, item.index
        );
        let bytes = self
            .send(self.client.get(url), "artwork request")?
            .bytes()
            .context("failed reading beefweb artwork body")?;
        Ok(bytes.to_vec())
    }
}

#[derive(Deserialize)]
struct PlayerResponse {
    player: ApiPlayer,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPlayer {
    active_item: Option<ApiActiveItem>,
    playback_state: Option<String>,
    playback_mode: Option<i64>,
    volume: Option<ApiVolume>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiActiveItem {
    playlist_id: Option<String>,
    index: Option<i64>,
    position: Option<f64>,
    duration: Option<f64>,
    #[serde(default)]
    columns: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiVolume {
    #[serde(rename = "type")]
    kind: Option<String>,
    min: f64,
    max: f64,
    value: f64,
    #[serde(default)]
    is_muted: bool,
}

fn snapshot_from_player(player: ApiPlayer, fetched_at: Instant) -> Snapshot {
    let position_seconds = player
        .active_item
        .as_ref()
        .and_then(|item| item.position)
        .unwrap_or(0.0);

    // Stopped players still report an active item, with index -1 and no
    // columns.
    let active_item = player
        .active_item
        .filter(|item| item.index.unwrap_or(-1) >= 0 && !item.columns.is_empty())
        .map(|item| {
            let mut columns = item.columns.into_iter();
            let mut next_column = || columns.next().unwrap_or_default();
            ActiveItem {
                item_ref: ItemRef {
                    playlist_id: item.playlist_id.unwrap_or_default(),
                    index: item.index.unwrap_or_default(),
                },
                title: next_column(),
                artists: next_column(),
                album: next_column(),
                album_artist: next_column(),
                disc_number: next_column(),
                track_number: next_column(),
                duration_seconds: item.duration.unwrap_or(0.0),
            }
        });

    let volume = player.volume.map(|volume| BackendVolume {
        value: volume.value,
        min: volume.min,
        max: volume.max,
        kind: volume
            .kind
            .as_deref()
            .map(VolumeType::parse)
            .unwrap_or_default(),
        is_muted: volume.is_muted,
    });

    Snapshot {
        active_item,
        playback_status: player
            .playback_state
            .as_deref()
            .map(PlaybackStatus::parse)
            .unwrap_or_default(),
        position_seconds,
        playback_mode: player.playback_mode.unwrap_or(0),
        volume,
        fetched_at,
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    use super::*;

    const PLAYING_BODY: &str = r#"{"player":{"activeItem":{"playlistId":"p3","playlistIndex":0,"index":7,"position":12.5,"duration":245.0,"columns":["Teardrop","Massive Attack","Mezzanine","Massive Attack","1","3"]},"playbackState":"playing","playbackMode":2,"playbackModes":["Default","Repeat (playlist)","Repeat (track)","Random","Shuffle (tracks)"],"volume":{"type":"db","min":-100.0,"max":0.0,"value":-10.0,"isMuted":false}}}"#;

    fn parse(body: &str) -> Snapshot {
        let response: PlayerResponse = serde_json::from_str(body).expect("parse body");
        snapshot_from_player(response.player, Instant::now())
    }

    fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> Option<(String, std::thread::JoinHandle<String>)> {
        let listener = match TcpListener::bind("127.0.0.1:0") {
            Ok(listener) => listener,
            Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => return None,
            Err(err) => panic!("bind listener: {err}"),
        };
        let addr = listener.local_addr().expect("local addr");

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept request");
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream
                .write_all(response.as_bytes())
                .expect("write response");
            request
        });

        Some((format!("http://{addr}"), handle))
    }

    fn read_request(stream: &mut std::net::TcpStream) -> String {
        let mut raw = Vec::new();
        let mut buf = [0_u8; 4096];
        loop {
            let n = stream.read(&mut buf).expect("read request");
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if raw.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).to_string()
    }

    #[test]
    fn player_response_maps_to_snapshot() {
        let snapshot = parse(PLAYING_BODY);
        let item = snapshot.active_item.expect("active item");
        assert_eq!(item.title, "Teardrop");
        assert_eq!(item.album, "Mezzanine");
        assert_eq!(item.track_number, "3");
        assert_eq!(item.duration_seconds, 245.0);
        assert_eq!(
            item.item_ref,
            ItemRef {
                playlist_id: "p3".to_string(),
                index: 7
            }
        );
        assert_eq!(snapshot.playback_status, PlaybackStatus::Playing);
        assert_eq!(snapshot.position_seconds, 12.5);
        assert_eq!(snapshot.playback_mode, 2);

        let volume = snapshot.volume.expect("volume");
        assert_eq!(volume.kind, VolumeType::Db);
        assert_eq!(volume.value, -10.0);
        assert!(!volume.is_muted);
    }

    #[test]
    fn stopped_player_has_no_active_item() {
        let snapshot = parse(
            r#"{"player":{"activeItem":{"playlistId":"","playlistIndex":-1,"index":-1,"position":0.0,"duration":0.0,"columns":[]},"playbackState":"stopped","playbackMode":0}}"#,
        );
        assert!(snapshot.active_item.is_none());
        assert!(snapshot.volume.is_none());
        assert_eq!(snapshot.playback_status, PlaybackStatus::Stopped);
    }

    #[test]
    fn missing_columns_become_empty_strings() {
        let snapshot = parse(
            r#"{"player":{"activeItem":{"playlistId":"p1","index":0,"columns":["Only Title"]}}}"#,
        );
        let item = snapshot.active_item.expect("active item");
        assert_eq!(item.title, "Only Title");
        assert_eq!(item.artists, "");
        assert_eq!(item.disc_number, "");
        assert_eq!(snapshot.playback_status, PlaybackStatus::Unknown);
    }

    #[test]
    fn trailing_slash_is_dropped_from_base_url() {
        let client = BeefwebClient::new("http://localhost:8880/").expect("create client");
        assert_eq!(client.base_url(), "http://localhost:8880");
    }

    #[test]
    fn fetch_snapshot_requests_columns() {
        let Some((base_url, handle)) = serve_once("200 OK", PLAYING_BODY) else {
            return;
        };

        let client = BeefwebClient::new_with_config(base_url, Duration::from_secs(1), None)
            .expect("create client");
        let snapshot = client.fetch_snapshot().expect("fetch snapshot");

        let request = handle.join().expect("join server");
        assert!(request.starts_with("GET /api/player?columns="));
        assert!(request.contains("%25title%25"));
        assert_eq!(snapshot.playback_mode, 2);
    }

    #[test]
    fn set_player_state_posts_partial_json() {
        let Some((base_url, handle)) = serve_once("204 No Content", "") else {
            return;
        };

        let mut client = BeefwebClient::new_with_config(base_url, Duration::from_secs(1), None)
            .expect("create client");
        client
            .set_player_state(PlayerStateUpdate::position(42.0))
            .expect("set player state");

        let request = handle.join().expect("join server");
        assert!(request.starts_with("POST /api/player "));
        assert!(request.ends_with(r#"{"position":42.0}"#));
    }

    #[test]
    fn unauthorized_mentions_credentials() {
        let Some((base_url, handle)) = serve_once("401 Unauthorized", "") else {
            return;
        };

        let mut client = BeefwebClient::new_with_config(
            base_url,
            Duration::from_secs(1),
            Some(Credentials {
                username: "user".to_string(),
                password: "wrong".to_string(),
            }),
        )
        .expect("create client");
        let err = client.play().expect_err("401 should fail");

        let request = handle.join().expect("join server");
        assert!(request.starts_with("POST /api/player/play "));
        assert!(request.to_ascii_lowercase().contains("authorization: basic"));
        assert!(err.to_string().contains("username and password"));
    }
}
