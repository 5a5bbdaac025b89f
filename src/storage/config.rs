use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

const DEFAULT_BEEFWEB_BASE: &str = "http://localhost:8880";
const DEFAULT_BEEFWEB_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_IDENTITY: &str = "foobar2000";
const DEFAULT_BUS_SUFFIX: &str = "beefweb";
const ART_CACHE_DIR_NAME: &str = "beefweb_mpris";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeefwebConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingConfig {
    pub interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MprisConfig {
    pub identity: String,
    pub bus_suffix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtConfig {
    pub cache_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub beefweb: BeefwebConfig,
    pub polling: PollingConfig,
    pub mpris: MprisConfig,
    pub art: ArtConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            beefweb: BeefwebConfig {
                base_url: DEFAULT_BEEFWEB_BASE.to_string(),
                timeout_ms: DEFAULT_BEEFWEB_TIMEOUT_MS,
                username: None,
                password: None,
            },
            polling: PollingConfig {
                interval_ms: DEFAULT_POLL_INTERVAL_MS,
            },
            mpris: MprisConfig {
                identity: DEFAULT_IDENTITY.to_string(),
                bus_suffix: DEFAULT_BUS_SUFFIX.to_string(),
            },
            art: ArtConfig {
                cache_dir: default_cache_dir(),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    beefweb: FileBeefweb,
    #[serde(default)]
    polling: FilePolling,
    #[serde(default)]
    mpris: FileMpris,
    #[serde(default)]
    art: FileArt,
}

#[derive(Debug, Default, Deserialize)]
struct FileBeefweb {
    base_url: Option<String>,
    timeout_ms: Option<u64>,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FilePolling {
    interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FileMpris {
    identity: Option<String>,
    bus_suffix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileArt {
    cache_dir: Option<PathBuf>,
}

impl RuntimeConfig {
    pub fn default_path() -> PathBuf {
        env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".config/beefweb-mpris/config.toml")
    }

    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.merge_file(path)?;
        config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    fn merge_file(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading config file: {}", path.display()))?;
        self.merge_toml_text(&content)
            .with_context(|| format!("failed parsing config TOML: {}", path.display()))
    }

    fn merge_toml_text(&mut self, content: &str) -> Result<()> {
        let file: FileConfig = toml::from_str(content)?;

        if let Some(base_url) = file.beefweb.base_url {
            self.beefweb.base_url = base_url;
        }
        if let Some(timeout_ms) = file.beefweb.timeout_ms {
            self.beefweb.timeout_ms = timeout_ms;
        }
        if let Some(username) = file.beefweb.username {
            self.beefweb.username = non_empty(username);
        }
        if let Some(password) = file.beefweb.password {
            self.beefweb.password = non_empty(password);
        }
        if let Some(interval_ms) = file.polling.interval_ms {
            self.polling.interval_ms = interval_ms;
        }
        if let Some(identity) = file.mpris.identity {
            self.mpris.identity = identity;
        }
        if let Some(bus_suffix) = file.mpris.bus_suffix {
            self.mpris.bus_suffix = bus_suffix;
        }
        if let Some(cache_dir) = file.art.cache_dir {
            self.art.cache_dir = cache_dir;
        }

        Ok(())
    }

    fn merge_env(&mut self) -> Result<()> {
        if let Ok(base_url) = env::var("BEEFWEB_MPRIS_BASE_URL") {
            self.beefweb.base_url = base_url;
        }
        if let Ok(timeout_ms) = env::var("BEEFWEB_MPRIS_TIMEOUT_MS") {
            self.beefweb.timeout_ms = timeout_ms
                .parse::<u64>()
                .with_context(|| "invalid BEEFWEB_MPRIS_TIMEOUT_MS".to_string())?;
        }
        if let Ok(interval_ms) = env::var("BEEFWEB_MPRIS_POLL_INTERVAL_MS") {
            self.polling.interval_ms = interval_ms
                .parse::<u64>()
                .with_context(|| "invalid BEEFWEB_MPRIS_POLL_INTERVAL_MS".to_string())?;
        }
        if let Ok(username) = env::var("BEEFWEB_MPRIS_USERNAME") {
            self.beefweb.username = non_empty(username);
        }
        if let Ok(password) = env::var("BEEFWEB_MPRIS_PASSWORD") {
            self.beefweb.password = non_empty(password);
        }
        if let Ok(cache_dir) = env::var("BEEFWEB_MPRIS_CACHE_DIR") {
            self.art.cache_dir = PathBuf::from(cache_dir);
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.beefweb.timeout_ms == 0 {
            return Err(anyhow!("beefweb timeout_ms must be greater than zero"));
        }
        if self.polling.interval_ms == 0 {
            return Err(anyhow!("polling interval_ms must be greater than zero"));
        }
        if self.mpris.bus_suffix.trim().is_empty() {
            return Err(anyhow!("mpris bus_suffix cannot be empty"));
        }
        Ok(())
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join(ART_CACHE_DIR_NAME)
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
