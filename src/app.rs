use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::bridge::Bridge;
use crate::domain::models::Snapshot;
use crate::integrations::beefweb::{BeefwebClient, Credentials};
use crate::integrations::dispatch::CommandDispatcher;
use crate::integrations::mpris::MprisService;
use crate::integrations::snapshot::{Poller, SnapshotStore};
use crate::storage::art_cache::ArtCache;
use crate::storage::config::RuntimeConfig;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub debug: bool,
    pub config_path: Option<PathBuf>,
    pub base_url: Option<String>,
}

pub fn run(options: RunOptions) -> Result<()> {
    init_tracing(options.debug);

    let mut config = match &options.config_path {
        Some(path) => RuntimeConfig::load_from_path(path),
        None => RuntimeConfig::load(),
    }
    .context("load runtime config")?;
    if let Some(base_url) = options.base_url {
        config.beefweb.base_url = base_url;
    }

    let client = build_client(&config)?;
    let store = SnapshotStore::new();
    let art = ArtCache::new(&config.art.cache_dir, Arc::new(client.clone()));
    let dispatcher = CommandDispatcher::spawn(Box::new(client.clone()))?;
    let bridge = Arc::new(Bridge::new(store.clone(), Box::new(dispatcher)).with_art_cache(art));

    let service = Arc::new(
        MprisService::start(
            Arc::clone(&bridge),
            &config.mpris.bus_suffix,
            &config.mpris.identity,
        )
        .context("start MPRIS service")?,
    );
    info!(
        beefweb = %client.base_url(),
        bus_suffix = %config.mpris.bus_suffix,
        "beefweb-mpris bridge running"
    );

    let notifier = Arc::clone(&service);
    let poller = Poller::new(
        Box::new(client),
        store,
        Duration::from_millis(config.polling.interval_ms),
    )
    .with_change_callback(Box::new(move |previous: &Snapshot, current: &Snapshot| {
        if let Err(err) = notifier.notify_changes(previous, current) {
            debug!(error = ?err, "failed to publish property changes");
        }
    }));

    let handle = poller.spawn()?;
    handle.join();
    Ok(())
}

fn build_client(config: &RuntimeConfig) -> Result<BeefwebClient> {
    let credentials = match (&config.beefweb.username, &config.beefweb.password) {
        (None, None) => None,
        (username, password) => Some(Credentials {
            username: username.clone().unwrap_or_default(),
            password: password.clone().unwrap_or_default(),
        }),
    };

    BeefwebClient::new_with_config(
        config.beefweb.base_url.clone(),
        Duration::from_millis(config.beefweb.timeout_ms),
        credentials,
    )
}

fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "beefweb_mpris=debug"
    } else {
        "beefweb_mpris=info"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .try_init();
}
