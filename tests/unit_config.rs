use std::env;
use std::path::PathBuf;
use std::sync::Mutex;

use beefweb_mpris::storage::config::RuntimeConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn load_config_file_applies_values() {
    let _guard = ENV_LOCK.lock().expect("lock env");
    let dir = tempfile::tempdir().expect("create tempdir");
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
            [beefweb]
            base_url = "http://192.168.1.20:8880"
            timeout_ms = 3000

            [polling]
            interval_ms = 750

            [mpris]
            identity = "Study foobar"

            [art]
            cache_dir = "/tmp/beefweb-art"
        "#,
    )
    .expect("write config");

    let previous = snapshot_env();
    clear_tracked_env();
    let config = RuntimeConfig::load_from_path(&config_path).expect("load config from path");
    restore_env(&previous);

    assert_eq!(config.beefweb.base_url, "http://192.168.1.20:8880");
    assert_eq!(config.beefweb.timeout_ms, 3000);
    assert_eq!(config.beefweb.username, None);
    assert_eq!(config.polling.interval_ms, 750);
    assert_eq!(config.mpris.identity, "Study foobar");
    assert_eq!(config.mpris.bus_suffix, "beefweb");
    assert_eq!(config.art.cache_dir, PathBuf::from("/tmp/beefweb-art"));
}

#[test]
fn missing_file_uses_defaults() {
    let _guard = ENV_LOCK.lock().expect("lock env");
    let dir = tempfile::tempdir().expect("create tempdir");

    let previous = snapshot_env();
    clear_tracked_env();
    let config = RuntimeConfig::load_from_path(&dir.path().join("absent.toml"))
        .expect("missing config file is not an error");
    restore_env(&previous);

    assert_eq!(config.beefweb.base_url, "http://localhost:8880");
    assert_eq!(config.beefweb.timeout_ms, 2000);
    assert_eq!(config.polling.interval_ms, 500);
    assert_eq!(config.mpris.identity, "foobar2000");
}

#[test]
fn env_vars_override_file_values() {
    let _guard = ENV_LOCK.lock().expect("lock env");
    let dir = tempfile::tempdir().expect("create tempdir");
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
            [beefweb]
            base_url = "http://file-host:8880"
            timeout_ms = 1000

            [polling]
            interval_ms = 900
        "#,
    )
    .expect("write config");

    let previous = snapshot_env();
    clear_tracked_env();
    env::set_var("BEEFWEB_MPRIS_BASE_URL", "http://env-host:8880");
    env::set_var("BEEFWEB_MPRIS_TIMEOUT_MS", "5000");
    env::set_var("BEEFWEB_MPRIS_POLL_INTERVAL_MS", "100");
    env::set_var("BEEFWEB_MPRIS_USERNAME", "admin");
    env::set_var("BEEFWEB_MPRIS_PASSWORD", "hunter2");
    env::set_var("BEEFWEB_MPRIS_CACHE_DIR", "/tmp/env-art");

    let config = RuntimeConfig::load_from_path(&config_path);
    restore_env(&previous);
    let config = config.expect("load config from path");

    assert_eq!(config.beefweb.base_url, "http://env-host:8880");
    assert_eq!(config.beefweb.timeout_ms, 5000);
    assert_eq!(config.polling.interval_ms, 100);
    assert_eq!(config.beefweb.username.as_deref(), Some("admin"));
    assert_eq!(config.beefweb.password.as_deref(), Some("hunter2"));
    assert_eq!(config.art.cache_dir, PathBuf::from("/tmp/env-art"));
}

#[test]
fn invalid_numeric_env_var_is_reported() {
    let _guard = ENV_LOCK.lock().expect("lock env");
    let dir = tempfile::tempdir().expect("create tempdir");

    let previous = snapshot_env();
    clear_tracked_env();
    env::set_var("BEEFWEB_MPRIS_POLL_INTERVAL_MS", "fast");
    let result = RuntimeConfig::load_from_path(&dir.path().join("absent.toml"));
    restore_env(&previous);

    let err = result.expect_err("non-numeric interval should fail");
    assert!(err.to_string().contains("BEEFWEB_MPRIS_POLL_INTERVAL_MS"));
}

fn snapshot_env() -> Vec<(&'static str, Option<String>)> {
    tracked_env_keys()
        .into_iter()
        .map(|key| (key, env::var(key).ok()))
        .collect()
}

fn clear_tracked_env() {
    for key in tracked_env_keys() {
        env::remove_var(key);
    }
}

fn restore_env(previous: &[(&str, Option<String>)]) {
    for (key, value) in previous {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}

fn tracked_env_keys() -> [&'static str; 6] {
    [
        "BEEFWEB_MPRIS_BASE_URL",
        "BEEFWEB_MPRIS_TIMEOUT_MS",
        "BEEFWEB_MPRIS_POLL_INTERVAL_MS",
        "BEEFWEB_MPRIS_USERNAME",
        "BEEFWEB_MPRIS_PASSWORD",
        "BEEFWEB_MPRIS_CACHE_DIR",
    ]
}
