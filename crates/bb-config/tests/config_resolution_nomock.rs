//! No-mock configuration resolution tests.
//!
//! Covers:
//! - Resolution order (CLI > env > XDG > defaults)
//! - TOML and JSON config files on a real filesystem
//! - Parse failures surfacing the offending path

use bb_config::resolve::{load_config, ConfigError, ConfigOptions, ConfigSource};
use bb_config::ModelKind;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let mut saved = Vec::with_capacity(keys.len());
        for key in keys {
            saved.push(env::var(key).ok());
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (idx, key) in self.keys.iter().enumerate() {
            match self.saved.get(idx).and_then(|v| v.as_ref()) {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f()
}

fn write_config(dest: &Path, body: &str) {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).expect("create config parent");
    }
    fs::write(dest, body).expect("write config");
}

#[test]
fn defaults_when_nothing_is_configured() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&["BB_CONFIG", "XDG_CONFIG_HOME"]);
        let xdg = TempDir::new().unwrap();
        env::remove_var("BB_CONFIG");
        env::set_var("XDG_CONFIG_HOME", xdg.path());

        let resolved = load_config(&ConfigOptions::default()).unwrap();
        assert_eq!(resolved.source, ConfigSource::BuiltinDefault);
        assert!(resolved.path.is_none());
        assert_eq!(resolved.config.model.kind, ModelKind::Rf);
    });
}

#[test]
fn xdg_toml_is_preferred_over_json() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&["BB_CONFIG", "XDG_CONFIG_HOME"]);
        let xdg = TempDir::new().unwrap();
        env::remove_var("BB_CONFIG");
        env::set_var("XDG_CONFIG_HOME", xdg.path());

        let dir = xdg.path().join("blackbox_robustness");
        write_config(&dir.join("experiment.json"), r#"{"model": {"kind": "centroid"}}"#);
        write_config(&dir.join("experiment.toml"), "[model]\nkind = \"majority\"\n");

        let resolved = load_config(&ConfigOptions::default()).unwrap();
        assert_eq!(resolved.source, ConfigSource::XdgConfig);
        assert_eq!(resolved.config.model.kind, ModelKind::Majority);
    });
}

#[test]
fn env_overrides_xdg_and_cli_overrides_env() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&["BB_CONFIG", "XDG_CONFIG_HOME"]);
        let root = TempDir::new().unwrap();
        env::set_var("XDG_CONFIG_HOME", root.path());
        write_config(
            &root.path().join("blackbox_robustness/experiment.toml"),
            "[mutation]\nseed = 1\n",
        );
        let env_file = root.path().join("env.toml");
        write_config(&env_file, "[mutation]\nseed = 2\n");
        let cli_file = root.path().join("cli.json");
        write_config(&cli_file, r#"{"mutation": {"seed": 3}}"#);

        env::set_var("BB_CONFIG", &env_file);
        let from_env = load_config(&ConfigOptions::default()).unwrap();
        assert_eq!(from_env.source, ConfigSource::Environment);
        assert_eq!(from_env.config.mutation.seed, 2);

        let from_cli = load_config(&ConfigOptions {
            config_path: Some(cli_file),
        })
        .unwrap();
        assert_eq!(from_cli.source, ConfigSource::CliArgument);
        assert_eq!(from_cli.config.mutation.seed, 3);
    });
}

#[test]
fn malformed_file_reports_path() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&["BB_CONFIG"]);
        env::remove_var("BB_CONFIG");
        let root = TempDir::new().unwrap();
        let path = root.path().join("broken.toml");
        write_config(&path, "[mutation\nseed = ");

        let err = load_config(&ConfigOptions {
            config_path: Some(path.clone()),
        })
        .unwrap_err();
        match err {
            ConfigError::ParseError { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected ParseError, got {other:?}"),
        }
    });
}
