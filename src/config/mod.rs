use std::{
    collections::HashMap,
    env, fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    /// Defaults, then `.sentinelrc`, then `SENTINEL_*` environment variables.
    pub fn load() -> Result<Self> {
        let config_path = default_config_path();
        let mut cfg = Self::from_file(&config_path)?;
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                cfg.inner.insert(k, v);
            }
        }
        Ok(cfg)
    }

    /// Defaults overlaid with the `KEY=VALUE` lines of `path` (if it exists).
    /// The environment is not consulted.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut map = default_map();
        if path.exists() {
            let file = fs::File::open(path)
                .with_context(|| format!("opening config file: {}", path.display()))?;
            for line in BufReader::new(file).lines() {
                let line = line.with_context(|| format!("reading {}", path.display()))?;
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((k, v)) = line.split_once('=') {
                    map.insert(k.trim().to_string(), v.trim().to_string());
                }
            }
        }
        Ok(Self { inner: map, config_path: path.to_path_buf() })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), value.into());
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from)
    }

    /// Seconds value of `key`, or `fallback` when missing or malformed.
    pub fn get_secs(&self, key: &str, fallback: u64) -> Duration {
        Duration::from_secs(self.get_u64(key).unwrap_or(fallback))
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.get_path("SENTINEL_SCRATCH_DIR").unwrap_or_else(env::temp_dir)
    }

    pub fn script_timeout(&self) -> Duration {
        self.get_secs("SENTINEL_SCRIPT_TIMEOUT", DEFAULT_SCRIPT_TIMEOUT)
    }

    pub fn compile_timeout(&self) -> Duration {
        self.get_secs("SENTINEL_COMPILE_TIMEOUT", DEFAULT_COMPILE_TIMEOUT)
    }
}

pub const DEFAULT_SCRIPT_TIMEOUT: u64 = 25;
pub const DEFAULT_COMPILE_TIMEOUT: u64 = 30;

fn is_config_key(k: &str) -> bool {
    k.starts_with("SENTINEL_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("sentinel").join(".sentinelrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    // Toolchain programs; a value may carry leading arguments ("npx tsx").
    let python = if cfg!(windows) { "python" } else { "python3" };
    m.insert("SENTINEL_PYTHON".into(), python.into());
    m.insert("SENTINEL_NODE".into(), "node".into());
    m.insert("SENTINEL_TS_RUNTIME".into(), "node".into());
    m.insert("SENTINEL_JAVAC".into(), "javac".into());
    m.insert("SENTINEL_JAVA".into(), "java".into());
    m.insert("SENTINEL_GO".into(), "go".into());
    m.insert("SENTINEL_CC".into(), "gcc".into());
    m.insert("SENTINEL_CXX".into(), "g++".into());

    // Seconds
    m.insert("SENTINEL_SCRIPT_TIMEOUT".into(), DEFAULT_SCRIPT_TIMEOUT.to_string());
    m.insert("SENTINEL_COMPILE_TIMEOUT".into(), DEFAULT_COMPILE_TIMEOUT.to_string());

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_a_file() {
        let cfg = Config::from_file(Path::new("/definitely/not/here/.sentinelrc")).expect("load");
        assert_eq!(cfg.get("SENTINEL_GO").as_deref(), Some("go"));
        assert_eq!(cfg.script_timeout(), Duration::from_secs(25));
        assert_eq!(cfg.compile_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.scratch_dir(), env::temp_dir());
    }

    #[test]
    fn rc_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".sentinelrc");
        fs::write(
            &path,
            "# toolchain\nSENTINEL_CC = clang\n\nSENTINEL_SCRIPT_TIMEOUT=5\nSENTINEL_SCRATCH_DIR=/var/tmp/sentinel\nnot a pair\n",
        )
        .expect("write rc");

        let cfg = Config::from_file(&path).expect("load");
        assert_eq!(cfg.config_path, path);
        assert_eq!(cfg.get("SENTINEL_CC").as_deref(), Some("clang"));
        assert_eq!(cfg.script_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.scratch_dir(), PathBuf::from("/var/tmp/sentinel"));
    }

    #[test]
    fn malformed_timeout_falls_back() {
        let mut cfg = Config::from_file(Path::new("/nope")).expect("load");
        cfg.set("SENTINEL_COMPILE_TIMEOUT", "soon");
        assert_eq!(cfg.compile_timeout(), Duration::from_secs(DEFAULT_COMPILE_TIMEOUT));
    }
}
