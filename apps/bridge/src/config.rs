use anyhow::Context;
use haptic_ingest_f1::F1Config;
use haptic_playlist::DEFAULT_ASSET_EXTENSION;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Bridge settings, read from a JSON file. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub bind_addr: String,
    pub expected_format: u16,
    pub assets_dir: PathBuf,
    pub asset_extension: String,
    /// NDJSON capture of every decoded frame
    pub record_path: Option<PathBuf>,
    /// frames buffered per stream before new ones are dropped
    pub channel_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let f1 = F1Config::default();
        Self {
            bind_addr: f1.bind_addr,
            expected_format: f1.expected_format,
            assets_dir: PathBuf::from("assets"),
            asset_extension: DEFAULT_ASSET_EXTENSION.into(),
            record_path: None,
            channel_capacity: 64,
        }
    }
}

impl BridgeConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let cfg = serde_json::from_str(&text).with_context(|| format!("parse config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn f1(&self) -> F1Config {
        F1Config { bind_addr: self.bind_addr.clone(), expected_format: self.expected_format }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        std::fs::write(&path, r#"{ "assets_dir": "/opt/suit/assets", "channel_capacity": 8 }"#).unwrap();

        let cfg = BridgeConfig::load(&path).unwrap();
        assert_eq!(cfg.assets_dir, PathBuf::from("/opt/suit/assets"));
        assert_eq!(cfg.channel_capacity, 8);
        assert_eq!(cfg.bind_addr, "0.0.0.0:20777");
        assert_eq!(cfg.asset_extension, "ts_asset");
        assert_eq!(cfg.f1().expected_format, 2021);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(BridgeConfig::load(&path).is_err());
    }
}
