//! Studio configuration: storage location, namespace, quota and simulated latencies.
//!
//! | Key (env `FITROOM__…`) | Default | Description |
//! |-----|---------|-------------|
//! | data_dir | ./data/fitroom | Sled database directory. |
//! | namespace | avatarApp | Prefix of every persisted key and name of the sled tree. |
//! | storage_quota_bytes | unset | Byte limit for keys + values in the namespace. |
//! | flush_on_write | true | Flush sled after each write. |
//! | latency.*_ms | see [`LatencyProfile`] | Simulated processing time per operation. |

use crate::error::StudioResult;
use crate::storage::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/fitroom";
const DEFAULT_DATA_DIR: &str = "./data/fitroom";

fn default_true() -> bool {
    true
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudioConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub storage_quota_bytes: Option<u64>,
    #[serde(default = "default_true")]
    pub flush_on_write: bool,
    #[serde(default)]
    pub latency: LatencyProfile,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            namespace: default_namespace(),
            storage_quota_bytes: None,
            flush_on_write: true,
            latency: LatencyProfile::default(),
        }
    }
}

impl StudioConfig {
    /// Load config from file and environment. Precedence: env `FITROOM__*` > file
    /// (`FITROOM_CONFIG` path, else `config/fitroom.toml` when present) > defaults.
    pub fn load() -> StudioResult<Self> {
        let config_path =
            std::env::var("FITROOM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Same as [`StudioConfig::load`] with an explicit file path.
    pub fn load_from(path: &Path) -> StudioResult<Self> {
        let builder = config::Config::builder()
            .set_default("data_dir", DEFAULT_DATA_DIR)?
            .set_default("namespace", DEFAULT_NAMESPACE)?
            .set_default("flush_on_write", true)?;

        let builder = if path.exists() || path.with_extension("toml").exists() {
            builder.add_source(config::File::with_name(&path.to_string_lossy()).required(false))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("FITROOM").separator("__"))
            .build()?;

        Ok(built.try_deserialize()?)
    }
}

/// Simulated processing time per operation, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyProfile {
    pub avatar_generation_ms: u64,
    pub accessory_generation_ms: u64,
    pub clothing_generation_ms: u64,
    pub save_ms: u64,
    pub try_on_ms: u64,
    pub apply_accessory_ms: u64,
    pub apply_clothing_ms: u64,
    pub export_ms: u64,
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            avatar_generation_ms: 2000,
            accessory_generation_ms: 2000,
            clothing_generation_ms: 2500,
            save_ms: 500,
            try_on_ms: 1000,
            apply_accessory_ms: 1500,
            apply_clothing_ms: 1800,
            export_ms: 1000,
        }
    }
}

impl LatencyProfile {
    /// No delays at all. Useful for tests and batch tooling.
    pub fn instant() -> Self {
        Self {
            avatar_generation_ms: 0,
            accessory_generation_ms: 0,
            clothing_generation_ms: 0,
            save_ms: 0,
            try_on_ms: 0,
            apply_accessory_ms: 0,
            apply_clothing_ms: 0,
            export_ms: 0,
        }
    }

    pub fn avatar_generation(&self) -> Duration {
        Duration::from_millis(self.avatar_generation_ms)
    }

    pub fn accessory_generation(&self) -> Duration {
        Duration::from_millis(self.accessory_generation_ms)
    }

    pub fn clothing_generation(&self) -> Duration {
        Duration::from_millis(self.clothing_generation_ms)
    }

    pub fn save(&self) -> Duration {
        Duration::from_millis(self.save_ms)
    }

    pub fn try_on(&self) -> Duration {
        Duration::from_millis(self.try_on_ms)
    }

    pub fn apply_accessory(&self) -> Duration {
        Duration::from_millis(self.apply_accessory_ms)
    }

    pub fn apply_clothing(&self) -> Duration {
        Duration::from_millis(self.apply_clothing_ms)
    }

    pub fn export(&self) -> Duration {
        Duration::from_millis(self.export_ms)
    }
}

/// Sleeps for `d`, skipping the timer entirely for zero durations.
pub(crate) async fn simulate(d: Duration) {
    if !d.is_zero() {
        tokio::time::sleep(d).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = StudioConfig::default();
        assert_eq!(cfg.namespace, "avatarApp");
        assert!(cfg.flush_on_write);
        assert_eq!(cfg.latency.clothing_generation(), Duration::from_millis(2500));
        assert_eq!(cfg.latency.apply_clothing(), Duration::from_millis(1800));
        assert_eq!(LatencyProfile::instant().avatar_generation(), Duration::ZERO);
    }

    #[test]
    fn load_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fitroom.toml");
        std::fs::write(
            &path,
            "namespace = \"demo\"\nstorage_quota_bytes = 4096\n\n[latency]\ntry_on_ms = 5\n",
        )
        .unwrap();

        let cfg = StudioConfig::load_from(&path).unwrap();
        assert_eq!(cfg.namespace, "demo");
        assert_eq!(cfg.storage_quota_bytes, Some(4096));
        assert_eq!(cfg.latency.try_on_ms, 5);
        // Unlisted latencies keep their defaults.
        assert_eq!(cfg.latency.export_ms, 1000);
        assert_eq!(cfg.data_dir, PathBuf::from("./data/fitroom"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StudioConfig::load_from(&dir.path().join("absent")).unwrap();
        assert_eq!(cfg.latency, LatencyProfile::default());
        assert!(cfg.storage_quota_bytes.is_none());
    }
}
