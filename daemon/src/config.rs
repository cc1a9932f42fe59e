//! Daemon configuration with TOML file support.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use tru_store::{ArgumentInfo, Category};
use tru_store_lmdb::environment::DEFAULT_MAP_SIZE;
use tru_types::{LedgerParams, UserAddress};

/// Configuration for the daemon.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct DaemonConfig {
    /// Directory of the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Ledger parameters; omitted fields keep their defaults.
    #[serde(default)]
    pub params: LedgerParams,

    /// Categories registered at genesis.
    #[serde(default)]
    pub categories: Vec<Category>,

    /// Opening balances credited at genesis.
    #[serde(default)]
    pub balances: Vec<GenesisBalance>,

    /// Arguments known to the slashing ledger at genesis.
    #[serde(default)]
    pub arguments: Vec<ArgumentInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct GenesisBalance {
    pub address: UserAddress,
    pub denom: String,
    pub amount: u128,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./tru_data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_map_size() -> usize {
    DEFAULT_MAP_SIZE
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.params.validate()?;
        Ok(config)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            map_size: default_map_size(),
            params: LedgerParams::default(),
            categories: Vec::new(),
            balances: Vec::new(),
            arguments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.data_dir, PathBuf::from("./tru_data"));
        assert_eq!(config.log_format, "text");
        assert_eq!(config.map_size, DEFAULT_MAP_SIZE);
        assert_eq!(config.params, LedgerParams::default());
    }

    #[test]
    fn partial_params_override() {
        let toml = r#"
            log_level = "debug"

            [params.game]
            expire_duration_secs = 600

            [params.slashing]
            min_slash_count = 3
        "#;
        let config = DaemonConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.params.game.expire_duration_secs, 600);
        assert_eq!(config.params.slashing.min_slash_count, 3);
        assert_eq!(config.params.slashing.penalty, 50); // default
        assert_eq!(config.params.stake_denom, "trusteak"); // default
    }

    #[test]
    fn genesis_lists() {
        let toml = r#"
            [[categories]]
            id = 1
            slug = "crypto"
            title = "Crypto"

            [[balances]]
            address = "tru1alice"
            denom = "trusteak"
            amount = 1000000

            [[arguments]]
            id = 4
            claim_id = 1
            creator = "tru1alice"
            stake = { denom = "trusteak", amount = 50 }
        "#;
        let config = DaemonConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.categories[0].coin_name(), "crypto");
        assert_eq!(
            config.balances,
            vec![GenesisBalance {
                address: UserAddress::new("tru1alice"),
                denom: "trusteak".into(),
                amount: 1_000_000,
            }]
        );
        assert_eq!(config.arguments[0].creator, UserAddress::new("tru1alice"));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let toml = r#"
            [params.backing]
            amount_weight_bps = 5000
        "#;
        assert!(DaemonConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn malformed_address_is_rejected() {
        let toml = r#"
            [[balances]]
            address = "cosmos1alice"
            denom = "trusteak"
            amount = 1
        "#;
        assert!(DaemonConfig::from_toml_str(toml).is_err());
    }
}
