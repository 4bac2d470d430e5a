//! Configuration management for ledgerd

use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    #[serde(default = "default_seed_wallets")]
    pub wallets: u32,
    #[serde(default = "default_seed_balance")]
    pub balance: f64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            wallets: default_seed_wallets(),
            balance: default_seed_balance(),
        }
    }
}

pub fn load_config(path: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let config_str = fs::read_to_string(path).unwrap_or_default();
    let config: Config = if config_str.is_empty() {
        // Provide sane defaults when the config file is absent
        Config {
            network: NetworkConfig {
                api_port: default_api_port(),
            },
            database: DatabaseConfig {
                path: default_db_path(),
            },
            seed: SeedConfig::default(),
        }
    } else {
        toml::from_str(&config_str)?
    };

    // Validate critical values
    if config.database.path.is_empty() {
        return Err("database.path must be set in the config file".into());
    }

    if config.seed.balance < 0.0 || !config.seed.balance.is_finite() {
        return Err("seed.balance must be a non-negative number".into());
    }

    Ok(config)
}

fn default_api_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "./ledger.db".to_string()
}

fn default_seed_wallets() -> u32 {
    10
}

fn default_seed_balance() -> f64 {
    100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config("does-not-exist.toml").unwrap();
        assert_eq!(config.network.api_port, 8080);
        assert_eq!(config.database.path, "./ledger.db");
        assert_eq!(config.seed.wallets, 10);
        assert_eq!(config.seed.balance, 100.0);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [network]
            api_port = 9000

            [database]
            "#,
        )
        .unwrap();
        assert_eq!(config.network.api_port, 9000);
        assert_eq!(config.database.path, "./ledger.db");
        assert_eq!(config.seed.wallets, 10);
    }
}
