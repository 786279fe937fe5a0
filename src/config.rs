// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub output_dir: PathBuf,
    pub timeout_secs: u64,
    pub bcv: BcvConfig,
    pub binance: BinanceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BcvConfig {
    pub url: String,
    pub user_agent: String,
    /// bcv.org.ve serves an incomplete certificate chain
    pub accept_invalid_certs: bool,
    pub use_system_proxy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BinanceConfig {
    pub url: String,
    pub asset: String,
    pub fiat: String,
    pub trade_type: String,
    pub rows: u32,
    /// 1-based position of the organic ad whose price is used
    pub rank: usize,
    pub use_system_proxy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            timeout_secs: 10,
            bcv: BcvConfig::default(),
            binance: BinanceConfig::default(),
        }
    }
}

impl Default for BcvConfig {
    fn default() -> Self {
        Self {
            url: "https://www.bcv.org.ve/".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
            accept_invalid_certs: true,
            use_system_proxy: true,
        }
    }
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            url: "https://p2p.binance.com/bapi/c2c/v2/friendly/c2c/adv/search".to_string(),
            asset: "USDT".to_string(),
            fiat: "VES".to_string(),
            trade_type: "BUY".to_string(),
            rows: 10,
            rank: 2,
            use_system_proxy: true,
        }
    }
}

impl Config {
    /// Apply `DOLAR_OUTPUT_DIR` and `DOLAR_TIMEOUT_SECS` on top of the file values
    fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("DOLAR_OUTPUT_DIR") {
            if !dir.is_empty() {
                self.output_dir = PathBuf::from(dir);
            }
        }
        if let Some(secs) = lookup("DOLAR_TIMEOUT_SECS") {
            self.timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("DOLAR_TIMEOUT_SECS is not a number: {}", secs))?;
        }
        Ok(())
    }

    /// Layer the environment and then the command line over the file values,
    /// and validate the result.
    pub fn with_overrides(self, output_dir: Option<PathBuf>) -> Result<Self> {
        self.with_overrides_from(|key| env::var(key).ok(), output_dir)
    }

    fn with_overrides_from<F>(mut self, lookup: F, output_dir: Option<PathBuf>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.apply_env_from(lookup)?;
        if let Some(output_dir) = output_dir {
            self.output_dir = output_dir;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than 0");
        }
        if self.binance.rows == 0 {
            bail!("binance.rows must be at least 1");
        }
        if self.binance.rank == 0 {
            bail!("binance.rank is 1-based and must be at least 1");
        }
        Ok(())
    }
}

pub fn parse_config(config_str: &str) -> Result<Config> {
    let config: Config = toml::from_str(config_str).context("Failed to parse config")?;
    Ok(config)
}

/// Load the configuration from an explicit path, or from `./config.toml` when
/// present, falling back to the built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let config_str = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            parse_config(&config_str)?
        }
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                let config_str = fs::read_to_string(default_path)
                    .with_context(|| format!("Failed to read config file {}", DEFAULT_CONFIG_FILE))?;
                parse_config(&config_str)?
            } else {
                Config::default()
            }
        }
    };
    Ok(config)
}

/// Load the config file and apply environment and command-line overrides
pub fn resolve_config(path: Option<&Path>, output_dir: Option<PathBuf>) -> Result<Config> {
    load_config(path)?.with_overrides(output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_empty_config_uses_defaults() -> Result<()> {
        let config = parse_config("")?;
        assert_eq!(config, Config::default());
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.binance.rank, 2);
        assert!(config.bcv.accept_invalid_certs);
        Ok(())
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() -> Result<()> {
        let config = parse_config(
            r#"
            output_dir = "public"

            [binance]
            fiat = "COP"
            rank = 1
            "#,
        )?;
        assert_eq!(config.output_dir, PathBuf::from("public"));
        assert_eq!(config.binance.fiat, "COP");
        assert_eq!(config.binance.rank, 1);
        assert_eq!(config.binance.asset, "USDT");
        assert_eq!(config.bcv, BcvConfig::default());
        Ok(())
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.binance.rank = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.binance.rows = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_from_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("rates.toml");
        fs::write(&path, "timeout_secs = 3\n[bcv]\naccept_invalid_certs = false\n")?;

        let config = load_config(Some(&path))?;
        assert_eq!(config.timeout_secs, 3);
        assert!(!config.bcv.accept_invalid_certs);
        Ok(())
    }

    #[test]
    fn test_load_config_missing_explicit_file_fails() {
        let result = load_config(Some(Path::new("/nonexistent/rates.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_toml_fails() {
        assert!(parse_config("timeout_secs = \"soon\"").is_err());
    }

    #[test]
    fn test_env_output_dir_overrides_file() -> Result<()> {
        let config = parse_config("output_dir = \"from-file\"")?;
        let config = config.with_overrides_from(env_of(&[("DOLAR_OUTPUT_DIR", "from-env")]), None)?;
        assert_eq!(config.output_dir, PathBuf::from("from-env"));
        Ok(())
    }

    #[test]
    fn test_empty_env_output_dir_is_ignored() -> Result<()> {
        let config = parse_config("output_dir = \"from-file\"")?;
        let config = config.with_overrides_from(env_of(&[("DOLAR_OUTPUT_DIR", "")]), None)?;
        assert_eq!(config.output_dir, PathBuf::from("from-file"));
        Ok(())
    }

    #[test]
    fn test_env_timeout_overrides_file() -> Result<()> {
        let config = parse_config("timeout_secs = 3")?;
        let config = config.with_overrides_from(env_of(&[("DOLAR_TIMEOUT_SECS", " 25 ")]), None)?;
        assert_eq!(config.timeout_secs, 25);
        Ok(())
    }

    #[test]
    fn test_env_timeout_not_a_number_fails() {
        let err = Config::default()
            .with_overrides_from(env_of(&[("DOLAR_TIMEOUT_SECS", "soon")]), None)
            .unwrap_err();
        assert!(err.to_string().contains("DOLAR_TIMEOUT_SECS"));
    }

    #[test]
    fn test_cli_output_dir_wins_over_env() -> Result<()> {
        let config = parse_config("output_dir = \"from-file\"")?;
        let config = config.with_overrides_from(
            env_of(&[("DOLAR_OUTPUT_DIR", "from-env")]),
            Some(PathBuf::from("from-cli")),
        )?;
        assert_eq!(config.output_dir, PathBuf::from("from-cli"));
        Ok(())
    }

    #[test]
    fn test_overrides_are_validated() {
        let result = Config::default()
            .with_overrides_from(env_of(&[("DOLAR_TIMEOUT_SECS", "0")]), None);
        assert!(result.is_err());
    }
}
