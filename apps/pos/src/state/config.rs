//! # Configuration State
//!
//! Store configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`VASTRA_*`)
//! 2. Config file (`VASTRA_CONFIG`, else `<data dir>/config.toml`)
//! 3. Defaults (this file)
//!
//! ## Example `config.toml`
//! ```toml
//! store_name = "Vastra Fashions"
//! store_address = ["12 MG Road", "Pune 411001"]
//! gstin = "27ABCDE1234F1Z5"
//! receipt_width = 48
//! ```
//!
//! Configuration is read-only after startup, so no mutex needed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vastra_core::receipt::ReceiptLayout;

use crate::error::ApiError;

/// Store configuration.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigState {
    /// Store name (printed at the top of receipts)
    pub store_name: String,

    /// Store address lines (for receipts)
    pub store_address: Vec<String>,

    pub store_phone: String,

    /// GST registration number, printed when set
    pub gstin: String,

    /// Currency code (ISO 4217)
    pub currency_code: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,

    /// Name printed in the receipt's cashier line
    pub cashier: String,

    /// Receipt paper width in characters
    pub receipt_width: usize,

    /// Show low-stock alerts on the dashboard
    pub low_stock_alert: bool,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            store_name: "Vastra Store".to_string(),
            store_address: vec!["Main Market".to_string()],
            store_phone: String::new(),
            gstin: String::new(),
            currency_code: "INR".to_string(),
            currency_symbol: "₹".to_string(),
            currency_decimals: 2,
            cashier: "Admin".to_string(),
            receipt_width: 40,
            low_stock_alert: true,
        }
    }
}

impl ConfigState {
    /// Loads configuration from the config file and environment.
    ///
    /// A missing config file is not an error; a malformed one is.
    pub fn load() -> Result<Self, ApiError> {
        let mut config = match config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(?path, "No config file, using defaults");
                ConfigState::default()
            }
            None => ConfigState::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Reads a TOML config file. Keys it leaves out keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ApiError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ApiError::config(format!("Cannot read {}: {}", path.display(), e))
        })?;

        let config: ConfigState = toml::from_str(&text).map_err(|e| {
            ApiError::config(format!("Invalid config file {}: {}", path.display(), e))
        })?;

        info!(?path, "Loaded config file");
        Ok(config)
    }

    /// Applies `VASTRA_*` overrides.
    ///
    /// ## Environment Variables
    /// - `VASTRA_STORE_NAME`
    /// - `VASTRA_STORE_PHONE`
    /// - `VASTRA_GSTIN`
    /// - `VASTRA_CASHIER`
    /// - `VASTRA_RECEIPT_WIDTH` (ignored unless a number)
    /// - `VASTRA_LOW_STOCK_ALERT` (`true` / `false`)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("VASTRA_STORE_NAME") {
            self.store_name = name;
        }

        if let Some(phone) = lookup("VASTRA_STORE_PHONE") {
            self.store_phone = phone;
        }

        if let Some(gstin) = lookup("VASTRA_GSTIN") {
            self.gstin = gstin;
        }

        if let Some(cashier) = lookup("VASTRA_CASHIER") {
            self.cashier = cashier;
        }

        if let Some(width) = lookup("VASTRA_RECEIPT_WIDTH") {
            match width.parse::<usize>() {
                Ok(width) => self.receipt_width = width,
                Err(_) => warn!(value = %width, "Ignoring non-numeric VASTRA_RECEIPT_WIDTH"),
            }
        }

        if let Some(flag) = lookup("VASTRA_LOW_STOCK_ALERT") {
            if let Ok(enabled) = flag.parse::<bool>() {
                self.low_stock_alert = enabled;
            }
        }
    }

    /// Receipt layout for this store.
    pub fn receipt_layout(&self) -> ReceiptLayout {
        let mut store_lines: Vec<String> = self
            .store_address
            .iter()
            .filter(|line| !line.trim().is_empty())
            .cloned()
            .collect();
        if !self.store_phone.is_empty() {
            store_lines.push(format!("Ph: {}", self.store_phone));
        }
        if !self.gstin.is_empty() {
            store_lines.push(format!("GSTIN: {}", self.gstin));
        }

        ReceiptLayout {
            width: self.receipt_width,
            store_name: self.store_name.to_uppercase(),
            store_lines,
            cashier: self.cashier.clone(),
            ..ReceiptLayout::default()
        }
    }

    /// Formats a paise amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(129_900), "₹1299.00");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}

/// `VASTRA_CONFIG`, else `config.toml` in the platform data directory.
fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("VASTRA_CONFIG") {
        return Some(PathBuf::from(path));
    }
    crate::data_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_format_currency() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(129_900), "₹1299.00");
        assert_eq!(config.format_currency(1), "₹0.01");
        assert_eq!(config.format_currency(0), "₹0.00");
        assert_eq!(config.format_currency(-5_050), "-₹50.50");
    }

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "store_name = \"Vastra Fashions\"").unwrap();
        writeln!(file, "receipt_width = 48").unwrap();

        let config = ConfigState::from_file(file.path()).unwrap();
        assert_eq!(config.store_name, "Vastra Fashions");
        assert_eq!(config.receipt_width, 48);
        assert_eq!(config.cashier, "Admin");
        assert_eq!(config.currency_code, "INR");
    }

    #[test]
    fn test_malformed_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "receipt_width = \"wide\"").unwrap();

        let err = ConfigState::from_file(file.path()).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ConfigError);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("VASTRA_STORE_NAME", "Env Store"),
            ("VASTRA_RECEIPT_WIDTH", "not-a-number"),
            ("VASTRA_LOW_STOCK_ALERT", "false"),
        ]
        .into_iter()
        .collect();

        let mut config = ConfigState::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.store_name, "Env Store");
        assert_eq!(config.receipt_width, 40);
        assert!(!config.low_stock_alert);
    }

    #[test]
    fn test_receipt_layout_lines() {
        let config = ConfigState {
            store_phone: "020-2555 1234".to_string(),
            gstin: "27ABCDE1234F1Z5".to_string(),
            ..ConfigState::default()
        };

        let layout = config.receipt_layout();
        assert_eq!(layout.store_name, "VASTRA STORE");
        assert_eq!(
            layout.store_lines,
            vec![
                "Main Market".to_string(),
                "Ph: 020-2555 1234".to_string(),
                "GSTIN: 27ABCDE1234F1Z5".to_string(),
            ]
        );
        assert_eq!(layout.width, 40);
    }
}
