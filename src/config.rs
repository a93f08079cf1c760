use crate::constants::*;
use crate::error::{LeadError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Runtime configuration. Every section falls back to its defaults when absent,
/// so an empty file is a valid config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub columns: ColumnMapping,
    pub qualifier: QualifierConfig,
    pub payload: PayloadConfig,
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Field delimiter for delimited text uploads
    pub delimiter: char,
    /// Strip whitespace around header names before validating them
    pub trim_headers: bool,
    /// Type numeric and boolean columns of delimited text instead of keeping raw strings
    pub infer_types: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { delimiter: ',', trim_headers: false, infer_types: true }
    }
}

/// Names of the report columns the qualifier needs. All of them are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub orders_sent: String,
    pub status: String,
    pub order_id: String,
    pub total_value: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            id: COL_ID.to_string(),
            name: COL_NAME.to_string(),
            phone: COL_PHONE.to_string(),
            orders_sent: COL_ORDERS_SENT.to_string(),
            status: COL_STATUS.to_string(),
            order_id: COL_ORDER_ID.to_string(),
            total_value: COL_TOTAL_VALUE.to_string(),
        }
    }
}

impl ColumnMapping {
    pub fn required(&self) -> [&str; 7] {
        [
            self.id.as_str(),
            self.name.as_str(),
            self.phone.as_str(),
            self.orders_sent.as_str(),
            self.status.as_str(),
            self.order_id.as_str(),
            self.total_value.as_str(),
        ]
    }

    /// Columns shown to the operator after filtering
    pub fn display(&self) -> [&str; 4] {
        [
            self.name.as_str(),
            self.phone.as_str(),
            self.order_id.as_str(),
            self.total_value.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualifierConfig {
    /// Status label a row must carry, compared exactly
    pub qualifying_status: String,
    /// Column whose repeated values are collapsed to the first row.
    /// Defaults to the customer id column when unset.
    pub dedup_column: Option<String>,
    /// Rewrite the phone column to digits with the country prefix
    pub normalize_phone: bool,
    /// Memoize qualifier results by table content
    pub cache: bool,
    /// Most results the cache holds; the oldest goes first
    pub cache_capacity: usize,
}

impl Default for QualifierConfig {
    fn default() -> Self {
        Self {
            qualifying_status: SAVED_ORDER_STATUS.to_string(),
            dedup_column: None,
            normalize_phone: true,
            cache: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Maps qualified columns to the field names the webhook expects.
/// An empty list sends every column under its report header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConfig {
    pub fields: Vec<PayloadField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadField {
    pub column: String,
    pub field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub destination_url: String,
    pub timeout_seconds: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { destination_url: String::new(), timeout_seconds: DEFAULT_TIMEOUT_SECONDS }
    }
}

impl Config {
    /// Loads the config from `path`, or from `cart_recovery.toml` in the working
    /// directory when no path is given. A missing default file yields defaults;
    /// a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                debug!("No config file found, using defaults");
                Config::default()
            }
        };
        config.with_env_overrides()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            LeadError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        info!(path = %path.display(), "Loaded config file");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Applies `CART_RECOVERY_WEBHOOK_URL` and `CART_RECOVERY_TIMEOUT_SECONDS`.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var(ENV_WEBHOOK_URL) {
            if !url.trim().is_empty() {
                self.dispatch.destination_url = url.trim().to_string();
            }
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECONDS) {
            self.dispatch.timeout_seconds = raw.trim().parse().map_err(|_| {
                LeadError::Config(format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT_SECONDS, raw))
            })?;
        }
        Ok(self)
    }

    /// The column used for deduplication
    pub fn dedup_column(&self) -> &str {
        self.qualifier.dedup_column.as_deref().unwrap_or(&self.columns.id)
    }
}
