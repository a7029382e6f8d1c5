//! Configuration file
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/notedger",
//!   "program_id": "<base64, optional>",
//!   "decode_policy": "skip",
//!   "lamports_per_byte_year": 3480,
//!   "exemption_threshold_years": 2,
//!   "log_level": "info"
//! }
//! ```
//!
//! Only `data_dir` is required. Unknown fields are rejected.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::address::{AddressDeriver, DEFAULT_PROGRAM_ID};
use crate::identity::Identity;
use crate::notes::{DecodePolicy, RentSchedule};
use crate::observability::Severity;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Program id that scopes derived addresses (optional, base64)
    #[serde(default)]
    pub program_id: Option<String>,

    /// "skip" or "abort" (optional, default "skip")
    #[serde(default = "default_decode_policy")]
    pub decode_policy: String,

    #[serde(default = "default_lamports_per_byte_year")]
    pub lamports_per_byte_year: u64,

    #[serde(default = "default_exemption_threshold_years")]
    pub exemption_threshold_years: u64,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_decode_policy() -> String {
    "skip".to_string()
}
fn default_lamports_per_byte_year() -> u64 {
    3480
}
fn default_exemption_threshold_years() -> u64 {
    2
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        self.decode_policy()?;
        self.deriver()?;
        self.log_severity()?;

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn decode_policy(&self) -> CliResult<DecodePolicy> {
        self.decode_policy
            .parse()
            .map_err(|e: String| CliError::config_error(format!("Invalid decode_policy: {}", e)))
    }

    /// Address deriver for the configured program id
    pub fn deriver(&self) -> CliResult<AddressDeriver> {
        let program_id = match &self.program_id {
            None => DEFAULT_PROGRAM_ID,
            Some(text) => *Identity::from_base64(text)
                .map_err(|e| CliError::config_error(format!("Invalid program_id: {}", e)))?
                .as_bytes(),
        };
        Ok(AddressDeriver::new(program_id))
    }

    pub fn rent(&self) -> RentSchedule {
        RentSchedule::new(self.lamports_per_byte_year, self.exemption_threshold_years)
    }

    pub fn log_severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| CliError::config_error(format!("Invalid log_level: {}", e)))
    }
}
