pub mod audit_config;
pub mod load_policy;

use serde::{Deserialize, Serialize};

pub use audit_config::AuditConfig;
pub use load_policy::LoadPolicy;

/// Top-level configuration for the reader.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RewindConfig {
    pub audit: AuditConfig,
    pub load_policy: LoadPolicy,
}

impl RewindConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
