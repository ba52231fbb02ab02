use crate::error::{CivicError, Result};
use crate::io;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// SlaConfig
// ---------------------------------------------------------------------------

/// SLA windows for unattended reports, in hours, keyed by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaConfig {
    #[serde(default = "default_sla_hours")]
    pub default_hours: u32,
    #[serde(default)]
    pub per_category: HashMap<String, u32>,
}

fn default_sla_hours() -> u32 {
    72
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            default_hours: default_sla_hours(),
            per_category: HashMap::new(),
        }
    }
}

impl SlaConfig {
    pub fn hours_for(&self, category: &str) -> u32 {
        self.per_category
            .get(category)
            .copied()
            .unwrap_or(self.default_hours)
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub municipality: String,
    #[serde(default)]
    pub sla: SlaConfig,
}

impl Config {
    pub fn new(municipality: impl Into<String>) -> Self {
        Self {
            municipality: municipality.into(),
            sla: SlaConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(CivicError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        io::atomic_write(&paths::config_path(root), data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
