//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::workflow::Settings;

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Remote invoice processor.
    pub server: ServerCfg,
    /// Local state such as the daily counter.
    pub storage: StorageCfg,
    /// Where processed invoices are saved.
    pub downloads: DownloadsCfg,
    /// Initial workflow behaviour.
    pub workflow: WorkflowCfg,
}

/// Processor endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerCfg {
    /// API root, e.g. `http://localhost:5000/api`.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Local persistence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageCfg {
    /// Directory holding `processedInvoices.json`.
    pub state_dir: PathBuf,
}

/// Download target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadsCfg {
    pub dir: PathBuf,
}

/// Defaults applied when the workflow starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowCfg {
    /// Start in automatic (filename) extraction mode.
    pub auto_extract: bool,
    /// Initial state of the discount-exclusion toggle.
    pub exclude_discount: bool,
    /// Lifetime of success/info messages.
    pub status_ttl_secs: u64,
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    /// Workflow start-up values.
    pub fn settings(&self) -> Settings {
        Settings {
            auto_extract: self.workflow.auto_extract,
            exclude_discount: self.workflow.exclude_discount,
            status_ttl: Duration::from_secs(self.workflow.status_ttl_secs),
        }
    }
}

impl Default for Config {
    /// Defaults match a processor running locally on port 5000.
    fn default() -> Self {
        Self {
            server: ServerCfg {
                base_url: "http://localhost:5000/api".into(),
                timeout_secs: 60,
            },
            storage: StorageCfg {
                state_dir: ".".into(),
            },
            downloads: DownloadsCfg {
                dir: "downloads".into(),
            },
            workflow: WorkflowCfg {
                auto_extract: false,
                exclude_discount: true,
                status_ttl_secs: 5,
            },
        }
    }
}
