//! Process configuration (environment) and the per-integration manifest.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::schedule::RetrySchedule;
use crate::surface::SurfaceSchema;
use crate::toggle::ToggleDefinition;

pub const SID_ENV: &str = "MAP_BRIDGE_SID";
pub const MANIFEST_ENV: &str = "MAP_BRIDGE_MANIFEST";
pub const OUTBOUND_QUEUE_CAP_ENV: &str = "MAP_BRIDGE_OUTBOUND_QUEUE_CAP";

const DEFAULT_SID: &str = "S1";
const DEFAULT_MANIFEST_PATH: &str = "map_bridge.json";
const DEFAULT_OUTBOUND_QUEUE_CAP: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub sid: String,
    pub manifest_path: PathBuf,
    pub outbound_queue_cap: usize,
}

impl BridgeConfig {
    pub fn from_env() -> Result<Self, BridgeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, BridgeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sid = lookup(SID_ENV)
            .filter(|sid| !sid.is_empty())
            .unwrap_or_else(|| DEFAULT_SID.to_string());

        let manifest_path = lookup(MANIFEST_ENV)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_PATH));

        let outbound_queue_cap = match lookup(OUTBOUND_QUEUE_CAP_ENV) {
            None => DEFAULT_OUTBOUND_QUEUE_CAP,
            Some(raw) => match raw.parse::<usize>() {
                Ok(value) if value > 0 => value,
                _ => {
                    return Err(BridgeError::InvalidEnv {
                        key: OUTBOUND_QUEUE_CAP_ENV,
                        value: raw,
                        reason: "expected a positive integer",
                    });
                }
            },
        };

        Ok(Self {
            sid,
            manifest_path,
            outbound_queue_cap,
        })
    }
}

/// Everything the bridge needs to drive one embedded map document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integration {
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default = "default_bridge_name")]
    pub bridge_name: String,
    /// JS expression evaluating to a function that posts a string to the host.
    #[serde(default = "default_message_handler")]
    pub message_handler: String,
    #[serde(default = "default_umbrella_separator")]
    pub umbrella_separator: String,
    #[serde(default = "default_bootstrap_schedule")]
    pub bootstrap: RetrySchedule,
    #[serde(default = "default_stabilizer_schedule")]
    pub stabilizer: RetrySchedule,
    #[serde(default)]
    pub surface: SurfaceSchema,
    pub toggles: Vec<ToggleDefinition>,
}

impl Integration {
    pub fn load(path: &Path) -> Result<Self, BridgeError> {
        let raw = fs::read_to_string(path).map_err(|source| BridgeError::ManifestIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, BridgeError> {
        let integration: Integration = serde_json::from_str(raw)?;
        integration.validate()?;
        Ok(integration)
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.url.trim().is_empty() {
            return Err(invalid("url must not be empty"));
        }

        if !is_js_identifier(&self.bridge_name) {
            return Err(invalid(format!(
                "bridge_name must be a JS identifier: {:?}",
                self.bridge_name
            )));
        }

        if self.message_handler.trim().is_empty() {
            return Err(invalid("message_handler must not be empty"));
        }

        if self.umbrella_separator.is_empty() {
            return Err(invalid("umbrella_separator must not be empty"));
        }

        self.bootstrap.validate("bootstrap").map_err(invalid)?;
        self.stabilizer.validate("stabilizer").map_err(invalid)?;
        self.surface.validate().map_err(invalid)?;

        let mut seen = HashSet::new();
        for toggle in &self.toggles {
            if toggle.id.is_empty() {
                return Err(invalid("toggle id must not be empty"));
            }

            if !seen.insert(toggle.id.as_str()) {
                return Err(invalid(format!("duplicate toggle id: {}", toggle.id)));
            }

            if toggle.values.is_empty() {
                return Err(invalid(format!("toggle {} has no values", toggle.id)));
            }
        }

        Ok(())
    }

    pub fn toggle(&self, id: &str) -> Option<&ToggleDefinition> {
        self.toggles.iter().find(|toggle| toggle.id == id)
    }
}

fn invalid(message: impl Into<String>) -> BridgeError {
    BridgeError::InvalidManifest(message.into())
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
}

fn default_bridge_name() -> String {
    "__mapBridge".to_string()
}

fn default_message_handler() -> String {
    "window.ipc.postMessage".to_string()
}

fn default_umbrella_separator() -> String {
    "-".to_string()
}

fn default_bootstrap_schedule() -> RetrySchedule {
    RetrySchedule::BOOTSTRAP
}

fn default_stabilizer_schedule() -> RetrySchedule {
    RetrySchedule::STABILIZER
}
