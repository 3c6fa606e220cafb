//! Error type shared by the runtime and the host binary.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to read integration manifest {path}: {source}")]
    ManifestIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode integration manifest: {0}")]
    ManifestDecode(#[from] serde_json::Error),

    #[error("invalid integration manifest: {0}")]
    InvalidManifest(String),

    #[error("invalid environment value {key}={value:?}: {reason}")]
    InvalidEnv {
        key: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("failed to encode script parameters: {0}")]
    ScriptEncode(#[source] serde_json::Error),

    #[error("unknown toggle id: {0}")]
    UnknownToggle(String),

    #[error("transport failure: {0}")]
    Transport(#[from] io::Error),

    #[error("ui platform error: {0}")]
    Platform(#[from] slint::PlatformError),
}
