//! Bootstrap script: waits for the control surface, attaches the change
//! listener once, exports the bridge object and pushes an initial snapshot.
//!
//! The script is safe to run again after a document reload; the listener is
//! guarded by a marker attribute on the surface root, and the bridge object is
//! simply re-exported. If the surface never appears the poll gives up after the
//! configured attempts and the view stays usable without native controls.

use serde::Serialize;

use crate::config::Integration;
use crate::error::BridgeError;
use crate::script::{POST_PLACEHOLDER, Script, ScriptKind, render_template};
use crate::surface::SurfaceSchema;

const TEMPLATE: &str = include_str!("scripts/bootstrap.js");

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BootstrapParams<'a> {
    bridge_name: &'a str,
    interval_ms: u64,
    max_attempts: u32,
    surface: &'a SurfaceSchema,
}

pub fn bootstrap_script(integration: &Integration) -> Result<Script, BridgeError> {
    let params = BootstrapParams {
        bridge_name: &integration.bridge_name,
        interval_ms: integration.bootstrap.interval_ms,
        max_attempts: integration.bootstrap.max_attempts,
        surface: &integration.surface,
    };

    let source = render_template(TEMPLATE, &params)?
        .replace(POST_PLACEHOLDER, integration.message_handler.trim());

    Ok(Script {
        kind: ScriptKind::Bootstrap,
        source,
    })
}
