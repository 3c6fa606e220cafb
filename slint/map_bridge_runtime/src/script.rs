//! Scripts handed to the embedded document's script-execution entry point.

use serde::Serialize;
use serde_json::Value;

use crate::command::Command;
use crate::error::BridgeError;

pub(crate) const CONFIG_PLACEHOLDER: &str = "__MAP_BRIDGE_CONFIG__";
pub(crate) const POST_PLACEHOLDER: &str = "__MAP_BRIDGE_POST__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptKind {
    Bootstrap,
    Stabilizer,
    Command(Command),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub kind: ScriptKind,
    pub source: String,
}

impl Script {
    pub fn command(&self) -> Option<&Command> {
        match &self.kind {
            ScriptKind::Command(command) => Some(command),
            ScriptKind::Bootstrap | ScriptKind::Stabilizer => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match &self.kind {
            ScriptKind::Bootstrap => "bootstrap",
            ScriptKind::Stabilizer => "stabilizer",
            ScriptKind::Command(command) => command.name(),
        }
    }
}

/// Substitutes the serialized parameters into a script template.
pub(crate) fn render_template<P: Serialize>(
    template: &str,
    params: &P,
) -> Result<String, BridgeError> {
    let config = serde_json::to_string(params).map_err(BridgeError::ScriptEncode)?;
    Ok(template.replace(CONFIG_PLACEHOLDER, &config))
}

/// JSON text of `value`, which doubles as a JS literal.
pub(crate) fn js_literal(value: impl Into<Value>) -> String {
    value.into().to_string()
}
