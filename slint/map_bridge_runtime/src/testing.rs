//! Test doubles for the embedded side of the bridge.

use std::collections::BTreeMap;

use crate::command::Command;
use crate::controller::{BridgeController, EmbeddedContent};
use crate::script::{Script, ScriptKind};
use crate::snapshot::{BridgeMessage, MapState, StateSnapshot};
use crate::toggle::{ToggleDefinition, ToggleKind};

const TEST_DOM: &str = include_str!("scripts/test_dom.js");

/// Evaluates `steps` in order against a fresh test document and returns the
/// last step's value, which must be a string.
pub fn eval_in_document(steps: &[&str]) -> String {
    let runtime = rquickjs::Runtime::new().expect("js runtime");
    let context = rquickjs::Context::full(&runtime).expect("js context");

    context.with(|ctx| {
        let _: rquickjs::Value = ctx.eval(TEST_DOM).expect("install test document");
        let Some((last, setup)) = steps.split_last() else {
            return String::new();
        };
        for step in setup {
            let _: rquickjs::Value = ctx.eval(*step).expect("evaluate step");
        }
        ctx.eval::<String, _>(*last).expect("evaluate final step")
    })
}

#[derive(Debug, Default)]
pub struct RecordingContent {
    pub scripts: Vec<Script>,
    pub loads: Vec<String>,
    pub external: Vec<String>,
}

impl RecordingContent {
    pub fn drain_scripts(&mut self) -> Vec<Script> {
        std::mem::take(&mut self.scripts)
    }
}

impl EmbeddedContent for RecordingContent {
    fn inject(&mut self, script: Script) {
        self.scripts.push(script);
    }

    fn load(&mut self, url: &str) {
        self.loads.push(url.to_string());
    }

    fn open_externally(&mut self, url: &str) {
        self.external.push(url.to_string());
    }
}

/// In-memory control surface that executes commands the way the injected
/// bridge object does: missing bridge drops the command, a command assigns
/// every target field before firing one change notification per field, and
/// each notification posts a snapshot.
#[derive(Debug, Default)]
pub struct SimulatedSurface {
    installed: bool,
    fields: BTreeMap<(ToggleKind, String), bool>,
    flags: MapState,
    notifications: usize,
    outbox: Vec<String>,
}

impl SimulatedSurface {
    pub fn new(definitions: &[ToggleDefinition]) -> Self {
        let fields = definitions
            .iter()
            .flat_map(|definition| {
                definition
                    .values
                    .iter()
                    .map(move |value| ((definition.kind, value.clone()), false))
            })
            .collect();

        Self {
            fields,
            ..Self::default()
        }
    }

    /// Pre-existing document state, set without firing anything.
    pub fn check(&mut self, kind: ToggleKind, id: &str, value: bool) {
        self.fields.insert((kind, id.to_string()), value);
    }

    pub fn install(&mut self) {
        self.installed = true;
        self.post();
    }

    pub fn execute(&mut self, script: &Script) {
        match &script.kind {
            ScriptKind::Bootstrap => self.install(),
            ScriptKind::Stabilizer => {}
            ScriptKind::Command(command) => {
                if self.installed {
                    self.apply(command);
                }
            }
        }
    }

    pub fn notifications(&self) -> usize {
        self.notifications
    }

    pub fn drain_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outbox)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let mut snapshot = StateSnapshot {
            map: self.flags,
            ..StateSnapshot::default()
        };

        for ((kind, id), checked) in &self.fields {
            if *checked {
                snapshot.categories.set_for_mut(*kind).insert(id.clone());
            }
        }

        snapshot
    }

    fn apply(&mut self, command: &Command) {
        match command {
            Command::SetFlag { flag, value } => {
                self.flags.set(*flag, *value);
                self.fire();
            }
            // The reset control belongs to the page; the bridge only clicks
            // it and re-fires, leaving the flags alone.
            Command::ResetMyCollected => self.fire(),
            Command::SetFields { kind, ids, value } => {
                let keys: Vec<(ToggleKind, String)> = ids
                    .iter()
                    .map(|id| (*kind, id.clone()))
                    .filter(|key| self.fields.contains_key(key))
                    .collect();
                self.assign_then_fire(keys, *value);
            }
            Command::SetAll { kind, value } => {
                let keys: Vec<(ToggleKind, String)> = self
                    .fields
                    .keys()
                    .filter(|(field_kind, _)| field_kind == kind)
                    .cloned()
                    .collect();
                self.assign_then_fire(keys, *value);
            }
        }
    }

    fn assign_then_fire(&mut self, keys: Vec<(ToggleKind, String)>, value: bool) {
        for key in &keys {
            self.fields.insert(key.clone(), value);
        }
        for _ in &keys {
            self.fire();
        }
    }

    fn fire(&mut self) {
        self.notifications += 1;
        self.post();
    }

    fn post(&mut self) {
        let message = BridgeMessage::MapState(self.snapshot());
        let raw = serde_json::to_string(&message).expect("encode simulated snapshot");
        self.outbox.push(raw);
    }
}

/// Runs pending scripts against the surface and feeds every resulting
/// message back to the controller.
pub fn pump(
    controller: &mut BridgeController<RecordingContent>,
    surface: &mut SimulatedSurface,
) {
    for script in controller.content_mut().drain_scripts() {
        surface.execute(&script);
    }

    for message in surface.drain_messages() {
        controller.on_message(&message);
    }
}
