//! Host bridge controller: the UI-facing owner of mirrored map state.
//!
//! The controller never talks to the embedded document synchronously. User
//! gestures become [`Command`] scripts handed to [`EmbeddedContent::inject`];
//! the document answers, eventually, with snapshots delivered through
//! [`BridgeController::on_message`]. The only link between a command and the
//! snapshot it produces is that every command re-fires the change event.

use tracing::{debug, info, warn};

use crate::bootstrap::bootstrap_script;
use crate::command::{Command, CommandChannel};
use crate::config::Integration;
use crate::error::BridgeError;
use crate::lifecycle::LoadState;
use crate::script::Script;
use crate::snapshot::{MapFlag, MapState, StateSnapshot, parse_message};
use crate::stabilizer::stabilizer_script;
use crate::toggle::{ToggleActivation, ToggleDefinition, ToggleKind, narrower_toggles};

/// Execution side of the embedded content view.
pub trait EmbeddedContent {
    /// Fire-and-forget script execution inside the embedded document.
    fn inject(&mut self, script: Script);

    /// (Re)requests the document at `url`.
    fn load(&mut self, url: &str);

    fn open_externally(&mut self, url: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleChip {
    pub id: String,
    pub label: String,
    pub kind: ToggleKind,
    pub active: bool,
}

/// Everything a UI layer needs to render the native controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeView {
    pub title: String,
    pub map_state: MapState,
    pub chips: Vec<ToggleChip>,
    pub load_state: LoadState,
}

pub struct BridgeController<C> {
    integration: Integration,
    channel: CommandChannel,
    bootstrap: Script,
    stabilizer: Script,
    content: C,
    map_state: MapState,
    activation: ToggleActivation,
    /// Hide-all value of the last hide-all gesture whose echo has not been
    /// seen yet. Snapshots disagreeing with it are mid-command reads.
    awaiting_hide_all: Option<bool>,
    load_state: LoadState,
}

impl<C: EmbeddedContent> BridgeController<C> {
    pub fn new(integration: Integration, content: C) -> Result<Self, BridgeError> {
        let bootstrap = bootstrap_script(&integration)?;
        let stabilizer = stabilizer_script(&integration)?;
        let channel = CommandChannel::new(integration.bridge_name.clone());

        Ok(Self {
            integration,
            channel,
            bootstrap,
            stabilizer,
            content,
            map_state: MapState::default(),
            activation: ToggleActivation::default(),
            awaiting_hide_all: None,
            load_state: LoadState::Idle,
        })
    }

    pub fn integration(&self) -> &Integration {
        &self.integration
    }

    pub fn map_state(&self) -> &MapState {
        &self.map_state
    }

    pub fn activation(&self) -> &ToggleActivation {
        &self.activation
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut C {
        &mut self.content
    }

    /// Requests the integration's document for the first time.
    pub fn open(&mut self) {
        self.reload();
    }

    /// Retry affordance: re-requests the original address. Bootstrap reruns
    /// from scratch on the next load end.
    pub fn reload(&mut self) {
        if self.load_state.is_closed() {
            return;
        }

        info!(url = %self.integration.url, "loading embedded map");
        self.enter_loading();
        self.content.load(&self.integration.url);
    }

    pub fn open_externally(&mut self) {
        self.content.open_externally(&self.integration.url);
    }

    pub fn on_load_start(&mut self) {
        if self.load_state.is_closed() {
            return;
        }

        debug!("embedded document load started");
        self.enter_loading();
    }

    /// Injects the bridge into a freshly loaded document. A load end that
    /// follows a load error keeps the error state; only `reload` or a new
    /// load start leave it.
    pub fn on_load_end(&mut self) {
        if self.load_state.is_closed() {
            return;
        }

        if let LoadState::Failed { message } = &self.load_state {
            debug!(%message, "load end after failure; keeping error state");
            return;
        }

        self.load_state = LoadState::Ready;
        info!(
            bootstrap_budget_ms = self.integration.bootstrap.budget().as_millis() as u64,
            stabilizer_budget_ms = self.integration.stabilizer.budget().as_millis() as u64,
            "embedded document loaded; injecting bridge"
        );
        self.content.inject(self.bootstrap.clone());
        self.content.inject(self.stabilizer.clone());
    }

    pub fn on_error(&mut self, message: impl Into<String>) {
        if self.load_state.is_closed() {
            return;
        }

        let message = message.into();
        warn!(url = %self.integration.url, %message, "embedded document failed to load");
        self.load_state = LoadState::Failed { message };
    }

    /// Tears the bridge down; later messages and gestures are ignored.
    pub fn on_close(&mut self) {
        info!("embedded map closed");
        self.load_state = LoadState::Closed;
        self.activation.clear();
        self.awaiting_hide_all = None;
    }

    /// Handles one raw message posted by the embedded document. Returns
    /// whether it was a snapshot that got applied.
    pub fn on_message(&mut self, raw: &str) -> bool {
        if self.load_state.is_closed() {
            return false;
        }

        match parse_message(raw) {
            Some(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    /// Flags are mirrored unconditionally. Activation is derived only while
    /// no record exists; afterwards command issuance owns it. After a
    /// hide-all gesture, derivation waits for the snapshot that shows the
    /// new hide-all value, since the flag is written last.
    pub fn apply_snapshot(&mut self, snapshot: StateSnapshot) {
        self.map_state = snapshot.map;

        if let Some(expected) = self.awaiting_hide_all {
            if snapshot.map.hide_all != expected {
                debug!(expected, "hide-all echo pending; skipping derivation");
                return;
            }
            self.awaiting_hide_all = None;
        }

        if self.activation.is_empty() {
            self.activation =
                ToggleActivation::derive(&self.integration.toggles, &snapshot.categories);
            debug!(
                toggles = self.integration.toggles.len(),
                active = self.activation.iter().filter(|(_, active)| *active).count(),
                "derived toggle activation from snapshot"
            );
        }
    }

    /// Hide-on clears parent and sub activation and turns every parent and
    /// sub field off. Hide-off turns them back on and leaves the record empty
    /// so the first snapshot showing the new hide-all value re-derives it.
    ///
    /// Fields are written before the flag, so that snapshot already holds
    /// the final field state.
    pub fn toggle_hide_all(&mut self) {
        let next = !self.map_state.hide_all;
        self.map_state.hide_all = next;
        self.awaiting_hide_all = Some(next);

        if next {
            self.activation.clear_kinds(
                &self.integration.toggles,
                &[ToggleKind::Parent, ToggleKind::Sub],
            );
        } else {
            self.activation.clear();
        }

        self.dispatch(Command::set_all_parents(!next));
        self.dispatch(Command::set_all_sub_categories(!next));
        self.dispatch(Command::set_hide_all(next));
    }

    pub fn toggle_labels(&mut self) {
        self.flip_flag(MapFlag::ShowLabels);
    }

    pub fn toggle_counts(&mut self) {
        self.flip_flag(MapFlag::ShowCounts);
    }

    pub fn set_bookmark_follow(&mut self, value: bool) {
        self.map_state.bookmark_follow = value;
        self.dispatch(Command::set_bookmark_follow(value));
    }

    pub fn set_my_collected(&mut self, value: bool) {
        self.map_state.my_collected = value;
        self.dispatch(Command::set_my_collected(value));
    }

    pub fn reset_my_collected(&mut self) {
        self.dispatch(Command::reset_my_collected());
    }

    /// Flips one toggle, writing each of its fields with its own command.
    ///
    /// Turning an umbrella on also forces every narrower toggle on, since the
    /// umbrella's fields include theirs. Turning it off only unsets the
    /// umbrella's own fields; narrower records keep their value.
    // TODO: umbrella-off leaves narrower records on; revisit once the chip
    // owners decide whether it should clear them too.
    pub fn toggle_category(&mut self, definition: &ToggleDefinition) {
        let next = !self.activation.is_active(&definition.id);
        self.activation.set(definition.id.clone(), next);

        for value in &definition.values {
            self.dispatch(Command::set_fields(definition.kind, [value.as_str()], next));
        }

        if !next {
            return;
        }

        let narrower: Vec<ToggleDefinition> = narrower_toggles(
            &self.integration.toggles,
            definition,
            &self.integration.umbrella_separator,
        )
        .cloned()
        .collect();

        for child in narrower {
            debug!(umbrella = %definition.id, toggle = %child.id, "cascading activation");
            self.activation.set(child.id.clone(), true);
            self.dispatch(Command::set_fields(child.kind, child.values, true));
        }
    }

    pub fn toggle_category_by_id(&mut self, id: &str) -> Result<(), BridgeError> {
        let definition = self
            .integration
            .toggle(id)
            .cloned()
            .ok_or_else(|| BridgeError::UnknownToggle(id.to_string()))?;

        self.toggle_category(&definition);
        Ok(())
    }

    pub fn view(&self) -> BridgeView {
        let chips = self
            .integration
            .toggles
            .iter()
            .map(|definition| ToggleChip {
                id: definition.id.clone(),
                label: definition.label.clone(),
                kind: definition.kind,
                active: self.activation.is_active(&definition.id),
            })
            .collect();

        BridgeView {
            title: self.integration.title.clone(),
            map_state: self.map_state,
            chips,
            load_state: self.load_state.clone(),
        }
    }

    fn enter_loading(&mut self) {
        self.load_state = LoadState::Loading;
        self.activation.clear();
        self.awaiting_hide_all = None;
    }

    fn flip_flag(&mut self, flag: MapFlag) {
        let value = !self.map_state.get(flag);
        self.map_state.set(flag, value);
        self.dispatch(Command::SetFlag { flag, value });
    }

    fn dispatch(&mut self, command: Command) {
        if self.load_state.is_closed() {
            debug!(command = command.name(), "bridge closed; dropping command");
            return;
        }

        let script = self.channel.script(command);
        debug!(command = script.label(), "injecting command");
        self.content.inject(script);
    }
}
