pub mod bootstrap;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod lifecycle;
pub mod protocol;
pub mod schedule;
pub mod script;
pub mod snapshot;
pub mod stabilizer;
pub mod surface;
pub mod toggle;

#[cfg(test)]
mod testing;

use crate::protocol::{reader_loop, writer_loop};
use slint::ComponentHandle;
use std::io;
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, error, info, warn};

pub use crate::command::{Command, CommandChannel};
pub use crate::config::{BridgeConfig, Integration};
pub use crate::controller::{BridgeController, BridgeView, EmbeddedContent, ToggleChip};
pub use crate::error::BridgeError;
pub use crate::lifecycle::LoadState;
pub use crate::protocol::{HOST_TO_SHELL_CAP, HostEnvelope, SHELL_TO_HOST_CAP, ShellEnvelope};
pub use crate::schedule::RetrySchedule;
pub use crate::script::{Script, ScriptKind};
pub use crate::snapshot::{MapFlag, MapState, StateSnapshot};
pub use crate::surface::SurfaceSchema;
pub use crate::toggle::{ToggleActivation, ToggleDefinition, ToggleKind};

/// Native gestures the UI layer reports to the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    ToggleHideAll,
    ToggleLabels,
    ToggleCounts,
    ToggleCategory(String),
    SetBookmarkFollow(bool),
    SetMyCollected(bool),
    ResetMyCollected,
    Retry,
    OpenExternally,
    Close,
}

pub trait HostBindings {
    type Ui: ComponentHandle + 'static;

    fn new_ui() -> Result<Self::Ui, slint::PlatformError>;

    fn bind_action<F>(ui: &Self::Ui, handler: F)
    where
        F: Fn(UiAction) + 'static;

    fn present(ui: &Self::Ui, view: &BridgeView);
}

/// [`EmbeddedContent`] backed by the outbound frame queue.
///
/// Scripts are best-effort: a full queue drops them with a rate-limited
/// warning. Load, open-external and close requests always get through.
#[derive(Debug)]
pub struct ChannelContent {
    tx: SyncSender<HostEnvelope>,
    sid: String,
    queue_capacity: usize,
    dropped_scripts: u64,
}

impl ChannelContent {
    pub fn new(tx: SyncSender<HostEnvelope>, sid: String, queue_capacity: usize) -> Self {
        Self {
            tx,
            sid,
            queue_capacity,
            dropped_scripts: 0,
        }
    }

    pub fn dropped_scripts(&self) -> u64 {
        self.dropped_scripts
    }

    pub fn request_close(&mut self) {
        enqueue_control_envelope(
            self.tx.clone(),
            HostEnvelope::Close {
                sid: self.sid.clone(),
            },
            self.queue_capacity,
        );
    }
}

impl EmbeddedContent for ChannelContent {
    fn inject(&mut self, script: Script) {
        let label = script.label();
        let envelope = HostEnvelope::Inject {
            sid: self.sid.clone(),
            label: label.to_string(),
            script: script.source,
        };

        match self.tx.try_send(envelope) {
            Ok(()) => {}
            Err(TrySendError::Full(_envelope)) => {
                self.dropped_scripts += 1;
                let dropped = self.dropped_scripts;
                if dropped == 1 || dropped.is_power_of_two() {
                    warn!(
                        cap = self.queue_capacity,
                        dropped, label, "outbound queue full; dropped script(s)"
                    );
                }
            }
            Err(TrySendError::Disconnected(_envelope)) => {
                warn!(label, "failed to queue script; writer is gone");
            }
        }
    }

    fn load(&mut self, url: &str) {
        enqueue_control_envelope(
            self.tx.clone(),
            HostEnvelope::Load {
                sid: self.sid.clone(),
                url: url.to_string(),
            },
            self.queue_capacity,
        );
    }

    fn open_externally(&mut self, url: &str) {
        enqueue_control_envelope(
            self.tx.clone(),
            HostEnvelope::OpenExternal {
                sid: self.sid.clone(),
                url: url.to_string(),
            },
            self.queue_capacity,
        );
    }
}

type SharedController = Arc<Mutex<BridgeController<ChannelContent>>>;

pub fn run<B: HostBindings>(
    config: BridgeConfig,
    integration: Integration,
) -> Result<(), BridgeError> {
    let ui = B::new_ui()?;
    let ui_weak = ui.as_weak();
    let (tx, rx) = mpsc::sync_channel(config.outbound_queue_cap);
    let sid = config.sid.clone();

    let content = ChannelContent::new(tx.clone(), sid.clone(), config.outbound_queue_cap);
    let bridge = BridgeController::new(integration, content)?;
    let ready = HostEnvelope::Ready {
        sid: sid.clone(),
        title: bridge.integration().title.clone(),
        url: bridge.integration().url.clone(),
    };
    let controller: SharedController = Arc::new(Mutex::new(bridge));

    install_callbacks::<B>(&ui, controller.clone());

    let writer_handle = thread::spawn(move || writer_loop(rx));

    tx.send(ready).map_err(|_| {
        BridgeError::Transport(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "failed to queue ready envelope",
        ))
    })?;

    if let Some(view) = with_controller(&controller, |controller| controller.open()) {
        B::present(&ui, &view);
    }

    let reader_controller = controller.clone();
    let reader_handle = thread::spawn(move || {
        let read_result = reader_loop(|envelope| {
            if envelope.sid() != sid {
                debug!(expected = %sid, got = envelope.sid(), "ignoring envelope for foreign sid");
                return;
            }

            let controller = reader_controller.clone();
            let _ = ui_weak.upgrade_in_event_loop(move |ui| {
                let closes = matches!(envelope, ShellEnvelope::Closed { .. });
                let view = with_controller(&controller, |controller| {
                    handle_shell_envelope(controller, envelope)
                });

                if let Some(view) = view {
                    B::present(&ui, &view);
                }

                if closes {
                    let _ = slint::quit_event_loop();
                }
            });
        });

        if let Err(err) = &read_result {
            error!(error = %err, "reader loop terminated with error");
        }

        let quit_result = slint::invoke_from_event_loop(|| {
            let _ = slint::quit_event_loop();
        });

        if let Err(err) = quit_result {
            warn!(error = %err, "failed to request UI event loop quit");
        }

        read_result
    });

    ui.run()?;

    if let Ok(controller) = controller.lock() {
        let dropped = controller.content().dropped_scripts();
        if dropped > 0 {
            warn!(dropped, "scripts dropped on a full outbound queue this session");
        }
    }

    // Drop UI first so callback closures release their controller clones.
    drop(ui);
    drop(controller);
    drop(tx);

    if reader_handle.is_finished() {
        match reader_handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "reader thread returned error"),
            Err(err) => warn!(?err, "reader thread join failed"),
        }
    } else {
        // A blocked stdin read must not hold up process exit.
        info!("reader thread still active during shutdown; skipping join");
    }

    if writer_handle.is_finished() {
        match writer_handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "writer thread returned error"),
            Err(err) => warn!(?err, "writer thread join failed"),
        }
    } else {
        info!("writer thread still active during shutdown; skipping join");
    }

    Ok(())
}

fn install_callbacks<B: HostBindings>(ui: &B::Ui, controller: SharedController) {
    let ui_weak = ui.as_weak();

    B::bind_action(ui, move |action| {
        let closes = action == UiAction::Close;
        let view = with_controller(&controller, |controller| {
            if let Err(err) = apply_action(controller, action) {
                warn!(error = %err, "ignoring UI action");
            }
        });

        if let (Some(view), Some(ui)) = (view, ui_weak.upgrade()) {
            B::present(&ui, &view);
        }

        if closes {
            let _ = slint::quit_event_loop();
        }
    });
}

/// Runs `f` against the locked controller and returns the view to present.
fn with_controller<F>(controller: &SharedController, f: F) -> Option<BridgeView>
where
    F: FnOnce(&mut BridgeController<ChannelContent>),
{
    let Ok(mut controller) = controller.lock() else {
        error!("bridge controller lock poisoned");
        return None;
    };

    f(&mut controller);
    Some(controller.view())
}

fn apply_action(
    controller: &mut BridgeController<ChannelContent>,
    action: UiAction,
) -> Result<(), BridgeError> {
    match action {
        UiAction::Close => {
            controller.on_close();
            controller.content_mut().request_close();
            Ok(())
        }
        other => dispatch_action(controller, other),
    }
}

fn dispatch_action<C: EmbeddedContent>(
    controller: &mut BridgeController<C>,
    action: UiAction,
) -> Result<(), BridgeError> {
    match action {
        UiAction::ToggleHideAll => controller.toggle_hide_all(),
        UiAction::ToggleLabels => controller.toggle_labels(),
        UiAction::ToggleCounts => controller.toggle_counts(),
        UiAction::ToggleCategory(id) => controller.toggle_category_by_id(&id)?,
        UiAction::SetBookmarkFollow(value) => controller.set_bookmark_follow(value),
        UiAction::SetMyCollected(value) => controller.set_my_collected(value),
        UiAction::ResetMyCollected => controller.reset_my_collected(),
        UiAction::Retry => controller.reload(),
        UiAction::OpenExternally => controller.open_externally(),
        UiAction::Close => controller.on_close(),
    }

    Ok(())
}

fn handle_shell_envelope<C: EmbeddedContent>(
    controller: &mut BridgeController<C>,
    envelope: ShellEnvelope,
) {
    match envelope {
        ShellEnvelope::LoadStart { .. } => controller.on_load_start(),
        ShellEnvelope::LoadEnd { .. } => controller.on_load_end(),
        ShellEnvelope::LoadError { code, message, .. } => {
            let message = match code {
                Some(code) => format!("{code}: {message}"),
                None => message,
            };
            controller.on_error(message);
        }
        ShellEnvelope::Message { data, .. } => {
            controller.on_message(&data);
        }
        ShellEnvelope::Closed { .. } => controller.on_close(),
    }
}

fn enqueue_control_envelope(
    tx: SyncSender<HostEnvelope>,
    envelope: HostEnvelope,
    queue_capacity: usize,
) {
    match tx.try_send(envelope) {
        Ok(()) => {}
        Err(TrySendError::Full(envelope)) => {
            warn!(
                cap = queue_capacity,
                "outbound queue full; waiting to enqueue control envelope"
            );
            thread::spawn(move || {
                if tx.send(envelope).is_err() {
                    warn!("failed to enqueue control envelope");
                }
            });
        }
        Err(TrySendError::Disconnected(_envelope)) => {
            warn!("failed to enqueue control envelope");
        }
    }
}
