use map_bridge_runtime::{BridgeConfig, BridgeError, BridgeView, HostBindings, Integration, UiAction};
use slint::{ModelRc, VecModel};
use std::process;
use std::rc::Rc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

slint::include_modules!();

struct MapHost;

impl HostBindings for MapHost {
    type Ui = AppWindow;

    fn new_ui() -> Result<Self::Ui, slint::PlatformError> {
        AppWindow::new()
    }

    fn bind_action<F>(ui: &Self::Ui, handler: F)
    where
        F: Fn(UiAction) + 'static,
    {
        let handler = Rc::new(handler);

        let on_action = handler.clone();
        ui.on_toggle_hide_all(move || on_action(UiAction::ToggleHideAll));

        let on_action = handler.clone();
        ui.on_toggle_labels(move || on_action(UiAction::ToggleLabels));

        let on_action = handler.clone();
        ui.on_toggle_counts(move || on_action(UiAction::ToggleCounts));

        let on_action = handler.clone();
        ui.on_toggle_category(move |id| on_action(UiAction::ToggleCategory(id.to_string())));

        let on_action = handler.clone();
        ui.on_set_bookmark_follow(move |value| on_action(UiAction::SetBookmarkFollow(value)));

        let on_action = handler.clone();
        ui.on_set_my_collected(move |value| on_action(UiAction::SetMyCollected(value)));

        let on_action = handler.clone();
        ui.on_reset_my_collected(move || on_action(UiAction::ResetMyCollected));

        let on_action = handler.clone();
        ui.on_retry(move || on_action(UiAction::Retry));

        let on_action = handler.clone();
        ui.on_open_externally(move || on_action(UiAction::OpenExternally));

        ui.on_close_map(move || handler(UiAction::Close));
    }

    fn present(ui: &Self::Ui, view: &BridgeView) {
        ui.set_map_title(view.title.as_str().into());
        ui.set_load_state(view.load_state.name().into());
        ui.set_error_message(view.load_state.error_message().unwrap_or("").into());
        ui.set_offers_retry(view.load_state.offers_retry());

        ui.set_hide_all(view.map_state.hide_all);
        ui.set_show_counts(view.map_state.show_counts);
        ui.set_show_labels(view.map_state.show_labels);
        ui.set_bookmark_follow(view.map_state.bookmark_follow);
        ui.set_my_collected(view.map_state.my_collected);

        let chips: Vec<ToggleChipData> = view
            .chips
            .iter()
            .map(|chip| ToggleChipData {
                id: chip.id.as_str().into(),
                label: chip.label.as_str().into(),
                kind: chip.kind.as_str().into(),
                active: chip.active,
            })
            .collect();
        ui.set_chips(ModelRc::new(VecModel::from(chips)));
    }
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "map_host fatal error");
        process::exit(1);
    }
}

// stdout carries protocol frames, so logs go to stderr.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), BridgeError> {
    let config = BridgeConfig::from_env()?;
    let integration = Integration::load(&config.manifest_path)?;

    info!(
        sid = %config.sid,
        manifest = %config.manifest_path.display(),
        toggles = integration.toggles.len(),
        "starting map host"
    );

    map_bridge_runtime::run::<MapHost>(config, integration)
}
