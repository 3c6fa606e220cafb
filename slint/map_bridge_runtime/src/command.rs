//! Command channel: typed control-surface mutations rendered as guarded scripts.
//!
//! Every script looks up the bridge object installed by the bootstrap script
//! and returns early when it is missing, so commands issued before the
//! embedded document is ready are dropped rather than raising. Field writes
//! always re-fire the surface's change event, even when the value is
//! unchanged, which guarantees a snapshot echo for every command.

use crate::script::{Script, ScriptKind, js_literal};
use crate::snapshot::MapFlag;
use crate::toggle::ToggleKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetFlag { flag: MapFlag, value: bool },
    ResetMyCollected,
    SetFields {
        kind: ToggleKind,
        ids: Vec<String>,
        value: bool,
    },
    SetAll { kind: ToggleKind, value: bool },
}

impl Command {
    pub fn set_hide_all(value: bool) -> Self {
        Command::SetFlag {
            flag: MapFlag::HideAll,
            value,
        }
    }

    pub fn set_labels_visible(value: bool) -> Self {
        Command::SetFlag {
            flag: MapFlag::ShowLabels,
            value,
        }
    }

    pub fn set_counts_visible(value: bool) -> Self {
        Command::SetFlag {
            flag: MapFlag::ShowCounts,
            value,
        }
    }

    pub fn set_bookmark_follow(value: bool) -> Self {
        Command::SetFlag {
            flag: MapFlag::BookmarkFollow,
            value,
        }
    }

    pub fn set_my_collected(value: bool) -> Self {
        Command::SetFlag {
            flag: MapFlag::MyCollected,
            value,
        }
    }

    pub fn reset_my_collected() -> Self {
        Command::ResetMyCollected
    }

    pub fn set_fields<I, S>(kind: ToggleKind, ids: I, value: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Command::SetFields {
            kind,
            ids: ids.into_iter().map(Into::into).collect(),
            value,
        }
    }

    pub fn set_parent_category(id: impl Into<String>, value: bool) -> Self {
        Self::set_fields(ToggleKind::Parent, [id.into()], value)
    }

    pub fn set_parent_categories<I, S>(ids: I, value: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::set_fields(ToggleKind::Parent, ids, value)
    }

    pub fn set_sub_category(id: impl Into<String>, value: bool) -> Self {
        Self::set_fields(ToggleKind::Sub, [id.into()], value)
    }

    pub fn set_sub_categories<I, S>(ids: I, value: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::set_fields(ToggleKind::Sub, ids, value)
    }

    pub fn set_item(id: impl Into<String>, value: bool) -> Self {
        Self::set_fields(ToggleKind::Item, [id.into()], value)
    }

    pub fn set_items<I, S>(ids: I, value: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::set_fields(ToggleKind::Item, ids, value)
    }

    pub fn set_all_parents(value: bool) -> Self {
        Command::SetAll {
            kind: ToggleKind::Parent,
            value,
        }
    }

    pub fn set_all_sub_categories(value: bool) -> Self {
        Command::SetAll {
            kind: ToggleKind::Sub,
            value,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::SetFlag { flag, .. } => match flag {
                MapFlag::HideAll => "setHideAll",
                MapFlag::ShowCounts => "setCountsVisible",
                MapFlag::ShowLabels => "setLabelsVisible",
                MapFlag::BookmarkFollow => "setBookmarkFollow",
                MapFlag::MyCollected => "setMyCollected",
            },
            Command::ResetMyCollected => "resetMyCollected",
            Command::SetFields { kind, .. } => match kind {
                ToggleKind::Parent => "setParentCategories",
                ToggleKind::Sub => "setSubCategories",
                ToggleKind::Item => "setItems",
            },
            Command::SetAll { kind, .. } => match kind {
                ToggleKind::Parent => "setAllParents",
                ToggleKind::Sub => "setAllSubCategories",
                ToggleKind::Item => "setAllItems",
            },
        }
    }

    fn bridge_call(&self) -> String {
        match self {
            Command::SetFlag { flag, value } => {
                format!("bridge.setFlag({}, {value});", js_literal(flag.key()))
            }
            Command::ResetMyCollected => "bridge.resetCollected();".to_string(),
            Command::SetFields { kind, ids, value } => format!(
                "bridge.setFields({}, {}, {value});",
                js_literal(kind.as_str()),
                js_literal(ids.clone())
            ),
            Command::SetAll { kind, value } => {
                format!("bridge.setAll({}, {value});", js_literal(kind.as_str()))
            }
        }
    }
}

/// Renders commands against the bridge object exported under `bridge_name`.
#[derive(Debug, Clone)]
pub struct CommandChannel {
    bridge_name: String,
}

impl CommandChannel {
    pub fn new(bridge_name: impl Into<String>) -> Self {
        Self {
            bridge_name: bridge_name.into(),
        }
    }

    pub fn script(&self, command: Command) -> Script {
        let source = format!(
            "(function () {{\n  var bridge = window[{name}];\n  if (!bridge || !bridge.installed) {{\n    return;\n  }}\n  {call}\n}})();\ntrue;\n",
            name = js_literal(self.bridge_name.as_str()),
            call = command.bridge_call(),
        );

        Script {
            kind: ScriptKind::Command(command),
            source,
        }
    }
}
