//! Snapshots pushed by the embedded document and their host-side decoding.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::toggle::ToggleKind;

/// The five scalar display flags of the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapFlag {
    HideAll,
    ShowCounts,
    ShowLabels,
    BookmarkFollow,
    MyCollected,
}

impl MapFlag {
    pub const ALL: [MapFlag; 5] = [
        MapFlag::HideAll,
        MapFlag::ShowCounts,
        MapFlag::ShowLabels,
        MapFlag::BookmarkFollow,
        MapFlag::MyCollected,
    ];

    /// Key used on the wire and inside the injected scripts.
    pub fn key(self) -> &'static str {
        match self {
            MapFlag::HideAll => "hideAll",
            MapFlag::ShowCounts => "showCounts",
            MapFlag::ShowLabels => "showLabels",
            MapFlag::BookmarkFollow => "bookmarkFollow",
            MapFlag::MyCollected => "myCollected",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapState {
    pub hide_all: bool,
    pub show_counts: bool,
    pub show_labels: bool,
    pub bookmark_follow: bool,
    pub my_collected: bool,
}

impl MapState {
    pub fn get(&self, flag: MapFlag) -> bool {
        match flag {
            MapFlag::HideAll => self.hide_all,
            MapFlag::ShowCounts => self.show_counts,
            MapFlag::ShowLabels => self.show_labels,
            MapFlag::BookmarkFollow => self.bookmark_follow,
            MapFlag::MyCollected => self.my_collected,
        }
    }

    pub fn set(&mut self, flag: MapFlag, value: bool) {
        let slot = match flag {
            MapFlag::HideAll => &mut self.hide_all,
            MapFlag::ShowCounts => &mut self.show_counts,
            MapFlag::ShowLabels => &mut self.show_labels,
            MapFlag::BookmarkFollow => &mut self.bookmark_follow,
            MapFlag::MyCollected => &mut self.my_collected,
        };
        *slot = value;
    }
}

/// Every atomic field of the control surface that is currently on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySnapshot {
    pub parent_categories: BTreeSet<String>,
    pub sub_categories: BTreeSet<String>,
    pub items: BTreeSet<String>,
}

impl CategorySnapshot {
    pub fn set_for(&self, kind: ToggleKind) -> &BTreeSet<String> {
        match kind {
            ToggleKind::Parent => &self.parent_categories,
            ToggleKind::Sub => &self.sub_categories,
            ToggleKind::Item => &self.items,
        }
    }

    pub fn set_for_mut(&mut self, kind: ToggleKind) -> &mut BTreeSet<String> {
        match kind {
            ToggleKind::Parent => &mut self.parent_categories,
            ToggleKind::Sub => &mut self.sub_categories,
            ToggleKind::Item => &mut self.items,
        }
    }
}

/// One full read of the control surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(flatten)]
    pub map: MapState,
    #[serde(flatten)]
    pub categories: CategorySnapshot,
}

/// Messages the embedded document posts to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BridgeMessage {
    #[serde(rename = "MAP_STATE")]
    MapState(StateSnapshot),
}

/// Decodes a raw posted message. Anything that is not a well-formed
/// `MAP_STATE` message is channel noise and yields `None`.
pub fn parse_message(raw: &str) -> Option<StateSnapshot> {
    match serde_json::from_str::<BridgeMessage>(raw) {
        Ok(BridgeMessage::MapState(snapshot)) => Some(snapshot),
        Err(err) => {
            debug!(error = %err, len = raw.len(), "ignoring unrecognised embedded message");
            None
        }
    }
}
