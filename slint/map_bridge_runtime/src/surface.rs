//! Selectors describing the control surface of one embedded map integration.
//!
//! The schema is fixed for the lifetime of an integration. It is serialized
//! verbatim into the bootstrap and stabilizer scripts, so field names here are
//! also the property names the scripts read.

use serde::{Deserialize, Serialize};

use crate::snapshot::MapFlag;
use crate::toggle::ToggleKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldGroup {
    pub selector: String,
    pub id_attribute: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagSelectors {
    pub hide_all: String,
    pub show_counts: String,
    pub show_labels: String,
    pub bookmark_follow: String,
    pub my_collected: String,
}

impl FlagSelectors {
    pub fn get(&self, flag: MapFlag) -> &str {
        match flag {
            MapFlag::HideAll => &self.hide_all,
            MapFlag::ShowCounts => &self.show_counts,
            MapFlag::ShowLabels => &self.show_labels,
            MapFlag::BookmarkFollow => &self.bookmark_follow,
            MapFlag::MyCollected => &self.my_collected,
        }
    }
}

impl Default for FlagSelectors {
    fn default() -> Self {
        Self {
            hide_all: "#hide-all".to_string(),
            show_counts: "#show-counts".to_string(),
            show_labels: "#show-labels".to_string(),
            bookmark_follow: "#bookmark-follow".to_string(),
            my_collected: "#show-found".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceSchema {
    /// Root element of the control surface; its presence means "ready".
    ///
    /// The change listener is attached here, so every flag and field input
    /// must sit inside this element for its writes to produce a snapshot.
    pub root: String,
    pub change_event: String,
    /// Attribute set on the root once the change listener is attached.
    pub bound_marker: String,
    pub flags: FlagSelectors,
    pub parent: FieldGroup,
    pub sub: FieldGroup,
    pub item: FieldGroup,
    pub reset_collected: String,
    pub map: String,
    pub canvas: String,
    pub overlays: Vec<String>,
}

impl SurfaceSchema {
    pub fn group(&self, kind: ToggleKind) -> &FieldGroup {
        match kind {
            ToggleKind::Parent => &self.parent,
            ToggleKind::Sub => &self.sub,
            ToggleKind::Item => &self.item,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("surface.root", self.root.as_str()),
            ("surface.change_event", self.change_event.as_str()),
            ("surface.bound_marker", self.bound_marker.as_str()),
            ("surface.map", self.map.as_str()),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{name} must not be empty"));
            }
        }

        for kind in [ToggleKind::Parent, ToggleKind::Sub, ToggleKind::Item] {
            if self.group(kind).selector.trim().is_empty() {
                return Err(format!("surface.{}.selector must not be empty", kind.as_str()));
            }
        }

        for flag in MapFlag::ALL {
            if self.flags.get(flag).trim().is_empty() {
                return Err(format!("surface.flags.{} must not be empty", flag.key()));
            }
        }

        Ok(())
    }
}

impl Default for SurfaceSchema {
    fn default() -> Self {
        Self {
            root: "#filters-panel".to_string(),
            change_event: "change".to_string(),
            bound_marker: "data-map-bridge-bound".to_string(),
            flags: FlagSelectors::default(),
            parent: FieldGroup {
                selector: "input.category-group-checkbox".to_string(),
                id_attribute: "data-group-id".to_string(),
            },
            sub: FieldGroup {
                selector: "input.category-checkbox".to_string(),
                id_attribute: "data-category-id".to_string(),
            },
            item: FieldGroup {
                selector: "input.location-checkbox".to_string(),
                id_attribute: "data-location-id".to_string(),
            },
            reset_collected: "#reset-found".to_string(),
            map: "#map".to_string(),
            canvas: "#map canvas".to_string(),
            overlays: default_overlays(),
        }
    }
}

fn default_overlays() -> Vec<String> {
    [
        "ins.adsbygoogle",
        "[id^='google_ads']",
        "[id*='-ad-']",
        "[class*='ad-container']",
        "[class*='advert']",
        "iframe[src*='doubleclick']",
        "iframe[src*='ads']",
        "[class*='sticky-footer']",
        "[class*='modal']",
        "[class*='overlay']",
        "[class*='popup']",
        "[id*='consent']",
        "[class*='consent']",
        "[class*='cookie']",
        "#onetrust-banner-sdk",
        "[class*='newsletter']",
        "[class*='video-player']",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schema_is_valid() {
        assert!(SurfaceSchema::default().validate().is_ok());
    }

    #[test]
    fn partial_schema_fills_defaults() {
        let schema: SurfaceSchema =
            serde_json::from_str(r##"{"root":"#controls","overlays":[]}"##).expect("decode schema");

        assert_eq!(schema.root, "#controls");
        assert!(schema.overlays.is_empty());
        assert_eq!(schema.change_event, "change");
        assert_eq!(schema.group(ToggleKind::Item).id_attribute, "data-location-id");
    }

    #[test]
    fn blank_selectors_are_rejected() {
        let schema = SurfaceSchema {
            root: "  ".to_string(),
            ..SurfaceSchema::default()
        };
        assert!(schema.validate().is_err());

        let mut schema = SurfaceSchema::default();
        schema.flags.my_collected = String::new();
        let err = schema.validate().expect_err("blank flag selector");
        assert!(err.contains("myCollected"));

        let mut schema = SurfaceSchema::default();
        schema.sub.selector = " ".to_string();
        let err = schema.validate().expect_err("blank group selector");
        assert_eq!(err, "surface.sub.selector must not be empty");
    }

    #[test]
    fn flag_selectors_serialize_with_flag_keys() {
        let value = serde_json::to_value(FlagSelectors::default()).expect("encode flags");
        for flag in MapFlag::ALL {
            assert!(value.get(flag.key()).is_some(), "missing {}", flag.key());
        }
    }
}
