//! Host-defined toggles and their derived activation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::snapshot::CategorySnapshot;

/// Which category set of the control surface a toggle's values live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleKind {
    Parent,
    Sub,
    Item,
}

impl ToggleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToggleKind::Parent => "parent",
            ToggleKind::Sub => "sub",
            ToggleKind::Item => "item",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleDefinition {
    pub id: String,
    pub label: String,
    pub kind: ToggleKind,
    pub values: Vec<String>,
}

impl ToggleDefinition {
    /// A toggle reads as active only when every one of its atomic fields is on.
    pub fn is_satisfied_by(&self, snapshot: &CategorySnapshot) -> bool {
        let set = snapshot.set_for(self.kind);
        self.values.iter().all(|value| set.contains(value))
    }

    /// Naming convention for umbrellas: `items` covers `items-key`,
    /// `items-potions`, and so on.
    pub fn is_narrower_than(&self, umbrella: &ToggleDefinition, separator: &str) -> bool {
        self.id
            .strip_prefix(umbrella.id.as_str())
            .and_then(|rest| rest.strip_prefix(separator))
            .is_some_and(|suffix| !suffix.is_empty())
    }
}

/// Every definition that sits under `umbrella` by the naming convention.
pub fn narrower_toggles<'a>(
    definitions: &'a [ToggleDefinition],
    umbrella: &'a ToggleDefinition,
    separator: &'a str,
) -> impl Iterator<Item = &'a ToggleDefinition> + 'a {
    definitions
        .iter()
        .filter(move |candidate| candidate.is_narrower_than(umbrella, separator))
}

/// Per-toggle activation as the host currently believes it.
///
/// An empty record means "nothing known yet": the next snapshot re-derives it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleActivation {
    entries: BTreeMap<String, bool>,
}

impl ToggleActivation {
    pub fn derive(definitions: &[ToggleDefinition], snapshot: &CategorySnapshot) -> Self {
        let entries = definitions
            .iter()
            .map(|definition| (definition.id.clone(), definition.is_satisfied_by(snapshot)))
            .collect();

        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<bool> {
        self.entries.get(id).copied()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.get(id).unwrap_or(false)
    }

    pub fn set(&mut self, id: impl Into<String>, active: bool) {
        self.entries.insert(id.into(), active);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops the records of every definition whose kind is in `kinds`.
    pub fn clear_kinds(&mut self, definitions: &[ToggleDefinition], kinds: &[ToggleKind]) {
        for definition in definitions {
            if kinds.contains(&definition.kind) {
                self.entries.remove(&definition.id);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(id, active)| (id.as_str(), *active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(id: &str, kind: ToggleKind, values: &[&str]) -> ToggleDefinition {
        ToggleDefinition {
            id: id.to_string(),
            label: id.to_string(),
            kind,
            values: values.iter().map(|value| value.to_string()).collect(),
        }
    }

    fn parents(values: &[&str]) -> CategorySnapshot {
        CategorySnapshot {
            parent_categories: values.iter().map(|value| value.to_string()).collect(),
            ..CategorySnapshot::default()
        }
    }

    #[test]
    fn derivation_requires_every_value() {
        let definitions = vec![def("pair", ToggleKind::Parent, &["a", "b"])];

        let partial = ToggleActivation::derive(&definitions, &parents(&["a"]));
        assert_eq!(partial.get("pair"), Some(false));

        let full = ToggleActivation::derive(&definitions, &parents(&["a", "b"]));
        assert_eq!(full.get("pair"), Some(true));
    }

    #[test]
    fn derivation_reads_the_set_matching_the_kind() {
        let definitions = vec![
            def("p", ToggleKind::Parent, &["x"]),
            def("s", ToggleKind::Sub, &["x"]),
        ];
        let snapshot = CategorySnapshot {
            sub_categories: ["x".to_string()].into_iter().collect(),
            ..CategorySnapshot::default()
        };

        let activation = ToggleActivation::derive(&definitions, &snapshot);
        assert!(!activation.is_active("p"));
        assert!(activation.is_active("s"));
    }

    #[test]
    fn narrower_toggles_follow_the_separator_convention() {
        let definitions = vec![
            def("items", ToggleKind::Item, &["k1", "p1"]),
            def("items-key", ToggleKind::Item, &["k1"]),
            def("items-potions", ToggleKind::Item, &["p1"]),
            def("itemsextra", ToggleKind::Item, &["e1"]),
            def("items-", ToggleKind::Item, &["e2"]),
        ];

        let narrower: Vec<&str> = narrower_toggles(&definitions, &definitions[0], "-")
            .map(|definition| definition.id.as_str())
            .collect();

        assert_eq!(narrower, vec!["items-key", "items-potions"]);
    }

    #[test]
    fn clear_kinds_keeps_other_records() {
        let definitions = vec![
            def("p", ToggleKind::Parent, &["a"]),
            def("s", ToggleKind::Sub, &["b"]),
            def("i", ToggleKind::Item, &["c"]),
        ];
        let mut activation = ToggleActivation::default();
        activation.set("p", true);
        activation.set("s", true);
        activation.set("i", true);

        activation.clear_kinds(&definitions, &[ToggleKind::Parent, ToggleKind::Sub]);

        assert_eq!(activation.get("p"), None);
        assert_eq!(activation.get("s"), None);
        assert_eq!(activation.get("i"), Some(true));
    }
}
