use crate::extensions::option::OptionExt;

use serde::de::{Error, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Formatter;

/// How the keys of an action are emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PedalMode {
    /// One after another.
    Sequence,
    /// All together, held as a chord.
    Combo,
}

/// Press/release semantics of an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PedalBehaviour {
    /// Fire once per physical press.
    Oneshot,
    /// Keys stay down until the pedal is pressed again.
    Toggle,
    /// Keys stay down while the pedal is held.
    Hold,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PedalKeysError {
    #[error("A pedal action needs at least one key.")]
    Empty,
}

/// Ordered, non-empty key names of one action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PedalKeys(Vec<String>);

impl PedalKeys {
    pub fn new<I, S>(keys: I) -> Result<PedalKeys, PedalKeysError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        Option::when(!keys.is_empty(), || PedalKeys(keys)).to_result(|| PedalKeysError::Empty)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

struct PedalKeysVisitor;

impl<'de> Visitor<'de> for PedalKeysVisitor {
    type Value = PedalKeys;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("Expecting a non-empty list of key names.")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut keys = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(key) = seq.next_element::<String>()? {
            keys.push(key);
        }
        PedalKeys::new(keys).map_err(A::Error::custom)
    }
}

impl<'de> Deserialize<'de> for PedalKeys {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(PedalKeysVisitor)
    }
}

/// Behaviour bound to a single pedal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PedalAction {
    pub mode: PedalMode,
    pub behaviour: PedalBehaviour,
    pub keys: PedalKeys,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PedalId(pub String);

impl From<&str> for PedalId {
    fn from(id: &str) -> Self {
        PedalId(id.to_owned())
    }
}

impl std::fmt::Display for PedalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Complete pedal configuration. A write replaces whatever the backend holds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PedalMapping(BTreeMap<PedalId, PedalAction>);

impl PedalMapping {
    pub fn new() -> PedalMapping {
        PedalMapping::default()
    }

    pub fn insert(
        &mut self,
        pedal: impl Into<PedalId>,
        action: PedalAction,
    ) -> Option<PedalAction> {
        self.0.insert(pedal.into(), action)
    }

    pub fn get(&self, pedal: &PedalId) -> Option<&PedalAction> {
        self.0.get(pedal)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PedalId, &PedalAction)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lists every `(pedal, key)` pair whose key is outside `valid`.
    /// Advisory only; the backend stays the authority on key names.
    pub fn unknown_keys<'a>(&'a self, valid: &ValidKeys) -> Vec<(&'a PedalId, &'a str)> {
        self.0
            .iter()
            .flat_map(|(pedal, action)| action.keys.iter().map(move |key| (pedal, key)))
            .filter(|(_, key)| !valid.contains(key))
            .collect()
    }
}

impl FromIterator<(PedalId, PedalAction)> for PedalMapping {
    fn from_iter<T: IntoIterator<Item = (PedalId, PedalAction)>>(iter: T) -> Self {
        PedalMapping(iter.into_iter().collect())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ValidKeysPayload {
    Bare(Vec<String>),
    Wrapped { value: Vec<String> },
}

/// Key vocabulary the backend accepts in [`PedalAction::keys`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidKeys(BTreeSet<String>);

impl<'de> Deserialize<'de> for ValidKeys {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match ValidKeysPayload::deserialize(deserializer)? {
            ValidKeysPayload::Bare(keys) | ValidKeysPayload::Wrapped { value: keys } => {
                Ok(ValidKeys(keys.into_iter().collect()))
            }
        }
    }
}

impl ValidKeys {
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ValidKeys {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        ValidKeys(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn action(mode: PedalMode, behaviour: PedalBehaviour, keys: &[&str]) -> PedalAction {
        PedalAction {
            mode,
            behaviour,
            keys: PedalKeys::new(keys.iter().copied()).unwrap(),
        }
    }

    #[test]
    fn combo_and_sequence_keep_their_tags() {
        let combo = action(PedalMode::Combo, PedalBehaviour::Hold, &["ctrl", "c"]);
        let sequence = action(PedalMode::Sequence, PedalBehaviour::Oneshot, &["ctrl", "c"]);

        assert_ne!(combo, sequence);
        assert_eq!(
            serde_json::to_value(&combo).unwrap(),
            json!({"mode": "combo", "behaviour": "hold", "keys": ["ctrl", "c"]})
        );
        assert_eq!(
            serde_json::to_value(&sequence).unwrap(),
            json!({"mode": "sequence", "behaviour": "oneshot", "keys": ["ctrl", "c"]})
        );
    }

    #[test]
    fn mapping_decodes_backend_payload() {
        let payload = json!({
            "1": {"mode": "sequence", "keys": ["ctrl", "shift", "escape"], "behaviour": "oneshot"},
            "2": {"mode": "combo", "keys": ["alt", "tab"], "behaviour": "toggle"}
        });
        let mapping: PedalMapping = serde_json::from_value(payload.clone()).unwrap();

        assert_eq!(mapping.len(), 2);
        let second = mapping.get(&PedalId::from("2")).unwrap();
        assert_eq!(second.mode, PedalMode::Combo);
        assert_eq!(second.behaviour, PedalBehaviour::Toggle);
        assert_eq!(serde_json::to_value(&mapping).unwrap(), payload);
    }

    #[test]
    fn key_order_is_preserved() {
        let decoded: PedalAction = serde_json::from_value(json!({
            "mode": "sequence", "behaviour": "oneshot", "keys": ["z", "a", "m"]
        }))
        .unwrap();
        assert_eq!(decoded.keys.as_slice(), ["z", "a", "m"]);
    }

    #[test]
    fn empty_keys_are_rejected() {
        assert_eq!(PedalKeys::new(Vec::<String>::new()), Err(PedalKeysError::Empty));

        let decoded = serde_json::from_value::<PedalAction>(json!({
            "mode": "combo", "behaviour": "hold", "keys": []
        }));
        assert!(decoded.is_err());
    }

    #[test]
    fn unknown_enum_values_are_rejected() {
        let bad_mode = serde_json::from_value::<PedalAction>(json!({
            "mode": "chord", "behaviour": "hold", "keys": ["a"]
        }));
        let bad_behaviour = serde_json::from_value::<PedalAction>(json!({
            "mode": "combo", "behaviour": "latch", "keys": ["a"]
        }));
        assert!(bad_mode.is_err());
        assert!(bad_behaviour.is_err());
    }

    #[test]
    fn valid_keys_accept_bare_and_wrapped_lists() {
        let bare: ValidKeys = serde_json::from_value(json!(["a", "ctrl"])).unwrap();
        let wrapped: ValidKeys = serde_json::from_value(json!({"value": ["ctrl", "a"]})).unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare.len(), 2);
        assert!(bare.contains("ctrl"));
        assert!(!bare.contains("hyper"));
    }

    #[test]
    fn mapping_rebuilds_from_its_entries() {
        let mut mapping = PedalMapping::new();
        mapping.insert("b", action(PedalMode::Combo, PedalBehaviour::Hold, &["alt"]));
        mapping.insert("a", action(PedalMode::Sequence, PedalBehaviour::Oneshot, &["x", "y"]));

        let ids: Vec<&PedalId> = mapping.iter().map(|(pedal, _)| pedal).collect();
        assert_eq!(ids, vec![&PedalId::from("a"), &PedalId::from("b")]);

        let rebuilt: PedalMapping = mapping
            .iter()
            .map(|(pedal, action)| (pedal.clone(), action.clone()))
            .collect();
        assert_eq!(rebuilt, mapping);
    }

    #[test]
    fn unknown_keys_lists_only_missing_names() {
        let mut mapping = PedalMapping::new();
        mapping.insert("1", action(PedalMode::Combo, PedalBehaviour::Oneshot, &["ctrl", "c"]));
        mapping.insert("2", action(PedalMode::Sequence, PedalBehaviour::Toggle, &["hyper", "a"]));
        let valid: ValidKeys = ["ctrl", "c", "a"].into_iter().collect();

        let unknown = mapping.unknown_keys(&valid);
        assert_eq!(unknown, vec![(&PedalId::from("2"), "hyper")]);
    }
}
