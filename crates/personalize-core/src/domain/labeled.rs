//! Insertion-ordered label maps.
//!
//! Intent probabilities, likelihoods, priors and reference vectors are all
//! keyed by intent label. Arg-max ties are broken by first encounter, so the
//! document order of the JSON the map came from has to survive.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// Map from intent label to `V`, iterated in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMap<V> {
    entries: Vec<(String, V)>,
}

/// Probability (or weight) per intent label.
pub type Distribution = LabeledMap<f64>;

impl<V> Default for LabeledMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> LabeledMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced label keeps its original position.
    pub fn insert(&mut self, label: impl Into<String>, value: V) -> Option<V> {
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((label, value));
                None
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl Distribution {
    /// Sum of all values.
    pub fn total(&self) -> f64 {
        self.values().sum()
    }

    /// Highest-valued label; the earliest label wins ties.
    pub fn argmax(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (label, &value) in self.iter() {
            match best {
                Some((_, b)) if value <= b => {}
                _ => best = Some((label, value)),
            }
        }
        best
    }

    /// `chosen` carries `confidence`; the rest of the mass is spread evenly
    /// over the remaining `labels`.
    pub fn concentrated<'a>(
        labels: impl IntoIterator<Item = &'a str>,
        chosen: &'a str,
        confidence: f64,
    ) -> Distribution {
        let mut all: Vec<&str> = Vec::new();
        for label in labels {
            if !all.contains(&label) {
                all.push(label);
            }
        }
        if !all.contains(&chosen) {
            all.insert(0, chosen);
        }

        let others = all.len() - 1;
        let chosen_mass = if others == 0 { 1.0 } else { confidence };
        let share = if others == 0 {
            0.0
        } else {
            (1.0 - confidence).max(0.0) / others as f64
        };

        all.into_iter()
            .map(|label| {
                let p = if label == chosen { chosen_mass } else { share };
                (label.to_string(), p)
            })
            .collect()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for LabeledMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = LabeledMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for LabeledMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

struct LabeledMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for LabeledMapVisitor<V> {
    type Value = LabeledMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map keyed by intent label")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = LabeledMap::new();
        while let Some((label, value)) = access.next_entry::<String, V>()? {
            map.insert(label, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for LabeledMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(LabeledMapVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_document_order() {
        let d: Distribution =
            serde_json::from_str(r#"{"PROFESSIONAL": 0.4, "GAMING": 0.3, "BUDGET": 0.2}"#).unwrap();
        let labels: Vec<_> = d.labels().collect();
        assert_eq!(labels, vec!["PROFESSIONAL", "GAMING", "BUDGET"]);
        assert_eq!(
            serde_json::to_string(&d).unwrap(),
            r#"{"PROFESSIONAL":0.4,"GAMING":0.3,"BUDGET":0.2}"#
        );
    }

    #[test]
    fn test_argmax_ties_go_to_first_label() {
        let d: Distribution = [("BUDGET", 0.4), ("GAMING", 0.4), ("DEFAULT", 0.2)]
            .into_iter()
            .collect();
        assert_eq!(d.argmax(), Some(("BUDGET", 0.4)));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut d = Distribution::new();
        d.insert("A", 0.1);
        d.insert("B", 0.2);
        assert_eq!(d.insert("A", 0.5), Some(0.1));
        assert_eq!(d.labels().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(d.get("A"), Some(&0.5));
    }

    #[test]
    fn test_concentrated_sums_to_one() {
        let d = Distribution::concentrated(
            ["GAMING", "PROFESSIONAL", "BUDGET", "DEFAULT"],
            "PROFESSIONAL",
            0.72,
        );
        assert!((d.total() - 1.0).abs() < 1e-12);
        assert_eq!(d.get("PROFESSIONAL"), Some(&0.72));
        assert!((d.get("GAMING").unwrap() - 0.28 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_concentrated_unknown_label_is_prepended() {
        let d = Distribution::concentrated(["GAMING"], "BUDGET", 1.0);
        assert_eq!(d.labels().collect::<Vec<_>>(), vec!["BUDGET", "GAMING"]);
        assert_eq!(d.get("GAMING"), Some(&0.0));
    }

    #[test]
    fn test_concentrated_single_label_takes_all_mass() {
        let d = Distribution::concentrated(std::iter::empty(), "DEFAULT", 0.5);
        assert_eq!(d.get("DEFAULT"), Some(&1.0));
    }
}
