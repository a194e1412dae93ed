//! Cross-reference evidence lookup.
//!
//! At the boundary the index is one flat JSON object whose keys are either
//! accession numbers or legacy `FORM|YYYY-MM-DD` composites. Internally the
//! two key shapes are split so the accession path is a hash lookup and only
//! the legacy path scans.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::CapturedFact;
use crate::normalize::{date_neighbors, normalize_accession, normalize_form};

/// Separator between form label and date in a legacy key.
pub const LEGACY_KEY_SEPARATOR: char = '|';

#[derive(Debug, Clone, PartialEq)]
struct LegacyKey {
    form: String,
    date: String,
    entry: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossReferenceIndex {
    /// Keys in insertion order with their facts.
    entries: Vec<(String, Vec<CapturedFact>)>,
    by_key: HashMap<String, usize>,
    /// Legacy composite keys, pre-split and form-normalized, insertion order.
    by_form_date: Vec<LegacyKey>,
}

impl CrossReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the facts stored under `key`. A replaced key keeps
    /// its original scan position.
    pub fn insert(&mut self, key: impl Into<String>, facts: Vec<CapturedFact>) {
        let key = key.into();
        if let Some(&idx) = self.by_key.get(&key) {
            self.entries[idx].1 = facts;
            return;
        }

        let idx = self.entries.len();
        if let Some((form, date)) = key.split_once(LEGACY_KEY_SEPARATOR) {
            self.by_form_date.push(LegacyKey {
                form: normalize_form(form),
                date: date.trim().to_string(),
                entry: idx,
            });
        }
        self.by_key.insert(key.clone(), idx);
        self.entries.push((key, facts));
    }

    pub fn get(&self, key: &str) -> Option<&[CapturedFact]> {
        self.by_key
            .get(key)
            .map(|&idx| self.entries[idx].1.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CapturedFact])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Find evidence for a filing. Tries, in order: the raw accession as a
    /// key, the normalized accession, then the first legacy key whose form
    /// matches and whose date lies within one day of `iso_date`.
    ///
    /// `None` means no evidence at all, as opposed to an empty list stored
    /// under a matching key.
    pub fn resolve(
        &self,
        accession_id: &str,
        form_label: &str,
        iso_date: &str,
    ) -> Option<&[CapturedFact]> {
        if let Some(facts) = self.get(accession_id) {
            log::debug!("crossref: raw key hit for {accession_id}");
            return Some(facts);
        }

        let normalized = normalize_accession(accession_id);
        if let Some(facts) = self.get(&normalized) {
            log::debug!("crossref: normalized key hit for {accession_id}");
            return Some(facts);
        }

        if self.by_form_date.is_empty() {
            return None;
        }
        let window = date_neighbors(iso_date);
        let form = normalize_form(form_label);
        self.by_form_date
            .iter()
            .find(|k| k.form == form && window.contains(&k.date))
            .map(|k| {
                log::debug!(
                    "crossref: legacy key '{}' hit for {accession_id}",
                    self.entries[k.entry].0
                );
                self.entries[k.entry].1.as_slice()
            })
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<CapturedFact>)> for CrossReferenceIndex {
    fn from_iter<I: IntoIterator<Item = (K, Vec<CapturedFact>)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (key, facts) in iter {
            index.insert(key, facts);
        }
        index
    }
}

impl Serialize for CrossReferenceIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, facts) in &self.entries {
            map.serialize_entry(key, facts)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CrossReferenceIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IndexVisitor;

        impl<'de> Visitor<'de> for IndexVisitor {
            type Value = CrossReferenceIndex;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of lookup key to captured facts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut index = CrossReferenceIndex::new();
                while let Some((key, facts)) = access.next_entry::<String, Vec<CapturedFact>>()? {
                    index.insert(key, facts);
                }
                Ok(index)
            }
        }

        deserializer.deserialize_map(IndexVisitor)
    }
}
