use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Geometry, MarkerId};

/// Text attached to a marker, with the geometry it had when the entry was made
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub text: String,
    pub geometry: Geometry,
}

impl Entry {
    pub fn new(text: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            text: text.into(),
            geometry,
        }
    }
}

/// The id -> (text, geometry) mapping that gets exported
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotations {
    entries: BTreeMap<MarkerId, Entry>,
    pub updated_at: DateTime<Utc>,
}

impl Annotations {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: MarkerId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: MarkerId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    /// Text for `id`, empty when there is no entry
    pub fn text(&self, id: MarkerId) -> &str {
        self.entries.get(&id).map(|e| e.text.as_str()).unwrap_or("")
    }

    /// Insert or replace an entry. Entries for `MarkerId::NONE` are ignored.
    pub fn insert(&mut self, id: MarkerId, entry: Entry) -> bool {
        if id.is_none() {
            return false;
        }
        self.entries.insert(id, entry);
        self.updated_at = Utc::now();
        true
    }

    /// Create an empty entry for `id` unless one already exists
    pub fn ensure(&mut self, id: MarkerId, geometry: Geometry) -> bool {
        if id.is_none() || self.entries.contains_key(&id) {
            return false;
        }
        self.insert(id, Entry::new(String::new(), geometry))
    }

    pub fn set_text(&mut self, id: MarkerId, text: impl Into<String>) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.text = text.into();
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: MarkerId) -> Option<Entry> {
        let removed = self.entries.remove(&id);
        if removed.is_some() {
            self.updated_at = Utc::now();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.updated_at = Utc::now();
    }

    /// Entries in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (MarkerId, &Entry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn max_id(&self) -> Option<MarkerId> {
        self.entries.keys().next_back().copied()
    }
}

impl Default for Annotations {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<(MarkerId, Entry)> for Annotations {
    fn from_iter<I: IntoIterator<Item = (MarkerId, Entry)>>(iter: I) -> Self {
        let mut annotations = Annotations::new();
        for (id, entry) in iter {
            annotations.insert(id, entry);
        }
        annotations
    }
}
