use serde::{Deserialize, Serialize};

use crate::host::{StatId, VariableKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatGrant {
    pub stat: StatId,
    pub amount: i32,
}

/// One named record: a journal note or a proficiency. The level fields are
/// meaningful only for proficiencies; journal entries leave them at their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub max_level: u32,
    /// Host counter backing the entry's current level.
    #[serde(default)]
    pub level_key: Option<VariableKey>,
    /// Cost to advance from level `i` to `i + 1`. Missing slots cost 1.
    #[serde(default)]
    pub price_table: Vec<u32>,
    /// Stat grants applied when the matching level is bought, indexed by level.
    #[serde(default)]
    pub stat_grants: Vec<Vec<StatGrant>>,
}

impl Entry {
    pub fn note(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            image: None,
            read: false,
            max_level: 0,
            level_key: None,
            price_table: Vec::new(),
            stat_grants: Vec::new(),
        }
    }

    pub fn price_at(&self, level: u32) -> u32 {
        self.price_table.get(level as usize).copied().unwrap_or(1)
    }

    pub fn grants_at(&self, level: u32) -> &[StatGrant] {
        self.stat_grants
            .get(level as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Which string field of an [`Entry`] a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Title,
    Body,
}

impl EntryField {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "title" => Some(Self::Title),
            "body" | "text" => Some(Self::Body),
            _ => None,
        }
    }
}

/// A named, title-sorted grouping of entries.
///
/// Entry ids carry no uniqueness constraint; duplicates shadow each other and
/// every lookup takes the first match. All operations are linear scans, and
/// mutations re-sort, which is fine at the handful-of-entries scale this is
/// used at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    entries: Vec<Entry>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, entry: Entry) {
        self.entries.push(entry);
        self.resort();
    }

    pub fn exists(&self, id: &str) -> bool {
        self.find_by_id(id).is_some()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Overwrites a field of the first entry matching `id`. Returns whether a
    /// match was found; a miss is a no-op.
    pub fn update(&mut self, id: &str, field: EntryField, value: &str) -> bool {
        let Some(entry) = self.find_by_id_mut(id) else {
            return false;
        };
        match field {
            EntryField::Title => entry.title = value.to_string(),
            EntryField::Body => entry.body = value.to_string(),
        }
        self.resort();
        true
    }

    /// Concatenates `value` onto a field of the first entry matching `id`.
    pub fn append(&mut self, id: &str, field: EntryField, value: &str) -> bool {
        let Some(entry) = self.find_by_id_mut(id) else {
            return false;
        };
        match field {
            EntryField::Title => entry.title.push_str(value),
            EntryField::Body => entry.body.push_str(value),
        }
        self.resort();
        true
    }

    /// Removes the first entry matching `id`. Returns whether one was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let Some(index) = self.entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        self.entries.remove(index);
        self.resort();
        true
    }

    pub fn mark_read(&mut self, id: &str) -> bool {
        let Some(entry) = self.find_by_id_mut(id) else {
            return false;
        };
        entry.read = true;
        true
    }

    fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    fn resort(&mut self) {
        self.entries.sort_by(|a, b| a.title.cmp(&b.title));
    }
}
