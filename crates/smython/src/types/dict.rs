//! Dict and set types: insertion-ordered, with hashability enforced at the
//! boundary.
//!
//! Keys are full runtime values. `Value`'s `Hash` impl is total (a Rust trait
//! requirement), so hashability is checked *before* any table operation:
//! mutable composites raise `TypeError: unhashable type: '…'` and never enter
//! a table.

use indexmap::{IndexMap, IndexSet};

use crate::{exceptions::RunResult, value::Value};

type Entries = IndexMap<Value, Value, ahash::RandomState>;

/// A mutable mapping preserving insertion order.
#[derive(Debug, Default)]
pub(crate) struct Dict {
    entries: Entries,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &Value) -> RunResult<Option<Value>> {
        key.check_hashable()?;
        Ok(self.entries.get(key).cloned())
    }

    pub fn insert(&mut self, key: Value, value: Value) -> RunResult<()> {
        key.check_hashable()?;
        self.entries.insert(key, value);
        Ok(())
    }

    /// Removes `key`, preserving the order of the remaining entries.
    /// Removing an absent key is not an error.
    pub fn remove(&mut self, key: &Value) -> RunResult<Option<Value>> {
        key.check_hashable()?;
        Ok(self.entries.shift_remove(key))
    }

    pub fn contains(&self, key: &Value) -> RunResult<bool> {
        key.check_hashable()?;
        Ok(self.entries.contains_key(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter()
    }

    /// Shallow copy.
    pub fn copied(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl PartialEq for Dict {
    /// Structural equality: same keys mapping to equal values, order ignored.
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.entries.get(k) == Some(v))
    }
}

/// A mutable unordered collection (iteration still follows insertion order,
/// keeping evaluation deterministic).
#[derive(Debug, Default)]
pub(crate) struct Set {
    entries: IndexSet<Value, ahash::RandomState>,
}

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn insert(&mut self, value: Value) -> RunResult<()> {
        value.check_hashable()?;
        self.entries.insert(value);
        Ok(())
    }

    pub fn contains(&self, value: &Value) -> RunResult<bool> {
        value.check_hashable()?;
        Ok(self.entries.contains(value))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter()
    }

    pub fn copied(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl PartialEq for Set {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().all(|v| other.entries.contains(v))
    }
}
