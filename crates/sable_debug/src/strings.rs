//! Deduplicated entity-name tables mapping small ids to strings.
//!
//! File names, class names, method signatures, and variable names are
//! referenced from the mapping layers by [`StringId`]. During building each
//! table deduplicates through a [`lasso`] interner; on freeze it becomes a
//! plain indexable [`StringTable`] that is part of the serialized aggregate.

use lasso::{Key, Rodeo};
use serde::{Deserialize, Serialize};

/// An id into one entity-name table.
///
/// Ids are dense indices starting at zero, except for [`StringId::UNKNOWN`],
/// which marks the absence of a fact (before its first record, or after an
/// explicit clear) and never resolves to a string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct StringId(u32);

impl StringId {
    /// The explicit "no value" sentinel. Never a valid table index.
    pub const UNKNOWN: StringId = StringId(u32::MAX);

    /// Creates a `StringId` from a raw `u32` value.
    ///
    /// Primarily intended for deserialization and testing; in normal use ids
    /// come from [`StringTableBuilder::get_or_intern`].
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32` value of this id.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns `true` if this is the [`StringId::UNKNOWN`] sentinel.
    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }
}

// SAFETY: `StringId` wraps a `u32` which is always a valid `usize` on 32-bit
// and 64-bit platforms. `try_from_usize` rejects values that don't fit in
// `u32` as well as `u32::MAX`, which is reserved for the UNKNOWN sentinel.
unsafe impl Key for StringId {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int)
            .ok()
            .filter(|&raw| raw != u32::MAX)
            .map(StringId)
    }
}

/// Converts a stored id field to an `Option`, mapping the sentinel to `None`.
pub(crate) fn known(raw: u32) -> Option<StringId> {
    let id = StringId::from_raw(raw);
    (!id.is_unknown()).then_some(id)
}

/// Builder-side deduplicating name table backed by [`lasso::Rodeo`].
pub struct StringTableBuilder {
    rodeo: Rodeo<StringId>,
}

impl StringTableBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            rodeo: Rodeo::new(),
        }
    }

    /// Interns a name, returning its id. Re-interning an already known name
    /// returns the existing id without allocating.
    pub fn get_or_intern(&mut self, name: &str) -> StringId {
        self.rodeo.get_or_intern(name)
    }

    /// Returns the number of distinct names interned so far.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns `true` if no names have been interned.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }

    /// Freezes the builder into an immutable [`StringTable`].
    pub fn build(self) -> StringTable {
        let mut entries = vec![String::new(); self.rodeo.len()];
        for (id, name) in self.rodeo.iter() {
            entries[id.into_usize()] = name.to_owned();
        }
        StringTable { entries }
    }
}

impl Default for StringTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A frozen entity-name table: dense ids to strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringTable {
    entries: Vec<String>,
}

impl StringTable {
    /// Returns the number of names in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no names.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves an id to its name.
    ///
    /// Returns `None` for [`StringId::UNKNOWN`] and for ids outside the
    /// table, so callers see absence rather than a guessed default.
    pub fn resolve(&self, id: StringId) -> Option<&str> {
        if id.is_unknown() {
            return None;
        }
        self.entries.get(id.into_usize()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_resolve_roundtrip() {
        let mut b = StringTableBuilder::new();
        let id = b.get_or_intern("Main.js");
        let table = b.build();
        assert_eq!(table.resolve(id), Some("Main.js"));
    }

    #[test]
    fn same_name_same_id() {
        let mut b = StringTableBuilder::new();
        let a = b.get_or_intern("java.lang.String");
        let c = b.get_or_intern("java.lang.String");
        assert_eq!(a, c);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn ids_are_dense_from_zero() {
        let mut b = StringTableBuilder::new();
        let a = b.get_or_intern("a");
        let c = b.get_or_intern("b");
        assert_eq!(a.as_raw(), 0);
        assert_eq!(c.as_raw(), 1);
    }

    #[test]
    fn unknown_never_resolves() {
        let mut b = StringTableBuilder::new();
        b.get_or_intern("x");
        let table = b.build();
        assert_eq!(table.resolve(StringId::UNKNOWN), None);
        assert_eq!(table.resolve(StringId::from_raw(99)), None);
    }

    #[test]
    fn build_preserves_id_order() {
        let mut b = StringTableBuilder::new();
        let ids: Vec<StringId> = ["one", "two", "three"]
            .iter()
            .map(|s| b.get_or_intern(s))
            .collect();
        let table = b.build();
        assert_eq!(table.len(), 3);
        assert_eq!(table.resolve(ids[0]), Some("one"));
        assert_eq!(table.resolve(ids[1]), Some("two"));
        assert_eq!(table.resolve(ids[2]), Some("three"));
    }

    #[test]
    fn serde_roundtrip() {
        let mut b = StringTableBuilder::new();
        let id = b.get_or_intern("Widget.render()");
        let table = b.build();
        let json = serde_json::to_string(&table).unwrap();
        let back: StringTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.resolve(id), Some("Widget.render()"));
    }
}
