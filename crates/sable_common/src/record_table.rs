//! Append-only, key-sorted tables of fixed-arity integer records.
//!
//! A record table stores tuples of the form `(key, field_1 … field_k)` where
//! the key is a sortable `u64` and every field is a `u32`. Tables are built
//! incrementally in non-decreasing key order (no sorting ever happens) and
//! then frozen into an immutable [`RecordTable`] that supports O(log n)
//! floor lookups and O(1) positional access.

use serde::{Deserialize, Serialize};

/// Error returned when a record is appended with a key smaller than the
/// previously appended key.
///
/// Appends must arrive in non-decreasing key order; a violation indicates a
/// bug in the producer, not bad user input, and is never recovered from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("record key {given:#018x} is smaller than the last appended key {last:#018x}")]
pub struct OutOfOrderAppend {
    /// The key of the most recently appended record.
    pub last: u64,
    /// The out-of-order key that was rejected.
    pub given: u64,
}

/// Incremental builder for a [`RecordTable`].
///
/// Accepts records in non-decreasing key order. Appending a record whose key
/// equals the last appended key overwrites that record in place (the latest
/// value wins), so the frozen table always holds strictly increasing keys.
#[derive(Debug)]
pub struct RecordTableBuilder {
    arity: usize,
    keys: Vec<u64>,
    fields: Vec<u32>,
}

impl RecordTableBuilder {
    /// Creates an empty builder for records with `arity` fields per record.
    pub fn new(arity: usize) -> Self {
        Self {
            arity,
            keys: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Returns the number of records appended so far.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no records have been appended.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Appends a record.
    ///
    /// Requires `key` to be greater than or equal to the last appended key.
    /// An equal key overwrites the previous record's fields in place.
    ///
    /// # Panics
    ///
    /// Panics if `fields.len()` does not match the builder's arity.
    pub fn append(&mut self, key: u64, fields: &[u32]) -> Result<(), OutOfOrderAppend> {
        assert_eq!(
            fields.len(),
            self.arity,
            "record has {} fields, table arity is {}",
            fields.len(),
            self.arity
        );
        match self.keys.last().copied() {
            Some(last) if key < last => Err(OutOfOrderAppend { last, given: key }),
            Some(last) if key == last => {
                let start = self.fields.len() - self.arity;
                self.fields[start..].copy_from_slice(fields);
                Ok(())
            }
            _ => {
                self.keys.push(key);
                self.fields.extend_from_slice(fields);
                Ok(())
            }
        }
    }

    /// Freezes the builder into an immutable [`RecordTable`].
    pub fn build(self) -> RecordTable {
        RecordTable {
            arity: self.arity as u32,
            keys: self.keys,
            fields: self.fields,
        }
    }
}

/// A frozen, key-sorted table of fixed-arity records.
///
/// Keys are strictly increasing and never change after construction, so any
/// number of readers may query the table concurrently. Storage is flat: one
/// `Vec<u64>` of keys and one `Vec<u32>` holding `arity` fields per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTable {
    arity: u32,
    keys: Vec<u64>,
    fields: Vec<u32>,
}

impl RecordTable {
    /// Creates an empty table with the given arity.
    pub fn empty(arity: usize) -> Self {
        RecordTableBuilder::new(arity).build()
    }

    /// Returns the number of fields per record.
    pub fn arity(&self) -> usize {
        self.arity as usize
    }

    /// Returns the number of records in the table.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the key of the record at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn key(&self, index: usize) -> u64 {
        self.keys[index]
    }

    /// Returns the fields of the record at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn fields(&self, index: usize) -> &[u32] {
        let start = index * self.arity as usize;
        &self.fields[start..start + self.arity as usize]
    }

    /// Returns the index of the record with the greatest key `<= key`, or
    /// `None` if `key` precedes every record in the table.
    pub fn floor_index(&self, key: u64) -> Option<usize> {
        self.keys.partition_point(|&k| k <= key).checked_sub(1)
    }

    /// Iterates over `(key, fields)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[u32])> {
        (0..self.len()).map(|i| (self.key(i), self.fields(i)))
    }

    /// Returns `true` if the field storage length is consistent with the
    /// key count and arity. Used to validate untrusted deserialized tables.
    pub fn is_well_formed(&self) -> bool {
        self.fields.len() == self.keys.len() * self.arity as usize
    }
}
