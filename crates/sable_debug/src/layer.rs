//! Sparse mapping layers, one per fact kind.
//!
//! A layer stores only the generated locations at which its fact *changes*
//! (delta encoding); a recorded value stays in effect for every later
//! location until a newer record overrides it. Layers are built during the
//! single compile pass and frozen into immutable [`MappingLayer`]s.

use sable_common::{OutOfOrderAppend, RecordTable, RecordTableBuilder};
use serde::{Deserialize, Serialize};

use crate::location::GeneratedLocation;

/// The kinds of facts tracked by the mapping layers.
///
/// Used to select layers when constructing a
/// [`SourceLocationIterator`](crate::SourceLocationIterator); selecting
/// [`LayerKind::Variable`] includes the per-slot table of every local slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum LayerKind {
    /// Source-file changes (fields: file-name id).
    File,
    /// Source-line changes (fields: line number).
    Line,
    /// Owning-class changes (fields: class-name id).
    Class,
    /// Owning-method changes (fields: method-signature id).
    Method,
    /// Call-site changes (fields: caller-method id, callee-method id).
    CallSite,
    /// Statement-boundary markers (fields: constant 1).
    Statement,
    /// Local-variable name changes, one table per slot (fields: name id).
    Variable,
}

impl LayerKind {
    /// Returns the number of fields each record of this kind carries.
    pub fn arity(self) -> usize {
        match self {
            LayerKind::CallSite => 2,
            _ => 1,
        }
    }
}

/// Builder-side layer: a record-table builder plus the value currently in
/// effect, so repeated identical values are never stored.
#[derive(Debug)]
pub(crate) struct LayerBuilder {
    table: RecordTableBuilder,
    current: Option<Vec<u32>>,
}

impl LayerBuilder {
    pub(crate) fn new(kind: LayerKind) -> Self {
        Self {
            table: RecordTableBuilder::new(kind.arity()),
            current: None,
        }
    }

    /// Appends a record unless `fields` equals the value already in effect.
    pub(crate) fn record(
        &mut self,
        location: GeneratedLocation,
        fields: &[u32],
    ) -> Result<(), OutOfOrderAppend> {
        if self.current.as_deref() == Some(fields) {
            return Ok(());
        }
        self.table.append(location.key(), fields)?;
        self.current = Some(fields.to_vec());
        Ok(())
    }

    pub(crate) fn build(self, kind: LayerKind) -> MappingLayer {
        MappingLayer {
            kind,
            table: self.table.build(),
        }
    }
}

/// A frozen mapping layer: a named record table whose keys are packed
/// [`GeneratedLocation`]s.
///
/// Before the first record — or when the table is empty — every fact of the
/// layer is unknown; floor queries report that as `None` rather than a
/// default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingLayer {
    kind: LayerKind,
    table: RecordTable,
}

impl MappingLayer {
    /// Creates a frozen layer from an already-built record table.
    pub fn new(kind: LayerKind, table: RecordTable) -> Self {
        Self { kind, table }
    }

    /// Creates an empty frozen layer of the given kind.
    pub fn empty(kind: LayerKind) -> Self {
        Self {
            kind,
            table: RecordTable::empty(kind.arity()),
        }
    }

    /// Returns the fact kind this layer tracks.
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Returns the underlying record table.
    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    /// Returns the record in effect at `location`: the one with the greatest
    /// key `<=` the location, as `(record location, fields)`. `None` means
    /// the fact is unknown at this location.
    pub fn floor(&self, location: GeneratedLocation) -> Option<(GeneratedLocation, &[u32])> {
        let index = self.table.floor_index(location.key())?;
        Some((
            GeneratedLocation::from_key(self.table.key(index)),
            self.table.fields(index),
        ))
    }
}
