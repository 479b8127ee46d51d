//! The frozen debug-information aggregate and point lookups.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DebugInfoError;
use crate::iter::SourceLocationIterator;
use crate::layer::{LayerKind, MappingLayer};
use crate::location::GeneratedLocation;
use crate::strings::{known, StringId, StringTable};

/// A call-site fact: which method calls which at a generated location.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CallSite {
    /// Method-signature id of the calling method.
    pub caller: StringId,
    /// Method-signature id of the called method.
    pub callee: StringId,
}

/// All source facts in effect at one generated location.
///
/// `None` (and an empty `variables` list) means the fact is unknown at the
/// location — no record exists at or before it. Callers must treat unknown
/// distinctly from any real value.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct FactBundle {
    /// The location the facts apply to.
    pub location: GeneratedLocation,
    /// Source-file name id.
    pub file: Option<StringId>,
    /// Source line number.
    pub line: Option<u32>,
    /// Owning-class name id.
    pub class: Option<StringId>,
    /// Owning-method signature id.
    pub method: Option<StringId>,
    /// Innermost call site.
    pub call_site: Option<CallSite>,
    /// `true` if a statement starts exactly at this location.
    pub statement_boundary: bool,
    /// Live local variables as `(slot, name id)`, ascending by slot.
    pub variables: Vec<(u32, StringId)>,
}

/// Frozen debug information for one compiled output.
///
/// Owns every mapping layer and entity-name table produced by a
/// [`DebugInformationBuilder`](crate::DebugInformationBuilder). Immutable
/// and lock-free: any number of threads may run lookups and iterators
/// concurrently. Recompilation produces a fresh instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugInformation {
    pub(crate) file_layer: MappingLayer,
    pub(crate) line_layer: MappingLayer,
    pub(crate) class_layer: MappingLayer,
    pub(crate) method_layer: MappingLayer,
    pub(crate) call_site_layer: MappingLayer,
    pub(crate) statement_layer: MappingLayer,
    pub(crate) variable_layers: BTreeMap<u32, MappingLayer>,

    pub(crate) file_names: StringTable,
    pub(crate) class_names: StringTable,
    pub(crate) method_names: StringTable,
    pub(crate) variable_names: StringTable,
}

impl DebugInformation {
    /// Returns the layer for a single-table fact kind.
    ///
    /// Returns `None` for [`LayerKind::Variable`]: variable layers are
    /// per-slot, see [`variable_layers`](Self::variable_layers).
    pub fn layer(&self, kind: LayerKind) -> Option<&MappingLayer> {
        match kind {
            LayerKind::File => Some(&self.file_layer),
            LayerKind::Line => Some(&self.line_layer),
            LayerKind::Class => Some(&self.class_layer),
            LayerKind::Method => Some(&self.method_layer),
            LayerKind::CallSite => Some(&self.call_site_layer),
            LayerKind::Statement => Some(&self.statement_layer),
            LayerKind::Variable => None,
        }
    }

    /// Iterates over the per-slot variable layers, ascending by slot.
    pub fn variable_layers(&self) -> impl Iterator<Item = (u32, &MappingLayer)> {
        self.variable_layers.iter().map(|(&slot, layer)| (slot, layer))
    }

    /// Resolves a source-file name id.
    pub fn file_name(&self, id: StringId) -> Option<&str> {
        self.file_names.resolve(id)
    }

    /// Resolves a class name id.
    pub fn class_name(&self, id: StringId) -> Option<&str> {
        self.class_names.resolve(id)
    }

    /// Resolves a method-signature id.
    pub fn method_name(&self, id: StringId) -> Option<&str> {
        self.method_names.resolve(id)
    }

    /// Resolves a variable name id.
    pub fn variable_name(&self, id: StringId) -> Option<&str> {
        self.variable_names.resolve(id)
    }

    /// Resolves every fact in effect at `location`.
    ///
    /// Each layer is floor-searched independently (O(log n) per layer), so
    /// the result does not depend on any traversal order and the call is
    /// safe to repeat from any thread. The statement flag is reported only
    /// when a boundary sits exactly at `location`.
    pub fn lookup(&self, location: GeneratedLocation) -> FactBundle {
        let variables = self
            .variable_layers()
            .filter_map(|(slot, layer)| {
                let (_, fields) = layer.floor(location)?;
                Some((slot, known(fields[0])?))
            })
            .collect();

        FactBundle {
            location,
            file: self
                .file_layer
                .floor(location)
                .and_then(|(_, f)| known(f[0])),
            line: self.line_layer.floor(location).map(|(_, f)| f[0]),
            class: self
                .class_layer
                .floor(location)
                .and_then(|(_, f)| known(f[0])),
            method: self
                .method_layer
                .floor(location)
                .and_then(|(_, f)| known(f[0])),
            call_site: self.call_site_layer.floor(location).map(|(_, f)| CallSite {
                caller: StringId::from_raw(f[0]),
                callee: StringId::from_raw(f[1]),
            }),
            statement_boundary: self
                .statement_layer
                .floor(location)
                .is_some_and(|(at, _)| at == location),
            variables,
        }
    }

    /// Creates a merge-join iterator over the change points of the selected
    /// layers.
    ///
    /// Selecting [`LayerKind::Variable`] includes every slot's table. The
    /// iterator is single-pass; construct a new one per traversal.
    pub fn iterate(&self, kinds: &[LayerKind]) -> SourceLocationIterator<'_> {
        SourceLocationIterator::new(self, kinds)
    }

    /// Encodes this aggregate into a compact binary blob.
    pub fn serialize(&self) -> Result<Vec<u8>, DebugInfoError> {
        crate::codec::serialize(self)
    }

    /// Decodes an aggregate previously produced by
    /// [`serialize`](Self::serialize).
    ///
    /// Key monotonicity is trusted, but the structure is validated; any
    /// malformation fails with [`DebugInfoError::CorruptDebugData`].
    pub fn deserialize(bytes: &[u8]) -> Result<DebugInformation, DebugInfoError> {
        crate::codec::deserialize(bytes)
    }
}
