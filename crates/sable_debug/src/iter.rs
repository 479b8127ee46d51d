//! Merge-join traversal over the change points of several mapping layers.

use std::collections::BTreeMap;
use std::mem;

use crate::error::DebugInfoError;
use crate::info::{CallSite, DebugInformation, FactBundle};
use crate::layer::{LayerKind, MappingLayer};
use crate::location::GeneratedLocation;
use crate::strings::{known, StringId};

/// One independently advancing position within a single layer's table.
struct Cursor<'a> {
    kind: LayerKind,
    /// Local slot of a variable layer; unused for other kinds.
    slot: u32,
    layer: &'a MappingLayer,
    index: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<u64> {
        let table = self.layer.table();
        (self.index < table.len()).then(|| table.key(self.index))
    }
}

enum State {
    Positioned(FactBundle),
    Exhausted,
}

/// Single-pass cursor yielding, in ascending order, every generated location
/// at which any selected layer changes, together with the value of every
/// selected layer in effect there (carry-forward).
///
/// At each step the cursors holding the minimum key all advance together:
/// equal keys across layers are one logical change point, not several. The
/// iterator starts positioned on the first change point, or exhausted when
/// all selected layers are empty; it is not restartable.
pub struct SourceLocationIterator<'a> {
    info: &'a DebugInformation,
    cursors: Vec<Cursor<'a>>,
    /// Carry-forward liveness per variable slot; cleared slots are removed.
    live_vars: BTreeMap<u32, StringId>,
    state: State,
}

impl<'a> SourceLocationIterator<'a> {
    pub(crate) fn new(info: &'a DebugInformation, kinds: &[LayerKind]) -> Self {
        let mut seen: Vec<LayerKind> = Vec::new();
        let mut cursors = Vec::new();
        for &kind in kinds {
            if seen.contains(&kind) {
                continue;
            }
            seen.push(kind);
            if kind == LayerKind::Variable {
                for (slot, layer) in info.variable_layers() {
                    cursors.push(Cursor {
                        kind,
                        slot,
                        layer,
                        index: 0,
                    });
                }
            } else if let Some(layer) = info.layer(kind) {
                cursors.push(Cursor {
                    kind,
                    slot: 0,
                    layer,
                    index: 0,
                });
            }
        }

        let mut iter = Self {
            info,
            cursors,
            live_vars: BTreeMap::new(),
            state: State::Exhausted,
        };
        iter.step(FactBundle::default());
        iter
    }

    /// Moves to the next change point, carrying `fact` forward.
    fn step(&mut self, mut fact: FactBundle) {
        let Some(min) = self.cursors.iter().filter_map(Cursor::peek).min() else {
            self.state = State::Exhausted;
            return;
        };

        fact.location = GeneratedLocation::from_key(min);
        // Boundaries are per-location events, never carried forward.
        fact.statement_boundary = false;

        for cursor in &mut self.cursors {
            if cursor.peek() != Some(min) {
                continue;
            }
            let fields = cursor.layer.table().fields(cursor.index);
            match cursor.kind {
                LayerKind::File => fact.file = known(fields[0]),
                LayerKind::Line => fact.line = Some(fields[0]),
                LayerKind::Class => fact.class = known(fields[0]),
                LayerKind::Method => fact.method = known(fields[0]),
                LayerKind::CallSite => {
                    fact.call_site = Some(CallSite {
                        caller: StringId::from_raw(fields[0]),
                        callee: StringId::from_raw(fields[1]),
                    })
                }
                LayerKind::Statement => fact.statement_boundary = true,
                LayerKind::Variable => match known(fields[0]) {
                    Some(name) => {
                        self.live_vars.insert(cursor.slot, name);
                    }
                    None => {
                        self.live_vars.remove(&cursor.slot);
                    }
                },
            }
            cursor.index += 1;
        }

        fact.variables = self.live_vars.iter().map(|(&s, &n)| (s, n)).collect();
        self.state = State::Positioned(fact);
    }

    /// Returns `true` once the iterator has passed the last change point.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, State::Exhausted)
    }

    /// Advances to the next change point.
    pub fn advance(&mut self) -> Result<(), DebugInfoError> {
        match mem::replace(&mut self.state, State::Exhausted) {
            State::Positioned(fact) => {
                self.step(fact);
                Ok(())
            }
            State::Exhausted => Err(DebugInfoError::IteratorExhausted),
        }
    }

    /// Returns the facts at the current change point.
    pub fn current(&self) -> Result<&FactBundle, DebugInfoError> {
        match &self.state {
            State::Positioned(fact) => Ok(fact),
            State::Exhausted => Err(DebugInfoError::IteratorExhausted),
        }
    }

    /// Returns the current change point's location.
    pub fn location(&self) -> Result<GeneratedLocation, DebugInfoError> {
        self.current().map(|fact| fact.location)
    }

    /// Resolves the current file id to its name, `None` when unknown.
    pub fn file_name(&self) -> Result<Option<&'a str>, DebugInfoError> {
        let fact = self.current()?;
        Ok(fact.file.and_then(|id| self.info.file_name(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DebugInformationBuilder;

    fn loc(line: u32, column: u32) -> GeneratedLocation {
        GeneratedLocation::new(line, column)
    }

    /// File records at 0:0 and 10:0; line records at 0:0, 5:0, and 10:0.
    fn two_layer_info() -> (DebugInformation, StringId, StringId) {
        let mut b = DebugInformationBuilder::new();
        let f1 = b.file_name_id("One.java").unwrap();
        let f2 = b.file_name_id("Two.java").unwrap();
        b.record_file(loc(0, 0), f1).unwrap();
        b.record_line(loc(0, 0), 5).unwrap();
        b.record_line(loc(5, 0), 6).unwrap();
        b.record_file(loc(10, 0), f2).unwrap();
        b.record_line(loc(10, 0), 7).unwrap();
        (b.freeze().unwrap(), f1, f2)
    }

    #[test]
    fn carry_forward_across_line_only_change() {
        let (info, f1, f2) = two_layer_info();
        let mut iter = info.iterate(&[LayerKind::File, LayerKind::Line]);

        let fact = iter.current().unwrap();
        assert_eq!(fact.location, loc(0, 0));
        assert_eq!(fact.file, Some(f1));
        assert_eq!(fact.line, Some(5));

        iter.advance().unwrap();
        let fact = iter.current().unwrap();
        assert_eq!(fact.location, loc(5, 0));
        assert_eq!(fact.file, Some(f1), "file value carries across a line-only change");
        assert_eq!(fact.line, Some(6));

        iter.advance().unwrap();
        let fact = iter.current().unwrap();
        assert_eq!(fact.location, loc(10, 0));
        assert_eq!(fact.file, Some(f2));
        assert_eq!(fact.line, Some(7));

        iter.advance().unwrap();
        assert!(iter.is_exhausted());
    }

    #[test]
    fn yields_each_distinct_key_once_in_order() {
        let (info, _, _) = two_layer_info();
        let mut iter = info.iterate(&[LayerKind::File, LayerKind::Line]);

        let mut keys = Vec::new();
        while !iter.is_exhausted() {
            keys.push(iter.location().unwrap().key());
            iter.advance().unwrap();
        }
        // Three distinct keys across both layers: 0:0, 5:0, 10:0.
        assert_eq!(keys.len(), 3);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn exhausted_iterator_rejects_access() {
        let (info, _, _) = two_layer_info();
        let mut iter = info.iterate(&[LayerKind::File, LayerKind::Line]);
        for _ in 0..3 {
            iter.advance().unwrap();
        }
        assert!(iter.is_exhausted());
        assert!(matches!(iter.advance(), Err(DebugInfoError::IteratorExhausted)));
        assert!(matches!(iter.current(), Err(DebugInfoError::IteratorExhausted)));
        assert!(matches!(iter.location(), Err(DebugInfoError::IteratorExhausted)));
    }

    #[test]
    fn empty_layers_start_exhausted() {
        let info = DebugInformationBuilder::new().freeze().unwrap();
        let iter = info.iterate(&[LayerKind::File, LayerKind::Line, LayerKind::Variable]);
        assert!(iter.is_exhausted());
    }

    #[test]
    fn unselected_layers_are_ignored() {
        let (info, _, _) = two_layer_info();
        let mut iter = info.iterate(&[LayerKind::Line]);
        let mut count = 0;
        while !iter.is_exhausted() {
            assert_eq!(iter.current().unwrap().file, None);
            count += 1;
            iter.advance().unwrap();
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn duplicate_selection_does_not_duplicate_cursors() {
        let (info, _, _) = two_layer_info();
        let mut iter = info.iterate(&[LayerKind::Line, LayerKind::Line]);
        let mut count = 0;
        while !iter.is_exhausted() {
            count += 1;
            iter.advance().unwrap();
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn statement_flag_fires_only_at_its_change_points() {
        let mut b = DebugInformationBuilder::new();
        b.record_line(loc(0, 0), 1).unwrap();
        b.record_statement_boundary(loc(0, 0)).unwrap();
        b.record_line(loc(4, 0), 2).unwrap();
        let info = b.freeze().unwrap();

        let mut iter = info.iterate(&[LayerKind::Line, LayerKind::Statement]);
        assert!(iter.current().unwrap().statement_boundary);
        iter.advance().unwrap();
        let fact = iter.current().unwrap();
        assert_eq!(fact.location, loc(4, 0));
        assert!(!fact.statement_boundary, "boundaries do not carry forward");
    }

    #[test]
    fn variable_liveness_evolves_across_change_points() {
        let mut b = DebugInformationBuilder::new();
        let x = b.variable_name_id("x").unwrap();
        let y = b.variable_name_id("y").unwrap();
        b.record_variable(loc(0, 0), 0, x).unwrap();
        b.record_variable(loc(2, 0), 1, y).unwrap();
        b.record_variable(loc(6, 0), 0, StringId::UNKNOWN).unwrap();
        let info = b.freeze().unwrap();

        let mut iter = info.iterate(&[LayerKind::Variable]);
        assert_eq!(iter.current().unwrap().variables, vec![(0, x)]);
        iter.advance().unwrap();
        assert_eq!(iter.current().unwrap().variables, vec![(0, x), (1, y)]);
        iter.advance().unwrap();
        assert_eq!(iter.current().unwrap().variables, vec![(1, y)]);
        iter.advance().unwrap();
        assert!(iter.is_exhausted());
    }

    #[test]
    fn file_name_resolves_through_aggregate() {
        let (info, _, _) = two_layer_info();
        let iter = info.iterate(&[LayerKind::File]);
        assert_eq!(iter.file_name().unwrap(), Some("One.java"));
    }
}
