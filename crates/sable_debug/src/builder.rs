//! Single-pass accumulation and freezing of debug information.

use std::collections::BTreeMap;
use std::mem;

use sable_common::{OutOfOrderAppend, RecordTableBuilder};

use crate::error::DebugInfoError;
use crate::info::DebugInformation;
use crate::layer::{LayerBuilder, LayerKind, MappingLayer};
use crate::location::GeneratedLocation;
use crate::strings::{StringId, StringTableBuilder};

/// Accumulates debug facts while the backend emits generated output.
///
/// The backend emits output sequentially, so every recording call must pass
/// a location greater than or equal to the location of *any* previous
/// recording call on this builder; a smaller location fails with
/// [`DebugInfoError::OutOfOrderAppend`]. Repeated identical fact values cost
/// nothing — each layer stores only change points.
///
/// [`freeze`](DebugInformationBuilder::freeze) ends the recording phase
/// exactly once; any recording or interning call after it (and any second
/// freeze) fails with [`DebugInfoError::FrozenMutation`].
pub struct DebugInformationBuilder {
    last_location: Option<GeneratedLocation>,
    frozen: bool,

    files: LayerBuilder,
    lines: LayerBuilder,
    classes: LayerBuilder,
    methods: LayerBuilder,
    call_sites: LayerBuilder,
    statements: RecordTableBuilder,
    variables: BTreeMap<u32, LayerBuilder>,

    file_names: StringTableBuilder,
    class_names: StringTableBuilder,
    method_names: StringTableBuilder,
    variable_names: StringTableBuilder,
}

impl DebugInformationBuilder {
    /// Creates an empty builder with all layers and name tables empty.
    pub fn new() -> Self {
        Self {
            last_location: None,
            frozen: false,
            files: LayerBuilder::new(LayerKind::File),
            lines: LayerBuilder::new(LayerKind::Line),
            classes: LayerBuilder::new(LayerKind::Class),
            methods: LayerBuilder::new(LayerKind::Method),
            call_sites: LayerBuilder::new(LayerKind::CallSite),
            statements: RecordTableBuilder::new(LayerKind::Statement.arity()),
            variables: BTreeMap::new(),
            file_names: StringTableBuilder::new(),
            class_names: StringTableBuilder::new(),
            method_names: StringTableBuilder::new(),
            variable_names: StringTableBuilder::new(),
        }
    }

    fn check_not_frozen(&self) -> Result<(), DebugInfoError> {
        if self.frozen {
            return Err(DebugInfoError::FrozenMutation);
        }
        Ok(())
    }

    /// Enforces the global monotonic-location contract shared by all
    /// recording calls.
    fn advance_to(&mut self, location: GeneratedLocation) -> Result<(), DebugInfoError> {
        self.check_not_frozen()?;
        if let Some(last) = self.last_location {
            if location < last {
                return Err(OutOfOrderAppend {
                    last: last.key(),
                    given: location.key(),
                }
                .into());
            }
        }
        self.last_location = Some(location);
        Ok(())
    }

    /// Interns a source-file name, returning its id.
    pub fn file_name_id(&mut self, name: &str) -> Result<StringId, DebugInfoError> {
        self.check_not_frozen()?;
        Ok(self.file_names.get_or_intern(name))
    }

    /// Interns a fully qualified class name, returning its id.
    pub fn class_name_id(&mut self, name: &str) -> Result<StringId, DebugInfoError> {
        self.check_not_frozen()?;
        Ok(self.class_names.get_or_intern(name))
    }

    /// Interns a method signature, returning its id.
    pub fn method_name_id(&mut self, name: &str) -> Result<StringId, DebugInfoError> {
        self.check_not_frozen()?;
        Ok(self.method_names.get_or_intern(name))
    }

    /// Interns a variable name, returning its id.
    pub fn variable_name_id(&mut self, name: &str) -> Result<StringId, DebugInfoError> {
        self.check_not_frozen()?;
        Ok(self.variable_names.get_or_intern(name))
    }

    /// Records that output from `location` onward comes from source file
    /// `file`.
    pub fn record_file(
        &mut self,
        location: GeneratedLocation,
        file: StringId,
    ) -> Result<(), DebugInfoError> {
        self.advance_to(location)?;
        self.files.record(location, &[file.as_raw()])?;
        Ok(())
    }

    /// Records that output from `location` onward comes from source line
    /// `line`.
    pub fn record_line(
        &mut self,
        location: GeneratedLocation,
        line: u32,
    ) -> Result<(), DebugInfoError> {
        self.advance_to(location)?;
        self.lines.record(location, &[line])?;
        Ok(())
    }

    /// Records that output from `location` onward belongs to class `class`.
    pub fn record_class(
        &mut self,
        location: GeneratedLocation,
        class: StringId,
    ) -> Result<(), DebugInfoError> {
        self.advance_to(location)?;
        self.classes.record(location, &[class.as_raw()])?;
        Ok(())
    }

    /// Records that output from `location` onward belongs to method `method`.
    pub fn record_method(
        &mut self,
        location: GeneratedLocation,
        method: StringId,
    ) -> Result<(), DebugInfoError> {
        self.advance_to(location)?;
        self.methods.record(location, &[method.as_raw()])?;
        Ok(())
    }

    /// Records that output from `location` onward sits at a call from
    /// `caller` into `callee`.
    pub fn record_call_site(
        &mut self,
        location: GeneratedLocation,
        caller: StringId,
        callee: StringId,
    ) -> Result<(), DebugInfoError> {
        self.advance_to(location)?;
        self.call_sites
            .record(location, &[caller.as_raw(), callee.as_raw()])?;
        Ok(())
    }

    /// Marks `location` as the start of a source statement.
    pub fn record_statement_boundary(
        &mut self,
        location: GeneratedLocation,
    ) -> Result<(), DebugInfoError> {
        self.advance_to(location)?;
        // Every boundary is an event at its exact location, so this layer
        // stores every record rather than delta-encoding.
        self.statements.append(location.key(), &[1])?;
        Ok(())
    }

    /// Records that from `location` onward the local slot `slot` holds the
    /// variable named `name`.
    ///
    /// Recording [`StringId::UNKNOWN`] as the name ends the liveness of the
    /// slot's previous name without starting a new one.
    pub fn record_variable(
        &mut self,
        location: GeneratedLocation,
        slot: u32,
        name: StringId,
    ) -> Result<(), DebugInfoError> {
        self.advance_to(location)?;
        self.variables
            .entry(slot)
            .or_insert_with(|| LayerBuilder::new(LayerKind::Variable))
            .record(location, &[name.as_raw()])?;
        Ok(())
    }

    /// Freezes all layers and name tables into an immutable
    /// [`DebugInformation`].
    ///
    /// After this call the builder accepts nothing further; a second
    /// `freeze` fails with [`DebugInfoError::FrozenMutation`].
    pub fn freeze(&mut self) -> Result<DebugInformation, DebugInfoError> {
        self.check_not_frozen()?;
        self.frozen = true;

        let files = mem::replace(&mut self.files, LayerBuilder::new(LayerKind::File));
        let lines = mem::replace(&mut self.lines, LayerBuilder::new(LayerKind::Line));
        let classes = mem::replace(&mut self.classes, LayerBuilder::new(LayerKind::Class));
        let methods = mem::replace(&mut self.methods, LayerBuilder::new(LayerKind::Method));
        let call_sites = mem::replace(&mut self.call_sites, LayerBuilder::new(LayerKind::CallSite));
        let statements = mem::replace(
            &mut self.statements,
            RecordTableBuilder::new(LayerKind::Statement.arity()),
        );
        let variables = mem::take(&mut self.variables)
            .into_iter()
            .map(|(slot, layer)| (slot, layer.build(LayerKind::Variable)))
            .collect();

        Ok(DebugInformation {
            file_layer: files.build(LayerKind::File),
            line_layer: lines.build(LayerKind::Line),
            class_layer: classes.build(LayerKind::Class),
            method_layer: methods.build(LayerKind::Method),
            call_site_layer: call_sites.build(LayerKind::CallSite),
            statement_layer: MappingLayer::new(LayerKind::Statement, statements.build()),
            variable_layers: variables,
            file_names: mem::take(&mut self.file_names).build(),
            class_names: mem::take(&mut self.class_names).build(),
            method_names: mem::take(&mut self.method_names).build(),
            variable_names: mem::take(&mut self.variable_names).build(),
        })
    }
}

impl Default for DebugInformationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
