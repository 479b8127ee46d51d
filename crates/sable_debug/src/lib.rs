//! Debug information for generated JavaScript and WebAssembly output.
//!
//! While the backend emits output it records, through
//! [`DebugInformationBuilder`], every position at which a source fact
//! changes: the source file, the source line, the owning class and method,
//! the call-site chain, statement boundaries, and live local variables.
//! Facts are stored sparsely — only change points are kept — in key-sorted
//! record tables that are built in a single pass without sorting.
//!
//! At the end of compilation the builder freezes into an immutable
//! [`DebugInformation`] aggregate that any number of readers may share:
//! [`DebugInformation::lookup`] resolves a single generated location back to
//! its source facts (stack-trace translation, debugger queries), and
//! [`DebugInformation::iterate`] walks every change point in order
//! (source-map emission). The aggregate serializes to a compact binary blob
//! and back.

#![warn(missing_docs)]

pub mod builder;
pub mod codec;
pub mod error;
pub mod info;
pub mod iter;
pub mod layer;
pub mod location;
pub mod strings;

pub use builder::DebugInformationBuilder;
pub use error::DebugInfoError;
pub use info::{CallSite, DebugInformation, FactBundle};
pub use iter::SourceLocationIterator;
pub use layer::{LayerKind, MappingLayer};
pub use location::GeneratedLocation;
pub use strings::{StringId, StringTable, StringTableBuilder};
