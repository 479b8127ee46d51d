//! Compact binary encoding of the frozen debug-information aggregate.
//!
//! The blob is a magic/format-version header followed by the bincode
//! encoding of the aggregate: the four entity-name tables and every mapping
//! layer as its `(key, fields…)` tuples in ascending key order. Decoding
//! trusts key monotonicity (the blob is produced by a frozen builder) but
//! validates structure — layer kinds, arities, field-storage shape, and
//! that every stored id fits its entity table.

use serde::{Deserialize, Serialize};

use crate::error::DebugInfoError;
use crate::info::DebugInformation;
use crate::layer::{LayerKind, MappingLayer};
use crate::strings::{StringId, StringTable};

/// Magic bytes identifying a Sable debug-information blob.
const DEBUG_MAGIC: [u8; 4] = *b"SDBG";

/// Current blob format version. Increment on breaking layout changes.
const DEBUG_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct BlobRef<'a> {
    magic: [u8; 4],
    format_version: u32,
    info: &'a DebugInformation,
}

#[derive(Deserialize)]
struct Blob {
    magic: [u8; 4],
    format_version: u32,
    info: DebugInformation,
}

fn corrupt(reason: impl Into<String>) -> DebugInfoError {
    DebugInfoError::CorruptDebugData {
        reason: reason.into(),
    }
}

/// Encodes the aggregate into a binary blob.
pub fn serialize(info: &DebugInformation) -> Result<Vec<u8>, DebugInfoError> {
    let blob = BlobRef {
        magic: DEBUG_MAGIC,
        format_version: DEBUG_FORMAT_VERSION,
        info,
    };
    bincode::serde::encode_to_vec(&blob, bincode::config::standard())
        .map_err(|e| corrupt(format!("encode failed: {e}")))
}

/// Decodes and validates a blob produced by [`serialize`].
pub fn deserialize(bytes: &[u8]) -> Result<DebugInformation, DebugInfoError> {
    let (blob, read): (Blob, usize) =
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| corrupt(e.to_string()))?;

    if blob.magic != DEBUG_MAGIC {
        return Err(corrupt("bad magic bytes"));
    }
    if blob.format_version != DEBUG_FORMAT_VERSION {
        return Err(corrupt(format!(
            "unsupported format version {} (expected {DEBUG_FORMAT_VERSION})",
            blob.format_version
        )));
    }
    if read != bytes.len() {
        return Err(corrupt(format!(
            "{} trailing bytes after blob",
            bytes.len() - read
        )));
    }

    validate(&blob.info)?;
    Ok(blob.info)
}

/// Structural validation of a decoded aggregate.
fn validate(info: &DebugInformation) -> Result<(), DebugInfoError> {
    check_layer(&info.file_layer, LayerKind::File, Some(&info.file_names))?;
    check_layer(&info.line_layer, LayerKind::Line, None)?;
    check_layer(&info.class_layer, LayerKind::Class, Some(&info.class_names))?;
    check_layer(&info.method_layer, LayerKind::Method, Some(&info.method_names))?;
    check_layer(
        &info.call_site_layer,
        LayerKind::CallSite,
        Some(&info.method_names),
    )?;
    check_layer(&info.statement_layer, LayerKind::Statement, None)?;
    for (_, layer) in info.variable_layers() {
        check_layer(layer, LayerKind::Variable, Some(&info.variable_names))?;
    }
    Ok(())
}

/// Checks one layer's kind, arity, field-storage shape, and id ranges.
fn check_layer(
    layer: &MappingLayer,
    expected: LayerKind,
    names: Option<&StringTable>,
) -> Result<(), DebugInfoError> {
    if layer.kind() != expected {
        return Err(corrupt(format!(
            "layer kind {:?} where {expected:?} was declared",
            layer.kind()
        )));
    }
    let table = layer.table();
    if table.arity() != expected.arity() {
        return Err(corrupt(format!(
            "{expected:?} layer arity {} (expected {})",
            table.arity(),
            expected.arity()
        )));
    }
    if !table.is_well_formed() {
        return Err(corrupt(format!(
            "{expected:?} layer field storage inconsistent with record count"
        )));
    }
    if let Some(names) = names {
        for (key, fields) in table.iter() {
            for &raw in fields {
                if !StringId::from_raw(raw).is_unknown() && raw as usize >= names.len() {
                    return Err(corrupt(format!(
                        "{expected:?} layer record at key {key:#x} references id {raw} \
                         outside its entity table of {} entries",
                        names.len()
                    )));
                }
            }
        }
    }
    Ok(())
}
