//! Error types for the debug-information subsystem.

use sable_common::OutOfOrderAppend;

/// Errors surfaced by debug-information building, traversal, and decoding.
///
/// The first two variants are contract violations in the compiler backend
/// and are never recovered from. `IteratorExhausted` is avoidable by
/// checking [`is_exhausted`](crate::SourceLocationIterator::is_exhausted)
/// before each access. `CorruptDebugData` is recoverable: a caller may fall
/// back to "no debug info available" instead of failing the whole session.
#[derive(Debug, thiserror::Error)]
pub enum DebugInfoError {
    /// A fact was recorded at a location earlier than a previously recorded
    /// location.
    #[error(transparent)]
    OutOfOrderAppend(#[from] OutOfOrderAppend),

    /// A record or freeze call arrived after the builder was already frozen.
    #[error("debug information is frozen and no longer accepts records")]
    FrozenMutation,

    /// A finished source-location iterator was advanced or accessed.
    #[error("source location iterator is already exhausted")]
    IteratorExhausted,

    /// Serialized debug data failed structural validation.
    #[error("corrupt debug data: {reason}")]
    CorruptDebugData {
        /// Description of the structural problem.
        reason: String,
    },
}
