//! Line/column coordinates within generated output.

use serde::{Deserialize, Serialize};

/// A position in generated output, identified by line and column.
///
/// Locations are totally ordered, primarily by line and secondarily by
/// column. For storage in record tables a location packs into a single
/// sortable `u64` key, so the packed keys sort exactly like the locations.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize,
)]
pub struct GeneratedLocation {
    /// Zero-based line in the generated output.
    pub line: u32,
    /// Zero-based column in the generated output.
    pub column: u32,
}

impl GeneratedLocation {
    /// The first position of the generated output.
    pub const START: GeneratedLocation = GeneratedLocation { line: 0, column: 0 };

    /// Creates a location from a line and column.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Packs this location into a sortable `u64` key (`line << 32 | column`).
    pub fn key(self) -> u64 {
        (u64::from(self.line) << 32) | u64::from(self.column)
    }

    /// Reconstructs a location from a packed key.
    pub fn from_key(key: u64) -> Self {
        Self {
            line: (key >> 32) as u32,
            column: key as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_line_major() {
        let a = GeneratedLocation::new(1, 100);
        let b = GeneratedLocation::new(2, 0);
        let c = GeneratedLocation::new(2, 1);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a, GeneratedLocation::new(1, 100));
    }

    #[test]
    fn key_preserves_ordering() {
        let locs = [
            GeneratedLocation::START,
            GeneratedLocation::new(0, 1),
            GeneratedLocation::new(0, u32::MAX),
            GeneratedLocation::new(1, 0),
            GeneratedLocation::new(7, 3),
            GeneratedLocation::new(u32::MAX, u32::MAX),
        ];
        for pair in locs.windows(2) {
            assert!(pair[0].key() < pair[1].key());
        }
    }

    #[test]
    fn key_roundtrip() {
        let loc = GeneratedLocation::new(123, 456);
        assert_eq!(GeneratedLocation::from_key(loc.key()), loc);
        assert_eq!(GeneratedLocation::from_key(0), GeneratedLocation::START);
    }

    #[test]
    fn serde_roundtrip() {
        let loc = GeneratedLocation::new(3, 14);
        let json = serde_json::to_string(&loc).unwrap();
        let back: GeneratedLocation = serde_json::from_str(&json).unwrap();
        assert_eq!(loc, back);
    }
}
