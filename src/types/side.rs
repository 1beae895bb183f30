//! Side identities for the two tracked points

use serde::{Deserialize, Serialize};

/// One of the two fixed identities whose mutual distance drives the gesture.
///
/// Exactly two sides exist per authority instance; there is never a third
/// concurrent tracked point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Both sides, in fixed order
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    /// Index into per-side storage
    pub fn index(&self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }

    /// The other side
    pub fn opposite(&self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Side::A => "A",
            Side::B => "B",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_stable() {
        assert_eq!(Side::A.index(), 0);
        assert_eq!(Side::B.index(), 1);
    }

    #[test]
    fn test_opposite() {
        assert_eq!(Side::A.opposite(), Side::B);
        assert_eq!(Side::B.opposite(), Side::A);
    }
}
