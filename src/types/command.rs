//! Authority-bound commands
//!
//! The wire format between a reporter and the authority. Every command is a
//! best-effort, fire-and-forget state update with no return value.

use serde::{Deserialize, Serialize};

use crate::types::{Side, Vec3};

/// One inbound mutation for the squeeze authority.
///
/// Commands arriving between ticks are buffered and applied before the next
/// evaluation, never interleaved mid-evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthorityCommand {
    /// A reporter now claims this side
    Engaged { side: Side },
    /// A reporter released this side
    Disengaged { side: Side },
    /// Periodic position sample for an engaged side
    Position { side: Side, position: Vec3 },
}

impl AuthorityCommand {
    /// The side this command addresses
    pub fn side(&self) -> Side {
        match self {
            AuthorityCommand::Engaged { side }
            | AuthorityCommand::Disengaged { side }
            | AuthorityCommand::Position { side, .. } => *side,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wire_roundtrip() {
        let cmd = AuthorityCommand::Position {
            side: Side::B,
            position: Vec3::new(0.4, 0.0, 0.0),
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let back: AuthorityCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(cmd, back);
    }

    #[test]
    fn test_wire_format_is_tagged() {
        let cmd = AuthorityCommand::Engaged { side: Side::A };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains(r#""kind":"engaged""#), "got {}", json);
    }
}
