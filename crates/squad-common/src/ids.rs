//! ID types for simulated entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of an agent inside the world's agent collection.
///
/// Agents are never removed from the collection (dead agents stay as
/// terminal records), so the handle is a stable index for the lifetime
/// of a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates an agent ID from a collection index.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Creates an agent ID from a raw value (for deserialization).
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the collection index this ID refers to.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_display() {
        assert_eq!(AgentId::from_index(7).to_string(), "agent#7");
    }

    #[test]
    fn test_agent_id_ordering() {
        assert!(AgentId::from_index(1) < AgentId::from_index(2));
        assert_eq!(AgentId::from_raw(5).raw(), 5);
    }
}
