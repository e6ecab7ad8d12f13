// SPDX-License-Identifier: MPL-2.0
//! Identity newtypes for the binding protocol.
//!
//! Containers, controls, and parent slots are referred to by value-type
//! identities rather than references, so the coordinator can hold the one
//! mutable graph while components talk about each other.

use serde::{Deserialize, Serialize};

/// Identity of a container (a page that can request the shared player).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(pub(crate) u64);

impl ContainerId {
    /// Returns the raw id value (for diagnostics output).
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Identity of a controls strip. Each container owns exactly one, but the
/// player's binding tracks the controls identity separately so a recreated
/// container with fresh controls is recognized as a new binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlsId(pub(crate) u64);

impl ControlsId {
    /// Returns the raw id value.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Identity of a layout parent slot a container root can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentId(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_id_equality_is_by_value() {
        assert_eq!(ContainerId(3), ContainerId(3));
        assert_ne!(ContainerId(3), ContainerId(4));
    }

    #[test]
    fn ids_expose_raw_values() {
        assert_eq!(ContainerId(7).value(), 7);
        assert_eq!(ControlsId(9).value(), 9);
    }
}
