//! Connectivity state snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a live internet path has been confirmed.
///
/// Radio-level connectivity alone does not imply reachability (captive
/// portals, dead uplinks), so this is tracked as a tri-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reachability {
    Yes,
    No,
    Unknown,
}

/// Kind of link the platform reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionType {
    Wifi,
    Cellular,
    Ethernet,
    Unknown,
    None,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionType::Wifi => write!(f, "wifi"),
            ConnectionType::Cellular => write!(f, "cellular"),
            ConnectionType::Ethernet => write!(f, "ethernet"),
            ConnectionType::Unknown => write!(f, "unknown"),
            ConnectionType::None => write!(f, "none"),
        }
    }
}

/// Last-known connectivity snapshot.
///
/// Created once at process start with [`NetworkState::neutral`] and
/// mutated on every platform connectivity callback for the lifetime of the
/// process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkState {
    /// Radio-level connectivity.
    pub is_connected: bool,
    /// Confirmed internet reachability.
    pub reachability: Reachability,
    pub connection_type: ConnectionType,
    /// Heuristic flag for slow links (2G/3G class cellular).
    pub is_slow: bool,
}

impl NetworkState {
    /// Optimistic starting state used before the first platform callback:
    /// connected with unconfirmed reachability, so startup requests are
    /// attempted rather than queued.
    pub fn neutral() -> Self {
        Self {
            is_connected: true,
            reachability: Reachability::Unknown,
            connection_type: ConnectionType::Unknown,
            is_slow: false,
        }
    }

    /// Fully online state on the given link.
    pub fn online(connection_type: ConnectionType) -> Self {
        Self { is_connected: true, reachability: Reachability::Yes, connection_type, is_slow: false }
    }

    /// Fully offline state.
    pub fn offline() -> Self {
        Self {
            is_connected: false,
            reachability: Reachability::No,
            connection_type: ConnectionType::None,
            is_slow: false,
        }
    }

    /// Derived online flag: connected, and reachability not confirmed dead.
    pub fn is_online(&self) -> bool {
        self.is_connected && self.reachability != Reachability::No
    }
}

impl Default for NetworkState {
    fn default() -> Self {
        Self::neutral()
    }
}
