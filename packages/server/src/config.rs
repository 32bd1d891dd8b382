//! Runtime switches for the relay.

/// Relay behaviour toggles, filled from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayConfig {
    /// Drop `send_message` events addressed to a room the sender is not assigned to
    pub require_membership: bool,
}
