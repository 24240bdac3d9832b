//! Network propagation boundary
//!
//! The container never talks to sockets. Every qualifying change is handed
//! to an [`OptionTransport`], which owns encoding and delivery. Sends are
//! fire-and-forget from the mutator's point of view: the in-memory
//! mutation commits regardless of what happens on the wire, and transport
//! failures are reported through the transport's own error channel.

use crate::option::{OptionDef, OptionValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of a connected player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Target set for one propagated change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipients {
    /// Every currently connected player.
    All,
    /// Exactly one player (per-player view overrides).
    One(PlayerId),
}

/// Boundary consumed by [`crate::container::OptionsContainer`] on every
/// qualifying change.
///
/// `value` is the new effective value, already resolved against the
/// default. Implementations must not block: callers invoke this while no
/// container lock is held, but still expect enqueue-and-return semantics.
pub trait OptionTransport: Send + Sync + 'static {
    fn send_option(
        &self,
        module: &str,
        option: &OptionDef,
        value: &OptionValue,
        recipients: Recipients,
    );
}

/// Transport that drops everything. Useful for registries that only need
/// the in-memory state, and as a test stand-in.
#[derive(Debug, Default)]
pub struct NullTransport;

impl OptionTransport for NullTransport {
    fn send_option(
        &self,
        _module: &str,
        _option: &OptionDef,
        _value: &OptionValue,
        _recipients: Recipients,
    ) {
    }
}
