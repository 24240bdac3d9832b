//! Player connections and settings delivery
//!
//! Bridges the in-memory options layer to the wire: [`PlayerTable`] tracks
//! live connections with their negotiated [`apollo_wire::WireFormat`], and
//! [`NetworkPropagator`] implements the options transport by encoding each
//! change once per format and fanning it out through the connections'
//! outbound channels.

pub mod player;
pub mod propagator;

pub use player::{PlayerConnection, PlayerTable};
pub use propagator::NetworkPropagator;
