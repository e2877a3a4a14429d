//! Effects produced by state transitions

/// Effects to be executed after a transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Persist the new session snapshot
    PersistSession,

    /// Persist the new session snapshot and log the confirmed booking, as one write
    PersistReservation { date: String, party_size: u32 },
}
