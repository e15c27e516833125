//! Events flowing into and out of the linking core.
//!
//! Change notifications arrive from the persistence layer, attribute state
//! events from the twin-update pipeline, and write commands leave for the
//! protocol I/O layer. Both streams are carried by [`BroadcastBus`].

mod bus;
mod change;
mod state;

pub use bus::{BroadcastBus, BusError, BusReceiver};
pub use change::{ChangeKind, ChangeNotification, FieldSnapshot, ATTRIBUTES_FIELD};
pub use state::{AttributeStateEvent, AttributeWriteCommand, ProcessingStatus};

/// Persistence change notifications, restricted to assets
pub type ChangeFeed = BroadcastBus<ChangeNotification>;

/// Outbound write commands consumed by protocol I/O
pub type DispatchChannel = BroadcastBus<AttributeWriteCommand>;
