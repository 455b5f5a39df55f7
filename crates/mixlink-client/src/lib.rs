//! Mixlink Client - synchronization client for the mixer daemon.
//!
//! Maintains a persistent websocket connection to the locally running
//! daemon, decodes its snapshot/diff protocol into a uniform stream of
//! patches, fans the patches out to subscribers, and encodes outbound
//! commands addressed to the currently known device.

pub mod bus;
pub mod client;
pub mod codec;
pub mod error;
pub mod status;

pub use bus::{PatchBus, SubscriptionId};
pub use client::{ClientConfig, MixerClient};
pub use codec::{Envelope, Inbound, OutboundPayload};
pub use error::CodecError;
pub use status::{ConnectionState, Severity, StatusEvent};
