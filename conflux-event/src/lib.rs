//! Single-threaded broadcast event channels.
//!
//! This crate is the eventing substrate of the
//! conflux workspace. A channel is created with
//! [`new_pubsub`], which hands back two halves:
//!
//! - The [`Pub`] half owns the channel and emits
//!   events into it. Every current subscriber
//!   observes a clone of each emission, so an
//!   emission is a broadcast, not a hand-off.
//! - The [`Sub`] half references the channel
//!   weakly and registers [`Handler`]s on it.
//!   A regular subscription lives until its
//!   [`Ledge`] is dropped; a one-shot
//!   subscription detaches itself after the
//!   first delivery.
//!
//! Handlers come in a sync and an async flavour,
//! unified by the [`Handler`] union so that the
//! channel can dispatch to either dynamically.
//!
//! The crate asserts the eventing happens in a
//! single-threaded context.

#[doc(hidden)]
pub mod handler;
pub use handler::Handler;

#[doc(hidden)]
pub mod pubsub;
#[rustfmt::skip]
pub use pubsub::{
    ChannelId, Ledge, LedgeDyn,
    Pub, Sub, new_pubsub,
};

#[cfg(test)]
pub(crate) mod testutil;
