//! Combinators for waiting on heterogeneous sets
//! of awaitables.
//!
//! An [`Awaitable`] is either a broadcast event
//! subscription or a one-shot task, unified over a
//! single value domain. The two central combinators
//! merge a set of them into one new event:
//!
//! - [`any`] fires as soon as the first input
//!   completes.
//! - [`all`] fires once every input has completed.
//!
//! Either way the completion event carries a
//! [`Tree`] of [`Record`]s, one per completed
//! input, in completion order. A completion event
//! is itself a valid event input, so combinators
//! nest; the tree then holds nested trees, and
//! [`Tree::has`] and [`Tree::flatten`] see through
//! the nesting.
//!
//! Two adapters convert between the awaitable
//! kinds: [`task_to_event`] re-exposes a task's
//! single completion as a broadcast event, and
//! [`event_to_task`] turns a channel's next
//! emission into a task. [`map`] runs one task per
//! element of a sequence concurrently and yields
//! the results in input order.
//!
//! A combinator keeps itself alive through its own
//! subscriptions until it fires; the caller only
//! holds the returned subscriber half and is free
//! to drop even that. Combined inputs cannot be
//! cancelled, and no timeouts are built in: race
//! the combinator against a timer-backed event via
//! [`any`] to get one.
//!
//! Everything runs on the current thread's
//! `conflux-task` runtime, which must be installed
//! before combinators are constructed.

#[doc(hidden)]
pub mod tree;
pub use tree::{Outcome, Record, Tree};

#[doc(hidden)]
pub mod awaitable;
#[rustfmt::skip]
pub use awaitable::{
    Awaitable, InvalidAwaitable,
    SourceId, TryIntoAwaitable,
};

#[doc(hidden)]
pub mod engine;
pub use engine::{all, any};

#[doc(hidden)]
pub mod bridge;
pub use bridge::task_to_event;

#[doc(hidden)]
pub mod adapt;
pub use adapt::event_to_task;

#[doc(hidden)]
pub mod map;
pub use map::map;
