//! Single-threaded task runtime.
//!
//! A [`Task`] is a unit of computation that has
//! not started yet. It owns its arguments through
//! closure capture, may suspend at any await point
//! inside its body, and produces exactly one value
//! when it finishes. `Task` implements `Future`,
//! so awaiting one consumes it: the type system
//! enforces that a task has exactly one consumer.
//!
//! To actually run tasks, a thread installs a
//! runtime with [`initialize`] and then drives it
//! with [`run_until_stalled`]. [`spawn`] hands a
//! future to the runtime and returns a [`Handle`]:
//!
//! - Awaiting the handle receives the result.
//! - Dropping the handle cancels the task.
//! - Calling `detach` lets the task run to
//!   completion unobserved.
//!
//! Everything here is deliberately foreground-only.
//! The runtime is one `LocalPool` per thread, tasks
//! need not be `Send`, and nothing ever preempts a
//! task between await points.

#[doc(hidden)]
pub mod task;
pub use task::Task;

#[doc(hidden)]
pub mod spawner;
#[rustfmt::skip]
pub use spawner::{
    Handle, Runtime,
    initialize,
    run_until_stalled,
    spawn,
};

#[cfg(test)]
mod test;
