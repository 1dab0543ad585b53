use crate::bridge::task_to_event;
use crate::tree::{Outcome, Record, Tree};
use conflux_event::{ChannelId, Handler, LedgeDyn, Pub, Sub};
use conflux_task::Task;
use std::any::Any;
use std::cell::Cell;
use thiserror::Error;

/// Input that is neither an event subscription nor
/// a task.
///
/// Produced only at the conversion boundary; the
/// combinators report it and exclude the input,
/// they never abort over it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
#[error("input is neither an event subscription nor a task")]
pub struct InvalidAwaitable;

thread_local! {
    static NEXT_TASK_ID: Cell<u64> = const { Cell::new(0) };
}

fn next_task_id() -> u64 {
    NEXT_TASK_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    })
}

/// Identity of a combined awaitable.
///
/// Event inputs are identified by their channel, so
/// every `Sub` clone of one channel shares an id.
/// Task inputs get a fresh id when the awaitable is
/// constructed. Capture [`Awaitable::id`] before
/// combining to query the completion [`Tree`]
/// later.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SourceId {
    Event(ChannelId),
    Task(u64),
}

enum EventKind<V>
where
    V: Clone + 'static,
{
    Unit(Sub<()>),
    Value(Sub<V>),
    Values(Sub<Vec<V>>),
    Joined(Sub<Tree<V>>),
}

enum TaskKind<V>
where
    V: Clone + 'static,
{
    Unit(Task<()>),
    Value(Task<V>),
}

enum Kind<V>
where
    V: Clone + 'static,
{
    Event(EventKind<V>),
    Task(TaskKind<V>),
}

/// One input a combinator can wait on: a broadcast
/// event subscription or a one-shot task.
///
/// All inputs of one combinator share a value
/// domain `V`; the constructors accept the emission
/// shapes an event can have (void, single value,
/// value list, or a nested combinator's completion
/// tree) and the two task shapes (valued or void).
pub struct Awaitable<V>
where
    V: Clone + 'static,
{
    id: SourceId,
    kind: Kind<V>,
}

impl<V> Awaitable<V>
where
    V: Clone + 'static,
{
    /// Wait on a single-valued event.
    pub fn event(sub: Sub<V>) -> Self {
        Self {
            id: SourceId::Event(sub.channel_id()),
            kind: Kind::Event(EventKind::Value(sub)),
        }
    }

    /// Wait on a void event.
    pub fn unit_event(sub: Sub<()>) -> Self {
        Self {
            id: SourceId::Event(sub.channel_id()),
            kind: Kind::Event(EventKind::Unit(sub)),
        }
    }

    /// Wait on an event whose emissions carry a
    /// list of values.
    pub fn multi_event(sub: Sub<Vec<V>>) -> Self {
        Self {
            id: SourceId::Event(sub.channel_id()),
            kind: Kind::Event(EventKind::Values(sub)),
        }
    }

    /// Wait on another combinator's completion
    /// event; its tree is recorded nested.
    pub fn joined(sub: Sub<Tree<V>>) -> Self {
        Self {
            id: SourceId::Event(sub.channel_id()),
            kind: Kind::Event(EventKind::Joined(sub)),
        }
    }

    /// Wait on a task producing a value.
    pub fn task(task: Task<V>) -> Self {
        Self {
            id: SourceId::Task(next_task_id()),
            kind: Kind::Task(TaskKind::Value(task)),
        }
    }

    /// Wait on a task producing nothing.
    pub fn unit_task(task: Task<()>) -> Self {
        Self {
            id: SourceId::Task(next_task_id()),
            kind: Kind::Task(TaskKind::Unit(task)),
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Subscribe this input's first completion into
    /// the engine's feed channel, starting task
    /// inputs immediately. The returned guard keeps
    /// the subscription registered; dropping it
    /// detaches the input.
    pub(crate) fn connect(self, feed: Pub<Record<V>>) -> Box<dyn LedgeDyn> {
        let source = self.id;
        match self.kind {
            Kind::Event(EventKind::Unit(sub)) => {
                Box::new(sub.subscribe_once(Handler::new_async(async move |_: ()| {
                    feed.publish(Record::new(source, Outcome::Empty)).await;
                })))
            }
            Kind::Event(EventKind::Value(sub)) => {
                Box::new(sub.subscribe_once(Handler::new_async(async move |value: V| {
                    feed.publish(Record::new(source, Outcome::Single(value))).await;
                })))
            }
            Kind::Event(EventKind::Values(sub)) => {
                Box::new(sub.subscribe_once(Handler::new_async(async move |values: Vec<V>| {
                    feed.publish(Record::new(source, Outcome::Many(values))).await;
                })))
            }
            Kind::Event(EventKind::Joined(sub)) => {
                Box::new(sub.subscribe_once(Handler::new_async(async move |tree: Tree<V>| {
                    feed.publish(Record::new(source, Outcome::Nested(tree))).await;
                })))
            }
            Kind::Task(TaskKind::Unit(task)) => {
                let done = task_to_event(task);
                Box::new(done.subscribe_once(Handler::new_async(async move |_: ()| {
                    feed.publish(Record::new(source, Outcome::Empty)).await;
                })))
            }
            Kind::Task(TaskKind::Value(task)) => {
                let done = task_to_event(task);
                Box::new(done.subscribe_once(Handler::new_async(async move |value: V| {
                    feed.publish(Record::new(source, Outcome::Single(value))).await;
                })))
            }
        }
    }
}

/// Conversion into a combinable awaitable.
///
/// The combinators accept anything implementing
/// this trait. The typed conversions are
/// infallible; the `Box<dyn Any>` impl is the
/// dynamic boundary where a value can turn out to
/// be neither an event nor a task, yielding
/// [`InvalidAwaitable`].
pub trait TryIntoAwaitable<V>
where
    V: Clone + 'static,
{
    fn try_into_awaitable(self) -> Result<Awaitable<V>, InvalidAwaitable>;
}

impl<V> TryIntoAwaitable<V> for Awaitable<V>
where
    V: Clone + 'static,
{
    fn try_into_awaitable(self) -> Result<Awaitable<V>, InvalidAwaitable> {
        Ok(self)
    }
}

impl<V> TryIntoAwaitable<V> for Sub<V>
where
    V: Clone + 'static,
{
    fn try_into_awaitable(self) -> Result<Awaitable<V>, InvalidAwaitable> {
        Ok(Awaitable::event(self))
    }
}

impl<V> TryIntoAwaitable<V> for Sub<Tree<V>>
where
    V: Clone + 'static,
{
    fn try_into_awaitable(self) -> Result<Awaitable<V>, InvalidAwaitable> {
        Ok(Awaitable::joined(self))
    }
}

impl<V> TryIntoAwaitable<V> for Task<V>
where
    V: Clone + 'static,
{
    fn try_into_awaitable(self) -> Result<Awaitable<V>, InvalidAwaitable> {
        Ok(Awaitable::task(self))
    }
}

impl<V> TryIntoAwaitable<V> for Box<dyn Any>
where
    V: Clone + 'static,
{
    fn try_into_awaitable(self) -> Result<Awaitable<V>, InvalidAwaitable> {
        let this = match self.downcast::<Awaitable<V>>() {
            Ok(awaitable) => return Ok(*awaitable),
            Err(this) => this,
        };
        let this = match this.downcast::<Sub<V>>() {
            Ok(sub) => return Ok(Awaitable::event(*sub)),
            Err(this) => this,
        };
        let this = match this.downcast::<Sub<()>>() {
            Ok(sub) => return Ok(Awaitable::unit_event(*sub)),
            Err(this) => this,
        };
        let this = match this.downcast::<Sub<Vec<V>>>() {
            Ok(sub) => return Ok(Awaitable::multi_event(*sub)),
            Err(this) => this,
        };
        let this = match this.downcast::<Sub<Tree<V>>>() {
            Ok(sub) => return Ok(Awaitable::joined(*sub)),
            Err(this) => this,
        };
        let this = match this.downcast::<Task<V>>() {
            Ok(task) => return Ok(Awaitable::task(*task)),
            Err(this) => this,
        };
        match this.downcast::<Task<()>>() {
            Ok(task) => Ok(Awaitable::unit_task(*task)),
            Err(_) => Err(InvalidAwaitable),
        }
    }
}
