use crate::awaitable::TryIntoAwaitable;
use crate::tree::{Record, Tree};
use conflux_event::{Handler, LedgeDyn, Pub, Sub, new_pubsub};
use conflux_task::{Handle, spawn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

enum Mode {
    First,
    Every,
}

struct Engine<V>
where
    V: Clone + 'static,
{
    target: usize,
    fired: Cell<bool>,
    tree: RefCell<Tree<V>>,
    done: Pub<Tree<V>>,
    guards: RefCell<Vec<Box<dyn LedgeDyn>>>,
}

impl<V> Engine<V>
where
    V: Clone + 'static,
{
    fn absorb(&self, record: Record<V>) {
        // An input's delivery may already be in flight
        // when the target is reached; whatever arrives
        // after the firing is dropped, so the exposed
        // tree stays final.
        if self.fired.get() {
            return;
        }
        self.tree.borrow_mut().push(record);
        self.try_fire();
    }

    fn try_fire(&self) {
        if self.fired.get() || self.tree.borrow().len() < self.target {
            return;
        }
        self.fired.set(true);
        let tree = self.tree.take();
        // Dropping the guards detaches every remaining
        // input subscription and the accumulator itself,
        // which unwinds the ownership chain keeping this
        // engine alive once the delivery below is done.
        self.guards.borrow_mut().clear();
        let done = self.done.clone();
        // Deliver on a fresh turn so a caller subscribing
        // right after any/all returned still observes the
        // completion.
        spawn(async move { done.publish(tree).await }).detach();
    }
}

fn combine<V, I>(inputs: I, mode: Mode) -> Sub<Tree<V>>
where
    V: Clone + 'static,
    I: IntoIterator,
    I::Item: TryIntoAwaitable<V>,
{
    let mut sources = Vec::new();
    for (index, input) in inputs.into_iter().enumerate() {
        match input.try_into_awaitable() {
            Ok(source) => sources.push(source),
            Err(error) => tracing::warn!(index, %error, "excluding combinator input"),
        }
    }
    let target = match mode {
        Mode::First => sources.len().min(1),
        Mode::Every => sources.len(),
    };

    let (done, done_sub) = new_pubsub();
    let (feed, feed_sub) = new_pubsub::<Record<V>>();
    let engine = Rc::new(Engine {
        target,
        fired: Cell::new(false),
        tree: RefCell::new(Tree::default()),
        done,
        guards: RefCell::new(Vec::new()),
    });

    // The accumulator is deliberately a sync handler:
    // one in-flight delivery can never suspend and
    // interleave with another, so appending, checking
    // the target and tearing the guards down is one
    // atomic step on the timeline.
    let accumulator = engine.clone();
    let accum_guard = feed_sub.subscribe(Handler::new_sync(move |record: Record<V>| {
        accumulator.absorb(record);
    }));
    engine.guards.borrow_mut().push(Box::new(accum_guard));

    for source in sources {
        let guard = source.connect(feed.clone());
        engine.guards.borrow_mut().push(guard);
    }

    // A zero target (empty input, or nothing valid)
    // completes right away, through the same firing
    // path as everything else.
    engine.try_fire();
    done_sub
}

/// Merge awaitables into one event that fires as
/// soon as the first of them completes.
///
/// The completion event fires exactly once with a
/// [`Tree`] holding the one winning record, then
/// the combinator releases itself; the remaining
/// inputs stay un-cancelled but unobserved. Inputs
/// that fail to convert are reported and excluded;
/// an input set with nothing valid in it completes
/// immediately with an empty tree.
pub fn any<V, I>(inputs: I) -> Sub<Tree<V>>
where
    V: Clone + 'static,
    I: IntoIterator,
    I::Item: TryIntoAwaitable<V>,
{
    combine(inputs, Mode::First)
}

/// Merge awaitables into one event that fires once
/// every one of them has completed.
///
/// The completion event fires exactly once with a
/// [`Tree`] holding one record per valid input, in
/// completion order rather than input order. Inputs
/// that fail to convert are reported, excluded and
/// never waited for; an empty or all-invalid input
/// set completes immediately with an empty tree.
pub fn all<V, I>(inputs: I) -> Sub<Tree<V>>
where
    V: Clone + 'static,
    I: IntoIterator,
    I::Item: TryIntoAwaitable<V>,
{
    combine(inputs, Mode::Every)
}
