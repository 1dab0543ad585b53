use crate::handler::{AsyncHandlerTrait, Handler};
use slab::Slab;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

struct Entry<E>
where
    E: Clone + 'static,
{
    serial: u64,
    once: bool,
    handler: Rc<RefCell<Handler<E>>>,
}

struct Inner<E>
where
    E: Clone + 'static,
{
    serial: Cell<u64>,
    subs: RefCell<Slab<Entry<E>>>,
}

impl<E> Inner<E>
where
    E: Clone + 'static,
{
    fn new() -> Self {
        Self {
            serial: Cell::new(0),
            subs: RefCell::new(Slab::new()),
        }
    }

    fn register(&self, handler: Handler<E>, once: bool) -> (usize, u64) {
        let serial = self.serial.get();
        self.serial.set(serial + 1);
        let entry = Entry {
            serial,
            once,
            handler: Rc::new(RefCell::new(handler)),
        };
        (self.subs.borrow_mut().insert(entry), serial)
    }

    fn evict(&self, key: usize, serial: u64) {
        // The slab reuses keys, so an unsubscribe may race
        // a one-shot detach for the same slot. The serial
        // tells the two registrations apart.
        let mut subs = self.subs.borrow_mut();
        if subs.get(key).is_some_and(|entry| entry.serial == serial) {
            subs.remove(key);
        }
    }

    async fn publish(&self, e: E) {
        // Snapshot the live handlers and release the
        // registry borrow before dispatching, so handlers
        // may subscribe and unsubscribe reentrantly. A
        // subscriber registered during this emission only
        // sees the next one. One-shot entries leave the
        // registry before their handler runs, so a nested
        // emission cannot deliver to them twice.
        let snapshot: Vec<Rc<RefCell<Handler<E>>>> = {
            let mut subs = self.subs.borrow_mut();
            let handlers = subs.iter().map(|(_, entry)| entry.handler.clone()).collect();
            let fired: Vec<usize> = subs
                .iter()
                .filter(|(_, entry)| entry.once)
                .map(|(key, _)| key)
                .collect();
            for key in fired {
                subs.remove(key);
            }
            handlers
        };
        for handler in snapshot {
            let mut handler = handler.borrow_mut();
            match &mut *handler {
                Handler::Sync(f) => f(e.clone()),
                Handler::Async(f) => f.call_mut_boxed(e.clone()).await,
            }
        }
    }

    fn has_subscriber(&self) -> bool {
        !self.subs.borrow().is_empty()
    }
}

/// Pointer identity of an event channel.
///
/// Equal across every `Pub` and `Sub` half of the
/// same channel, distinct across live channels, and
/// stable for the channel's lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ChannelId(usize);

/// Event subscription handle.
///
/// A ledge marks that its owner is still interested
/// in the subscribed channel. Dropping it detaches
/// the handler, which will no longer be called
/// unless it is being notified.
pub struct Ledge<E>
where
    E: Clone + 'static,
{
    inner: Weak<Inner<E>>,
    key: usize,
    serial: u64,
}

impl<E> Drop for Ledge<E>
where
    E: Clone + 'static,
{
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.evict(self.key, self.serial);
        }
    }
}

impl<E> Default for Ledge<E>
where
    E: Clone + 'static,
{
    fn default() -> Self {
        Self {
            inner: Weak::new(),
            key: 0,
            serial: 0,
        }
    }
}

/// Type-erased subscription handle.
///
/// Lets subscriptions of different payload types
/// live in one collection, keeping each handler
/// registered until the collection drops them.
pub trait LedgeDyn {}

impl<E> LedgeDyn for Ledge<E> where E: Clone + 'static {}

/// Event publisher handle.
///
/// The publisher half owns the channel. The caller
/// is free to clone it so that emissions can be
/// issued from several places.
#[derive(Clone)]
pub struct Pub<E>
where
    E: Clone + 'static,
{
    inner: Rc<Inner<E>>,
}

impl<E> Pub<E>
where
    E: Clone + 'static,
{
    /// Broadcast one emission to every current
    /// subscriber, awaiting async handlers.
    pub async fn publish(&self, e: E) {
        self.inner.publish(e).await;
    }

    pub fn has_subscriber(&self) -> bool {
        self.inner.has_subscriber()
    }

    pub fn channel_id(&self) -> ChannelId {
        ChannelId(Rc::as_ptr(&self.inner) as *const () as usize)
    }
}

/// Event subscriber handle.
///
/// The subscriber half references the channel
/// weakly: subscribing to a channel whose
/// publisher is gone yields a detached [`Ledge`]
/// whose handler will never run.
#[derive(Clone)]
pub struct Sub<E>
where
    E: Clone + 'static,
{
    inner: Weak<Inner<E>>,
}

impl<E> Sub<E>
where
    E: Clone + 'static,
{
    fn try_register(&self, h: Handler<E>, once: bool) -> Option<Ledge<E>> {
        let inner = self.inner.upgrade()?;
        let (key, serial) = inner.register(h, once);
        Some(Ledge {
            inner: self.inner.clone(),
            key,
            serial,
        })
    }

    #[must_use = "Unregister when Ledge is dropped."]
    pub fn try_subscribe(&self, h: Handler<E>) -> Option<Ledge<E>> {
        self.try_register(h, false)
    }

    #[must_use = "Unregister when Ledge is dropped."]
    pub fn subscribe(&self, h: Handler<E>) -> Ledge<E> {
        self.try_subscribe(h).unwrap_or_default()
    }

    /// Subscribe for a single delivery. The handler
    /// detaches itself after the first emission;
    /// dropping the ledge earlier detaches it too.
    #[must_use = "Unregister when Ledge is dropped."]
    pub fn try_subscribe_once(&self, h: Handler<E>) -> Option<Ledge<E>> {
        self.try_register(h, true)
    }

    #[must_use = "Unregister when Ledge is dropped."]
    pub fn subscribe_once(&self, h: Handler<E>) -> Ledge<E> {
        self.try_subscribe_once(h).unwrap_or_default()
    }

    pub fn channel_id(&self) -> ChannelId {
        ChannelId(self.inner.as_ptr() as *const () as usize)
    }
}

/// Create a publisher and subscriber for one event
/// channel.
///
/// The halves are separate objects so that each can
/// be handed to the side dedicated to its role.
pub fn new_pubsub<E>() -> (Pub<E>, Sub<E>)
where
    E: Clone + 'static,
{
    let inner = Rc::new(Inner::new());
    let inner_weak = Rc::downgrade(&inner);
    (Pub { inner }, Sub { inner: inner_weak })
}

#[cfg(test)]
mod test {
    use crate::handler::Handler;
    use crate::pubsub::*;
    use crate::testutil::TestFixture;
    use anyhow::Result;
    use std::cell::RefCell;
    use std::rc::Rc;

    async fn async_test_normal() -> Result<()> {
        #[derive(Clone)]
        struct EventSome;

        let (pub_some, sub_some) = new_pubsub::<EventSome>();

        let v1 = Rc::new(RefCell::new(0));
        let mv1 = v1.clone();
        let _ledge1 = sub_some.subscribe(Handler::new_sync(move |_| {
            *mv1.borrow_mut() = 2;
        }));

        let v2 = Rc::new(RefCell::new(0));
        let mv2 = v2.clone();
        let _ledge2 = sub_some.subscribe(Handler::new_async(async move |_| {
            *mv2.borrow_mut() = 3;
        }));

        // The publisher waits for all handlers to execute,
        // thus we observe the mutated values after awaiting.
        pub_some.publish(EventSome).await;
        assert_eq!(*v1.borrow(), 2);
        assert_eq!(*v2.borrow(), 3);
        Ok(())
    }

    #[test]
    fn test_normal() {
        let mut fixture = TestFixture::new();

        fixture
            .execute(async { async_test_normal().await.unwrap() })
            .assert_done();
    }

    #[test]
    fn test_once_detaches() {
        let mut fixture = TestFixture::new();

        let (pub_v, sub_v) = new_pubsub::<usize>();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let mseen = seen.clone();
        let _once = sub_v.subscribe_once(Handler::new_sync(move |v| {
            mseen.borrow_mut().push(v);
        }));

        fixture
            .execute(async move {
                pub_v.publish(1).await;
                pub_v.publish(2).await;
            })
            .assert_done();
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn test_ledge_drop_unsubscribes() {
        let mut fixture = TestFixture::new();

        let (pub_v, sub_v) = new_pubsub::<usize>();
        let count = Rc::new(RefCell::new(0usize));

        let mcount = count.clone();
        let ledge = sub_v.subscribe(Handler::new_sync(move |_| {
            *mcount.borrow_mut() += 1;
        }));

        let pub_c = pub_v.clone();
        fixture
            .execute(async move { pub_c.publish(1).await })
            .assert_done();
        assert_eq!(*count.borrow(), 1);

        std::mem::drop(ledge);
        fixture
            .execute(async move { pub_v.publish(2).await })
            .assert_done();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_subscribe_during_emission_sees_next() {
        let mut fixture = TestFixture::new();

        let (pub_v, sub_v) = new_pubsub::<usize>();
        let late = Rc::new(RefCell::new(Vec::new()));
        let held = Rc::new(RefCell::new(Vec::new()));

        let sub_c = sub_v.clone();
        let mlate = late.clone();
        let mheld = held.clone();
        let _ledge = sub_v.subscribe(Handler::new_sync(move |v: usize| {
            if v == 1 {
                let inner = mlate.clone();
                mheld.borrow_mut().push(sub_c.subscribe(Handler::new_sync(
                    move |v: usize| {
                        inner.borrow_mut().push(v);
                    },
                )));
            }
        }));

        fixture
            .execute(async move {
                pub_v.publish(1).await;
                pub_v.publish(2).await;
            })
            .assert_done();
        assert_eq!(*late.borrow(), vec![2]);
    }

    #[test]
    fn test_channel_id() {
        let (pub_a, sub_a) = new_pubsub::<usize>();
        let (pub_b, sub_b) = new_pubsub::<usize>();

        assert_eq!(pub_a.channel_id(), sub_a.channel_id());
        assert_eq!(sub_a.channel_id(), sub_a.clone().channel_id());
        assert_ne!(pub_a.channel_id(), pub_b.channel_id());
        assert_ne!(sub_a.channel_id(), sub_b.channel_id());
    }

    #[test]
    fn test_dead_channel_subscribe() {
        let mut fixture = TestFixture::new();

        let (pub_v, sub_v) = new_pubsub::<usize>();
        assert!(!pub_v.has_subscriber());
        std::mem::drop(pub_v);

        // Subscribing to a channel with no publisher left
        // yields a detached ledge; nothing can fire.
        let _ledge = sub_v.subscribe(Handler::new_sync(move |_| {
            panic!("handler on a dead channel");
        }));
        fixture.execute(async {}).assert_done();
    }
}
