use anyhow::Result;
use futures::FutureExt;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::RemoteHandle;
use futures::task::LocalSpawnExt;
use std::cell::RefCell;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Task handle trait.
///
/// This handle is used to receive the result from
/// a spawned task, as well as controlling it:
///
/// - Awaiting this handle receives the result.
/// - Dropping this handle cancels the task.
/// - Calling `detach` consumes the handle and lets
///   the task run to completion unobserved.
pub trait Handle<T>: Future<Output = T>
where
    T: 'static,
{
    fn detach(self);
}

struct TaskHandle<T>
where
    T: 'static,
{
    handle: RemoteHandle<T>,
}

impl<T> Future for TaskHandle<T>
where
    T: 'static,
{
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.handle.poll_unpin(cx)
    }
}

impl<T> Handle<T> for TaskHandle<T>
where
    T: 'static,
{
    fn detach(self) {
        self.handle.forget();
    }
}

struct ReadySpawner {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl ReadySpawner {
    fn spawn<F, T>(&self, future: F) -> TaskHandle<T>
    where
        F: Future<Output = T> + 'static,
        T: 'static,
    {
        let handle = self.spawner.spawn_local_with_handle(future).unwrap();
        TaskHandle { handle }
    }

    fn run_until_stalled(&self) {
        // Spawning from inside a running task goes through
        // the spawner half, so holding the pool borrow for
        // the whole run is fine.
        self.pool.borrow_mut().run_until_stalled();
    }
}

enum Spawner {
    Uninit,
    Ready(ReadySpawner),
}

impl Spawner {
    fn ready(&self) -> &ReadySpawner {
        match self {
            Spawner::Ready(ready) => ready,
            Spawner::Uninit => panic!("Task runtime not initialized."),
        }
    }
}

thread_local! {
    static SPAWNER: RefCell<Spawner> = const { RefCell::new(Spawner::Uninit) };
}

/// Initialized runtime handle.
///
/// This handle controls the lifecycle of the
/// thread's runtime. Dropping it disposes the
/// executor along with every task still pending
/// on it, and allows a later [`initialize`].
pub struct Runtime {
    _private: (),
}

impl Drop for Runtime {
    fn drop(&mut self) {
        drop(SPAWNER.replace(Spawner::Uninit));
    }
}

/// Install the task runtime on the current thread.
///
/// At most one runtime may be live per thread; a
/// second invocation fails until the first
/// [`Runtime`] handle is dropped.
pub fn initialize() -> Result<Runtime> {
    SPAWNER.with_borrow(|v| match v {
        Spawner::Uninit => Ok(()),
        _ => Err(anyhow::anyhow!("Initialized runtime in use.")),
    })?;

    SPAWNER.with_borrow_mut(|v| {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        *v = Spawner::Ready(ReadySpawner {
            pool: RefCell::new(pool),
            spawner,
        });
    });

    Ok(Runtime { _private: () })
}

/// Spawn a future on the current thread's runtime.
///
/// The future starts running on the next
/// [`run_until_stalled`] turn. Panics if the
/// runtime is not initialized.
#[must_use = "Dropping the Handle is equivalent to canceling the future."]
pub fn spawn<F, T>(future: F) -> impl Handle<T>
where
    F: Future<Output = T> + 'static,
    T: 'static,
{
    SPAWNER.with_borrow(|w| w.ready().spawn(future))
}

/// Run the spawned tasks until all of them are
/// stalled on pending awaits or finished.
pub fn run_until_stalled() {
    SPAWNER.with_borrow(|w| w.ready().run_until_stalled());
}
