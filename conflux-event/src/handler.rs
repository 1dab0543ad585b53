use futures::future::LocalBoxFuture;

/// Dyn-compatible form of an async event handler.
///
/// An `AsyncFnMut(E)` bound cannot be boxed as a
/// trait object, but the channel has to dispatch
/// to handlers dynamically, so we pay the price
/// of boxing the returned futures.
pub trait AsyncHandlerTrait<E> {
    fn call_mut_boxed(&mut self, e: E) -> LocalBoxFuture<'_, ()>;
}

impl<E, F> AsyncHandlerTrait<E> for F
where
    F: AsyncFnMut(E),
    E: Clone + 'static,
{
    fn call_mut_boxed(&mut self, e: E) -> LocalBoxFuture<'_, ()> {
        // An outer future unifies the otherwise
        // unnameable CallRefFuture types.
        Box::pin(async move { (*self)(e).await })
    }
}

/// Event handler accepted by a subscription.
///
/// The sync flavour runs to completion inside the
/// emission; the async flavour is awaited by the
/// publisher before the emission returns.
pub enum Handler<E> {
    Sync(Box<dyn FnMut(E)>),
    Async(Box<dyn AsyncHandlerTrait<E>>),
}

impl<E> Handler<E>
where
    E: Clone + 'static,
{
    pub fn new_sync<F>(f: F) -> Handler<E>
    where
        F: FnMut(E) + 'static,
    {
        Handler::Sync(Box::new(f))
    }

    pub fn new_async<F>(f: F) -> Handler<E>
    where
        F: AsyncFnMut(E) + 'static,
    {
        Handler::Async(Box::new(f))
    }
}
