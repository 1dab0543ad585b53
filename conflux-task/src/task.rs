use futures::FutureExt;
use futures::future::LocalBoxFuture;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A suspendable unit of computation that has not
/// started yet.
///
/// The body runs only once the task is awaited or
/// handed to [`crate::spawn`]. Awaiting consumes
/// the task, so there is exactly one consumer; a
/// task cannot be re-run.
pub struct Task<T>
where
    T: 'static,
{
    future: LocalBoxFuture<'static, T>,
}

impl<T> Task<T>
where
    T: 'static,
{
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = T> + 'static,
    {
        Self {
            future: Box::pin(future),
        }
    }
}

impl<T> Future for Task<T>
where
    T: 'static,
{
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.poll_unpin(cx)
    }
}
