use crate::adapt::event_to_task;
use crate::awaitable::{Awaitable, SourceId};
use crate::engine::all;
use crate::tree::Outcome;
use conflux_task::Task;

/// Run one task per element of a sequence
/// concurrently and collect the results in input
/// order.
///
/// Every element's task starts eagerly, here, by
/// being combined through [`all`]; the returned
/// task resolves once the last of them finishes.
/// The completion tree is in completion order, so
/// the results are re-projected onto the input
/// positions by source identity before they are
/// returned. An empty sequence resolves to an
/// empty vector.
pub fn map<T, R, F>(items: impl IntoIterator<Item = T>, mut factory: F) -> Task<Vec<R>>
where
    R: Clone + 'static,
    F: FnMut(T) -> Task<R>,
{
    let awaitables: Vec<Awaitable<R>> = items
        .into_iter()
        .map(|item| Awaitable::task(factory(item)))
        .collect();
    let sources: Vec<SourceId> = awaitables.iter().map(Awaitable::id).collect();

    let done = all(awaitables);
    let completed = event_to_task(&done);
    Task::new(async move {
        let tree = completed.await;
        sources
            .iter()
            .map(|source| {
                // Every input is a started task, so the
                // tree holds exactly one single-valued
                // record per source.
                match tree.get(*source) {
                    Some(Outcome::Single(value)) => value.clone(),
                    _ => unreachable!(),
                }
            })
            .collect()
    })
}
