use conflux_event::{Sub, new_pubsub};
use conflux_task::{Handle, Task, spawn};

/// Re-expose a task's single completion as a
/// broadcast event.
///
/// The task starts immediately, not on first
/// subscription. The returned subscriber fires
/// exactly once, when the task finishes, with the
/// task's return value; any number of subscribers
/// observe that one firing, even though the task
/// itself could only ever be awaited by a single
/// consumer. The channel's publisher half lives in
/// the detached runner, so both are released right
/// after firing.
pub fn task_to_event<T>(task: Task<T>) -> Sub<T>
where
    T: Clone + 'static,
{
    let (done, sub) = new_pubsub();
    spawn(async move {
        let value = task.await;
        done.publish(value).await;
    })
    .detach();
    sub
}
