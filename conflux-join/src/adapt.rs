use conflux_event::{Handler, Sub};
use conflux_task::Task;
use futures::channel::oneshot;

/// Turn a channel's next emission into a task.
///
/// The subscription is taken here, at call time, so
/// the task resolves with the first emission after
/// this call no matter when it is first polled.
/// Each call is an independent one-shot wait on a
/// broadcast channel: concurrent waits on the same
/// channel all resolve on the same emission, none
/// of them steals it from the others or from any
/// plain subscriber.
///
/// If the channel dies without emitting, the task
/// suspends forever, indistinguishable from an
/// event that never fires.
pub fn event_to_task<E>(sub: &Sub<E>) -> Task<E>
where
    E: Clone + 'static,
{
    let (tx, rx) = oneshot::channel();
    let mut tx = Some(tx);
    let ledge = sub.subscribe_once(Handler::new_sync(move |e: E| {
        if let Some(tx) = tx.take() {
            let _ = tx.send(e);
        }
    }));
    Task::new(async move {
        let _ledge = ledge;
        match rx.await {
            Ok(value) => value,
            Err(_canceled) => futures::future::pending().await,
        }
    })
}

#[cfg(test)]
mod test {
    use crate::adapt::event_to_task;
    use conflux_event::new_pubsub;
    use conflux_task::{Handle, initialize, run_until_stalled, spawn};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_independent_waits() {
        let _rt = initialize().unwrap();

        let (pub_v, sub_v) = new_pubsub::<usize>();
        let results = Rc::new(RefCell::new(Vec::new()));

        for _ in 0..2 {
            let task = event_to_task(&sub_v);
            let mresults = results.clone();
            spawn(async move {
                mresults.borrow_mut().push(task.await);
            })
            .detach();
        }

        let pub_c = pub_v.clone();
        spawn(async move { pub_c.publish(5).await }).detach();
        run_until_stalled();

        // Neither wait steals the emission from the other.
        assert_eq!(*results.borrow(), vec![5, 5]);

        // A wait created after an emission only sees the
        // next one.
        let late = event_to_task(&sub_v);
        let mresults = results.clone();
        spawn(async move {
            mresults.borrow_mut().push(late.await);
        })
        .detach();
        run_until_stalled();
        assert_eq!(results.borrow().len(), 2);

        spawn(async move { pub_v.publish(9).await }).detach();
        run_until_stalled();
        assert_eq!(*results.borrow(), vec![5, 5, 9]);
    }
}
