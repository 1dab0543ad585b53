use crate::{Handle, Task, initialize, run_until_stalled, spawn};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_normal() {
    let _rt = initialize().unwrap();

    let rc = Rc::new(RefCell::new(0usize));
    let rc1 = rc.clone();
    let handle = spawn(async move {
        let inner = spawn(Task::new(async { 7usize })).await;
        *rc1.borrow_mut() = inner * 6;
    });
    handle.detach();

    run_until_stalled();
    assert_eq!(*rc.borrow(), 42);
}

#[test]
fn test_drop_cancels() {
    let _rt = initialize().unwrap();

    let rc = Rc::new(RefCell::new(false));
    let rc1 = rc.clone();
    let handle = spawn(async move {
        *rc1.borrow_mut() = true;
    });
    std::mem::drop(handle);

    run_until_stalled();
    assert!(!*rc.borrow());
}

#[test]
fn test_reinitialize() {
    let rt = initialize().unwrap();
    assert!(initialize().is_err());

    std::mem::drop(rt);
    let _rt = initialize().unwrap();
}
