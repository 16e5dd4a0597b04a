use crate::{thread::ThreadRef, UNKNOWN_NAME};
use std::cell::RefCell;

struct Current {
    thread: Option<ThreadRef>,
    name: String,
}

/// Access the calling thread's slot. Returns `None` once it has been torn
/// down, which happens when called from another thread local's destructor.
fn with_tls<F>(f: impl FnOnce(&mut Current) -> F) -> Option<F> {
    thread_local!(static TLS: RefCell<Current> = RefCell::new(Current {
        thread: None,
        name: String::from(UNKNOWN_NAME),
    }));
    TLS.try_with(|ref_cell| f(&mut *ref_cell.borrow_mut())).ok()
}

/// Bind the calling thread to the handle which spawned it.
pub fn enter(thread: ThreadRef) {
    let entered = with_tls(|tls| {
        assert!(tls.thread.is_none(), "Thread entered more than once");
        tls.name = thread.name();
        tls.thread = Some(thread);
    });

    if entered.is_none() {
        unreachable!("Thread entered after its thread locals were destroyed");
    }
}

pub fn thread() -> Option<ThreadRef> {
    with_tls(|tls| tls.thread.clone()).flatten()
}

pub fn name() -> String {
    with_tls(|tls| tls.name.clone()).unwrap_or_else(|| String::from(UNKNOWN_NAME))
}

pub fn set_name(name: String) {
    let _ = with_tls(|tls| {
        if let Some(thread) = tls.thread.as_ref() {
            thread.set_name(name.clone());
        }
        tls.name = name;
    });
}
