use crate::{current, sync::Event, sys, Builder, Error, Result};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::{
    ffi::c_void,
    fmt,
    num::NonZeroUsize,
    panic::{self, AssertUnwindSafe},
    ptr,
    sync::atomic::{AtomicU64, Ordering},
    sync::Arc,
};

type Work = Box<dyn FnOnce() + Send + 'static>;

struct Inner {
    name: ArcSwap<String>,
    os_id: AtomicU64,
    work: Mutex<Option<Work>>,
    started: Event,
}

/// A shared reference to the identity of a spawned [`Thread`].
///
/// Two `ThreadRef`s compare equal when they refer to the same spawned thread.
#[derive(Clone)]
pub struct ThreadRef {
    inner: Arc<Inner>,
}

impl ThreadRef {
    /// The OS id of the thread.
    pub fn id(&self) -> u64 {
        self.inner.os_id.load(Ordering::Acquire)
    }

    /// The full, untruncated name of the thread.
    pub fn name(&self) -> String {
        String::clone(&self.inner.name.load())
    }

    pub(crate) fn set_name(&self, name: String) {
        self.inner.name.store(Arc::new(name));
    }
}

impl PartialEq for ThreadRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ThreadRef {}

impl PartialEq<Thread> for ThreadRef {
    fn eq(&self, other: &Thread) -> bool {
        *self == other.thread
    }
}

impl fmt::Debug for ThreadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadRef")
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}

/// An owning handle to an OS thread.
///
/// The thread has finished initializing by the time a handle is returned.
/// Dropping the handle without joining detaches the thread, which then runs
/// to completion on its own.
pub struct Thread {
    thread: ThreadRef,
    native: Option<sys::Native>,
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("joinable", &self.native.is_some())
            .finish()
    }
}

impl PartialEq<ThreadRef> for Thread {
    fn eq(&self, other: &ThreadRef) -> bool {
        self.thread == *other
    }
}

impl Drop for Thread {
    fn drop(&mut self) {
        if let Some(native) = self.native.take() {
            match native.detach() {
                Ok(()) => tracing::debug!(name = %self.name(), os_id = self.id(), "thread detached"),
                Err(error) => tracing::warn!(
                    name = %self.name(),
                    os_id = self.id(),
                    %error,
                    "failed to detach thread"
                ),
            }
        }
    }
}

impl Thread {
    /// Spawn a thread named `name` running `work`.
    ///
    /// Blocks until the new thread has published its id and name.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to create the thread. Use [`Builder::spawn`] to
    /// handle the error instead.
    ///
    /// A panic escaping `work` ends only this thread. On unix the panic
    /// message names the thread `<unnamed>` as the standard library does not
    /// know about it; the `tracing` event emitted afterwards carries the name.
    pub fn new<F>(work: F, name: impl Into<String>) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::spawn_or_panic(Builder::new().name(name), work)
    }

    fn spawn_or_panic<F>(builder: &Builder, work: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        match builder.spawn(work) {
            Ok(thread) => thread,
            Err(error) => {
                tracing::error!(%error, "thread creation failed");
                panic!("{}", error)
            }
        }
    }

    pub(crate) fn spawn(
        name: String,
        stack_size: Option<NonZeroUsize>,
        work: Work,
    ) -> Result<Self> {
        let thread = ThreadRef {
            inner: Arc::new(Inner {
                name: ArcSwap::from_pointee(name),
                os_id: AtomicU64::new(0),
                work: Mutex::new(Some(work)),
                started: Event::default(),
            }),
        };

        let arg = Box::into_raw(Box::new(thread.clone()));
        let spawned = unsafe { sys::spawn(&thread.name(), stack_size, trampoline, arg.cast()) };
        let native = match spawned {
            Ok(native) => native,
            Err(source) => {
                // The trampoline never ran so the argument is still ours.
                drop(unsafe { Box::from_raw(arg) });
                return Err(Error::Spawn {
                    name: thread.name(),
                    source,
                });
            }
        };

        thread.inner.started.wait();
        tracing::debug!(name = %thread.name(), os_id = thread.id(), "thread spawned");

        Ok(Self {
            thread,
            native: Some(native),
        })
    }

    /// The OS id of the thread.
    pub fn id(&self) -> u64 {
        self.thread.id()
    }

    /// The full, untruncated name of the thread.
    pub fn name(&self) -> String {
        self.thread.name()
    }

    /// A cloneable reference to this thread's identity.
    pub fn thread_ref(&self) -> ThreadRef {
        self.thread.clone()
    }

    /// Wait for the thread's work to finish.
    ///
    /// Does nothing if the thread was already joined.
    ///
    /// # Panics
    ///
    /// Panics if the OS reports an error while joining.
    pub fn join(&mut self) {
        if let Err(error) = self.try_join() {
            tracing::error!(%error, "thread join failed");
            panic!("{}", error)
        }
    }

    /// Wait for the thread's work to finish, returning any OS error.
    ///
    /// The handle is cleared whether or not the join succeeded.
    pub fn try_join(&mut self) -> Result<()> {
        let native = match self.native.take() {
            Some(native) => native,
            None => return Ok(()),
        };

        native.join().map_err(|source| Error::Join {
            name: self.name(),
            source,
        })?;

        tracing::debug!(name = %self.name(), os_id = self.id(), "thread joined");
        Ok(())
    }

    /// The handle of the calling thread, if it was spawned as a [`Thread`].
    pub fn current() -> Option<ThreadRef> {
        current::thread()
    }

    /// Ask the OS for the calling thread's id.
    pub fn current_id() -> u64 {
        sys::current_id()
    }

    /// The calling thread's name, or [`UNKNOWN_NAME`](crate::UNKNOWN_NAME)
    /// if it never had one.
    pub fn current_name() -> String {
        current::name()
    }

    /// Rename the calling thread.
    ///
    /// When the calling thread was spawned as a [`Thread`] its handle sees the
    /// new name as well. The name registered with the OS is left untouched.
    pub fn set_current_name(name: impl Into<String>) {
        current::set_name(name.into())
    }
}

extern "C" fn trampoline(arg: *mut c_void) -> *mut c_void {
    let thread = *unsafe { Box::from_raw(arg.cast::<ThreadRef>()) };
    let inner = &*thread.inner;

    current::enter(thread.clone());
    inner.os_id.store(sys::current_id(), Ordering::Release);
    sys::set_name(&inner.name.load());

    let work = inner.work.lock().take();

    // The spawning thread owns the handle again from here on.
    inner.started.notify();

    if let Some(work) = work {
        // Unwinding must not leave the native entry point. The panic hook has
        // already reported it by the time it is caught here.
        if panic::catch_unwind(AssertUnwindSafe(work)).is_err() {
            tracing::error!(name = %thread.name(), os_id = thread.id(), "thread panicked");
        }
    }

    ptr::null_mut()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn identity_published_before_return() {
        let thread = Thread::new(|| {}, "identity");
        assert_ne!(thread.id(), 0);
        assert_ne!(thread.id(), Thread::current_id());
        assert_eq!(thread.name(), "identity");
    }

    #[test]
    fn current_inside_work() {
        let (tx, rx) = mpsc::channel();
        let mut thread = Thread::new(
            move || {
                let current = Thread::current().unwrap();
                tx.send((current, Thread::current_id(), Thread::current_name()))
                    .unwrap();
            },
            "current",
        );

        let (current, id, name) = rx.recv().unwrap();
        assert_eq!(current, thread);
        assert_eq!(current, thread.thread_ref());
        assert_eq!(current.id(), id);
        assert_eq!(id, thread.id());
        assert_eq!(name, "current");
        thread.join();
    }

    #[test]
    fn handles_are_distinct() {
        let a = Thread::new(|| {}, "a");
        let b = Thread::new(|| {}, "b");
        assert_ne!(a.thread_ref(), b.thread_ref());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn work_released_after_start() {
        let (tx, rx) = mpsc::channel::<()>();
        let state = Arc::new(());
        let captured = state.clone();

        let mut thread = Thread::new(
            move || {
                let _state = captured;
                let _ = rx.recv();
            },
            "release",
        );

        // the trampoline owns the work now, not the handle
        assert!(thread.thread.inner.work.lock().is_none());
        tx.send(()).unwrap();
        thread.join();
        assert_eq!(Arc::strong_count(&state), 1);
    }

    #[cfg(unix)]
    #[test]
    #[should_panic(expected = "failed to spawn thread \"huge\"")]
    fn creation_failure_is_fatal() {
        let mut builder = Builder::new();
        builder.name("huge").stack_size(usize::MAX / 2);
        let _ = Thread::spawn_or_panic(&builder, || {});
    }

    #[test]
    fn panicking_work_ends_thread() {
        let mut thread = Thread::new(|| panic!("work failed"), "panics");
        thread.join();
        assert_eq!(thread.name(), "panics");
    }
}
