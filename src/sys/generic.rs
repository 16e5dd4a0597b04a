use super::{truncate_name, Entry};
use std::{
    ffi::c_void,
    io,
    num::NonZeroUsize,
    sync::atomic::{AtomicU64, Ordering},
    thread::{self, JoinHandle},
};

pub struct Native(JoinHandle<()>);

impl Native {
    pub fn join(self) -> io::Result<()> {
        self.0
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "thread panicked"))
    }

    pub fn detach(self) -> io::Result<()> {
        drop(self.0);
        Ok(())
    }
}

struct Arg(*mut c_void);

unsafe impl Send for Arg {}

/// Start a joinable thread running `entry(arg)`.
///
/// # Safety
///
/// `arg` must stay valid for `entry` to consume. On error `entry` never runs
/// and ownership of `arg` stays with the caller.
///
/// The OS name is handed to the standard library up front, as it can only be
/// set while spawning.
pub unsafe fn spawn(
    name: &str,
    stack_size: Option<NonZeroUsize>,
    entry: Entry,
    arg: *mut c_void,
) -> io::Result<Native> {
    let arg = Arg(arg);
    let name = truncate_name(name, usize::MAX);
    let mut builder = thread::Builder::new().name(String::from(name));
    if let Some(stack_size) = stack_size {
        builder = builder.stack_size(stack_size.get());
    }

    builder
        .spawn(move || {
            let arg = arg;
            entry(arg.0);
        })
        .map(Native)
}

pub fn stack_size(requested: NonZeroUsize) -> NonZeroUsize {
    requested
}

/// A process unique id for the calling thread, assigned on first use.
pub fn current_id() -> u64 {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    thread_local!(static ID: u64 = NEXT_ID.fetch_add(1, Ordering::Relaxed));
    ID.with(|id| *id)
}

/// The name was already registered by [`spawn`].
pub fn set_name(_name: &str) {}
