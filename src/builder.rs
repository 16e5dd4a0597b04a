use crate::{sys, Result, Thread, UNKNOWN_NAME};
use std::num::NonZeroUsize;

/// Configuration for spawning a [`Thread`].
#[derive(Debug, Default, Clone)]
pub struct Builder {
    name: Option<String>,
    stack_size: Option<NonZeroUsize>,
}

impl Builder {
    pub const fn new() -> Self {
        Self {
            name: None,
            stack_size: None,
        }
    }

    /// Name of the thread, defaults to [`UNKNOWN_NAME`].
    ///
    /// The full name is kept by the handle. Only the OS registration is
    /// truncated to the platform's limit.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Stack size in bytes. Zero selects the platform default.
    ///
    /// Sizes below the platform minimum are raised to it, and sizes are
    /// rounded up to a whole number of pages.
    pub fn stack_size(&mut self, stack_size: usize) -> &mut Self {
        self.stack_size = NonZeroUsize::new(stack_size);
        self
    }

    /// Spawn a thread running `work`, returning once it has started.
    pub fn spawn<F>(&self, work: F) -> Result<Thread>
    where
        F: FnOnce() + Send + 'static,
    {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| String::from(UNKNOWN_NAME));
        let stack_size = self.stack_size.map(sys::stack_size);
        Thread::spawn(name, stack_size, Box::new(work))
    }
}
