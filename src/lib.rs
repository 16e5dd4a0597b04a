#![warn(rust_2018_idioms)]

//! OS threads with a synchronous startup handshake.
//!
//! A [`Thread`] is only handed back once the spawned thread has published its
//! identity: its OS id is known, its name is registered with the OS and
//! [`Thread::current`] resolves on it. User work starts after that point.

mod builder;
mod current;
mod error;
mod sync;
mod sys;
mod thread;

pub use self::{
    builder::Builder,
    error::{Error, Result},
    thread::{Thread, ThreadRef},
};

/// Name reported by [`Thread::current_name`] on threads which never had one set.
pub const UNKNOWN_NAME: &str = "UNKNOWN";
