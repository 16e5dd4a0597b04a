use std::ffi::c_void;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use self::unix::*;

#[cfg(not(unix))]
mod generic;
#[cfg(not(unix))]
pub use self::generic::*;

/// Entry point of a natively spawned thread.
pub type Entry = extern "C" fn(*mut c_void) -> *mut c_void;

/// The part of `name` which is registered with the OS.
///
/// The OS sees everything up to the first NUL byte, cut down to `max_len`
/// bytes without splitting a character.
pub fn truncate_name(name: &str, max_len: usize) -> &str {
    let name = name.split('\0').next().unwrap_or_default();
    let mut end = name.len().min(max_len);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}
