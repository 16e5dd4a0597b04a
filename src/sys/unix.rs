use super::{truncate_name, Entry};
use std::{
    ffi::{c_void, CString},
    io,
    mem::MaybeUninit,
    num::NonZeroUsize,
    ptr,
};

/// Longest thread name the OS accepts, excluding the NUL terminator.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub const MAX_NAME_LEN: usize = 15;
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub const MAX_NAME_LEN: usize = 63;
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios"
)))]
pub const MAX_NAME_LEN: usize = 0;

/// A joinable pthread.
pub struct Native(libc::pthread_t);

// pthread_t is an opaque pointer on some platforms.
unsafe impl Send for Native {}
unsafe impl Sync for Native {}

impl Native {
    pub fn join(self) -> io::Result<()> {
        cvt(unsafe { libc::pthread_join(self.0, ptr::null_mut()) })
    }

    pub fn detach(self) -> io::Result<()> {
        cvt(unsafe { libc::pthread_detach(self.0) })
    }
}

fn cvt(rc: libc::c_int) -> io::Result<()> {
    match rc {
        0 => Ok(()),
        errno => Err(io::Error::from_raw_os_error(errno)),
    }
}

/// Start a joinable thread running `entry(arg)`.
///
/// # Safety
///
/// `arg` must stay valid for `entry` to consume. On error `entry` never runs
/// and ownership of `arg` stays with the caller.
///
/// The name is registered by the new thread itself through [`set_name`].
pub unsafe fn spawn(
    _name: &str,
    stack_size: Option<NonZeroUsize>,
    entry: Entry,
    arg: *mut c_void,
) -> io::Result<Native> {
    let mut attr = MaybeUninit::<libc::pthread_attr_t>::uninit();
    cvt(libc::pthread_attr_init(attr.as_mut_ptr()))?;

    let result = create(attr.as_mut_ptr(), stack_size, entry, arg);

    let r = libc::pthread_attr_destroy(attr.as_mut_ptr());
    debug_assert_eq!(r, 0);
    result
}

unsafe fn create(
    attr: *mut libc::pthread_attr_t,
    stack_size: Option<NonZeroUsize>,
    entry: Entry,
    arg: *mut c_void,
) -> io::Result<Native> {
    if let Some(stack_size) = stack_size {
        cvt(libc::pthread_attr_setstacksize(attr, stack_size.get()))?;
    }

    let mut native = MaybeUninit::<libc::pthread_t>::uninit();
    cvt(libc::pthread_create(native.as_mut_ptr(), attr, entry, arg))?;
    Ok(Native(native.assume_init()))
}

#[cfg(any(target_os = "linux", target_os = "android"))]
const MIN_STACK_SIZE: usize = libc::PTHREAD_STACK_MIN;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const MIN_STACK_SIZE: usize = 16 * 1024;

fn page_size() -> usize {
    match unsafe { libc::sysconf(libc::_SC_PAGESIZE) } {
        size if size > 0 => size as usize,
        _ => 4096,
    }
}

/// Round a requested stack size to one the OS will accept.
pub fn stack_size(requested: NonZeroUsize) -> NonZeroUsize {
    let page = page_size();
    let size = requested.get().max(MIN_STACK_SIZE);
    let size = match size.checked_add(page - 1) {
        Some(size) => size & !(page - 1),
        None => size,
    };
    NonZeroUsize::new(size).unwrap_or(requested)
}

/// The kernel's id for the calling thread.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn current_id() -> u64 {
    unsafe { libc::syscall(libc::SYS_gettid) as u64 }
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
pub fn current_id() -> u64 {
    let mut id = 0u64;
    let r = unsafe { libc::pthread_threadid_np(libc::pthread_self(), &mut id) };
    debug_assert_eq!(r, 0);
    id
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios"
)))]
pub fn current_id() -> u64 {
    unsafe { libc::pthread_self() as u64 }
}

/// Register the calling thread's name with the OS.
pub fn set_name(name: &str) {
    let name = truncate_name(name, MAX_NAME_LEN);
    let name = CString::new(name).unwrap_or_default();
    set_os_name(&name);
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn set_os_name(name: &CString) {
    let r = unsafe { libc::pthread_setname_np(libc::pthread_self(), name.as_ptr()) };
    debug_assert_eq!(r, 0);
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
fn set_os_name(name: &CString) {
    let r = unsafe { libc::pthread_setname_np(name.as_ptr()) };
    debug_assert_eq!(r, 0);
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios"
)))]
fn set_os_name(_name: &CString) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_size_clamped_to_minimum() {
        let size = stack_size(NonZeroUsize::new(1).unwrap()).get();
        assert!(size >= MIN_STACK_SIZE);
        assert_eq!(size % page_size(), 0);
    }

    #[test]
    fn stack_size_rounded_to_page() {
        let page = page_size();
        let requested = NonZeroUsize::new(256 * 1024 + 1).unwrap();
        let size = stack_size(requested).get();
        assert_eq!(size % page, 0);
        assert!(size > 256 * 1024);
        assert!(size - 256 * 1024 <= page);
    }

    #[test]
    fn current_id_is_per_thread() {
        let main_id = current_id();
        assert_eq!(main_id, current_id());

        let other_id = std::thread::spawn(current_id).join().unwrap();
        assert_ne!(main_id, other_id);
    }
}
