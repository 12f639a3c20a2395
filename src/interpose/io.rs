//! Raw descriptor writes

use std::slice;

use libc::{c_int, c_void, size_t, ssize_t};

use super::real::{self, WriteFn};
use crate::config::Bracket;
use crate::core::{state, wrap::wrap};

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn write(fd: c_int, buf: *const c_void, count: size_t) -> ssize_t {
    if count == 0 {
        return 0;
    }
    write_with(real::WRITE.get(), state::bracket(fd), fd, buf, count)
}

/// macOS's non-cancellable `write`, used by parts of libSystem itself
#[cfg(target_vendor = "apple")]
pub unsafe extern "C" fn write_nocancel(fd: c_int, buf: *const c_void, count: size_t) -> ssize_t {
    if count == 0 {
        return 0;
    }
    write_with(real::WRITE_NOCANCEL.get(), state::bracket(fd), fd, buf, count)
}

/// Colorized `write` through the given real primitive.
pub(crate) unsafe fn write_with(
    real: WriteFn,
    bracket: Option<&Bracket>,
    fd: c_int,
    buf: *const c_void,
    count: size_t,
) -> ssize_t {
    // Let the kernel report EFAULT exactly as it would have
    if buf.is_null() {
        return real(fd, buf, count);
    }
    let payload = slice::from_raw_parts(buf.cast::<u8>(), count);
    wrap(bracket, |bytes| real(fd, bytes.as_ptr().cast(), bytes.len()), payload)
}
