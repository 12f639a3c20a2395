//! C-variadic entry points.
//!
//! Each one captures its arguments as a `va_list` and defers to the matching
//! `va_list` adapter. Defining these needs the nightly `c_variadic` feature,
//! hence the `c-variadic` cargo feature.

use std::ffi::{CStr, VaListImpl};
use std::mem;

use libc::{c_char, c_int, c_uint, FILE};

use super::diag::{around, flush_stdout, stderr_target};
use super::format::{self, Rendered};
use super::real;
use super::sys::VaList;
use super::warn;

/// The caller's arguments as a plain `va_list` pointer.
fn raw(args: &mut VaListImpl<'_>) -> VaList {
    // SAFETY: on every supported target `VaList` is a single pointer to the
    // argument state (see `sys::VaList`).
    unsafe { mem::transmute(args.as_va_list()) }
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn fprintf(stream: *mut FILE, format: *const c_char, mut args: ...) -> c_int {
    format::vfprintf(stream, format, raw(&mut args))
}

/// Fortified `fprintf`; the flag only affects `%n` checking in libc.
#[cfg(not(target_vendor = "apple"))]
#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn __fprintf_chk(
    stream: *mut FILE,
    _flag: c_int,
    format: *const c_char,
    mut args: ...
) -> c_int {
    format::vfprintf(stream, format, raw(&mut args))
}

#[cfg(not(target_vendor = "apple"))]
#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn fprintf_unlocked(
    stream: *mut FILE,
    format: *const c_char,
    mut args: ...
) -> c_int {
    format::vfprintf_unlocked(stream, format, raw(&mut args))
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn warn(format: *const c_char, mut args: ...) {
    warn::vwarn(format, raw(&mut args));
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn warnx(format: *const c_char, mut args: ...) {
    warn::vwarnx(format, raw(&mut args));
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn warnc(code: c_int, format: *const c_char, mut args: ...) {
    warn::vwarnc(code, format, raw(&mut args));
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn err(eval: c_int, format: *const c_char, mut args: ...) -> ! {
    warn::verr(eval, format, raw(&mut args))
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn errx(eval: c_int, format: *const c_char, mut args: ...) -> ! {
    warn::verrx(eval, format, raw(&mut args))
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn errc(eval: c_int, code: c_int, format: *const c_char, mut args: ...) -> ! {
    warn::verrc(eval, code, format, raw(&mut args))
}

/// GNU `error`: the message is rendered here and passed to the real
/// primitive as `"%s"`, then the process exits when `status` is non-zero.
/// The message ends at its first NUL byte.
#[cfg(not(target_vendor = "apple"))]
#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn error(status: c_int, errnum: c_int, format: *const c_char, mut args: ...) {
    verror(status, errnum, None, format, raw(&mut args));
}

#[cfg(not(target_vendor = "apple"))]
#[cfg_attr(not(test), no_mangle)]
pub unsafe extern "C" fn error_at_line(
    status: c_int,
    errnum: c_int,
    filename: *const c_char,
    linenum: c_uint,
    format: *const c_char,
    mut args: ...
) {
    verror(status, errnum, Some((filename, linenum)), format, raw(&mut args));
}

#[cfg(not(target_vendor = "apple"))]
unsafe fn verror(
    status: c_int,
    errnum: c_int,
    location: Option<(*const c_char, c_uint)>,
    format: *const c_char,
    ap: VaList,
) {
    flush_stdout();

    // An empty message still prints the program name and `strerror(errnum)`
    let rendered = Rendered::new(format, ap);
    let fallback = if format.is_null() { c"" } else { CStr::from_ptr(format) };
    let message = format::diagnostic_text(rendered.as_ref(), fallback);
    around(stderr_target(), || match location {
        None => (real::ERROR.get())(0, errnum, c"%s".as_ptr(), message.as_ptr()),
        Some((filename, linenum)) => (real::ERROR_AT_LINE.get())(
            0,
            errnum,
            filename,
            linenum,
            c"%s".as_ptr(),
            message.as_ptr(),
        ),
    });

    if status != 0 {
        libc::exit(status);
    }
}
