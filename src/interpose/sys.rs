//! Raw libc bindings the libc crate does not carry.
//!
//! Everything here is a thin declaration; the safe-ish helpers only paper over
//! the per-platform spelling of the same facility.

use std::ffi::{CStr, OsString};
use std::os::unix::ffi::OsStringExt;

use libc::{c_char, c_int, c_void, FILE};

/// A `va_list` as it crosses a call boundary.
///
/// On x86_64 a `va_list` argument decays to a pointer to its register save
/// area; on aarch64 (AAPCS64) the 32-byte struct is passed by reference and
/// Apple's variant is a plain `char *`. Either way the callee receives one
/// pointer, so the value can be forwarded untouched to another `v*` function.
pub type VaList = *mut c_void;

extern "C" {
    pub fn vasprintf(strp: *mut *mut c_char, format: *const c_char, ap: VaList) -> c_int;
}

#[cfg(target_os = "linux")]
extern "C" {
    static program_invocation_short_name: *const c_char;
    static stdout: *mut FILE;
    static stderr: *mut FILE;
}

#[cfg(not(target_os = "linux"))]
extern "C" {
    #[link_name = "__stdoutp"]
    static stdout: *mut FILE;
    #[link_name = "__stderrp"]
    static stderr: *mut FILE;
}

/// Short name the program was invoked as (`argv[0]` without directories).
pub fn program_name() -> OsString {
    #[cfg(target_os = "linux")]
    let name = unsafe { program_invocation_short_name };
    #[cfg(not(target_os = "linux"))]
    let name = unsafe { libc::getprogname() };

    if name.is_null() {
        return OsString::new();
    }
    let bytes = unsafe { CStr::from_ptr(name) }.to_bytes().to_vec();
    OsString::from_vec(bytes)
}

/// The process's `stdout` stream.
pub fn stdout_stream() -> *mut FILE {
    unsafe { stdout }
}

/// The process's `stderr` stream.
pub fn stderr_stream() -> *mut FILE {
    unsafe { stderr }
}

pub fn errno() -> c_int {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

pub fn set_errno(code: c_int) {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    unsafe {
        *libc::__errno_location() = code;
    }
    #[cfg(target_vendor = "apple")]
    unsafe {
        *libc::__error() = code;
    }
    #[cfg(target_os = "freebsd")]
    unsafe {
        *libc::__error() = code;
    }
}

/// Text of `strerror(code)` as raw bytes.
pub fn strerror(code: c_int) -> Vec<u8> {
    let text = unsafe { libc::strerror(code) };
    if text.is_null() {
        return format!("Unknown error {}", code).into_bytes();
    }
    unsafe { CStr::from_ptr(text) }.to_bytes().to_vec()
}

/// Descriptor behind a stream, or `None` for a null or descriptor-less stream.
pub fn stream_fd(stream: *mut FILE) -> Option<c_int> {
    if stream.is_null() {
        return None;
    }
    let fd = unsafe { libc::fileno(stream) };
    (fd >= 0).then_some(fd)
}
