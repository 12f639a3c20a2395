//! Diagnostic helpers: `perror`, `err_set_file` and the shared bracketing
//! used by the warn/err and error families.

use libc::{c_char, c_int, c_void};
use tracing::debug;

use super::{real, stdio, sys};
use crate::config::{Bracket, ConfigurationTable};
use crate::core::diagnostic::{bracketed, DiagnosticTarget};
use crate::core::state;

/// Flush pending stdout output so diagnostics stay ordered after it.
pub(crate) fn flush_stdout() {
    unsafe {
        libc::fflush(sys::stdout_stream());
    }
}

/// Run a real diagnostic primitive between `target`'s begin and end
/// sequences, written with the raw `write` to the target descriptor.
pub(crate) fn around<R>(target: Option<(c_int, &Bracket)>, body: impl FnOnce() -> R) -> R {
    let Some((fd, bracket)) = target else {
        return body();
    };
    let write = |bytes: &[u8]| unsafe { (real::WRITE.get())(fd, bytes.as_ptr().cast(), bytes.len()) };
    bracketed(Some(bracket), write, body)
}

/// Standard error's own bracket (for helpers that always print there)
#[cfg_attr(not(feature = "c-variadic"), allow(dead_code))]
pub(crate) fn stderr_target() -> Option<(c_int, &'static Bracket)> {
    state::bracket(libc::STDERR_FILENO).map(|bracket| (libc::STDERR_FILENO, bracket))
}

/// `perror` text: `"<msg>: <strerror>\n"`, or just the error text when
/// `msg` is null or empty.
pub(crate) fn perror_message(msg: Option<&[u8]>, description: &[u8]) -> Vec<u8> {
    let mut text = Vec::with_capacity(description.len() + 2 + msg.map_or(0, <[u8]>::len));
    if let Some(msg) = msg.filter(|msg| !msg.is_empty()) {
        text.extend_from_slice(msg);
        text.extend_from_slice(b": ");
    }
    text.extend_from_slice(description);
    text.push(b'\n');
    text
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn perror(msg: *const c_char) {
    let code = sys::errno();
    flush_stdout();

    let msg = (!msg.is_null()).then(|| std::ffi::CStr::from_ptr(msg).to_bytes());
    let text = perror_message(msg, &sys::strerror(code));
    stdio::fwrite(text.as_ptr().cast(), 1, text.len(), sys::stderr_stream());

    // perror leaves errno alone
    sys::set_errno(code);
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn err_set_file(fp: *mut c_void) {
    (real::ERR_SET_FILE.get())(fp);
    retarget(&state::DIAGNOSTICS, state::table(), fp);
}

/// Point `target` at the stream `err_set_file` selected.
pub(crate) unsafe fn retarget(
    target: &DiagnosticTarget,
    table: Option<&ConfigurationTable>,
    fp: *mut c_void,
) -> bool {
    // A null stream means "back to stderr"
    let fd = (!fp.is_null()).then(|| libc::fileno(fp.cast()));
    let colorize = target.set_target(table, fd);
    debug!(?fd, colorize, "diagnostic target changed");
    colorize
}
