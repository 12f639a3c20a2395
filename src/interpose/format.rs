//! Formatted writes (the printf family).
//!
//! Output is rendered completely with `vasprintf` first and then handed to the
//! block-write adapter as one payload, so a single bracket surrounds it.

use std::ffi::CStr;
use std::ptr;
use std::slice;

use libc::{c_char, c_int, size_t, FILE};

use super::stdio;
use super::sys::{self, VaList};

/// A `vasprintf` result, freed on drop
pub(crate) struct Rendered {
    ptr: *mut c_char,
    len: usize,
}

impl Rendered {
    /// Render `format` with `ap`; `None` if formatting or allocation fails.
    pub(crate) unsafe fn new(format: *const c_char, ap: VaList) -> Option<Self> {
        if format.is_null() {
            return None;
        }
        let mut ptr: *mut c_char = ptr::null_mut();
        let len = sys::vasprintf(&mut ptr, format, ap);
        // On failure the buffer is unspecified and must not be freed
        if len < 0 || ptr.is_null() {
            return None;
        }
        Some(Self {
            ptr,
            len: len as usize,
        })
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr.cast::<u8>(), self.len) }
    }

    /// The rendered text as a C string. Stops at the first NUL byte, so a
    /// message containing one (`%c` with `0`) is cut short there.
    pub(crate) fn as_c_str(&self) -> &CStr {
        unsafe { CStr::from_ptr(self.ptr) }
    }
}

impl Drop for Rendered {
    fn drop(&mut self) {
        unsafe { libc::free(self.ptr.cast()) };
    }
}

/// Hand rendered output to `write_block`.
///
/// Like `fprintf`, the result is the full byte count or `-1`: nothing to
/// write and a short write are both errors.
pub(crate) fn deliver<W>(rendered: Option<&[u8]>, write_block: W) -> c_int
where
    W: FnOnce(&[u8]) -> size_t,
{
    match rendered {
        Some(bytes) if !bytes.is_empty() => {
            if write_block(bytes) < bytes.len() {
                return -1;
            }
            c_int::try_from(bytes.len()).unwrap_or(c_int::MAX)
        }
        _ => -1,
    }
}

/// Text handed to the real `error`: the rendered message, or the raw format
/// when rendering failed. The diagnostic itself is never dropped.
#[cfg_attr(not(feature = "c-variadic"), allow(dead_code))]
pub(crate) fn diagnostic_text<'a>(rendered: Option<&'a Rendered>, format: &'a CStr) -> &'a CStr {
    rendered.map_or(format, Rendered::as_c_str)
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn vfprintf(stream: *mut FILE, format: *const c_char, ap: VaList) -> c_int {
    let rendered = Rendered::new(format, ap);
    deliver(rendered.as_ref().map(Rendered::as_bytes), |bytes| {
        stdio::fwrite(bytes.as_ptr().cast(), 1, bytes.len(), stream)
    })
}

/// `vfprintf` through the unlocked block write (backs `fprintf_unlocked`)
#[cfg(feature = "c-variadic")]
pub(crate) unsafe fn vfprintf_unlocked(
    stream: *mut FILE,
    format: *const c_char,
    ap: VaList,
) -> c_int {
    let rendered = Rendered::new(format, ap);
    deliver(rendered.as_ref().map(Rendered::as_bytes), |bytes| {
        stdio::fwrite_unlocked(bytes.as_ptr().cast(), 1, bytes.len(), stream)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bracket;
    use crate::interpose::stdio::tests::{fake_fwrite, output, script};

    fn through_fake(bracket: Option<&Bracket>, bytes: &[u8]) -> size_t {
        unsafe {
            stdio::fwrite_with(
                fake_fwrite,
                bracket,
                bytes.as_ptr().cast(),
                1,
                bytes.len(),
                ptr::null_mut(),
            )
        }
    }

    #[test]
    fn test_rendered_output_is_one_payload() {
        let bracket = Bracket::new(b"\x1b[31m".to_vec()).unwrap();
        let rendered = b"error: 42 files\n".to_vec();

        let n = deliver(Some(&rendered), |bytes| through_fake(Some(&bracket), bytes));

        assert_eq!(n, 16);
        assert_eq!(output(), b"\x1b[31merror: 42 files\n\x1b[0m");
    }

    #[test]
    fn test_render_failure_writes_nothing() {
        let mut called = false;
        assert_eq!(deliver(None, |_| {
            called = true;
            0
        }), -1);
        assert!(!called);
    }

    #[test]
    fn test_empty_render_is_error() {
        let n = deliver(Some(b""), |bytes| through_fake(None, bytes));
        assert_eq!(n, -1);
    }

    #[test]
    fn test_short_write_is_error() {
        script(&[None, Some(3)]);
        let bracket = Bracket::new(b"\x1b[31m".to_vec()).unwrap();

        let n = deliver(Some(b"abcdef"), |bytes| through_fake(Some(&bracket), bytes));

        assert_eq!(n, -1);
    }

    #[test]
    fn test_failed_write_matches_real_fprintf() {
        // A read-only stream rejects every write
        let stream = unsafe { libc::fopen(c"/dev/null".as_ptr(), c"r".as_ptr()) };
        assert!(!stream.is_null());

        let ours = deliver(Some(b"hello\n"), |bytes| unsafe {
            stdio::fwrite(bytes.as_ptr().cast(), 1, bytes.len(), stream)
        });
        let real = unsafe { libc::fprintf(stream, c"%s".as_ptr(), c"hello\n".as_ptr()) };
        unsafe { libc::fclose(stream) };

        assert_eq!(ours, -1);
        assert!(real < 0);
    }

    /// A `Rendered` over a `malloc`ed copy of `text`
    fn rendered(text: &CStr) -> Rendered {
        let ptr = unsafe { libc::strdup(text.as_ptr()) };
        assert!(!ptr.is_null());
        Rendered {
            ptr,
            len: text.to_bytes().len(),
        }
    }

    #[test]
    fn test_diagnostic_text_keeps_empty_message() {
        let empty = rendered(c"");
        assert_eq!(diagnostic_text(Some(&empty), c"%s"), c"");
    }

    #[test]
    fn test_diagnostic_text_falls_back_to_format() {
        assert_eq!(diagnostic_text(None, c"cannot open %s"), c"cannot open %s");
    }

    #[test]
    fn test_c_str_stops_at_nul() {
        let text = rendered(c"abcdef");
        unsafe { *text.ptr.add(2) = 0 };

        assert_eq!(text.as_bytes(), b"ab\0def");
        assert_eq!(text.as_c_str(), c"ab");
    }
}
