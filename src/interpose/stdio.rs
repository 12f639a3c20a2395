//! Buffered stream writes: block, character and string variants.
//!
//! Every variant reduces to a block write of raw bytes through the real
//! `fwrite` (or `fwrite_unlocked` for the unlocked variants).

use std::slice;

use libc::{c_char, c_int, c_void, size_t, FILE};

use super::real::{self, FwriteFn, Resolved};
use super::sys;
use crate::config::Bracket;
use crate::core::{state, wrap::wrap};

/// Bracket of the descriptor behind `stream`
fn stream_bracket(stream: *mut FILE) -> Option<&'static Bracket> {
    sys::stream_fd(stream).and_then(state::bracket)
}

unsafe fn block_write(
    real: &Resolved<FwriteFn>,
    data: *const c_void,
    size: size_t,
    count: size_t,
    stream: *mut FILE,
) -> size_t {
    if size == 0 || count == 0 {
        return 0;
    }
    fwrite_with(real.get(), stream_bracket(stream), data, size, count, stream)
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn fwrite(
    data: *const c_void,
    size: size_t,
    count: size_t,
    stream: *mut FILE,
) -> size_t {
    block_write(&real::FWRITE, data, size, count, stream)
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn fwrite_unlocked(
    data: *const c_void,
    size: size_t,
    count: size_t,
    stream: *mut FILE,
) -> size_t {
    block_write(&real::FWRITE_UNLOCKED, data, size, count, stream)
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn fputc(c: c_int, stream: *mut FILE) -> c_int {
    fputc_with(real::FWRITE.get(), stream_bracket(stream), c, stream)
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn fputc_unlocked(c: c_int, stream: *mut FILE) -> c_int {
    fputc_with(real::FWRITE_UNLOCKED.get(), stream_bracket(stream), c, stream)
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn fputs(s: *const c_char, stream: *mut FILE) -> c_int {
    fputs_with(real::FWRITE.get(), stream_bracket(stream), s, stream)
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn fputs_unlocked(s: *const c_char, stream: *mut FILE) -> c_int {
    fputs_with(real::FWRITE_UNLOCKED.get(), stream_bracket(stream), s, stream)
}

/// Colorized `fwrite`; returns whole items written, like the real one.
pub(crate) unsafe fn fwrite_with(
    real: FwriteFn,
    bracket: Option<&Bracket>,
    data: *const c_void,
    size: size_t,
    count: size_t,
    stream: *mut FILE,
) -> size_t {
    let total = match size.checked_mul(count) {
        Some(total) if bracket.is_some() && !data.is_null() => total,
        _ => return real(data, size, count, stream),
    };
    if total == 0 {
        return 0;
    }

    let payload = slice::from_raw_parts(data.cast::<u8>(), total);
    let written = wrap(
        bracket,
        |bytes| real(bytes.as_ptr().cast(), 1, bytes.len(), stream) as isize,
        payload,
    );
    written.max(0) as size_t / size
}

/// Colorized `fputc`: the character as `unsigned char`, or `EOF`.
pub(crate) unsafe fn fputc_with(
    real: FwriteFn,
    bracket: Option<&Bracket>,
    c: c_int,
    stream: *mut FILE,
) -> c_int {
    let byte = c as u8;
    let written = fwrite_with(real, bracket, (&byte as *const u8).cast(), 1, 1, stream);
    if written == 1 {
        c_int::from(byte)
    } else {
        libc::EOF
    }
}

/// Colorized `fputs`: a non-negative count when the whole string was
/// written, `EOF` otherwise. The terminating NUL is not written.
pub(crate) unsafe fn fputs_with(
    real: FwriteFn,
    bracket: Option<&Bracket>,
    s: *const c_char,
    stream: *mut FILE,
) -> c_int {
    let len = libc::strlen(s);
    if len == 0 {
        return 0;
    }
    let written = fwrite_with(real, bracket, s.cast(), 1, len, stream);
    if written == len {
        c_int::try_from(len).unwrap_or(c_int::MAX)
    } else {
        libc::EOF
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::wrap::tests::Recorder;
    use std::cell::RefCell;
    use std::ptr;

    thread_local! {
        static SINK: RefCell<Recorder> = RefCell::new(Recorder::default());
    }

    /// `fwrite` stand-in that records into a per-thread [`Recorder`]
    pub(crate) unsafe extern "C" fn fake_fwrite(
        data: *const c_void,
        size: size_t,
        count: size_t,
        _stream: *mut FILE,
    ) -> size_t {
        let bytes = slice::from_raw_parts(data.cast::<u8>(), size * count);
        let n = SINK.with(|sink| sink.borrow_mut().write(bytes));
        if n <= 0 {
            0
        } else {
            n as size_t / size
        }
    }

    pub(crate) fn script(results: &[Option<isize>]) {
        SINK.with(|sink| *sink.borrow_mut() = Recorder::scripted(results));
    }

    pub(crate) fn output() -> Vec<u8> {
        SINK.with(|sink| sink.borrow().output.clone())
    }

    pub(crate) fn calls() -> usize {
        SINK.with(|sink| sink.borrow().calls.len())
    }

    fn red() -> Bracket {
        Bracket::new(b"\x1b[31m".to_vec()).unwrap()
    }

    #[test]
    fn test_fwrite_counts_items() {
        let bracket = red();
        let data = [1u8, 2, 3, 4, 5, 6];

        let items =
            unsafe { fwrite_with(fake_fwrite, Some(&bracket), data.as_ptr().cast(), 2, 3, ptr::null_mut()) };

        assert_eq!(items, 3);
        let mut expected = b"\x1b[31m".to_vec();
        expected.extend_from_slice(&data);
        expected.extend_from_slice(b"\x1b[0m");
        assert_eq!(output(), expected);
    }

    #[test]
    fn test_fwrite_partial_item() {
        script(&[None, Some(5)]);
        let bracket = red();
        let data = [0u8; 8];

        let items =
            unsafe { fwrite_with(fake_fwrite, Some(&bracket), data.as_ptr().cast(), 4, 2, ptr::null_mut()) };

        assert_eq!(items, 1);
    }

    #[test]
    fn test_fwrite_disabled_passes_through() {
        let data = b"abc";
        let items = unsafe { fwrite_with(fake_fwrite, None, data.as_ptr().cast(), 1, 3, ptr::null_mut()) };

        assert_eq!(items, 3);
        assert_eq!(output(), b"abc");
        assert_eq!(calls(), 1);
    }

    #[test]
    fn test_fwrite_zero_items_is_noop() {
        let items = unsafe { fwrite(ptr::null(), 4, 0, ptr::null_mut()) };
        assert_eq!(items, 0);
    }

    #[test]
    fn test_fputc_returns_character() {
        let bracket = red();

        let c = unsafe { fputc_with(fake_fwrite, Some(&bracket), 0x141, ptr::null_mut()) };

        assert_eq!(c, 0x41);
        assert_eq!(output(), b"\x1b[31mA\x1b[0m");
    }

    #[test]
    fn test_fputc_partial_begin_is_eof() {
        script(&[Some(3)]);
        let bracket = red();

        let c = unsafe { fputc_with(fake_fwrite, Some(&bracket), b'x' as c_int, ptr::null_mut()) };

        assert_eq!(c, libc::EOF);
        assert!(!output().contains(&b'x'));
    }

    #[test]
    fn test_fputs_excludes_terminator() {
        let bracket = red();

        let n = unsafe { fputs_with(fake_fwrite, Some(&bracket), c"oops\n".as_ptr(), ptr::null_mut()) };

        assert_eq!(n, 5);
        assert_eq!(output(), b"\x1b[31moops\n\x1b[0m");
    }

    #[test]
    fn test_fputs_short_write_is_eof() {
        script(&[Some(2)]);

        let n = unsafe { fputs_with(fake_fwrite, None, c"hello".as_ptr(), ptr::null_mut()) };

        assert_eq!(n, libc::EOF);
    }

    #[test]
    fn test_fputs_empty_string() {
        let bracket = red();

        let n = unsafe { fputs_with(fake_fwrite, Some(&bracket), c"".as_ptr(), ptr::null_mut()) };

        assert_eq!(n, 0);
        assert_eq!(calls(), 0);
    }
}
