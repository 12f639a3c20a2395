//! The BSD warn/err family (`va_list` variants).
//!
//! These print to the stream last passed to `err_set_file` (stderr by
//! default), so the bracket comes from the diagnostic target rather than a
//! descriptor lookup. The `err` variants exit unconditionally afterwards.

use libc::{c_char, c_int};

use super::diag::{around, flush_stdout};
use super::real;
use super::sys::VaList;
use crate::config::Bracket;
use crate::core::state;

fn diagnose(body: impl FnOnce()) {
    diagnose_at(state::diagnostic_bracket(), body);
}

/// Print a diagnostic between `target`'s sequences, after pending stdout.
fn diagnose_at<R>(target: Option<(c_int, &Bracket)>, body: impl FnOnce() -> R) -> R {
    flush_stdout();
    around(target, body)
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn vwarn(format: *const c_char, ap: VaList) {
    diagnose(|| (real::VWARN.get())(format, ap));
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn vwarnx(format: *const c_char, ap: VaList) {
    diagnose(|| (real::VWARNX.get())(format, ap));
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn vwarnc(code: c_int, format: *const c_char, ap: VaList) {
    diagnose(|| (real::VWARNC.get())(code, format, ap));
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn verr(eval: c_int, format: *const c_char, ap: VaList) -> ! {
    vwarn(format, ap);
    libc::exit(eval)
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn verrx(eval: c_int, format: *const c_char, ap: VaList) -> ! {
    vwarnx(format, ap);
    libc::exit(eval)
}

#[cfg_attr(all(not(test), not(target_vendor = "apple")), no_mangle)]
pub unsafe extern "C" fn verrc(eval: c_int, code: c_int, format: *const c_char, ap: VaList) -> ! {
    vwarnc(code, format, ap);
    libc::exit(eval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpose::diag::tests::{drain, pipe, write_fd};

    #[test]
    fn test_diagnostic_is_bracketed_on_target() {
        let (read_end, write_end) = pipe();
        let bracket = Bracket::new(b"\x1b[1;31m".to_vec()).unwrap();

        diagnose_at(Some((write_end, &bracket)), || {
            write_fd(write_end, b"make: warning\n");
        });

        assert_eq!(drain(read_end, write_end), b"\x1b[1;31mmake: warning\n\x1b[0m");
    }

    #[test]
    fn test_uncolored_without_target() {
        let (read_end, write_end) = pipe();

        diagnose_at(None, || {
            write_fd(write_end, b"make: warning\n");
        });

        assert_eq!(drain(read_end, write_end), b"make: warning\n");
    }

    #[test]
    fn test_warn_without_table_is_plain() {
        // Unit tests never install a table
        assert!(state::diagnostic_bracket().is_none());
    }
}
