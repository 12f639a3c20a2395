//! Diagnostic-target tracking for the warn/err family.
//!
//! `warn`, `err` and friends never name the stream they print to; it is set
//! process-wide by `err_set_file`. The tracker remembers the descriptor of that
//! stream when it is colorizable, so each diagnostic call only reads one value.
//!
//! The target is a relaxed atomic and nothing orders it against other memory.
//! Concurrent `set_target` calls race and a diagnostic on another thread may
//! see the previous target.

use std::sync::atomic::{AtomicI32, Ordering};

use libc::c_int;

use crate::config::{Bracket, ConfigurationTable};

const NO_TARGET: c_int = -1;

/// Descriptor the warn/err family colorizes, if any
pub struct DiagnosticTarget {
    fd: AtomicI32,
}

impl Default for DiagnosticTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticTarget {
    pub const fn new() -> Self {
        Self {
            fd: AtomicI32::new(NO_TARGET),
        }
    }

    /// Retarget to `fd` (`None` means the default error descriptor).
    ///
    /// Returns whether diagnostics are colorized from now on.
    pub fn set_target(&self, table: Option<&ConfigurationTable>, fd: Option<c_int>) -> bool {
        let fd = fd.unwrap_or(libc::STDERR_FILENO);
        let colorize = table.is_some_and(|table| table.is_enabled(fd));
        self.fd
            .store(if colorize { fd } else { NO_TARGET }, Ordering::Relaxed);
        colorize
    }

    /// Colorized descriptor, or `None` when diagnostics are left alone
    pub fn target(&self) -> Option<c_int> {
        let fd = self.fd.load(Ordering::Relaxed);
        (fd != NO_TARGET).then_some(fd)
    }

    pub fn colorize_diagnostics(&self) -> bool {
        self.target().is_some()
    }

    /// Target descriptor and its bracket in `table`
    pub fn bracket<'t>(&self, table: Option<&'t ConfigurationTable>) -> Option<(c_int, &'t Bracket)> {
        let fd = self.target()?;
        Some((fd, table?.bracket(fd)?))
    }
}

/// Run `body` between the bracket's begin and end sequences.
///
/// Unlike [`wrap`](super::wrap::wrap), the body always runs: a diagnostic is
/// never dropped. A failed begin write skips the end sequence; a partial one
/// is reset immediately and the message prints uncolored.
pub fn bracketed<W, B, R>(bracket: Option<&Bracket>, mut write: W, body: B) -> R
where
    W: FnMut(&[u8]) -> isize,
    B: FnOnce() -> R,
{
    let Some(bracket) = bracket else {
        return body();
    };

    let written = write(bracket.begin());
    let colored = written > 0 && written as usize == bracket.begin().len();
    if written > 0 && !colored {
        write(bracket.end());
    }

    let result = body();

    if colored {
        write(bracket.end());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::FakeEnvironment;
    use crate::core::wrap::tests::Recorder;
    use std::cell::RefCell;
    use std::ffi::OsStr;

    fn table(terminals: &[c_int]) -> ConfigurationTable {
        let env = FakeEnvironment::with_terminals(terminals);
        ConfigurationTable::resolve(&env, OsStr::new("make"))
    }

    #[test]
    fn test_default_target_follows_stderr() {
        let target = DiagnosticTarget::new();
        assert!(!target.colorize_diagnostics());

        assert!(target.set_target(Some(&table(&[2])), None));
        assert_eq!(target.target(), Some(2));

        assert!(!target.set_target(Some(&table(&[1])), None));
        assert_eq!(target.target(), None);
    }

    #[test]
    fn test_explicit_stream_target() {
        let table = table(&[1, 2]);
        let target = DiagnosticTarget::new();

        assert!(target.set_target(Some(&table), Some(1)));
        assert_eq!(target.target(), Some(1));

        // A file stream is never a terminal
        assert!(!target.set_target(Some(&table), Some(7)));
        assert!(!target.colorize_diagnostics());
    }

    #[test]
    fn test_bracket_follows_target() {
        let env = FakeEnvironment::with_terminals(&[2, 3]).set("STDERRED_ESC_CODE_FD3", "\x1b[35m");
        let table = ConfigurationTable::resolve(&env, OsStr::new("make"));
        let target = DiagnosticTarget::new();
        assert!(target.bracket(Some(&table)).is_none());

        target.set_target(Some(&table), Some(3));
        let (fd, bracket) = target.bracket(Some(&table)).unwrap();
        assert_eq!(fd, 3);
        assert_eq!(bracket.begin(), b"\x1b[35m");

        target.set_target(Some(&table), None);
        let (fd, bracket) = target.bracket(Some(&table)).unwrap();
        assert_eq!(fd, 2);
        assert_eq!(bracket.begin(), b"\x1b[31m");
    }

    #[test]
    fn test_missing_table_disables() {
        let target = DiagnosticTarget::new();
        assert!(!target.set_target(None, None));
        assert_eq!(target.target(), None);
    }

    #[test]
    fn test_bracketed_surrounds_body() {
        let bracket = Bracket::new(b"\x1b[31m".to_vec()).unwrap();
        let rec = RefCell::new(Recorder::default());

        let value = bracketed(
            Some(&bracket),
            |b| rec.borrow_mut().write(b),
            || rec.borrow_mut().write(b"warning\n"),
        );

        assert_eq!(value, 8);
        assert_eq!(rec.borrow().output, b"\x1b[31mwarning\n\x1b[0m");
    }

    #[test]
    fn test_bracketed_partial_begin_still_prints() {
        let bracket = Bracket::new(b"\x1b[31m".to_vec()).unwrap();
        let rec = RefCell::new(Recorder::scripted(&[Some(2)]));

        bracketed(
            Some(&bracket),
            |b| rec.borrow_mut().write(b),
            || rec.borrow_mut().write(b"msg"),
        );

        assert_eq!(rec.borrow().output, b"\x1b[\x1b[0mmsg");
    }

    #[test]
    fn test_bracketed_failed_begin_skips_end() {
        let bracket = Bracket::new(b"\x1b[31m".to_vec()).unwrap();
        let rec = RefCell::new(Recorder::scripted(&[Some(-1)]));

        bracketed(
            Some(&bracket),
            |b| rec.borrow_mut().write(b),
            || rec.borrow_mut().write(b"msg"),
        );

        assert_eq!(rec.borrow().output, b"msg");
        assert_eq!(rec.borrow().calls.len(), 2);
    }
}
