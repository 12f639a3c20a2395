//! Process-wide state
//!
//! The configuration table is published exactly once, from the load-time
//! constructor, and is read-only afterwards. Readers either see the complete
//! table or no table at all; with no table every descriptor is disabled.

use std::sync::OnceLock;

use libc::c_int;

use super::diagnostic::DiagnosticTarget;
use crate::config::{Bracket, ConfigurationTable};

static TABLE: OnceLock<ConfigurationTable> = OnceLock::new();

/// Target of the warn/err family (see [`DiagnosticTarget`])
pub static DIAGNOSTICS: DiagnosticTarget = DiagnosticTarget::new();

/// Publish the table. Returns `false` if one was already installed.
pub fn install(table: ConfigurationTable) -> bool {
    if TABLE.set(table).is_err() {
        return false;
    }
    DIAGNOSTICS.set_target(self::table(), None);
    true
}

/// The published table, if initialization has run
pub fn table() -> Option<&'static ConfigurationTable> {
    TABLE.get()
}

/// Bracket for `fd`, or `None` when it is not colorized
pub fn bracket(fd: c_int) -> Option<&'static Bracket> {
    table()?.bracket(fd)
}

/// Bracket used by the warn/err family
pub fn diagnostic_bracket() -> Option<(c_int, &'static Bracket)> {
    DIAGNOSTICS.bracket(table())
}
