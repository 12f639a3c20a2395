//! stderred - colorize what programs write to the terminal
//!
//! Loaded into a process with `LD_PRELOAD` (or `DYLD_INSERT_LIBRARIES` on
//! macOS), stderred wraps every write to a colorized descriptor between a
//! begin sequence (red for stderr by default) and a reset, so error output
//! stands out from regular output.
//!
//! ```text
//! LD_PRELOAD=/usr/lib/libstderred.so ls /nonexistent
//! ```
//!
//! # Layout
//!
//! - [`config`]: which descriptors are colorized, and with what
//! - [`core`]: the write-wrapping protocol and process-wide state
//! - [`interpose`]: adapters for each intercepted output primitive
//!
//! Initialization runs once from a load-time constructor, before `main` of
//! the host program. Until it has run every descriptor passes through
//! untouched.

#![cfg_attr(feature = "c-variadic", feature(c_variadic))]

pub mod config;
pub mod core;
pub mod interpose;
mod logging;

use tracing::{debug, info};

use crate::config::{ConfigurationTable, ProcessEnvironment};

/// Resolve the configuration for this process and publish it.
///
/// Called by the load-time constructor. Later calls are no-ops.
pub fn init() {
    // Without a log file there is nowhere to report a failure here
    let _ = logging::init();

    let program = interpose::sys::program_name();
    let table = ConfigurationTable::resolve(&ProcessEnvironment, &program);
    let enabled: Vec<_> = table.enabled_descriptors().collect();
    info!(
        pid = std::process::id(),
        program = %program.to_string_lossy(),
        ?enabled,
        "stderred loaded"
    );

    if !crate::core::state::install(table) {
        debug!("configuration already installed");
    }
}

#[cfg(not(test))]
extern "C" fn initialize() {
    init();
}

#[cfg(not(test))]
#[used]
#[cfg_attr(
    any(target_os = "linux", target_os = "android", target_os = "freebsd"),
    link_section = ".init_array"
)]
#[cfg_attr(target_vendor = "apple", link_section = "__DATA,__mod_init_func")]
static INITIALIZE: extern "C" fn() = initialize;
