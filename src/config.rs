//! Descriptor configuration for stderred.
//!
//! This module decides, once per process, which output descriptors get
//! colorized and with which escape sequences:
//! - Program exclusion (`bash`, plus an optional blacklist pattern)
//! - Terminal detection per descriptor
//! - Begin-sequence lookup with per-descriptor, per-stream and default values
//!
//! # Environment
//!
//! ```text
//! STDERRED_BLACKLIST='^(bash|vim)$'      # extended regex over the program name
//! STDERRED_ESC_CODE_FD3=$'\e[35m'        # descriptor 3
//! STDERRED_ESC_CODE_STDOUT=$'\e[36m'     # descriptor 1
//! STDERRED_ESC_CODE_STDERR=$'\e[1;31m'   # descriptor 2
//! STDERRED_ESC_CODE=$'\e[33m'            # descriptor 2, lowest precedence
//! ```
//!
//! Values are written verbatim. A variable that is set but empty switches its
//! descriptor off.

use std::array;
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};

use libc::c_int;
use regex::bytes::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Number of descriptors the table covers (0..=9)
pub const TABLE_SIZE: usize = 10;

/// Per-descriptor variables are only consulted below this descriptor number
pub const FD_ENV_LOOKUP_LIMIT: usize = 1024;

/// Program that is never colorized (its line editor tracks the cursor itself)
pub const EXCLUDED_PROGRAM: &str = "bash";

pub const BLACKLIST_VAR: &str = "STDERRED_BLACKLIST";
pub const FD_VAR_PREFIX: &str = "STDERRED_ESC_CODE_FD";
pub const STDOUT_VAR: &str = "STDERRED_ESC_CODE_STDOUT";
pub const STDERR_VAR: &str = "STDERRED_ESC_CODE_STDERR";
pub const GENERIC_VAR: &str = "STDERRED_ESC_CODE";

/// Default begin sequence for stdout (green)
pub const DEFAULT_STDOUT_BEGIN: &[u8] = b"\x1b[32m";
/// Default begin sequence for stderr (red)
pub const DEFAULT_STDERR_BEGIN: &[u8] = b"\x1b[31m";
/// End sequence for every colorized descriptor
pub const RESET: &[u8] = b"\x1b[0m";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid STDERRED_BLACKLIST pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("STDERRED_BLACKLIST is not valid UTF-8")]
    NonUnicodePattern,
}

/// Where the resolver reads its inputs from.
pub trait Environment {
    /// Value of an environment variable, if set
    fn var(&self, name: &str) -> Option<OsString>;

    /// Whether the descriptor is connected to a terminal
    fn is_terminal(&self, fd: c_int) -> bool;
}

/// The real process environment
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }

    fn is_terminal(&self, fd: c_int) -> bool {
        unsafe { libc::isatty(fd) == 1 }
    }
}

/// Begin/end escape sequences around a colorized write.
///
/// Both sequences are non-empty; an empty begin sequence cannot be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bracket {
    begin: Vec<u8>,
    end: &'static [u8],
}

impl Bracket {
    /// Bracket with the given begin sequence and the reset end sequence
    pub fn new(begin: Vec<u8>) -> Option<Self> {
        if begin.is_empty() {
            return None;
        }
        Some(Self { begin, end: RESET })
    }

    pub fn begin(&self) -> &[u8] {
        &self.begin
    }

    pub fn end(&self) -> &[u8] {
        self.end
    }
}

/// Colorization settings of one descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorConfig {
    /// `Some` when the descriptor is colorized
    bracket: Option<Bracket>,
}

static DISABLED: DescriptorConfig = DescriptorConfig { bracket: None };

impl DescriptorConfig {
    pub fn enabled(bracket: Bracket) -> Self {
        Self {
            bracket: Some(bracket),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.bracket.is_some()
    }

    pub fn bracket(&self) -> Option<&Bracket> {
        self.bracket.as_ref()
    }
}

/// Per-descriptor settings for descriptors `0..TABLE_SIZE`.
///
/// Built once by [`ConfigurationTable::resolve`]; nothing mutates it
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationTable {
    slots: [DescriptorConfig; TABLE_SIZE],
}

impl Default for ConfigurationTable {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ConfigurationTable {
    /// Table with every descriptor disabled
    pub fn disabled() -> Self {
        Self {
            slots: array::from_fn(|_| DescriptorConfig::default()),
        }
    }

    /// Build the table for `program` from `env`.
    pub fn resolve(env: &impl Environment, program: &OsStr) -> Self {
        match is_excluded(env, program) {
            Ok(false) => {}
            Ok(true) => {
                info!(program = %program.to_string_lossy(), "program excluded, colorization disabled");
                return Self::disabled();
            }
            Err(e) => {
                warn!("{}; colorization disabled", e);
                return Self::disabled();
            }
        }

        Self {
            slots: array::from_fn(|fd| resolve_descriptor(env, fd)),
        }
    }

    /// Settings for `fd`; out-of-range descriptors are always disabled
    pub fn get(&self, fd: c_int) -> &DescriptorConfig {
        usize::try_from(fd)
            .ok()
            .and_then(|fd| self.slots.get(fd))
            .unwrap_or(&DISABLED)
    }

    pub fn bracket(&self, fd: c_int) -> Option<&Bracket> {
        self.get(fd).bracket()
    }

    pub fn is_enabled(&self, fd: c_int) -> bool {
        self.get(fd).is_enabled()
    }

    /// Descriptors that are colorized
    pub fn enabled_descriptors(&self) -> impl Iterator<Item = c_int> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_enabled())
            .map(|(fd, _)| fd as c_int)
    }
}

/// Whether the whole process opts out of colorization.
fn is_excluded(env: &impl Environment, program: &OsStr) -> Result<bool, ConfigError> {
    if program == EXCLUDED_PROGRAM {
        return Ok(true);
    }

    let Some(pattern) = env.var(BLACKLIST_VAR) else {
        return Ok(false);
    };
    let pattern = pattern.into_string().map_err(|_| ConfigError::NonUnicodePattern)?;
    let regex = Regex::new(&pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.clone(),
        source,
    })?;
    Ok(regex.is_match(program.as_bytes()))
}

fn resolve_descriptor(env: &impl Environment, fd: usize) -> DescriptorConfig {
    // Redirected descriptors are never colorized, whatever the environment says
    if !env.is_terminal(fd as c_int) {
        return DescriptorConfig::default();
    }

    let begin = override_sequence(env, fd).or_else(|| default_sequence(fd).map(<[u8]>::to_vec));
    match begin.and_then(Bracket::new) {
        Some(bracket) => {
            debug!(fd, "descriptor colorized");
            DescriptorConfig::enabled(bracket)
        }
        None => DescriptorConfig::default(),
    }
}

/// First environment override set for `fd`, in precedence order.
fn override_sequence(env: &impl Environment, fd: usize) -> Option<Vec<u8>> {
    override_vars(fd).into_iter().find_map(|name| {
        let value = env.var(&name)?;
        debug!(fd, var = %name, "begin sequence from environment");
        Some(value.into_vec())
    })
}

/// Variables consulted for `fd`, highest precedence first
fn override_vars(fd: usize) -> Vec<String> {
    let mut names = Vec::with_capacity(3);
    if fd < FD_ENV_LOOKUP_LIMIT {
        names.push(format!("{}{}", FD_VAR_PREFIX, fd));
    }
    match fd {
        1 => names.push(STDOUT_VAR.to_string()),
        2 => {
            names.push(STDERR_VAR.to_string());
            names.push(GENERIC_VAR.to_string());
        }
        _ => {}
    }
    names
}

fn default_sequence(fd: usize) -> Option<&'static [u8]> {
    match fd {
        1 => Some(DEFAULT_STDOUT_BEGIN),
        2 => Some(DEFAULT_STDERR_BEGIN),
        _ => None,
    }
}
