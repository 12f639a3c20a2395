//! Dispatch layer: one adapter per intercepted output primitive.
//!
//! - **io**: raw descriptor writes (`write`, `__write_nocancel`)
//! - **stdio**: stream block, character and string writes
//! - **format**: `vfprintf` (render, then block write)
//! - **diag**: `perror`, `err_set_file`
//! - **warn**: `vwarn`/`verr` and friends
//! - **variadic**: `fprintf`, `warn`, `err`, `error`, ... (`c-variadic` feature)
//! - **real**: resolution of the real primitives
//!
//! # Symbol routing
//!
//! On ELF targets the adapters are exported under the primitive's own name
//! and win over libc through `LD_PRELOAD`. On macOS they keep Rust-only names
//! and are registered in the `__DATA,__interpose` section instead (see
//! `macos.rs`), for use with `DYLD_INSERT_LIBRARIES`. Test builds export
//! nothing.
//!
//! The `va_list` based adapters rely on `va_list` being passed as one
//! pointer, which holds on x86_64 and aarch64 only.

pub mod diag;
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
pub mod format;
pub mod io;
pub mod real;
pub mod stdio;
pub mod sys;
#[cfg(all(
    feature = "c-variadic",
    any(target_arch = "x86_64", target_arch = "aarch64")
))]
pub mod variadic;
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
pub mod warn;

#[cfg(all(not(test), target_vendor = "apple"))]
mod macos;
