//! Core colorization engine.
//!
//! This module contains the platform-independent logic:
//!
//! - **wrap**: begin/payload/end protocol around one write
//! - **diagnostic**: target tracking and bracketing for the warn/err family
//! - **state**: the write-once table and the diagnostic target
//!
//! # Architecture
//!
//! ```text
//! interpose (adapters per primitive)
//! ├── state::bracket(fd) ──> ConfigurationTable
//! ├── wrap::wrap(bracket, real write, payload)
//! └── diagnostic::bracketed(bracket, real write, real diagnostic)
//! ```

pub mod diagnostic;
pub mod state;
pub mod wrap;
