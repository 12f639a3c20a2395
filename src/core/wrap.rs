//! Write-wrapping protocol
//!
//! Brackets one payload write with the descriptor's begin and end sequences.
//! `perform_write` is the real primitive being adapted; it returns a byte
//! count, zero, or a negative error value, the same way `write(2)` does.

use crate::config::Bracket;

/// Write `payload` through `perform_write`, colorized when `bracket` is set.
///
/// The returned value is always the payload write's own result (or `0`),
/// never a count that includes bracket bytes:
/// - empty payload: `0`, nothing is written
/// - no bracket: one plain write, result unchanged
/// - begin write `<= 0`: that result, nothing else is written
/// - begin write partial: end sequence attempted, `0`, payload never written
/// - otherwise: payload result; the end sequence follows a positive result
pub fn wrap<F>(bracket: Option<&Bracket>, mut perform_write: F, payload: &[u8]) -> isize
where
    F: FnMut(&[u8]) -> isize,
{
    if payload.is_empty() {
        return 0;
    }

    let Some(bracket) = bracket else {
        return perform_write(payload);
    };

    let begin = bracket.begin();
    let written = perform_write(begin);
    if written <= 0 {
        return written;
    }
    if (written as usize) < begin.len() {
        // Leave the terminal uncolored rather than finish a torn sequence
        perform_write(bracket.end());
        return 0;
    }

    let result = perform_write(payload);
    if result > 0 {
        perform_write(bracket.end());
    }
    result
}
