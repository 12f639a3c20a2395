//! Resolution of the real (unintercepted) primitives.
//!
//! Each intercepted primitive owns one [`Resolved`] cell. The cell is filled
//! on first use with `dlsym(RTLD_NEXT, name)` and never invalidated. Two
//! threads racing on the first call both perform the lookup and store the same
//! pointer, so the cell needs no lock.
//!
//! Both symbol routing strategies resolve the same way: under `LD_PRELOAD`
//! the next definition after this library is libc's, and on macOS dyld does
//! not apply interpose tuples to lookups made by the interposing image itself.

use std::ffi::CStr;
use std::marker::PhantomData;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use libc::{c_char, c_int, c_void, size_t, ssize_t, FILE};

use super::sys::{self, VaList};

/// Lazily resolved pointer to the real implementation of a primitive.
pub struct Resolved<F> {
    /// Symbol name
    name: &'static CStr,
    /// Cached address (null until resolved)
    slot: AtomicPtr<c_void>,
    _marker: PhantomData<F>,
}

impl<F: Copy> Resolved<F> {
    /// Fails to compile for an `F` that is not a plain function pointer
    const POINTER_SIZED: () = assert!(mem::size_of::<F>() == mem::size_of::<*mut c_void>());

    pub const fn new(name: &'static CStr) -> Self {
        Self {
            name,
            slot: AtomicPtr::new(ptr::null_mut()),
            _marker: PhantomData,
        }
    }

    /// Symbol name this cell resolves
    pub fn name(&self) -> &'static CStr {
        self.name
    }

    /// Get the real implementation, resolving it on first use.
    ///
    /// Aborts the process with `errno` set to `ENOSYS` when the symbol cannot
    /// be found: there is no way to perform the caller's I/O without it.
    pub fn get(&self) -> F {
        let () = Self::POINTER_SIZED;

        let mut addr = self.slot.load(Ordering::Relaxed);
        if addr.is_null() {
            addr = unsafe { libc::dlsym(libc::RTLD_NEXT, self.name.as_ptr()) };
            if addr.is_null() {
                unresolved();
            }
            self.slot.store(addr, Ordering::Relaxed);
        }
        // SAFETY: `F` is a function pointer type matching the C prototype of
        // `name`, and `addr` is that symbol's address.
        unsafe { mem::transmute_copy::<*mut c_void, F>(&addr) }
    }
}

// Nothing is logged here: logging writes through the very primitives that
// failed to resolve.
#[cold]
fn unresolved() -> ! {
    sys::set_errno(libc::ENOSYS);
    std::process::abort()
}

pub type WriteFn = unsafe extern "C" fn(c_int, *const c_void, size_t) -> ssize_t;
pub type FwriteFn = unsafe extern "C" fn(*const c_void, size_t, size_t, *mut FILE) -> size_t;
pub type ErrSetFileFn = unsafe extern "C" fn(*mut c_void);
pub type ErrorFn = unsafe extern "C" fn(c_int, c_int, *const c_char, ...);
pub type ErrorAtLineFn =
    unsafe extern "C" fn(c_int, c_int, *const c_char, libc::c_uint, *const c_char, ...);
pub type VwarnFn = unsafe extern "C" fn(*const c_char, VaList);
pub type VwarncFn = unsafe extern "C" fn(c_int, *const c_char, VaList);

pub static WRITE: Resolved<WriteFn> = Resolved::new(c"write");
#[cfg(target_vendor = "apple")]
pub static WRITE_NOCANCEL: Resolved<WriteFn> = Resolved::new(c"__write_nocancel");
pub static FWRITE: Resolved<FwriteFn> = Resolved::new(c"fwrite");
pub static FWRITE_UNLOCKED: Resolved<FwriteFn> = Resolved::new(c"fwrite_unlocked");
pub static ERR_SET_FILE: Resolved<ErrSetFileFn> = Resolved::new(c"err_set_file");
pub static ERROR: Resolved<ErrorFn> = Resolved::new(c"error");
pub static ERROR_AT_LINE: Resolved<ErrorAtLineFn> = Resolved::new(c"error_at_line");
pub static VWARN: Resolved<VwarnFn> = Resolved::new(c"vwarn");
pub static VWARNX: Resolved<VwarnFn> = Resolved::new(c"vwarnx");
pub static VWARNC: Resolved<VwarncFn> = Resolved::new(c"vwarnc");
