//! dyld interposition table.
//!
//! Each entry pairs an adapter with the libc symbol it replaces. dyld rewrites
//! every other image's references to `old_func` into `new_func` when this
//! library is loaded through `DYLD_INSERT_LIBRARIES`.

use libc::{c_char, c_int, c_void, size_t, ssize_t, FILE};

use super::sys::VaList;
use super::{diag, format, io, stdio, warn};

#[repr(C)]
pub struct Interpose {
    pub new_func: *const (),
    pub old_func: *const (),
}

unsafe impl Sync for Interpose {}

extern "C" {
    #[link_name = "write"]
    fn real_write(fd: c_int, buf: *const c_void, count: size_t) -> ssize_t;
    #[link_name = "__write_nocancel"]
    fn real_write_nocancel(fd: c_int, buf: *const c_void, count: size_t) -> ssize_t;
    #[link_name = "fwrite"]
    fn real_fwrite(data: *const c_void, size: size_t, count: size_t, stream: *mut FILE) -> size_t;
    #[link_name = "fputc"]
    fn real_fputc(c: c_int, stream: *mut FILE) -> c_int;
    #[link_name = "fputs"]
    fn real_fputs(s: *const c_char, stream: *mut FILE) -> c_int;
    #[link_name = "vfprintf"]
    fn real_vfprintf(stream: *mut FILE, format: *const c_char, ap: VaList) -> c_int;
    #[link_name = "perror"]
    fn real_perror(msg: *const c_char);
    #[link_name = "err_set_file"]
    fn real_err_set_file(fp: *mut c_void);
    #[link_name = "vwarn"]
    fn real_vwarn(format: *const c_char, ap: VaList);
    #[link_name = "vwarnx"]
    fn real_vwarnx(format: *const c_char, ap: VaList);
    #[link_name = "vwarnc"]
    fn real_vwarnc(code: c_int, format: *const c_char, ap: VaList);
    #[link_name = "verr"]
    fn real_verr(eval: c_int, format: *const c_char, ap: VaList) -> !;
    #[link_name = "verrx"]
    fn real_verrx(eval: c_int, format: *const c_char, ap: VaList) -> !;
    #[link_name = "verrc"]
    fn real_verrc(eval: c_int, code: c_int, format: *const c_char, ap: VaList) -> !;
}

#[cfg(feature = "c-variadic")]
extern "C" {
    #[link_name = "fprintf"]
    fn real_fprintf(stream: *mut FILE, format: *const c_char, ...) -> c_int;
    #[link_name = "warn"]
    fn real_warn(format: *const c_char, ...);
    #[link_name = "warnx"]
    fn real_warnx(format: *const c_char, ...);
    #[link_name = "warnc"]
    fn real_warnc(code: c_int, format: *const c_char, ...);
    #[link_name = "err"]
    fn real_err(eval: c_int, format: *const c_char, ...) -> !;
    #[link_name = "errx"]
    fn real_errx(eval: c_int, format: *const c_char, ...) -> !;
    #[link_name = "errc"]
    fn real_errc(eval: c_int, code: c_int, format: *const c_char, ...) -> !;
}

macro_rules! interpose {
    ($($(#[$attr:meta])* $entry:ident: $new:path => $old:ident;)*) => {
        $(
            $(#[$attr])*
            #[link_section = "__DATA,__interpose"]
            #[used]
            pub static $entry: Interpose = Interpose {
                new_func: $new as _,
                old_func: $old as _,
            };
        )*
    };
}

interpose! {
    IT_WRITE: io::write => real_write;
    IT_WRITE_NOCANCEL: io::write_nocancel => real_write_nocancel;
    IT_FWRITE: stdio::fwrite => real_fwrite;
    IT_FPUTC: stdio::fputc => real_fputc;
    IT_FPUTS: stdio::fputs => real_fputs;
    IT_VFPRINTF: format::vfprintf => real_vfprintf;
    IT_PERROR: diag::perror => real_perror;
    IT_ERR_SET_FILE: diag::err_set_file => real_err_set_file;
    IT_VWARN: warn::vwarn => real_vwarn;
    IT_VWARNX: warn::vwarnx => real_vwarnx;
    IT_VWARNC: warn::vwarnc => real_vwarnc;
    IT_VERR: warn::verr => real_verr;
    IT_VERRX: warn::verrx => real_verrx;
    IT_VERRC: warn::verrc => real_verrc;

    #[cfg(feature = "c-variadic")]
    IT_FPRINTF: super::variadic::fprintf => real_fprintf;
    #[cfg(feature = "c-variadic")]
    IT_WARN: super::variadic::warn => real_warn;
    #[cfg(feature = "c-variadic")]
    IT_WARNX: super::variadic::warnx => real_warnx;
    #[cfg(feature = "c-variadic")]
    IT_WARNC: super::variadic::warnc => real_warnc;
    #[cfg(feature = "c-variadic")]
    IT_ERR: super::variadic::err => real_err;
    #[cfg(feature = "c-variadic")]
    IT_ERRX: super::variadic::errx => real_errx;
    #[cfg(feature = "c-variadic")]
    IT_ERRC: super::variadic::errc => real_errc;
}
