//! FFI helpers: bounded C-string conversion and the panic guard

use std::ffi::{CStr, c_char};

/// Longest accepted C string (identifiers and paths).
pub(crate) const MAX_FFI_STRING_LEN: usize = 16 * 1024;

/// Convert a C string to an owned Rust string.
///
/// Returns `None` for null, over-long or non-UTF-8 input.
///
/// # Safety
/// `ptr` must be null or point to a null-terminated string.
pub(crate) unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }

    // Find the terminator without reading past the length bound.
    let mut len = 0;
    unsafe {
        while len < MAX_FFI_STRING_LEN {
            if *ptr.add(len) == 0 {
                break;
            }
            len += 1;
        }
    }

    if len >= MAX_FFI_STRING_LEN {
        log::warn!("FFI string exceeds maximum length of {MAX_FFI_STRING_LEN}");
        return None;
    }

    unsafe { CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string()) }
}

/// Run an FFI body under `catch_unwind`, returning `$default` if it
/// panics. Nothing may unwind across the C boundary.
macro_rules! ffi_guard {
    ($default:expr, $body:expr) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $body)) {
            Ok(result) => result,
            Err(e) => {
                if let Some(s) = e.downcast_ref::<&str>() {
                    log::error!("FFI panic caught: {}", s);
                } else if let Some(s) = e.downcast_ref::<String>() {
                    log::error!("FFI panic caught: {}", s);
                } else {
                    log::error!("FFI panic caught (unknown type)");
                }
                $default
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_null_pointer_is_rejected() {
        assert_eq!(unsafe { cstr_to_string(std::ptr::null()) }, None);
    }

    #[test]
    fn test_valid_string_round_trips() {
        let c = CString::new("explosion_01").unwrap();
        assert_eq!(
            unsafe { cstr_to_string(c.as_ptr()) },
            Some("explosion_01".to_string())
        );
    }

    #[test]
    fn test_non_utf8_is_rejected() {
        let c = CString::new(vec![0xff, 0xfe, 0xfd]).unwrap();
        assert_eq!(unsafe { cstr_to_string(c.as_ptr()) }, None);
    }

    #[test]
    fn test_overlong_string_is_rejected() {
        let c = CString::new("x".repeat(MAX_FFI_STRING_LEN + 1)).unwrap();
        assert_eq!(unsafe { cstr_to_string(c.as_ptr()) }, None);
    }

    #[test]
    fn test_guard_swallows_panics() {
        let value: i32 = ffi_guard!(-1, panic!("boom"));
        assert_eq!(value, -1);
    }
}
