//! Demo A: a 1-byte-packed struct handed to a callback as `void *`.
//!
//! The native side builds a [`StructA`], prints it, calls the callback and,
//! if asked, prints it again to show what the callback changed in place.
//! Whether the callback sees the right values depends entirely on whether
//! it declares the struct with the same packing.

pub mod callbacks;

use std::ffi::c_void;
use std::io::{self, Write};
use std::os::raw::c_int;

use bytemuck::{Pod, Zeroable};

use crate::dump::{Invocation, StructDump};

crate::fixed_layout! {
    packed(1), version 1;
    /// The struct produced by the native side, laid out as `#pragma pack(1)`.
    pub struct StructA {
        pub field_int: i32,
        pub field_long: i64,
        pub field_array: [i16; 3],
    }
}

// SAFETY: packed(1) leaves no padding and every field is plain integer data.
unsafe impl Zeroable for StructA {}
unsafe impl Pod for StructA {}

crate::fixed_layout! {
    natural, version 1;
    /// A consumer's naive declaration of [`StructA`] without the pack pragma.
    pub struct NaiveStructA {
        pub field_int: i32,
        pub field_long: i64,
        pub field_array: [i16; 3],
    }
}

/// `void (*)(void *)`, the callback type of [`use_callback`].
pub type VoidCallback = unsafe extern "C" fn(*mut c_void);

// ===========================================
// Producer and printer
// ===========================================

pub fn create_struct() -> StructA {
    StructA {
        field_int: 123,
        field_long: 4567890123,
        field_array: [123, 456, 789],
    }
}

pub fn print_struct(out: &mut dyn Write, s: &StructA) -> io::Result<()> {
    let array = s.field_array;
    writeln!(out, "Printing structure in native code")?;
    writeln!(out, "  field_int = {}", { s.field_int })?;
    writeln!(out, "  field_long = {}", { s.field_long })?;
    writeln!(out, "  field_array = {} {} {}", array[0], array[1], array[2])
}

impl StructDump for StructA {
    fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        print_struct(out, self)
    }
}

// ===========================================
// Invoker
// ===========================================

/// Runs the Demo A sequence with a Rust closure as the callback.
///
/// The closure gets the struct for the duration of the call only. The
/// "after" dump is written, and recorded, only when `check_on_return` is set.
pub fn use_callback_with<F>(
    out: &mut dyn Write,
    check_on_return: bool,
    callback: F,
) -> io::Result<Invocation<StructA>>
where
    F: FnOnce(&mut StructA),
{
    let mut x = create_struct();
    let before = x;
    writeln!(out, "Entered native code, printing newly created structure:")?;
    print_struct(out, &x)?;
    log::trace!("demo A before callback: {before:?}");

    log::debug!("invoking demo A callback");
    callback(&mut x);

    let after = if check_on_return {
        writeln!(
            out,
            "Now we are back in native code, see if the callback changed the structure..."
        )?;
        print_struct(out, &x)?;
        log::trace!("demo A after callback: {x:?}");
        Some(x)
    } else {
        None
    };
    Ok(Invocation { before, after })
}

/// [`use_callback`] with the output stream chosen by the caller.
pub fn use_callback_into(
    out: &mut dyn Write,
    cb: VoidCallback,
    check_on_return: bool,
) -> io::Result<Invocation<StructA>> {
    use_callback_with(out, check_on_return, |x| {
        // SAFETY: the pointer is valid for the whole call and nothing else
        // touches the struct until the callback returns.
        unsafe { cb((x as *mut StructA).cast::<c_void>()) }
    })
}

/// C entry point: `int use_callback(void (*cb)(void *), int check_on_return)`.
///
/// Returns 0, or -1 when `cb` is null or stdout could not be written.
#[no_mangle]
pub extern "C" fn use_callback(cb: Option<VoidCallback>, check_on_return: c_int) -> c_int {
    let Some(cb) = cb else {
        log::error!("use_callback called with a null callback");
        return -1;
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match use_callback_into(&mut out, cb, check_on_return != 0) {
        Ok(_) => 0,
        Err(err) => {
            log::error!("use_callback could not write its dump: {err}");
            -1
        }
    }
}
