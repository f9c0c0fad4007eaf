//! Demo B: a 2-byte-packed struct handed over as a typed pointer, as an
//! untyped pointer, or as a tagged handle.
//!
//! The typed form makes the consumer agree on the layout by declaration. The
//! untyped form relies on both sides independently declaring the same
//! packing and fails silently if they don't. The tagged form carries the
//! layout with the pointer and refuses a mismatched reinterpretation.

pub mod callbacks;

use std::ffi::c_void;
use std::io::{self, Write};

use bytemuck::{Pod, Zeroable};

use crate::dump::{Invocation, StructDump};
use crate::handle::{OpaqueHandle, TaggedPtr};

crate::fixed_layout! {
    packed(2), version 1;
    /// The struct produced by the native side, laid out as `#pragma pack(2)`.
    pub struct StructB {
        pub field_short: u16,
        /// Seconds since the Unix epoch.
        pub field_time: u64,
        pub field_int: u32,
    }
}

// SAFETY: packed(2) places these fields at 0, 2 and 10 with no padding.
unsafe impl Zeroable for StructB {}
unsafe impl Pod for StructB {}

crate::fixed_layout! {
    natural, version 1;
    /// A consumer's own declaration of the same fields at natural alignment.
    ///
    /// Reinterpreting a `StructB` pointer as this is wrong; converting a
    /// `StructB` value into it field by field is fine.
    pub struct NaiveStructB {
        pub field_short: u16,
        pub field_time: u64,
        pub field_int: u32,
    }
}

impl From<StructB> for NaiveStructB {
    fn from(s: StructB) -> Self {
        NaiveStructB {
            field_short: s.field_short,
            field_time: s.field_time,
            field_int: s.field_int,
        }
    }
}

pub type TypedCallback = unsafe extern "C" fn(*mut StructB);
pub type OpaqueCallback = unsafe extern "C" fn(*mut c_void);
pub type TaggedCallback = unsafe extern "C" fn(*mut TaggedPtr);

// ===========================================
// Producer and printer
// ===========================================

pub fn create_struct() -> StructB {
    let now = chrono::Utc::now().timestamp();
    create_struct_at(u64::try_from(now).unwrap_or_default())
}

pub fn create_struct_at(time: u64) -> StructB {
    StructB {
        field_short: 1234,
        field_time: time,
        field_int: 4321,
    }
}

pub fn print_struct(out: &mut dyn Write, s: &StructB) -> io::Result<()> {
    writeln!(out, "Here is the struct in native code:")?;
    writeln!(out, "  field_short: {}", s.field_short)?;
    writeln!(out, "  field_time: {}", { s.field_time })?;
    writeln!(out, "  field_int: {}", { s.field_int })
}

impl StructDump for StructB {
    fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        print_struct(out, self)
    }
}

// ===========================================
// Invokers
// ===========================================

fn invoke<F>(
    out: &mut dyn Write,
    kind: &str,
    mut x: StructB,
    callback: F,
) -> io::Result<Invocation<StructB>>
where
    F: FnOnce(&mut StructB),
{
    let before = x;
    writeln!(out, "Here is the native struct before {kind} callback:")?;
    print_struct(out, &x)?;
    log::trace!("demo B before {kind} callback: {before:?}");

    log::debug!("invoking demo B {kind} callback");
    callback(&mut x);

    print_struct(out, &x)?;
    log::trace!("demo B after {kind} callback: {x:?}");
    Ok(Invocation {
        before,
        after: Some(x),
    })
}

/// Typed invocation with a Rust closure.
pub fn invoke_with<F>(out: &mut dyn Write, callback: F) -> io::Result<Invocation<StructB>>
where
    F: FnOnce(&mut StructB),
{
    invoke(out, "StructB *", create_struct(), callback)
}

/// Checked opaque invocation: the closure gets a tagged [`OpaqueHandle`].
pub fn invoke_with_opaque<F>(out: &mut dyn Write, callback: F) -> io::Result<Invocation<StructB>>
where
    F: for<'a> FnOnce(OpaqueHandle<'a>),
{
    invoke(out, "tagged void *", create_struct(), |x| {
        callback(OpaqueHandle::new(x))
    })
}

/// [`invoke_with_callback`] with the output stream chosen by the caller.
pub fn invoke_with_callback_into(out: &mut dyn Write, cb: TypedCallback) -> io::Result<Invocation<StructB>> {
    invoke(out, "StructB *", create_struct(), |x| {
        // SAFETY: valid, exclusively borrowed for the duration of the call.
        unsafe { cb(x as *mut StructB) }
    })
}

/// [`invoke_with_callback_opaque`] with the output stream chosen by the caller.
///
/// No layout check happens: a callback that reinterprets the pointer with
/// different packing corrupts the struct silently.
pub fn invoke_with_callback_opaque_into(
    out: &mut dyn Write,
    cb: OpaqueCallback,
) -> io::Result<Invocation<StructB>> {
    invoke(out, "void *", create_struct(), |x| {
        // SAFETY: as above.
        unsafe { cb((x as *mut StructB).cast::<c_void>()) }
    })
}

/// [`invoke_with_callback_tagged`] with the output stream chosen by the caller.
pub fn invoke_with_callback_tagged_into(
    out: &mut dyn Write,
    cb: TaggedCallback,
) -> io::Result<Invocation<StructB>> {
    invoke(out, "tagged void *", create_struct(), |x| {
        let handle = OpaqueHandle::new(x);
        let mut tagged = TaggedPtr::from_handle(&handle);
        // SAFETY: `tagged` and the struct it points to outlive the call.
        unsafe { cb(&mut tagged) }
    })
}

fn report(entry: &str, result: io::Result<Invocation<StructB>>) {
    if let Err(err) = result {
        log::error!("{entry} could not write its dump: {err}");
    }
}

/// C entry point: `void invoke_with_callback(void (*cb)(StructB *))`.
#[no_mangle]
pub extern "C" fn invoke_with_callback(cb: Option<TypedCallback>) {
    let Some(cb) = cb else {
        log::error!("invoke_with_callback called with a null callback");
        return;
    };
    report("invoke_with_callback", invoke_with_callback_into(&mut io::stdout().lock(), cb));
}

/// C entry point: `void invoke_with_callback_opaque(void (*cb)(void *))`.
#[no_mangle]
pub extern "C" fn invoke_with_callback_opaque(cb: Option<OpaqueCallback>) {
    let Some(cb) = cb else {
        log::error!("invoke_with_callback_opaque called with a null callback");
        return;
    };
    report(
        "invoke_with_callback_opaque",
        invoke_with_callback_opaque_into(&mut io::stdout().lock(), cb),
    );
}

/// C entry point: `void invoke_with_callback_tagged(void (*cb)(sb_tagged_ptr_t *))`.
#[no_mangle]
pub extern "C" fn invoke_with_callback_tagged(cb: Option<TaggedCallback>) {
    let Some(cb) = cb else {
        log::error!("invoke_with_callback_tagged called with a null callback");
        return;
    };
    report(
        "invoke_with_callback_tagged",
        invoke_with_callback_tagged_into(&mut io::stdout().lock(), cb),
    );
}
