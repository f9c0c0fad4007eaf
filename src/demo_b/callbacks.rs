//! Consumer-side callbacks for Demo B.

use std::ffi::c_void;
use std::mem::size_of;
use std::ptr;

use super::{NaiveStructB, StructB};
use crate::handle::TaggedPtr;
use crate::layout::{FixedLayout, ForeignView};

/// `field_time` written by [`typed_callback`].
pub const TYPED_FIELD_TIME: u64 = 12345678901;
/// `field_time` written by [`opaque_callback`].
pub const OPAQUE_FIELD_TIME: u64 = 9876543210;
/// `field_int` written by the set-int callbacks.
pub const NEW_FIELD_INT: u32 = 9999;

fn print_api(label: &str, s: &StructB) {
    println!("Printing {label}:");
    println!("  field_short: {}", s.field_short);
    println!("  field_time: {}", { s.field_time });
    println!("  field_int: {}", { s.field_int });
}

/// Reads the struct by index and by value, then writes `field_time`
/// through the pointer.
///
/// # Safety
///
/// `p` must point to a live [`StructB`] not accessed elsewhere during the call.
pub unsafe extern "C" fn typed_callback(p: *mut StructB) {
    println!("Received StructB * in typed callback...");
    if p.is_null() {
        log::warn!("typed_callback: null pointer");
        return;
    }
    println!("Retrieving StructB via indexing...");
    let by_index = std::slice::from_raw_parts(p, 1)[0];
    print_api("StructB", &by_index);
    println!("Retrieving StructB via dereference...");
    let by_value = *p;
    print_api("StructB", &by_value);
    println!("Now change its time to {TYPED_FIELD_TIME} through the pointer");
    (*p).field_time = TYPED_FIELD_TIME;
}

/// Receives the struct as `void *` and tries three ways of reading it.
///
/// The naive reinterpretation prints garbage or `<out of bounds>`; the
/// value conversion into [`NaiveStructB`] is correct; the write through the
/// pointer reaches the invoker.
///
/// # Safety
///
/// `p` must point to a live [`StructB`] not accessed elsewhere during the call.
pub unsafe extern "C" fn opaque_callback(p: *mut c_void) {
    println!("Received StructB * in opaque callback via void *...");
    if p.is_null() {
        log::warn!("opaque_callback: null pointer");
        return;
    }

    println!("First print NaiveStructB obtained by reinterpreting the pointer:");
    match ForeignView::from_raw(NaiveStructB::LAYOUT, p, size_of::<StructB>()) {
        Ok(view) => print!("{}", view.describe()),
        Err(err) => log::warn!("opaque_callback: {err}"),
    }

    println!("Print NaiveStructB converted from StructB by value:");
    let converted = NaiveStructB::from(ptr::read(p.cast::<StructB>()));
    println!("  field_short: {}", converted.field_short);
    println!("  field_time: {}", converted.field_time);
    println!("  field_int: {}", converted.field_int);

    let s = &mut *p.cast::<StructB>();
    println!("Now set its time to {OPAQUE_FIELD_TIME}.");
    s.field_time = OPAQUE_FIELD_TIME;
    println!("  field_time: {}", { s.field_time });
}

/// Overwrites `field_int` through a correctly declared pointer.
///
/// # Safety
///
/// `p` must point to a live [`StructB`] not accessed elsewhere during the call.
pub unsafe extern "C" fn opaque_set_int_callback(p: *mut c_void) {
    match p.cast::<StructB>().as_mut() {
        Some(s) => s.field_int = NEW_FIELD_INT,
        None => log::warn!("opaque_set_int_callback: null pointer"),
    }
}

/// Downcasts the tagged pointer to [`StructB`] and sets `field_int`.
///
/// # Safety
///
/// `tagged` must point to a [`TaggedPtr`] built by the invoker.
pub unsafe extern "C" fn tagged_callback(tagged: *mut TaggedPtr) {
    println!("Received a tagged pointer, downcasting to StructB...");
    let Some(tagged) = tagged.as_ref() else {
        log::warn!("tagged_callback: null tagged pointer");
        return;
    };
    match tagged.as_handle().and_then(|handle| handle.into_mut::<StructB>()) {
        Ok(s) => {
            println!("Layout tag matches, setting field_int to {NEW_FIELD_INT}");
            s.field_int = NEW_FIELD_INT;
        }
        Err(err) => log::warn!("tagged_callback: {err}"),
    }
}

/// Tries to downcast the tagged pointer to the naive declaration, which
/// the tag check refuses; the struct is left alone.
///
/// # Safety
///
/// `tagged` must point to a [`TaggedPtr`] built by the invoker.
pub unsafe extern "C" fn tagged_naive_callback(tagged: *mut TaggedPtr) {
    println!("Received a tagged pointer, downcasting to NaiveStructB...");
    let Some(tagged) = tagged.as_ref() else {
        log::warn!("tagged_naive_callback: null tagged pointer");
        return;
    };
    match tagged.as_handle().and_then(|handle| handle.into_mut::<NaiveStructB>()) {
        Ok(s) => s.field_int = NEW_FIELD_INT,
        Err(err) => println!("Refused: {err}"),
    }
}
