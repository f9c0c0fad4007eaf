//! Consumer-side callbacks for Demo A.
//!
//! Each receives the struct as `void *` and reinterprets it a different way.
//! The naive ones use [`NaiveStructA`]'s natural alignment; their reads and
//! writes go through a [`ForeignView`] bounded by the memory the invoker lent,
//! so the mismatch shows up as wrong values rather than out-of-bounds access.

use std::ffi::c_void;
use std::mem::size_of;
use std::ptr;

use super::{NaiveStructA, StructA};
use crate::layout::{FixedLayout, ForeignView};

/// `field_long` written by the one-way and two-way callbacks.
pub const NEW_FIELD_LONG: i64 = 98765432109;
/// `field_array` written by the two-way callbacks.
pub const NEW_FIELD_ARRAY: [i16; 3] = [111, 222, 333];

/// Reinterprets the struct as [`NaiveStructA`] and prints what it finds.
///
/// # Safety
///
/// `p` must point to a live [`StructA`] not accessed elsewhere during the call.
pub unsafe extern "C" fn naive_callback(p: *mut c_void) {
    println!("In naive_callback(), received a void pointer.");
    match ForeignView::from_raw(NaiveStructA::LAYOUT, p, size_of::<StructA>()) {
        Ok(view) => {
            println!("Printing NaiveStructA:");
            print!("{}", view.describe());
        }
        Err(err) => log::warn!("naive_callback: {err}"),
    }
}

/// Copies the struct out and modifies the copy; the invoker sees nothing.
///
/// # Safety
///
/// `p` must point to a live [`StructA`].
pub unsafe extern "C" fn one_way_callback(p: *mut c_void) {
    println!("In one_way_callback(), received a void pointer.");
    if p.is_null() {
        log::warn!("one_way_callback: null pointer");
        return;
    }
    let mut copy: StructA = ptr::read(p.cast::<StructA>());
    println!("Printing StructA copy:");
    println!("  field_long = {}", { copy.field_long });
    println!("Setting field_long in the copy to {NEW_FIELD_LONG}");
    copy.field_long = NEW_FIELD_LONG;
    log::debug!("one_way_callback discards {copy:?}");
}

/// Writes through the pointer itself, so the changes reach the invoker.
///
/// # Safety
///
/// `p` must point to a live [`StructA`] not accessed elsewhere during the call.
pub unsafe extern "C" fn two_way_callback(p: *mut c_void) {
    println!("In two_way_callback(), received a void pointer.");
    let Some(s) = p.cast::<StructA>().as_mut() else {
        log::warn!("two_way_callback: null pointer");
        return;
    };
    let array = s.field_array;
    println!("Printing StructA through the pointer:");
    println!("  field_long = {}", { s.field_long });
    println!("  field_array = {} {} {}", array[0], array[1], array[2]);
    println!("Setting field_long in the structure to {NEW_FIELD_LONG}");
    s.field_long = NEW_FIELD_LONG;
    println!("Setting the array to 111, 222, 333");
    s.field_array = NEW_FIELD_ARRAY;
}

/// The two-way writes made through the naive declaration.
///
/// The invoker's "after" dump shows values other than the ones written.
///
/// # Safety
///
/// `p` must point to a live [`StructA`] not accessed elsewhere during the call.
pub unsafe extern "C" fn naive_two_way_callback(p: *mut c_void) {
    println!("In naive_two_way_callback(), received a void pointer.");
    let mut view = match ForeignView::from_raw(NaiveStructA::LAYOUT, p, size_of::<StructA>()) {
        Ok(view) => view,
        Err(err) => {
            log::warn!("naive_two_way_callback: {err}");
            return;
        }
    };
    println!("Setting field_long in NaiveStructA to {NEW_FIELD_LONG}");
    if let Err(err) = view.write("field_long", NEW_FIELD_LONG) {
        log::warn!("naive_two_way_callback: {err}");
    }
    println!("Setting the array to 111, 222, 333");
    for (index, value) in NEW_FIELD_ARRAY.into_iter().enumerate() {
        if let Err(err) = view.write_at("field_array", index, value) {
            log::warn!("naive_two_way_callback: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo_a::{create_struct, use_callback_into};

    #[test]
    fn naive_read_leaves_struct_alone() {
        let mut out = Vec::new();
        let run = use_callback_into(&mut out, naive_callback, true).unwrap();
        assert!(run.is_unchanged());
    }

    #[test]
    fn one_way_changes_are_lost() {
        let mut out = Vec::new();
        let run = use_callback_into(&mut out, one_way_callback, true).unwrap();
        assert_eq!(run.after, Some(create_struct()));
    }

    #[test]
    fn two_way_changes_come_back() {
        let mut out = Vec::new();
        let run = use_callback_into(&mut out, two_way_callback, true).unwrap();
        let after = run.after.unwrap();
        assert_eq!({ after.field_int }, 123);
        assert_eq!({ after.field_long }, NEW_FIELD_LONG);
        assert_eq!({ after.field_array }, NEW_FIELD_ARRAY);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  field_array = 111 222 333\n"));
    }

    #[test]
    fn naive_two_way_changes_come_back_wrong() {
        let mut out = Vec::new();
        let run = use_callback_into(&mut out, naive_two_way_callback, true).unwrap();
        let after = run.after.unwrap();
        assert_ne!({ after.field_long }, NEW_FIELD_LONG);
        assert_ne!({ after.field_array }, NEW_FIELD_ARRAY);
        assert!(!run.is_unchanged());
    }

    #[test]
    fn null_pointers_are_ignored() {
        unsafe {
            naive_callback(ptr::null_mut());
            one_way_callback(ptr::null_mut());
            two_way_callback(ptr::null_mut());
            naive_two_way_callback(ptr::null_mut());
        }
    }
}
