//! The C compiler and the Rust descriptors must agree on both structs, and C
//! callbacks must work through the Rust entry points.

use struct_bridge::demo_a::{self, StructA};
use struct_bridge::demo_b::{self, StructB};
use struct_bridge::layout::FixedLayout;
use struct_bridge::native::{self, C_INT_A_VALUE, C_INT_B_VALUE, C_SHORT_B_VALUE};

#[test]
fn c_compiler_agrees_with_struct_a_descriptor() {
    let c = native::struct_a();
    assert_eq!(c.size, 18);
    assert_eq!(c.offsets, vec![0, 4, 12]);
    c.check_against(&StructA::LAYOUT).unwrap();
}

#[test]
fn c_compiler_agrees_with_struct_b_descriptor() {
    let c = native::struct_b();
    assert_eq!(c.size, 14);
    assert_eq!(c.align, 2);
    assert_eq!(c.offsets, vec![0, 2, 10]);
    c.check_against(&StructB::LAYOUT).unwrap();
}

#[test]
fn c_callback_mutates_struct_a_through_void_pointer() {
    let mut out = Vec::new();
    let run = demo_a::use_callback_into(&mut out, native::sb_c_set_int_a, true).unwrap();
    let after = run.after.unwrap();
    assert_eq!({ after.field_int }, C_INT_A_VALUE);
    assert_eq!(run.changed_fields(), vec!["field_int"]);
}

#[test]
fn c_callback_without_check_leaves_no_after_dump() {
    let mut out = Vec::new();
    let run = demo_a::use_callback_into(&mut out, native::sb_c_set_int_a, false).unwrap();
    assert!(run.after.is_none());
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches("field_int = ").count(), 1);
}

#[test]
fn c_callback_mutates_struct_b_through_typed_pointer() {
    let mut out = Vec::new();
    let run = demo_b::invoke_with_callback_into(&mut out, native::sb_c_set_short_b).unwrap();
    assert_eq!(run.after.unwrap().field_short, C_SHORT_B_VALUE);
    assert_eq!(run.changed_fields(), vec!["field_short"]);
}

#[test]
fn c_callback_mutates_struct_b_through_opaque_pointer() {
    let mut out = Vec::new();
    let run = demo_b::invoke_with_callback_opaque_into(&mut out, native::sb_c_set_int_b_opaque).unwrap();
    let after = run.after.unwrap();
    assert_eq!({ after.field_int }, C_INT_B_VALUE);
    assert_eq!(after.field_short, run.before.field_short);
    assert_eq!({ after.field_time }, { run.before.field_time });
}

#[test]
fn exported_entry_points_accept_c_callbacks() {
    assert_eq!(demo_a::use_callback(Some(native::sb_c_set_int_a), 1), 0);
    demo_b::invoke_with_callback(Some(native::sb_c_set_short_b));
    demo_b::invoke_with_callback_opaque(Some(native::sb_c_set_int_b_opaque));
}
