//! Bindings to the C consumer compiled from `c_src/bridge_probe.c`.
//!
//! The probes report the C compiler's own `sizeof`, `_Alignof` and
//! `offsetof` for the structs declared in the generated header.

use std::ffi::c_void;
use std::os::raw::c_int;

use crate::demo_b::StructB;
use crate::error::LayoutError;
use crate::layout::{LayoutDescriptor, Result};

/// Values the C callbacks write (`SB_C_*_VALUE` in `struct_bridge.h`).
pub const C_INT_A_VALUE: i32 = 777;
pub const C_SHORT_B_VALUE: u16 = 4242;
pub const C_INT_B_VALUE: u32 = 9999;

/// `SB_UNKNOWN_FIELD`: what an offset probe returns for an index it does not know.
pub const C_UNKNOWN_FIELD: usize = usize::MAX;

extern "C" {
    fn sb_c_sizeof_struct_a() -> usize;
    fn sb_c_alignof_struct_a() -> usize;
    fn sb_c_offsetof_struct_a(field: c_int) -> usize;
    fn sb_c_sizeof_struct_b() -> usize;
    fn sb_c_alignof_struct_b() -> usize;
    fn sb_c_offsetof_struct_b(field: c_int) -> usize;

    pub fn sb_c_set_int_a(p: *mut c_void);
    pub fn sb_c_set_short_b(p: *mut StructB);
    pub fn sb_c_set_int_b_opaque(p: *mut c_void);
}

/// One struct as the C compiler laid it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CLayout {
    pub size: usize,
    pub align: usize,
    pub offsets: Vec<usize>,
}

impl CLayout {
    /// Compares against a descriptor, reporting the first disagreement as
    /// [`LayoutError::Drift`].
    pub fn check_against(&self, layout: &LayoutDescriptor) -> Result<()> {
        let drift = |detail: String| LayoutError::Drift {
            layout: layout.name,
            detail: format!("C compiler {detail}"),
        };
        if self.size != layout.size() {
            return Err(drift(format!("says size {}, descriptor {}", self.size, layout.size())));
        }
        if self.align != layout.align() {
            return Err(drift(format!("says align {}, descriptor {}", self.align, layout.align())));
        }
        let slots = layout.slots();
        if self.offsets.len() != slots.len() {
            return Err(drift(format!(
                "reports {} offsets, descriptor has {} fields",
                self.offsets.len(),
                slots.len()
            )));
        }
        for (slot, &offset) in slots.iter().zip(&self.offsets) {
            if offset == C_UNKNOWN_FIELD {
                return Err(drift(format!("does not know field `{}`", slot.name())));
            }
            if slot.offset != offset {
                return Err(drift(format!(
                    "puts `{}` at {offset}, descriptor at {}",
                    slot.name(),
                    slot.offset
                )));
            }
        }
        Ok(())
    }
}

pub fn struct_a() -> CLayout {
    // SAFETY: the probes only evaluate sizeof/offsetof.
    unsafe {
        CLayout {
            size: sb_c_sizeof_struct_a(),
            align: sb_c_alignof_struct_a(),
            offsets: (0..3).map(|field| sb_c_offsetof_struct_a(field)).collect(),
        }
    }
}

pub fn struct_b() -> CLayout {
    // SAFETY: as above.
    unsafe {
        CLayout {
            size: sb_c_sizeof_struct_b(),
            align: sb_c_alignof_struct_b(),
            offsets: (0..3).map(|field| sb_c_offsetof_struct_b(field)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{FieldSpec, FieldType, Packing};

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::new("a", FieldType::U16, 1),
        FieldSpec::new("b", FieldType::U32, 1),
    ];

    #[test]
    fn agreeing_layout_passes() {
        let layout = LayoutDescriptor::new("Pair", 1, Packing::packed(2).unwrap(), FIELDS);
        let c = CLayout {
            size: 6,
            align: 2,
            offsets: vec![0, 2],
        };
        c.check_against(&layout).unwrap();
    }

    #[test]
    fn missing_offsets_are_drift() {
        let layout = LayoutDescriptor::new("Pair", 1, Packing::packed(2).unwrap(), FIELDS);
        for offsets in [vec![], vec![0], vec![0, 2, 6]] {
            let c = CLayout {
                size: 6,
                align: 2,
                offsets,
            };
            let err = c.check_against(&layout).unwrap_err();
            assert!(matches!(err, LayoutError::Drift { layout: "Pair", .. }));
        }
    }

    #[test]
    fn unknown_field_sentinel_is_drift() {
        let layout = LayoutDescriptor::new("Pair", 1, Packing::packed(2).unwrap(), FIELDS);
        let c = CLayout {
            size: 6,
            align: 2,
            offsets: vec![0, C_UNKNOWN_FIELD],
        };
        assert_eq!(
            c.check_against(&layout).unwrap_err().to_string(),
            "descriptor for `Pair` drifted from the compiled struct: C compiler does not know field `b`"
        );
    }

    #[test]
    fn shifted_field_is_drift() {
        let layout = LayoutDescriptor::new("Pair", 1, Packing::Natural, FIELDS);
        let c = CLayout {
            size: 8,
            align: 4,
            offsets: vec![0, 2],
        };
        let err = c.check_against(&layout).unwrap_err();
        assert_eq!(
            err.to_string(),
            "descriptor for `Pair` drifted from the compiled struct: C compiler puts `b` at 2, descriptor at 4"
        );
    }
}
