//! Errors raised by the checked side of the bridge.
//!
//! The untyped entry points never produce these: a layout mismatch there is
//! silent. Everything that goes through a descriptor, a tagged handle or a
//! foreign view reports the mismatch instead.

use thiserror::Error;

use crate::layout::{FieldType, LayoutTag};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// A tagged handle was reinterpreted as a struct with another layout.
    #[error("layout tag mismatch: handle carries {found}, caller expected {expected}")]
    TagMismatch { expected: LayoutTag, found: LayoutTag },

    #[error("`{layout}` has no field named `{field}`")]
    UnknownField { layout: &'static str, field: String },

    /// The field lies (partly) outside the memory actually backing the view.
    #[error("field `{field}` spans bytes {offset}..{end} but only {len} bytes are available")]
    FieldOutOfBounds {
        field: &'static str,
        offset: usize,
        end: usize,
        len: usize,
    },

    #[error("field `{field}` is {actual}, not {requested}")]
    TypeMismatch {
        field: &'static str,
        actual: FieldType,
        requested: FieldType,
    },

    /// The pointer is not aligned for the struct it is being read as.
    #[error("pointer {addr:#x} is not aligned to {align} bytes for `{layout}`")]
    Misaligned {
        layout: &'static str,
        addr: usize,
        align: usize,
    },

    #[error("packing must be a power of two, got {pack}")]
    InvalidPacking { pack: usize },

    #[error("null pointer passed across the boundary")]
    NullPointer,

    /// The descriptor and the compiler disagree about a struct's layout.
    #[error("descriptor for `{layout}` drifted from the compiled struct: {detail}")]
    Drift { layout: &'static str, detail: String },
}

impl LayoutError {
    /// Errors that mean the two sides disagree about the layout itself.
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            LayoutError::TagMismatch { .. }
                | LayoutError::FieldOutOfBounds { .. }
                | LayoutError::Drift { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_message_names_the_range() {
        let err = LayoutError::FieldOutOfBounds {
            field: "field_time",
            offset: 8,
            end: 16,
            len: 14,
        };
        assert_eq!(
            err.to_string(),
            "field `field_time` spans bytes 8..16 but only 14 bytes are available"
        );
        assert!(err.is_mismatch());
    }

    #[test]
    fn null_pointer_is_not_a_layout_mismatch() {
        assert!(!LayoutError::NullPointer.is_mismatch());
    }

    #[test]
    fn misalignment_names_address_and_alignment() {
        let err = LayoutError::Misaligned {
            layout: "StructB",
            addr: 0x1001,
            align: 2,
        };
        assert_eq!(
            err.to_string(),
            "pointer 0x1001 is not aligned to 2 bytes for `StructB`"
        );
        assert!(!err.is_mismatch());
        assert_eq!(
            LayoutError::InvalidPacking { pack: 3 }.to_string(),
            "packing must be a power of two, got 3"
        );
    }
}
