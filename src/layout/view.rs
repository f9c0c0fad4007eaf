//! Byte-level access to a struct through somebody else's idea of its layout.
//!
//! A consumer that declares the struct with different packing reads and writes
//! the wrong offsets. [`ForeignView`] reproduces exactly that, but every access
//! is checked against the memory really backing the view, so a field the
//! consumer believes exists past the end of the struct becomes
//! [`LayoutError::FieldOutOfBounds`] instead of a wild read.

use std::ffi::c_void;
use std::fmt;
use std::ops::Range;

use super::{FieldSlot, FieldType, LayoutDescriptor, Result};
use crate::error::LayoutError;

/// A single field element's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
}

impl Scalar {
    pub fn field_type(self) -> FieldType {
        match self {
            Scalar::I16(_) => FieldType::I16,
            Scalar::U16(_) => FieldType::U16,
            Scalar::I32(_) => FieldType::I32,
            Scalar::U32(_) => FieldType::U32,
            Scalar::I64(_) => FieldType::I64,
            Scalar::U64(_) => FieldType::U64,
        }
    }

    fn read(ty: FieldType, bytes: &[u8]) -> Scalar {
        // Callers hand in exactly `ty.size()` bytes.
        let mut buf = [0u8; 8];
        buf[..bytes.len()].copy_from_slice(bytes);
        match ty {
            FieldType::I16 => Scalar::I16(i16::from_ne_bytes([buf[0], buf[1]])),
            FieldType::U16 => Scalar::U16(u16::from_ne_bytes([buf[0], buf[1]])),
            FieldType::I32 => Scalar::I32(i32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]])),
            FieldType::U32 => Scalar::U32(u32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]])),
            FieldType::I64 => Scalar::I64(i64::from_ne_bytes(buf)),
            FieldType::U64 => Scalar::U64(u64::from_ne_bytes(buf)),
        }
    }

    fn write(self, dst: &mut [u8]) {
        match self {
            Scalar::I16(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Scalar::U16(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Scalar::I32(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Scalar::U32(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Scalar::I64(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Scalar::U64(v) => dst.copy_from_slice(&v.to_ne_bytes()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::I16(v) => write!(f, "{v}"),
            Scalar::U16(v) => write!(f, "{v}"),
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::U32(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::U64(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(value)
                }
            }
        )*
    };
}

scalar_from! {
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
}

/// `bytes` interpreted through `layout`, whatever layout produced them.
pub struct ForeignView<'a> {
    layout: LayoutDescriptor,
    bytes: &'a mut [u8],
}

impl<'a> ForeignView<'a> {
    pub fn new(layout: LayoutDescriptor, bytes: &'a mut [u8]) -> Self {
        ForeignView { layout, bytes }
    }

    /// Builds a view over `len` bytes starting at `ptr`.
    ///
    /// `len` is the extent of the memory actually lent, not the size the
    /// layout claims.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` bytes for `'a`, and
    /// nothing else may access that memory while the view is alive.
    pub unsafe fn from_raw(layout: LayoutDescriptor, ptr: *mut c_void, len: usize) -> Result<Self> {
        if ptr.is_null() {
            return Err(LayoutError::NullPointer);
        }
        let bytes = std::slice::from_raw_parts_mut(ptr.cast::<u8>(), len);
        Ok(ForeignView { layout, bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn locate(&self, field: &str, index: usize) -> Result<(FieldSlot, Range<usize>)> {
        let slot = self.layout.field(field)?;
        if index >= slot.spec.count {
            return Err(LayoutError::UnknownField {
                layout: self.layout.name,
                field: format!("{field}[{index}]"),
            });
        }
        let start = slot.offset + index * slot.spec.ty.size();
        let end = start + slot.spec.ty.size();
        if end > self.bytes.len() {
            return Err(LayoutError::FieldOutOfBounds {
                field: slot.name(),
                offset: start,
                end,
                len: self.bytes.len(),
            });
        }
        Ok((slot, start..end))
    }

    pub fn read(&self, field: &str) -> Result<Scalar> {
        self.read_at(field, 0)
    }

    /// Reads element `index` of an array field.
    pub fn read_at(&self, field: &str, index: usize) -> Result<Scalar> {
        let (slot, range) = self.locate(field, index)?;
        Ok(Scalar::read(slot.spec.ty, &self.bytes[range]))
    }

    pub fn write(&mut self, field: &str, value: impl Into<Scalar>) -> Result<()> {
        self.write_at(field, 0, value)
    }

    pub fn write_at(&mut self, field: &str, index: usize, value: impl Into<Scalar>) -> Result<()> {
        let value = value.into();
        let (slot, range) = self.locate(field, index)?;
        if slot.spec.ty != value.field_type() {
            return Err(LayoutError::TypeMismatch {
                field: slot.name(),
                actual: slot.spec.ty,
                requested: value.field_type(),
            });
        }
        value.write(&mut self.bytes[range]);
        Ok(())
    }

    /// One line per field in `  name = value` form; unreadable elements show
    /// as `<out of bounds>`.
    pub fn describe(&self) -> String {
        let mut text = String::new();
        for spec in self.layout.fields {
            let values: Vec<String> = (0..spec.count)
                .map(|index| match self.read_at(spec.name, index) {
                    Ok(value) => value.to_string(),
                    Err(_) => "<out of bounds>".to_string(),
                })
                .collect();
            text.push_str(&format!("  {} = {}\n", spec.name, values.join(" ")));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{FieldSpec, Packing};

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::new("short", FieldType::U16, 1),
        FieldSpec::new("time", FieldType::U64, 1),
        FieldSpec::new("int", FieldType::U32, 1),
    ];

    fn packed() -> LayoutDescriptor {
        LayoutDescriptor::new("Sample", 1, Packing::packed(2).unwrap(), FIELDS)
    }

    #[test]
    fn write_then_read_through_same_layout() {
        let mut bytes = [0u8; 14];
        let mut view = ForeignView::new(packed(), &mut bytes);
        view.write("short", 1234u16).unwrap();
        view.write("time", 42u64).unwrap();
        view.write("int", 4321u32).unwrap();

        assert_eq!(view.read("short").unwrap(), Scalar::U16(1234));
        assert_eq!(view.read("time").unwrap(), Scalar::U64(42));
        assert_eq!(view.read("int").unwrap(), Scalar::U32(4321));
        assert_eq!(&bytes[2..10], &42u64.to_ne_bytes());
    }

    #[test]
    fn natural_view_over_packed_bytes_runs_off_the_end() {
        let mut bytes = [0u8; 14];
        let natural = packed().repacked(Packing::Natural);
        let mut view = ForeignView::new(natural, &mut bytes);

        let err = view.write("int", 9999u32).unwrap_err();
        assert!(matches!(err, LayoutError::FieldOutOfBounds { field: "int", len: 14, .. }));
        assert!(view.describe().contains("int = <out of bounds>"));
    }

    #[test]
    fn mismatched_view_lands_on_wrong_bytes() {
        let mut bytes = [0u8; 14];
        ForeignView::new(packed(), &mut bytes)
            .write("time", u64::MAX)
            .unwrap();

        let repacked = packed().repacked(Packing::packed(4).unwrap());
        let view = ForeignView::new(repacked, &mut bytes);
        assert_ne!(view.read("time").unwrap(), Scalar::U64(u64::MAX));
    }

    #[test]
    fn writes_are_type_checked() {
        let mut bytes = [0u8; 14];
        let mut view = ForeignView::new(packed(), &mut bytes);
        let err = view.write("short", 5i32).unwrap_err();
        assert_eq!(
            err,
            LayoutError::TypeMismatch {
                field: "short",
                actual: FieldType::U16,
                requested: FieldType::I32,
            }
        );
    }

    #[test]
    fn null_pointer_is_rejected() {
        let result = unsafe { ForeignView::from_raw(packed(), std::ptr::null_mut(), 14) };
        assert!(matches!(result, Err(LayoutError::NullPointer)));
    }

    #[test]
    fn empty_view_has_no_readable_fields() {
        let mut bytes = [0u8; 0];
        let view = ForeignView::new(packed(), &mut bytes);
        assert!(view.is_empty());
        assert_eq!(view.len(), 0);
        assert!(matches!(
            view.read("short"),
            Err(LayoutError::FieldOutOfBounds { field: "short", end: 2, len: 0, .. })
        ));
    }

    #[test]
    fn array_index_past_count_is_unknown() {
        let mut bytes = [0u8; 14];
        let view = ForeignView::new(packed(), &mut bytes);
        let err = view.read_at("short", 1).unwrap_err();
        assert!(matches!(err, LayoutError::UnknownField { .. }));
    }
}
