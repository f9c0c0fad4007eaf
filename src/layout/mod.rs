//! Layout descriptors: the single source of truth for a struct's binary shape.
//!
//! A [`LayoutDescriptor`] lists field order, scalar type, element count and the
//! packing rule. Offsets, size and alignment are computed from it the way a C
//! compiler would under `#pragma pack(n)`. The same descriptor drives the Rust
//! struct (through [`fixed_layout!`](crate::fixed_layout)), the generated C
//! header, the runtime [`LayoutTag`] and the byte-level [`ForeignView`].

mod macros;
mod view;

use std::fmt;
use std::mem::{align_of, size_of};
use std::num::NonZeroUsize;

pub use view::{ForeignView, Scalar};

use crate::error::LayoutError;

pub type Result<T> = std::result::Result<T, LayoutError>;

// ===========================================
// Scalar field types
// ===========================================

/// The fixed-width integer types a bridged struct may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl FieldType {
    pub const fn size(self) -> usize {
        match self {
            FieldType::I16 | FieldType::U16 => 2,
            FieldType::I32 | FieldType::U32 => 4,
            FieldType::I64 | FieldType::U64 => 8,
        }
    }

    /// Alignment the target gives this type when nothing is packed.
    pub const fn natural_align(self) -> usize {
        match self {
            FieldType::I16 => align_of::<i16>(),
            FieldType::U16 => align_of::<u16>(),
            FieldType::I32 => align_of::<i32>(),
            FieldType::U32 => align_of::<u32>(),
            FieldType::I64 => align_of::<i64>(),
            FieldType::U64 => align_of::<u64>(),
        }
    }

    /// The `<stdint.h>` spelling of this type.
    pub const fn c_name(self) -> &'static str {
        match self {
            FieldType::I16 => "int16_t",
            FieldType::U16 => "uint16_t",
            FieldType::I32 => "int32_t",
            FieldType::U32 => "uint32_t",
            FieldType::I64 => "int64_t",
            FieldType::U64 => "uint64_t",
        }
    }

    const fn code(self) -> u8 {
        match self {
            FieldType::I16 => 1,
            FieldType::U16 => 2,
            FieldType::I32 => 3,
            FieldType::U32 => 4,
            FieldType::I64 => 5,
            FieldType::U64 => 6,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::I16 => "i16",
            FieldType::U16 => "u16",
            FieldType::I32 => "i32",
            FieldType::U32 => "u32",
            FieldType::I64 => "i64",
            FieldType::U64 => "u64",
        };
        f.write_str(name)
    }
}

/// Maps a Rust field type onto its descriptor entry.
///
/// Arrays multiply the element count, so `[i16; 3]` is three `I16` slots.
pub trait FieldShape {
    const TYPE: FieldType;
    const COUNT: usize;
}

macro_rules! scalar_shape {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FieldShape for $ty {
                const TYPE: FieldType = FieldType::$variant;
                const COUNT: usize = 1;
            }
        )*
    };
}

scalar_shape! {
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
}

impl<T: FieldShape, const N: usize> FieldShape for [T; N] {
    const TYPE: FieldType = T::TYPE;
    const COUNT: usize = T::COUNT * N;
}

// ===========================================
// Packing and descriptors
// ===========================================

/// Alignment rule applied to every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Packing {
    /// Plain `#[repr(C)]`: each field at its natural alignment.
    Natural,
    /// `#[repr(C, packed(n))]` / `#pragma pack(n)`.
    Packed(PackAlign),
}

impl Packing {
    /// `packed(n)`, rejecting any `n` that is not a power of two.
    pub fn packed(n: usize) -> Result<Packing> {
        PackAlign::new(n)
            .map(Packing::Packed)
            .ok_or(LayoutError::InvalidPacking { pack: n })
    }

    /// Alignment a field with natural alignment `align` ends up with.
    pub const fn clamp(self, align: usize) -> usize {
        match self {
            Packing::Natural => align,
            Packing::Packed(n) if n.get() < align => n.get(),
            Packing::Packed(_) => align,
        }
    }

    fn code(self) -> u64 {
        match self {
            Packing::Natural => 0,
            Packing::Packed(n) => n.get() as u64,
        }
    }
}

impl fmt::Display for Packing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packing::Natural => f.write_str("natural"),
            Packing::Packed(n) => write!(f, "packed({n})"),
        }
    }
}

/// The argument of `packed(n)`: a non-zero power of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackAlign(NonZeroUsize);

impl PackAlign {
    pub const fn new(n: usize) -> Option<PackAlign> {
        if !n.is_power_of_two() {
            return None;
        }
        match NonZeroUsize::new(n) {
            Some(n) => Some(PackAlign(n)),
            None => None,
        }
    }

    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for PackAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One declared field: a scalar type repeated `count` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub count: usize,
}

impl FieldSpec {
    pub const fn new(name: &'static str, ty: FieldType, count: usize) -> Self {
        FieldSpec { name, ty, count }
    }

    pub const fn size(&self) -> usize {
        self.ty.size() * self.count
    }
}

/// A field placed at its computed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot {
    pub spec: FieldSpec,
    pub offset: usize,
}

impl FieldSlot {
    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn end(&self) -> usize {
        self.offset + self.spec.size()
    }
}

/// Versioned description of a fixed-layout struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutDescriptor {
    pub name: &'static str,
    pub version: u32,
    pub packing: Packing,
    pub fields: &'static [FieldSpec],
}

impl LayoutDescriptor {
    pub const fn new(
        name: &'static str,
        version: u32,
        packing: Packing,
        fields: &'static [FieldSpec],
    ) -> Self {
        LayoutDescriptor {
            name,
            version,
            packing,
            fields,
        }
    }

    /// The same fields under another packing rule.
    ///
    /// This is how a mismatched consumer declaration is modelled.
    pub const fn repacked(self, packing: Packing) -> Self {
        LayoutDescriptor { packing, ..self }
    }

    fn field_align(&self, spec: &FieldSpec) -> usize {
        self.packing.clamp(spec.ty.natural_align())
    }

    pub fn slots(&self) -> Vec<FieldSlot> {
        let mut offset = 0;
        self.fields
            .iter()
            .map(|spec| {
                offset = round_up(offset, self.field_align(spec));
                let slot = FieldSlot {
                    spec: *spec,
                    offset,
                };
                offset += spec.size();
                slot
            })
            .collect()
    }

    pub fn align(&self) -> usize {
        self.fields
            .iter()
            .map(|spec| self.field_align(spec))
            .max()
            .unwrap_or(1)
    }

    pub fn size(&self) -> usize {
        let end = self.slots().last().map_or(0, FieldSlot::end);
        round_up(end, self.align())
    }

    /// Bytes of padding the layout inserts, interior and trailing.
    pub fn padding(&self) -> usize {
        self.size() - self.fields.iter().map(FieldSpec::size).sum::<usize>()
    }

    pub fn field(&self, name: &str) -> Result<FieldSlot> {
        self.slots()
            .into_iter()
            .find(|slot| slot.name() == name)
            .ok_or_else(|| LayoutError::UnknownField {
                layout: self.name,
                field: name.to_string(),
            })
    }

    /// FNV-1a over version, packing and every placed field.
    ///
    /// The struct's own name is left out: two declarations with identical
    /// fields and offsets are interchangeable at the boundary.
    pub fn fingerprint(&self) -> u64 {
        let mut hash = Fnv1a::new();
        hash.write(&self.version.to_le_bytes());
        hash.write(&self.packing.code().to_le_bytes());
        for slot in self.slots() {
            hash.write(slot.name().as_bytes());
            hash.write(&[0, slot.spec.ty.code()]);
            hash.write(&(slot.spec.count as u64).to_le_bytes());
            hash.write(&(slot.offset as u64).to_le_bytes());
        }
        hash.write(&(self.size() as u64).to_le_bytes());
        hash.finish()
    }

    pub fn tag(&self) -> LayoutTag {
        LayoutTag {
            fingerprint: self.fingerprint(),
            size: self.size(),
            align: self.align(),
        }
    }
}

fn round_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

struct Fnv1a(u64);

impl Fnv1a {
    fn new() -> Self {
        Fnv1a(0xcbf2_9ce4_8422_2325)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(0x0000_0100_0000_01b3);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

// ===========================================
// Runtime tags and compiled structs
// ===========================================

/// What a tagged handle carries to identify the pointee's layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutTag {
    pub fingerprint: u64,
    pub size: usize,
    pub align: usize,
}

impl fmt::Display for LayoutTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:016x} ({} bytes, align {})",
            self.fingerprint, self.size, self.align
        )
    }
}

/// A Rust struct generated from a descriptor.
///
/// `OFFSETS` comes from `offset_of!`, i.e. from the compiler, so it can be
/// checked against the descriptor with [`verify_layout`].
pub trait FixedLayout: Copy + 'static {
    const LAYOUT: LayoutDescriptor;
    const OFFSETS: &'static [usize];
}

/// Fails with [`LayoutError::Drift`] if the compiler laid `T` out differently
/// from its descriptor.
pub fn verify_layout<T: FixedLayout>() -> Result<()> {
    let layout = T::LAYOUT;
    let drift = |detail: String| LayoutError::Drift {
        layout: layout.name,
        detail,
    };

    if layout.size() != size_of::<T>() {
        return Err(drift(format!(
            "size is {} but the descriptor says {}",
            size_of::<T>(),
            layout.size()
        )));
    }
    if layout.align() != align_of::<T>() {
        return Err(drift(format!(
            "alignment is {} but the descriptor says {}",
            align_of::<T>(),
            layout.align()
        )));
    }
    let slots = layout.slots();
    if slots.len() != T::OFFSETS.len() {
        return Err(drift(format!(
            "{} compiled fields, {} described",
            T::OFFSETS.len(),
            slots.len()
        )));
    }
    for (slot, &actual) in slots.iter().zip(T::OFFSETS) {
        if slot.offset != actual {
            return Err(drift(format!(
                "`{}` sits at offset {actual}, descriptor says {}",
                slot.name(),
                slot.offset
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::new("a", FieldType::U16, 1),
        FieldSpec::new("b", FieldType::U64, 1),
        FieldSpec::new("c", FieldType::U32, 1),
    ];

    fn packed(n: usize) -> Packing {
        Packing::packed(n).unwrap()
    }

    fn offsets(layout: &LayoutDescriptor) -> Vec<usize> {
        layout.slots().iter().map(|slot| slot.offset).collect()
    }

    #[test]
    fn packing_clamps_alignment() {
        let layout = LayoutDescriptor::new("Sample", 1, packed(2), FIELDS);
        assert_eq!(offsets(&layout), vec![0, 2, 10]);
        assert_eq!(layout.size(), 14);
        assert_eq!(layout.align(), 2);
        assert_eq!(layout.padding(), 0);
    }

    #[test]
    fn pack_four_inserts_interior_padding() {
        let layout = LayoutDescriptor::new("Sample", 1, packed(4), FIELDS);
        assert_eq!(offsets(&layout), vec![0, 4, 12]);
        assert_eq!(layout.size(), 16);
        assert_eq!(layout.padding(), 2);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn natural_layout_matches_repr_c() {
        let layout = LayoutDescriptor::new("Sample", 1, Packing::Natural, FIELDS);
        assert_eq!(offsets(&layout), vec![0, 8, 16]);
        assert_eq!(layout.size(), 24);
        assert_eq!(layout.align(), 8);
    }

    #[test]
    fn fingerprint_depends_on_packing_not_name() {
        let original = LayoutDescriptor::new("Sample", 1, packed(2), FIELDS);
        let renamed = LayoutDescriptor::new("Other", 1, packed(2), FIELDS);
        let repacked = original.repacked(packed(4));

        assert_eq!(original.fingerprint(), renamed.fingerprint());
        assert_ne!(original.fingerprint(), repacked.fingerprint());
        assert_ne!(original.tag(), repacked.tag());
    }

    #[test]
    fn version_bump_changes_the_tag() {
        let v1 = LayoutDescriptor::new("Sample", 1, packed(2), FIELDS);
        let v2 = LayoutDescriptor::new("Sample", 2, packed(2), FIELDS);
        assert_ne!(v1.tag(), v2.tag());
    }

    #[test]
    fn unknown_field_is_reported() {
        let layout = LayoutDescriptor::new("Sample", 1, Packing::Natural, FIELDS);
        let err = layout.field("missing").unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnknownField {
                layout: "Sample",
                field: "missing".into()
            }
        );
    }

    #[test]
    fn zero_and_non_power_of_two_packing_is_rejected() {
        for pack in [0, 3, 5, 6, 12] {
            assert_eq!(
                Packing::packed(pack),
                Err(LayoutError::InvalidPacking { pack })
            );
        }
        assert_eq!(PackAlign::new(0), None);
        assert_eq!(PackAlign::new(3), None);
    }

    #[test]
    fn power_of_two_packing_is_accepted() {
        for pack in [1, 2, 4, 8, 16] {
            assert_eq!(Packing::packed(pack).unwrap().to_string(), format!("packed({pack})"));
        }
        assert_eq!(packed(4).clamp(8), 4);
        assert_eq!(packed(4).clamp(2), 2);
    }

    #[test]
    fn array_shapes_multiply_counts() {
        assert_eq!(<[i16; 3] as FieldShape>::COUNT, 3);
        assert_eq!(<[i16; 3] as FieldShape>::TYPE, FieldType::I16);
        assert_eq!(<[[u32; 2]; 4] as FieldShape>::COUNT, 8);
    }
}
