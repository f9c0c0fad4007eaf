//! # struct-bridge
//!
//! Two small demos of a native entry point lending a fixed-layout struct to a
//! callback across the C ABI, and of what happens when the two sides disagree
//! about struct packing.
//!
//! - [`demo_a`]: `StructA` packed to 1 byte, passed as `void *`, with an
//!   optional re-print after the callback.
//! - [`demo_b`]: `StructB` packed to 2 bytes, passed as a typed pointer, an
//!   untyped pointer, or a tagged handle.
//!
//! Layout agreement is not left to hand-written declarations on both sides.
//! Each struct is declared once with [`fixed_layout!`], which produces the Rust
//! type and a [`LayoutDescriptor`](layout::LayoutDescriptor); the C header in
//! `c_src/` is rendered from the same descriptors by [`header`].
//!
//! The untyped entry points keep the classic hazard: a consumer that declares
//! the struct with different packing gets wrong values and nothing reports
//! it. [`handle::OpaqueHandle`] is the checked alternative, which refuses a
//! mismatched reinterpretation with [`LayoutError::TagMismatch`].

pub mod config;
pub mod demo_a;
pub mod demo_b;
pub mod dump;
pub mod error;
pub mod handle;
pub mod header;
pub mod layout;
pub mod native;

pub use dump::{Invocation, StructDump};
pub use error::LayoutError;
pub use handle::{OpaqueHandle, TaggedPtr};
pub use layout::{FixedLayout, LayoutDescriptor};
