//! Checked opaque pointers.
//!
//! An untyped `void *` trusts the receiver to know the layout. An
//! [`OpaqueHandle`] carries the producer's [`LayoutTag`] with the pointer, so
//! the receiver's reinterpretation either matches or fails with
//! [`LayoutError::TagMismatch`].

use std::ffi::c_void;
use std::marker::PhantomData;
use std::mem::align_of;
use std::ptr::NonNull;

use crate::error::LayoutError;
use crate::layout::{FixedLayout, ForeignView, LayoutDescriptor, LayoutTag, Result};

/// A type-erased, tagged, exclusive borrow of one bridged struct.
#[derive(Debug)]
pub struct OpaqueHandle<'a> {
    ptr: NonNull<c_void>,
    tag: LayoutTag,
    _borrow: PhantomData<&'a mut [u8]>,
}

impl<'a> OpaqueHandle<'a> {
    pub fn new<T: FixedLayout>(value: &'a mut T) -> Self {
        OpaqueHandle {
            ptr: NonNull::from(value).cast(),
            tag: T::LAYOUT.tag(),
            _borrow: PhantomData,
        }
    }

    /// Rebuilds a handle from its raw parts.
    ///
    /// # Safety
    ///
    /// `ptr` must point to `tag.size` bytes that stay valid and exclusively
    /// borrowed for `'a`, holding a value whose layout `tag` describes.
    pub unsafe fn from_raw(ptr: *mut c_void, tag: LayoutTag) -> Result<Self> {
        let ptr = NonNull::new(ptr).ok_or(LayoutError::NullPointer)?;
        Ok(OpaqueHandle {
            ptr,
            tag,
            _borrow: PhantomData,
        })
    }

    pub fn tag(&self) -> LayoutTag {
        self.tag
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.ptr.as_ptr()
    }

    fn check<T: FixedLayout>(&self) -> Result<()> {
        let expected = T::LAYOUT.tag();
        if expected != self.tag {
            log::warn!(
                "refusing to reinterpret {} as `{}` ({})",
                self.tag,
                T::LAYOUT.name,
                expected
            );
            return Err(LayoutError::TagMismatch {
                expected,
                found: self.tag,
            });
        }
        let addr = self.ptr.as_ptr() as usize;
        if addr % align_of::<T>() != 0 {
            log::warn!("refusing misaligned `{}` at {addr:#x}", T::LAYOUT.name);
            return Err(LayoutError::Misaligned {
                layout: T::LAYOUT.name,
                addr,
                align: align_of::<T>(),
            });
        }
        Ok(())
    }

    /// Reinterprets the pointee as `T` if the layouts agree.
    pub fn downcast_mut<T: FixedLayout>(&mut self) -> Result<&mut T> {
        self.check::<T>()?;
        // SAFETY: the tag matches `T`'s layout and the handle holds the
        // exclusive borrow for `'a`.
        Ok(unsafe { self.ptr.cast::<T>().as_mut() })
    }

    pub fn into_mut<T: FixedLayout>(self) -> Result<&'a mut T> {
        self.check::<T>()?;
        // SAFETY: as in `downcast_mut`, and `self` is consumed.
        Ok(unsafe { self.ptr.cast::<T>().as_mut() })
    }

    /// Reinterprets through an arbitrary descriptor, tag unchecked.
    ///
    /// Access stays inside the `tag.size` bytes the producer lent.
    pub fn foreign_view(&mut self, layout: LayoutDescriptor) -> ForeignView<'_> {
        // SAFETY: the handle owns an exclusive borrow of `tag.size` bytes.
        let bytes =
            unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr().cast::<u8>(), self.tag.size) };
        ForeignView::new(layout, bytes)
    }
}

/// C-ABI form of [`OpaqueHandle`].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TaggedPtr {
    pub fingerprint: u64,
    pub size: usize,
    pub align: usize,
    pub ptr: *mut c_void,
}

impl TaggedPtr {
    pub fn from_handle(handle: &OpaqueHandle<'_>) -> Self {
        let tag = handle.tag();
        TaggedPtr {
            fingerprint: tag.fingerprint,
            size: tag.size,
            align: tag.align,
            ptr: handle.as_ptr(),
        }
    }

    pub fn tag(&self) -> LayoutTag {
        LayoutTag {
            fingerprint: self.fingerprint,
            size: self.size,
            align: self.align,
        }
    }

    /// # Safety
    ///
    /// Same contract as [`OpaqueHandle::from_raw`].
    pub unsafe fn as_handle<'a>(&self) -> Result<OpaqueHandle<'a>> {
        OpaqueHandle::from_raw(self.ptr, self.tag())
    }
}
