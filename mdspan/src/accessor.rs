/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Accessor policies: how a handle plus a linear offset becomes an
//! element reference.
//!
//! Accessors know nothing about shape. A view asks its mapping for an
//! offset and hands that offset, together with its stored handle, to
//! the accessor:
//!
//! - [`Basic`]: the handle is a `*const T`;
//! - [`BasicMut`]: the handle is a `*mut T` and elements may be
//!   written; views over it are unique;
//! - [`Aligned`]: the handle is an [`AlignedPtr`], a pointer checked at
//!   construction to be aligned to `N` bytes.
//!
//! Offsetting a handle produces a handle of the accessor's *offset
//! policy*. For `Aligned` that is `Basic`: a pointer moved by an
//! arbitrary number of elements is not known to be aligned any more, so
//! the guarantee is dropped rather than re-checked.
//!
//! The accessor traits are `unsafe` to implement: the safe view API
//! dereferences handles on the strength of their contracts.

use std::fmt;
use std::marker::PhantomData;
use std::mem;

/// Turns a handle plus an offset into an element reference.
///
/// # Safety
///
/// Views call [`Accessor::access`] with every offset below the span
/// their constructor checked, so implementations must:
///
/// - dereference nothing but the element `i` elements past `handle`;
/// - hand out handles from [`Accessor::offset`] such that accessing
///   `offset(handle, i)` at `j` through [`Accessor::offset_policy`]
///   reaches the same element as accessing `handle` at `i + j`;
/// - be `Send` (or `Sync`) only when the references they hand out may
///   cross threads that way: a view is `Send` exactly when its accessor
///   is. Read-only accessors need `Element: Sync` for both.
pub unsafe trait Accessor {
    type Element;

    /// Accessor-specific substitute for a raw pointer.
    type Handle: Copy;

    /// The accessor used for handles produced by [`Accessor::offset`].
    type OffsetPolicy: Accessor<Element = Self::Element>;

    /// The handle `i` elements past `handle`. Does not dereference.
    fn offset(
        &self,
        handle: Self::Handle,
        i: usize,
    ) -> <Self::OffsetPolicy as Accessor>::Handle;

    /// The accessor for handles produced by [`Accessor::offset`].
    fn offset_policy(&self) -> Self::OffsetPolicy;

    /// The element `i` elements past `handle`.
    ///
    /// # Safety
    ///
    /// `handle` offset by `i` must point to an initialized element that
    /// stays valid, and is not mutated elsewhere, for `'a`.
    unsafe fn access<'a>(&self, handle: Self::Handle, i: usize) -> &'a Self::Element;

    /// The raw pointer underlying `handle`.
    fn decay(&self, handle: Self::Handle) -> *const Self::Element;
}

/// Accessors that also grant mutable access.
///
/// # Safety
///
/// [`AccessorMut::access_mut`] must reach the same element as
/// [`Accessor::access`]. An accessor that is `Send` hands `&mut` across
/// threads, which needs `Element: Send`.
pub unsafe trait AccessorMut: Accessor {
    /// # Safety
    ///
    /// As [`Accessor::access`], and no other reference to the element
    /// may exist for `'a`.
    unsafe fn access_mut<'a>(&self, handle: Self::Handle, i: usize) -> &'a mut Self::Element;
}

/// Accessors whose handle can be taken from a shared slice.
///
/// # Safety
///
/// The handle returned for `data` must address `data[0]`: for every
/// `i < data.len()`, [`Accessor::access`] at `i` reaches `data[i]`.
pub unsafe trait FromSlice: Accessor {
    fn handle(&self, data: &[Self::Element]) -> Self::Handle;
}

/// Accessors whose handle can be taken from a mutable slice.
///
/// # Safety
///
/// As [`FromSlice`], with the handle derived from the mutable borrow so
/// that writes through it are allowed.
pub unsafe trait FromMutSlice: AccessorMut {
    fn handle_mut(&self, data: &mut [Self::Element]) -> Self::Handle;
}

/// Read-only accessor over a plain pointer.
pub struct Basic<T>(PhantomData<*const T>);

// SAFETY: hands out `&T` only.
unsafe impl<T: Sync> Send for Basic<T> {}
unsafe impl<T: Sync> Sync for Basic<T> {}

impl<T> Basic<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Basic<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Basic<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Basic<T> {}

impl<T> fmt::Debug for Basic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Basic")
    }
}

// SAFETY: the handle is the address of element 0 and `access` reads
// only `handle + i`.
unsafe impl<T> Accessor for Basic<T> {
    type Element = T;
    type Handle = *const T;
    type OffsetPolicy = Self;

    fn offset(&self, handle: *const T, i: usize) -> *const T {
        handle.wrapping_add(i)
    }

    fn offset_policy(&self) -> Self {
        *self
    }

    unsafe fn access<'a>(&self, handle: *const T, i: usize) -> &'a T {
        // SAFETY: upheld by the caller.
        unsafe { &*handle.add(i) }
    }

    fn decay(&self, handle: *const T) -> *const T {
        handle
    }
}

// SAFETY: `as_ptr` addresses `data[0]`.
unsafe impl<T> FromSlice for Basic<T> {
    fn handle(&self, data: &[T]) -> *const T {
        data.as_ptr()
    }
}

/// Read-write accessor over a plain pointer.
///
/// Not `Clone`: a view holding it has unique access to its elements.
pub struct BasicMut<T>(PhantomData<*mut T>);

// SAFETY: moved like `&mut T`, shared like `&T`.
unsafe impl<T: Send> Send for BasicMut<T> {}
unsafe impl<T: Sync> Sync for BasicMut<T> {}

impl<T> BasicMut<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for BasicMut<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BasicMut<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BasicMut")
    }
}

impl<T> From<BasicMut<T>> for Basic<T> {
    fn from(_: BasicMut<T>) -> Self {
        Basic::new()
    }
}

// SAFETY: as for `Basic`.
unsafe impl<T> Accessor for BasicMut<T> {
    type Element = T;
    type Handle = *mut T;
    type OffsetPolicy = Self;

    fn offset(&self, handle: *mut T, i: usize) -> *mut T {
        handle.wrapping_add(i)
    }

    fn offset_policy(&self) -> Self {
        Self::new()
    }

    unsafe fn access<'a>(&self, handle: *mut T, i: usize) -> &'a T {
        // SAFETY: upheld by the caller.
        unsafe { &*handle.add(i) }
    }

    fn decay(&self, handle: *mut T) -> *const T {
        handle
    }
}

// SAFETY: `access_mut` reads the same element as `access`.
unsafe impl<T> AccessorMut for BasicMut<T> {
    unsafe fn access_mut<'a>(&self, handle: *mut T, i: usize) -> &'a mut T {
        // SAFETY: upheld by the caller.
        unsafe { &mut *handle.add(i) }
    }
}

// SAFETY: `as_mut_ptr` addresses `data[0]` with write provenance.
unsafe impl<T> FromMutSlice for BasicMut<T> {
    fn handle_mut(&self, data: &mut [T]) -> *mut T {
        data.as_mut_ptr()
    }
}

/// Whether `align` is a valid alignment for elements of `size` bytes:
/// a power of two and a multiple of the element size.
pub const fn valid_alignment(align: usize, size: usize) -> bool {
    align.is_power_of_two() && (size == 0 || align % size == 0)
}

/// A pointer known to be aligned to `N` bytes.
pub struct AlignedPtr<T, const N: usize> {
    ptr: *const T,
}

impl<T, const N: usize> AlignedPtr<T, N> {
    /// Wrap `ptr`.
    ///
    /// # Panics
    ///
    /// If `ptr` is not a multiple of `N`. A malformed `N` (not a power
    /// of two, or not a multiple of `size_of::<T>()`) does not compile.
    pub fn new(ptr: *const T) -> Self {
        const {
            assert!(
                valid_alignment(N, mem::size_of::<T>()),
                "alignment must be a power of two and a multiple of the element size"
            )
        };
        let misalignment = ptr as usize % N;
        if misalignment != 0 {
            tracing::error!(
                ptr = ?ptr,
                alignment = N,
                misalignment,
                "misaligned pointer passed to aligned accessor"
            );
        }
        assert!(
            misalignment == 0,
            "pointer {:p} is not aligned to {} bytes",
            ptr,
            N
        );
        Self { ptr }
    }

    pub fn get(self) -> *const T {
        self.ptr
    }
}

impl<T, const N: usize> Clone for AlignedPtr<T, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const N: usize> Copy for AlignedPtr<T, N> {}

impl<T, const N: usize> fmt::Debug for AlignedPtr<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AlignedPtr<{}>({:p})", N, self.ptr)
    }
}

/// Read-only accessor whose handles are aligned to `N` bytes.
pub struct Aligned<T, const N: usize>(PhantomData<*const T>);

// SAFETY: hands out `&T` only.
unsafe impl<T: Sync, const N: usize> Send for Aligned<T, N> {}
unsafe impl<T: Sync, const N: usize> Sync for Aligned<T, N> {}

impl<T, const N: usize> Aligned<T, N> {
    /// An `N` that is not a power of two, or not a multiple of
    /// `size_of::<T>()`, does not compile:
    ///
    /// ```compile_fail
    /// use mdspan::Aligned;
    ///
    /// let acc = Aligned::<f64, 12>::new();
    /// ```
    ///
    /// ```compile_fail
    /// use mdspan::Aligned;
    ///
    /// let acc = Aligned::<f64, 4>::new();
    /// ```
    pub const fn new() -> Self {
        const {
            assert!(
                valid_alignment(N, mem::size_of::<T>()),
                "alignment must be a power of two and a multiple of the element size"
            )
        };
        Self(PhantomData)
    }
}

impl<T, const N: usize> Default for Aligned<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Clone for Aligned<T, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const N: usize> Copy for Aligned<T, N> {}

impl<T, const N: usize> fmt::Debug for Aligned<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Aligned<{}>", N)
    }
}

// SAFETY: as for `Basic`; offsets downgrade to a plain pointer.
unsafe impl<T, const N: usize> Accessor for Aligned<T, N> {
    type Element = T;
    type Handle = AlignedPtr<T, N>;
    type OffsetPolicy = Basic<T>;

    fn offset(&self, handle: AlignedPtr<T, N>, i: usize) -> *const T {
        handle.get().wrapping_add(i)
    }

    fn offset_policy(&self) -> Basic<T> {
        Basic::new()
    }

    unsafe fn access<'a>(&self, handle: AlignedPtr<T, N>, i: usize) -> &'a T {
        // SAFETY: upheld by the caller.
        unsafe { &*handle.get().add(i) }
    }

    fn decay(&self, handle: AlignedPtr<T, N>) -> *const T {
        handle.get()
    }
}

// SAFETY: `as_ptr` addresses `data[0]`.
unsafe impl<T, const N: usize> FromSlice for Aligned<T, N> {
    /// # Panics
    ///
    /// If `data` does not start on an `N`-byte boundary.
    fn handle(&self, data: &[T]) -> AlignedPtr<T, N> {
        AlignedPtr::new(data.as_ptr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(align(64))]
    struct Block([f32; 32]);

    #[test]
    fn test_basic() {
        let data = [1, 2, 3, 4];
        let acc = Basic::<i32>::new();
        let h = acc.handle(&data);
        assert_eq!(unsafe { *acc.access(h, 2) }, 3);
        let moved = acc.offset(h, 1);
        assert_eq!(unsafe { *acc.access(moved, 0) }, 2);
        assert_eq!(acc.decay(h), data.as_ptr());
    }

    #[test]
    fn test_basic_mut() {
        let mut data = [1, 2, 3, 4];
        let acc = BasicMut::<i32>::new();
        let h = acc.handle_mut(&mut data);
        unsafe { *acc.access_mut(h, 3) = 40 };
        assert_eq!(unsafe { *acc.access(h, 3) }, 40);
        assert_eq!(data, [1, 2, 3, 40]);
    }

    #[test]
    fn test_valid_alignment() {
        assert!(valid_alignment(16, 4));
        assert!(valid_alignment(8, 8));
        assert!(valid_alignment(4, 0));
        assert!(!valid_alignment(12, 4));
        assert!(!valid_alignment(4, 8));
        assert!(!valid_alignment(0, 4));
    }

    #[test]
    fn test_aligned_access() {
        let block = Block(std::array::from_fn(|i| i as f32));
        let acc = Aligned::<f32, 64>::new();
        let h = acc.handle(&block.0);
        assert_eq!(unsafe { *acc.access(h, 5) }, 5.0);
        assert_eq!(acc.decay(h), block.0.as_ptr());
    }

    #[test]
    fn test_aligned_offset_downgrades() {
        let block = Block(std::array::from_fn(|i| i as f32));
        let acc = Aligned::<f32, 64>::new();
        let h = acc.handle(&block.0);
        // A plain pointer, no longer 64-byte aligned.
        let moved: *const f32 = acc.offset(h, 3);
        let basic = acc.offset_policy();
        assert_eq!(unsafe { *basic.access(moved, 0) }, 3.0);
        assert_ne!(moved as usize % 64, 0);
    }

    #[test]
    #[should_panic(expected = "is not aligned to 64 bytes")]
    fn test_aligned_rejects_misaligned() {
        let block = Block([0.0; 32]);
        let _ = AlignedPtr::<f32, 64>::new(block.0[1..].as_ptr());
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_aligned_logs_before_panicking() {
        let block = Block([0.0; 32]);
        let result = std::panic::catch_unwind(|| AlignedPtr::<f32, 64>::new(block.0[1..].as_ptr()));
        assert!(result.is_err());
        assert!(logs_contain("misaligned pointer passed to aligned accessor"));
    }

    static_assertions::assert_impl_all!(Basic<String>: Copy, Send, Sync, Default);
    static_assertions::assert_impl_all!(Aligned<f64, 32>: Copy, Send, Sync, Default);
    static_assertions::assert_not_impl_any!(BasicMut<String>: Clone);

    // Shared accessors cross threads like `&T`, mutable ones like
    // `&mut T`.
    static_assertions::assert_not_impl_any!(Basic<std::cell::Cell<i32>>: Send, Sync);
    static_assertions::assert_not_impl_any!(Aligned<std::cell::Cell<i32>, 4>: Send, Sync);
    static_assertions::assert_impl_all!(BasicMut<std::cell::Cell<i32>>: Send);
    static_assertions::assert_not_impl_any!(BasicMut<std::cell::Cell<i32>>: Sync);
    static_assertions::assert_not_impl_any!(BasicMut<std::rc::Rc<i32>>: Send, Sync);
}
