/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Multidimensional views.
//!
//! A [`View`] composes three independent pieces:
//!
//! - an [`Extents`] value (inside the mapping) giving the shape,
//! - a [`Mapping`] of layout `L` turning an index into an offset,
//! - an [`Accessor`] `A` turning its handle plus that offset into an
//!   element reference.
//!
//! ```
//! use mdspan::DYN;
//! use mdspan::Ext2;
//! use mdspan::View;
//!
//! let data = [0, 1, 2, 3, 4, 5];
//! let v = View::<i32, Ext2<2, DYN>>::new(&data, [3]).unwrap();
//! assert_eq!(v[[1, 2]], 5);
//! assert_eq!(v.stride(0), 3);
//! ```
//!
//! A view never owns memory. The safe constructors borrow a slice and
//! check that it is at least [`Mapping::required_span_size`] long;
//! [`View::from_raw_parts`] leaves that to the caller.
//!
//! # Access
//!
//! [`View::get_unchecked`] is the caller-trusted access path: it
//! computes the offset and dereferences without looking at the index.
//! [`View::get`] and the `Index` impls check the index against the
//! extents first. The arity of every index is checked at compile time:
//! indices have type `[usize; RANK]`.
//!
//! # Views over mutable memory
//!
//! Views built on [`BasicMut`] are unique, like `&mut [T]`: they are not
//! `Clone`, their element accessors take `&mut self`, and deriving
//! views (`span`, `subspan`, conversions) consumes them.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Index;
use std::ops::IndexMut;

use crate::accessor::Accessor;
use crate::accessor::AccessorMut;
use crate::accessor::Basic;
use crate::accessor::BasicMut;
use crate::accessor::FromMutSlice;
use crate::accessor::FromSlice;
use crate::extents::Dyn1;
use crate::extents::Extents;
use crate::extents::ExtentsError;
use crate::iter::IndexIter;
use crate::layout::DenseLayout;
use crate::layout::Layout;
use crate::layout::Mapping;
use crate::layout::RowMajor;
use crate::layout::Trivial;
use crate::layout::TrivialMapping;

/// The type of error for view construction and conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ViewError {
    #[error("buffer of length {len} is smaller than the required span {required}")]
    BufferTooSmall { required: usize, len: usize },

    #[error("required span of mapping over {extents} overflows usize")]
    SpanOverflow { extents: String },

    #[error("first extent {extent} exceeds the required span {required}")]
    SpanOutOfRange { extent: usize, required: usize },

    #[error(transparent)]
    Extents(#[from] ExtentsError),
}

/// A non-owning multidimensional view of elements `T` with extents
/// `E`, laid out by `L` and reached through accessor `A`.
pub struct View<'a, T, E, L = RowMajor, A = Basic<T>>
where
    E: Extents,
    L: Layout,
    A: Accessor<Element = T>,
{
    handle: A::Handle,
    mapping: L::Mapping<E>,
    accessor: A,
    _marker: PhantomData<&'a T>,
}

/// A view over mutable memory.
pub type ViewMut<'a, T, E, L = RowMajor> = View<'a, T, E, L, BasicMut<T>>;

// The accessor decides how elements cross threads: `Basic` like
// `&[T]`, `BasicMut` like `&mut [T]`.
unsafe impl<T, E, L, A> Send for View<'_, T, E, L, A>
where
    E: Extents,
    L: Layout,
    A: Accessor<Element = T> + Send,
{
}

unsafe impl<T, E, L, A> Sync for View<'_, T, E, L, A>
where
    T: Sync,
    E: Extents,
    L: Layout,
    A: Accessor<Element = T> + Sync,
{
}

impl<T, E, L, A> Clone for View<'_, T, E, L, A>
where
    E: Extents,
    L: Layout,
    A: Accessor<Element = T> + Clone,
{
    fn clone(&self) -> Self {
        Self {
            handle: self.handle,
            mapping: self.mapping,
            accessor: self.accessor.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, E, L, A> Copy for View<'_, T, E, L, A>
where
    E: Extents,
    L: Layout,
    A: Accessor<Element = T> + Copy,
{
}

impl<T, E, L, A> fmt::Debug for View<'_, T, E, L, A>
where
    E: Extents,
    L: Layout,
    A: Accessor<Element = T> + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("ptr", &self.as_ptr())
            .field("mapping", &self.mapping)
            .field("accessor", &self.accessor)
            .finish()
    }
}

fn check_span<M: Mapping>(mapping: &M, len: usize) -> Result<(), ViewError> {
    let Some(required) = mapping.checked_required_span_size() else {
        tracing::debug!(extents = %mapping.extents(), "rejecting view with an overflowing span");
        return Err(ViewError::SpanOverflow {
            extents: mapping.extents().to_string(),
        });
    };
    if len < required {
        tracing::debug!(required, len, "rejecting view over a short buffer");
        return Err(ViewError::BufferTooSmall { required, len });
    }
    Ok(())
}

fn to_index<E: Extents, const N: usize>(index: [usize; N]) -> E::Index {
    const { assert!(N == E::RANK, "index arity must equal the rank of the view") };
    let mut converted = E::Index::default();
    converted.as_mut().copy_from_slice(&index);
    converted
}

impl<'a, T, E, L, A> View<'a, T, E, L, A>
where
    E: Extents,
    L: Layout,
    A: Accessor<Element = T>,
{
    pub const RANK: usize = E::RANK;
    pub const RANK_DYNAMIC: usize = E::RANK_DYNAMIC;
    pub const IS_ALWAYS_UNIQUE: bool = <L::Mapping<E> as Mapping>::IS_ALWAYS_UNIQUE;
    pub const IS_ALWAYS_CONTIGUOUS: bool = <L::Mapping<E> as Mapping>::IS_ALWAYS_CONTIGUOUS;
    pub const IS_ALWAYS_STRIDED: bool = <L::Mapping<E> as Mapping>::IS_ALWAYS_STRIDED;

    /// Assemble a view from its parts.
    ///
    /// # Safety
    ///
    /// For every index inside the extents, `accessor.access(handle,
    /// mapping.offset(index))` must be valid for `'a`: the buffer behind
    /// `handle` holds at least `mapping.required_span_size()` elements
    /// and is not mutated elsewhere (nor read elsewhere, for mutable
    /// accessors) while the view lives.
    pub unsafe fn from_raw_parts(handle: A::Handle, mapping: L::Mapping<E>, accessor: A) -> Self {
        Self {
            handle,
            mapping,
            accessor,
            _marker: PhantomData,
        }
    }

    /// A view of `data` through `mapping` and `accessor`.
    ///
    /// Fails if `data` is shorter than the span of `mapping`, or if that
    /// span does not fit in a `usize`.
    pub fn with_accessor(
        data: &'a [T],
        mapping: L::Mapping<E>,
        accessor: A,
    ) -> Result<Self, ViewError>
    where
        A: FromSlice,
    {
        check_span(&mapping, data.len())?;
        let handle = accessor.handle(data);
        // SAFETY: `data` is borrowed for `'a` and covers the span.
        Ok(unsafe { Self::from_raw_parts(handle, mapping, accessor) })
    }

    /// A view of `data` through `mapping`.
    pub fn from_mapping(data: &'a [T], mapping: L::Mapping<E>) -> Result<Self, ViewError>
    where
        A: FromSlice + Default,
    {
        Self::with_accessor(data, mapping, A::default())
    }

    /// A view of `data` with the given dynamic extents. Passing a
    /// number of extents other than `RANK_DYNAMIC` does not compile.
    pub fn new<const N: usize>(data: &'a [T], dynamic: [usize; N]) -> Result<Self, ViewError>
    where
        L: DenseLayout,
        A: FromSlice + Default,
    {
        Self::from_mapping(data, L::mapping(E::from_dynamic(dynamic)))
    }

    /// A mutable view of `data` through `mapping` and `accessor`.
    pub fn with_accessor_mut(
        data: &'a mut [T],
        mapping: L::Mapping<E>,
        accessor: A,
    ) -> Result<Self, ViewError>
    where
        A: FromMutSlice,
    {
        check_span(&mapping, data.len())?;
        let handle = accessor.handle_mut(data);
        // SAFETY: `data` is borrowed mutably for `'a` and covers the span.
        Ok(unsafe { Self::from_raw_parts(handle, mapping, accessor) })
    }

    /// A mutable view of `data` through `mapping`.
    pub fn from_mapping_mut(data: &'a mut [T], mapping: L::Mapping<E>) -> Result<Self, ViewError>
    where
        A: FromMutSlice + Default,
    {
        Self::with_accessor_mut(data, mapping, A::default())
    }

    /// A mutable view of `data` with the given dynamic extents.
    pub fn new_mut<const N: usize>(
        data: &'a mut [T],
        dynamic: [usize; N],
    ) -> Result<Self, ViewError>
    where
        L: DenseLayout,
        A: FromMutSlice + Default,
    {
        Self::from_mapping_mut(data, L::mapping(E::from_dynamic(dynamic)))
    }

    pub fn rank(&self) -> usize {
        E::RANK
    }

    pub fn rank_dynamic(&self) -> usize {
        E::RANK_DYNAMIC
    }

    pub fn extents(&self) -> &E {
        self.mapping.extents()
    }

    pub fn extent(&self, k: usize) -> usize {
        self.extents().extent(k)
    }

    pub fn static_extent(&self, k: usize) -> usize {
        self.extents().static_extent(k)
    }

    /// Number of elements in the view, saturating at `usize::MAX`. Only
    /// a mapping repeating offsets can exceed that.
    pub fn size(&self) -> usize {
        self.extents().checked_size().unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn is_unique(&self) -> bool {
        self.mapping.is_unique()
    }

    pub fn is_contiguous(&self) -> bool {
        self.mapping.is_contiguous()
    }

    pub fn is_strided(&self) -> bool {
        self.mapping.is_strided()
    }

    pub fn stride(&self, r: usize) -> usize {
        self.mapping.stride(r)
    }

    pub fn required_span_size(&self) -> usize {
        self.mapping.required_span_size()
    }

    pub fn mapping(&self) -> &L::Mapping<E> {
        &self.mapping
    }

    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    /// The stored handle.
    pub fn data(&self) -> A::Handle {
        self.handle
    }

    /// The stored handle, decayed to a raw pointer.
    pub fn as_ptr(&self) -> *const T {
        self.accessor.decay(self.handle)
    }

    /// The element at `index`, without checking it against the
    /// extents.
    ///
    /// # Safety
    ///
    /// `index` must lie inside the extents.
    pub unsafe fn get_unchecked(&self, index: E::Index) -> &T {
        debug_assert!(
            self.extents().contains(&index),
            "index {:?} out of bounds for extents {}",
            index,
            self.extents()
        );
        // SAFETY: the index is in bounds and the view covers its span.
        unsafe { self.accessor.access(self.handle, self.mapping.offset(index)) }
    }

    /// The element at `index`, or `None` if it lies outside the extents.
    pub fn get(&self, index: E::Index) -> Option<&T> {
        if !self.extents().contains(&index) {
            return None;
        }
        // SAFETY: checked above.
        Some(unsafe { self.get_unchecked(index) })
    }

    /// Iterate over every valid index, in row-major order.
    pub fn indices(&self) -> IndexIter<E> {
        IndexIter::new(*self.extents())
    }

    /// Iterate over the elements, in row-major index order.
    pub fn iter(&self) -> Iter<'_, 'a, T, E, L, A> {
        Iter {
            view: self,
            indices: self.indices(),
        }
    }

    /// The rank-1 view of the first `extent(0)` elements after the
    /// handle.
    ///
    /// Fails if those elements reach past the span of the view, as they
    /// may when strides repeat offsets. Contiguity is not checked: the
    /// result is only meaningful when the elements of the first
    /// dimension are adjacent in memory.
    pub fn span(self) -> Result<View<'a, T, Dyn1, Trivial, A>, ViewError> {
        let extent = self.extent(0);
        let required = self.required_span_size();
        if extent > required {
            tracing::debug!(extent, required, "rejecting span past the end of the view");
            return Err(ViewError::SpanOutOfRange { extent, required });
        }
        // SAFETY: the view covers `required` elements past its handle.
        Ok(unsafe { self.span_unchecked() })
    }

    /// As [`View::span`], without checking the first extent against the
    /// span. Rank 0 does not compile:
    ///
    /// ```compile_fail
    /// use mdspan::Ext0;
    /// use mdspan::View;
    ///
    /// let data = [1];
    /// let v = View::<i32, Ext0>::new(&data, []).unwrap();
    /// let s = unsafe { v.span_unchecked() };
    /// ```
    ///
    /// # Safety
    ///
    /// The `extent(0)` elements after the handle must all be covered by
    /// the buffer the view was built over.
    pub unsafe fn span_unchecked(self) -> View<'a, T, Dyn1, Trivial, A> {
        const { assert!(E::RANK >= 1, "span requires rank >= 1") };
        let extents = Dyn1::new([self.extent(0)]);
        View {
            handle: self.handle,
            mapping: TrivialMapping::new(extents),
            accessor: self.accessor,
            _marker: PhantomData,
        }
    }

    /// The same view with extents typed `F`. Compiles only when every
    /// static extent of `F` is statically known to match.
    pub fn convert<F: Extents>(self) -> View<'a, T, F, L, A> {
        let extents = self.extents().convert::<F>();
        View {
            handle: self.handle,
            mapping: L::remap(&self.mapping, extents),
            accessor: self.accessor,
            _marker: PhantomData,
        }
    }

    /// The same view with extents typed `F`, checking dynamic extents
    /// against the static extents of `F`.
    pub fn try_convert<F: Extents>(self) -> Result<View<'a, T, F, L, A>, ViewError> {
        let extents = self.extents().try_convert::<F>()?;
        Ok(View {
            handle: self.handle,
            mapping: L::remap(&self.mapping, extents),
            accessor: self.accessor,
            _marker: PhantomData,
        })
    }

    /// Parts of the view, for extensions building derived views.
    pub(crate) fn into_parts(self) -> (A::Handle, L::Mapping<E>, A) {
        (self.handle, self.mapping, self.accessor)
    }
}

impl<'a, T, E, L, A> View<'a, T, E, L, A>
where
    E: Extents,
    L: Layout,
    A: AccessorMut<Element = T>,
{
    /// The element at `index`, mutably, without checking it against the
    /// extents.
    ///
    /// # Safety
    ///
    /// `index` must lie inside the extents, and the mapping must be
    /// unique or the caller must otherwise avoid aliasing.
    pub unsafe fn get_unchecked_mut(&mut self, index: E::Index) -> &mut T {
        debug_assert!(
            self.extents().contains(&index),
            "index {:?} out of bounds for extents {}",
            index,
            self.extents()
        );
        // SAFETY: the index is in bounds and `&mut self` is unique.
        unsafe {
            self.accessor
                .access_mut(self.handle, self.mapping.offset(index))
        }
    }

    /// The element at `index`, mutably, or `None` if it lies outside
    /// the extents.
    pub fn get_mut(&mut self, index: E::Index) -> Option<&mut T> {
        if !self.extents().contains(&index) {
            return None;
        }
        // SAFETY: checked above; `&mut self` borrows the whole view.
        Some(unsafe { self.get_unchecked_mut(index) })
    }
}

impl<'a, T, E, L> View<'a, T, E, L, BasicMut<T>>
where
    E: Extents,
    L: Layout,
{
    /// Give up mutable access.
    pub fn into_shared(self) -> View<'a, T, E, L, Basic<T>> {
        View {
            handle: self.handle.cast_const(),
            mapping: self.mapping,
            accessor: self.accessor.into(),
            _marker: PhantomData,
        }
    }

    /// A shared view borrowing this one.
    pub fn as_shared(&self) -> View<'_, T, E, L, Basic<T>> {
        View {
            handle: self.handle.cast_const(),
            mapping: self.mapping,
            accessor: Basic::new(),
            _marker: PhantomData,
        }
    }

    /// A mutable view reborrowing this one.
    pub fn reborrow(&mut self) -> View<'_, T, E, L, BasicMut<T>> {
        View {
            handle: self.handle,
            mapping: self.mapping,
            accessor: BasicMut::new(),
            _marker: PhantomData,
        }
    }
}

impl<'a, T, E, L> From<View<'a, T, E, L, BasicMut<T>>> for View<'a, T, E, L, Basic<T>>
where
    E: Extents,
    L: Layout,
{
    fn from(view: View<'a, T, E, L, BasicMut<T>>) -> Self {
        view.into_shared()
    }
}

impl<T, E, L, A, const N: usize> Index<[usize; N]> for View<'_, T, E, L, A>
where
    E: Extents,
    L: Layout,
    A: Accessor<Element = T>,
{
    type Output = T;

    /// # Panics
    ///
    /// If `index` lies outside the extents. An index whose length is
    /// not the rank does not compile:
    ///
    /// ```compile_fail
    /// use mdspan::Dyn2;
    /// use mdspan::View;
    ///
    /// let data = [0; 6];
    /// let v = View::<i32, Dyn2>::new(&data, [2, 3]).unwrap();
    /// let x = v[[1]];
    /// ```
    fn index(&self, index: [usize; N]) -> &T {
        match self.get(to_index::<E, N>(index)) {
            Some(element) => element,
            None => panic!(
                "index {:?} out of bounds for extents {}",
                index,
                self.extents()
            ),
        }
    }
}

impl<T, E, L, A, const N: usize> IndexMut<[usize; N]> for View<'_, T, E, L, A>
where
    E: Extents,
    L: Layout,
    A: AccessorMut<Element = T>,
{
    fn index_mut(&mut self, index: [usize; N]) -> &mut T {
        let extents = *self.extents();
        match self.get_mut(to_index::<E, N>(index)) {
            Some(element) => element,
            None => panic!("index {:?} out of bounds for extents {}", index, extents),
        }
    }
}

/// Rank-1 views also index by a bare `usize`.
impl<T, E, L, A> Index<usize> for View<'_, T, E, L, A>
where
    E: Extents,
    L: Layout,
    A: Accessor<Element = T>,
{
    type Output = T;

    /// Above rank 1 this does not compile:
    ///
    /// ```compile_fail
    /// use mdspan::Dyn2;
    /// use mdspan::View;
    ///
    /// let data = [0; 6];
    /// let v = View::<i32, Dyn2>::new(&data, [2, 3]).unwrap();
    /// let x = v[1];
    /// ```
    fn index(&self, i: usize) -> &T {
        const { assert!(E::RANK == 1, "indexing by usize requires rank 1") };
        &self[[i]]
    }
}

impl<T, E, L, A> IndexMut<usize> for View<'_, T, E, L, A>
where
    E: Extents,
    L: Layout,
    A: AccessorMut<Element = T>,
{
    fn index_mut(&mut self, i: usize) -> &mut T {
        const { assert!(E::RANK == 1, "indexing by usize requires rank 1") };
        &mut self[[i]]
    }
}

/// Iterator over the elements of a [`View`], in row-major index order.
pub struct Iter<'v, 'a, T, E, L, A>
where
    E: Extents,
    L: Layout,
    A: Accessor<Element = T>,
{
    view: &'v View<'a, T, E, L, A>,
    indices: IndexIter<E>,
}

impl<'v, T, E, L, A> Iterator for Iter<'v, '_, T, E, L, A>
where
    E: Extents,
    L: Layout,
    A: Accessor<Element = T>,
{
    type Item = &'v T;

    fn next(&mut self) -> Option<&'v T> {
        let index = self.indices.next()?;
        // SAFETY: `IndexIter` only yields indices inside the extents.
        Some(unsafe { self.view.get_unchecked(index) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

impl<T, E, L, A> ExactSizeIterator for Iter<'_, '_, T, E, L, A>
where
    E: Extents,
    L: Layout,
    A: Accessor<Element = T>,
{
}

impl<'v, 'a, T, E, L, A> IntoIterator for &'v View<'a, T, E, L, A>
where
    E: Extents,
    L: Layout,
    A: Accessor<Element = T>,
{
    type Item = &'v T;
    type IntoIter = Iter<'v, 'a, T, E, L, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
