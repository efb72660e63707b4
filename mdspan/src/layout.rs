/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Layout policies and their mappings.
//!
//! A [`Layout`] names a family of [`Mapping`]s, one per extents type. A
//! mapping is a pure function from a multidimensional index (in `ℕⁿ`)
//! to a linear memory offset (in `ℕ¹`), together with the structural
//! facts a caller may rely on:
//!
//! - *unique*: no two valid indices share an offset;
//! - *contiguous*: the valid indices reach every offset in
//!   `[0, required_span_size())` and nothing else;
//! - *strided*: the offset is `dot(strides, index)` for a fixed
//!   per-dimension stride.
//!
//! Each fact exists both as an associated constant (`IS_ALWAYS_*`, true
//! for every mapping of the layout) and as a method answering for one
//! instance.
//!
//! | Layout          | offset                 | always unique / contiguous / strided |
//! |-----------------|------------------------|--------------------------------------|
//! | [`Trivial`]     | `i₀` (rank ≤ 1)        | yes / yes / yes                      |
//! | [`RowMajor`]    | last index fastest     | yes / yes / yes                      |
//! | [`ColumnMajor`] | first index fastest    | yes / yes / yes                      |
//! | [`Strided`]     | `∑ iₖ × strides[k]`    | no / no / yes                        |

use std::fmt;
use std::hash::Hash;

use serde::Deserialize;
use serde::Serialize;

use crate::extents::Extents;

mod sealed {
    // Implemented only by the layout policies below.
    pub trait Sealed {}
}

/// A layout policy: the family of mappings sharing an offset formula.
pub trait Layout:
    sealed::Sealed + Copy + fmt::Debug + Default + Eq + Hash + Send + Sync + 'static
{
    /// The mapping of this layout over extents `E`.
    type Mapping<E: Extents>: Mapping<Extents = E, Layout = Self>;

    /// Rebuild `mapping` over `extents`, which must be value-equal to
    /// `mapping.extents()` but may split static and dynamic dimensions
    /// differently.
    fn remap<E: Extents, F: Extents>(mapping: &Self::Mapping<E>, extents: F) -> Self::Mapping<F>;
}

/// Layouts whose mapping is fully determined by the extents.
pub trait DenseLayout: Layout {
    fn mapping<E: Extents>(extents: E) -> Self::Mapping<E>;
}

/// A map from multidimensional indices to linear offsets.
pub trait Mapping: Copy + fmt::Debug + Eq + Hash + Send + Sync {
    type Extents: Extents;
    type Layout: Layout;

    /// Every mapping of this type is unique.
    const IS_ALWAYS_UNIQUE: bool;

    /// Every mapping of this type is contiguous.
    const IS_ALWAYS_CONTIGUOUS: bool;

    /// Every mapping of this type is strided.
    const IS_ALWAYS_STRIDED: bool;

    fn extents(&self) -> &Self::Extents;

    /// The linear offset of `index`. Indices outside the extents are
    /// not checked.
    fn offset(&self, index: <Self::Extents as Extents>::Index) -> usize;

    /// Minimum length of a buffer addressed through this mapping, or
    /// `None` if it does not fit in a `usize`.
    fn checked_required_span_size(&self) -> Option<usize>;

    /// Minimum length of a buffer addressed through this mapping,
    /// saturating at `usize::MAX`.
    fn required_span_size(&self) -> usize {
        self.checked_required_span_size().unwrap_or(usize::MAX)
    }

    /// Offset delta when incrementing index `r` by one.
    fn stride(&self, r: usize) -> usize;

    fn is_unique(&self) -> bool {
        Self::IS_ALWAYS_UNIQUE
    }

    fn is_contiguous(&self) -> bool {
        Self::IS_ALWAYS_CONTIGUOUS
    }

    fn is_strided(&self) -> bool {
        Self::IS_ALWAYS_STRIDED
    }
}

/// Layout for rank-0 and rank-1 extents: the offset is the index.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Trivial;

/// Row-major layout (C-style): last index varies fastest.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowMajor;

/// Column-major layout (Fortran-style): first index varies fastest.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnMajor;

/// General strided layout with an explicit stride per dimension.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Strided;

impl sealed::Sealed for Trivial {}
impl sealed::Sealed for RowMajor {}
impl sealed::Sealed for ColumnMajor {}
impl sealed::Sealed for Strided {}

/// Mapping of the [`Trivial`] layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TrivialMapping<E: Extents> {
    extents: E,
}

impl<E: Extents> TrivialMapping<E> {
    /// Rank above 1 is rejected at compile time:
    ///
    /// ```compile_fail
    /// use mdspan::Dyn2;
    /// use mdspan::TrivialMapping;
    ///
    /// let m = TrivialMapping::new(Dyn2::new([2, 3]));
    /// ```
    pub fn new(extents: E) -> Self {
        const { assert!(E::RANK <= 1, "the trivial layout requires rank <= 1") };
        Self { extents }
    }
}

impl<E: Extents> From<E> for TrivialMapping<E> {
    fn from(extents: E) -> Self {
        Self::new(extents)
    }
}

impl<E: Extents> Mapping for TrivialMapping<E> {
    type Extents = E;
    type Layout = Trivial;

    const IS_ALWAYS_UNIQUE: bool = true;
    const IS_ALWAYS_CONTIGUOUS: bool = true;
    const IS_ALWAYS_STRIDED: bool = true;

    fn extents(&self) -> &E {
        &self.extents
    }

    fn offset(&self, index: E::Index) -> usize {
        index.as_ref().first().copied().unwrap_or(0)
    }

    fn checked_required_span_size(&self) -> Option<usize> {
        self.extents.checked_size()
    }

    fn stride(&self, _r: usize) -> usize {
        1
    }
}

impl Layout for Trivial {
    type Mapping<E: Extents> = TrivialMapping<E>;

    fn remap<E: Extents, F: Extents>(_mapping: &TrivialMapping<E>, extents: F) -> TrivialMapping<F> {
        TrivialMapping::new(extents)
    }
}

impl DenseLayout for Trivial {
    fn mapping<E: Extents>(extents: E) -> TrivialMapping<E> {
        TrivialMapping::new(extents)
    }
}

/// Mapping of the [`RowMajor`] layout.
///
/// ```
/// use mdspan::Dyn2;
/// use mdspan::Mapping;
/// use mdspan::RowMajorMapping;
///
/// let m = RowMajorMapping::new(Dyn2::new([2, 3]));
/// assert_eq!(m.offset([1, 2]), 5);
/// assert_eq!(m.strides(), [3, 1]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct RowMajorMapping<E: Extents> {
    extents: E,
}

impl<E: Extents> RowMajorMapping<E> {
    pub fn new(extents: E) -> Self {
        Self { extents }
    }

    /// The stride of every dimension.
    pub fn strides(&self) -> E::Index {
        // "flip it and reverse it" --Missy Elliott
        let mut strides = *self.extents.as_index();
        let mut running = 1;
        for slot in strides.as_mut().iter_mut().rev() {
            let extent = *slot;
            *slot = running;
            running = running.saturating_mul(extent);
        }
        strides
    }
}

impl<E: Extents> From<E> for RowMajorMapping<E> {
    fn from(extents: E) -> Self {
        Self::new(extents)
    }
}

impl<E: Extents> Mapping for RowMajorMapping<E> {
    type Extents = E;
    type Layout = RowMajor;

    const IS_ALWAYS_UNIQUE: bool = true;
    const IS_ALWAYS_CONTIGUOUS: bool = true;
    const IS_ALWAYS_STRIDED: bool = true;

    fn extents(&self) -> &E {
        &self.extents
    }

    fn offset(&self, index: E::Index) -> usize {
        index
            .as_ref()
            .iter()
            .zip(self.extents.as_slice())
            .fold(0, |running, (&i, &n)| running * n + i)
    }

    fn checked_required_span_size(&self) -> Option<usize> {
        self.extents.checked_size()
    }

    fn stride(&self, r: usize) -> usize {
        self.extents
            .checked_product(r + 1, E::RANK)
            .unwrap_or(usize::MAX)
    }
}

impl Layout for RowMajor {
    type Mapping<E: Extents> = RowMajorMapping<E>;

    fn remap<E: Extents, F: Extents>(
        _mapping: &RowMajorMapping<E>,
        extents: F,
    ) -> RowMajorMapping<F> {
        RowMajorMapping::new(extents)
    }
}

impl DenseLayout for RowMajor {
    fn mapping<E: Extents>(extents: E) -> RowMajorMapping<E> {
        RowMajorMapping::new(extents)
    }
}

/// Mapping of the [`ColumnMajor`] layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ColumnMajorMapping<E: Extents> {
    extents: E,
}

impl<E: Extents> ColumnMajorMapping<E> {
    pub fn new(extents: E) -> Self {
        Self { extents }
    }

    /// The stride of every dimension.
    pub fn strides(&self) -> E::Index {
        let mut strides = *self.extents.as_index();
        let mut running = 1;
        for slot in strides.as_mut().iter_mut() {
            let extent = *slot;
            *slot = running;
            running = running.saturating_mul(extent);
        }
        strides
    }
}

impl<E: Extents> From<E> for ColumnMajorMapping<E> {
    fn from(extents: E) -> Self {
        Self::new(extents)
    }
}

impl<E: Extents> Mapping for ColumnMajorMapping<E> {
    type Extents = E;
    type Layout = ColumnMajor;

    const IS_ALWAYS_UNIQUE: bool = true;
    const IS_ALWAYS_CONTIGUOUS: bool = true;
    const IS_ALWAYS_STRIDED: bool = true;

    fn extents(&self) -> &E {
        &self.extents
    }

    fn offset(&self, index: E::Index) -> usize {
        index
            .as_ref()
            .iter()
            .zip(self.extents.as_slice())
            .rev()
            .fold(0, |running, (&i, &n)| running * n + i)
    }

    fn checked_required_span_size(&self) -> Option<usize> {
        self.extents.checked_size()
    }

    fn stride(&self, r: usize) -> usize {
        self.extents.checked_product(0, r).unwrap_or(usize::MAX)
    }
}

impl Layout for ColumnMajor {
    type Mapping<E: Extents> = ColumnMajorMapping<E>;

    fn remap<E: Extents, F: Extents>(
        _mapping: &ColumnMajorMapping<E>,
        extents: F,
    ) -> ColumnMajorMapping<F> {
        ColumnMajorMapping::new(extents)
    }
}

impl DenseLayout for ColumnMajor {
    fn mapping<E: Extents>(extents: E) -> ColumnMajorMapping<E> {
        ColumnMajorMapping::new(extents)
    }
}

/// Mapping of the [`Strided`] layout.
///
/// Uniqueness and contiguity depend on the strides; they are
/// classified once, when the mapping is built, and cached:
///
/// ```
/// use mdspan::Dyn2;
/// use mdspan::Mapping;
/// use mdspan::StridedMapping;
///
/// let packed = StridedMapping::new(Dyn2::new([2, 3]), [1, 2]);
/// assert!(packed.is_unique() && packed.is_contiguous());
///
/// let padded = StridedMapping::new(Dyn2::new([2, 3]), [1, 4]);
/// assert!(padded.is_unique() && !padded.is_contiguous());
///
/// let broadcast = StridedMapping::new(Dyn2::new([2, 3]), [0, 1]);
/// assert!(!broadcast.is_unique());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(bound = "", from = "StridedParts<E>", into = "StridedParts<E>")]
pub struct StridedMapping<E: Extents> {
    extents: E,
    strides: E::Index,
    unique: bool,
    contiguous: bool,
}

// Wire form of a strided mapping; the classification is recomputed on
// the way in.
#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
struct StridedParts<E: Extents> {
    extents: E,
    strides: E::Index,
}

impl<E: Extents> From<StridedParts<E>> for StridedMapping<E> {
    fn from(parts: StridedParts<E>) -> Self {
        Self::new(parts.extents, parts.strides)
    }
}

impl<E: Extents> From<StridedMapping<E>> for StridedParts<E> {
    fn from(mapping: StridedMapping<E>) -> Self {
        Self {
            extents: mapping.extents,
            strides: mapping.strides,
        }
    }
}

impl<E: Extents> StridedMapping<E> {
    pub fn new(extents: E, strides: E::Index) -> Self {
        let (unique, contiguous) = classify(extents.as_slice(), strides.as_ref(), &mut E::Index::default());
        tracing::trace!(
            %extents,
            strides = ?strides.as_ref(),
            unique,
            contiguous,
            "classified strided mapping"
        );
        Self {
            extents,
            strides,
            unique,
            contiguous,
        }
    }

    /// The strided mapping computing the same offsets as `mapping`.
    pub fn from_mapping<M: Mapping<Extents = E>>(mapping: &M) -> Self {
        const {
            assert!(
                M::IS_ALWAYS_STRIDED,
                "only always-strided mappings convert to the strided layout"
            )
        };
        let mut strides = E::Index::default();
        for (r, stride) in strides.as_mut().iter_mut().enumerate() {
            *stride = mapping.stride(r);
        }
        Self::new(*mapping.extents(), strides)
    }

    /// The stride of every dimension.
    pub fn strides(&self) -> &E::Index {
        &self.strides
    }
}

/// Classify a strided mapping as `(unique, contiguous)`.
///
/// Dimensions are visited by ascending stride (ties keep their
/// original order), skipping those of extent 1, which never move the
/// offset. `reach` is one past the largest offset produced by the
/// dimensions visited so far. A dimension whose stride differs from
/// `reach` leaves a gap or an overlap, so the mapping is not
/// contiguous; a stride below `reach` means its offsets collide with
/// earlier ones, so the mapping is not unique. While the mapping stays
/// contiguous, `reach == stride[prev] * extent[prev]`.
///
/// `order` is scratch space of length `extents.len()`.
fn classify(extents: &[usize], strides: &[usize], order: &mut impl AsMut<[usize]>) -> (bool, bool) {
    // An empty mapping addresses nothing.
    if extents.contains(&0) {
        return (true, true);
    }

    let order = order.as_mut();
    for (dim, slot) in order.iter_mut().enumerate() {
        *slot = dim;
    }
    // Stable insertion sort by stride.
    for i in 1..order.len() {
        let mut j = i;
        while j > 0 && strides[order[j - 1]] > strides[order[j]] {
            order.swap(j - 1, j);
            j -= 1;
        }
    }

    let mut unique = true;
    let mut contiguous = true;
    let mut reach: usize = 1;
    for &dim in order.iter() {
        let (extent, stride) = (extents[dim], strides[dim]);
        if extent == 1 {
            continue;
        }
        if stride != reach {
            contiguous = false;
        }
        if stride < reach {
            unique = false;
        }
        reach = reach.saturating_add(stride.saturating_mul(extent - 1));
    }
    (unique, contiguous)
}

impl<E: Extents> Mapping for StridedMapping<E> {
    type Extents = E;
    type Layout = Strided;

    const IS_ALWAYS_UNIQUE: bool = false;
    const IS_ALWAYS_CONTIGUOUS: bool = false;
    const IS_ALWAYS_STRIDED: bool = true;

    fn extents(&self) -> &E {
        &self.extents
    }

    fn offset(&self, index: E::Index) -> usize {
        // Dot product ∑ᵢ (strideᵢ × indexᵢ)
        index
            .as_ref()
            .iter()
            .zip(self.strides.as_ref())
            .map(|(i, s)| i * s)
            .sum()
    }

    fn checked_required_span_size(&self) -> Option<usize> {
        if self.extents.as_slice().contains(&0) {
            return Some(0);
        }
        // 1 + ∑ᵢ strideᵢ × (extentᵢ - 1)
        self.extents
            .as_slice()
            .iter()
            .zip(self.strides.as_ref())
            .try_fold(1usize, |span, (&n, &s)| span.checked_add(s.checked_mul(n - 1)?))
    }

    fn stride(&self, r: usize) -> usize {
        self.strides.as_ref()[r]
    }

    fn is_unique(&self) -> bool {
        self.unique
    }

    fn is_contiguous(&self) -> bool {
        self.contiguous
    }
}

impl Layout for Strided {
    type Mapping<E: Extents> = StridedMapping<E>;

    fn remap<E: Extents, F: Extents>(mapping: &StridedMapping<E>, extents: F) -> StridedMapping<F> {
        let mut strides = F::Index::default();
        strides.as_mut().copy_from_slice(mapping.strides.as_ref());
        StridedMapping {
            extents,
            strides,
            unique: mapping.unique,
            contiguous: mapping.contiguous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extents::DYN;
    use crate::extents::Dyn0;
    use crate::extents::Dyn1;
    use crate::extents::Dyn2;
    use crate::extents::Dyn3;
    use crate::extents::Ext2;
    use crate::iter::IndexIter;

    #[test]
    fn test_row_major_2x3() {
        let m = RowMajorMapping::new(Dyn2::new([2, 3]));
        assert_eq!(m.offset([0, 0]), 0);
        assert_eq!(m.offset([0, 2]), 2);
        assert_eq!(m.offset([1, 0]), 3);
        assert_eq!(m.offset([1, 2]), 5);
        assert_eq!(m.stride(0), 3);
        assert_eq!(m.stride(1), 1);
        assert_eq!(m.strides(), [3, 1]);
        assert_eq!(m.required_span_size(), 6);
    }

    #[test]
    fn test_column_major_2x3() {
        let m = ColumnMajorMapping::new(Dyn2::new([2, 3]));
        assert_eq!(m.offset([0, 0]), 0);
        assert_eq!(m.offset([1, 0]), 1);
        assert_eq!(m.offset([0, 2]), 4);
        assert_eq!(m.offset([1, 2]), 5);
        assert_eq!(m.stride(0), 1);
        assert_eq!(m.stride(1), 2);
        assert_eq!(m.strides(), [1, 2]);
        assert_eq!(m.required_span_size(), 6);
    }

    #[test]
    fn test_row_major_3d() {
        let m = RowMajorMapping::new(Dyn3::new([4, 4, 4]));
        assert_eq!(m.strides(), [16, 4, 1]);
        assert_eq!(m.offset([1, 2, 3]), 16 + 8 + 3);
        assert_eq!(m.required_span_size(), 64);
    }

    #[test]
    fn test_trivial() {
        let m = TrivialMapping::new(Dyn1::new([5]));
        assert_eq!(m.offset([3]), 3);
        assert_eq!(m.stride(0), 1);
        assert_eq!(m.required_span_size(), 5);

        let scalar = TrivialMapping::new(Dyn0::new([]));
        assert_eq!(scalar.offset([]), 0);
        assert_eq!(scalar.required_span_size(), 1);
    }

    #[test]
    fn test_rank_zero_offsets() {
        let e = Dyn0::new([]);
        assert_eq!(RowMajorMapping::new(e).offset([]), 0);
        assert_eq!(ColumnMajorMapping::new(e).offset([]), 0);
        let s = StridedMapping::new(e, []);
        assert_eq!(s.offset([]), 0);
        assert_eq!(s.required_span_size(), 1);
        assert!(s.is_unique());
        assert!(s.is_contiguous());
    }

    #[test]
    fn test_static_guarantees() {
        fn always<M: Mapping>() -> (bool, bool, bool) {
            (
                M::IS_ALWAYS_UNIQUE,
                M::IS_ALWAYS_CONTIGUOUS,
                M::IS_ALWAYS_STRIDED,
            )
        }
        assert_eq!(always::<TrivialMapping<Dyn1>>(), (true, true, true));
        assert_eq!(always::<RowMajorMapping<Dyn3>>(), (true, true, true));
        assert_eq!(always::<ColumnMajorMapping<Dyn3>>(), (true, true, true));
        assert_eq!(always::<StridedMapping<Dyn3>>(), (false, false, true));

        // Instance-level answers agree for the dense layouts, whatever
        // the extents.
        for extents in [[0, 3], [1, 1], [2, 3], [7, 5]] {
            let e = Dyn2::new(extents);
            let m = RowMajorMapping::new(e);
            assert!(m.is_unique() && m.is_contiguous() && m.is_strided());
            let m = ColumnMajorMapping::new(e);
            assert!(m.is_unique() && m.is_contiguous() && m.is_strided());
        }
    }

    #[test]
    fn test_strided_classification() {
        let e = Dyn2::new([2, 3]);

        let m = StridedMapping::new(e, [1, 2]);
        assert!(m.is_contiguous());
        assert!(m.is_unique());
        assert!(m.is_strided());
        assert_eq!(m.required_span_size(), 6);

        let m = StridedMapping::new(e, [1, 4]);
        assert!(!m.is_contiguous());
        assert!(m.is_unique());
        assert_eq!(m.required_span_size(), 10);

        let m = StridedMapping::new(e, [0, 1]);
        assert!(!m.is_unique());
        assert!(!m.is_contiguous());

        // Row-major strides, listed out of order.
        let m = StridedMapping::new(e, [3, 1]);
        assert!(m.is_contiguous());
        assert!(m.is_unique());
    }

    #[test]
    fn test_strided_ties_overlap() {
        // Equal strides on non-degenerate dimensions always overlap.
        let m = StridedMapping::new(Dyn3::new([2, 2, 2]), [1, 2, 2]);
        assert!(!m.is_unique());
        assert!(!m.is_contiguous());

        // Degenerate dimensions never move the offset.
        let m = StridedMapping::new(Dyn3::new([3, 1, 2]), [1, 1, 3]);
        assert!(m.is_unique());
        assert!(m.is_contiguous());
    }

    #[test]
    fn test_strided_empty() {
        let m = StridedMapping::new(Dyn2::new([0, 3]), [0, 0]);
        assert_eq!(m.required_span_size(), 0);
        assert!(m.is_unique());
        assert!(m.is_contiguous());
    }

    #[test]
    fn test_span_overflow_is_detected() {
        let huge = Dyn2::new([1 << 33, 1 << 33]);
        assert_eq!(RowMajorMapping::new(huge).checked_required_span_size(), None);
        assert_eq!(ColumnMajorMapping::new(huge).checked_required_span_size(), None);
        assert_eq!(RowMajorMapping::new(huge).required_span_size(), usize::MAX);

        let m = StridedMapping::new(Dyn1::new([3]), [1 << 63]);
        assert_eq!(m.checked_required_span_size(), None);
        assert_eq!(m.required_span_size(), usize::MAX);

        // Broadcasting keeps the span small whatever the extents.
        let m = StridedMapping::new(huge, [0, 0]);
        assert_eq!(m.checked_required_span_size(), Some(1));

        let m = StridedMapping::new(Dyn3::new([1 << 33, 1 << 33, 0]), [1, 1 << 33, 1]);
        assert_eq!(m.checked_required_span_size(), Some(0));
    }

    #[test]
    fn test_strided_from_mapping() {
        let e = Ext2::<3, DYN>::new([4]);
        let row = RowMajorMapping::new(e);
        let strided = StridedMapping::from_mapping(&row);
        assert_eq!(strided.strides(), &[4, 1]);
        assert!(strided.is_unique() && strided.is_contiguous());
        for index in IndexIter::new(e) {
            assert_eq!(strided.offset(index), row.offset(index));
        }

        let col = ColumnMajorMapping::new(e);
        let strided = StridedMapping::from_mapping(&col);
        assert_eq!(strided.strides(), &[1, 3]);
        for index in IndexIter::new(e) {
            assert_eq!(strided.offset(index), col.offset(index));
        }
    }

    #[test]
    fn test_remap_preserves_offsets() {
        let e = Ext2::<2, 3>::new([]);
        let strided = StridedMapping::new(e, [1, 4]);
        let remapped = Strided::remap(&strided, e.convert::<Dyn2>());
        assert_eq!(remapped.strides(), &[1, 4]);
        assert_eq!(remapped.is_contiguous(), strided.is_contiguous());
        for index in IndexIter::new(e) {
            assert_eq!(remapped.offset(index), strided.offset(index));
        }
    }

    #[test]
    fn test_strided_serde_reclassifies() {
        let m = StridedMapping::new(Dyn2::new([2, 3]), [1, 4]);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"extents":[2,3],"strides":[1,4]}"#);
        let back: StridedMapping<Dyn2> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);

        let json = r#"{"extents":[2,3],"strides":[0,1]}"#;
        let back: StridedMapping<Dyn2> = serde_json::from_str(json).unwrap();
        assert!(!back.is_unique());
    }
}
