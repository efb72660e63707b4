/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Slicing a view into a view of a sub-region.
//!
//! [`View::subspan`] takes one [`SliceSpec`] per dimension. Dimensions
//! selected with an index are dropped; the others keep their stride
//! and shrink to the selected range. Arbitrary slicing breaks the
//! regularity of the dense layouts, so the result always uses the
//! [`Strided`] layout:
//!
//! ```
//! use mdspan::Dyn1;
//! use mdspan::Dyn2;
//! use mdspan::SliceSpec;
//! use mdspan::View;
//!
//! let data: Vec<usize> = (0..12).collect();
//! let v = View::<usize, Dyn2>::new(&data, [3, 4]).unwrap();
//!
//! // Column 2.
//! let col = v.subspan::<Dyn1, 2>([SliceSpec::All, 2.into()]).unwrap();
//! assert_eq!(col.iter().copied().collect::<Vec<_>>(), vec![2, 6, 10]);
//! assert_eq!(col.stride(0), 4);
//! ```

use std::ops::Range;
use std::ops::RangeFull;

use crate::accessor::Accessor;
use crate::extents::Extents;
use crate::extents::ExtentsError;
use crate::layout::Layout;
use crate::layout::Mapping;
use crate::layout::Strided;
use crate::layout::StridedMapping;
use crate::view::View;

/// The type of error for slicing operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SliceError {
    #[error("index {index} out of range for dimension {dim} of extent {extent}")]
    IndexOutOfRange {
        dim: usize,
        index: usize,
        extent: usize,
    },

    #[error("range {start}..{end} out of range for dimension {dim} of extent {extent}")]
    RangeOutOfRange {
        dim: usize,
        start: usize,
        end: usize,
        extent: usize,
    },

    #[error("inverted range {start}..{end} for dimension {dim}")]
    InvertedRange { dim: usize, start: usize, end: usize },

    #[error("slice keeps {got} dimensions but the result has rank {expected}")]
    RankMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Extents(#[from] ExtentsError),
}

/// How to slice one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SliceSpec {
    /// Keep the whole dimension.
    All,
    /// Fix the dimension at one index, dropping it from the result.
    Index(usize),
    /// Keep the half-open range; `start == end` keeps nothing.
    Range(Range<usize>),
}

impl From<usize> for SliceSpec {
    fn from(index: usize) -> Self {
        SliceSpec::Index(index)
    }
}

impl From<Range<usize>> for SliceSpec {
    fn from(range: Range<usize>) -> Self {
        SliceSpec::Range(range)
    }
}

impl From<RangeFull> for SliceSpec {
    fn from(_: RangeFull) -> Self {
        SliceSpec::All
    }
}

// The sub-region selected by a set of specifiers: where it starts, and
// the extents and strides of the dimensions it keeps.
struct Selection<I> {
    starts: I,
    extents: I,
    strides: I,
    kept: usize,
}

fn select<M: Mapping>(
    mapping: &M,
    specs: impl IntoIterator<Item = SliceSpec>,
) -> Result<Selection<<M::Extents as Extents>::Index>, SliceError> {
    let mut selection = Selection {
        starts: <M::Extents as Extents>::Index::default(),
        extents: <M::Extents as Extents>::Index::default(),
        strides: <M::Extents as Extents>::Index::default(),
        kept: 0,
    };
    for (dim, spec) in specs.into_iter().enumerate() {
        let extent = mapping.extents().extent(dim);
        let (start, len) = match spec {
            SliceSpec::All => (0, Some(extent)),
            SliceSpec::Index(index) => {
                if index >= extent {
                    return Err(SliceError::IndexOutOfRange { dim, index, extent });
                }
                (index, None)
            }
            SliceSpec::Range(Range { start, end }) => {
                if start > end {
                    return Err(SliceError::InvertedRange { dim, start, end });
                }
                if end > extent {
                    return Err(SliceError::RangeOutOfRange {
                        dim,
                        start,
                        end,
                        extent,
                    });
                }
                (start, Some(end - start))
            }
        };
        selection.starts.as_mut()[dim] = start;
        if let Some(len) = len {
            selection.extents.as_mut()[selection.kept] = len;
            selection.strides.as_mut()[selection.kept] = mapping.stride(dim);
            selection.kept += 1;
        }
    }
    Ok(selection)
}

impl<'a, T, E, L, A> View<'a, T, E, L, A>
where
    E: Extents,
    L: Layout,
    A: Accessor<Element = T>,
{
    /// The view of the sub-region selected by `specs`, one per
    /// dimension, with extents typed `F`.
    ///
    /// `F` must have one dimension per non-[`SliceSpec::Index`]
    /// specifier, and its static extents must match the selected
    /// lengths. The handle of the result is offset to the first
    /// selected element through the accessor's offset policy.
    ///
    /// Only views with an always-strided layout can be sliced; anything
    /// else does not compile.
    pub fn subspan<F: Extents, const N: usize>(
        self,
        specs: [SliceSpec; N],
    ) -> Result<View<'a, T, F, Strided, A::OffsetPolicy>, SliceError> {
        const {
            assert!(N == E::RANK, "subspan takes one slice specifier per dimension");
            assert!(
                <L::Mapping<E> as Mapping>::IS_ALWAYS_STRIDED,
                "subspan requires an always-strided layout"
            );
        };
        let (handle, mapping, accessor) = self.into_parts();
        let selection = select(&mapping, specs)
            .and_then(|selection| {
                if selection.kept != F::RANK {
                    return Err(SliceError::RankMismatch {
                        expected: F::RANK,
                        got: selection.kept,
                    });
                }
                Ok(selection)
            })
            .inspect_err(|err| tracing::debug!(extents = %mapping.extents(), %err, "rejecting subspan"))?;

        let kept = selection.kept;
        let extents = F::try_from_slice(&selection.extents.as_ref()[..kept])
            .inspect_err(|err| tracing::debug!(%err, "rejecting subspan"))?;
        let mut strides = F::Index::default();
        strides
            .as_mut()
            .copy_from_slice(&selection.strides.as_ref()[..kept]);

        let base = mapping.offset(selection.starts);
        let handle = accessor.offset(handle, base);
        // SAFETY: every index of the result maps to `base` plus the
        // offset of an index of the original view, which that view
        // covers; `self` was consumed, so no other view aliases a
        // mutable result.
        Ok(unsafe {
            View::from_raw_parts(
                handle,
                StridedMapping::new(extents, strides),
                accessor.offset_policy(),
            )
        })
    }
}
