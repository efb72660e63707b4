/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Property-based generators for extents, strides and slices.
//!
//! These strategies are used in `proptest`-based tests to check the
//! layout mappings against brute-force enumeration of their offsets.
//!
//! Example usage:
//!
//! ```
//! use proptest::prelude::*;
//!
//! use crate::extents::Dyn3;
//! use crate::strategy::gen_strided;
//!
//! proptest! {
//!     #[test]
//!     fn test_mapping(m in gen_strided::<Dyn3>(3, 6)) {
//!         // Use `m` as input to offset or classification tests
//!     }
//! }
//! ```
//!
//! This module is only included in test builds (`#[cfg(test)]`).

use std::ops::Range;

use proptest::prelude::*;

use crate::extents::DYN;
use crate::extents::Extents;
use crate::layout::StridedMapping;

/// Generates extents of type `E`: static dimensions take their fixed
/// value, dynamic ones range over `0..=max_extent`.
pub fn gen_extents<E: Extents>(max_extent: usize) -> impl Strategy<Value = E> {
    prop::collection::vec(0..=max_extent, E::RANK).prop_map(|mut extents| {
        for (slot, &fixed) in extents.iter_mut().zip(E::STATIC_EXTENTS) {
            if fixed != DYN {
                *slot = fixed;
            }
        }
        E::try_from_slice(&extents).unwrap()
    })
}

/// Generates arbitrary strides for extents of type `E`, each in
/// `0..=max_stride`. Zero and repeated strides are included on
/// purpose: they produce non-unique mappings.
pub fn gen_strides<E: Extents>(max_stride: usize) -> impl Strategy<Value = E::Index> {
    prop::collection::vec(0..=max_stride, E::RANK).prop_map(|strides| {
        let mut index = E::Index::default();
        index.as_mut().copy_from_slice(&strides);
        index
    })
}

/// Generates a strided mapping over extents of type `E`.
pub fn gen_strided<E: Extents>(
    max_extent: usize,
    max_stride: usize,
) -> impl Strategy<Value = StridedMapping<E>> {
    (gen_extents::<E>(max_extent), gen_strides::<E>(max_stride))
        .prop_map(|(extents, strides)| StridedMapping::new(extents, strides))
}

/// Generates non-empty extents of type `E` together with one
/// in-bounds, possibly empty, range per dimension.
pub fn gen_ranges<E: Extents>(max_extent: usize) -> impl Strategy<Value = (E, Vec<Range<usize>>)> {
    prop::collection::vec(1..=max_extent.max(1), E::RANK)
        .prop_map(|extents| E::try_from_slice(&extents).unwrap())
        .prop_flat_map(|extents| {
            let ranges: Vec<_> = extents
                .as_slice()
                .iter()
                .map(|&n| (0..=n).prop_flat_map(move |start| (start..=n).prop_map(move |end| start..end)))
                .collect();
            (Just(extents), ranges)
        })
}

mod tests {
    use std::collections::HashSet;

    use proptest::strategy::ValueTree;
    use proptest::test_runner::Config;
    use proptest::test_runner::TestRunner;

    use super::*;
    use crate::extents::Dyn2;
    use crate::extents::Dyn3;
    use crate::extents::Dyn4;
    use crate::extents::Ext2;
    use crate::extents::Ext3;
    use crate::iter::IndexIter;
    use crate::layout::ColumnMajorMapping;
    use crate::layout::Layout;
    use crate::layout::Mapping;
    use crate::layout::RowMajorMapping;
    use crate::layout::Strided;
    use crate::subspan::SliceSpec;
    use crate::view::View;

    fn offsets<M: Mapping>(mapping: &M) -> Vec<usize> {
        IndexIter::new(*mapping.extents())
            .map(|index| mapping.offset(index))
            .collect()
    }

    #[test]
    fn sample_many() {
        let mut runner = TestRunner::new(Config::default());

        for _ in 0..64 {
            let strat = gen_strided::<Dyn3>(3, 6);
            let value = strat.new_tree(&mut runner).unwrap().current();
            println!("{:?}", value);
        }
    }

    proptest! {
        #[test]
        fn extents_round_trip(e in gen_extents::<Ext3<2, DYN, DYN>>(4)) {
            prop_assert_eq!(Ext3::<2, DYN, DYN>::try_from_slice(e.as_slice()).unwrap(), e);
            let d: Dyn3 = e.convert();
            prop_assert_eq!(d.try_convert::<Ext3<2, DYN, DYN>>().unwrap(), e);
            let json = serde_json::to_string(&e).unwrap();
            let back: Ext3<2, DYN, DYN> = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, e);
        }

        #[test]
        fn row_major_enumerates_in_order(e in gen_extents::<Dyn4>(3)) {
            let m = RowMajorMapping::new(e);
            prop_assert_eq!(offsets(&m), (0..e.size()).collect::<Vec<_>>());
            prop_assert_eq!(m.required_span_size(), e.size());
        }

        #[test]
        fn column_major_is_a_permutation(e in gen_extents::<Dyn3>(4)) {
            let m = ColumnMajorMapping::new(e);
            let mut all = offsets(&m);
            all.sort_unstable();
            prop_assert_eq!(all, (0..e.size()).collect::<Vec<_>>());
            prop_assert_eq!(m.required_span_size(), e.size());
        }

        #[test]
        fn dense_mappings_agree_with_strided(e in gen_extents::<Dyn3>(4)) {
            let row = RowMajorMapping::new(e);
            let strided = StridedMapping::from_mapping(&row);
            prop_assert_eq!(strided.strides(), &row.strides());
            prop_assert_eq!(offsets(&strided), offsets(&row));
            prop_assert_eq!(strided.required_span_size(), row.required_span_size());
            prop_assert!(strided.is_unique() && strided.is_contiguous());

            let col = ColumnMajorMapping::new(e);
            let strided = StridedMapping::from_mapping(&col);
            prop_assert_eq!(strided.strides(), &col.strides());
            prop_assert_eq!(offsets(&strided), offsets(&col));
            prop_assert!(strided.is_unique() && strided.is_contiguous());
        }

        // Contiguity is exact: the offsets fill `[0, span)` with no
        // repeats. Uniqueness is conservative: a mapping classified
        // unique never repeats an offset.
        #[test]
        fn classification_agrees_with_enumeration(m in gen_strided::<Dyn3>(3, 6)) {
            let all = offsets(&m);
            let span = m.required_span_size();
            prop_assert!(all.iter().all(|&offset| offset < span));

            let distinct: HashSet<_> = all.iter().copied().collect();
            let repeats = distinct.len() != all.len();
            let mut sorted = all.clone();
            sorted.sort_unstable();
            let fills = sorted == (0..span).collect::<Vec<_>>();

            prop_assert_eq!(m.is_contiguous(), fills, "{:?}", m);
            if m.is_unique() {
                prop_assert!(!repeats, "{:?} classified unique but repeats", m);
            }
            if m.is_contiguous() {
                prop_assert!(m.is_unique());
            }
        }

        #[test]
        fn convert_preserves_offsets(
            e in gen_extents::<Ext2<3, DYN>>(4),
            strides in gen_strides::<Dyn2>(5),
        ) {
            let data: Vec<usize> = (0..64).collect();
            let v = View::<usize, Ext2<3, DYN>>::new(&data, [e.extent(1)]).unwrap();
            let d: View<'_, usize, Dyn2> = v.convert();
            prop_assert_eq!(offsets(v.mapping()), offsets(d.mapping()));

            let m = StridedMapping::new(e, strides);
            let remapped = Strided::remap(&m, e.convert::<Dyn2>());
            prop_assert_eq!(offsets(&m), offsets(&remapped));
            prop_assert_eq!(m.is_unique(), remapped.is_unique());
        }

        #[test]
        fn subspan_selects_shifted_elements((e, ranges) in gen_ranges::<Dyn2>(5)) {
            let data: Vec<usize> = (0..e.size()).collect();
            let v = View::<usize, Dyn2>::new(&data, *e.as_index()).unwrap();
            let specs = [
                SliceSpec::Range(ranges[0].clone()),
                SliceSpec::Range(ranges[1].clone()),
            ];
            let sub = v.subspan::<Dyn2, 2>(specs).unwrap();
            prop_assert_eq!(sub.extent(0), ranges[0].len());
            prop_assert_eq!(sub.extent(1), ranges[1].len());
            for [i, j] in sub.indices() {
                prop_assert_eq!(sub[[i, j]], v[[ranges[0].start + i, ranges[1].start + j]]);
            }
        }
    }
}
