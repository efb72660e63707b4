/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::iter::FusedIterator;

use crate::extents::Extents;

/// Iterates over every valid index of an extents value.
///
/// Indices are yielded in row-major order (last dimension varies
/// fastest), independently of any layout. Rank-0 extents yield the
/// single empty index; extents with a zero dimension yield nothing.
///
/// ```
/// use mdspan::Dyn2;
/// use mdspan::IndexIter;
///
/// let all: Vec<_> = IndexIter::new(Dyn2::new([2, 3])).collect();
/// assert_eq!(all, vec![[0, 0], [0, 1], [0, 2], [1, 0], [1, 1], [1, 2]]);
/// ```
#[derive(Debug, Clone)]
pub struct IndexIter<E: Extents> {
    extents: E,
    next: usize,
    total: usize,
}

impl<E: Extents> IndexIter<E> {
    pub fn new(extents: E) -> Self {
        Self {
            total: extents.checked_size().unwrap_or(usize::MAX),
            extents,
            next: 0,
        }
    }
}

impl<E: Extents> Iterator for IndexIter<E> {
    type Item = E::Index;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }

        let mut index = E::Index::default();
        let mut rest = self.next;
        for (i, &extent) in index
            .as_mut()
            .iter_mut()
            .zip(self.extents.as_slice())
            .rev()
        {
            *i = rest % extent;
            rest /= extent;
        }
        self.next += 1;
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next;
        (remaining, Some(remaining))
    }
}

impl<E: Extents> ExactSizeIterator for IndexIter<E> {}

impl<E: Extents> FusedIterator for IndexIter<E> {}
