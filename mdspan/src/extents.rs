/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The extents model: rank-many dimension sizes, each either fixed by
//! the type or supplied at construction.
//!
//! Concrete extents types are [`Ext0`] through [`Ext6`], one per rank.
//! Each const parameter is either a static extent or [`DYN`]:
//!
//! ```
//! use mdspan::DYN;
//! use mdspan::Ext3;
//! use mdspan::Extents;
//!
//! // 4 x ? x 2, with the middle dimension supplied at run time.
//! let e = Ext3::<4, DYN, 2>::new([3]);
//! assert_eq!(e.as_slice(), &[4, 3, 2]);
//! assert_eq!(e.static_extent(1), DYN);
//! assert_eq!(e.product(0, 3), 24);
//! ```
//!
//! Internally an extents value is a plain `[usize; RANK]` holding every
//! extent (static ones included), paired with the compile-time table
//! [`Extents::STATIC_EXTENTS`]. Supplying the wrong number of dynamic
//! extents does not compile.

use std::fmt;
use std::hash::Hash;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Marks a dimension whose extent is only known at run time.
pub const DYN: usize = usize::MAX;

/// The type of error for extents conversions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ExtentsError {
    #[error("rank mismatch: expected {expected}, got {got}")]
    RankMismatch { expected: usize, got: usize },

    #[error("extent {got} of dimension {dim} does not match static extent {expected}")]
    StaticMismatch {
        dim: usize,
        expected: usize,
        got: usize,
    },
}

/// Number of [`DYN`] entries in a static extents table.
pub const fn count_dynamic(table: &[usize]) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i < table.len() {
        if table[i] == DYN {
            count += 1;
        }
        i += 1;
    }
    count
}

/// Whether every value of extents typed `from` is also a value of
/// extents typed `to`: same rank, and each dimension of `to` is either
/// dynamic or fixed to the same static value as in `from`.
pub const fn statically_convertible(from: &[usize], to: &[usize]) -> bool {
    if from.len() != to.len() {
        return false;
    }
    let mut i = 0;
    while i < from.len() {
        if to[i] != DYN && from[i] != to[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// The shape of a view: `RANK` dimension sizes, `RANK_DYNAMIC` of
/// which are supplied at construction.
pub trait Extents:
    Copy + fmt::Debug + fmt::Display + Eq + Hash + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Number of dimensions.
    const RANK: usize;

    /// Number of dimensions whose extent is supplied at construction.
    const RANK_DYNAMIC: usize;

    /// Static extent of every dimension, [`DYN`] where unknown.
    const STATIC_EXTENTS: &'static [usize];

    /// A multidimensional index into extents of this type, always
    /// `[usize; RANK]`.
    type Index: Copy
        + Default
        + fmt::Debug
        + Eq
        + Hash
        + Send
        + Sync
        + AsRef<[usize]>
        + AsMut<[usize]>
        + Serialize
        + DeserializeOwned
        + 'static;

    /// Wraps a full set of extents. Callers must have checked the
    /// static dimensions.
    #[doc(hidden)]
    fn from_index_unchecked(extents: Self::Index) -> Self;

    /// Every extent, static ones included.
    fn as_index(&self) -> &Self::Index;

    /// Build extents from the values of the dynamic dimensions, in
    /// order. Passing a number of values other than `RANK_DYNAMIC` is
    /// rejected at compile time:
    ///
    /// ```compile_fail
    /// use mdspan::DYN;
    /// use mdspan::Ext2;
    /// use mdspan::Extents;
    ///
    /// // One dynamic dimension, two values.
    /// let e = Ext2::<2, DYN>::from_dynamic([3, 4]);
    /// ```
    fn from_dynamic<const N: usize>(dynamic: [usize; N]) -> Self {
        const {
            assert!(
                N == Self::RANK_DYNAMIC,
                "number of dynamic extents must equal rank_dynamic()"
            )
        };
        let mut extents = Self::Index::default();
        let mut dynamic = dynamic.into_iter();
        for (slot, &fixed) in extents.as_mut().iter_mut().zip(Self::STATIC_EXTENTS) {
            *slot = if fixed == DYN {
                dynamic.next().unwrap_or_default()
            } else {
                fixed
            };
        }
        Self::from_index_unchecked(extents)
    }

    /// Build extents from all `RANK` values, checking the static
    /// dimensions.
    fn try_from_slice(extents: &[usize]) -> Result<Self, ExtentsError> {
        if extents.len() != Self::RANK {
            return Err(ExtentsError::RankMismatch {
                expected: Self::RANK,
                got: extents.len(),
            });
        }
        for (dim, (&got, &expected)) in extents.iter().zip(Self::STATIC_EXTENTS).enumerate() {
            if expected != DYN && expected != got {
                return Err(ExtentsError::StaticMismatch { dim, expected, got });
            }
        }
        let mut index = Self::Index::default();
        index.as_mut().copy_from_slice(extents);
        Ok(Self::from_index_unchecked(index))
    }

    fn rank(&self) -> usize {
        Self::RANK
    }

    fn rank_dynamic(&self) -> usize {
        Self::RANK_DYNAMIC
    }

    /// The static extent of dimension `k`, or [`DYN`].
    fn static_extent(&self, k: usize) -> usize {
        Self::STATIC_EXTENTS[k]
    }

    /// The extent of dimension `k`.
    fn extent(&self, k: usize) -> usize {
        self.as_slice()[k]
    }

    fn as_slice(&self) -> &[usize] {
        self.as_index().as_ref()
    }

    /// The extents of the dynamic dimensions, in order.
    fn dynamic_extents(&self) -> impl Iterator<Item = usize> + '_ {
        self.as_slice()
            .iter()
            .zip(Self::STATIC_EXTENTS)
            .filter(|(_, fixed)| **fixed == DYN)
            .map(|(extent, _)| *extent)
    }

    /// Product of the extents of dimensions `[i, j)`; 1 when the range
    /// is empty.
    fn product(&self, i: usize, j: usize) -> usize {
        self.as_slice()[i..j].iter().product()
    }

    /// Total number of elements, `product(0, RANK)`.
    fn size(&self) -> usize {
        self.product(0, Self::RANK)
    }

    /// [`Extents::product`], or `None` if it does not fit in a `usize`.
    /// A zero extent in the range makes the product zero, however large
    /// the other extents are.
    fn checked_product(&self, i: usize, j: usize) -> Option<usize> {
        let extents = &self.as_slice()[i..j];
        if extents.contains(&0) {
            return Some(0);
        }
        extents.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n))
    }

    /// [`Extents::size`], or `None` if it does not fit in a `usize`.
    fn checked_size(&self) -> Option<usize> {
        self.checked_product(0, Self::RANK)
    }

    /// Whether `index` addresses an element inside these extents.
    fn contains(&self, index: &Self::Index) -> bool {
        index
            .as_ref()
            .iter()
            .zip(self.as_slice())
            .all(|(i, n)| i < n)
    }

    /// Value equality with extents of any static/dynamic split.
    fn eq_extents<F: Extents>(&self, other: &F) -> bool {
        self.as_slice() == other.as_slice()
    }

    /// Reinterpret as extents typed `F`. Compiles only when the
    /// conversion can never fail: `F` has the same rank and each of
    /// its static dimensions is equally static here.
    fn convert<F: Extents>(&self) -> F {
        const {
            assert!(F::RANK == Self::RANK, "extents conversion must preserve rank");
            assert!(
                statically_convertible(Self::STATIC_EXTENTS, F::STATIC_EXTENTS),
                "static extents of the target must be static and equal in the source; use try_convert"
            );
        };
        let mut index = F::Index::default();
        index.as_mut().copy_from_slice(self.as_slice());
        F::from_index_unchecked(index)
    }

    /// Reinterpret as extents typed `F`, checking at run time that
    /// dynamic extents match the static extents of `F`.
    fn try_convert<F: Extents>(&self) -> Result<F, ExtentsError> {
        const { assert!(F::RANK == Self::RANK, "extents conversion must preserve rank") };
        F::try_from_slice(self.as_slice())
    }
}

// Renders a static table with `dyn` in place of the sentinel.
struct StaticTable(&'static [usize]);

impl fmt::Debug for StaticTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for &extent in self.0 {
            if extent == DYN {
                list.entry(&format_args!("dyn"));
            } else {
                list.entry(&extent);
            }
        }
        list.finish()
    }
}

macro_rules! extents {
    ($(
        $(#[$meta:meta])*
        $name:ident, $alias:ident, $rank:literal; [$($param:ident),*]; [$($other:ident),*];
    )*) => {$(
        $(#[$meta])*
        #[derive(Clone, Copy, Hash, Serialize, serde::Deserialize)]
        #[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
        pub struct $name<$(const $param: usize = DYN),*> {
            extents: [usize; $rank],
        }

        #[doc = concat!("Fully dynamic [`", stringify!($name), "`].")]
        pub type $alias = $name;

        impl<$(const $param: usize),*> $name<$($param),*> {
            /// Build extents from the values of the dynamic dimensions.
            /// See [`Extents::from_dynamic`].
            pub fn new<const N: usize>(dynamic: [usize; N]) -> Self {
                <Self as Extents>::from_dynamic(dynamic)
            }
        }

        impl<$(const $param: usize),*> Extents for $name<$($param),*> {
            const RANK: usize = $rank;
            const RANK_DYNAMIC: usize = count_dynamic(Self::STATIC_EXTENTS);
            const STATIC_EXTENTS: &'static [usize] = &[$($param),*];

            type Index = [usize; $rank];

            fn from_index_unchecked(extents: [usize; $rank]) -> Self {
                Self { extents }
            }

            fn as_index(&self) -> &[usize; $rank] {
                &self.extents
            }
        }

        impl<$(const $param: usize,)* $(const $other: usize),*> PartialEq<$name<$($other),*>>
            for $name<$($param),*>
        {
            fn eq(&self, other: &$name<$($other),*>) -> bool {
                self.extents == other.extents
            }
        }

        impl<$(const $param: usize),*> Eq for $name<$($param),*> {}

        impl<$(const $param: usize),*> fmt::Debug for $name<$($param),*> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("static", &StaticTable(Self::STATIC_EXTENTS))
                    .field("extents", &self.extents)
                    .finish()
            }
        }

        impl<$(const $param: usize),*> fmt::Display for $name<$($param),*> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:?}", self.extents)
            }
        }

        impl<$(const $param: usize),*> TryFrom<&[usize]> for $name<$($param),*> {
            type Error = ExtentsError;

            fn try_from(extents: &[usize]) -> Result<Self, ExtentsError> {
                Self::try_from_slice(extents)
            }
        }

        impl<$(const $param: usize),*> TryFrom<Vec<usize>> for $name<$($param),*> {
            type Error = ExtentsError;

            fn try_from(extents: Vec<usize>) -> Result<Self, ExtentsError> {
                Self::try_from_slice(&extents)
            }
        }

        impl<$(const $param: usize),*> From<$name<$($param),*>> for Vec<usize> {
            fn from(extents: $name<$($param),*>) -> Self {
                extents.extents.to_vec()
            }
        }
    )*};
}

extents! {
    /// Rank-0 (scalar) extents.
    Ext0, Dyn0, 0; []; [];
    /// Rank-1 extents.
    Ext1, Dyn1, 1; [E0]; [F0];
    /// Rank-2 extents.
    Ext2, Dyn2, 2; [E0, E1]; [F0, F1];
    /// Rank-3 extents.
    Ext3, Dyn3, 3; [E0, E1, E2]; [F0, F1, F2];
    /// Rank-4 extents.
    Ext4, Dyn4, 4; [E0, E1, E2, E3]; [F0, F1, F2, F3];
    /// Rank-5 extents.
    Ext5, Dyn5, 5; [E0, E1, E2, E3, E4]; [F0, F1, F2, F3, F4];
    /// Rank-6 extents.
    Ext6, Dyn6, 6; [E0, E1, E2, E3, E4, E5]; [F0, F1, F2, F3, F4, F5];
}
