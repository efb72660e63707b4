/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Non-owning multidimensional views over borrowed memory.
//!
//! Provides [`View`], a view of a buffer as a multidimensional array.
//! A view separates three concerns, each chosen by a type parameter:
//!
//! - the *shape*, an [`Extents`] type whose dimensions are fixed at
//!   compile time or supplied at construction;
//! - the *layout*, a [`Layout`] policy whose [`Mapping`] turns an index
//!   into a linear offset;
//! - the *accessor*, an [`Accessor`] policy turning a stored handle
//!   plus an offset into an element reference.
//!
//! ```
//! use mdspan::ColumnMajor;
//! use mdspan::DYN;
//! use mdspan::Ext2;
//! use mdspan::View;
//!
//! let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let m = View::<f64, Ext2<DYN, 3>, ColumnMajor>::new(&data, [2]).unwrap();
//! assert_eq!(m[[1, 0]], 2.0);
//! assert_eq!(m[[0, 2]], 5.0);
//! ```
//!
//! Every policy is resolved statically; there is no runtime dispatch
//! across layouts or accessors.

/// Accessor policies and handles.
pub mod accessor;

/// The extents model.
pub mod extents;

/// Iteration over multidimensional indices.
pub mod iter;

/// Layout policies and their index-to-offset mappings.
pub mod layout;

/// Slicing views into strided sub-views.
pub mod subspan;

/// The view type.
pub mod view;

/// Property-based generators for randomized test input.
#[cfg(test)]
pub mod strategy;

pub use accessor::Accessor;
pub use accessor::AccessorMut;
pub use accessor::Aligned;
pub use accessor::AlignedPtr;
pub use accessor::Basic;
pub use accessor::BasicMut;
pub use accessor::FromMutSlice;
pub use accessor::FromSlice;
pub use extents::DYN;
pub use extents::Dyn0;
pub use extents::Dyn1;
pub use extents::Dyn2;
pub use extents::Dyn3;
pub use extents::Dyn4;
pub use extents::Dyn5;
pub use extents::Dyn6;
pub use extents::Ext0;
pub use extents::Ext1;
pub use extents::Ext2;
pub use extents::Ext3;
pub use extents::Ext4;
pub use extents::Ext5;
pub use extents::Ext6;
pub use extents::Extents;
pub use extents::ExtentsError;
pub use iter::IndexIter;
pub use layout::ColumnMajor;
pub use layout::ColumnMajorMapping;
pub use layout::DenseLayout;
pub use layout::Layout;
pub use layout::Mapping;
pub use layout::RowMajor;
pub use layout::RowMajorMapping;
pub use layout::Strided;
pub use layout::StridedMapping;
pub use layout::Trivial;
pub use layout::TrivialMapping;
pub use subspan::SliceError;
pub use subspan::SliceSpec;
pub use view::Iter;
pub use view::View;
pub use view::ViewError;
pub use view::ViewMut;
