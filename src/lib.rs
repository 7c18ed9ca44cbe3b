//! An ordered set implemented with an AVL tree.
//!
//! [`AvlSet`] keeps unique values in ascending order with logarithmic
//! insertion, removal and lookup. Every node links back to its parent, so a
//! [`Cursor`] can step to either neighbour without keeping a path, and a
//! detached [`Position`] stays usable while other elements come and go.
//!
//! ```
//! use avlset::AvlSet;
//!
//! let mut set: AvlSet<i32> = [5, 3, 8, 1, 4, 7, 9].into_iter().collect();
//! set.remove(&5);
//! assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 3, 4, 7, 8, 9]);
//! assert!(set.find(&6).is_end());
//! assert_eq!(set.lower_bound(&6).get(), Some(&7));
//! ```
//!
//! # Features
//!
//! - `consistency_check`: exposes `AvlSet::validate` and
//!   `AvlSet::check_consistency`.
//! - `serde`: serializes a set as a sequence in ascending order.

mod error;
pub mod set;
#[cfg(feature = "serde")]
mod serde;
mod tree;

pub use error::ConsistencyError;
pub use set::{AvlSet, Cursor, Position};
