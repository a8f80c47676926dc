//! Collection aliases tuned for the mesh engine's access patterns.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// `HashMap` with a fast non-cryptographic hasher.
///
/// All keys here are internal (slotmap keys, cell indices), so DoS-resistant
/// hashing buys nothing.
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// `HashSet` with a fast non-cryptographic hasher.
pub type FastHashSet<T> = FxHashSet<T>;

/// Small-size-optimized vector; inline up to `N` elements, heap beyond.
///
/// Size guidelines used in this crate:
/// - `N=8`: per-vertex incident-edge lists (typical interior degree is 6)
/// - `N=4`: Lawson-repair seed sets, per-operation scratch
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Inline capacity for per-vertex incident-edge lists.
pub const VERTEX_DEGREE_INLINE: usize = 8;
