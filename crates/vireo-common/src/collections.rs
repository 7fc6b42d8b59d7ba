//! Standard collection type aliases for vireo.
//!
//! Use these instead of `std::collections::HashMap` so hashing stays
//! consistent (and fast) across the codebase.
//!
//! # Example
//!
//! ```rust
//! use vireo_common::collections::{VireoMap, vireo_map};
//!
//! let mut map: VireoMap<&str, i32> = vireo_map();
//! map.insert("key", 42);
//! assert_eq!(map.get("key"), Some(&42));
//! ```

use rustc_hash::FxBuildHasher;

/// Single-threaded hash map with FxHash (fast, non-cryptographic).
pub type VireoMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// Create a new empty [`VireoMap`].
#[inline]
#[must_use]
pub fn vireo_map<K, V>() -> VireoMap<K, V> {
    VireoMap::with_hasher(FxBuildHasher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vireo_map() {
        let mut map = vireo_map::<String, i32>();
        map.insert("key".to_string(), 42);
        assert_eq!(map.get("key"), Some(&42));
    }
}
