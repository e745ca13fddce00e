//! Key Deriver Module
//!
//! Maps a hierarchical path onto the external store's two-level addressing:
//! a root key plus a joined sub-key.

// == Storage Key ==
/// Two-part storage key derived from a path.
///
/// The external store addresses data as a root node with a chained path
/// below it; collapsing an arbitrary-depth path into (root, item) lets all
/// entries under one root replicate together while still supporting deep
/// logical paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    /// First path segment
    pub root: String,
    /// Remaining segments joined with `/` (empty for single-segment paths)
    pub item: String,
}

// == Derive Key ==
/// Derives the storage key for a path.
///
/// Pure and total for any path of length >= 1. Callers validate path
/// shape (non-empty, non-empty segments) before invoking; that check
/// lives in the domain handlers, not here.
pub fn derive_key(path: &[String]) -> StorageKey {
    debug_assert!(!path.is_empty(), "derive_key requires a non-empty path");
    StorageKey {
        root: path[0].clone(),
        item: path[1..].join("/"),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_segment_path() {
        let key = derive_key(&path(&["users"]));
        assert_eq!(key.root, "users");
        assert_eq!(key.item, "");
    }

    #[test]
    fn test_two_segment_path() {
        let key = derive_key(&path(&["users", "alice"]));
        assert_eq!(key.root, "users");
        assert_eq!(key.item, "alice");
    }

    #[test]
    fn test_deep_path_joins_remainder() {
        let key = derive_key(&path(&["events", "2024", "berlin", "talks"]));
        assert_eq!(key.root, "events");
        assert_eq!(key.item, "2024/berlin/talks");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let p = path(&["a", "b", "c"]);
        assert_eq!(derive_key(&p), derive_key(&p));
    }

    // == Strategies ==
    fn segment_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_.-]{1,24}".prop_map(|s| s)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        // For any non-empty path P, derive_key(P) = (P[0], join(P[1:], "/")).
        #[test]
        fn prop_derive_key_shape(segments in prop::collection::vec(segment_strategy(), 1..6)) {
            let key = derive_key(&segments);
            prop_assert_eq!(&key.root, &segments[0]);
            prop_assert_eq!(key.item, segments[1..].join("/"));
        }

        // Splitting the item key on "/" recovers the tail of the path.
        #[test]
        fn prop_item_key_roundtrip(segments in prop::collection::vec(segment_strategy(), 2..6)) {
            let key = derive_key(&segments);
            let tail: Vec<String> = key.item.split('/').map(str::to_string).collect();
            prop_assert_eq!(tail, segments[1..].to_vec());
        }
    }
}
