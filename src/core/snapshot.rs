//! Configuration snapshots and the diffs between them.

use std::collections::HashMap;
use std::sync::Arc;

/// A single configuration entry.
///
/// The value is opaque: it is whatever the remote service stored for the key,
/// passed through without reinterpretation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyValue {
    /// The configuration key.
    pub key: String,
    /// The raw value.
    pub value: Vec<u8>,
}

impl KeyValue {
    /// Create a new entry.
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// All configuration visible at one instant.
///
/// Snapshots are immutable and cheap to clone. A remote client replaces its
/// snapshot wholesale on every update; readers never observe partial state.
///
/// # Examples
///
/// ```rust
/// use apollo_source::core::Snapshot;
///
/// let old: Snapshot = [("a", "1"), ("b", "2")].into_iter().collect();
/// let new: Snapshot = [("a", "1"), ("b", "3"), ("c", "4")].into_iter().collect();
///
/// let changes = old.diff(&new);
/// let keys: Vec<_> = changes.updated.iter().map(|kv| kv.key.as_str()).collect();
/// assert_eq!(keys, vec!["b", "c"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: Arc<HashMap<String, Vec<u8>>>,
}

impl Snapshot {
    /// Create a snapshot from a map of entries.
    pub fn new(entries: HashMap<String, Vec<u8>>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Wrap an already shared map without copying it.
    pub fn from_shared(entries: Arc<HashMap<String, Vec<u8>>>) -> Self {
        Self { entries }
    }

    /// Look up the value for a key.
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the snapshot has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the keys in map order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over `(key, value)` pairs in map order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Flatten into entries.
    ///
    /// Order follows the underlying map and is not stable across calls.
    pub fn to_key_values(&self) -> Vec<KeyValue> {
        self.iter().map(|(k, v)| KeyValue::new(k, v)).collect()
    }

    /// Copy the entries into a mutable map.
    pub fn to_map(&self) -> HashMap<String, Vec<u8>> {
        HashMap::clone(&self.entries)
    }

    /// Returns true if both snapshots share the same storage.
    pub fn ptr_eq(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    /// Compute what changed going from `self` to `newer`.
    ///
    /// Keys that are new or whose value differs end up in `updated`, keys that
    /// disappeared end up in `removed`. Both lists are sorted by key.
    pub fn diff(&self, newer: &Snapshot) -> ChangeSet {
        if self.ptr_eq(newer) {
            return ChangeSet::default();
        }

        let mut updated: Vec<KeyValue> = newer
            .entries
            .iter()
            .filter(|(key, value)| self.entries.get(*key) != Some(*value))
            .map(|(key, value)| KeyValue::new(key.clone(), value.clone()))
            .collect();
        updated.sort_by(|a, b| a.key.cmp(&b.key));

        let mut removed: Vec<String> = self
            .entries
            .keys()
            .filter(|key| !newer.entries.contains_key(*key))
            .cloned()
            .collect();
        removed.sort();

        ChangeSet { updated, removed }
    }
}

impl<K, V> FromIterator<(K, V)> for Snapshot
where
    K: Into<String>,
    V: Into<Vec<u8>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<HashMap<String, Vec<u8>>> for Snapshot {
    fn from(entries: HashMap<String, Vec<u8>>) -> Self {
        Self::new(entries)
    }
}

/// The difference between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Entries that are new or carry a new value.
    pub updated: Vec<KeyValue>,
    /// Keys that no longer exist.
    pub removed: Vec<String>,
}

impl ChangeSet {
    /// Returns true if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.removed.is_empty()
    }

    /// Total number of changed keys.
    pub fn len(&self) -> usize {
        self.updated.len() + self.removed.len()
    }

    /// Apply this change set on top of a map of entries.
    pub fn apply(&self, target: &mut HashMap<String, Vec<u8>>) {
        for kv in &self.updated {
            target.insert(kv.key.clone(), kv.value.clone());
        }
        for key in &self.removed {
            target.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn snapshot(pairs: &[(&str, &str)]) -> Snapshot {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_diff_excludes_unchanged_keys() {
        let old = snapshot(&[("a", "1"), ("b", "2")]);
        let new = snapshot(&[("a", "1"), ("b", "3"), ("c", "4")]);

        let changes = old.diff(&new);
        assert_eq!(
            changes.updated,
            vec![KeyValue::new("b", "3"), KeyValue::new("c", "4")]
        );
        assert!(changes.removed.is_empty());
    }

    #[test]
    fn test_diff_reports_removed_keys() {
        let old = snapshot(&[("a", "1"), ("b", "2")]);
        let new = snapshot(&[("b", "2")]);

        let changes = old.diff(&new);
        assert!(changes.updated.is_empty());
        assert_eq!(changes.removed, vec!["a".to_string()]);
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn test_diff_same_storage_is_empty() {
        let snap = snapshot(&[("a", "1")]);
        let clone = snap.clone();
        assert!(snap.ptr_eq(&clone));
        assert!(snap.diff(&clone).is_empty());
    }

    #[test]
    fn test_diff_equal_content_is_empty() {
        let a = snapshot(&[("a", "1"), ("b", "2")]);
        let b = snapshot(&[("b", "2"), ("a", "1")]);
        assert!(!a.ptr_eq(&b));
        assert!(a.diff(&b).is_empty());
    }

    #[test]
    fn test_accessors() {
        let snap = snapshot(&[("timeout", "30")]);
        assert_eq!(snap.get("timeout"), Some(b"30".as_slice()));
        assert_eq!(snap.get("missing"), None);
        assert_eq!(snap.len(), 1);
        assert!(!snap.is_empty());
        assert!(Snapshot::default().is_empty());
        assert_eq!(snap.to_key_values(), vec![KeyValue::new("timeout", "30")]);
    }

    fn arb_snapshot() -> impl Strategy<Value = HashMap<String, Vec<u8>>> {
        prop::collection::hash_map("[a-e]", prop::collection::vec(0u8..4, 0..3), 0..5)
    }

    proptest! {
        #[test]
        fn prop_folded_diffs_reach_final_snapshot(
            initial in arb_snapshot(),
            pushes in prop::collection::vec(arb_snapshot(), 1..8),
        ) {
            let mut folded = initial.clone();
            let mut previous = Snapshot::new(initial);

            for push in pushes {
                let next = Snapshot::new(push);
                previous.diff(&next).apply(&mut folded);
                prop_assert_eq!(&folded, &next.to_map());
                previous = next;
            }
        }
    }
}
