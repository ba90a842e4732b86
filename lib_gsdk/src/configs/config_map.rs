//! # Case-Insensitive Configuration Map
//!
//! The settings map handed to the hosting process. Keys compare without
//! regard to case (`LogFolder` and `logFolder` are the same entry) while
//! iteration reports the spelling that was inserted first.

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

/// String-to-string settings with case-insensitive keys.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConfigMap {
    /// Folded key -> (original key, value).
    entries: HashMap<String, (String, String)>,
}

fn fold(key: &str) -> String {
    key.to_ascii_lowercase()
}

impl ConfigMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a value, returning the previous one.
    ///
    /// Overwriting keeps the spelling of the key from the first insert.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.get_mut(&fold(&key)) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.insert(fold(&key), (key, value));
                None
            }
        }
    }

    /// Inserts `value` only when it is present and not empty.
    ///
    /// Returns `true` when the map was written.
    pub fn insert_if_not_empty(&mut self, key: &str, value: Option<&str>) -> bool {
        match value {
            Some(v) if !v.is_empty() => {
                self.insert(key, v);
                true
            }
            _ => false,
        }
    }

    /// Looks up a value by key, ignoring case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&fold(key)).map(|(_, v)| v.as_str())
    }

    /// Returns `true` if the key is present, ignoring case.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&fold(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copies the entries into a plain `HashMap` (case-sensitive by nature).
    pub fn to_hash_map(&self) -> HashMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl Index<&str> for ConfigMap {
    type Output = str;

    /// # Panics
    /// Panics if the key is absent, like `HashMap`'s `Index`.
    fn index(&self, key: &str) -> &str {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key `{}` not present in ConfigMap", key),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ConfigMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for ConfigMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl fmt::Debug for ConfigMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let mut map = ConfigMap::new();
        map.insert("LogFolder", "/var/log/game");

        assert_eq!(map.get("logfolder"), Some("/var/log/game"));
        assert_eq!(map.get("LOGFOLDER"), Some("/var/log/game"));
        assert!(map.contains_key("logFolder"));
        assert_eq!(&map["logFolder"], "/var/log/game");
    }

    #[test]
    fn test_overwrite_keeps_first_spelling() {
        let mut map = ConfigMap::new();
        assert_eq!(map.insert("sessionId", "one"), None);
        assert_eq!(map.insert("SESSIONID", "two"), Some("one".to_string()));

        assert_eq!(map.len(), 1);
        let (key, value) = map.iter().next().unwrap();
        assert_eq!(key, "sessionId");
        assert_eq!(value, "two");
    }

    #[test]
    fn test_insert_if_not_empty_skips_blank_values() {
        let mut map = ConfigMap::new();
        assert!(!map.insert_if_not_empty("sessionCookie", None));
        assert!(!map.insert_if_not_empty("sessionCookie", Some("")));
        assert!(map.is_empty());
        assert!(map.insert_if_not_empty("sessionCookie", Some("c")));
        assert_eq!(map.get("sessioncookie"), Some("c"));
    }

    #[test]
    #[should_panic(expected = "not present")]
    fn test_index_panics_on_missing_key() {
        let map = ConfigMap::new();
        let _ = &map["missing"];
    }
}
