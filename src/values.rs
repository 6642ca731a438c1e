//! Route value dictionaries.
//!
//! [`RouteValues`] is the string-keyed map that flows through the whole
//! engine: values extracted from an incoming path, defaults declared by a
//! template, required values of a route, and the supplied/ambient values used
//! for link generation.
//!
//! Keys compare **case-insensitively** (`"Id"` and `"id"` are the same key)
//! while the spelling of the first insertion is preserved. An empty string
//! value is treated as "no value" by link generation.
//!
//! # Example
//!
//! ```
//! use route_trie::RouteValues;
//!
//! let values = RouteValues::new()
//!     .with("controller", "Home")
//!     .with("id", "42");
//!
//! assert_eq!(values.get("Controller"), Some("Home"));
//! assert_eq!(values.get_as::<u32>("ID"), Some(42));
//! ```

use std::fmt;

/// Case-insensitive, insertion-ordered map of route values.
///
/// Route value sets are small (a handful of keys), so lookups scan a vector
/// instead of hashing.
#[derive(Clone, Default)]
pub struct RouteValues {
    entries: Vec<(String, String)>,
}

impl RouteValues {
    /// Create an empty value set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| values_equal(k, key))
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|i| self.entries[i].1.as_str())
    }

    /// Get a value and parse it as `T`.
    ///
    /// Returns `None` if the key is missing or the value does not parse.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get(key)?.parse().ok()
    }

    /// Get a value, treating an empty string as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Insert or overwrite a value, returning the previous one.
    ///
    /// Overwriting keeps the key spelling of the original insertion.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove a value, returning it.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    /// Return `true` if the key is present (even with an empty value).
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Iterate `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all entries, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Merge two value sets; entries of `overrides` win on collision.
    ///
    /// ```
    /// use route_trie::RouteValues;
    ///
    /// let defaults = RouteValues::new().with("action", "Index").with("id", "1");
    /// let supplied = RouteValues::new().with("ID", "7");
    ///
    /// let merged = RouteValues::merge(&defaults, &supplied);
    /// assert_eq!(merged.get("action"), Some("Index"));
    /// assert_eq!(merged.get("id"), Some("7"));
    /// ```
    pub fn merge(base: &RouteValues, overrides: &RouteValues) -> RouteValues {
        let mut merged = base.clone();
        for (key, value) in overrides.iter() {
            merged.insert(key, value);
        }
        merged
    }
}

/// Fold `text` into the form used as a case-insensitive lookup key.
#[inline]
pub(crate) fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Case-insensitive comparison; agrees with [`fold_case`].
#[inline]
pub(crate) fn values_equal(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

impl PartialEq for RouteValues {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl Eq for RouteValues {}

impl fmt::Debug for RouteValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> FromIterator<(K, V)> for RouteValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = RouteValues::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for RouteValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}
