//! Deduplicated name pool.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Names referenced by index from nodes, objects, detail levels and
/// sequences. Lookup ignores case; storage keeps the first spelling.
#[derive(Clone, Debug, Default)]
pub struct NamePool {
    names: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl NamePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool from names as stored in a file.
    ///
    /// Indices are kept as given; for names that collide case-insensitively
    /// lookup resolves to the first one.
    pub fn from_names(names: Vec<String>) -> Self {
        let mut lookup = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            match lookup.entry(name.to_lowercase()) {
                Entry::Occupied(_) => tracing::warn!(name = %name, index = i, "duplicate name in pool"),
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
            }
        }
        Self { names, lookup }
    }

    /// Index of `name`, adding it if no case-insensitive match exists.
    pub fn intern(&mut self, name: &str) -> i32 {
        let key = name.to_lowercase();
        if let Some(&i) = self.lookup.get(&key) {
            return i as i32;
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.lookup.insert(key, i);
        i as i32
    }

    /// Like [`intern`](Self::intern), also returning the stored spelling.
    pub fn resolve(&mut self, name: &str) -> (i32, &str) {
        let i = self.intern(name);
        (i, &self.names[i as usize])
    }

    /// Index of `name` without adding it.
    pub fn find(&self, name: &str) -> Option<i32> {
        self.lookup.get(&name.to_lowercase()).map(|&i| i as i32)
    }

    /// Name at `index`, if in range.
    pub fn get(&self, index: i32) -> Option<&str> {
        usize::try_from(index).ok().and_then(|i| self.names.get(i)).map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// True if no two names collide case-insensitively.
    pub fn is_unique(&self) -> bool {
        self.lookup.len() == self.names.len()
    }
}

impl PartialEq for NamePool {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_case_insensitive() {
        let mut pool = NamePool::new();
        assert_eq!(pool.intern("Bip01"), 0);
        assert_eq!(pool.intern("detail2"), 1);
        assert_eq!(pool.intern("BIP01"), 0);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(0), Some("Bip01"));
        assert_eq!(pool.resolve("bip01"), (0, "Bip01"));
    }

    #[test]
    fn test_find_and_get() {
        let mut pool = NamePool::new();
        pool.intern("Root");
        assert_eq!(pool.find("root"), Some(0));
        assert_eq!(pool.find("missing"), None);
        assert_eq!(pool.get(-1), None);
        assert_eq!(pool.get(5), None);
    }

    #[test]
    fn test_from_names_keeps_indices() {
        let pool = NamePool::from_names(vec!["A".into(), "b".into(), "a".into()]);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.get(2), Some("a"));
        assert_eq!(pool.find("A"), Some(0));
        assert!(!pool.is_unique());
    }
}
