//! Per-request key/value store.
//!
//! Values are type-erased on the way in and checked on the way out, so a lookup
//! with the wrong type is a [`StoreError::TypeMismatch`] rather than a silent miss.

use std::any::{type_name, Any};
use std::collections::HashMap;

use crate::error::StoreError;

struct Entry {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// Heterogeneous map keyed by string.
#[derive(Default)]
pub struct Store {
    entries: HashMap<String, Entry>,
}

impl Store {
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(
            key.into(),
            Entry {
                value: Box::new(value),
                type_name: type_name::<T>(),
            },
        );
    }

    pub fn get<T: Any>(&self, key: &str) -> Result<&T, StoreError> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| StoreError::Missing(key.to_owned()))?;
        entry
            .value
            .downcast_ref::<T>()
            .ok_or_else(|| mismatch::<T>(key, entry.type_name))
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Result<&mut T, StoreError> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| StoreError::Missing(key.to_owned()))?;
        let found = entry.type_name;
        entry
            .value
            .downcast_mut::<T>()
            .ok_or_else(|| mismatch::<T>(key, found))
    }

    /// Remove and return the value. A type mismatch leaves the entry in place.
    pub fn take<T: Any>(&mut self, key: &str) -> Result<T, StoreError> {
        match self.entries.get(key) {
            None => return Err(StoreError::Missing(key.to_owned())),
            Some(entry) if !entry.value.is::<T>() => {
                return Err(mismatch::<T>(key, entry.type_name));
            }
            Some(_) => {}
        }
        let entry = self
            .entries
            .remove(key)
            .ok_or_else(|| StoreError::Missing(key.to_owned()))?;
        let found = entry.type_name;
        entry
            .value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| mismatch::<T>(key, found))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn mismatch<T>(key: &str, found: &'static str) -> StoreError {
    StoreError::TypeMismatch {
        key: key.to_owned(),
        expected: type_name::<T>(),
        found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_roundtrip() {
        let mut store = Store::default();
        store.set("user", String::from("alice"));
        store.set("attempts", 3u32);
        assert_eq!(store.get::<String>("user").unwrap(), "alice");
        *store.get_mut::<u32>("attempts").unwrap() += 1;
        assert_eq!(*store.get::<u32>("attempts").unwrap(), 4);
    }

    #[test]
    fn test_type_mismatch_reports_both_types() {
        let mut store = Store::default();
        store.set("attempts", 3u32);
        let err = store.get::<String>("attempts").unwrap_err();
        assert_eq!(
            err,
            StoreError::TypeMismatch {
                key: "attempts".into(),
                expected: type_name::<String>(),
                found: "u32",
            }
        );
    }

    #[test]
    fn test_take_keeps_entry_on_mismatch() {
        let mut store = Store::default();
        store.set("k", 1i64);
        assert!(store.take::<u8>("k").is_err());
        assert!(store.contains("k"));
        assert_eq!(store.take::<i64>("k").unwrap(), 1);
        assert!(store.is_empty());
        assert_eq!(
            store.take::<i64>("k").unwrap_err(),
            StoreError::Missing("k".into())
        );
    }
}
