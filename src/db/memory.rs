// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store with the same semantics the Firestore backend
//! relies on: keyed documents, create-only inserts and equality queries.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

/// Documents keyed by (collection, document ID).
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: DashMap<(String, String), Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(collection: &str, id: &str) -> (String, String) {
        (collection.to_string(), id.to_string())
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Value> {
        self.docs
            .get(&Self::key(collection, id))
            .map(|doc| doc.value().clone())
    }

    /// Create or replace.
    pub fn set(&self, collection: &str, id: &str, doc: Value) {
        self.docs.insert(Self::key(collection, id), doc);
    }

    /// Insert only if no document with this ID exists. The vacancy check and
    /// the insert happen under one shard lock.
    pub fn create(&self, collection: &str, id: &str, doc: Value) -> bool {
        match self.docs.entry(Self::key(collection, id)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(doc);
                true
            }
        }
    }

    /// Copy the listed top-level fields of `doc` onto an existing document.
    /// Returns false when the document does not exist.
    pub fn update_fields(&self, collection: &str, id: &str, doc: &Value, fields: &[&str]) -> bool {
        let Some(mut stored) = self.docs.get_mut(&Self::key(collection, id)) else {
            return false;
        };
        if let Value::Object(target) = stored.value_mut() {
            for field in fields {
                let value = doc.get(*field).cloned().unwrap_or(Value::Null);
                target.insert((*field).to_string(), value);
            }
        }
        true
    }

    pub fn delete(&self, collection: &str, id: &str) -> bool {
        self.docs.remove(&Self::key(collection, id)).is_some()
    }

    /// Documents whose string `field` equals `value`, sorted ascending by the
    /// numeric `order_by` field.
    pub fn query_eq(&self, collection: &str, field: &str, value: &str, order_by: &str) -> Vec<Value> {
        let mut matches: Vec<Value> = self
            .docs
            .iter()
            .filter(|doc| doc.key().0 == collection)
            .filter(|doc| doc.value().get(field).and_then(Value::as_str) == Some(value))
            .map(|doc| doc.value().clone())
            .collect();

        matches.sort_by_key(|doc| doc.get(order_by).and_then(Value::as_u64).unwrap_or(u64::MAX));
        matches
    }

    pub fn len(&self, collection: &str) -> usize {
        self.docs.iter().filter(|doc| doc.key().0 == collection).count()
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}
