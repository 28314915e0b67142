//! Schema registry: one schema per `(path, method)`, backed by a key-value store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{RegisterError, StoreError};
use crate::types::{registry_key, Schema};

/// Key-value storage behind a [`SchemaRegistry`].
///
/// `insert` replaces any previous value wholesale and `get` returns `None` for
/// a missing key. Implementations must make each call atomic with respect to
/// concurrent callers.
pub trait SchemaStore: Send + Sync {
    fn insert(&self, key: &str, schema: Arc<Schema>) -> Result<(), StoreError>;

    fn get(&self, key: &str) -> Option<Arc<Schema>>;
}

/// In-memory store guarded by a reader-writer lock.
///
/// Readers run concurrently; a writer excludes everyone. Values are swapped as
/// whole `Arc`s, so a reader sees either the old schema or the new one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, Arc<Schema>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SchemaStore for MemoryStore {
    fn insert(&self, key: &str, schema: Arc<Schema>) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        self.data.write().insert(key.to_string(), schema);
        Ok(())
    }

    fn get(&self, key: &str) -> Option<Arc<Schema>> {
        self.data.read().get(key).cloned()
    }
}

/// Registers and looks up schemas by `(path, method)`.
#[derive(Debug, Default)]
pub struct SchemaRegistry<S = MemoryStore> {
    store: S,
}

impl SchemaRegistry<MemoryStore> {
    /// Registry over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: SchemaStore> SchemaRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store `schema`, replacing any schema registered under the same key.
    ///
    /// # Errors
    ///
    /// Returns the store's `StoreError` when it rejects the write.
    pub fn register(&self, schema: impl Into<Schema>) -> Result<(), StoreError> {
        let schema = schema.into();
        let key = schema.key();
        self.store.insert(&key, Arc::new(schema))?;
        tracing::debug!(key = %key, "registered schema");
        Ok(())
    }

    /// Register each schema in order, stopping at the first failure.
    ///
    /// There is no rollback: entries before the failing one stay registered.
    /// Returns the number of schemas registered.
    ///
    /// # Errors
    ///
    /// Returns `RegisterError::Entry` naming the index and key of the first
    /// entry the store rejected.
    pub fn register_all<I, T>(&self, schemas: I) -> Result<usize, RegisterError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Schema>,
    {
        let mut count = 0;
        for (index, schema) in schemas.into_iter().enumerate() {
            let schema = schema.into();
            let key = schema.key();
            self.register(schema)
                .map_err(|source| RegisterError::Entry { index, key, source })?;
            count += 1;
        }
        Ok(count)
    }

    /// Schema registered for `(path, method)`, if any.
    pub fn lookup(&self, path: &str, method: &str) -> Option<Arc<Schema>> {
        let key = registry_key(path, method);
        let schema = self.store.get(&key);
        if schema.is_none() {
            tracing::debug!(key = %key, "no schema registered");
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldDefinition, SchemaDefinition};

    fn definition(path: &str, method: &str, fields: Vec<FieldDefinition>) -> SchemaDefinition {
        SchemaDefinition {
            path: path.into(),
            method: method.into(),
            query_params: fields,
            headers: vec![],
            body: vec![],
        }
    }

    /// Store that rejects one key, for partial batch failures.
    struct RejectingStore {
        inner: MemoryStore,
        reject: String,
    }

    impl SchemaStore for RejectingStore {
        fn insert(&self, key: &str, schema: Arc<Schema>) -> Result<(), StoreError> {
            if key == self.reject {
                return Err(StoreError::EmptyKey);
            }
            self.inner.insert(key, schema)
        }

        fn get(&self, key: &str) -> Option<Arc<Schema>> {
            self.inner.get(key)
        }
    }

    #[test]
    fn memory_store_rejects_empty_key() {
        let store = MemoryStore::new();
        let schema = Arc::new(Schema::from(definition("/a", "GET", vec![])));
        assert_eq!(store.insert("", schema), Err(StoreError::EmptyKey));
        assert!(store.is_empty());
    }

    #[test]
    fn memory_store_insert_and_get() {
        let store = MemoryStore::new();
        let schema = Arc::new(Schema::from(definition("/a", "GET", vec![])));
        store.insert("/a-GET", Arc::clone(&schema)).unwrap();
        assert_eq!(store.get("/a-GET"), Some(schema));
        assert_eq!(store.get("/a-POST"), None);
    }

    #[test]
    fn lookup_missing_returns_none() {
        let registry = SchemaRegistry::in_memory();
        assert!(registry.lookup("/users", "GET").is_none());
    }

    #[test]
    fn register_then_lookup() {
        let registry = SchemaRegistry::in_memory();
        registry
            .register(definition(
                "/users",
                "GET",
                vec![FieldDefinition::new("id", ["Int"], true)],
            ))
            .unwrap();

        let schema = registry.lookup("/users", "GET").unwrap();
        assert_eq!(schema.path, "/users");
        assert!(schema.query_params["id"].required);
        assert!(registry.lookup("/users", "POST").is_none());
    }

    #[test]
    fn register_overwrites_whole_schema() {
        let registry = SchemaRegistry::in_memory();
        registry
            .register(definition(
                "/users",
                "GET",
                vec![
                    FieldDefinition::new("id", ["Int"], true),
                    FieldDefinition::new("page", ["Int"], false),
                ],
            ))
            .unwrap();
        registry
            .register(definition(
                "/users",
                "GET",
                vec![FieldDefinition::new("name", ["String"], false)],
            ))
            .unwrap();

        let schema = registry.lookup("/users", "GET").unwrap();
        assert_eq!(schema.query_params.len(), 1);
        assert!(schema.query_params.contains_key("name"));
        assert_eq!(registry.store().len(), 1);
    }

    #[test]
    fn register_all_counts_entries() {
        let registry = SchemaRegistry::in_memory();
        let count = registry
            .register_all(vec![
                definition("/a", "GET", vec![]),
                definition("/a", "POST", vec![]),
                definition("/b", "GET", vec![]),
            ])
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(registry.store().len(), 3);
    }

    #[test]
    fn register_all_keeps_entries_before_failure() {
        let registry = SchemaRegistry::new(RejectingStore {
            inner: MemoryStore::new(),
            reject: "/b-GET".into(),
        });

        let err = registry
            .register_all(vec![
                definition("/a", "GET", vec![]),
                definition("/b", "GET", vec![]),
                definition("/c", "GET", vec![]),
            ])
            .unwrap_err();

        match err {
            RegisterError::Entry { index, key, .. } => {
                assert_eq!(index, 1);
                assert_eq!(key, "/b-GET");
            }
        }
        assert!(registry.lookup("/a", "GET").is_some());
        assert!(registry.lookup("/b", "GET").is_none());
        assert!(registry.lookup("/c", "GET").is_none());
    }

    #[test]
    fn concurrent_register_and_lookup() {
        let registry = Arc::new(SchemaRegistry::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        let fields = (0..=j % 4)
                            .map(|n| FieldDefinition::new(format!("f{}", n), ["Int"], true))
                            .collect();
                        registry
                            .register(definition("/shared", "GET", fields))
                            .unwrap();
                        registry
                            .register(definition(&format!("/t{}", i), "GET", vec![]))
                            .unwrap();
                        let schema = registry.lookup("/shared", "GET").unwrap();
                        // every observed schema is one complete registration
                        let n = schema.query_params.len();
                        assert!((1..=4).contains(&n));
                        for k in 0..n {
                            assert!(schema.query_params.contains_key(&format!("f{}", k)));
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.store().len(), 9);
    }
}
