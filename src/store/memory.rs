use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use anyhow::Result;
use async_trait::async_trait;

use super::{KvStore, Mutation};

/// Process-local store. Used by tests and by hosts that do not need durability.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }

    async fn update(&self, key: &str, mutation: Mutation) -> Result<Option<String>> {
        let mut entries = self.entries();
        let next = mutation(entries.get(key).cloned())?;
        match &next {
            Some(value) => {
                entries.insert(key.to_string(), value.clone());
            }
            None => {
                entries.remove(key);
            }
        }
        Ok(next)
    }
}
