//! Durable key-value store scoped to this extension.
//!
//! Every persisted entity (interval list, activity log, singleflight flag, icon cache,
//! window state) lives behind [`KvStore`]. Read-modify-write sequences go through
//! [`KvStore::update`], which applies the mutation atomically with respect to every
//! other call on the same store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::oneshot;

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Mutation applied by [`KvStore::update`]. Returning `None` removes the key.
pub type Mutation = Box<dyn FnOnce(Option<String>) -> Result<Option<String>> + Send + 'static>;

pub mod keys {
    pub const LAST_FRAME: &str = "last_frame";
    pub const ACTIVITY_INTERVALS: &str = "activity_intervals";
    pub const ACTIVITY: &str = "activity";
    pub const SUMMARY_TASK: &str = "summary_task";
    pub const WINDOW_ID: &str = "window_id";
    pub const HIDDEN: &str = "hidden";

    pub fn bundle_icon(bundle_id: &str) -> String {
        format!("bundle:{bundle_id}")
    }
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// Atomically replace the value under `key` with the result of `mutation`.
    /// Returns the value that was stored.
    async fn update(&self, key: &str, mutation: Mutation) -> Result<Option<String>>;
}

pub async fn get_json<T>(store: &dyn KvStore, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .with_context(|| format!("failed to decode JSON stored under '{key}'")),
        None => Ok(None),
    }
}

pub async fn set_json<T>(store: &dyn KvStore, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)
        .with_context(|| format!("failed to encode JSON for '{key}'"))?;
    store.set(key, &raw).await
}

/// Typed atomic read-modify-write.
///
/// `mutation` receives the decoded current value and returns the value to store
/// (`None` removes the key) together with a result handed back to the caller.
pub async fn update_json<T, R, F>(store: &dyn KvStore, key: &str, mutation: F) -> Result<R>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    R: Send + 'static,
    F: FnOnce(Option<T>) -> Result<(Option<T>, R)> + Send + 'static,
{
    let (reply_tx, reply_rx) = oneshot::channel();
    let owned_key = key.to_string();

    store
        .update(
            key,
            Box::new(move |current| {
                let decoded = current
                    .map(|raw| serde_json::from_str::<T>(&raw))
                    .transpose()
                    .with_context(|| format!("failed to decode JSON stored under '{owned_key}'"))?;
                let (next, result) = mutation(decoded)?;
                let encoded = next
                    .map(|value| serde_json::to_string(&value))
                    .transpose()
                    .with_context(|| format!("failed to encode JSON for '{owned_key}'"))?;
                let _ = reply_tx.send(result);
                Ok(encoded)
            }),
        )
        .await?;

    reply_rx
        .await
        .with_context(|| format!("update of '{key}' finished without a result"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_json_returns_mutation_result() {
        let store = MemoryStore::new();
        set_json(&store, "list", &vec![1, 2, 3]).await.unwrap();

        let popped = update_json(&store, "list", |list: Option<Vec<i32>>| {
            let mut list = list.unwrap_or_default();
            let first = if list.is_empty() { None } else { Some(list.remove(0)) };
            Ok((Some(list), first))
        })
        .await
        .unwrap();

        assert_eq!(popped, Some(1));
        let rest: Vec<i32> = get_json(&store, "list").await.unwrap().unwrap();
        assert_eq!(rest, vec![2, 3]);
    }

    #[tokio::test]
    async fn failed_mutation_leaves_value_untouched() {
        let store = MemoryStore::new();
        store.set("counter", "7").await.unwrap();

        let result = update_json(&store, "counter", |_: Option<i32>| -> Result<(Option<i32>, ())> {
            anyhow::bail!("refuse")
        })
        .await;

        assert!(result.is_err());
        assert_eq!(store.get("counter").await.unwrap().as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn returning_none_removes_the_key() {
        let store = MemoryStore::new();
        set_json(&store, "flag", &true).await.unwrap();

        update_json(&store, "flag", |_: Option<bool>| Ok((None, ())))
            .await
            .unwrap();

        assert_eq!(store.get("flag").await.unwrap(), None);
    }
}
