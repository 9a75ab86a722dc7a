use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::TabularStore;
use crate::errors::StoreError;

/// In-process [`TabularStore`] keyed by range string, for tests and local runs.
///
/// Every operation can be made to fail with [`InMemoryStore::fail_with`] to
/// exercise error paths.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<HashMap<String, Vec<Vec<String>>>>,
    failure: Mutex<Option<String>>,
    appends: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `range` with `rows` (headers first), replacing previous content.
    pub fn with_table<R, C>(self, range: &str, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(Into::into).collect())
            .collect();
        lock(&self.tables).insert(range.to_string(), rows);
        self
    }

    /// Make every subsequent call fail with `reason`; `None` heals the store.
    pub fn fail_with(&self, reason: Option<&str>) {
        *lock(&self.failure) = reason.map(str::to_string);
    }

    /// Number of successful appends across all ranges.
    pub fn append_count(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    pub fn rows(&self, range: &str) -> Vec<Vec<String>> {
        lock(&self.tables).get(range).cloned().unwrap_or_default()
    }

    fn check(&self) -> Result<(), StoreError> {
        match lock(&self.failure).as_ref() {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl TabularStore for InMemoryStore {
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, StoreError> {
        self.check()?;
        Ok(self.rows(range))
    }

    async fn append_row(&self, range: &str, row: Vec<String>) -> Result<(), StoreError> {
        self.check()?;
        lock(&self.tables).entry(range.to_string()).or_default().push(row);
        self.appends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}
