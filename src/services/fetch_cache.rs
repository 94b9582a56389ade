use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Keeps provider responses for a short while so repeated syncs of the same
/// matchday don't burn the API's rate limit.
///
/// The `*_at` variants take the current time explicitly; the plain ones use the
/// wall clock.
#[derive(Debug)]
pub struct FetchCache<V> {
    max_age: Duration,
    entries: Mutex<HashMap<String, (DateTime<Utc>, V)>>,
}

impl<V: Clone> FetchCache<V> {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Utc::now())
    }

    /// Returns the value stored under `key` unless it is older than the max age.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<V> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let (stored_at, value) = entries.get(key)?;
        // A timestamp in the future (clock moved back) counts as fresh.
        match now.signed_duration_since(*stored_at).to_std() {
            Ok(age) if age > self.max_age => None,
            _ => Some(value.clone()),
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_at(key, Utc::now(), value)
    }

    pub fn insert_at(&self, key: impl Into<String>, now: DateTime<Utc>, value: V) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), (now, value));
    }

    #[cfg(test)]
    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
