// src/watch/debounce.rs

//! Per-key accumulation buffer with a single delayed flush per window.
//!
//! The first value recorded for a key opens a window; the caller is told so
//! and is responsible for flushing after [`Debouncer::delay`]. Values recorded
//! while the window is open are appended and never reset the delay. `take`
//! closes the window, so the next value opens a fresh one.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Debouncer<K, V> {
    delay: Duration,
    windows: Arc<Mutex<HashMap<K, Vec<V>>>>,
}

impl<K, V> Debouncer<K, V>
where
    K: Eq + Hash,
    V: PartialEq,
{
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn windows(&self) -> MutexGuard<'_, HashMap<K, Vec<V>>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `value` under `key`. Returns `true` if this opened a new window.
    ///
    /// Duplicate values within one window are kept once.
    pub fn record(&self, key: K, value: V) -> bool {
        let mut windows = self.windows();
        match windows.get_mut(&key) {
            Some(batch) => {
                if !batch.contains(&value) {
                    batch.push(value);
                }
                false
            }
            None => {
                windows.insert(key, vec![value]);
                true
            }
        }
    }

    /// Close the window for `key` and return everything it accumulated.
    pub fn take(&self, key: &K) -> Vec<V> {
        self.windows().remove(key).unwrap_or_default()
    }

    pub fn is_open(&self, key: &K) -> bool {
        self.windows().contains_key(key)
    }

    pub fn open_windows(&self) -> usize {
        self.windows().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_record_opens_window_and_later_ones_append() {
        let debouncer: Debouncer<&str, &str> = Debouncer::new(Duration::from_millis(100));

        assert!(debouncer.record("button", "index.ts"));
        assert!(!debouncer.record("button", "style.less"));
        assert!(!debouncer.record("button", "index.ts"));
        assert!(debouncer.record("card", "index.ts"));
        assert_eq!(debouncer.open_windows(), 2);

        assert_eq!(debouncer.take(&"button"), vec!["index.ts", "style.less"]);
        assert!(!debouncer.is_open(&"button"));
        assert!(debouncer.is_open(&"card"));
    }

    #[test]
    fn take_closes_window_so_next_record_reopens() {
        let debouncer: Debouncer<String, u32> = Debouncer::new(Duration::from_millis(10));
        assert!(debouncer.record("a".to_string(), 1));
        assert_eq!(debouncer.take(&"a".to_string()), vec![1]);
        assert!(debouncer.take(&"a".to_string()).is_empty());
        assert!(debouncer.record("a".to_string(), 2));
    }
}
