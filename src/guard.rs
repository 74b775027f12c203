use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use serde_json::Value;

const DEFAULT_CAPACITY: usize = 512;

pub struct ProcessedGuard {
    seen: Mutex<LruCache<u64, ()>>,
}

impl Default for ProcessedGuard {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ProcessedGuard {
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self { seen: Mutex::new(LruCache::new(cap)) }
    }

    pub fn is_processed(&self, subtree: &Value) -> bool {
        let fp = fingerprint(subtree);
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).get(&fp).is_some()
    }

    pub fn mark(&self, subtree: &Value) {
        let fp = fingerprint(subtree);
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).put(fp, ());
    }

    /// Run `f` on `subtree` unless it is already processed, then mark the
    /// result. Returns whether `f` ran.
    pub fn process_once<F>(&self, subtree: &mut Value, f: F) -> bool
    where
        F: FnOnce(&mut Value),
    {
        if self.is_processed(subtree) {
            return false;
        }
        f(subtree);
        self.mark(subtree);
        true
    }
}

/// Structural hash of a JSON tree; object keys are hashed in map order.
pub fn fingerprint(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_value(value, &mut hasher);
    hasher.finish()
}

fn hash_value<H: Hasher>(value: &Value, h: &mut H) {
    match value {
        Value::Null => 0u8.hash(h),
        Value::Bool(b) => {
            1u8.hash(h);
            b.hash(h);
        }
        Value::Number(n) => {
            2u8.hash(h);
            n.to_string().hash(h);
        }
        Value::String(s) => {
            3u8.hash(h);
            s.hash(h);
        }
        Value::Array(list) => {
            4u8.hash(h);
            list.len().hash(h);
            for v in list {
                hash_value(v, h);
            }
        }
        Value::Object(map) => {
            5u8.hash(h);
            map.len().hash(h);
            for (k, v) in map {
                k.hash(h);
                hash_value(v, h);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fingerprint_is_structural() {
        assert_eq!(fingerprint(&json!({"a": [1, 2]})), fingerprint(&json!({"a": [1, 2]})));
        assert_ne!(fingerprint(&json!({"a": [1, 2]})), fingerprint(&json!({"a": [2, 1]})));
        assert_ne!(fingerprint(&json!("1")), fingerprint(&json!(1)));
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let guard = ProcessedGuard::default();
        let mut list = json!([{"n": 1}]);
        let append = |v: &mut Value| {
            if let Some(a) = v.as_array_mut() {
                a.push(json!({"n": 2}));
            }
        };
        assert!(guard.process_once(&mut list, append));
        let after_first = list.clone();
        assert!(!guard.process_once(&mut list, append));
        assert_eq!(list, after_first);
    }

    #[test]
    fn capacity_bounds_memory() {
        let guard = ProcessedGuard::with_capacity(2);
        guard.mark(&json!(1));
        guard.mark(&json!(2));
        guard.mark(&json!(3));
        assert!(!guard.is_processed(&json!(1)));
        assert!(guard.is_processed(&json!(3)));
    }
}
