use crate::constants::DEFAULT_CACHE_CAPACITY;
use crate::error::Result;
use crate::metrics::QualifierMetrics;
use crate::qualifier::{Qualifier, QualifierRules};
use crate::table::Table;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Cache key for one qualifier run: the table's content hash joined with a
/// fingerprint of the rules it was qualified under.
pub fn compute_cache_key(table_hash: &str, rules: &QualifierRules) -> String {
    let mut s = String::new();
    s.push_str(table_hash);
    for part in [
        &rules.status_column,
        &rules.orders_sent_column,
        &rules.dedup_column,
        &rules.qualifying_status,
    ] {
        s.push('|');
        s.push_str(&part.len().to_string());
        s.push(':');
        s.push_str(part);
    }
    s.push('|');
    for col in &rules.required_columns {
        s.push_str(&col.len().to_string());
        s.push(':');
        s.push_str(col);
    }

    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Default)]
struct Entries {
    tables: HashMap<String, Arc<Table>>,
    // insertion order, oldest at the front
    order: VecDeque<String>,
}

/// Memoizes qualifier output keyed by input content.
///
/// Qualification is pure, so a hit returns exactly what a fresh run would.
/// Failed runs are never stored. At most `capacity` results are kept; the
/// oldest is evicted first.
pub struct QualifierCache {
    enabled: bool,
    capacity: usize,
    entries: Mutex<Entries>,
}

impl QualifierCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { enabled: true, capacity, entries: Mutex::new(Entries::default()) }
    }

    /// A cache that stores nothing; every call runs the qualifier.
    pub fn disabled() -> Self {
        Self { enabled: false, capacity: 0, entries: Mutex::new(Entries::default()) }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.tables.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn qualify(&self, qualifier: &Qualifier, table: &Table) -> Result<Arc<Table>> {
        if !self.enabled || self.capacity == 0 {
            return qualifier.qualify(table).map(Arc::new);
        }

        let key = compute_cache_key(&table.content_hash(), qualifier.rules());
        if let Some(hit) = self.entries.lock().ok().and_then(|e| e.tables.get(&key).cloned()) {
            debug!(key = %key, "Qualifier cache hit");
            QualifierMetrics::record_cache_hit();
            return Ok(hit);
        }

        debug!(key = %key, "Qualifier cache miss");
        QualifierMetrics::record_cache_miss();
        let result = Arc::new(qualifier.qualify(table)?);
        if let Ok(mut entries) = self.entries.lock() {
            self.insert(&mut entries, key, result.clone());
        }
        Ok(result)
    }

    fn insert(&self, entries: &mut Entries, key: String, table: Arc<Table>) {
        if entries.tables.insert(key.clone(), table).is_some() {
            // another caller stored the same result first
            return;
        }
        entries.order.push_back(key);
        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.tables.remove(&oldest);
                debug!(key = %oldest, "Evicted qualifier cache entry");
            }
        }
    }
}

impl Default for QualifierCache {
    fn default() -> Self {
        Self::new()
    }
}
