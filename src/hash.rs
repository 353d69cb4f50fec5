use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};

pub fn stable_hash_with(f: impl FnOnce(&mut DefaultHasher)) -> u64 {
    let mut hasher = DefaultHasher::new();
    f(&mut hasher);
    hasher.finish()
}

/// Identity of one installed upload; two uploads of the same file differ by load instant.
pub fn dataset_identity(name: &str, loaded_at: &DateTime<Utc>, records: usize) -> u64 {
    stable_hash_with(|hasher| {
        name.hash(hasher);
        loaded_at.timestamp_nanos_opt().unwrap_or_default().hash(hasher);
        records.hash(hasher);
    })
}
