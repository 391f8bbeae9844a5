//! Fast, non-cryptographic hash map/set aliases used throughout the
//! workspace for in-memory lookups (program tables, country mappings).

use rustc_hash::FxHashMap as RustcHashMap;
use rustc_hash::FxHashSet as RustcHashSet;

pub type FxHashMap<K, V> = RustcHashMap<K, V>;
pub type FxHashSet<T> = RustcHashSet<T>;
