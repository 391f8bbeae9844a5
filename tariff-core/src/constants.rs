//! Fixed constants referenced across the workspace. Values that are
//! actual trade-policy data (program rates, country lists) belong in the
//! temporal store / country mapping tables, not here — these are purely
//! structural defaults called out by spec.md.

/// Chunker defaults (spec.md §4.4).
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 200;
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1200;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Number of leading characters used to relocate a chunk's
/// `(char_start, char_end)` in the source text (spec.md §4.4).
pub const CHUNK_LOCATE_PREFIX_LEN: usize = 50;

/// Connector fetch timeout default (spec.md §5).
pub const DEFAULT_CONNECTOR_TIMEOUT_SECS: u64 = 30;

/// Bounded retry attempts for transport-level fetch failures (spec.md §7).
pub const DEFAULT_CONNECTOR_RETRY_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_CONNECTOR_RETRY_BACKOFF_MS: u64 = 500;

/// Default warning-only citation-diversity threshold (spec.md §4.6 item 7).
pub const DEFAULT_MIN_CITATION_DOCUMENT_DIVERSITY: usize = 1;

/// Default Section-301 future-date horizon in days (spec.md §4.8 step 6).
pub const DEFAULT_SECTION301_FUTURE_HORIZON_DAYS: i64 = 365;

/// HTS code regex used by connectors to scan extracted text (spec.md
/// §4.3 item g): up to three dot-separated groups of two digits after a
/// four-digit heading.
pub const HTS_SCAN_PATTERN: &str = r"\b\d{4}(?:\.\d{2}){0,3}\b";
