//! Values that shape the on disk layout of a store.

/// Extension every resource file is stored under, `<resource>.json`
pub const RESOURCE_EXTENSION: &str = "json";

/// Extension appended to a resource file while it is being written, `<resource>.json.tmp`
pub const TEMP_EXTENSION: &str = "tmp";

/// Root directory used when the caller doesn't pick one
pub const DEFAULT_DATA_DIR: &str = "./";

/// Indentation used when pretty printing documents
pub const JSON_INDENT: &[u8] = b"\t";

/// Upper bound on files read at once when loading a whole collection
pub const MAX_CONCURRENT_READS: usize = 16;
