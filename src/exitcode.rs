//! Standard exit codes (BSD sysexits.h compatible)

/// Successful termination
pub const OK: i32 = 0;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error (malformed snapshot, nothing to export)
pub const DATAERR: i32 = 65;

/// Cannot open input (snapshot or node path not found)
pub const NOINPUT: i32 = 66;

/// Service unavailable (node still loading, archival refused)
pub const UNAVAILABLE: i32 = 69;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
