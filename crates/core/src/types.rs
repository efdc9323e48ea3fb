/// Backend-assigned task identifier (opaque integer).
pub type TaskId = i64;

/// The backend's strictly increasing per-project sequence number for a task.
pub type InnerId = i64;

/// Backend-assigned annotation identifier.
pub type AnnotationId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Format a timestamp the way the annotation backend expects it:
/// RFC 3339, millisecond precision, `Z` suffix.
pub fn format_backend_timestamp(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
