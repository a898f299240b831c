//! Backup cadence and selection policy.

/// Days between backup runs.
pub const BACKUP_INTERVAL_DAYS: u32 = 3;

/// Local node hour at which the backup job fires.
pub const BACKUP_HOUR: u32 = 4;

/// Cron expression for the backup job: every 3rd day at 04:00.
pub const BACKUP_CRON: &str = "0 4 */3 * *";

/// A retention window is sound when it outlives at least three backup
/// cycles, so an expired object is never the only generation left.
pub fn retention_ok(expiration_days: u32, interval_days: u32) -> bool {
    interval_days > 0 && expiration_days >= 3 * interval_days
}

/// Pick the most recent backup from a key listing.
///
/// Keys are timestamp-prefixed, so the lexicographic maximum is the newest.
/// An empty listing means no backup exists and restore is skipped.
pub fn latest_key(keys: &[String]) -> Option<&str> {
    keys.iter().max().map(String::as_str)
}
