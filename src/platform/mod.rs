//! Host information used in gate reports.
//!
//! Nothing here can fail the gate: missing data degrades to a placeholder.

use std::env;
use std::fs;

/// Get the system hostname.
///
/// Tries `/etc/hostname`, then `/proc/sys/kernel/hostname`, then the
/// `HOSTNAME` / `COMPUTERNAME` environment variables.
pub fn get_hostname() -> Option<String> {
    for path in ["/etc/hostname", "/proc/sys/kernel/hostname"] {
        if let Ok(content) = fs::read_to_string(path) {
            let hostname = content.trim();
            if !hostname.is_empty() {
                return Some(hostname.to_string());
            }
        }
    }

    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Current Unix timestamp in seconds (0 if the clock is before the epoch)
pub fn get_unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
