/// Formats a second count as zero-padded `mm:ss`; minutes are not wrapped at 60.
pub fn format_mmss(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Whole minutes, rounding half up (90s -> 2, 89s -> 1).
pub fn round_minutes(seconds: u64) -> u64 {
    (seconds + 30) / 60
}
