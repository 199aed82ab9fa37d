//! Derived progress statistics.

use chrono::NaiveDate;
use learntrack_core::Time;

/// Numbers shown by a progress panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStats {
    /// Completed items
    pub completed: usize,

    /// Catalog size the percentage was computed against
    pub total: usize,

    /// Rounded completion percentage, 0-100
    pub percentage: u8,

    /// Last mutation, `None` before the store is ready
    pub last_updated: Option<Time>,
}

/// `completed / total` as a whole percentage, rounding halves up.
///
/// Integer arithmetic only, so there is no NaN or infinity to guard against.
/// A zero-sized catalog is 0%. Counts above `total` (ids outside the
/// catalog) are clamped to 100.
pub fn completion_percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed as u128;
    let total = total as u128;
    let pct = (200 * completed + total) / (2 * total);
    pct.min(100) as u8
}

/// File name for a progress export made on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("learntrack-progress-{}.json", date.format("%Y-%m-%d"))
}
