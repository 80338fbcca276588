/// Create a simple ASCII progress bar
pub fn progress_bar(filled: u32, total: u32, width: usize) -> String {
    if total == 0 {
        return "░".repeat(width);
    }
    let ratio = (filled as f64 / total as f64).min(1.0);
    let filled_count = (ratio * width as f64).round() as usize;
    let empty_count = width.saturating_sub(filled_count);
    format!("{}{}", "█".repeat(filled_count), "░".repeat(empty_count))
}

/// "3 days", "1.2 years" — a rough human scale for a day count.
pub fn format_span_estimate(days: u32) -> String {
    if days < 365 {
        format!("{} days", days)
    } else {
        format!("{:.1} years", days as f64 / 365.0)
    }
}

/// Whole-number percentage, clamped to 100.
pub fn percent(filled: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((filled as f64 / total as f64) * 100.0).round().min(100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_is_fixed_width() {
        assert_eq!(progress_bar(0, 10, 5).chars().count(), 5);
        assert_eq!(progress_bar(10, 10, 5), "█████");
        assert_eq!(progress_bar(0, 0, 5), "░░░░░");
    }

    #[test]
    fn percent_handles_edges() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(5, 10), 50);
        assert_eq!(percent(20, 10), 100);
    }

    #[test]
    fn span_estimate_switches_units() {
        assert_eq!(format_span_estimate(90), "90 days");
        assert_eq!(format_span_estimate(730), "2.0 years");
    }
}
