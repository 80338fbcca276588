use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use crate::cli::args::RangeCommands;
use crate::config::AppConfig;
use crate::db::ProgressBackend;
use crate::models::{PrayerType, QadaRange};
use crate::sync::QadaTracker;
use crate::utils::format::{format_span_estimate, percent, progress_bar};

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;2;196;160;68m";

// ─── Setup ───────────────────────────────────────────────────────────────────

pub fn handle_setup<B: ProgressBackend>(
    tracker: &mut QadaTracker<B>,
    config: &AppConfig,
    reset: bool,
) -> Result<()> {
    if tracker.is_configured() && !reset {
        println!("Progress is already set up. Use --reset to start over, or `qada range add` for another interval.");
        return Ok(());
    }

    println!();
    println_colored!(GOLD, "  Qada Setup");
    println_colored!(DIM, "  Estimate your missed prayers from one date range.");
    println!();

    let start = prompt_date("  When did you stop praying regularly? (YYYY-MM-DD): ")?;
    let end = prompt_date("  When did you start praying again?   (YYYY-MM-DD): ")?;
    let exclude_jomaa = prompt_yes_no("  Exclude Fridays from the Dhuhr count? [y/N]: ")?;
    let exclude_period = prompt_yes_no("  Exclude a monthly period from all counts? [y/N]: ")?;
    let period_days = if exclude_period {
        prompt_period_days(config.policy.default_period_days)?
    } else {
        config.policy.default_period_days
    };

    tracker.setup(start, end, exclude_jomaa, exclude_period, period_days)?;

    // Write the config (defaults included) so the exclusion policy is
    // editable on disk from day one.
    config.save().context("Saving config")?;

    let agg = tracker.aggregated();
    println!();
    println_colored!(
        GREEN,
        "  ✓ Tracking {} missed prayers over {}",
        agg.total_count(),
        format_span_estimate(total_days(tracker))
    );
    println!();
    Ok(())
}

// ─── Status ──────────────────────────────────────────────────────────────────

pub fn handle_status<B: ProgressBackend>(tracker: &QadaTracker<B>) -> Result<()> {
    let Some(store) = tracker.store() else {
        println!("No progress yet — run `qada setup` to begin.");
        return Ok(());
    };
    let agg = tracker.aggregated();

    println!();
    println_colored!(GOLD, "  Qada Progress");
    println_colored!(
        DIM,
        "  {} range(s), ~{} of missed prayers",
        store.ranges.len(),
        format_span_estimate(total_days(tracker))
    );
    println!();

    for prayer in PrayerType::all() {
        let totals = agg.get(prayer);
        println!(
            "  {:<8}  {:>6}/{:<6}  {}  {:>3}%",
            prayer.display_name(),
            totals.completed,
            totals.count,
            progress_bar(totals.completed, totals.count, 20),
            percent(totals.completed, totals.count)
        );
    }

    println!();
    if agg.total_remaining() == 0 && agg.total_count() > 0 {
        println_colored!(GREEN, "  ✓ All caught up — nothing left to make up!");
    } else {
        println_colored!(
            BOLD,
            "  Done: {}   Remaining: {}",
            agg.total_completed(),
            agg.total_remaining()
        );
    }
    println_colored!(DIM, "  Last updated {}", store.updated_at.format("%Y-%m-%d %H:%M UTC"));
    println!();
    Ok(())
}

// ─── Aggregate actions ───────────────────────────────────────────────────────

pub fn handle_pray<B: ProgressBackend>(
    tracker: &mut QadaTracker<B>,
    prayer_str: &str,
    count: u32,
) -> Result<()> {
    let prayer = parse_prayer(prayer_str)?;
    tracker.increment_prayer(prayer, count)?;
    let totals = tracker.aggregated().get(prayer);
    println_colored!(
        GREEN,
        "  ✓ {} — {}/{} made up",
        prayer.display_name(),
        totals.completed,
        totals.count
    );
    if totals.remaining() == 0 {
        println_colored!(GOLD, "  {} is fully caught up!", prayer.display_name());
    }
    Ok(())
}

pub fn handle_undo<B: ProgressBackend>(
    tracker: &mut QadaTracker<B>,
    prayer_str: &str,
    count: u32,
) -> Result<()> {
    let prayer = parse_prayer(prayer_str)?;
    tracker.decrement_prayer(prayer, count)?;
    let totals = tracker.aggregated().get(prayer);
    println_colored!(
        AMBER,
        "  {} — back to {}/{}",
        prayer.display_name(),
        totals.completed,
        totals.count
    );
    Ok(())
}

pub fn handle_set<B: ProgressBackend>(
    tracker: &mut QadaTracker<B>,
    prayer_str: &str,
    value: u32,
) -> Result<()> {
    let prayer = parse_prayer(prayer_str)?;
    tracker.set_prayer_completed(prayer, value)?;
    let totals = tracker.aggregated().get(prayer);
    println_colored!(
        GREEN,
        "  ✓ {} set to {}/{}",
        prayer.display_name(),
        totals.completed,
        totals.count
    );
    Ok(())
}

// ─── Range management ────────────────────────────────────────────────────────

pub fn handle_range<B: ProgressBackend>(
    tracker: &mut QadaTracker<B>,
    action: &RangeCommands,
    config: &AppConfig,
) -> Result<()> {
    match action {
        RangeCommands::List => {
            let Some(store) = tracker.store() else {
                println!("No progress yet — run `qada setup` to begin.");
                return Ok(());
            };
            println!();
            println_colored!(GOLD, "  Missed-prayer ranges");
            println!();
            for (i, range) in store.ranges.iter().enumerate() {
                print_range(i, range);
            }
            println!();
        }
        RangeCommands::Add {
            start,
            end,
            exclude_jomaa,
            exclude_period,
            period_days,
        } => {
            let start = parse_date(start)?;
            let end = parse_date(end)?;
            let period_days = period_days.unwrap_or(config.policy.default_period_days);
            tracker.add_range(start, end, *exclude_jomaa, *exclude_period, period_days)?;
            println_colored!(GREEN, "  ✓ Added range {} → {}", start, end);
        }
        RangeCommands::Edit {
            index,
            start,
            end,
            exclude_jomaa,
            exclude_period,
            period_days,
        } => {
            let idx = to_internal_index(*index)?;
            let start = parse_date(start)?;
            let end = parse_date(end)?;
            let period_days = period_days.unwrap_or(config.policy.default_period_days);
            tracker.edit_range(idx, start, end, *exclude_jomaa, *exclude_period, period_days)?;
            println_colored!(GREEN, "  ✓ Range #{} recomputed", index);
        }
        RangeCommands::Remove { index } => {
            let idx = to_internal_index(*index)?;
            tracker.remove_range(idx)?;
            println_colored!(AMBER, "  Range #{} removed; totals re-aggregated", index);
        }
        RangeCommands::Set {
            index,
            prayer,
            value,
        } => {
            let idx = to_internal_index(*index)?;
            let prayer = parse_prayer(prayer)?;
            tracker.set_range_completed(idx, prayer, *value)?;
            let range = tracker.store().ok_or(anyhow!("store vanished"))?.range(idx)?;
            println_colored!(
                GREEN,
                "  ✓ Range #{} {}: {}/{}",
                index,
                prayer.display_name(),
                range.completed(prayer),
                range.count(prayer)
            );
        }
        RangeCommands::Pray {
            index,
            prayer,
            undo,
        } => {
            let idx = to_internal_index(*index)?;
            let prayer = parse_prayer(prayer)?;
            let delta = if *undo { -1 } else { 1 };
            tracker.adjust_range_completed(idx, prayer, delta)?;
            let range = tracker.store().ok_or(anyhow!("store vanished"))?.range(idx)?;
            println_colored!(
                GREEN,
                "  ✓ Range #{} {}: {}/{}",
                index,
                prayer.display_name(),
                range.completed(prayer),
                range.count(prayer)
            );
        }
    }
    Ok(())
}

fn print_range(i: usize, range: &QadaRange) {
    let mut flags = Vec::new();
    if range.exclude_jomaa {
        flags.push("no-jomaa".to_string());
    }
    if range.exclude_period {
        flags.push(format!("period {}d", range.period_days));
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!("  [{}]", flags.join(", "))
    };
    println_colored!(
        BOLD,
        "  #{}  {} → {}  ({} days){}",
        i + 1,
        range.missed_start_date,
        range.missed_end_date,
        range.day_span(),
        flags
    );
    for prayer in PrayerType::all() {
        println!(
            "      {:<8}  {:>5}/{:<5}  {}",
            prayer.display_name(),
            range.completed(prayer),
            range.count(prayer),
            progress_bar(range.completed(prayer), range.count(prayer), 12)
        );
    }
}

// ─── Import / export ─────────────────────────────────────────────────────────

pub fn handle_export<B: ProgressBackend>(
    tracker: &QadaTracker<B>,
    output: Option<&Path>,
) -> Result<()> {
    let document = tracker.export_document()?;
    match output {
        Some(path) => {
            std::fs::write(path, &document).with_context(|| format!("Writing {:?}", path))?;
            println_colored!(GREEN, "  ✓ Exported to {}", path.display());
        }
        None => println!("{}", document),
    }
    Ok(())
}

pub fn handle_import<B: ProgressBackend>(
    tracker: &mut QadaTracker<B>,
    file: &Path,
) -> Result<()> {
    let raw = std::fs::read_to_string(file).with_context(|| format!("Reading {:?}", file))?;
    tracker.import_document(&raw)?;
    let agg = tracker.aggregated();
    println_colored!(
        GREEN,
        "  ✓ Imported {} range(s), {} prayers tracked",
        tracker.store().map(|s| s.ranges.len()).unwrap_or(0),
        agg.total_count()
    );
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn total_days<B: ProgressBackend>(tracker: &QadaTracker<B>) -> u32 {
    tracker
        .store()
        .map(|s| s.ranges.iter().map(QadaRange::day_span).sum())
        .unwrap_or(0)
}

fn parse_prayer(s: &str) -> Result<PrayerType> {
    PrayerType::from_str(s)
        .map_err(|_| anyhow!("Unknown prayer '{}'. Use: fajr, dhuhr, asr, maghrib, isha", s))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Bad date '{}': expected YYYY-MM-DD", s))
}

/// CLI range numbers are 1-based as printed by `range list`.
fn to_internal_index(shown: usize) -> Result<usize> {
    shown
        .checked_sub(1)
        .ok_or_else(|| anyhow!("Range numbers start at 1"))
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().lock().read_line(&mut buf)?;
    Ok(buf.trim_end_matches('\n').trim_end_matches('\r').to_string())
}

fn prompt_date(message: &str) -> Result<NaiveDate> {
    loop {
        let answer = prompt(message)?;
        match parse_date(answer.trim()) {
            Ok(date) => return Ok(date),
            Err(err) => println_colored!(AMBER, "  {}", err),
        }
    }
}

fn prompt_yes_no(message: &str) -> Result<bool> {
    let answer = prompt(message)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn prompt_period_days(default: u32) -> Result<u32> {
    loop {
        let answer = prompt(&format!("  Days per cycle (1-15) [{}]: ", default))?;
        let trimmed = answer.trim();
        if trimmed.is_empty() {
            return Ok(default);
        }
        match trimmed.parse::<u32>() {
            Ok(n) if (1..=15).contains(&n) => return Ok(n),
            _ => println_colored!(AMBER, "  Enter a number between 1 and 15"),
        }
    }
}
