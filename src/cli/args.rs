use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "qada", version, about = "A terminal companion for tracking and making up missed prayers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record the first missed interval (dates, exclusions)
    Setup {
        /// Replace the existing record
        #[arg(long)]
        reset: bool,
    },
    /// Show the aggregate dashboard (default command)
    Status,
    /// Log completed make-up prayers against the aggregate
    Pray {
        /// Prayer name (fajr, dhuhr, asr, maghrib, isha)
        prayer: String,
        /// How many to log
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
    /// Take back logged make-up prayers
    Undo {
        /// Prayer name
        prayer: String,
        /// How many to take back
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
    /// Set the aggregate completed count for a prayer outright
    Set {
        /// Prayer name
        prayer: String,
        /// Absolute completed count (capped at the total owed)
        value: u32,
    },
    /// Manage individual missed-prayer ranges
    Range {
        #[command(subcommand)]
        action: RangeCommands,
    },
    /// Write the progress document as JSON
    Export {
        /// Destination file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace all progress from a JSON document (current or legacy shape)
    Import {
        /// Source file
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum RangeCommands {
    /// List every range with its per-prayer progress
    List,
    /// Add a new missed interval
    Add {
        /// First missed day (YYYY-MM-DD)
        start: String,
        /// Last missed day, inclusive (YYYY-MM-DD)
        end: String,
        /// Exclude Fridays from the midday prayer's count
        #[arg(long)]
        exclude_jomaa: bool,
        /// Exclude a recurring monthly period from all counts
        #[arg(long)]
        exclude_period: bool,
        /// Days per cycle for the period exclusion (1-15)
        #[arg(long)]
        period_days: Option<u32>,
    },
    /// Recompute a range with new dates/exclusions (completed counts are
    /// clamped, never inflated)
    Edit {
        /// Range number as shown by `range list`
        index: usize,
        /// First missed day (YYYY-MM-DD)
        start: String,
        /// Last missed day, inclusive (YYYY-MM-DD)
        end: String,
        #[arg(long)]
        exclude_jomaa: bool,
        #[arg(long)]
        exclude_period: bool,
        #[arg(long)]
        period_days: Option<u32>,
    },
    /// Delete a range; totals are re-aggregated from the survivors
    Remove {
        /// Range number as shown by `range list`
        index: usize,
    },
    /// Write one range's completed count directly (skips the waterfall)
    Set {
        /// Range number as shown by `range list`
        index: usize,
        /// Prayer name
        prayer: String,
        /// Completed count for that range (clamped to its capacity)
        value: u32,
    },
    /// Log one make-up prayer against a specific range
    Pray {
        /// Range number as shown by `range list`
        index: usize,
        /// Prayer name
        prayer: String,
        /// Take one back instead
        #[arg(long)]
        undo: bool,
    },
}
