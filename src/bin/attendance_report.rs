//! attendance_report - query the attendance backend from the terminal
//!
//! Prints raw history, the per-lesson time series, or the per-day
//! maximum-per-lesson summary.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::time::Duration;

use headcount::AttendanceClient;

#[derive(Parser, Debug)]
#[command(author, version, about = "Classroom attendance reports")]
struct Args {
    /// Attendance API base URL.
    #[arg(
        long,
        env = "HEADCOUNT_ATTENDANCE_URL",
        default_value = "http://127.0.0.1:8000/api/v1"
    )]
    base_url: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Raw attendance history, newest first.
    History {
        /// Filter by date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,
        /// Filter by lesson number.
        #[arg(long)]
        lesson: Option<u32>,
        /// Maximum number of rows.
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
    /// Per-lesson time series.
    Lessons {
        /// Restrict to a single date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,
    },
    /// Per-day maximum count for each lesson.
    DailyMax,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let client = AttendanceClient::new(&args.base_url, Duration::from_secs(args.timeout_secs))?;

    match args.command {
        Command::History {
            date,
            lesson,
            limit,
        } => {
            let records = client.history(date.as_deref(), lesson, limit)?;
            println!("{:<26} {:>6} {:>8}", "timestamp", "count", "lesson");
            for r in &records {
                println!(
                    "{:<26} {:>6} {:>8}",
                    r.timestamp,
                    r.count,
                    r.lesson_number
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
            log::info!("{} rows", records.len());
        }
        Command::Lessons { date } => {
            let points = client.lesson_series(date.as_deref())?;
            println!("{:>8} {:<26} {:>6}", "lesson", "timestamp", "count");
            for p in &points {
                println!("{:>8} {:<26} {:>6}", p.lesson_number, p.timestamp, p.count);
            }
        }
        Command::DailyMax => {
            let rows = client.daily_max()?;
            println!("{:<12} {:>8} {:>10}", "date", "lesson", "max count");
            for row in &rows {
                println!(
                    "{:<12} {:>8} {:>10}",
                    row.date, row.lesson_number, row.max_count
                );
            }
        }
    }

    Ok(())
}
