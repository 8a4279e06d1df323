use anyhow::{bail, Result};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use gitlab_digest::config::DateRange;
use gitlab_digest::models::Event;
use gitlab_digest::store;

/// Writes a synthetic GitLab events file for trying out `--file` mode
#[derive(Parser)]
#[command(author, version, long_about = None)]
struct Args {
    /// First day of generated events (YYYY-MM-DD)
    #[arg(short, long)]
    start: String,

    /// Last day of generated events (YYYY-MM-DD)
    #[arg(short, long)]
    end: String,

    /// Number of events to generate
    #[arg(short, long, default_value_t = 40)]
    count: usize,

    /// Output file, defaults to the name a real fetch would use
    #[arg(short, long)]
    output: Option<PathBuf>,
}

const ACTIONS: &[(&str, &[&str])] = &[
    ("pushed to", &[""]),
    ("opened", &["Fix flaky integration pipeline", "Upgrade postgres to 16.2", "Add audit log export"]),
    ("commented on", &["RFC: split billing service", "Release 3.8 checklist"]),
    ("accepted", &["Bump tokio to 1.38", "Add retry budget to webhook worker"]),
    ("closed", &["Login page 500 on expired session", "Stale cache after deploy"]),
    ("approved", &["Refactor config loader", "Drop legacy v1 endpoints"]),
];

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let range = DateRange::parse(&args.start, &args.end)?;
    if range.end < range.start {
        bail!("--end must not be before --start");
    }

    info!("Generating {} mock event(s)", args.count);
    let events = generate_mock_events(range.start, range.end, args.count);

    let path = args
        .output
        .unwrap_or_else(|| store::dump_path(std::path::Path::new("."), &range));
    store::save_events(&events, &path).await?;

    info!("Mock data generation complete");
    Ok(())
}

/// Spreads `count` events evenly over the working hours of each day in the
/// range, newest first like the events API.
fn generate_mock_events(start: NaiveDate, end: NaiveDate, count: usize) -> Vec<Event> {
    let days = (end - start).num_days() + 1;
    let mut events = Vec::with_capacity(count);

    for i in 0..count {
        let day = start + Duration::days(i as i64 % days);
        let minutes = (i as i64 * 37) % (8 * 60);
        let created_at = day
            .and_hms_opt(9, 0, 0)
            .map(|t| Utc.from_utc_datetime(&t) + Duration::minutes(minutes));

        let (action, targets) = ACTIONS[i % ACTIONS.len()];
        let target = targets[(i / ACTIONS.len()) % targets.len()];

        events.push(Event {
            id: 1_000 + i as i64,
            action: action.to_string(),
            target: target.to_string(),
            created_at,
        });
    }

    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_requested_count_within_range() {
        let start = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 9, 6).unwrap();

        let events = generate_mock_events(start, end, 25);

        assert_eq!(events.len(), 25);
        for event in &events {
            let day = event.created_at.unwrap().date_naive();
            assert!(day >= start && day <= end);
        }
        assert!(events.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[test]
    fn single_day_range_works() {
        let day = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        assert_eq!(generate_mock_events(day, day, 3).len(), 3);
    }
}
