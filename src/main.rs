use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use hcsleep::data::{DayBucket, SortOrder};
use hcsleep::{Aggregator, Config};

#[derive(Parser)]
#[command(name = "hcsleep")]
#[command(about = "Per-day sleep report from the HC Gateway")]
#[command(version)]
struct Cli {
    /// Number of local calendar days to report
    #[arg(short, long, default_value_t = 7)]
    days: u32,

    /// End the window today instead of yesterday
    #[arg(long)]
    include_today: bool,

    /// Report these local dates (YYYY-MM-DD, comma separated) instead of
    /// a trailing-days window
    #[arg(long, value_delimiter = ',')]
    dates: Vec<NaiveDate>,

    /// Series order of the report
    #[arg(long, value_enum, default_value_t = Order::Desc)]
    order: Order,

    /// Emit the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Order {
    Asc,
    Desc,
}

impl From<Order> for SortOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => SortOrder::Ascending,
            Order::Desc => SortOrder::Descending,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hcsleep=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let aggregator = Aggregator::from_config(&config)?;

    let window = if cli.dates.is_empty() {
        aggregator.window_last_days(cli.days, cli.include_today)?
    } else {
        aggregator.window_for_dates(cli.dates.iter().copied())?
    };

    let report = aggregator.aggregate(&window, cli.order.into()).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&report);
    }
    Ok(())
}

fn print_table(report: &[DayBucket]) {
    println!("{:<12} {:<12} stages", "date", "total");
    for bucket in report {
        let stages = if bucket.per_stage_minutes.is_empty() {
            "-".to_string()
        } else {
            stage_chips(bucket)
        };
        println!(
            "{:<12} {:<12} {}",
            bucket.date,
            minutes_to_hm(bucket.total_minutes),
            stages
        );
    }
}

/// Well-known stages first, anything else after in name order.
fn stage_chips(bucket: &DayBucket) -> String {
    const DISPLAY_ORDER: [&str; 5] = ["REM", "profundo", "ligero", "despierto", "siesta/otro"];
    let mut chips = Vec::new();
    for name in DISPLAY_ORDER {
        if let Some(minutes) = bucket.per_stage_minutes.get(name) {
            chips.push(format!("{}: {}", name, minutes_to_hm(*minutes)));
        }
    }
    for (name, minutes) in &bucket.per_stage_minutes {
        if !DISPLAY_ORDER.contains(&name.as_str()) {
            chips.push(format!("{}: {}", name, minutes_to_hm(*minutes)));
        }
    }
    chips.join("  ")
}

fn minutes_to_hm(minutes: i64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    match (hours, mins) {
        (0, m) => format!("{} min", m),
        (h, 0) => format!("{} h", h),
        (h, m) => format!("{} h {} min", h, m),
    }
}
