//! cal-gen - Generate a month of social posts with AI
//!
//! Asks the configured model for a campaign and adds the drafts to the
//! calendar, or prints them without saving on `--dry-run`.

use chrono::{Local, NaiveDate};
use clap::Parser;
use libcalcast::logging::LoggingConfig;
use libcalcast::scheduling::{parse_day, parse_schedule};
use libcalcast::service::CalcastService;
use libcalcast::{CalcastError, Config, Post, Result};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "cal-gen")]
#[command(version)]
#[command(about = "Generate a month of social posts with AI")]
#[command(long_about = "\
cal-gen - Generate a month of social posts with AI

DESCRIPTION:
    cal-gen asks Google Gemini for a batch of posts about your business and
    adds them to the calendar as drafts, spread over the 30 days after the
    start date. Each draft gets a placeholder image and the default platforms.

    Business name and description default to the saved profile
    (see `cal-setup profile set`).

USAGE EXAMPLES:
    # Generate from the saved profile, starting today
    cal-gen

    # Generate for a specific business, starting next Monday
    cal-gen --business \"Corner Bakery\" --description \"Sourdough and pastries\" --start \"next monday\"

    # Preview without saving
    cal-gen --dry-run --format json

CONFIGURATION:
    The Gemini API key is read from GEMINI_API_KEY (or the variable named by
    generation.api_key_env in ~/.config/calcast/config.toml).

EXIT CODES:
    0 - Success
    1 - Generation failed
    2 - Missing API key
    3 - Invalid input (missing business details, bad date, etc.)
")]
struct Cli {
    /// Business name (defaults to the saved profile)
    #[arg(short, long)]
    business: Option<String>,

    /// What the business does (defaults to the saved profile)
    #[arg(short, long)]
    description: Option<String>,

    /// Business website (defaults to the saved profile)
    #[arg(short, long)]
    website: Option<String>,

    /// First day of the campaign (e.g. "2024-06-01", "next monday"); defaults to today
    #[arg(short, long)]
    start: Option<String>,

    /// Print the generated posts without saving them
    #[arg(long)]
    dry_run: bool,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let json = match cli.format.as_str() {
        "text" => false,
        "json" => true,
        other => {
            return Err(CalcastError::InvalidInput(format!(
                "Invalid format '{}'. Must be 'text' or 'json'",
                other
            )))
        }
    };
    let start = match cli.start.as_deref() {
        Some(input) => parse_start(input)?,
        None => Local::now().date_naive(),
    };

    let config = Config::load_or_default()?;
    let service = CalcastService::from_config(config)?;

    let profile = service.accounts().profile()?.unwrap_or_default();
    let business = cli.business.unwrap_or(profile.name);
    let description = cli.description.unwrap_or(profile.description);
    let website = cli.website.unwrap_or(profile.website);
    debug!(%business, %start, dry_run = cli.dry_run, "generating campaign");

    let generation = service.generation();
    let request = generation.request(&business, &description, Some(website.as_str()), start);
    let posts = if cli.dry_run {
        generation.preview(&request).await?
    } else {
        generation.generate(&request).await?
    };

    if json {
        let output = serde_json::to_string_pretty(&posts).map_err(|source| {
            libcalcast::error::StoreError::Encode {
                key: "output".to_string(),
                source,
            }
        })?;
        println!("{}", output);
    } else {
        print_text(&posts, cli.dry_run);
    }
    Ok(())
}

/// Campaign start: a plain date, or anything the scheduler understands
fn parse_start(input: &str) -> Result<NaiveDate> {
    parse_day(input).or_else(|_| parse_schedule(input).map(|at| at.date()))
}

fn print_text(posts: &[Post], dry_run: bool) {
    for post in posts {
        println!(
            "{} | {} | {}",
            post.id,
            post.scheduled_date.format("%Y-%m-%d"),
            post.content.replace('\n', " ")
        );
    }
    if dry_run {
        eprintln!("Generated {} posts (dry run, nothing saved)", posts.len());
    } else {
        eprintln!("Added {} draft posts to the calendar", posts.len());
    }
}
