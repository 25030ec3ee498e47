//! cal-queue - Browse and manage the content calendar
//!
//! Unix-style tool over the post collection: list, inspect a day or a month,
//! edit, delete, publish, and show dashboard statistics.

use chrono::Local;
use clap::{Parser, Subcommand};
use libcalcast::calendar::MonthView;
use libcalcast::error::StoreError;
use libcalcast::logging::LoggingConfig;
use libcalcast::scheduling::{parse_day, parse_schedule};
use libcalcast::service::events::EventReceiver;
use libcalcast::service::posts::DashboardStats;
use libcalcast::service::publish::SyncOutcome;
use libcalcast::service::CalcastService;
use libcalcast::types::parse_platform_list;
use libcalcast::{CalcastError, Config, Post, Result};
use serde::Serialize;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "cal-queue")]
#[command(version)]
#[command(about = "Browse and manage the content calendar")]
#[command(long_about = "\
cal-queue - Browse and manage the content calendar

DESCRIPTION:
    cal-queue lists, edits and publishes the posts on your Calcast calendar.
    Publishing goes through Ayrshare and needs an API key (see cal-setup).

COMMANDS:
    list      List posts, optionally filtered by status
    day       Show the posts scheduled on one day
    month     Show a month grid with post counts
    edit      Change a post and publish it if it is no longer a draft
    delete    Remove a post
    publish   Publish a post now
    stats     Show dashboard statistics

USAGE EXAMPLES:
    # List every scheduled post as JSON
    cal-queue list --status scheduled --format json

    # What is going out on the first of June?
    cal-queue day 2024-06-01

    # Move a post and schedule it
    cal-queue edit <POST_ID> --at \"tomorrow 3pm\" --status scheduled

    # Publish right away
    cal-queue publish <POST_ID>

CONFIGURATION:
    Configuration file: ~/.config/calcast/config.toml
    Data directory:     ~/.local/share/calcast

    Override with environment variables:
        CALCAST_CONFIG    - Path to config file
        CALCAST_DATA_DIR  - Path to data directory

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Missing credential
    3 - Invalid input (bad post ID, date format, etc.)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List posts
    List {
        /// Only posts with this status: draft, scheduled or published
        #[arg(short, long)]
        status: Option<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show the posts scheduled on one day
    Day {
        /// Day as YYYY-MM-DD
        date: String,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show a month grid
    Month {
        /// Month as YYYY-MM (defaults to the current month)
        month: Option<String>,
    },

    /// Edit a post
    Edit {
        /// Post ID to edit
        post_id: String,

        /// New text
        #[arg(long)]
        content: Option<String>,

        /// New image URL
        #[arg(long, conflicts_with = "clear_image")]
        image: Option<String>,

        /// Remove the image
        #[arg(long)]
        clear_image: bool,

        /// Comma-separated platforms (e.g. "facebook,google-business")
        #[arg(long)]
        platforms: Option<String>,

        /// New schedule time (e.g. "2024-06-01 09:30", "tomorrow 3pm", "2h")
        #[arg(long)]
        at: Option<String>,

        /// New status: draft, scheduled or published
        #[arg(long)]
        status: Option<String>,
    },

    /// Delete a post
    Delete {
        /// Post ID to delete
        post_id: String,
    },

    /// Publish a post now
    Publish {
        /// Post ID to publish
        post_id: String,
    },

    /// Show dashboard statistics
    Stats {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
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
    let config = Config::load_or_default()?;
    let service = CalcastService::from_config(config)?;

    match cli.command {
        Commands::List { status, format } => cmd_list(&service, status.as_deref(), &format),
        Commands::Day { date, format } => cmd_day(&service, &date, &format),
        Commands::Month { month } => cmd_month(&service, month.as_deref()),
        Commands::Edit {
            post_id,
            content,
            image,
            clear_image,
            platforms,
            at,
            status,
        } => {
            let changes = EditArgs {
                content,
                image,
                clear_image,
                platforms,
                at,
                status,
            };
            cmd_edit(&service, &post_id, changes).await
        }
        Commands::Delete { post_id } => cmd_delete(&service, &post_id),
        Commands::Publish { post_id } => cmd_publish(&service, &post_id).await,
        Commands::Stats { format } => cmd_stats(&service, &format),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_format(format: &str) -> Result<OutputFormat> {
    match format {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(CalcastError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            other
        ))),
    }
}

fn cmd_list(service: &CalcastService, status: Option<&str>, format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let mut posts = match status {
        Some(status) => service.posts().with_status(status.parse()?)?,
        None => service.posts().all()?,
    };
    posts.sort_by_key(|p| p.scheduled_date);
    print_posts(&posts, format)
}

fn cmd_day(service: &CalcastService, date: &str, format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let day = parse_day(date)?;
    print_posts(&service.posts().posts_on_day(day)?, format)
}

fn cmd_month(service: &CalcastService, month: Option<&str>) -> Result<()> {
    let view = match month {
        Some(month) => MonthView::parse(month)?,
        None => MonthView::containing(Local::now().date_naive()),
    };
    let by_day = service.posts().month(view)?;

    println!("{}", view);
    println!(" Su  Mo  Tu  We  Th  Fr  Sa");
    for week in view.weeks() {
        let row: Vec<String> = week
            .iter()
            .map(|cell| match cell {
                Some(day) if by_day.contains_key(day) => format!("{:>3}*", day),
                Some(day) => format!("{:>3} ", day),
                None => "    ".to_string(),
            })
            .collect();
        println!("{}", row.concat().trim_end());
    }

    if !by_day.is_empty() {
        println!();
    }
    for (day, posts) in &by_day {
        for post in posts {
            println!(
                "{:>2} {} | {} | {}",
                day,
                post.scheduled_date.format("%H:%M"),
                post.status,
                truncate_content(&post.content, 50)
            );
        }
    }
    Ok(())
}

/// Field changes requested by `cal-queue edit`
#[derive(Debug, Default)]
struct EditArgs {
    content: Option<String>,
    image: Option<String>,
    clear_image: bool,
    platforms: Option<String>,
    at: Option<String>,
    status: Option<String>,
}

impl EditArgs {
    fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.image.is_none()
            && !self.clear_image
            && self.platforms.is_none()
            && self.at.is_none()
            && self.status.is_none()
    }

    fn apply(self, mut post: Post) -> Result<Post> {
        if let Some(content) = self.content {
            if content.trim().is_empty() {
                return Err(CalcastError::InvalidInput("Content cannot be empty".to_string()));
            }
            post.content = content;
        }
        if self.clear_image {
            post.image = None;
        } else if let Some(image) = self.image {
            post.image = Some(image).filter(|url| !url.trim().is_empty());
        }
        if let Some(platforms) = self.platforms {
            post.platforms = parse_platform_list(&platforms)?;
        }
        if let Some(at) = self.at {
            post.scheduled_date = parse_schedule(&at)?;
        }
        if let Some(status) = self.status {
            post.status = status.parse()?;
        }
        Ok(post)
    }
}

async fn cmd_edit(service: &CalcastService, post_id: &str, changes: EditArgs) -> Result<()> {
    if changes.is_empty() {
        return Err(CalcastError::InvalidInput(
            "Nothing to change; pass at least one of --content, --image, --clear-image, \
             --platforms, --at, --status"
                .to_string(),
        ));
    }

    let post = changes.apply(service.posts().require(post_id)?)?;
    let mut events = service.subscribe();
    let outcome = service.publisher().save_and_sync(post).await;
    log_events(&mut events);
    match outcome? {
        SyncOutcome::LocalOnly => println!("Saved {}", post_id),
        SyncOutcome::Published(report) => {
            println!("Saved {}", post_id);
            print_published(&report.post, report.receipt.remote_id.as_deref());
        }
        SyncOutcome::Failed(error) => {
            println!("Saved {}", post_id);
            return Err(error.into());
        }
    }
    Ok(())
}

fn cmd_delete(service: &CalcastService, post_id: &str) -> Result<()> {
    service
        .posts()
        .delete(post_id)?
        .into_result(&format!("post {}", post_id))?;
    println!("Deleted {}", post_id);
    Ok(())
}

async fn cmd_publish(service: &CalcastService, post_id: &str) -> Result<()> {
    let mut events = service.subscribe();
    let result = service.publisher().publish_by_id(post_id).await;
    log_events(&mut events);
    let report = result?;
    print_published(&report.post, report.receipt.remote_id.as_deref());
    if !report.persisted {
        eprintln!("Warning: {} was removed locally while publishing", post_id);
    }
    Ok(())
}

/// Log the events emitted since `receiver` subscribed; returns how many were seen
fn log_events(receiver: &mut EventReceiver) -> usize {
    let mut seen = 0;
    loop {
        match receiver.try_recv() {
            Ok(event) => {
                info!(?event, "service event");
                seen += 1;
            }
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "missed service events"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => return seen,
        }
    }
}

fn cmd_stats(service: &CalcastService, format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let stats = service.posts().dashboard()?;
    match format {
        OutputFormat::Json => print_json(&stats),
        OutputFormat::Text => {
            print_stats_text(&stats);
            Ok(())
        }
    }
}

fn print_stats_text(stats: &DashboardStats) {
    println!("Posts:        {}", stats.total);
    println!("  Drafts:     {}", stats.drafts);
    println!("  Scheduled:  {}", stats.scheduled);
    println!("  Published:  {}", stats.published);
    println!("Total likes:  {}", stats.total_likes);
    println!("Total shares: {}", stats.total_shares);

    if !stats.recent.is_empty() {
        println!();
        println!("Recent posts:");
        for post in &stats.recent {
            println!("  {}", post_line(post));
        }
    }
}

fn print_published(post: &Post, remote_id: Option<&str>) {
    let platforms: Vec<&str> = post.platforms.iter().map(|p| p.as_str()).collect();
    match remote_id {
        Some(remote_id) => println!(
            "Published {} to {} ({})",
            post.id,
            platforms.join(", "),
            remote_id
        ),
        None => println!("Published {} to {}", post.id, platforms.join(", ")),
    }
}

fn print_posts(posts: &[Post], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&posts),
        OutputFormat::Text => {
            for post in posts {
                println!("{}", post_line(post));
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Encode {
        key: "output".to_string(),
        source,
    })?;
    println!("{}", json);
    Ok(())
}

fn post_line(post: &Post) -> String {
    let platforms: Vec<&str> = post.platforms.iter().map(|p| p.as_str()).collect();
    format!(
        "{} | {} | {} | {} | {}",
        post.id,
        post.scheduled_date.format("%Y-%m-%d %H:%M"),
        post.status,
        platforms.join(","),
        truncate_content(&post.content, 50)
    )
}

/// Truncate content to `max_chars` characters with an ellipsis
fn truncate_content(content: &str, max_chars: usize) -> String {
    let single_line = content.replace('\n', " ");
    if single_line.chars().count() <= max_chars {
        single_line
    } else {
        let cut: String = single_line.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use libcalcast::generation::mock::MockGenerator;
    use libcalcast::publishing::mock::MockPoster;
    use libcalcast::{PostStatus, RemoteError, Store};
    use std::sync::Arc;

    fn service_with(poster: MockPoster) -> CalcastService {
        let service = CalcastService::with_parts(
            Store::in_memory(),
            Arc::new(MockGenerator::default()),
            Arc::new(poster),
            Config::default_config(),
        );
        service.accounts().set_api_key("ayr-key").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut post = Post::new("hello".to_string(), date);
        post.id = "p1".to_string();
        service.posts().create_many(vec![post]).unwrap();
        service
    }

    #[test]
    fn test_truncate_content() {
        assert_eq!(truncate_content("short", 10), "short");
        assert_eq!(truncate_content("abcdefghij", 5), "abcde...");
        assert_eq!(truncate_content("line one\nline two", 50), "line one line two");
        assert_eq!(truncate_content("🥐🥐🥐", 2), "🥐🥐...");
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("text").unwrap(), OutputFormat::Text);
        assert_eq!(parse_format("json").unwrap(), OutputFormat::Json);
        assert!(matches!(
            parse_format("xml"),
            Err(CalcastError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_edit_args_apply() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let post = Post::new("old".to_string(), date).with_image("https://img.example/a.png");

        let edited = EditArgs {
            content: Some("new".to_string()),
            clear_image: true,
            platforms: Some("pinterest,gmb".to_string()),
            at: Some("2024-06-02 10:30".to_string()),
            status: Some("scheduled".to_string()),
            ..Default::default()
        }
        .apply(post)
        .unwrap();

        assert_eq!(edited.content, "new");
        assert!(edited.image.is_none());
        assert_eq!(edited.platforms.len(), 2);
        assert_eq!(edited.scheduled_date.to_string(), "2024-06-02 10:30:00");
        assert_eq!(edited.status, PostStatus::Scheduled);
    }

    #[test]
    fn test_edit_args_reject_bad_values() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let post = Post::new("old".to_string(), date);

        let bad_status = EditArgs {
            status: Some("archived".to_string()),
            ..Default::default()
        };
        assert!(bad_status.apply(post.clone()).is_err());

        let empty_content = EditArgs {
            content: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(empty_content.apply(post).is_err());
        assert!(EditArgs::default().is_empty());
    }

    #[tokio::test]
    async fn test_publish_logs_service_events() {
        let service = service_with(MockPoster::success());
        let mut events = service.subscribe();
        cmd_publish(&service, "p1").await.unwrap();

        // started and completed
        assert_eq!(log_events(&mut events), 2);
        assert_eq!(log_events(&mut events), 0);
        assert_eq!(service.posts().require("p1").unwrap().status, PostStatus::Published);
    }

    #[tokio::test]
    async fn test_failed_publish_still_logs_events() {
        let service = service_with(MockPoster::publish_failure(RemoteError::Rejected(
            "Duplicate post".to_string(),
        )));
        let mut events = service.subscribe();
        assert!(cmd_publish(&service, "p1").await.is_err());
        // started and failed
        assert_eq!(log_events(&mut events), 2);
    }
}
