//! cal-setup - Configure Calcast
//!
//! Manages the posting API key, connected accounts, the business profile used
//! for generation, and the media asset library.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use libcalcast::logging::LoggingConfig;
use libcalcast::service::CalcastService;
use libcalcast::{Asset, BusinessProfile, CalcastError, Config, SocialAccount, SocialPlatform};
use secrecy::ExposeSecret;

#[derive(Parser, Debug)]
#[command(name = "cal-setup")]
#[command(version)]
#[command(about = "Configure Calcast: API key, accounts, profile and assets")]
#[command(long_about = "\
cal-setup - Configure Calcast

DESCRIPTION:
    cal-setup stores your Ayrshare API key, syncs or toggles the social
    accounts linked to it, edits the business profile cal-gen writes about,
    and manages the library of images you attach to posts.

USAGE EXAMPLES:
    # Store the API key (read from stdin when omitted)
    cal-setup key set
    echo \"$AYRSHARE_KEY\" | cal-setup key set

    # Fetch the linked accounts from Ayrshare
    cal-setup sync

    # Describe your business for generation
    cal-setup profile set --name \"Corner Bakery\" --description \"Sourdough and pastries\"

    # Add an image to the asset library
    cal-setup assets add https://example.com/storefront.jpg --name Storefront

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Missing credential
    3 - Invalid input
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
    /// Manage the Ayrshare API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Fetch connected accounts from Ayrshare
    Sync,

    /// List social accounts and their connection state
    Accounts {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Mark a platform as connected
    Connect {
        /// facebook, instagram, linkedin, pinterest or google-business
        platform: String,
    },

    /// Mark a platform as disconnected
    Disconnect {
        /// facebook, instagram, linkedin, pinterest or google-business
        platform: String,
    },

    /// Show or edit the business profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Manage the media asset library
    Assets {
        #[command(subcommand)]
        action: AssetAction,
    },
}

#[derive(Subcommand, Debug)]
enum KeyAction {
    /// Store the API key
    Set {
        /// The key; read from stdin when omitted
        key: Option<String>,
    },
    /// Remove the stored API key
    Clear,
    /// Show whether a key is stored (masked)
    Show,
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
    /// Print the business profile
    Show {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Update profile fields; fields not given keep their value
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Tone of voice, e.g. "friendly and warm"
        #[arg(long)]
        tone: Option<String>,
        /// Logo image URL
        #[arg(long)]
        logo: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum AssetAction {
    /// List assets, newest first
    List {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Add an image URL to the library
    Add {
        url: String,
        /// Display name (defaults to "Untitled Image")
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Remove an asset
    Delete { id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

/// Exit code for `error`, following the library's convention
fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<CalcastError>()
        .map(CalcastError::exit_code)
        .unwrap_or(1)
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load_or_default()?;
    let service = CalcastService::from_config(config)?;

    match cli.command {
        Commands::Key { action } => cmd_key(&service, action),
        Commands::Sync => cmd_sync(&service).await,
        Commands::Accounts { format } => {
            let json = parse_format(&format)?;
            print_accounts(&service.accounts().accounts()?, json)
        }
        Commands::Connect { platform } => cmd_toggle(&service, &platform, true),
        Commands::Disconnect { platform } => cmd_toggle(&service, &platform, false),
        Commands::Profile { action } => cmd_profile(&service, action),
        Commands::Assets { action } => cmd_assets(&service, action),
    }
}

fn parse_format(format: &str) -> Result<bool> {
    match format {
        "text" => Ok(false),
        "json" => Ok(true),
        other => Err(CalcastError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            other
        ))
        .into()),
    }
}

fn cmd_key(service: &CalcastService, action: KeyAction) -> Result<()> {
    match action {
        KeyAction::Set { key } => {
            let key = match key {
                Some(key) => key,
                None => read_key()?,
            };
            if key.trim().is_empty() {
                return Err(CalcastError::InvalidInput("API key cannot be empty".to_string()).into());
            }
            service.accounts().set_api_key(&key)?;
            println!("✓ API key saved");
        }
        KeyAction::Clear => {
            service.accounts().clear_api_key()?;
            println!("✓ API key cleared");
        }
        KeyAction::Show => match service.accounts().api_key()? {
            Some(key) => println!("API key: {}", mask_key(key.expose_secret())),
            None => println!("API key: not set"),
        },
    }
    Ok(())
}

/// Read the key from stdin, prompting when attached to a terminal
fn read_key() -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        print!("Ayrshare API key: ");
        io::stdout().flush().context("Failed to flush prompt")?;
    }
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("Failed to read API key from stdin")?;
    Ok(line.trim().to_string())
}

/// Show only the last four characters of a key
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

async fn cmd_sync(service: &CalcastService) -> Result<()> {
    let accounts = service
        .accounts()
        .sync_profiles()
        .await
        .context("Account sync failed")?;
    let connected = accounts.iter().filter(|a| a.connected).count();
    println!("✓ Synced {} connected account(s)", connected);
    print_accounts(&accounts, false)
}

fn cmd_toggle(service: &CalcastService, platform: &str, connected: bool) -> Result<()> {
    let platform: SocialPlatform = platform.parse()?;
    let accounts = service.accounts().set_connected(platform, connected)?;
    let verb = if connected { "Connected" } else { "Disconnected" };
    println!("✓ {} {}", verb, platform);
    print_accounts(&accounts, false)
}

fn print_accounts(accounts: &[SocialAccount], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(accounts)?);
        return Ok(());
    }
    for account in accounts {
        let state = if account.connected { "connected" } else { "not connected" };
        match &account.username {
            Some(username) => println!("{:<16} {} ({})", account.platform, state, username),
            None => println!("{:<16} {}", account.platform, state),
        }
    }
    Ok(())
}

fn cmd_profile(service: &CalcastService, action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::Show { format } => {
            let json = parse_format(&format)?;
            let Some(profile) = service.accounts().profile()? else {
                println!("No business profile saved (run `cal-setup profile set --name ...`)");
                return Ok(());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                print_profile(&profile);
            }
        }
        ProfileAction::Set {
            name,
            website,
            description,
            tone,
            logo,
        } => {
            let mut profile = service.accounts().profile()?.unwrap_or_default();
            if let Some(name) = name {
                profile.name = name;
            }
            if let Some(website) = website {
                profile.website = website;
            }
            if let Some(description) = description {
                profile.description = description;
            }
            if let Some(tone) = tone {
                profile.tone = tone;
            }
            if let Some(logo) = logo {
                profile.logo = Some(logo).filter(|l| !l.trim().is_empty());
            }
            service.accounts().save_profile(&profile)?;
            println!("✓ Profile saved");
        }
    }
    Ok(())
}

fn print_profile(profile: &BusinessProfile) {
    println!("Name:        {}", profile.name);
    println!("Website:     {}", profile.website);
    println!("Description: {}", profile.description);
    println!("Tone:        {}", profile.tone);
    if let Some(logo) = &profile.logo {
        println!("Logo:        {}", logo);
    }
}

fn cmd_assets(service: &CalcastService, action: AssetAction) -> Result<()> {
    match action {
        AssetAction::List { format } => {
            let json = parse_format(&format)?;
            let assets = service.assets().list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&assets)?);
            } else {
                assets.iter().for_each(print_asset);
            }
        }
        AssetAction::Add { url, name } => {
            let asset = service.assets().add(&url, &name)?;
            println!("✓ Added asset {}", asset.id);
        }
        AssetAction::Delete { id } => {
            service
                .assets()
                .delete(&id)?
                .into_result(&format!("asset {}", id))?;
            println!("✓ Deleted asset {}", id);
        }
    }
    Ok(())
}

fn print_asset(asset: &Asset) {
    println!(
        "{} | {} | {} | {}",
        asset.id,
        asset.created_at.format("%Y-%m-%d"),
        asset.name,
        asset.url
    );
}
