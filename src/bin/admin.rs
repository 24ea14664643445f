//! CLI administration tool for url-shortener-analytics.
//!
//! Manages accounts and links directly against the database, without going
//! through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create an account (prompts for email and password)
//! cargo run --bin admin -- user create
//!
//! # List accounts
//! cargo run --bin admin -- user list
//!
//! # Rotate an account's API key
//! cargo run --bin admin -- user api-key ada@example.com
//!
//! # Disable a link
//! cargo run --bin admin -- link deactivate spring-sale
//!
//! # Per-link click breakdown
//! cargo run --bin admin -- link stats spring-sale
//!
//! # Totals and database checks
//! cargo run --bin admin -- stats
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `API_KEY_SIGNING_SECRET` (required for `user create` and `user api-key`)

use url_shortener_analytics::domain::entities::{NewUser, Period, ShortLinkPatch};
use url_shortener_analytics::domain::repositories::{
    ClickDimension, ClickRepository, LinkRepository, UserRepository,
};
use url_shortener_analytics::infrastructure::persistence::{
    PgClickRepository, PgLinkRepository, PgUserRepository,
};
use url_shortener_analytics::utils::api_key::{ApiKeyHasher, generate_api_key};
use url_shortener_analytics::utils::password::hash_password;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Password};
use sqlx::PgPool;
use std::sync::Arc;

const MIN_PASSWORD_LEN: usize = 8;

/// CLI tool for managing url-shortener-analytics.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage short links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Show totals
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account
    Create {
        #[arg(short, long)]
        email: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List accounts
    List,

    /// Issue a new API key. The old key stops working.
    ApiKey { email: String },
}

#[derive(Subcommand)]
enum LinkAction {
    /// Stop a link from redirecting
    Deactivate { short_code: String },

    /// Show all-time click breakdown for a link
    Stats { short_code: String },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::User { action } => handle_user_action(action, &pool).await?,
        Commands::Link { action } => handle_link_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

fn api_key_hasher() -> Result<ApiKeyHasher> {
    let secret = std::env::var("API_KEY_SIGNING_SECRET")
        .context("API_KEY_SIGNING_SECRET must be set")?;
    Ok(ApiKeyHasher::new(secret))
}

async fn handle_user_action(action: UserAction, pool: &PgPool) -> Result<()> {
    let repo = PgUserRepository::new(Arc::new(pool.clone()));

    match action {
        UserAction::Create { email, yes } => create_user(&repo, email, yes).await?,
        UserAction::List => list_users(pool).await?,
        UserAction::ApiKey { email } => rotate_api_key(&repo, &email).await?,
    }

    Ok(())
}

/// Creates an account with an interactively entered password.
///
/// The raw API key is printed once. Only its HMAC is stored.
async fn create_user(repo: &PgUserRepository, email: Option<String>, skip_confirm: bool) -> Result<()> {
    println!("{}", "👤 Create User".bright_blue().bold());
    println!();

    let hasher = api_key_hasher()?;

    let email = match email {
        Some(e) => e,
        None => Input::new().with_prompt("Email").interact_text()?,
    };
    let email = email.trim().to_ascii_lowercase();
    if !email.contains('@') {
        bail!("'{email}' is not an email address");
    }

    if repo
        .find_by_email(&email)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .is_some()
    {
        bail!("Email already registered: {email}");
    }

    let first_name: String = Input::new()
        .with_prompt("First name")
        .allow_empty(true)
        .interact_text()?;
    let last_name: String = Input::new()
        .with_prompt("Last name")
        .allow_empty(true)
        .interact_text()?;

    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .validate_with(|input: &String| {
            if input.len() >= MIN_PASSWORD_LEN {
                Ok(())
            } else {
                Err(format!("Use at least {MIN_PASSWORD_LEN} characters"))
            }
        })
        .interact()?;

    println!();
    println!("  Email: {}", email.cyan());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this user?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let api_key = generate_api_key().map_err(|e| anyhow::anyhow!("{}", e))?;
    let password_hash = hash_password(&password).map_err(|e| anyhow::anyhow!("{}", e))?;

    let user = repo
        .create(NewUser {
            email,
            password_hash,
            api_key_hash: hasher.hash(&api_key),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create user: {}", e))?;

    println!();
    println!("{}", "✅ User created".green().bold());
    println!("  ID:      {}", user.id.to_string().bright_black());
    print_api_key(&api_key);

    Ok(())
}

async fn list_users(pool: &PgPool) -> Result<()> {
    println!("{}", "📋 Users".bright_blue().bold());
    println!();

    let rows: Vec<(String, bool, String, DateTime<Utc>, i64)> = sqlx::query_as(
        r#"
        SELECT u.email, u.is_active, u.plan_type, u.created_at,
               COUNT(l.id) FILTER (WHERE l.deleted_at IS NULL) AS links
        FROM users u
        LEFT JOIN short_links l ON l.owner_id = u.id
        GROUP BY u.id
        ORDER BY u.created_at
        "#,
    )
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        println!("{}", "  No users found".yellow());
        println!();
        println!(
            "  Create one with: {} admin -- user create",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<36} {:<8} {:<18} {:<6} {}",
        "Email".bright_white().bold(),
        "Plan".bright_white().bold(),
        "Created".bright_white().bold(),
        "Links".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "─".repeat(80).bright_black());

    for (email, is_active, plan, created_at, links) in &rows {
        let status = if *is_active {
            "ACTIVE".green()
        } else {
            "DISABLED".red()
        };

        println!(
            "  {:<36} {:<8} {:<18} {:<6} {}",
            email.cyan(),
            plan,
            created_at.format("%Y-%m-%d %H:%M").to_string().bright_black(),
            links,
            status
        );
    }

    println!();
    println!("  Total: {}", rows.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

async fn rotate_api_key(repo: &PgUserRepository, email: &str) -> Result<()> {
    println!("{}", "🔑 Rotate API Key".bright_blue().bold());
    println!();

    let hasher = api_key_hasher()?;

    let user = repo
        .find_by_email(&email.trim().to_ascii_lowercase())
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .context("User not found")?;

    println!("  User: {}", user.email.cyan());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Replace this user's API key?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    let api_key = generate_api_key().map_err(|e| anyhow::anyhow!("{}", e))?;
    repo.set_api_key_hash(user.id, &hasher.hash(&api_key))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to store API key: {}", e))?;

    println!();
    println!("{}", "✅ API key rotated".green().bold());
    print_api_key(&api_key);

    Ok(())
}

fn print_api_key(api_key: &str) {
    println!("  API key: {}", api_key.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "⚠️  Save this key now! It cannot be shown again.".red().bold()
    );
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"X-API-Key: {}\" http://localhost:3000/api/v1/urls",
        api_key.bright_yellow()
    );
    println!();
}

async fn handle_link_action(action: LinkAction, pool: &PgPool) -> Result<()> {
    let pool = Arc::new(pool.clone());
    let links = PgLinkRepository::new(pool.clone());

    let short_code = match &action {
        LinkAction::Deactivate { short_code } | LinkAction::Stats { short_code } => short_code,
    };
    let link = links
        .find_by_short_code(short_code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .context("Link not found")?;

    match action {
        LinkAction::Deactivate { .. } => {
            if !link.is_active {
                println!("{}", "⚠️  This link is already inactive".yellow());
                return Ok(());
            }

            println!("  Link: {} → {}", link.short_code.cyan(), link.original_url);
            println!();

            let confirmed = Confirm::new()
                .with_prompt("Deactivate this link?")
                .default(false)
                .interact()?;

            if !confirmed {
                println!("{}", "❌ Cancelled".red());
                return Ok(());
            }

            links
                .update(
                    link.id,
                    ShortLinkPatch {
                        is_active: Some(false),
                        ..Default::default()
                    },
                )
                .await
                .map_err(|e| anyhow::anyhow!("Failed to deactivate link: {}", e))?;

            println!("{}", "✅ Link deactivated".green().bold());
        }
        LinkAction::Stats { .. } => {
            let clicks = PgClickRepository::new(pool);
            let since = Period::AllTime.since(Utc::now());

            println!("{}", "📊 Link Statistics".bright_blue().bold());
            println!();
            println!("  Code:        {}", link.short_code.cyan());
            println!("  Destination: {}", link.original_url);
            println!(
                "  Clicks:      {}",
                link.click_count.to_string().bright_green().bold()
            );
            if let Some(last) = link.last_clicked_at {
                println!("  Last click:  {}", last.format("%Y-%m-%d %H:%M"));
            }

            for (label, dimension) in [
                ("Countries", ClickDimension::Country),
                ("Referrers", ClickDimension::Referer),
                ("Browsers", ClickDimension::Browser),
                ("Devices", ClickDimension::DeviceType),
            ] {
                let buckets = clicks
                    .grouped_counts(link.id, since, dimension, 5)
                    .await
                    .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

                println!();
                println!("  {}", label.bright_white().bold());
                if buckets.is_empty() {
                    println!("    {}", "none".bright_black());
                }
                for bucket in buckets {
                    println!("    {:<30} {}", bucket.value, bucket.count);
                }
            }
            println!();
        }
    }

    Ok(())
}

async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let users_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let links_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM short_links WHERE deleted_at IS NULL")
            .fetch_one(pool)
            .await?;

    let clicks_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clicks")
        .fetch_one(pool)
        .await?;

    println!("  Users:  {}", users_count.to_string().bright_green().bold());
    println!("  Links:  {}", links_count.to_string().bright_green().bold());
    println!("  Clicks: {}", clicks_count.to_string().bright_green().bold());
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM _sqlx_migrations WHERE success",
            )
            .fetch_one(pool)
            .await
            .unwrap_or(0);

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
