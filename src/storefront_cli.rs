//! Command line visitor for a running storefront server.
//!
//! Keeps the anonymous visitor id and like marks in a local JSON state file,
//! the way a browser keeps them in local storage.

use anyhow::{Context, Result};
use chrono::Local;
use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storefront_server::config::RetrySettings;
use storefront_server::engagement::{JsonFileLocalStorage, LikeOutcome, LikeTracker, RetryPolicy};
use storefront_server::page::PageState;
use storefront_server::reviews::{intake, view, ReviewDraft, ReviewCard};
use storefront_server::storefront_store::{LikeMode, RemoteStorefrontStore};

fn get_styles() -> Styles {
    Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .literal(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
}

#[derive(Parser, Debug)]
#[command(styles=get_styles())]
struct CliArgs {
    /// Base URL of the storefront server.
    #[clap(long, default_value = "http://127.0.0.1:3001")]
    pub server_url: String,

    /// Local state file holding the visitor id and like marks.
    #[clap(long, default_value = "storefront-visitor.json")]
    pub state_file: PathBuf,

    /// Like mode the server runs in.
    #[clap(long, default_value = "recorded")]
    pub like_mode: LikeMode,

    /// Per-request timeout in seconds.
    #[clap(long, default_value_t = 10)]
    pub timeout_sec: u64,

    /// Retries for transient like failures.
    #[clap(long, default_value_t = 3)]
    pub max_retries: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shows the page header, rating breakdown and review preview.
    Page,

    /// Lists every approved review.
    Reviews,

    /// Likes a review.
    Like { review_id: String },

    /// Takes back a like (recorded mode only).
    Unlike { review_id: String },

    /// Likes or unlikes a review depending on its current state.
    Toggle { review_id: String },

    /// Submits a review for moderation.
    Submit {
        username: String,
        rating: i64,
        text: String,
        #[clap(long)]
        service: String,
    },
}

fn print_card(card: &ReviewCard) {
    println!(
        "{} {} · {}  [{}]",
        card.stars, card.display_name, card.day_label, card.service
    );
    println!("    {}", card.text);
    println!(
        "    {} Útil {}  (id {})",
        if card.liked { "♥" } else { "♡" },
        card.likes_count,
        card.id
    );
}

fn print_page(page: &PageState, all: bool) {
    println!("{}", page.settings.title);
    println!(
        "{} ★ ({} reseñas)",
        page.settings.rating_display_text(),
        page.summary.approved_count
    );
    for bar in page.summary.bars() {
        println!(
            "  {} ★ {:<20} {}",
            bar.stars,
            "█".repeat(bar.percent as usize / 5),
            bar.count
        );
    }
    if !page.platforms.is_empty() {
        println!("\n{}", page.settings.platforms_title);
        for platform in &page.platforms {
            println!("  {}  {}", platform.name, platform.whatsapp_url);
        }
    }
    if !page.degraded.is_empty() {
        println!("\n(could not load: {})", page.degraded.join(", "));
    }
    println!();
    if let Some(message) = page.empty_state {
        println!("{}", message);
        return;
    }
    let cards = if all {
        &page.reviews[..]
    } else {
        view::preview(&page.reviews)
    };
    for card in cards {
        print_card(card);
    }
}

fn print_outcome(outcome: &LikeOutcome) {
    match outcome.likes_count {
        Some(count) => println!(
            "Review {} is now {:?} ({} likes, {} attempt(s))",
            outcome.review_id, outcome.state, count, outcome.attempts
        ),
        None => println!(
            "Review {} already {:?}, nothing to do",
            outcome.review_id, outcome.state
        ),
    }
}

async fn load_page(store: &RemoteStorefrontStore, tracker: &LikeTracker) -> PageState {
    PageState::load(store, Some(tracker.marks()), Local::now().fixed_offset()).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let store = Arc::new(RemoteStorefrontStore::new(
        cli_args.server_url.clone(),
        cli_args.timeout_sec,
    )?);
    let storage = Arc::new(JsonFileLocalStorage::open(&cli_args.state_file)?);
    let retry = RetryPolicy::new(&RetrySettings {
        max_retries: cli_args.max_retries,
        ..RetrySettings::default()
    });
    let tracker = LikeTracker::new(store.clone(), storage, cli_args.like_mode, retry)
        .context("Failed to load visitor state")?;

    match cli_args.command {
        Command::Page => print_page(&load_page(&store, &tracker).await, false),
        Command::Reviews => print_page(&load_page(&store, &tracker).await, true),
        Command::Like { review_id } => print_outcome(&tracker.like(&review_id).await?),
        Command::Unlike { review_id } => print_outcome(&tracker.unlike(&review_id).await?),
        Command::Toggle { review_id } => print_outcome(&tracker.toggle(&review_id).await?),
        Command::Submit {
            username,
            rating,
            text,
            service,
        } => {
            let draft = ReviewDraft {
                username,
                rating: Some(Value::from(rating)),
                text,
                service,
            };
            let review = intake::submit(store.as_ref(), &draft).await?;
            println!("Review {} submitted, it will show once approved", review.id);
        }
    }

    Ok(())
}
